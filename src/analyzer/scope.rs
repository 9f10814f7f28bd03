//! Symbol table and lexical scope management
//!
//! Scopes form a stack: one is pushed on every function/block entry and
//! popped on exit, so the stack mirrors the block nesting of the program
//! being analyzed. Lookup walks from the innermost scope outward and stops
//! at the first match, which is what makes shadowing work. The global scope
//! sits at the bottom and is never popped.

use crate::parser::ast::{SourceLocation, Type};
use rustc_hash::FxHashMap;

/// What a name refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Function {
        params: Vec<Type>,
        return_type: Type,
    },
}

/// A declared name with its type and declaration site.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub depth: usize,
    pub declared_at: SourceLocation,
}

/// One lexical scope. Owns its symbols.
#[derive(Debug, Default)]
pub struct Scope {
    symbols: FxHashMap<String, Symbol>,
}

/// Stack of scopes with innermost-first lookup.
#[derive(Debug)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
}

impl ScopeManager {
    /// Create a manager holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Push a fresh innermost scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope. The global scope stays.
    pub fn exit_scope(&mut self) {
        debug_assert!(
            self.scopes.len() > 1,
            "exit_scope called on the global scope"
        );
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Current nesting depth (0 = global).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Insert a symbol into the innermost scope.
    ///
    /// Redeclaration is only an error within one scope; shadowing a name
    /// from an outer scope is permitted. On conflict the existing symbol is
    /// returned and the table is left unchanged, so the first declaration
    /// stays authoritative.
    pub fn declare(
        &mut self,
        name: &str,
        ty: Type,
        kind: SymbolKind,
        location: SourceLocation,
    ) -> Result<(), Symbol> {
        let depth = self.depth();
        // The stack always holds at least the global scope
        let current = self.scopes.last_mut().unwrap();

        if let Some(existing) = current.symbols.get(name) {
            return Err(existing.clone());
        }

        current.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                ty,
                kind,
                depth,
                declared_at: location,
            },
        );
        Ok(())
    }

    /// Look a name up, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
        }
        None
    }

    /// Look a name up in the innermost scope only.
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .last()
            .and_then(|scope| scope.symbols.get(name))
    }
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}
