//! Static semantic analysis
//!
//! Walks the AST produced by [`crate::parser`] and checks declarations,
//! types, and scoping:
//! - [`scope`]: symbol table and lexical scope stack
//! - [`semantic`]: the depth-first checking pass
//! - [`diagnostics`]: ordered error/warning collection
//!
//! # Checks
//!
//! - Use of an undeclared variable or function
//! - Initializer, assignment, argument, and return type compatibility
//!   (the only implicit conversion is `int` → `float`)
//! - Redeclaration within one scope (shadowing across scopes is allowed)
//!
//! Semantic findings are collected, not thrown: a single pass surfaces every
//! independent error in a file.

pub mod diagnostics;
pub mod scope;
pub mod semantic;
