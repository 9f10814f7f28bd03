//! # Introduction
//!
//! ccheck lexes and parses a small C-like language, then runs static
//! semantic checks (declarations, types, scopes) over the resulting AST and
//! reports every finding with its source location.
//!
//! ## Analysis pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser → AST → Semantic Analyzer → Diagnostics
//! ```
//!
//! 1. [`parser`] — tokenises the source and builds an AST.
//! 2. [`analyzer`] — walks the AST against a scope stack and collects
//!    [`analyzer::diagnostics::Diagnostic`]s in emission order.
//!
//! Lexical and syntax errors are fatal for a file (no trustworthy AST can be
//! built past them); semantic findings are collected so one pass reports
//! every independent error.
//!
//! ## Supported language
//!
//! Types: `int`, `float`, `string`, `void`.
//! Control flow: `if/else`, `while`, C-style `for`, `return`, nested blocks.
//! No preprocessor, pointers, arrays, or structs.

pub mod analyzer;
pub mod parser;

use std::fmt;

use analyzer::diagnostics::Diagnostics;
use analyzer::semantic::SemanticAnalyzer;
use parser::ast::Program;
use parser::lexer::{LexError, Lexer};
use parser::parser::{ParseError, Parser};

/// A fatal frontend failure: the source never produced a usable AST.
#[derive(Debug, Clone)]
pub enum FrontendError {
    Lex(LexError),
    Parse(ParseError),
}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontendError::Lex(err) => write!(f, "{}", err),
            FrontendError::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FrontendError {}

impl From<LexError> for FrontendError {
    fn from(err: LexError) -> Self {
        FrontendError::Lex(err)
    }
}

impl From<ParseError> for FrontendError {
    fn from(err: ParseError) -> Self {
        FrontendError::Parse(err)
    }
}

/// Result of analyzing one translation unit.
#[derive(Debug)]
pub struct Analysis {
    /// The parsed program.
    pub program: Program,
    /// Semantic findings in emission order; empty means the program is valid.
    pub diagnostics: Diagnostics,
}

impl Analysis {
    /// True when semantic analysis found no problems.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Run the whole pipeline over one source string.
///
/// Lexical and syntax errors abort with [`FrontendError`]; an `Ok` result
/// carries the AST together with whatever semantic diagnostics were found.
pub fn analyze_source(source: &str) -> Result<Analysis, FrontendError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::from_tokens(tokens);
    let program = parser.parse_program()?;
    let diagnostics = SemanticAnalyzer::new().analyze(&program);
    Ok(Analysis {
        program,
        diagnostics,
    })
}
