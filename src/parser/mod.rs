//! Source code frontend
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parser`]: Parsing (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Supported Language
//!
//! A small C-like language:
//! - Types: `int`, `float`, `string`, `void`
//! - Statements: declarations, assignments, `if`/`else`, `while`, `for`,
//!   `return`, nested blocks, expression statements
//! - Expressions: arithmetic, relational, logical, function calls
//! - No preprocessor, pointers, arrays, structs, or typedefs
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators. One token of lookahead; the first syntax error aborts the
//! translation unit (no recovery grammar).

pub mod ast;
pub mod lexer;
pub mod parser;
