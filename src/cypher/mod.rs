//! # Cypher language
//!
//! Parser for the supported Cypher subset. Pure functions — no I/O, no
//! state, no store dependency.

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::Result;
use ast::Statement;

/// Parse a Cypher query string into an AST.
pub fn parse(query: &str) -> Result<Statement> {
    let tokens = lexer::tokenize(query)?;
    parser::parse_statement(&tokens)
}
