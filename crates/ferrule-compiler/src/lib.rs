//! Ferrule Compiler
//!
//! Lexes and parses a rules script into a position-annotated [`Block`],
//! per `spec.md` §4.1–§4.2.

pub mod compiler;
pub mod diagnostics;

pub use compiler::ast::{
    count_nodes, walk_block_exprs, BinOp, Block, ElseIf, Expr, Stmt, UnOp,
};
pub use compiler::error_codes::parse_error_to_engine_error;
pub use compiler::lexer::{LexError, Lexer};
pub use compiler::parser::{parse, ParseError, Parser};
pub use compiler::tokens::{Span, Token, TokenKind};
