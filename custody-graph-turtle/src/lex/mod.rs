//! Turtle tokenizer.

pub mod chars;
mod lexer;
mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind};
