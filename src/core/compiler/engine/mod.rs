//! Tokenizer and token cursor shared by every compiler stage.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::{Cursor, EnvMarker, TokenSlice, UnterminatedGroup};
pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind, ESCAPABLE};
