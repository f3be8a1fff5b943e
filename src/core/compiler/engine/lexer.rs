//! Markup lexer
//!
//! Converts a source string into a flat token vector. The tokens cover the
//! input without gaps, so slicing the source between any two token
//! boundaries reproduces the original text byte for byte.

use super::token::{Token, TokenKind, ESCAPABLE};

/// The lexer that converts source text to tokens
pub struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    /// Peek at the next character without consuming it
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Byte offset of the next character (or end of input)
    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len())
    }

    /// Consume and return the next character
    fn next_char(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if pred(c) {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Read what follows a backslash
    fn read_escape(&mut self) -> TokenKind {
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.offset();
                self.eat_while(|c| c.is_ascii_alphabetic());
                let end = self.offset();
                TokenKind::ControlSeq(self.src[start..end].to_string())
            }
            Some(c) if ESCAPABLE.contains(&c) => {
                self.next_char();
                TokenKind::Escaped(c)
            }
            Some('\n') | Some('\r') | None => TokenKind::ControlSymbol(None),
            Some(c) => {
                self.next_char();
                TokenKind::ControlSymbol(Some(c))
            }
        }
    }

    /// Read the next token
    fn next_token(&mut self) -> Option<Token> {
        let start = self.offset();
        let c = self.next_char()?;

        let kind = match c {
            '\\' => self.read_escape(),
            '{' => TokenKind::BeginGroup,
            '}' => TokenKind::EndGroup,
            '$' => {
                if self.peek_char() == Some('$') {
                    self.next_char();
                    TokenKind::DisplayMathShift
                } else {
                    TokenKind::MathShift
                }
            }
            '&' => TokenKind::AlignTab,
            '#' => TokenKind::Hash,
            ' ' | '\t' => {
                self.eat_while(|c| c == ' ' || c == '\t');
                TokenKind::Space
            }
            '\r' => {
                if self.peek_char() == Some('\n') {
                    self.next_char();
                }
                TokenKind::Newline
            }
            '\n' => TokenKind::Newline,
            _ => {
                self.eat_while(|c| !is_special(c));
                TokenKind::Text
            }
        };

        Some(Token::new(kind, start..self.offset()))
    }

    /// Tokenize the entire input and pair up its braces
    pub fn tokenize(self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.collect();
        match_groups(&mut tokens);
        tokens
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn is_special(c: char) -> bool {
    matches!(
        c,
        '\\' | '{' | '}' | '$' | '&' | '#' | ' ' | '\t' | '\n' | '\r'
    )
}

/// Record, for every `{`, the distance to its matching `}`. One pass with
/// a stack; a `}` with nothing open is left unpaired.
fn match_groups(tokens: &mut [Token]) {
    let mut open: Vec<usize> = Vec::new();
    for i in 0..tokens.len() {
        match tokens[i].kind {
            TokenKind::BeginGroup => open.push(i),
            TokenKind::EndGroup => {
                if let Some(start) = open.pop() {
                    tokens[start].group_len = Some(i - start);
                }
            }
            _ => {}
        }
    }
}

/// Convenience function to tokenize a string
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
