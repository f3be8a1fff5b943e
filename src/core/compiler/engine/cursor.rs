//! Token slices and a cursor over them.
//!
//! All compiler stages work on sub-slices of the single token vector built
//! for a compilation. Brace balancing, environment markers and raw-text
//! recovery live here so that the segmenter, the list parser, the inline
//! parser and the table engine share one implementation.

use std::ops::Range;

use super::token::{Token, TokenKind};

/// A borrowed run of tokens together with the source they index into.
#[derive(Debug, Clone, Copy)]
pub struct TokenSlice<'a> {
    src: &'a str,
    tokens: &'a [Token],
    /// Byte offset of the slice, meaningful even when it is empty
    offset: usize,
}

/// A `\begin{tag}` or `\end{tag}` found at some token index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvMarker<'a> {
    pub is_begin: bool,
    pub tag: &'a str,
    /// Index of the first token after the closing brace
    pub next: usize,
}

/// A `{` that has no matching `}` in the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnterminatedGroup {
    pub offset: usize,
}

impl<'a> TokenSlice<'a> {
    pub fn new(src: &'a str, tokens: &'a [Token]) -> Self {
        TokenSlice {
            src,
            tokens,
            offset: tokens.first().map(|t| t.span.start).unwrap_or(0),
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    pub fn kind(&self, index: usize) -> Option<&'a TokenKind> {
        self.tokens.get(index).map(|t| &t.kind)
    }

    /// Byte offset where this slice starts in the source.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte range covered by this slice.
    pub fn span(&self) -> Range<usize> {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.start..last.span.end,
            _ => self.offset..self.offset,
        }
    }

    /// The exact source text covered by this slice.
    pub fn raw(&self) -> &'a str {
        &self.src[self.span()]
    }

    /// Sub-slice by token indices. Out-of-range bounds are clamped.
    pub fn slice(&self, range: Range<usize>) -> TokenSlice<'a> {
        let end = range.end.min(self.tokens.len());
        let start = range.start.min(end);
        let offset = match self.tokens.get(start) {
            Some(t) if start < end => t.span.start,
            _ if start > 0 => self.tokens[start - 1].span.end,
            _ => self.offset,
        };
        TokenSlice {
            src: self.src,
            tokens: &self.tokens[start..end],
            offset,
        }
    }

    pub fn slice_from(&self, start: usize) -> TokenSlice<'a> {
        self.slice(start..self.tokens.len())
    }

    /// Strip leading and trailing spaces and line breaks.
    pub fn trim(&self) -> TokenSlice<'a> {
        let start = self
            .tokens
            .iter()
            .position(|t| !t.is_whitespace())
            .unwrap_or(self.tokens.len());
        let end = self
            .tokens
            .iter()
            .rposition(|t| !t.is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(start);
        self.slice(start..end)
    }

    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|t| t.is_whitespace())
    }

    /// Index of the `}` matching the `{` at `open`, if it lies inside this
    /// slice. Looks up the pairing made by the lexer.
    pub fn group_end(&self, open: usize) -> Option<usize> {
        let close = open + self.get(open)?.group_len?;
        (close < self.tokens.len()).then_some(close)
    }

    /// Recognize `\begin{tag}` / `\end{tag}` at `index`.
    pub fn env_marker(&self, index: usize) -> Option<EnvMarker<'a>> {
        let is_begin = match self.get(index)?.as_control_seq()? {
            "begin" => true,
            "end" => false,
            _ => return None,
        };
        let close = self.group_end(index + 1)?;
        let tag = self.slice(index + 2..close).raw().trim();
        if tag.is_empty() {
            return None;
        }
        Some(EnvMarker {
            is_begin,
            tag,
            next: close + 1,
        })
    }

    /// Index of the first line break at brace depth zero, starting at `from`.
    pub fn line_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            match token.kind {
                TokenKind::BeginGroup => depth += 1,
                TokenKind::EndGroup => depth = depth.saturating_sub(1),
                TokenKind::Newline if depth == 0 => return i,
                _ => {}
            }
        }
        self.tokens.len()
    }

    /// If the line break at `index` starts a blank line, the index of the
    /// line break that ends it.
    pub fn blank_line_end(&self, index: usize) -> Option<usize> {
        if !matches!(self.kind(index)?, TokenKind::Newline) {
            return None;
        }
        let mut i = index + 1;
        while matches!(self.kind(i), Some(TokenKind::Space)) {
            i += 1;
        }
        matches!(self.kind(i), Some(TokenKind::Newline)).then_some(i)
    }

    /// Index of the token closing math whose body starts at `from`. Display
    /// math closes only on `$$`; inline math closes on either shift, a `$$`
    /// being the close of one span and the open of the next. Math never
    /// crosses a blank line.
    pub fn math_close(&self, from: usize, display: bool) -> Option<usize> {
        for i in from..self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::DisplayMathShift => return Some(i),
                TokenKind::MathShift if !display => return Some(i),
                TokenKind::Newline if self.blank_line_end(i).is_some() => return None,
                _ => {}
            }
        }
        None
    }

    /// Split on every token matching `is_separator` at brace depth zero.
    /// Separator tokens are not included in the pieces.
    pub fn split_top_level(&self, is_separator: impl Fn(&Token) -> bool) -> Vec<TokenSlice<'a>> {
        let mut pieces = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (i, token) in self.tokens.iter().enumerate() {
            match token.kind {
                TokenKind::BeginGroup => depth += 1,
                TokenKind::EndGroup => depth = depth.saturating_sub(1),
                _ if depth == 0 && is_separator(token) => {
                    pieces.push(self.slice(start..i));
                    start = i + 1;
                }
                _ => {}
            }
        }
        pieces.push(self.slice_from(start));
        pieces
    }

    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            slice: *self,
            pos: 0,
        }
    }
}

/// A read position inside a [`TokenSlice`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    slice: TokenSlice<'a>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// The whole slice this cursor walks over.
    pub fn slice(&self) -> TokenSlice<'a> {
        self.slice
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.slice.len());
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.slice.len()
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.slice.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.slice.kind(self.pos)
    }

    pub fn bump(&mut self) -> Option<&'a Token> {
        let token = self.slice.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|t| t.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skip spaces on the current line only.
    pub fn skip_spaces(&mut self) {
        while matches!(self.peek_kind(), Some(TokenKind::Space)) {
            self.pos += 1;
        }
    }

    /// Read a `{...}` group at the cursor.
    ///
    /// Returns `Ok(None)` without moving when the next token is not `{`,
    /// and an error without moving when the group never closes.
    pub fn read_group(&mut self) -> Result<Option<TokenSlice<'a>>, UnterminatedGroup> {
        if !self.peek().is_some_and(|t| t.is_begin_group()) {
            return Ok(None);
        }
        match self.slice.group_end(self.pos) {
            Some(close) => {
                let inner = self.slice.slice(self.pos + 1..close);
                self.pos = close + 1;
                Ok(Some(inner))
            }
            None => Err(UnterminatedGroup {
                offset: self.slice.tokens[self.pos].span.start,
            }),
        }
    }

    /// Skip a `[...]` option written as plain text, if present.
    pub fn skip_bracket_option(&mut self) {
        let src = self.slice.src();
        let starts_option = self
            .peek()
            .is_some_and(|t| matches!(t.kind, TokenKind::Text) && t.text(src).starts_with('['));
        if !starts_option {
            return;
        }
        let save = self.pos;
        while let Some(token) = self.bump() {
            if token.is_begin_group() || matches!(token.kind, TokenKind::Newline) {
                break;
            }
            if matches!(token.kind, TokenKind::Text) && token.text(src).ends_with(']') {
                return;
            }
        }
        self.pos = save;
    }

    /// Tokens from `start` up to the cursor.
    pub fn since(&self, start: usize) -> TokenSlice<'a> {
        self.slice.slice(start..self.pos)
    }

    /// Everything not consumed yet.
    pub fn rest(&self) -> TokenSlice<'a> {
        self.slice.slice_from(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    #[test]
    fn test_group_end_respects_escapes() {
        let src = "{a\\}b{c}}d";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        let close = slice.group_end(0).unwrap();
        assert_eq!(slice.slice(0..close + 1).raw(), "{a\\}b{c}}");
    }

    #[test]
    fn test_group_end_stays_inside_slice() {
        let src = "{a{b}c}";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        assert_eq!(slice.group_end(0), Some(6));
        assert_eq!(slice.slice(0..5).group_end(0), None);
        assert_eq!(slice.slice(2..5).group_end(0), Some(2));
    }

    #[test]
    fn test_unclosed_groups_are_linear() {
        let src = "{".repeat(50_000);
        let tokens = tokenize(&src);
        let slice = TokenSlice::new(&src, &tokens);
        assert!((0..slice.len()).all(|i| slice.group_end(i).is_none()));
    }

    #[test]
    fn test_math_close() {
        let src = "$a$$b$ $$c$d$$ $e\n  \nf$";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        assert_eq!(slice.math_close(1, false), Some(2));
        assert_eq!(slice.math_close(3, false), Some(4));
        assert_eq!(slice.math_close(7, true), Some(10));
        assert_eq!(slice.math_close(13, false), None);
    }

    #[test]
    fn test_env_marker() {
        let src = "\\begin{ itemize }x";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        let marker = slice.env_marker(0).unwrap();
        assert!(marker.is_begin);
        assert_eq!(marker.tag, "itemize");
        assert_eq!(slice.slice_from(marker.next).raw(), "x");
    }

    #[test]
    fn test_trim_and_empty_offsets() {
        let src = "  a b \n";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        assert_eq!(slice.trim().raw(), "a b");
        let empty = slice.slice(2..2);
        assert!(empty.is_empty());
        assert_eq!(empty.offset(), 3);
        assert_eq!(empty.raw(), "");
    }

    #[test]
    fn test_split_top_level() {
        let src = "a & {b & c} & d";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        let cells: Vec<&str> = slice
            .split_top_level(|t| matches!(t.kind, TokenKind::AlignTab))
            .iter()
            .map(|c| c.trim().raw())
            .collect();
        assert_eq!(cells, vec!["a", "{b & c}", "d"]);
    }

    #[test]
    fn test_read_group() {
        let src = "{x}{y";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        let mut cursor = slice.cursor();
        assert_eq!(cursor.read_group().unwrap().unwrap().raw(), "x");
        assert!(matches!(
            cursor.read_group(),
            Err(UnterminatedGroup { offset: 3 })
        ));
        assert_eq!(cursor.pos(), 3);
    }

    #[test]
    fn test_skip_bracket_option() {
        let src = "[t]{2}";
        let tokens = tokenize(src);
        let slice = TokenSlice::new(src, &tokens);
        let mut cursor = slice.cursor();
        cursor.skip_bracket_option();
        assert_eq!(cursor.read_group().unwrap().unwrap().raw(), "2");
    }
}
