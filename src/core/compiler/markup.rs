//! Inline command parsing
//!
//! Turns one paragraph, list-item fragment or table cell into inline nodes:
//! text runs, styled spans, links, math spans and headings. Malformed input
//! never fails here; the offending token is kept as literal text and the
//! scan carries on after it.

use phf::phf_map;
use probmark_tree::{DocumentNode, SizeLevel, Style};

use super::context::CompileState;
use super::engine::{Cursor, TokenKind, TokenSlice};
use super::utils::apply_lexical_replacements;
use crate::utils::error::CompileError;

// =============================================================================
// Command Tables
// =============================================================================

/// What a known inline command turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineCommand {
    /// `\textbf{x}` and friends
    Style(Style),
    /// `\section{x}` .. `\subsubparagraph{x}`
    Heading(u8),
    /// Zero-argument glyph such as `\ldots`
    Symbol(&'static str),
    /// `\href{url}{text}`
    Href,
    /// `\url{url}`
    Url,
    /// `\textcolor{color}{text}`
    TextColor,
}

impl InlineCommand {
    /// Number of brace groups the command consumes.
    pub fn arity(&self) -> usize {
        match self {
            InlineCommand::Symbol(_) => 0,
            InlineCommand::Style(_) | InlineCommand::Heading(_) | InlineCommand::Url => 1,
            InlineCommand::Href | InlineCommand::TextColor => 2,
        }
    }
}

pub static INLINE_COMMANDS: phf::Map<&'static str, InlineCommand> = phf_map! {
    "textbf" => InlineCommand::Style(Style::Bold),
    "textit" => InlineCommand::Style(Style::Italic),
    "emph" => InlineCommand::Style(Style::Italic),
    "texttt" => InlineCommand::Style(Style::Monospace),
    "underline" => InlineCommand::Style(Style::Underline),
    "uline" => InlineCommand::Style(Style::Underline),
    "sout" => InlineCommand::Style(Style::Strikethrough),
    "st" => InlineCommand::Style(Style::Strikethrough),
    "textsc" => InlineCommand::Style(Style::SmallCaps),
    "fbox" => InlineCommand::Style(Style::Boxed),
    "boxed" => InlineCommand::Style(Style::Boxed),
    "tiny" => InlineCommand::Style(Style::Size(SizeLevel::Tiny)),
    "scriptsize" => InlineCommand::Style(Style::Size(SizeLevel::ScriptSize)),
    "footnotesize" => InlineCommand::Style(Style::Size(SizeLevel::FootnoteSize)),
    "small" => InlineCommand::Style(Style::Size(SizeLevel::Small)),
    "large" => InlineCommand::Style(Style::Size(SizeLevel::Large)),
    "Large" => InlineCommand::Style(Style::Size(SizeLevel::Larger)),
    "LARGE" => InlineCommand::Style(Style::Size(SizeLevel::Largest)),
    "huge" => InlineCommand::Style(Style::Size(SizeLevel::Huge)),
    "Huge" => InlineCommand::Style(Style::Size(SizeLevel::Huger)),
    "section" => InlineCommand::Heading(1),
    "subsection" => InlineCommand::Heading(2),
    "subsubsection" => InlineCommand::Heading(3),
    "paragraph" => InlineCommand::Heading(4),
    "subparagraph" => InlineCommand::Heading(5),
    "subsubparagraph" => InlineCommand::Heading(6),
    "bullet" => InlineCommand::Symbol("\u{2022}"),
    "ldots" => InlineCommand::Symbol("\u{2026}"),
    "dots" => InlineCommand::Symbol("\u{2026}"),
    "textregistered" => InlineCommand::Symbol("\u{ae}"),
    "copyright" => InlineCommand::Symbol("\u{a9}"),
    "texttrademark" => InlineCommand::Symbol("\u{2122}"),
    "href" => InlineCommand::Href,
    "url" => InlineCommand::Url,
    "textcolor" => InlineCommand::TextColor,
};

/// Commands handled by the block parser; inline they are plain text and
/// already reported by the segmenter when they end up here.
const STRUCTURAL_COMMANDS: &[&str] = &["begin", "end", "item"];

const MAX_HEADING_LEVEL: usize = 6;

// =============================================================================
// Inline Builder
// =============================================================================

/// Collects inline nodes, merging adjacent text into one run.
#[derive(Debug, Default)]
struct InlineBuilder {
    nodes: Vec<DocumentNode>,
    text: String,
}

impl InlineBuilder {
    fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    fn push_char(&mut self, c: char) {
        self.text.push(c);
    }

    fn push_node(&mut self, node: DocumentNode) {
        match node {
            DocumentNode::TextRun { text } => self.text.push_str(&text),
            node => {
                self.flush();
                self.nodes.push(node);
            }
        }
    }

    fn push_nodes(&mut self, nodes: Vec<DocumentNode>) {
        for node in nodes {
            self.push_node(node);
        }
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.nodes
                .push(DocumentNode::text(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> Vec<DocumentNode> {
        self.flush();
        self.nodes
    }
}

/// Where a run of inline tokens sits. Headings only start lines of running
/// text, never inside a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineContext {
    Text,
    Argument,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a run of text into inline nodes.
pub fn parse_inline(slice: TokenSlice<'_>, state: &mut CompileState) -> Vec<DocumentNode> {
    parse_run(slice, state, InlineContext::Text)
}

fn parse_run(
    slice: TokenSlice<'_>,
    state: &mut CompileState,
    context: InlineContext,
) -> Vec<DocumentNode> {
    let src = slice.src();
    let mut out = InlineBuilder::default();
    let mut cursor = slice.cursor();

    while let Some(token) = cursor.peek() {
        match &token.kind {
            TokenKind::Escaped(c) => {
                cursor.bump();
                out.push_char(*c);
            }
            TokenKind::MathShift | TokenKind::DisplayMathShift => {
                parse_math(&mut cursor, state, &mut out);
            }
            TokenKind::ControlSeq(name) => {
                parse_command(name, &mut cursor, state, &mut out);
            }
            TokenKind::Hash
                if context == InlineContext::Text
                    && state.options.heading_shorthand
                    && at_line_start(slice, cursor.pos()) =>
            {
                if !parse_heading(&mut cursor, state, &mut out) {
                    cursor.bump();
                    out.push_char('#');
                }
            }
            TokenKind::BeginGroup => {
                parse_bare_group(&mut cursor, state, &mut out, context);
            }
            TokenKind::Text if state.options.lexical_replacements => {
                cursor.bump();
                out.push_str(&apply_lexical_replacements(token.text(src)));
            }
            _ => {
                cursor.bump();
                out.push_str(token.text(src));
            }
        }
    }

    out.finish()
}

/// Parse a command argument one nesting level deeper. Past the depth
/// limit the argument is kept verbatim.
fn parse_argument(arg: TokenSlice<'_>, state: &mut CompileState) -> Vec<DocumentNode> {
    match state.nested(arg.offset(), |s| parse_run(arg, s, InlineContext::Argument)) {
        Ok(nodes) => nodes,
        Err(err) => {
            state.report(err, Some(arg.raw()));
            vec![DocumentNode::text(arg.raw())]
        }
    }
}

/// `$...$` or `$$...$$`. The body is forwarded untouched. In `$a$$b$`
/// the doubled dollar closes the first inline span and opens the second.
fn parse_math(cursor: &mut Cursor<'_>, state: &mut CompileState, out: &mut InlineBuilder) {
    let slice = cursor.slice();
    let Some(open) = cursor.bump() else {
        return;
    };
    let is_display = matches!(open.kind, TokenKind::DisplayMathShift);
    let mut open_offset = open.span.start;
    let mut body_start = cursor.pos();

    loop {
        let Some(close) = slice.math_close(body_start, is_display) else {
            let delimiter = if is_display { "$$" } else { "$" };
            state.report(
                CompileError::UnterminatedMath {
                    delimiter,
                    offset: open_offset,
                },
                Some(&slice.src()[open_offset..slice.span().end]),
            );
            out.push_str(delimiter);
            cursor.set_pos(body_start);
            return;
        };

        let raw = slice.slice(body_start..close).raw();
        out.push_node(DocumentNode::math(raw, is_display));
        cursor.set_pos(close + 1);
        if is_display || !matches!(slice.kind(close), Some(TokenKind::DisplayMathShift)) {
            return;
        }
        open_offset = slice.tokens()[close].span.start + 1;
        body_start = close + 1;
    }
}

fn parse_command(
    name: &str,
    cursor: &mut Cursor<'_>,
    state: &mut CompileState,
    out: &mut InlineBuilder,
) {
    let start = cursor.pos();
    let Some(cs) = cursor.bump() else {
        return;
    };
    let src = cursor.slice().src();

    let Some(command) = INLINE_COMMANDS.get(name) else {
        // Unknown: keep the command and every brace group after it verbatim
        loop {
            match cursor.read_group() {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(unterminated) => {
                    state.report(
                        CompileError::UnterminatedArgument {
                            command: name.to_string(),
                            offset: unterminated.offset,
                        },
                        Some(cursor.rest().raw()),
                    );
                    break;
                }
            }
        }
        if !STRUCTURAL_COMMANDS.contains(&name) {
            state.report(
                CompileError::UnknownCommand {
                    name: name.to_string(),
                    offset: cs.span.start,
                },
                None,
            );
        }
        out.push_str(cursor.since(start).raw());
        return;
    };

    if let InlineCommand::Symbol(glyph) = command {
        if state.options.lexical_replacements {
            out.push_str(glyph);
        } else {
            out.push_str(cs.text(src));
        }
        return;
    }

    let mut args = Vec::with_capacity(command.arity());
    while args.len() < command.arity() {
        match cursor.read_group() {
            Ok(Some(arg)) => args.push(arg),
            Ok(None) => break,
            Err(unterminated) => {
                state.report(
                    CompileError::UnterminatedArgument {
                        command: name.to_string(),
                        offset: unterminated.offset,
                    },
                    Some(cursor.slice().slice_from(start).raw()),
                );
                // The command becomes text; the stray `{` is read next
                cursor.set_pos(start + 1);
                out.push_str(cs.text(src));
                return;
            }
        }
    }
    if args.len() < command.arity() {
        out.push_str(cursor.since(start).raw());
        return;
    }

    let node = match command {
        InlineCommand::Style(style) => DocumentNode::StyledSpan {
            style: style.clone(),
            children: parse_argument(args[0], state),
        },
        InlineCommand::Heading(level) => DocumentNode::Heading {
            level: *level,
            children: parse_argument(args[0], state),
        },
        InlineCommand::Href => DocumentNode::Link {
            target: args[0].raw().trim().to_string(),
            children: parse_argument(args[1], state),
        },
        InlineCommand::Url => DocumentNode::RawUrl {
            target: args[0].raw().trim().to_string(),
        },
        InlineCommand::TextColor => DocumentNode::StyledSpan {
            style: Style::Color(args[0].raw().trim().to_string()),
            children: parse_argument(args[1], state),
        },
        InlineCommand::Symbol(_) => return,
    };
    out.push_node(node);
}

/// A line holding only spaces before `index`.
fn at_line_start(slice: TokenSlice<'_>, index: usize) -> bool {
    let mut i = index;
    while i > 0 {
        match slice.kind(i - 1) {
            Some(TokenKind::Space) => i -= 1,
            Some(TokenKind::Newline) => return true,
            _ => return false,
        }
    }
    true
}

/// `#` to `######` followed by a space: the rest of the line is a heading.
fn parse_heading(
    cursor: &mut Cursor<'_>,
    state: &mut CompileState,
    out: &mut InlineBuilder,
) -> bool {
    let slice = cursor.slice();
    let start = cursor.pos();
    let level = (start..slice.len())
        .take_while(|&i| matches!(slice.kind(i), Some(TokenKind::Hash)))
        .count();
    if level == 0
        || level > MAX_HEADING_LEVEL
        || !matches!(slice.kind(start + level), Some(TokenKind::Space))
    {
        return false;
    }

    let content_start = start + level + 1;
    let end = slice.line_end(content_start);
    let content = slice.slice(content_start..end).trim();
    out.push_node(DocumentNode::Heading {
        level: level as u8,
        children: parse_argument(content, state),
    });
    // The line break closes the heading
    cursor.set_pos(end + 1);
    true
}

/// `{...}` without a command is plain grouping; its braces disappear.
fn parse_bare_group(
    cursor: &mut Cursor<'_>,
    state: &mut CompileState,
    out: &mut InlineBuilder,
    context: InlineContext,
) {
    let slice = cursor.slice();
    let open = cursor.pos();
    match slice.group_end(open) {
        Some(close) => {
            let inner = slice.slice(open + 1..close);
            let nodes = match state.nested(inner.offset(), |s| parse_run(inner, s, context)) {
                Ok(nodes) => nodes,
                Err(err) => {
                    state.report(err, Some(inner.raw()));
                    vec![DocumentNode::text(inner.raw())]
                }
            };
            out.push_nodes(nodes);
            cursor.set_pos(close + 1);
        }
        None => {
            if let Some(token) = cursor.bump() {
                state.report(
                    CompileError::UnbalancedBrace {
                        offset: token.span.start,
                    },
                    Some(slice.slice_from(open).raw()),
                );
            }
            out.push_char('{');
        }
    }
}
