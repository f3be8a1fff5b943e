//! Block and environment parsing
//!
//! Each segment found by the segmenter becomes one block node. Environments
//! dispatch on their tag; the recognized set is closed and anything else is
//! kept as literal text.

use probmark_tree::{CodeLanguage, DocumentNode, List, ListItem, TheoremKind};

use super::context::CompileState;
use super::engine::TokenSlice;
use super::markup::parse_inline;
use super::segment::{segment_tokens, Segment, SegmentKind};
use super::table::parse_tabular;
use crate::utils::error::CompileError;

const EXAMPLE_FENCE: &str = "```";

/// What an environment tag compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    Itemize,
    Enumerate,
    Center,
    Detail,
    Code(CodeLanguage),
    Example,
    Theorem(TheoremKind),
    Tabular,
    Math,
    Unknown,
}

impl EnvKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "itemize" => EnvKind::Itemize,
            "enumerate" => EnvKind::Enumerate,
            "center" => EnvKind::Center,
            "detail" => EnvKind::Detail,
            "cpp" => EnvKind::Code(CodeLanguage::Cpp),
            "java" => EnvKind::Code(CodeLanguage::Java),
            "python" => EnvKind::Code(CodeLanguage::Python),
            "example" => EnvKind::Example,
            "theorem" => EnvKind::Theorem(TheoremKind::Theorem),
            "lemma" => EnvKind::Theorem(TheoremKind::Lemma),
            "definition" => EnvKind::Theorem(TheoremKind::Definition),
            "corollary" => EnvKind::Theorem(TheoremKind::Corollary),
            "proof" => EnvKind::Theorem(TheoremKind::Proof),
            "tabular" => EnvKind::Tabular,
            "equation" | "equation*" | "align" | "align*" | "gather" | "gather*"
            | "multline" | "multline*" | "displaymath" => EnvKind::Math,
            _ => EnvKind::Unknown,
        }
    }

    /// Bodies that are never scanned for markup: source code, sample
    /// input/output and math forwarded to the typesetter.
    pub fn is_verbatim(&self) -> bool {
        matches!(self, EnvKind::Code(_) | EnvKind::Example | EnvKind::Math)
    }
}

// =============================================================================
// Blocks
// =============================================================================

/// Compile a run of markup into block nodes.
pub fn parse_blocks(slice: TokenSlice<'_>, state: &mut CompileState) -> Vec<DocumentNode> {
    segment_tokens(slice, state)
        .iter()
        .map(|segment| parse_segment(slice, segment, state))
        .collect()
}

fn parse_segment(
    slice: TokenSlice<'_>,
    segment: &Segment,
    state: &mut CompileState,
) -> DocumentNode {
    let block = slice.slice(segment.tokens.clone());
    match &segment.kind {
        SegmentKind::Paragraph => DocumentNode::paragraph(parse_inline(block, state)),
        SegmentKind::DisplayMath => {
            let body = block.slice(1..block.len().saturating_sub(1));
            DocumentNode::math(body.raw(), true)
        }
        SegmentKind::Environment { tag } => {
            match state.nested(block.offset(), |s| parse_environment(block, tag, s)) {
                Ok(node) => node,
                Err(err) => {
                    let message = err.to_string();
                    state.report(err, Some(block.raw()));
                    DocumentNode::Diagnostic {
                        message,
                        source: block.raw().to_string(),
                    }
                }
            }
        }
    }
}

/// Tokens between `\begin{tag}` and the `\end{tag}` that closes `region`.
fn environment_body<'a>(region: TokenSlice<'a>) -> Option<TokenSlice<'a>> {
    let open = region.env_marker(0)?;
    let close = (open.next..region.len()).rev().find(|&i| {
        region
            .env_marker(i)
            .is_some_and(|m| !m.is_begin && m.next == region.len())
    })?;
    Some(region.slice(open.next..close))
}

/// Compile one matched `\begin{tag}...\end{tag}` region.
pub fn parse_environment(
    region: TokenSlice<'_>,
    tag: &str,
    state: &mut CompileState,
) -> DocumentNode {
    let Some(body) = environment_body(region) else {
        return DocumentNode::paragraph(vec![DocumentNode::text(region.raw())]);
    };
    log::debug!("environment {} at offset {}", tag, region.offset());

    match EnvKind::from_tag(tag) {
        EnvKind::Itemize => parse_list(body, false, state),
        EnvKind::Enumerate => parse_list(body, true, state),
        EnvKind::Center => DocumentNode::Centered {
            body: parse_blocks(body, state),
        },
        EnvKind::Detail => parse_detail(body, state),
        EnvKind::Code(language) => DocumentNode::CodeBlock {
            language,
            source: body.raw().trim().to_string(),
        },
        EnvKind::Example => parse_example(body),
        EnvKind::Theorem(theorem) => DocumentNode::TheoremLike {
            theorem,
            body: parse_blocks(body, state),
        },
        EnvKind::Tabular => match parse_tabular(body, state) {
            Ok(table) => DocumentNode::Table(table),
            Err(source) => {
                let err = CompileError::MalformedTable {
                    source,
                    offset: region.offset(),
                };
                let message = err.to_string();
                state.report(err, Some(region.raw()));
                DocumentNode::Diagnostic {
                    message,
                    source: region.raw().to_string(),
                }
            }
        },
        EnvKind::Math => DocumentNode::math(region.raw(), true),
        EnvKind::Unknown => {
            state.report(
                CompileError::UnknownEnvironment {
                    tag: tag.to_string(),
                    offset: region.offset(),
                },
                Some(region.raw()),
            );
            DocumentNode::paragraph(vec![DocumentNode::text(region.raw())])
        }
    }
}

// =============================================================================
// Lists
// =============================================================================

/// `itemize` / `enumerate`. Items start at each top-level `\item`; nested
/// environments inside an item are compiled as blocks in place.
fn parse_list(body: TokenSlice<'_>, ordered: bool, state: &mut CompileState) -> DocumentNode {
    let mut items: Vec<ListItem> = Vec::new();
    // Two paragraph segments in a row were split at a blank line
    let mut after_paragraph = false;

    for segment in segment_tokens(body, state) {
        if segment.kind != SegmentKind::Paragraph {
            let node = parse_segment(body, &segment, state);
            match items.last_mut() {
                Some(item) => item.children.push(node),
                None => log::debug!("dropping block before the first \\item"),
            }
            after_paragraph = false;
            continue;
        }

        let block = body.slice(segment.tokens.clone());
        let mut fragments = block.split_top_level(|t| t.is_cs("item")).into_iter();
        if let Some(lead) = fragments.next() {
            match items.last_mut() {
                Some(_) if lead.is_blank() => {}
                Some(item) if after_paragraph => item
                    .children
                    .push(DocumentNode::paragraph(parse_item_text(lead, state))),
                Some(item) => item.children.extend(parse_item_text(lead, state)),
                None if !lead.is_blank() => {
                    log::debug!("dropping text before the first \\item: {:?}", lead.raw())
                }
                None => {}
            }
        }
        for fragment in fragments {
            items.push(ListItem::new(parse_item_text(fragment, state)));
        }
        after_paragraph = true;
    }

    DocumentNode::List(List { ordered, items })
}

fn parse_item_text(fragment: TokenSlice<'_>, state: &mut CompileState) -> Vec<DocumentNode> {
    let mut cursor = fragment.trim().cursor();
    cursor.skip_bracket_option();
    let text = cursor.rest().trim();
    if text.is_empty() {
        return Vec::new();
    }
    parse_inline(text, state)
}

// =============================================================================
// Detail / Example
// =============================================================================

fn parse_detail(body: TokenSlice<'_>, state: &mut CompileState) -> DocumentNode {
    let (summary, before, after) = split_summary(body, state);
    let mut blocks = parse_blocks(before, state);
    blocks.extend(parse_blocks(after, state));
    DocumentNode::Collapsible {
        summary: parse_inline(summary.trim(), state),
        body: blocks,
    }
}

/// Find the summary of a `detail` body: `\summary{..}`, then
/// `\summary rest of line`, then the first line.
/// Returns the summary and the body text before and after it.
fn split_summary<'a>(
    body: TokenSlice<'a>,
    state: &mut CompileState,
) -> (TokenSlice<'a>, TokenSlice<'a>, TokenSlice<'a>) {
    // Only a `\summary` in the detail's own text counts, not one inside
    // a nested environment or display math
    let found = segment_tokens(body, state)
        .into_iter()
        .filter(|segment| segment.kind == SegmentKind::Paragraph)
        .find_map(|segment| {
            let paragraph = body.slice(segment.tokens.clone());
            let mut depth = 0usize;
            paragraph.tokens().iter().enumerate().find_map(|(i, token)| {
                if token.is_begin_group() {
                    depth += 1;
                } else if token.is_end_group() {
                    depth = depth.saturating_sub(1);
                } else if depth == 0 && token.is_cs("summary") {
                    return Some(segment.tokens.start + i);
                }
                None
            })
        });

    let Some(at) = found else {
        let trimmed = body.trim();
        let end = trimmed.line_end(0);
        return (
            trimmed.slice(0..end),
            trimmed.slice(0..0),
            trimmed.slice_from(end),
        );
    };

    let before = body.slice(0..at);
    let mut cursor = body.cursor();
    cursor.set_pos(at + 1);
    cursor.skip_spaces();
    match cursor.read_group() {
        Ok(Some(group)) => return (group, before, cursor.rest()),
        Ok(None) => {}
        Err(unterminated) => state.report(
            CompileError::UnterminatedArgument {
                command: "summary".to_string(),
                offset: unterminated.offset,
            },
            Some(body.slice_from(at).raw()),
        ),
    }
    let end = body.line_end(at + 1);
    (body.slice(at + 1..end), before, body.slice_from(end))
}

/// Sample input and output separated by a code fence. Either side may be
/// empty. When both sides are fenced (```` ```in``` ```out``` ````), the
/// fenced parts are the input and output.
fn parse_example(body: TokenSlice<'_>) -> DocumentNode {
    let raw = body.raw().trim();
    let parts: Vec<&str> = raw.split(EXAMPLE_FENCE).map(str::trim).collect();
    let (first, step) = if raw.starts_with(EXAMPLE_FENCE) && parts.len() >= 3 {
        (1, 2)
    } else {
        (0, 1)
    };
    let mut sides = parts.iter().skip(first).step_by(step);
    let input = sides.next().copied().unwrap_or_default().to_string();
    let output = sides.next().copied().unwrap_or_default().to_string();
    DocumentNode::ExampleBlock { input, output }
}
