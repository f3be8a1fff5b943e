//! Segmentation of markup into top-level blocks
//!
//! The segmenter finds every matched environment and every `$$...$$` region,
//! keeps only the outermost ones, and splits the text around them into
//! paragraphs at blank lines. Blocks come back in source order and never
//! overlap.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::Serialize;

use super::context::CompileState;
use super::engine::{TokenKind, TokenSlice};
use super::environment::EnvKind;
use crate::utils::error::CompileError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    Paragraph,
    Environment { tag: String },
    DisplayMath,
}

/// One atomic top-level block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Token indices, relative to the slice that was segmented
    pub tokens: Range<usize>,
    /// Byte range in the source
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    start: usize,
    end: usize,
    kind: SegmentKind,
}

struct OpenEnv<'a> {
    tag: &'a str,
    start: usize,
}

/// Split a token slice into ordered, non-overlapping blocks.
pub fn segment_tokens(slice: TokenSlice<'_>, state: &mut CompileState) -> Vec<Segment> {
    let regions = outermost(find_regions(slice, state));

    let mut segments = Vec::with_capacity(regions.len() * 2 + 1);
    let mut cursor = 0usize;
    for region in regions {
        push_paragraphs(slice, cursor..region.start, &mut segments);
        segments.push(Segment {
            span: slice.slice(region.start..region.end).span(),
            tokens: region.start..region.end,
            kind: region.kind,
        });
        cursor = region.end;
    }
    push_paragraphs(slice, cursor..slice.len(), &mut segments);

    log::debug!(
        "segmented {} bytes into {} blocks",
        slice.span().len(),
        segments.len()
    );
    segments
}

/// Scan for matched environments and display math.
///
/// Environments close against a single stack: `\end{X}` closes the nearest
/// open `X`, and anything opened after it is reported and left as text.
/// Math never crosses a blank line; a `$` or `$$` without a close before
/// one stays text, so it cannot swallow the blocks after it.
fn find_regions(slice: TokenSlice<'_>, state: &mut CompileState) -> Vec<Region> {
    let tokens = slice.tokens();
    let mut regions = Vec::new();
    let mut stack: Vec<OpenEnv<'_>> = Vec::new();
    let mut open_counts: HashMap<&str, usize> = HashMap::new();
    let mut unclosed_verbatim: HashSet<&str> = HashSet::new();
    let mut i = 0usize;

    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::DisplayMathShift => {
                match slice.math_close(i + 1, true) {
                    Some(close) => {
                        regions.push(Region {
                            start: i,
                            end: close + 1,
                            kind: SegmentKind::DisplayMath,
                        });
                        i = close + 1;
                    }
                    None => {
                        state.report(
                            CompileError::UnterminatedMath {
                                delimiter: "$$",
                                offset: tokens[i].span.start,
                            },
                            Some(slice.slice_from(i).raw()),
                        );
                        i += 1;
                    }
                }
                continue;
            }
            TokenKind::MathShift => {
                i = inline_math_end(slice, i);
                continue;
            }
            _ => {}
        }

        let Some(marker) = slice.env_marker(i) else {
            i += 1;
            continue;
        };

        if marker.is_begin {
            if EnvKind::from_tag(marker.tag).is_verbatim()
                && !unclosed_verbatim.contains(marker.tag)
            {
                match verbatim_end(slice, marker.next, marker.tag) {
                    Some(end) => {
                        regions.push(Region {
                            start: i,
                            end,
                            kind: SegmentKind::Environment {
                                tag: marker.tag.to_string(),
                            },
                        });
                        i = end;
                        continue;
                    }
                    // No later begin of this tag can close either
                    None => {
                        unclosed_verbatim.insert(marker.tag);
                    }
                }
            }
            stack.push(OpenEnv {
                tag: marker.tag,
                start: i,
            });
            *open_counts.entry(marker.tag).or_default() += 1;
        } else if open_counts.get(marker.tag).copied().unwrap_or(0) > 0 {
            let pos = stack
                .iter()
                .rposition(|open| open.tag == marker.tag)
                .unwrap_or(0);
            for inner in stack.drain(pos + 1..) {
                if let Some(count) = open_counts.get_mut(inner.tag) {
                    *count -= 1;
                }
                state.report(
                    CompileError::InterleavedEnvironment {
                        inner: inner.tag.to_string(),
                        outer: marker.tag.to_string(),
                        offset: tokens[inner.start].span.start,
                    },
                    Some(slice.slice(inner.start..marker.next).raw()),
                );
            }
            if let Some(open) = stack.pop() {
                if let Some(count) = open_counts.get_mut(open.tag) {
                    *count -= 1;
                }
                regions.push(Region {
                    start: open.start,
                    end: marker.next,
                    kind: SegmentKind::Environment {
                        tag: marker.tag.to_string(),
                    },
                });
            }
        } else {
            state.report(
                CompileError::StrayEnvironmentEnd {
                    tag: marker.tag.to_string(),
                    offset: tokens[i].span.start,
                },
                Some(slice.slice(i..marker.next).raw()),
            );
        }
        i = marker.next;
    }

    for open in stack {
        state.report(
            CompileError::UnmatchedEnvironment {
                tag: open.tag.to_string(),
                offset: tokens[open.start].span.start,
            },
            Some(slice.slice_from(open.start).raw()),
        );
    }

    regions
}

/// Index just past the inline math opened by the `$` at `open`. Chained
/// spans such as `$a$$b$` are skipped together. An unclosed `$` is text.
fn inline_math_end(slice: TokenSlice<'_>, open: usize) -> usize {
    let mut from = open + 1;
    loop {
        match slice.math_close(from, false) {
            Some(close) if matches!(slice.kind(close), Some(TokenKind::DisplayMathShift)) => {
                from = close + 1;
            }
            Some(close) => return close + 1,
            None => return from,
        }
    }
}

/// Index just past the `\end{tag}` closing a verbatim environment whose
/// body starts at `from`. Nothing inside the body is interpreted.
fn verbatim_end(slice: TokenSlice<'_>, from: usize, tag: &str) -> Option<usize> {
    (from..slice.len()).find_map(|i| match slice.env_marker(i) {
        Some(marker) if !marker.is_begin && marker.tag == tag => Some(marker.next),
        _ => None,
    })
}

/// Drop regions contained in an earlier accepted one.
fn outermost(mut regions: Vec<Region>) -> Vec<Region> {
    regions.sort_by_key(|r| (r.start, Reverse(r.end)));
    let mut accepted: Vec<Region> = Vec::with_capacity(regions.len());
    for region in regions {
        match accepted.last() {
            Some(last) if region.start < last.end => {
                if region.end > last.end {
                    log::warn!(
                        "block at tokens {}..{} overlaps {}..{}; keeping the earlier one",
                        region.start,
                        region.end,
                        last.start,
                        last.end
                    );
                }
            }
            _ => accepted.push(region),
        }
    }
    accepted
}

/// Split `range` at blank lines and push the non-empty pieces.
fn push_paragraphs(slice: TokenSlice<'_>, range: Range<usize>, out: &mut Vec<Segment>) {
    let mut start = range.start;
    let mut i = range.start;
    while i < range.end {
        match slice.blank_line_end(i) {
            Some(j) if j < range.end => {
                push_paragraph(slice, start..i, out);
                start = j;
                i = j;
            }
            _ => i += 1,
        }
    }
    push_paragraph(slice, start..range.end, out);
}

fn push_paragraph(slice: TokenSlice<'_>, range: Range<usize>, out: &mut Vec<Segment>) {
    let tokens = slice.tokens();
    let Some(first) = (range.start..range.end).find(|&i| !tokens[i].is_whitespace()) else {
        return;
    };
    let last = (range.start..range.end)
        .rev()
        .find(|&i| !tokens[i].is_whitespace())
        .unwrap_or(first);
    out.push(Segment {
        kind: SegmentKind::Paragraph,
        tokens: first..last + 1,
        span: tokens[first].span.start..tokens[last].span.end,
    });
}

#[cfg(test)]
mod tests {
    use super::super::context::CompileOptions;
    use super::super::engine::tokenize;
    use super::*;
    use crate::utils::report::DiagnosticKind;

    fn blocks(input: &str) -> Vec<(SegmentKind, String)> {
        let options = CompileOptions::default();
        let mut state = CompileState::new(&options);
        let tokens = tokenize(input);
        segment_tokens(TokenSlice::new(input, &tokens), &mut state)
            .into_iter()
            .map(|s| (s.kind, input[s.span].to_string()))
            .collect()
    }

    fn env(tag: &str) -> SegmentKind {
        SegmentKind::Environment {
            tag: tag.to_string(),
        }
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        assert_eq!(
            blocks("one\ntwo\n  \n\nthree  "),
            vec![
                (SegmentKind::Paragraph, "one\ntwo".to_string()),
                (SegmentKind::Paragraph, "three".to_string()),
            ]
        );
    }

    #[test]
    fn test_environment_between_text() {
        assert_eq!(
            blocks("before \\begin{center}x\\end{center} after"),
            vec![
                (SegmentKind::Paragraph, "before".to_string()),
                (env("center"), "\\begin{center}x\\end{center}".to_string()),
                (SegmentKind::Paragraph, "after".to_string()),
            ]
        );
    }

    #[test]
    fn test_contained_regions_are_dropped() {
        let input = "\\begin{center}$$x$$\\begin{itemize}\\item a\\end{itemize}\\end{center}";
        assert_eq!(blocks(input), vec![(env("center"), input.to_string())]);
    }

    #[test]
    fn test_display_math_is_opaque() {
        let input = "$$\\begin{center}$$";
        assert_eq!(blocks(input), vec![(SegmentKind::DisplayMath, input.to_string())]);
    }

    #[test]
    fn test_escaped_dollars_are_not_math() {
        assert_eq!(
            blocks("\\$\\$x\\$\\$"),
            vec![(SegmentKind::Paragraph, "\\$\\$x\\$\\$".to_string())]
        );
    }

    #[test]
    fn test_verbatim_body_is_not_scanned() {
        let input = "\\begin{cpp}printf(\"$$\\begin{x}\");\\end{cpp}";
        assert_eq!(blocks(input), vec![(env("cpp"), input.to_string())]);
    }

    #[test]
    fn test_unmatched_begin_stays_text() {
        let options = CompileOptions::default();
        let mut state = CompileState::new(&options);
        let input = "\\begin{itemize}\\item a";
        let tokens = tokenize(input);
        let segments = segment_tokens(TokenSlice::new(input, &tokens), &mut state);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Paragraph);
        assert_eq!(state.diagnostics()[0].kind, DiagnosticKind::UnmatchedEnvironment);
    }

    #[test]
    fn test_interleaved_environments_use_single_stack() {
        let options = CompileOptions::default();
        let mut state = CompileState::new(&options);
        let input = "\\begin{itemize}\\begin{center}\\end{itemize}\\end{center}";
        let tokens = tokenize(input);
        let segments = segment_tokens(TokenSlice::new(input, &tokens), &mut state);
        assert_eq!(segments[0].kind, env("itemize"));
        assert_eq!(segments[1].kind, SegmentKind::Paragraph);
        let kinds: Vec<DiagnosticKind> = state.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::InterleavedEnvironment,
                DiagnosticKind::StrayEnvironmentEnd
            ]
        );
    }

    #[test]
    fn test_unclosed_display_math_stops_at_blank_line() {
        let options = CompileOptions::default();
        let mut state = CompileState::new(&options);
        let input = "Cost is $$5.\n\n\\begin{itemize}\\item x\\end{itemize}\n\n\\begin{center}c\\end{center}";
        let tokens = tokenize(input);
        let kinds: Vec<SegmentKind> = segment_tokens(TokenSlice::new(input, &tokens), &mut state)
            .into_iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Paragraph, env("itemize"), env("center")]
        );
        assert_eq!(state.diagnostics()[0].kind, DiagnosticKind::UnterminatedMath);
        assert_eq!(state.diagnostics()[0].offset, 8);
    }

    #[test]
    fn test_display_math_does_not_cross_blank_line() {
        assert_eq!(
            blocks("$$a\n\nb$$"),
            vec![
                (SegmentKind::Paragraph, "$$a".to_string()),
                (SegmentKind::Paragraph, "b$$".to_string()),
            ]
        );
    }

    #[test]
    fn test_adjacent_inline_math_is_not_display() {
        assert_eq!(
            blocks("$a$$b$ then \\begin{center}z\\end{center}"),
            vec![
                (SegmentKind::Paragraph, "$a$$b$ then".to_string()),
                (env("center"), "\\begin{center}z\\end{center}".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_math_hides_environment_markers() {
        let input = "$\\begin{center}$ and $\\end{center}$";
        assert_eq!(blocks(input), vec![(SegmentKind::Paragraph, input.to_string())]);
    }

    #[test]
    fn test_many_stray_ends_and_open_verbatim() {
        let options = CompileOptions::default();
        let mut state = CompileState::new(&options);
        let input = format!(
            "{}{}{}",
            "\\begin{a}".repeat(2_000),
            "\\end{b}".repeat(2_000),
            "\\begin{cpp}".repeat(2_000)
        );
        let tokens = tokenize(&input);
        let segments = segment_tokens(TokenSlice::new(&input, &tokens), &mut state);
        assert_eq!(segments.len(), 1);
        assert_eq!(state.diagnostics().len(), 6_000);
    }

    #[test]
    fn test_segmenting_is_idempotent() {
        let input = "a\n\n\\begin{center}$$x$$\\end{center}\n\nb $$y$$ c";
        assert_eq!(blocks(input), blocks(input));
    }
}
