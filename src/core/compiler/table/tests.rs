//! Regression tests for table layout

use super::*;
use crate::core::compiler::context::{CompileOptions, CompileState};
use crate::core::compiler::engine::{tokenize, TokenSlice};
use pretty_assertions::assert_eq;
use probmark_tree::{Alignment, Cell, DocumentNode, GridPos, Style, Table};

fn layout(body: &str) -> Result<Table, TableError> {
    let options = CompileOptions::default();
    let mut state = CompileState::new(&options);
    let tokens = tokenize(body);
    parse_tabular(TokenSlice::new(body, &tokens), &mut state)
}

fn table(body: &str) -> Table {
    let table = layout(body).unwrap();
    assert!(table.is_fully_tiled(), "not tiled: {:#?}", table);
    table
}

fn texts(table: &Table, row: usize) -> Vec<Option<String>> {
    table.rows[row]
        .iter()
        .map(|cell| {
            cell.content
                .as_ref()
                .map(|nodes| nodes.iter().map(DocumentNode::plain_text).collect())
        })
        .collect()
}

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

#[test]
fn test_basic_table() {
    let t = table("{lcr} A & B & C \\\\ 1 & 2 & 3");
    assert_eq!(t.column_count(), 3);
    assert_eq!(texts(&t, 0), vec![some("A"), some("B"), some("C")]);
    assert_eq!(texts(&t, 1), vec![some("1"), some("2"), some("3")]);
    assert_eq!(t.rows[1][2].align, Alignment::Right);
}

#[test]
fn test_multicolumn_spans_a_row() {
    let t = table("{|c|c|}\\multicolumn{2}{|c|}{Title} \\\\ A & B");
    let title = &t.rows[0][0];
    assert!(title.visible);
    assert_eq!(title.col_span, 2);
    assert!(title.left_border && title.right_border);
    assert_eq!(t.rows[0][1].visible, false);
    assert_eq!(t.rows[0][1].covered_by, Some(GridPos::new(0, 0)));
    assert_eq!(texts(&t, 1), vec![some("A"), some("B")]);
    assert!(t.rows[1].iter().all(|cell| cell.visible));
}

#[test]
fn test_multirow_covers_next_row() {
    let t = table("{|c|c|}\\multirow{2}{*}{X} & A \\\\ & B");
    assert_eq!(t.rows[0][0].row_span, 2);
    assert_eq!(texts(&t, 0), vec![some("X"), some("A")]);
    assert_eq!(
        t.rows[1][0],
        Cell {
            bottom_border: true,
            left_border: true,
            ..Cell::covered(GridPos::new(0, 0), t.columns[0])
        }
    );
    assert_eq!(texts(&t, 1), vec![None, some("B")]);
}

#[test]
fn test_multirow_without_placeholder() {
    // Text meant for the next free column is not swallowed by the span
    let t = table("{ccc}\\multirow{2}{*}{X} & A & B \\\\ C & D");
    assert_eq!(texts(&t, 1), vec![None, some("C"), some("D")]);
}

#[test]
fn test_multirow_inside_multicolumn() {
    let t = table(
        "{cccc}\\multicolumn{2}{c}{\\multirow{2}{*}{Big}} & a & b \\\\ \\multicolumn{2}{c}{} & c & d \\\\ e & f & g & h",
    );
    let owner = &t.rows[0][0];
    assert_eq!((owner.row_span, owner.col_span), (2, 2));
    assert_eq!(texts(&t, 1), vec![None, None, some("c"), some("d")]);
    assert_eq!(t.rows[1][1].covered_by, Some(GridPos::new(0, 0)));
    assert_eq!(texts(&t, 2), vec![some("e"), some("f"), some("g"), some("h")]);
}

#[test]
fn test_sparse_rows_are_padded() {
    let t = table("{ccc} A & & B \\\\ C");
    assert_eq!(texts(&t, 0), vec![some("A"), some(""), some("B")]);
    assert_eq!(texts(&t, 1), vec![some("C"), some(""), some("")]);
}

#[test]
fn test_hlines_and_clines() {
    let t = table("{cc}\\hline A & B \\\\ \\cline{2-2} C & D \\\\ \\hline");
    assert!(t.rows[0].iter().all(|cell| cell.top_border));
    assert_eq!(t.rows[0][0].bottom_border, false);
    assert!(t.rows[0][1].bottom_border);
    assert!(t.rows[1].iter().all(|cell| !cell.top_border));
    assert!(t.rows[1].iter().all(|cell| cell.bottom_border));
    assert_eq!(t.row_count(), 2);
}

#[test]
fn test_hline_between_rows_marks_the_next_row() {
    let t = table("{c} A \\\\ \\hline B");
    assert_eq!(t.rows[0][0].top_border, false);
    assert!(t.rows[1][0].top_border);
}

#[test]
fn test_last_row_always_closes() {
    let t = table("{c} A \\\\ B \\\\");
    assert_eq!(t.row_count(), 2);
    assert_eq!(t.rows[0][0].bottom_border, false);
    assert!(t.rows[1][0].bottom_border);
}

#[test]
fn test_overhanging_multirow_is_clamped() {
    let t = table("{cc}\\multirow{3}{*}{X} & A \\\\ & B");
    assert_eq!(t.rows[0][0].row_span, 2);
    assert!(t.rows[0][0].bottom_border);
}

#[test]
fn test_escaped_ampersand_and_nested_markup() {
    let t = table("{cc}\\textbf{a \\& b} & {x & y} \\\\ $a_{i}$ & z");
    assert_eq!(
        t.rows[0][0].content,
        Some(vec![DocumentNode::styled(
            Style::Bold,
            vec![DocumentNode::text("a & b")]
        )])
    );
    assert_eq!(texts(&t, 0)[1], some("x & y"));
    assert_eq!(
        t.rows[1][0].content,
        Some(vec![DocumentNode::math("a_{i}", false)])
    );
}

#[test]
fn test_optional_arguments() {
    let t = table("[t]{cc} a & b \\\\[2pt] c & d \\tabularnewline e & f");
    assert_eq!(t.row_count(), 3);
    assert_eq!(texts(&t, 1), vec![some("c"), some("d")]);
}

#[test]
fn test_errors() {
    let cases = [
        ("A & B", TableError::MissingColumnSpec),
        ("{cc", TableError::UnbalancedArguments {
            command: "tabular".into(),
        }),
        ("{c?}", TableError::InvalidColumnSpec { found: '?' }),
        ("{}", TableError::EmptyColumnSpec),
        (
            "{cc} a & b & c",
            TableError::TooManyCells {
                row: 0,
                found: 3,
                expected: 2,
            },
        ),
        (
            "{cc} a & \\multicolumn{2}{c}{b}",
            TableError::SpanOverflow {
                row: 0,
                col: 1,
                span: 2,
                columns: 2,
            },
        ),
        (
            "{ccc} a & \\multirow{2}{*}{b} & c \\\\ \\multicolumn{2}{c}{x} & y",
            TableError::SpanConflict { row: 1, col: 1 },
        ),
        (
            "{cc} \\multirow{x}{*}{a} & b",
            TableError::InvalidSpan {
                command: "multirow".into(),
                value: "x".into(),
            },
        ),
        (
            "{cc} a & b \\\\ \\cline{2-1} c & d",
            TableError::InvalidCline {
                range: "2-1".into(),
            },
        ),
    ];
    for (body, expected) in cases {
        assert_eq!(layout(body), Err(expected), "body: {}", body);
    }
}

#[test]
fn test_trailing_ampersand_is_tolerated() {
    let t = table("{cc} a & b & \\\\ c & d");
    assert_eq!(texts(&t, 0), vec![some("a"), some("b")]);
}
