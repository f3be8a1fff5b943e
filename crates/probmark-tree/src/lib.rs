//! Document tree produced by the probmark markup compiler.
//!
//! The tree is built fresh for every compilation and handed to the caller,
//! which owns it from then on. Nothing in here interprets markup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<DocumentNode>,
}

impl Document {
    pub fn new(nodes: Vec<DocumentNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flatten the tree into readable text, one blank line between blocks.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            node.write_plain_text(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentNode {
    TextRun {
        text: String,
    },
    StyledSpan {
        style: Style,
        children: Vec<DocumentNode>,
    },
    Link {
        target: String,
        children: Vec<DocumentNode>,
    },
    RawUrl {
        target: String,
    },
    Heading {
        level: u8,
        children: Vec<DocumentNode>,
    },
    /// Opaque math payload, delimiters already stripped.
    MathSpan {
        raw_latex: String,
        is_display: bool,
    },
    Paragraph {
        children: Vec<DocumentNode>,
    },
    List(List),
    Collapsible {
        summary: Vec<DocumentNode>,
        body: Vec<DocumentNode>,
    },
    CodeBlock {
        language: CodeLanguage,
        source: String,
    },
    ExampleBlock {
        input: String,
        output: String,
    },
    TheoremLike {
        theorem: TheoremKind,
        body: Vec<DocumentNode>,
    },
    Centered {
        body: Vec<DocumentNode>,
    },
    Table(Table),
    /// A region that could not be compiled, kept as its raw source.
    Diagnostic {
        message: String,
        source: String,
    },
}

impl DocumentNode {
    pub fn text(s: impl Into<String>) -> Self {
        DocumentNode::TextRun { text: s.into() }
    }

    pub fn styled(style: Style, children: Vec<DocumentNode>) -> Self {
        DocumentNode::StyledSpan { style, children }
    }

    pub fn math(raw_latex: impl Into<String>, is_display: bool) -> Self {
        DocumentNode::MathSpan {
            raw_latex: raw_latex.into(),
            is_display,
        }
    }

    pub fn paragraph(children: Vec<DocumentNode>) -> Self {
        DocumentNode::Paragraph { children }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DocumentNode::TextRun { text } => Some(text),
            _ => None,
        }
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    fn write_plain_text(&self, out: &mut String) {
        match self {
            DocumentNode::TextRun { text } => out.push_str(text),
            DocumentNode::StyledSpan { children, .. }
            | DocumentNode::Link { children, .. }
            | DocumentNode::Heading { children, .. }
            | DocumentNode::Paragraph { children } => write_all(children, out),
            DocumentNode::RawUrl { target } => out.push_str(target),
            DocumentNode::MathSpan {
                raw_latex,
                is_display,
            } => {
                let delim = if *is_display { "$$" } else { "$" };
                out.push_str(delim);
                out.push_str(raw_latex);
                out.push_str(delim);
            }
            DocumentNode::List(list) => {
                for (i, item) in list.items.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    if list.ordered {
                        out.push_str(&format!("{}. ", i + 1));
                    } else {
                        out.push_str("- ");
                    }
                    write_all(&item.children, out);
                }
            }
            DocumentNode::Collapsible { summary, body } => {
                write_all(summary, out);
                out.push('\n');
                write_all(body, out);
            }
            DocumentNode::CodeBlock { source, .. } => out.push_str(source),
            DocumentNode::ExampleBlock { input, output } => {
                out.push_str(input);
                out.push('\n');
                out.push_str(output);
            }
            DocumentNode::TheoremLike { body, .. } | DocumentNode::Centered { body } => {
                write_all(body, out)
            }
            DocumentNode::Table(table) => {
                for (r, row) in table.rows.iter().enumerate() {
                    if r > 0 {
                        out.push('\n');
                    }
                    let texts: Vec<String> = row
                        .iter()
                        .filter(|cell| cell.visible)
                        .map(|cell| {
                            let mut s = String::new();
                            if let Some(content) = &cell.content {
                                write_all(content, &mut s);
                            }
                            s
                        })
                        .collect();
                    out.push_str(&texts.join("\t"));
                }
            }
            DocumentNode::Diagnostic { source, .. } => out.push_str(source),
        }
    }
}

fn write_all(nodes: &[DocumentNode], out: &mut String) {
    for node in nodes {
        node.write_plain_text(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Bold,
    Italic,
    Monospace,
    Underline,
    Strikethrough,
    SmallCaps,
    Boxed,
    Size(SizeLevel),
    Color(String),
}

/// Relative text sizes, smallest first. Serialized under the command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeLevel {
    #[serde(rename = "tiny")]
    Tiny,
    #[serde(rename = "scriptsize")]
    ScriptSize,
    #[serde(rename = "footnotesize")]
    FootnoteSize,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "Large")]
    Larger,
    #[serde(rename = "LARGE")]
    Largest,
    #[serde(rename = "huge")]
    Huge,
    #[serde(rename = "Huge")]
    Huger,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListItem {
    pub children: Vec<DocumentNode>,
}

impl ListItem {
    pub fn new(children: Vec<DocumentNode>) -> Self {
        Self { children }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeLanguage {
    Cpp,
    Java,
    Python,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheoremKind {
    Theorem,
    Lemma,
    Definition,
    Corollary,
    Proof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub align: Alignment,
    pub left_border: bool,
    pub right_border: bool,
}

/// Grid coordinates of a cell, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// `None` for cells covered by a span.
    pub content: Option<Vec<DocumentNode>>,
    pub row_span: usize,
    pub col_span: usize,
    pub align: Alignment,
    pub left_border: bool,
    pub right_border: bool,
    pub top_border: bool,
    pub bottom_border: bool,
    pub visible: bool,
    pub covered_by: Option<GridPos>,
}

impl Cell {
    pub fn visible(content: Vec<DocumentNode>, spec: ColumnSpec) -> Self {
        Cell {
            content: Some(content),
            row_span: 1,
            col_span: 1,
            align: spec.align,
            left_border: spec.left_border,
            right_border: spec.right_border,
            top_border: false,
            bottom_border: false,
            visible: true,
            covered_by: None,
        }
    }

    pub fn empty(spec: ColumnSpec) -> Self {
        Cell::visible(Vec::new(), spec)
    }

    pub fn covered(owner: GridPos, spec: ColumnSpec) -> Self {
        Cell {
            content: None,
            visible: false,
            covered_by: Some(owner),
            ..Cell::visible(Vec::new(), spec)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// The visible cell responsible for `(row, col)`.
    pub fn owner_of(&self, row: usize, col: usize) -> Option<GridPos> {
        let cell = self.cell(row, col)?;
        if cell.visible {
            Some(GridPos::new(row, col))
        } else {
            cell.covered_by
        }
    }

    /// Checks that visible cells' spans cover every grid slot exactly once
    /// and that each invisible cell points at the span covering it.
    pub fn is_fully_tiled(&self) -> bool {
        let width = self.columns.len();
        if self.rows.iter().any(|row| row.len() != width) {
            return false;
        }
        let mut claimed: Vec<Vec<Option<GridPos>>> = vec![vec![None; width]; self.rows.len()];
        for (r, row) in self.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if !cell.visible {
                    continue;
                }
                if cell.row_span == 0 || cell.col_span == 0 {
                    return false;
                }
                for rr in r..r + cell.row_span {
                    for cc in c..c + cell.col_span {
                        match claimed.get_mut(rr).and_then(|row| row.get_mut(cc)) {
                            Some(slot @ None) => *slot = Some(GridPos::new(r, c)),
                            _ => return false,
                        }
                    }
                }
            }
        }
        self.rows.iter().enumerate().all(|(r, row)| {
            row.iter().enumerate().all(|(c, cell)| {
                let owner = claimed[r][c];
                if cell.visible {
                    owner == Some(GridPos::new(r, c))
                } else {
                    owner.is_some() && owner == cell.covered_by
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ColumnSpec {
        ColumnSpec::default()
    }

    #[test]
    fn test_plain_text_of_nested_nodes() {
        let doc = Document::new(vec![
            DocumentNode::paragraph(vec![
                DocumentNode::text("a "),
                DocumentNode::styled(Style::Bold, vec![DocumentNode::text("b")]),
                DocumentNode::math("x^2", false),
            ]),
            DocumentNode::List(List {
                ordered: true,
                items: vec![ListItem::new(vec![DocumentNode::text("one")])],
            }),
        ]);
        assert_eq!(doc.plain_text(), "a b$x^2$\n\n1. one");
    }

    #[test]
    fn test_tiling_accepts_spans() {
        let mut owner = Cell::visible(vec![DocumentNode::text("X")], spec());
        owner.row_span = 2;
        owner.col_span = 2;
        let table = Table {
            columns: vec![spec(); 2],
            rows: vec![
                vec![owner, Cell::covered(GridPos::new(0, 0), spec())],
                vec![
                    Cell::covered(GridPos::new(0, 0), spec()),
                    Cell::covered(GridPos::new(0, 0), spec()),
                ],
            ],
        };
        assert!(table.is_fully_tiled());
        assert_eq!(table.owner_of(1, 1), Some(GridPos::new(0, 0)));
    }

    #[test]
    fn test_tiling_rejects_overlap_and_gaps() {
        let mut wide = Cell::empty(spec());
        wide.col_span = 2;
        let overlapping = Table {
            columns: vec![spec(); 2],
            rows: vec![vec![wide.clone(), Cell::empty(spec())]],
        };
        assert!(!overlapping.is_fully_tiled());

        let dangling = Table {
            columns: vec![spec(); 2],
            rows: vec![vec![
                Cell::empty(spec()),
                Cell::covered(GridPos::new(0, 0), spec()),
            ]],
        };
        assert!(!dangling.is_fully_tiled());
    }

    #[test]
    fn test_serialized_shape() {
        let node = DocumentNode::styled(
            Style::Color("red".to_string()),
            vec![DocumentNode::text("hot")],
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "styled_span");
        assert_eq!(json["style"]["color"], "red");
        assert_eq!(json["children"][0]["text"], "hot");
    }
}
