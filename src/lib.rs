//! probmark: compiler for competitive-programming problem markup
//!
//! Problem statements are written in a LaTeX-like dialect: inline styling,
//! math, lists, collapsible hints, code and sample blocks, and tables with
//! spanning cells. This crate turns that markup into a [`Document`] tree for
//! a presentation layer to render. Math is forwarded untouched.
//!
//! ```
//! use probmark::{compile, DocumentNode};
//!
//! let doc = compile("Print \\textbf{one} integer.");
//! assert!(matches!(doc.nodes[0], DocumentNode::Paragraph { .. }));
//! ```

pub mod core;
pub mod utils;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use crate::core::compiler::{
    compile, compile_with_options, compile_with_report, parse_inline, segment, CompileOptions,
    Segment, SegmentKind,
};
pub use crate::utils::{CompileError, CompileReport, Diagnostic, DiagnosticKind, Severity};
pub use probmark_tree::{
    Alignment, Cell, CodeLanguage, ColumnSpec, Document, DocumentNode, GridPos, List, ListItem,
    SizeLevel, Style, Table, TheoremKind,
};
