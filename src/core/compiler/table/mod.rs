//! Table layout for `tabular`
//!
//! - `cell`: column specs and `\multirow` / `\multicolumn` cell parsing
//! - `hline`: `\hline` and `\cline` extraction at the start of a row
//! - `parser`: the row-by-row grid walk that assigns spans

mod cell;
mod hline;
mod parser;

#[cfg(test)]
mod tests;

use thiserror::Error;

pub use cell::{parse_cell_spec, parse_column_spec};
pub use parser::{parse_tabular, TableGridParser};

/// Why a `tabular` could not be laid out. The whole table then degrades
/// to a diagnostic node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("missing column specification")]
    MissingColumnSpec,

    #[error("empty column specification")]
    EmptyColumnSpec,

    #[error("unsupported column type '{found}'")]
    InvalidColumnSpec { found: char },

    #[error("cell alignment '{spec}' must describe exactly one column")]
    InvalidCellSpec { spec: String },

    #[error("'\\{command}' needs a positive span, got '{value}'")]
    InvalidSpan { command: String, value: String },

    #[error("missing or unclosed argument of '\\{command}'")]
    UnbalancedArguments { command: String },

    #[error("unexpected text after '\\{command}'")]
    TrailingText { command: String },

    #[error("cell at row {row}, column {col} spans {span} columns but the table has {columns}")]
    SpanOverflow {
        row: usize,
        col: usize,
        span: usize,
        columns: usize,
    },

    #[error("cell at row {row}, column {col} overlaps a cell spanning from an earlier row")]
    SpanConflict { row: usize, col: usize },

    #[error("row {row} has {found} cells but the table has {expected} columns")]
    TooManyCells {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("invalid \\cline range '{range}'")]
    InvalidCline { range: String },
}
