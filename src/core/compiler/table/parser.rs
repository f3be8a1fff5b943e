//! State-aware table grid parser

use std::ops::Range;

use probmark_tree::{Cell, ColumnSpec, GridPos, Table};

use super::cell::{parse_column_spec, RawCell};
use super::hline::take_rules;
use super::TableError;
use crate::core::compiler::context::CompileState;
use crate::core::compiler::engine::{TokenKind, TokenSlice};
use crate::core::compiler::markup::parse_inline;

/// A spanning cell still covering columns of the rows below it.
#[derive(Debug, Clone)]
struct ActiveSpan {
    owner: GridPos,
    columns: Range<usize>,
    rows_remaining: usize,
}

/// Lays out rows one at a time against a fixed column spec.
///
/// Columns claimed by a `\multirow` from an earlier row are tracked in an
/// active-span list that lives only as long as the parser.
#[derive(Debug)]
pub struct TableGridParser {
    columns: Vec<ColumnSpec>,
    active: Vec<ActiveSpan>,
    rows: Vec<Vec<Cell>>,
    /// `\hline` waiting for the next row with cells
    pending_hline: bool,
    /// `\cline` ranges seen before the first row
    pending_clines: Vec<Range<usize>>,
}

impl TableGridParser {
    /// Create a new parser for the given columns
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        TableGridParser {
            columns,
            active: Vec::new(),
            rows: Vec::new(),
            pending_hline: false,
            pending_clines: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A full rule above the next row with cells
    pub fn add_hline(&mut self) {
        self.pending_hline = true;
    }

    /// A partial rule below the previous row, or above the first one
    pub fn add_cline(&mut self, columns: Range<usize>) {
        let width = self.columns.len();
        let columns = columns.start.min(width)..columns.end.min(width);
        match self.rows.last_mut() {
            Some(row) => {
                for cell in &mut row[columns] {
                    cell.bottom_border = true;
                }
            }
            None => self.pending_clines.push(columns),
        }
    }

    fn owner_at(&self, col: usize) -> Option<&ActiveSpan> {
        self.active
            .iter()
            .find(|span| span.rows_remaining > 0 && span.columns.contains(&col))
    }

    /// Lay out one row of raw `&`-separated cells.
    pub fn process_row(
        &mut self,
        raw_cells: &[TokenSlice<'_>],
        state: &mut CompileState,
    ) -> Result<(), TableError> {
        let row = self.rows.len();
        let width = self.columns.len();
        let mut cells: Vec<Cell> = Vec::with_capacity(width);
        let mut input = raw_cells.iter().peekable();
        // Columns still absorbed by a `\multicolumn` placeholder
        let mut placeholder_credit = 0usize;
        let mut col = 0usize;

        while col < width {
            if let Some(span) = self.owner_at(col) {
                cells.push(Cell::covered(span.owner, self.columns[col]));
                if placeholder_credit > 0 {
                    placeholder_credit -= 1;
                } else if let Some(raw) = input.peek() {
                    let placeholder = RawCell::parse(**raw)?;
                    // Text in a covered column belongs to the next free one
                    if placeholder.is_placeholder() {
                        input.next();
                        placeholder_credit = placeholder.col_span - 1;
                    }
                }
                col += 1;
                continue;
            }
            placeholder_credit = 0;

            let Some(raw) = input.next() else {
                cells.push(Cell::empty(self.columns[col]));
                col += 1;
                continue;
            };
            let parsed = RawCell::parse(*raw)?;
            let span = parsed.col_span;
            if col + span > width {
                return Err(TableError::SpanOverflow {
                    row,
                    col,
                    span,
                    columns: width,
                });
            }
            if let Some(blocked) = (col + 1..col + span).find(|&c| self.owner_at(c).is_some()) {
                return Err(TableError::SpanConflict { row, col: blocked });
            }

            let owner = GridPos::new(row, col);
            let spec = parsed.spec.unwrap_or(self.columns[col]);
            let mut cell = Cell::visible(parse_inline(parsed.content, state), spec);
            cell.row_span = parsed.row_span;
            cell.col_span = span;
            cells.push(cell);
            for c in col + 1..col + span {
                cells.push(Cell::covered(owner, self.columns[c]));
            }
            if parsed.row_span > 1 {
                self.active.push(ActiveSpan {
                    owner,
                    columns: col..col + span,
                    rows_remaining: parsed.row_span,
                });
            }
            col += span;
        }

        let leftover = input.filter(|raw| !raw.is_blank()).count();
        if leftover > 0 {
            return Err(TableError::TooManyCells {
                row,
                found: raw_cells.len(),
                expected: width,
            });
        }

        if std::mem::take(&mut self.pending_hline) {
            for cell in &mut cells {
                cell.top_border = true;
            }
        }
        for columns in std::mem::take(&mut self.pending_clines) {
            for cell in &mut cells[columns] {
                cell.top_border = true;
            }
        }

        // The owning row counts as the first of each span
        for span in &mut self.active {
            span.rows_remaining -= 1;
        }
        self.active.retain(|span| span.rows_remaining > 0);
        self.rows.push(cells);
        Ok(())
    }

    /// Close the table: spans running past the last row are shortened and
    /// the last row gets its bottom border.
    pub fn finish(mut self) -> Table {
        for span in std::mem::take(&mut self.active) {
            let GridPos { row, col } = span.owner;
            log::warn!(
                "cell at row {}, column {} spans {} rows past the end of the table",
                row,
                col,
                span.rows_remaining
            );
            self.rows[row][col].row_span -= span.rows_remaining;
        }

        if let Some(last) = self.rows.len().checked_sub(1) {
            let mut owners = Vec::new();
            for cell in &mut self.rows[last] {
                cell.bottom_border = true;
                owners.extend(cell.covered_by);
            }
            for owner in owners {
                self.rows[owner.row][owner.col].bottom_border = true;
            }
        }

        Table {
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Lay out the body of a `tabular` environment, starting at its column spec.
pub fn parse_tabular(body: TokenSlice<'_>, state: &mut CompileState) -> Result<Table, TableError> {
    let mut cursor = body.cursor();
    cursor.skip_whitespace();
    cursor.skip_bracket_option();
    cursor.skip_whitespace();
    let colspec = match cursor.read_group() {
        Ok(Some(colspec)) => colspec,
        Ok(None) => return Err(TableError::MissingColumnSpec),
        Err(_) => {
            return Err(TableError::UnbalancedArguments {
                command: "tabular".to_string(),
            })
        }
    };
    let mut parser = TableGridParser::new(parse_column_spec(colspec.raw())?);

    let rows = cursor.rest().split_top_level(|t| {
        matches!(t.kind, TokenKind::Escaped('\\')) || t.is_cs("tabularnewline")
    });
    for (index, raw_row) in rows.into_iter().enumerate() {
        let mut row = raw_row.cursor();
        // `\\[2pt]` spacing
        if index > 0 {
            row.skip_bracket_option();
        }
        let (rules, rest) = take_rules(row.rest())?;
        if rules.hline {
            parser.add_hline();
        }
        for columns in rules.clines {
            parser.add_cline(columns);
        }
        if rest.is_blank() {
            continue;
        }
        let cells = rest.split_top_level(|t| matches!(t.kind, TokenKind::AlignTab));
        parser.process_row(&cells, state)?;
    }

    let table = parser.finish();
    log::debug!(
        "laid out table with {} rows and {} columns",
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}
