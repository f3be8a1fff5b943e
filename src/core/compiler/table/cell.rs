//! Column specifications and raw cell classification

use std::iter::Peekable;
use std::str::Chars;

use probmark_tree::{Alignment, ColumnSpec};

use super::TableError;
use crate::core::compiler::engine::{Cursor, TokenSlice};
use crate::core::compiler::utils::parse_positive;

/// Parse a colspec such as `|l|c|r|` or `lp{3cm}`.
///
/// `|` marks a left border on the next column; a `|` after the last column
/// is that column's right border. Paragraph columns (`p`, `m`, `b`) are
/// laid out as left-aligned.
pub fn parse_column_spec(raw: &str) -> Result<Vec<ColumnSpec>, TableError> {
    let mut columns: Vec<ColumnSpec> = Vec::new();
    let mut pending_border = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        let align = match c {
            c if c.is_whitespace() => continue,
            '|' => {
                pending_border = true;
                continue;
            }
            'l' => Alignment::Left,
            'c' => Alignment::Center,
            'r' => Alignment::Right,
            'p' | 'm' | 'b' => {
                skip_width(&mut chars, c)?;
                Alignment::Left
            }
            found => return Err(TableError::InvalidColumnSpec { found }),
        };
        columns.push(ColumnSpec {
            align,
            left_border: std::mem::take(&mut pending_border),
            right_border: false,
        });
    }

    if pending_border {
        match columns.last_mut() {
            Some(last) => last.right_border = true,
            None => return Err(TableError::EmptyColumnSpec),
        }
    }
    if columns.is_empty() {
        return Err(TableError::EmptyColumnSpec);
    }
    Ok(columns)
}

/// The `{width}` after a `p`, `m` or `b` column.
fn skip_width(chars: &mut Peekable<Chars<'_>>, column: char) -> Result<(), TableError> {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    if chars.next_if_eq(&'{').is_none() {
        return Err(TableError::InvalidColumnSpec { found: column });
    }
    let mut depth = 1usize;
    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Err(TableError::UnbalancedArguments {
        command: column.to_string(),
    })
}

/// Parse the alignment argument of `\multicolumn`, which describes one column.
pub fn parse_cell_spec(raw: &str) -> Result<ColumnSpec, TableError> {
    match parse_column_spec(raw)?.as_slice() {
        [spec] => Ok(*spec),
        _ => Err(TableError::InvalidCellSpec {
            spec: raw.trim().to_string(),
        }),
    }
}

/// One `&`-separated cell before layout.
#[derive(Debug, Clone, Copy)]
pub struct RawCell<'a> {
    pub row_span: usize,
    pub col_span: usize,
    /// Alignment and borders overriding the column's, from `\multicolumn`
    pub spec: Option<ColumnSpec>,
    pub content: TokenSlice<'a>,
}

impl<'a> RawCell<'a> {
    /// Classify a cell as `\multicolumn`, `\multirow` or plain text.
    /// `\multirow` may sit inside the content of `\multicolumn`.
    pub fn parse(raw: TokenSlice<'a>) -> Result<Self, TableError> {
        let raw = raw.trim();
        let plain = RawCell {
            row_span: 1,
            col_span: 1,
            spec: None,
            content: raw,
        };
        let Some(command) = raw.get(0).and_then(|t| t.as_control_seq()) else {
            return Ok(plain);
        };

        match command {
            "multicolumn" => {
                let mut cursor = raw.cursor();
                cursor.bump();
                let [span, align, content] = read_args(&mut cursor, command, false)?;
                let inner = RawCell::parse(content)?;
                if inner.col_span > 1 {
                    return Err(TableError::InvalidSpan {
                        command: command.to_string(),
                        value: content.raw().to_string(),
                    });
                }
                Ok(RawCell {
                    row_span: inner.row_span,
                    col_span: span_count(command, span)?,
                    spec: Some(parse_cell_spec(align.raw())?),
                    content: inner.content,
                })
            }
            "multirow" => {
                let mut cursor = raw.cursor();
                cursor.bump();
                let [span, _width, content] = read_args(&mut cursor, command, true)?;
                Ok(RawCell {
                    row_span: span_count(command, span)?,
                    col_span: 1,
                    spec: None,
                    content: content.trim(),
                })
            }
            _ => Ok(plain),
        }
    }

    /// An empty cell standing in for a column covered from an earlier row.
    pub fn is_placeholder(&self) -> bool {
        self.row_span == 1 && self.content.is_blank()
    }
}

/// Read the three brace arguments of a spanning command. `\multirow` also
/// takes `[..]` options between them, which are skipped.
fn read_args<'a>(
    cursor: &mut Cursor<'a>,
    command: &str,
    options: bool,
) -> Result<[TokenSlice<'a>; 3], TableError> {
    let args = [
        read_arg(cursor, command, options)?,
        read_arg(cursor, command, options)?,
        read_arg(cursor, command, options)?,
    ];
    if !cursor.rest().is_blank() {
        return Err(TableError::TrailingText {
            command: command.to_string(),
        });
    }
    Ok(args)
}

fn read_arg<'a>(
    cursor: &mut Cursor<'a>,
    command: &str,
    options: bool,
) -> Result<TokenSlice<'a>, TableError> {
    cursor.skip_whitespace();
    if options {
        cursor.skip_bracket_option();
        cursor.skip_whitespace();
    }
    match cursor.read_group() {
        Ok(Some(group)) => Ok(group),
        _ => Err(TableError::UnbalancedArguments {
            command: command.to_string(),
        }),
    }
}

fn span_count(command: &str, arg: TokenSlice<'_>) -> Result<usize, TableError> {
    parse_positive(arg.raw()).ok_or_else(|| TableError::InvalidSpan {
        command: command.to_string(),
        value: arg.raw().trim().to_string(),
    })
}
