//! Horizontal rules at the start of a table row

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use super::TableError;
use crate::core::compiler::engine::TokenSlice;

lazy_static! {
    /// `\cline{a-b}` argument, one-based and inclusive
    static ref CLINE_RANGE: Regex = Regex::new(r"^\s*(\d+)\s*-\s*(\d+)\s*$").unwrap();
}

/// Full-width rules; the booktabs ones are drawn like `\hline`.
const FULL_RULES: &[&str] = &["hline", "toprule", "midrule", "bottomrule"];

/// Rules written before the cells of a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRules {
    /// At least one `\hline` precedes the row
    pub hline: bool,
    /// Zero-based column ranges from `\cline`
    pub clines: Vec<Range<usize>>,
}

impl RowRules {
    pub fn is_empty(&self) -> bool {
        !self.hline && self.clines.is_empty()
    }
}

/// Strip the leading `\hline` / `\cline{a-b}` tokens of a raw row and
/// return them together with the rest of the row.
pub fn take_rules(row: TokenSlice<'_>) -> Result<(RowRules, TokenSlice<'_>), TableError> {
    let mut rules = RowRules::default();
    let mut cursor = row.cursor();

    loop {
        cursor.skip_whitespace();
        let Some(name) = cursor.peek().and_then(|t| t.as_control_seq()) else {
            break;
        };
        if FULL_RULES.contains(&name) {
            cursor.bump();
            rules.hline = true;
            // booktabs rules take an optional thickness
            cursor.skip_bracket_option();
        } else if name == "cline" {
            cursor.bump();
            let arg = match cursor.read_group() {
                Ok(Some(arg)) => arg,
                _ => {
                    return Err(TableError::UnbalancedArguments {
                        command: name.to_string(),
                    })
                }
            };
            rules.clines.push(parse_cline(arg.raw())?);
        } else {
            break;
        }
    }

    Ok((rules, cursor.rest()))
}

/// `2-3` to the zero-based range `1..3`.
fn parse_cline(raw: &str) -> Result<Range<usize>, TableError> {
    let invalid = || TableError::InvalidCline {
        range: raw.trim().to_string(),
    };
    let caps = CLINE_RANGE.captures(raw).ok_or_else(invalid)?;
    let start: usize = caps[1].parse().map_err(|_| invalid())?;
    let end: usize = caps[2].parse().map_err(|_| invalid())?;
    if start == 0 || end < start {
        return Err(invalid());
    }
    Ok(start - 1..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compiler::engine::tokenize;

    #[test]
    fn test_take_rules() {
        let src = " \\hline \\cline{2-3}\\cline{ 1 - 1 } a & b";
        let tokens = tokenize(src);
        let (rules, rest) = take_rules(TokenSlice::new(src, &tokens)).unwrap();
        assert!(rules.hline);
        assert_eq!(rules.clines, vec![1..3, 0..1]);
        assert_eq!(rest.raw(), "a & b");
    }

    #[test]
    fn test_no_rules() {
        let src = "\\textbf{a} & \\hline";
        let tokens = tokenize(src);
        let (rules, rest) = take_rules(TokenSlice::new(src, &tokens)).unwrap();
        assert!(rules.is_empty());
        assert_eq!(rest.raw(), src);
    }

    #[test]
    fn test_booktabs_rules() {
        let src = "\\toprule[1pt]";
        let tokens = tokenize(src);
        let (rules, rest) = take_rules(TokenSlice::new(src, &tokens)).unwrap();
        assert!(rules.hline);
        assert!(rest.is_blank());
    }

    #[test]
    fn test_invalid_cline() {
        assert_eq!(
            parse_cline("3-1"),
            Err(TableError::InvalidCline {
                range: "3-1".to_string()
            })
        );
        assert!(parse_cline("0-2").is_err());
        assert!(parse_cline("a-b").is_err());
    }
}
