//! Error types for the markup compiler
//!
//! None of these reach the caller of `compile`: every error is caught at
//! the smallest enclosing region, turned into a literal or diagnostic node,
//! and recorded in the compile report.

use thiserror::Error;

use crate::core::compiler::table::TableError;

/// A local failure inside one region of the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// `\begin{tag}` with no corresponding `\end{tag}`
    #[error("environment '{tag}' is never closed")]
    UnmatchedEnvironment { tag: String, offset: usize },

    /// `\end{tag}` with no open `\begin{tag}`
    #[error("'\\end{{{tag}}}' has no matching begin")]
    StrayEnvironmentEnd { tag: String, offset: usize },

    /// `\end{outer}` reached while `inner` was still open
    #[error("environment '{inner}' is still open when '{outer}' ends")]
    InterleavedEnvironment {
        inner: String,
        outer: String,
        offset: usize,
    },

    /// A command argument whose `{` never closes
    #[error("argument of '\\{command}' is never closed")]
    UnterminatedArgument { command: String, offset: usize },

    /// A `$` or `$$` with no closing delimiter
    #[error("math delimiter '{delimiter}' is never closed")]
    UnterminatedMath {
        delimiter: &'static str,
        offset: usize,
    },

    /// A bare `{` with no matching `}`
    #[error("unbalanced '{{' in text")]
    UnbalancedBrace { offset: usize },

    #[error("malformed table: {source}")]
    MalformedTable {
        #[source]
        source: TableError,
        offset: usize,
    },

    #[error("unknown environment '{tag}'")]
    UnknownEnvironment { tag: String, offset: usize },

    /// A command that is not in the command tables; kept as literal text
    #[error("unknown command '\\{name}' kept as text")]
    UnknownCommand { name: String, offset: usize },

    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize, offset: usize },
}

impl CompileError {
    /// Byte offset in the original input where the problem starts.
    pub fn offset(&self) -> usize {
        match self {
            CompileError::UnmatchedEnvironment { offset, .. }
            | CompileError::StrayEnvironmentEnd { offset, .. }
            | CompileError::InterleavedEnvironment { offset, .. }
            | CompileError::UnterminatedArgument { offset, .. }
            | CompileError::UnterminatedMath { offset, .. }
            | CompileError::UnbalancedBrace { offset }
            | CompileError::MalformedTable { offset, .. }
            | CompileError::UnknownEnvironment { offset, .. }
            | CompileError::UnknownCommand { offset, .. }
            | CompileError::NestingTooDeep { offset, .. } => *offset,
        }
    }
}

/// Result type for the fallible steps inside the compiler
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CompileError::UnmatchedEnvironment {
            tag: "itemize".to_string(),
            offset: 4,
        };
        assert_eq!(err.to_string(), "environment 'itemize' is never closed");
        assert_eq!(err.offset(), 4);

        let err = CompileError::StrayEnvironmentEnd {
            tag: "center".to_string(),
            offset: 0,
        };
        assert_eq!(err.to_string(), "'\\end{center}' has no matching begin");
    }

    #[test]
    fn test_table_error_source() {
        let err = CompileError::MalformedTable {
            source: TableError::MissingColumnSpec,
            offset: 10,
        };
        assert!(err.to_string().starts_with("malformed table"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
