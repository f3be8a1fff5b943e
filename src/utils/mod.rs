//! Utility modules
//!
//! - Error types for local recoveries
//! - The recovery report returned next to the document

pub mod error;
pub mod report;

pub use error::{CompileError, CompileResult};
pub use report::{CompileReport, Diagnostic, DiagnosticKind, Severity};
