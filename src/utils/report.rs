//! Recovery reporting for malformed or unsupported markup.

use serde::Serialize;

use probmark_tree::Document;

use super::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnmatchedEnvironment,
    StrayEnvironmentEnd,
    InterleavedEnvironment,
    UnterminatedArgument,
    UnterminatedMath,
    UnbalancedBrace,
    MalformedTable,
    UnknownEnvironment,
    UnknownCommand,
    NestingTooDeep,
}

/// How much a recovery changed the rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input kept verbatim, nothing lost
    Info,
    /// Part of the input degraded to literal or diagnostic output
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// Byte offset into the compiled input
    pub offset: usize,
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn from_error(err: &CompileError, snippet: Option<String>) -> Self {
        let kind = match err {
            CompileError::UnmatchedEnvironment { .. } => DiagnosticKind::UnmatchedEnvironment,
            CompileError::StrayEnvironmentEnd { .. } => DiagnosticKind::StrayEnvironmentEnd,
            CompileError::InterleavedEnvironment { .. } => DiagnosticKind::InterleavedEnvironment,
            CompileError::UnterminatedArgument { .. } => DiagnosticKind::UnterminatedArgument,
            CompileError::UnterminatedMath { .. } => DiagnosticKind::UnterminatedMath,
            CompileError::UnbalancedBrace { .. } => DiagnosticKind::UnbalancedBrace,
            CompileError::MalformedTable { .. } => DiagnosticKind::MalformedTable,
            CompileError::UnknownEnvironment { .. } => DiagnosticKind::UnknownEnvironment,
            CompileError::UnknownCommand { .. } => DiagnosticKind::UnknownCommand,
            CompileError::NestingTooDeep { .. } => DiagnosticKind::NestingTooDeep,
        };
        let severity = match kind {
            DiagnosticKind::UnknownCommand => Severity::Info,
            _ => Severity::Warning,
        };
        Self {
            kind,
            severity,
            message: err.to_string(),
            offset: err.offset(),
            snippet,
        }
    }
}

/// A compiled document together with every recovery made while building it.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileReport {
    pub fn new(document: Document, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            document,
            diagnostics,
        }
    }

    /// True when something degraded (info-level notes do not count).
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}
