//! Options and per-call state for the markup compiler
//!
//! The state is created for one `compile` call, threaded through every stage
//! by `&mut`, and dropped when the call returns. Nothing here is global.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::utils::error::{CompileError, CompileResult};
use crate::utils::report::{Diagnostic, DiagnosticKind};

/// Longest snippet of source attached to a diagnostic
const SNIPPET_CHARS: usize = 80;

// =============================================================================
// Compile Options
// =============================================================================

/// Options for markup compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Replace `--`, `---`, `~`, `\ldots`, `\bullet` and friends with glyphs
    /// Default: true
    pub lexical_replacements: bool,

    /// Treat `# ` .. `###### ` at the start of a line as headings
    /// Default: true
    pub heading_shorthand: bool,

    /// Deepest nesting of environments and command arguments before the
    /// region is kept as literal text
    /// Default: 64
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            lexical_replacements: true,
            heading_shorthand: true,
            max_depth: 64,
        }
    }
}

impl CompileOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep text exactly as written: no glyph replacement, no `#` headings
    pub fn literal() -> Self {
        Self {
            lexical_replacements: false,
            heading_shorthand: false,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// =============================================================================
// Compile State
// =============================================================================

/// Mutable state for a single compilation.
#[derive(Debug)]
pub struct CompileState<'o> {
    pub options: &'o CompileOptions,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<(DiagnosticKind, usize)>,
}

impl<'o> CompileState<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        CompileState {
            options,
            depth: 0,
            diagnostics: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Record a recovery. The same problem at the same offset is kept once,
    /// since nested regions are scanned again when they are parsed.
    pub fn report(&mut self, err: CompileError, source: Option<&str>) {
        let diagnostic = Diagnostic::from_error(&err, source.map(snippet));
        if !self.seen.insert((problem(diagnostic.kind), diagnostic.offset)) {
            return;
        }
        if diagnostic.kind == DiagnosticKind::UnknownCommand {
            log::debug!("{} (offset {})", diagnostic.message, diagnostic.offset);
        } else {
            log::warn!("{} (offset {})", diagnostic.message, diagnostic.offset);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Run `f` one nesting level deeper, or fail if the limit is reached.
    pub fn nested<T>(
        &mut self,
        offset: usize,
        f: impl FnOnce(&mut Self) -> T,
    ) -> CompileResult<T> {
        if self.depth >= self.options.max_depth {
            return Err(CompileError::NestingTooDeep {
                limit: self.options.max_depth,
                offset,
            });
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        Ok(out)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// An environment left open inside another one is found again, as
/// unmatched, when the outer environment's body is parsed.
fn problem(kind: DiagnosticKind) -> DiagnosticKind {
    match kind {
        DiagnosticKind::InterleavedEnvironment => DiagnosticKind::UnmatchedEnvironment,
        kind => kind,
    }
}

fn snippet(source: &str) -> String {
    let trimmed = source.trim();
    match trimmed.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
