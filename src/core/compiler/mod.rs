//! Markup compiler
//!
//! Compiles problem-statement markup (a LaTeX-like dialect) into a
//! [`Document`]. The input is tokenized once; the segmenter splits it into
//! top-level blocks, environments dispatch on their tag, tables go through
//! the grid layout engine, and running text goes through the inline parser.
//!
//! Compilation never fails. Malformed regions degrade to literal text or a
//! diagnostic node, and every such recovery is listed in the report.

pub mod context;
pub mod engine;
mod environment;
mod markup;
pub mod segment;
pub mod table;
mod utils;

use probmark_tree::{Document, DocumentNode};

pub use context::{CompileOptions, CompileState};
pub use environment::EnvKind;
pub use markup::{InlineCommand, INLINE_COMMANDS};
pub use segment::{Segment, SegmentKind};

use crate::utils::report::CompileReport;
use engine::{tokenize, TokenSlice};

/// Compile markup with default options
pub fn compile(input: &str) -> Document {
    compile_with_options(input, &CompileOptions::default())
}

/// Compile markup with the given options
pub fn compile_with_options(input: &str, options: &CompileOptions) -> Document {
    compile_with_report(input, options).document
}

/// Compile markup and keep the list of recoveries made along the way
pub fn compile_with_report(input: &str, options: &CompileOptions) -> CompileReport {
    let tokens = tokenize(input);
    let mut state = CompileState::new(options);
    let nodes = environment::parse_blocks(TokenSlice::new(input, &tokens), &mut state);
    log::debug!(
        "compiled {} bytes into {} blocks with {} diagnostics",
        input.len(),
        nodes.len(),
        state.diagnostics().len()
    );
    CompileReport::new(Document::new(nodes), state.into_diagnostics())
}

/// Top-level block boundaries of `input`
pub fn segment(input: &str) -> Vec<Segment> {
    let options = CompileOptions::default();
    let tokens = tokenize(input);
    let mut state = CompileState::new(&options);
    segment::segment_tokens(TokenSlice::new(input, &tokens), &mut state)
}

/// Compile a single run of text with the inline rules only
pub fn parse_inline(input: &str) -> Vec<DocumentNode> {
    let options = CompileOptions::default();
    let tokens = tokenize(input);
    let mut state = CompileState::new(&options);
    markup::parse_inline(TokenSlice::new(input, &tokens), &mut state)
}
