//! WASM bindings for probmark
//!
//! JavaScript-accessible entry points for the web front-end. Options arrive
//! as a plain object with the same fields as [`CompileOptions`]; missing
//! fields take their defaults.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::core::compiler::{compile_with_options, compile_with_report, CompileOptions};
use crate::utils::report::Diagnostic;
use probmark_tree::Document;

/// Compilation result handed to JavaScript
#[derive(Serialize)]
pub struct CompileMarkupResult {
    pub document: Option<Document>,
    pub diagnostics: Vec<Diagnostic>,
    /// False only when the call itself failed (bad options, panic)
    pub success: bool,
    pub error: Option<String>,
}

impl CompileMarkupResult {
    fn failed(error: String) -> Self {
        CompileMarkupResult {
            document: None,
            diagnostics: Vec::new(),
            success: false,
            error: Some(error),
        }
    }
}

/// Serialize to a JsValue, reporting serialization failures in the same
/// result shape instead of panicking.
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let failed = CompileMarkupResult::failed(format!("Serialization error: {}", e));
        serde_wasm_bindgen::to_value(&failed).unwrap_or(JsValue::NULL)
    })
}

fn read_options(options: JsValue) -> Result<CompileOptions, String> {
    if options.is_undefined() || options.is_null() {
        return Ok(CompileOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| format!("Invalid options: {}", e))
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Compile markup into a document tree
///
/// # Returns
/// `{ document, diagnostics, success, error }`
#[wasm_bindgen(js_name = "compileMarkup")]
pub fn compile_markup(input: &str, options: JsValue) -> JsValue {
    let options = match read_options(options) {
        Ok(options) => options,
        Err(error) => return to_js_value(&CompileMarkupResult::failed(error)),
    };

    let result = match std::panic::catch_unwind(|| compile_with_report(input, &options)) {
        Ok(report) => CompileMarkupResult {
            document: Some(report.document),
            diagnostics: report.diagnostics,
            success: true,
            error: None,
        },
        Err(_) => CompileMarkupResult::failed("Compilation panicked".to_string()),
    };
    to_js_value(&result)
}

/// Compile markup and flatten it to plain text (for previews and search)
#[wasm_bindgen(js_name = "markupToText")]
pub fn markup_to_text(input: &str, options: JsValue) -> String {
    let options = read_options(options).unwrap_or_default();
    compile_with_options(input, &options).plain_text()
}
