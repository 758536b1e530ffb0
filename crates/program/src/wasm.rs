//! WebAssembly bindings for the program loader.
//!
//! The block editor runs in the browser and calls into these functions to
//! check a program before handing it to the game.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { load_program, validate_program_source } from './botmaze_program.js';
//!
//! await init();
//!
//! const program = load_program(JSON.stringify(editorOutput));
//! console.log(program.blockCount);
//!
//! const report = validate_program_source(JSON.stringify(editorOutput));
//! report.errors.forEach(e => console.warn(e.path, e.message));
//! ```

use crate::ast::LoadWarning;
use crate::validation::{SemanticError, Severity};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct ValidationReport {
    block_count: usize,
    load_warnings: Vec<LoadWarning>,
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticError>,
}

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Load a program from JSON source and return it as a JavaScript object.
///
/// # Returns
/// * `Ok(JsValue)` - The loaded program (static loops already unrolled)
/// * `Err(JsValue)` - The structural error message
#[wasm_bindgen]
pub fn load_program(source: &str) -> Result<JsValue, JsValue> {
    match crate::load(source) {
        Ok(program) => serde_wasm_bindgen::to_value(&program)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
        Err(err) => Err(JsValue::from_str(&err.to_string())),
    }
}

/// Load a program and return the loaded tree as a JSON string.
#[wasm_bindgen]
pub fn load_program_to_json(source: &str) -> Result<String, JsValue> {
    match crate::load(source) {
        Ok(program) => serde_json::to_string_pretty(&program)
            .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {}", e))),
        Err(err) => Err(JsValue::from_str(&err.to_string())),
    }
}

/// Count the raw blocks of a program, as shown on the level score card.
#[wasm_bindgen]
pub fn count_blocks(source: &str) -> Result<usize, JsValue> {
    crate::load(source)
        .map(|program| program.block_count)
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Load and validate a program, returning structured errors and warnings.
///
/// # Returns
/// * `Ok(JsValue)` - Object with `block_count`, `load_warnings`, `errors` and `warnings`
/// * `Err(JsValue)` - The structural error message if the program does not load
#[wasm_bindgen]
pub fn validate_program_source(source: &str) -> Result<JsValue, JsValue> {
    let program = crate::load(source).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let (errors, warnings): (Vec<_>, Vec<_>) = crate::validate_program(&program)
        .into_iter()
        .partition(|issue| issue.severity == Severity::Error);

    let report = ValidationReport {
        block_count: program.block_count,
        load_warnings: program.warnings,
        errors,
        warnings,
    };
    serde_wasm_bindgen::to_value(&report)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
