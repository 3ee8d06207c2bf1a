//! WebAssembly bindings for PDF Inverter

use crate::{invert_pdf_bytes, InvertOptions, InvertResult};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn options_for(dpi: Option<f32>) -> InvertOptions {
    InvertOptions {
        dpi: dpi.unwrap_or(100.0),
        compress_streams: true,
    }
}

/// Produce a black/white inverted copy of a PDF
///
/// # Arguments
/// * `pdf_bytes` - The input PDF file as a byte array
/// * `dpi` - Resolution pages are rasterized at (default: 100)
///
/// # Returns
/// The inverted PDF as a byte array, or throws an error
#[wasm_bindgen]
pub fn invert_pdf(pdf_bytes: &[u8], dpi: Option<f32>) -> Result<Vec<u8>, JsError> {
    let (output_bytes, _result) = invert_pdf_bytes(pdf_bytes, &options_for(dpi))
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(output_bytes)
}

/// Produce an inverted copy together with per-page information
#[wasm_bindgen]
pub fn invert_pdf_with_info(pdf_bytes: &[u8], dpi: Option<f32>) -> Result<InvertResultJs, JsError> {
    let (output_bytes, result) = invert_pdf_bytes(pdf_bytes, &options_for(dpi))
        .map_err(|e| JsError::new(&e.to_string()))?;

    let page_info_json = serde_json::to_string(&pages_to_json(&result))
        .unwrap_or_else(|_| "[]".to_string());

    Ok(InvertResultJs {
        pdf_bytes: output_bytes,
        page_count: result.page_count,
        page_info_json,
    })
}

fn pages_to_json(result: &InvertResult) -> Vec<serde_json::Value> {
    result
        .page_sizes
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            serde_json::json!({
                "page": i + 1,
                "width": rect.width,
                "height": rect.height,
            })
        })
        .collect()
}

/// Result of PDF inversion with statistics
#[wasm_bindgen]
pub struct InvertResultJs {
    pdf_bytes: Vec<u8>,
    page_count: usize,
    page_info_json: String,
}

#[wasm_bindgen]
impl InvertResultJs {
    /// Get the inverted PDF bytes
    #[wasm_bindgen(getter)]
    pub fn pdf_bytes(&self) -> Vec<u8> {
        self.pdf_bytes.clone()
    }

    /// Get the number of pages written
    #[wasm_bindgen(getter)]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get page sizes (in points) as a JSON string
    #[wasm_bindgen(getter)]
    pub fn page_info_json(&self) -> String {
        self.page_info_json.clone()
    }
}
