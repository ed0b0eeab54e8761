//! WASM bindings for browser-based preview and export.
//!
//! This module exposes the rendering and export functions to JavaScript via
//! wasm-bindgen. The browser supplies the capture (a canvas dump) and does the
//! downloading itself.

use std::io::Cursor;
use wasm_bindgen::prelude::*;

use crate::export::{self, DocxExporter, Exporter, PdfExporter, RasterImage, StaticCapture};
use crate::preview;
use crate::util::today_utc;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Render Markdown to the preview HTML fragment.
#[wasm_bindgen]
pub fn render_preview(markdown: &str) -> String {
    preview::render_markdown(markdown)
}

/// Convert Markdown to DOCX bytes.
#[wasm_bindgen]
pub fn markdown_to_docx(markdown: &str) -> Result<Vec<u8>, JsValue> {
    let mut output = Cursor::new(Vec::new());
    DocxExporter::new()
        .export(markdown, &mut output)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(output.into_inner())
}

/// Paginate a captured RGBA canvas onto A4 pages.
///
/// `rgba` is the raw `ImageData` buffer of a canvas rendered at 2x.
#[wasm_bindgen]
pub fn raster_to_pdf(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>, JsValue> {
    let capture = StaticCapture::new(RasterImage::new(width, height, rgba));
    let mut output = Cursor::new(Vec::new());
    PdfExporter::new(capture)
        .export("", &mut output)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(output.into_inner())
}

/// Date-stamped filename for today, e.g. `議事録_2025-04-01.pdf`.
#[wasm_bindgen]
pub fn default_filename(label: &str, ext: &str) -> String {
    let label = if label.is_empty() {
        export::DEFAULT_LABEL
    } else {
        label
    };
    export::default_filename(label, today_utc(), ext)
}
