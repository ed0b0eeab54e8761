//! Error types for gijiroku operations.

use thiserror::Error;

/// Errors that can occur while exporting documents or managing templates.
///
/// Parsing and preview rendering never fail, so nothing here originates
/// from the [`crate::markdown`] module.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not capture the rendered region: {0}")]
    RenderCapture(String),

    #[error("Could not serialize the document: {0}")]
    ExportSerialization(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

pub type Result<T> = std::result::Result<T, Error>;
