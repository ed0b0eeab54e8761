//! Export module for writing minutes to downloadable formats.
//!
//! Provides the `Exporter` trait and format-specific implementations.
//!
//! # Architecture
//!
//! The `Exporter` trait uses a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! Every exporter assembles its complete output in memory before the first
//! byte reaches the writer, so a failed export never leaves a partial file.
//!
//! # Example
//!
//! ```
//! use gijiroku::export::{DocxExporter, Exporter};
//! use std::io::Cursor;
//!
//! let mut out = Cursor::new(Vec::new());
//! DocxExporter::new().export("## 会議概要\n- 予算", &mut out)?;
//! assert!(out.get_ref().starts_with(b"PK"));
//! # Ok::<(), gijiroku::Error>(())
//! ```

use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::Result;
use crate::util::{sanitize_filename, today_utc, write_atomically};

mod docx;
mod html;
mod pdf;
mod text;

pub use docx::{DocxConfig, DocxExporter, ParagraphRole, Spacing, WordDocument, WordParagraph};
pub use html::HtmlExporter;
pub use pdf::{
    CaptureOptions, PagePlacement, PdfConfig, PdfExporter, RasterImage, RegionCapture,
    StaticCapture, paginate,
};
pub use text::MarkdownExporter;

/// Trait for exporting a Markdown document to a specific format.
///
/// Exporters hold their configuration, and the `export` method writes to any
/// `Write + Seek` destination:
/// - `std::fs::File` for disk output
/// - `std::io::Cursor<Vec<u8>>` for in-memory output
pub trait Exporter {
    /// Export the document to the provided writer.
    fn export<W: Write + Seek>(&self, markdown: &str, writer: &mut W) -> Result<()>;
}

/// Output formats offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Markdown,
    Pdf,
    Docx,
    Html,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Html => "html",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Markdown => "text/markdown;charset=utf-8",
            Format::Pdf => "application/pdf",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Html => "text/html;charset=utf-8",
        }
    }

    /// Detect a format from a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Format::Markdown),
            "pdf" => Some(Format::Pdf),
            "docx" => Some(Format::Docx),
            "html" | "htm" => Some(Format::Html),
            _ => None,
        }
    }
}

/// Label used in default filenames ("minutes").
pub const DEFAULT_LABEL: &str = "議事録";

/// Configuration shared by all exports: how to name the artifact.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Localized label placed before the date.
    pub label: String,
    /// Fixed date for the filename. `None` uses the current UTC date.
    pub date: Option<NaiveDate>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            date: None,
        }
    }
}

impl ExportConfig {
    /// Default filename for `format`: `<label>_<YYYY-MM-DD>.<ext>`.
    pub fn filename(&self, format: Format) -> String {
        let date = self.date.unwrap_or_else(today_utc);
        default_filename(&self.label, date, format.extension())
    }
}

/// Build a date-stamped filename.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gijiroku::export::default_filename;
///
/// let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
/// assert_eq!(default_filename("議事録", date, "md"), "議事録_2025-04-01.md");
/// ```
pub fn default_filename(label: &str, date: NaiveDate, ext: &str) -> String {
    format!("{}_{}.{}", label, date.format("%Y-%m-%d"), ext)
}

/// A finished export ready to hand to a [`SaveBlob`] collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Run `exporter` into memory and wrap the result.
    pub fn build<E: Exporter>(
        exporter: &E,
        markdown: &str,
        format: Format,
        filename: String,
    ) -> Result<Self> {
        let mut buffer = Cursor::new(Vec::new());
        exporter.export(markdown, &mut buffer)?;
        let bytes = buffer.into_inner();
        tracing::info!(%filename, size = bytes.len(), ?format, "export complete");
        Ok(Self {
            filename,
            mime_type: format.mime_type(),
            bytes,
        })
    }
}

/// The "save this file" capability (a browser download, a directory, ...).
pub trait SaveBlob {
    fn save(&self, artifact: &ExportArtifact) -> Result<()>;
}

/// Saves artifacts as files inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where `artifact` will be written.
    pub fn path_for(&self, artifact: &ExportArtifact) -> PathBuf {
        self.dir.join(sanitize_filename(&artifact.filename))
    }
}

impl SaveBlob for DirectorySaver {
    fn save(&self, artifact: &ExportArtifact) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(artifact);
        write_atomically(&path, &artifact.bytes)?;
        tracing::info!(path = %path.display(), "saved export");
        Ok(())
    }
}
