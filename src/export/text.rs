//! Markdown exporter - writes the source document unchanged.

use std::io::{Seek, Write};

use crate::error::Result;

use super::Exporter;

/// Exporter for Markdown output.
///
/// The generated Markdown is already the user-facing format, so export is an
/// identity transform: the output is byte-identical to the input.
#[derive(Debug, Clone, Default)]
pub struct MarkdownExporter;

impl MarkdownExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for MarkdownExporter {
    fn export<W: Write + Seek>(&self, markdown: &str, writer: &mut W) -> Result<()> {
        writer.write_all(markdown.as_bytes())?;
        Ok(())
    }
}
