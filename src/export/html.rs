//! Standalone HTML exporter.
//!
//! Wraps the preview fragment in a minimal UTF-8 document so the preview can
//! be saved or opened outside the application.

use std::io::{Seek, Write};

use crate::error::Result;
use crate::markdown::{Block, escape_html, parse};
use crate::preview::render;

use super::Exporter;

/// Exporter for a self-contained HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlExporter {
    title: Option<String>,
}

impl HtmlExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the page title (defaults to the first heading).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Exporter for HtmlExporter {
    fn export<W: Write + Seek>(&self, markdown: &str, writer: &mut W) -> Result<()> {
        let blocks = parse(markdown);
        let title = self
            .title
            .clone()
            .or_else(|| first_heading(&blocks))
            .unwrap_or_default();

        let page = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<div class=\"markdown-preview\">{}</div>\n</body>\n</html>\n",
            escape_html(&title),
            render(&blocks)
        );
        writer.write_all(page.as_bytes())?;
        Ok(())
    }
}

/// Plain text of the first heading, used as a document title.
pub(crate) fn first_heading(blocks: &[Block]) -> Option<String> {
    blocks.iter().find_map(|block| match block {
        Block::Heading { .. } => Some(
            block
                .inlines()
                .iter()
                .map(|run| run.plain_text())
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn export(exporter: &HtmlExporter, markdown: &str) -> String {
        let mut out = Cursor::new(Vec::new());
        exporter.export(markdown, &mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_wraps_fragment() {
        let html = export(&HtmlExporter::new(), "## **A** & B\n- x");
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<h2><strong>A</strong> &amp; B</h2><ul><li>x</li></ul>"));
    }

    #[test]
    fn test_explicit_title() {
        let html = export(&HtmlExporter::new().with_title("<t>"), "text");
        assert!(html.contains("<title>&lt;t&gt;</title>"));
    }

    #[test]
    fn test_first_heading_absent() {
        assert_eq!(first_heading(&parse("just text")), None);
    }
}
