//! DOCX exporter.
//!
//! Builds a paragraph-structured word-processor model from the shared block
//! sequence and serializes it as a minimal WordprocessingML package.
//!
//! Inline emphasis (bold, italic, code, links) is not carried over: every
//! paragraph holds a single plain run with the block's raw text, delimiters
//! included. Blank lines are dropped because paragraphs carry their own
//! spacing.

use std::fmt::Display;
use std::io::{Cursor, Seek, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};
use crate::markdown::{Block, HeadingLevel, escape_xml_text, parse};
use crate::util::now_utc;

use super::Exporter;
use super::html::first_heading;

/// Structural role of a paragraph in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParagraphRole {
    Heading2,
    Heading3,
    /// Bulleted list item at the given nesting level (always 0 here).
    Bullet { level: u8 },
    Body,
}

/// Paragraph spacing in twentieths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
}

impl ParagraphRole {
    /// Fixed spacing per role.
    pub fn spacing(self) -> Spacing {
        match self {
            ParagraphRole::Heading2 => Spacing {
                before: 240,
                after: 120,
            },
            ParagraphRole::Heading3 => Spacing {
                before: 180,
                after: 100,
            },
            ParagraphRole::Bullet { .. } | ParagraphRole::Body => Spacing {
                before: 60,
                after: 60,
            },
        }
    }

    fn style_id(self) -> Option<&'static str> {
        match self {
            ParagraphRole::Heading2 => Some("Heading2"),
            ParagraphRole::Heading3 => Some("Heading3"),
            ParagraphRole::Bullet { .. } => Some("ListParagraph"),
            ParagraphRole::Body => None,
        }
    }
}

/// One paragraph of the word-processor model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordParagraph {
    pub role: ParagraphRole,
    pub text: String,
    pub spacing: Spacing,
}

impl WordParagraph {
    fn from_block(block: &Block) -> Option<Self> {
        let role = match block {
            Block::Heading {
                level: HeadingLevel::H2,
                ..
            } => ParagraphRole::Heading2,
            Block::Heading {
                level: HeadingLevel::H3,
                ..
            } => ParagraphRole::Heading3,
            Block::ListItem { .. } => ParagraphRole::Bullet { level: 0 },
            Block::Paragraph { .. } => ParagraphRole::Body,
            Block::Blank => return None,
        };
        Some(Self {
            role,
            text: block.text().to_string(),
            spacing: role.spacing(),
        })
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<w:p><w:pPr>");
        if let Some(style) = self.role.style_id() {
            out.push_str(&format!("<w:pStyle w:val=\"{style}\"/>"));
        }
        if let ParagraphRole::Bullet { level } = self.role {
            out.push_str(&format!(
                "<w:numPr><w:ilvl w:val=\"{level}\"/><w:numId w:val=\"{BULLET_NUM_ID}\"/></w:numPr>"
            ));
        }
        out.push_str(&format!(
            "<w:spacing w:before=\"{}\" w:after=\"{}\"/>",
            self.spacing.before, self.spacing.after
        ));
        out.push_str("</w:pPr>");
        if !self.text.is_empty() {
            out.push_str("<w:r><w:t xml:space=\"preserve\">");
            out.push_str(&escape_xml_text(&self.text));
            out.push_str("</w:t></w:r>");
        }
        out.push_str("</w:p>");
    }
}

/// Paragraph-structured document model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDocument {
    pub paragraphs: Vec<WordParagraph>,
}

impl WordDocument {
    /// Build the model from Markdown using the shared block classifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use gijiroku::export::{ParagraphRole, WordDocument};
    ///
    /// let doc = WordDocument::build("## 決定事項\n\n- **予算**承認");
    /// assert_eq!(doc.paragraphs.len(), 2);
    /// assert_eq!(doc.paragraphs[0].role, ParagraphRole::Heading2);
    /// assert_eq!(doc.paragraphs[1].role, ParagraphRole::Bullet { level: 0 });
    /// assert_eq!(doc.paragraphs[1].text, "**予算**承認");
    /// ```
    pub fn build(markdown: &str) -> Self {
        Self::from_blocks(&parse(markdown))
    }

    pub fn from_blocks(blocks: &[Block]) -> Self {
        Self {
            paragraphs: blocks.iter().filter_map(WordParagraph::from_block).collect(),
        }
    }

    /// The `word/document.xml` part.
    pub fn document_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(&format!("<w:document xmlns:w=\"{W_NS}\"><w:body>"));
        for paragraph in &self.paragraphs {
            paragraph.write_xml(&mut xml);
        }
        xml.push_str(SECTION_PROPERTIES);
        xml.push_str("</w:body></w:document>");
        xml
    }
}

/// Configuration for DOCX export.
#[derive(Debug, Clone)]
pub struct DocxConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
    /// Document title. Defaults to the first heading.
    pub title: Option<String>,
    pub creator: String,
    /// Creation timestamp. Defaults to the export time.
    pub created: Option<DateTime<Utc>>,
}

impl Default for DocxConfig {
    fn default() -> Self {
        Self {
            compression_level: None,
            title: None,
            creator: "gijiroku".to_string(),
            created: None,
        }
    }
}

/// DOCX format exporter.
#[derive(Debug, Clone, Default)]
pub struct DocxExporter {
    config: DocxConfig,
}

impl DocxExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: DocxConfig) -> Self {
        self.config = config;
        self
    }

    /// Serialize `document` into a complete package in memory.
    pub fn package(&self, document: &WordDocument, title: Option<&str>) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let compression_level = self.config.compression_level.unwrap_or(6).min(9);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level as i64));

        let created = self
            .config
            .created
            .unwrap_or_else(now_utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let core = core_properties_xml(title.unwrap_or_default(), &self.config.creator, &created);
        let document_xml = document.document_xml();

        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
            ("word/document.xml", document_xml.as_bytes()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
            ("word/styles.xml", STYLES_XML.as_bytes()),
            ("word/numbering.xml", NUMBERING_XML.as_bytes()),
            ("docProps/core.xml", core.as_bytes()),
        ];
        for (name, content) in parts {
            zip.start_file(name, deflated).map_err(serialization_error)?;
            zip.write_all(content).map_err(serialization_error)?;
        }

        let cursor = zip.finish().map_err(serialization_error)?;
        Ok(cursor.into_inner())
    }
}

impl Exporter for DocxExporter {
    fn export<W: Write + Seek>(&self, markdown: &str, writer: &mut W) -> Result<()> {
        let blocks = parse(markdown);
        let document = WordDocument::from_blocks(&blocks);
        let title = self.config.title.clone().or_else(|| first_heading(&blocks));
        let bytes = self.package(&document, title.as_deref())?;
        writer.write_all(&bytes)?;
        tracing::debug!(
            paragraphs = document.paragraphs.len(),
            size = bytes.len(),
            "wrote docx"
        );
        Ok(())
    }
}

fn serialization_error<E: Display>(e: E) -> Error {
    Error::ExportSerialization(e.to_string())
}

fn core_properties_xml(title: &str, creator: &str, created: &str) -> String {
    format!(
        "{XML_DECLARATION}<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>{}</dc:title><dc:creator>{}</dc:creator>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>\
         </cp:coreProperties>",
        escape_xml_text(title),
        escape_xml_text(creator),
        created
    )
}

const BULLET_NUM_ID: u32 = 1;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// A4 portrait with one-inch margins.
const SECTION_PROPERTIES: &str = "<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
<w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" \
w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr>";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading3">
    <w:name w:val="heading 3"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListParagraph">
    <w:name w:val="List Paragraph"/>
    <w:basedOn w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:ind w:left="720"/></w:pPr>
  </w:style>
</w:styles>"#;

const NUMBERING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="hybridMultilevel"/>
    <w:lvl w:ilvl="0">
      <w:start w:val="1"/>
      <w:numFmt w:val="bullet"/>
      <w:lvlText w:val="•"/>
      <w:lvlJc w:val="left"/>
      <w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
    </w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
</w:numbering>"#;
