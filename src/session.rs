//! Application session.
//!
//! A [`Session`] ties the pure pieces together: it holds the template
//! registry, the current Markdown document and a memoized preview, and turns
//! export errors into messages a user interface can show. Generation, the
//! clipboard, saving and capture are capabilities passed in by the caller.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::export::{
    DocxConfig, DocxExporter, ExportArtifact, ExportConfig, Format, HtmlExporter,
    MarkdownExporter, PdfConfig, PdfExporter, RegionCapture, SaveBlob,
};
use crate::preview::Preview;
use crate::template::{KeyValueStore, Template, TemplateRegistry};

/// Store key for the generation API key.
pub const API_KEY_KEY: &str = "gijiroku.api-key";

/// Turns a transcript into Markdown minutes (a language model call).
pub trait Generator {
    fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}

/// The "copy text to the clipboard" capability.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// User message sent alongside the template's system prompt.
pub fn user_message(transcript: &str) -> String {
    format!("以下の会議の文字起こしから議事録を作成してください:\n\n{transcript}")
}

/// An export that did not produce an artifact, carrying a displayable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExportFailure {
    pub message: String,
}

impl ExportFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<Error> for ExportFailure {
    fn from(err: Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Current document plus everything needed to preview and export it.
#[derive(Debug)]
pub struct Session<S> {
    templates: TemplateRegistry<S>,
    document: Option<String>,
    preview: Preview,
    export_config: ExportConfig,
    pdf_config: PdfConfig,
    docx_config: DocxConfig,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            templates: TemplateRegistry::new(store),
            document: None,
            preview: Preview::new(),
            export_config: ExportConfig::default(),
            pdf_config: PdfConfig::default(),
            docx_config: DocxConfig::default(),
        }
    }

    pub fn with_export_config(mut self, config: ExportConfig) -> Self {
        self.export_config = config;
        self
    }

    pub fn with_pdf_config(mut self, config: PdfConfig) -> Self {
        self.pdf_config = config;
        self
    }

    pub fn with_docx_config(mut self, config: DocxConfig) -> Self {
        self.docx_config = config;
        self
    }

    pub fn templates(&self) -> &TemplateRegistry<S> {
        &self.templates
    }

    pub fn templates_mut(&mut self) -> &mut TemplateRegistry<S> {
        &mut self.templates
    }

    pub fn export_config(&self) -> &ExportConfig {
        &self.export_config
    }

    /// Generate minutes for `transcript` using the selected template.
    ///
    /// A blank transcript is rejected before the generator is called. On
    /// failure the previous document is kept.
    pub fn generate<G: Generator + ?Sized>(
        &mut self,
        generator: &G,
        transcript: &str,
    ) -> Result<&str> {
        if transcript.trim().is_empty() {
            return Err(Error::Generation("empty transcript".into()));
        }
        let template: Template = self.templates.selected();
        debug!(template = %template.id, chars = transcript.chars().count(), "generating minutes");

        let markdown = generator.generate(&template.system_prompt, &user_message(transcript))?;
        if markdown.trim().is_empty() {
            return Err(Error::Generation("empty response".into()));
        }
        info!(template = %template.id, bytes = markdown.len(), "generated minutes");
        Ok(self.document.insert(markdown).as_str())
    }

    /// Replace the current document.
    pub fn set_markdown(&mut self, markdown: impl Into<String>) {
        self.document = Some(markdown.into());
    }

    pub fn markdown(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Preview fragment of the current document (empty when there is none).
    pub fn preview_html(&mut self) -> &str {
        match &self.document {
            Some(markdown) => self.preview.render(markdown),
            None => "",
        }
    }

    /// Export the current document.
    ///
    /// PDF needs `capture`; the other formats ignore it. `filename` defaults
    /// to the date-stamped name from the export configuration.
    pub fn export(
        &self,
        format: Format,
        capture: Option<&dyn RegionCapture>,
        filename: Option<String>,
    ) -> std::result::Result<ExportArtifact, ExportFailure> {
        let Some(markdown) = self.document.as_deref() else {
            return Err(ExportFailure::new("nothing to export"));
        };
        let filename = filename.unwrap_or_else(|| self.export_config.filename(format));

        let result = match format {
            Format::Markdown => {
                ExportArtifact::build(&MarkdownExporter::new(), markdown, format, filename)
            }
            Format::Html => ExportArtifact::build(&HtmlExporter::new(), markdown, format, filename),
            Format::Docx => {
                let exporter = DocxExporter::new().with_config(self.docx_config.clone());
                ExportArtifact::build(&exporter, markdown, format, filename)
            }
            Format::Pdf => {
                let Some(capture) = capture else {
                    return Err(ExportFailure::new("PDF export needs a captured preview"));
                };
                let exporter = PdfExporter::new(capture).with_config(self.pdf_config.clone());
                ExportArtifact::build(&exporter, markdown, format, filename)
            }
        };

        result.map_err(|e| {
            warn!(error = %e, ?format, "export failed");
            ExportFailure::from(e)
        })
    }

    /// Export and hand the artifact to `saver`.
    pub fn save<B: SaveBlob + ?Sized>(
        &self,
        format: Format,
        saver: &B,
        capture: Option<&dyn RegionCapture>,
        filename: Option<String>,
    ) -> std::result::Result<ExportArtifact, ExportFailure> {
        let artifact = self.export(format, capture, filename)?;
        saver.save(&artifact).map_err(|e| {
            warn!(error = %e, filename = %artifact.filename, "save failed");
            ExportFailure::from(e)
        })?;
        Ok(artifact)
    }

    /// Copy the Markdown source to the clipboard.
    pub fn copy_markdown<C: Clipboard + ?Sized>(&self, clipboard: &mut C) -> Result<()> {
        let markdown = self
            .document
            .as_deref()
            .ok_or_else(|| Error::Clipboard("nothing to copy".into()))?;
        clipboard.write_text(markdown)?;
        debug!(bytes = markdown.len(), "copied markdown");
        Ok(())
    }

    pub fn api_key(&self) -> Option<String> {
        self.templates
            .store()
            .get(API_KEY_KEY)
            .filter(|key| !key.is_empty())
    }

    /// Store the API key. An empty key removes it.
    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            self.templates.store_mut().remove(API_KEY_KEY)
        } else {
            self.templates.store_mut().set(API_KEY_KEY, key)
        }
    }
}
