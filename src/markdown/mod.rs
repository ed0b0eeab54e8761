//! Markdown interpretation for generated minutes.
//!
//! This is a deliberately small, line-oriented dialect: the generation
//! prompts only ever ask for the constructs handled here, and anything else
//! degrades to a paragraph instead of failing.
//!
//! - [`block`]: one [`Block`] per input line (`##`, `###`, `-`/`*` items, blanks, paragraphs)
//! - [`inline`]: bold, italic, code and link runs within a block's text
//! - [`escape`]: HTML/XML escaping of literal text
//!
//! The same [`parse`] output feeds the HTML preview ([`crate::preview`]) and
//! the DOCX exporter ([`crate::export::DocxExporter`]), so both always see
//! identical block order and content.

mod block;
mod escape;
mod inline;

pub use block::{Block, HeadingLevel, classify_line, parse};
pub use escape::{escape_html, escape_xml_text};
pub use inline::{Inline, parse_inline};
