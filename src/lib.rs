//! # gijiroku
//!
//! Rendering and export core for generated meeting minutes.
//!
//! ## Features
//!
//! - Classify line-oriented Markdown (`##`/`###` headings, `-`/`*` list items)
//! - Render an escaped HTML preview with bold, italic, code and links
//! - Export to Markdown, standalone HTML, DOCX and rasterized A4 PDF
//! - Manage preset and custom generation templates in a key/value store
//!
//! ## Quick Start
//!
//! ```
//! use gijiroku::markdown::{Block, parse};
//! use gijiroku::preview::render;
//!
//! let blocks = parse("## 決定事項\n- **予算**を承認");
//! assert!(matches!(blocks[0], Block::Heading { .. }));
//! assert_eq!(
//!     render(&blocks),
//!     "<h2>決定事項</h2><ul><li><strong>予算</strong>を承認</li></ul>"
//! );
//! ```
//!
//! ## Exporting
//!
//! Every format goes through the [`export::Exporter`] trait, or through a
//! [`session::Session`] which also picks the filename and turns failures into
//! displayable messages:
//!
//! ```
//! use gijiroku::export::Format;
//! use gijiroku::session::Session;
//! use gijiroku::template::MemoryStore;
//!
//! let mut session = Session::new(MemoryStore::new());
//! session.set_markdown("## 会議概要\n定例会議");
//! let artifact = session.export(Format::Docx, None, None).unwrap();
//! assert!(artifact.filename.ends_with(".docx"));
//! ```

pub mod error;
pub mod export;
pub mod markdown;
pub mod preview;
pub mod session;
pub mod template;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{Error, Result};
pub use export::{Exporter, Format};
pub use session::Session;
