//! Rasterized PDF exporter.
//!
//! The rendered preview is captured once as a tall raster image, scaled to
//! the page width, and sliced into page-height bands. Every page embeds the
//! same image XObject, shifted up by the height already consumed, and the
//! page box crops away everything outside the current band.

use std::io::{Seek, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::error::{Error, Result};
use crate::markdown::parse;

use super::Exporter;
use super::html::first_heading;

/// Points per millimetre.
const MM_TO_PT: f64 = 72.0 / 25.4;

/// Slack when deciding whether a band spills onto another page.
const PAGE_EPSILON_MM: f64 = 1e-6;

const IMAGE_NAME: Name<'static> = Name(b"Im0");

/// An 8-bit RGBA raster, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// A uniformly filled image.
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self::new(width, height, pixel.repeat(count))
    }

    /// Reject captures that cannot be laid out.
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::RenderCapture(format!(
                "captured region is empty ({}x{})",
                self.width, self.height
            )));
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(self.rgba.len()) {
            return Err(Error::RenderCapture(format!(
                "pixel buffer holds {} bytes, expected {}x{}x4",
                self.rgba.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Composite over `background` and drop alpha.
    fn to_rgb(&self, background: [u8; 3]) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.rgba.len() / 4 * 3);
        for px in self.rgba.chunks_exact(4) {
            let alpha = px[3] as u16;
            for (channel, bg) in px[..3].iter().zip(background) {
                let blended = (*channel as u16 * alpha + bg as u16 * (255 - alpha) + 127) / 255;
                rgb.push(blended as u8);
            }
        }
        rgb
    }
}

/// Parameters handed to the capture collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Oversampling factor relative to on-screen pixels.
    pub scale: f32,
    /// Fill for transparent areas.
    pub background: [u8; 3],
}

/// The "capture a rendered region as an image" capability.
///
/// Implementations fail with [`Error::RenderCapture`] when the region is not
/// attached or visible.
pub trait RegionCapture {
    fn capture(&self, options: &CaptureOptions) -> Result<RasterImage>;
}

/// A capture that was taken ahead of time (a screenshot file, a canvas dump).
#[derive(Debug, Clone)]
pub struct StaticCapture {
    image: RasterImage,
}

impl StaticCapture {
    pub fn new(image: RasterImage) -> Self {
        Self { image }
    }
}

impl RegionCapture for StaticCapture {
    fn capture(&self, _options: &CaptureOptions) -> Result<RasterImage> {
        Ok(self.image.clone())
    }
}

impl<C: RegionCapture + ?Sized> RegionCapture for &C {
    fn capture(&self, options: &CaptureOptions) -> Result<RasterImage> {
        (**self).capture(options)
    }
}

/// Configuration for PDF export.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfConfig {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Capture oversampling factor.
    pub scale: f32,
    pub background: [u8; 3],
    /// Zlib level for the embedded image (0-9).
    pub compression_level: u32,
}

impl Default for PdfConfig {
    /// A4 portrait, 2x oversampling on white.
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            scale: 2.0,
            background: [255, 255, 255],
            compression_level: 6,
        }
    }
}

/// Where the captured image sits on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    pub index: usize,
    /// Vertical offset of the image top from the page top, in millimetres.
    /// Zero on the first page, then minus the height already consumed.
    pub offset_mm: f64,
}

/// Slice an image `image_height_mm` tall into pages `page_height_mm` tall.
///
/// Always yields at least one page.
///
/// # Examples
///
/// ```
/// use gijiroku::export::paginate;
///
/// assert_eq!(paginate(100.0, 297.0).len(), 1);
/// assert_eq!(paginate(297.0 * 2.5, 297.0).len(), 3);
/// assert_eq!(paginate(297.0 * 2.5, 297.0)[2].offset_mm, -594.0);
/// ```
pub fn paginate(image_height_mm: f64, page_height_mm: f64) -> Vec<PagePlacement> {
    let bands = ((image_height_mm - PAGE_EPSILON_MM) / page_height_mm).ceil();
    let pages = if bands.is_finite() && bands > 1.0 {
        bands as usize
    } else {
        1
    };
    (0..pages)
        .map(|index| PagePlacement {
            index,
            offset_mm: -(index as f64) * page_height_mm,
        })
        .collect()
}

/// PDF format exporter.
///
/// Holds the capture capability; the Markdown passed to [`Exporter::export`]
/// only supplies the document title.
///
/// # Example
///
/// ```
/// use gijiroku::export::{Exporter, PdfExporter, RasterImage, StaticCapture};
/// use std::io::Cursor;
///
/// let capture = StaticCapture::new(RasterImage::filled(420, 1188, [255, 255, 255, 255]));
/// let mut out = Cursor::new(Vec::new());
/// PdfExporter::new(capture).export("## 議事録", &mut out)?;
/// assert!(out.get_ref().starts_with(b"%PDF-"));
/// # Ok::<(), gijiroku::Error>(())
/// ```
pub struct PdfExporter<C> {
    capture: C,
    config: PdfConfig,
}

impl<C: RegionCapture> PdfExporter<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            config: PdfConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    /// Capture the region and return the page layout without encoding.
    pub fn layout(&self) -> Result<(RasterImage, Vec<PagePlacement>)> {
        let options = CaptureOptions {
            scale: self.config.scale,
            background: self.config.background,
        };
        let image = self.capture.capture(&options)?;
        image.validate()?;

        let image_height_mm =
            image.height as f64 * self.config.page_width_mm / image.width as f64;
        let pages = paginate(image_height_mm, self.config.page_height_mm);
        tracing::debug!(
            width = image.width,
            height = image.height,
            pages = pages.len(),
            "captured region"
        );
        Ok((image, pages))
    }

    fn encode(
        &self,
        image: &RasterImage,
        pages: &[PagePlacement],
        title: Option<&str>,
    ) -> Result<Vec<u8>> {
        let page_w = self.config.page_width_mm * MM_TO_PT;
        let page_h = self.config.page_height_mm * MM_TO_PT;
        let image_h = image.height as f64 * page_w / image.width as f64;

        let mut encoder = ZlibEncoder::new(
            Vec::new(),
            Compression::new(self.config.compression_level.min(9)),
        );
        encoder.write_all(&image.to_rgb(self.config.background))?;
        let pixels = encoder.finish()?;

        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let tree_id = alloc.bump();
        let image_id = alloc.bump();
        let info_id = alloc.bump();
        let page_ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc.bump(), alloc.bump())).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().map(|(page_id, _)| *page_id))
            .count(page_ids.len() as i32);

        for (placement, (page_id, content_id)) in pages.iter().zip(&page_ids) {
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, page_w as f32, page_h as f32));
            page.parent(tree_id);
            page.contents(*content_id);
            page.resources().x_objects().pair(IMAGE_NAME, image_id);
            page.finish();

            // PDF space grows upwards, so the image bottom sits one image
            // height below its top edge.
            let top = page_h - placement.offset_mm * MM_TO_PT;
            let mut content = Content::new();
            content.save_state();
            content.rect(0.0, 0.0, page_w as f32, page_h as f32);
            content.clip_nonzero();
            content.end_path();
            content.transform([
                page_w as f32,
                0.0,
                0.0,
                image_h as f32,
                0.0,
                (top - image_h) as f32,
            ]);
            content.x_object(IMAGE_NAME);
            content.restore_state();
            pdf.stream(*content_id, &content.finish());
        }

        let mut xobject = pdf.image_xobject(image_id, &pixels);
        xobject.filter(Filter::FlateDecode);
        xobject.width(image.width as i32);
        xobject.height(image.height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();

        let mut info = pdf.document_info(info_id);
        if let Some(title) = title {
            info.title(TextStr(title));
        }
        info.creator(TextStr("gijiroku"));
        info.finish();

        Ok(pdf.finish())
    }
}

impl<C: RegionCapture> Exporter for PdfExporter<C> {
    fn export<W: Write + Seek>(&self, markdown: &str, writer: &mut W) -> Result<()> {
        let (image, pages) = self.layout()?;
        let title = first_heading(&parse(markdown));
        let bytes = self.encode(&image, &pages, title.as_deref())?;
        writer.write_all(&bytes)?;
        tracing::debug!(pages = pages.len(), size = bytes.len(), "wrote pdf");
        Ok(())
    }
}
