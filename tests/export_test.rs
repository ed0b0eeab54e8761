//! Export tests for Markdown, HTML, DOCX and PDF output.
//!
//! DOCX packages are opened with `zip` and `word/document.xml` is read back
//! with `quick-xml`, so these tests check the package a word processor sees
//! rather than the string the exporter built.

use std::io::{Cursor, Read};

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use gijiroku::Error;
use gijiroku::export::{
    DocxExporter, ExportArtifact, ExportConfig, Exporter, Format, HtmlExporter,
    MarkdownExporter, PdfConfig, PdfExporter, RasterImage, StaticCapture, paginate,
};

const MINUTES: &str = include_str!("fixtures/minutes.md");

/// Paragraph as read back from `word/document.xml`.
#[derive(Debug, Default, PartialEq)]
struct ReadParagraph {
    style: Option<String>,
    bullet_level: Option<String>,
    before: Option<String>,
    after: Option<String>,
    text: String,
}

fn export_to_vec<E: Exporter>(exporter: &E, markdown: &str) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    exporter.export(markdown, &mut out).unwrap();
    out.into_inner()
}

fn read_part(docx: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

fn attr(e: &quick_xml::events::BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn read_paragraphs(xml: &str) -> Vec<ReadParagraph> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<ReadParagraph> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current = Some(ReadParagraph::default()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if let Some(p) = current.as_mut() {
                    match e.name().as_ref() {
                        b"w:pStyle" => p.style = attr(&e, b"w:val"),
                        b"w:ilvl" => p.bullet_level = attr(&e, b"w:val"),
                        b"w:spacing" => {
                            p.before = attr(&e, b"w:before");
                            p.after = attr(&e, b"w:after");
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(p) = current.as_mut() {
                    p.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text && let Some(p) = current.as_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    p.text.push_str(match entity.as_ref() {
                        "amp" => "&",
                        "lt" => "<",
                        "gt" => ">",
                        "quot" => "\"",
                        "apos" | "#39" => "'",
                        _ => "",
                    });
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => panic!("invalid document.xml: {e}"),
            _ => {}
        }
    }
    paragraphs
}

// ============================================================================
// Markdown
// ============================================================================

#[test]
fn test_markdown_is_byte_identical() {
    assert_eq!(export_to_vec(&MarkdownExporter::new(), MINUTES), MINUTES.as_bytes());
}

#[test]
fn test_artifact_metadata() {
    let config = ExportConfig {
        date: NaiveDate::from_ymd_opt(2025, 4, 1),
        ..Default::default()
    };
    let artifact = ExportArtifact::build(
        &MarkdownExporter::new(),
        MINUTES,
        Format::Markdown,
        config.filename(Format::Markdown),
    )
    .unwrap();
    assert_eq!(artifact.filename, "議事録_2025-04-01.md");
    assert_eq!(artifact.mime_type, "text/markdown;charset=utf-8");
}

// ============================================================================
// HTML
// ============================================================================

#[test]
fn test_html_document_wraps_preview() {
    let html = String::from_utf8(export_to_vec(&HtmlExporter::new(), MINUTES)).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>会議概要</title>"));
    assert!(html.contains(&gijiroku::preview::render_markdown(MINUTES)));
}

// ============================================================================
// DOCX
// ============================================================================

#[test]
fn test_docx_package_parts() {
    let docx = export_to_vec(&DocxExporter::new(), MINUTES);
    let archive = ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/document.xml",
            "word/numbering.xml",
            "word/styles.xml",
        ]
    );
}

#[test]
fn test_docx_paragraph_roles() {
    let docx = export_to_vec(&DocxExporter::new(), "## 概要\n### 詳細\n- 項目\n本文\n\n");
    let paragraphs = read_paragraphs(&read_part(&docx, "word/document.xml"));

    assert_eq!(paragraphs.len(), 4, "blank lines are dropped");

    assert_eq!(paragraphs[0].style.as_deref(), Some("Heading2"));
    assert_eq!(paragraphs[0].before.as_deref(), Some("240"));
    assert_eq!(paragraphs[0].after.as_deref(), Some("120"));

    assert_eq!(paragraphs[1].style.as_deref(), Some("Heading3"));
    assert_eq!(paragraphs[1].before.as_deref(), Some("180"));
    assert_eq!(paragraphs[1].after.as_deref(), Some("100"));

    assert_eq!(paragraphs[2].bullet_level.as_deref(), Some("0"));
    assert_eq!(paragraphs[2].before.as_deref(), Some("60"));
    assert_eq!(paragraphs[2].text, "項目");

    assert_eq!(paragraphs[3].style, None);
    assert_eq!(paragraphs[3].bullet_level, None);
    assert_eq!(paragraphs[3].text, "本文");
}

#[test]
fn test_docx_keeps_inline_markers_literal() {
    let docx = export_to_vec(&DocxExporter::new(), MINUTES);
    let paragraphs = read_paragraphs(&read_part(&docx, "word/document.xml"));
    let expected_count = MINUTES.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(paragraphs.len(), expected_count);

    let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
    assert!(texts.contains(&"**マーケティング費**を前年比10%増とする案を*佐藤*が提示した。"));
    assert!(texts.contains(&"詳細は[共有資料](https://example.com/budget?q=1&r=2)を参照。"));
    assert!(texts.contains(&"`hiring-2025` チャンネルで進捗を共有"));
}

#[test]
fn test_docx_escapes_and_drops_control_chars() {
    let docx = export_to_vec(&DocxExporter::new(), "a < b & 'c'\u{1}");
    let paragraphs = read_paragraphs(&read_part(&docx, "word/document.xml"));
    assert_eq!(paragraphs[0].text, "a < b & 'c'");
}

#[test]
fn test_docx_core_properties_title() {
    let docx = export_to_vec(&DocxExporter::new(), MINUTES);
    let core = read_part(&docx, "docProps/core.xml");
    assert!(core.contains("<dc:title>会議概要</dc:title>"));
    assert!(core.contains("<dc:creator>gijiroku</dc:creator>"));
}

// ============================================================================
// PDF
// ============================================================================

fn page_count(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
}

#[test]
fn test_pdf_single_page_capture() {
    // 400 x 560 px maps to 210 x 294 mm
    let capture = StaticCapture::new(RasterImage::filled(400, 560, [255, 255, 255, 255]));
    let pdf = export_to_vec(&PdfExporter::new(capture), MINUTES);
    assert!(pdf.starts_with(b"%PDF-"));
    assert_eq!(page_count(&pdf), 1);
}

#[test]
fn test_pdf_two_and_a_half_pages() {
    // width 210 units maps to 210mm, so height in px equals height in mm
    let capture = StaticCapture::new(RasterImage::filled(210, 742, [0, 0, 0, 255]));
    let exporter = PdfExporter::new(capture);
    let (_, pages) = exporter.layout().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[2].offset_mm, -594.0);
    assert_eq!(page_count(&export_to_vec(&exporter, MINUTES)), 3);
}

#[test]
fn test_pdf_custom_page_size() {
    let capture = StaticCapture::new(RasterImage::filled(100, 250, [0, 0, 0, 255]));
    let config = PdfConfig {
        page_width_mm: 100.0,
        page_height_mm: 100.0,
        ..Default::default()
    };
    let (_, pages) = PdfExporter::new(capture).with_config(config).layout().unwrap();
    assert_eq!(pages.len(), 3);
}

#[test]
fn test_pdf_capture_failure_writes_nothing() {
    let capture = StaticCapture::new(RasterImage::new(2, 2, vec![0; 3]));
    let mut out = Cursor::new(Vec::new());
    let err = PdfExporter::new(capture).export(MINUTES, &mut out).unwrap_err();
    assert!(matches!(err, Error::RenderCapture(_)));
    assert!(out.get_ref().is_empty());
}

#[test]
fn test_paginate_exact_fit() {
    assert_eq!(paginate(297.0, 297.0).len(), 1);
    assert_eq!(paginate(297.0 * 2.0, 297.0).len(), 2);
    assert_eq!(paginate(0.5, 297.0).len(), 1);
}
