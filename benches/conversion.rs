//! Benchmarks for the rendering and export pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;
use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use gijiroku::export::{
    DocxExporter, Exporter, PdfExporter, RasterImage, StaticCapture, WordDocument,
};
use gijiroku::markdown::parse;
use gijiroku::preview::render;

const MINUTES: &str = include_str!("../tests/fixtures/minutes.md");

/// The fixture repeated until it resembles a long meeting.
fn long_minutes() -> String {
    MINUTES.repeat(50)
}

// ============================================================================
// Markdown Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let source = long_minutes();
    c.bench_function("parse", |b| {
        b.iter(|| parse(black_box(&source)));
    });
}

fn bench_render_preview(c: &mut Criterion) {
    let blocks = parse(&long_minutes());
    c.bench_function("render_preview", |b| {
        b.iter(|| render(black_box(&blocks)));
    });
}

// ============================================================================
// Export Benchmarks
// ============================================================================

fn bench_docx(c: &mut Criterion) {
    let source = long_minutes();
    c.bench_function("docx_model", |b| {
        b.iter(|| WordDocument::build(black_box(&source)));
    });
    c.bench_function("docx_export", |b| {
        b.iter(|| {
            let mut out = Cursor::new(Vec::new());
            DocxExporter::new().export(&source, &mut out).unwrap();
            out
        });
    });
}

fn bench_pdf(c: &mut Criterion) {
    // A4 at 2x of a 794px-wide region, three pages tall
    let image = RasterImage::filled(1588, 6738, [255, 255, 255, 255]);
    c.bench_function("pdf_export", |b| {
        b.iter(|| {
            let capture = StaticCapture::new(image.clone());
            let mut out = Cursor::new(Vec::new());
            PdfExporter::new(capture).export(MINUTES, &mut out).unwrap();
            out
        });
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_render_preview,
    bench_docx,
    bench_pdf
);
criterion_main!(benches);
