//! Hidden text detection in PDFs using lopdf
//!
//! This crate provides:
//! - Text span extraction with fill colors and page-space bounding boxes
//! - Software rasterization of page fills and images
//! - Detection of spans whose color blends into the background beneath them
//! - Highlighted page images and HTML renderings of the findings

pub mod annotate;
pub mod classifier;
pub mod color;
pub mod document;
pub mod extractor;
pub mod graphics;
pub mod inspect;
pub mod pages;
pub mod raster;

pub use annotate::{draw_outline, highlight_hidden, to_html};
pub use classifier::{classify_span, classify_spans, ClassificationResult, HiddenContent};
pub use color::{similar, Rgb, DEFAULT_TOLERANCE};
pub use document::{DocumentSource, PdfDocument};
pub use extractor::{BBox, TextSpan};
pub use inspect::{inspect_document, InspectOptions, InspectionReport, PageOutcome, PageResult};
pub use pages::{PageRangeSet, RangeError};
pub use raster::PageRaster;

use std::path::Path;

/// Inspect a PDF file for hidden text with default options
pub fn inspect_pdf<P: AsRef<Path>>(path: P) -> Result<InspectionReport, PdfError> {
    inspect_pdf_with_config(path, &InspectOptions::default())
}

/// Inspect a PDF file for hidden text
///
/// This function will:
/// 1. Load the document
/// 2. Parse the page selection
/// 3. Classify and highlight the spans of every selected page
pub fn inspect_pdf_with_config<P: AsRef<Path>>(
    path: P,
    options: &InspectOptions,
) -> Result<InspectionReport, PdfError> {
    let document = PdfDocument::open(path)?;
    inspect_document(&document, options)
}

/// Inspect a PDF held in memory with default options
pub fn inspect_pdf_mem(buffer: &[u8]) -> Result<InspectionReport, PdfError> {
    inspect_pdf_mem_with_config(buffer, &InspectOptions::default())
}

/// Inspect a PDF held in memory
pub fn inspect_pdf_mem_with_config(
    buffer: &[u8],
    options: &InspectOptions,
) -> Result<InspectionReport, PdfError> {
    let document = PdfDocument::from_bytes(buffer)?;
    inspect_document(&document, options)
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Failed to load PDF: {0}")]
    DocumentLoad(String),
    #[error("Invalid page range: {0}")]
    InvalidRange(#[from] RangeError),
    #[error("No pages selected")]
    EmptySelection,
    #[error("Invalid render scale {0}, must be at least 1")]
    InvalidScale(f32),
    #[error("Page {0} not found")]
    PageNotFound(u32),
    #[error("Page raster of {width}x{height} pixels exceeds the size limit")]
    RasterTooLarge { width: u64, height: u64 },
    #[error("Image error: {0}")]
    Image(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}
