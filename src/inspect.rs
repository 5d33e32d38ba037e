//! Hidden-text inspection pipeline
//!
//! For every selected page: extract spans, rasterize, classify, then draw
//! highlights. Pages are independent, so they are processed in parallel and
//! gathered back in page order. A failing page is recorded in the report
//! instead of aborting the request.

use crate::annotate::{highlight_hidden, to_html};
use crate::classifier::{classify_spans, ClassificationResult, HiddenContent};
use crate::color::DEFAULT_TOLERANCE;
use crate::document::DocumentSource;
use crate::pages::PageRangeSet;
use crate::raster::PageRaster;
use crate::PdfError;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

/// Configuration for one inspection request
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Per-channel color tolerance (default: 30)
    pub tolerance: u8,
    /// Render scale, at least 1.0 (default: 1.0)
    pub scale: f32,
    /// Page range expression such as `"1,3-5"`; `None` selects all pages
    pub pages: Option<String>,
    /// Process pages on the rayon thread pool
    pub parallel: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            scale: 1.0,
            pages: None,
            parallel: true,
        }
    }
}

/// Everything produced for one successfully processed page
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// Page number (1-indexed)
    pub page: u32,
    /// Raster dimensions in pixels
    pub width: u32,
    pub height: u32,
    /// One entry per span, in reading order
    pub results: Vec<ClassificationResult>,
    pub hidden: HiddenContent,
    /// HTML fragment for this page's spans
    pub markup: String,
    /// Page raster with hidden spans outlined
    #[serde(skip)]
    pub annotated: PageRaster,
}

/// Outcome of one selected page
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Inspected(PageResult),
    Failed { page: u32, error: String },
}

impl PageOutcome {
    pub fn page(&self) -> u32 {
        match self {
            PageOutcome::Inspected(result) => result.page,
            PageOutcome::Failed { page, .. } => *page,
        }
    }

    pub fn result(&self) -> Option<&PageResult> {
        match self {
            PageOutcome::Inspected(result) => Some(result),
            PageOutcome::Failed { .. } => None,
        }
    }
}

/// Result of inspecting a document
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    /// Pages in the document
    pub page_count: u32,
    pub tolerance: u8,
    pub scale: f32,
    /// One entry per selected page, in page order
    pub pages: Vec<PageOutcome>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl InspectionReport {
    /// Successfully processed pages
    pub fn inspected(&self) -> impl Iterator<Item = &PageResult> {
        self.pages.iter().filter_map(PageOutcome::result)
    }

    /// Pages that failed, with their error messages
    pub fn failures(&self) -> impl Iterator<Item = (u32, &str)> {
        self.pages.iter().filter_map(|outcome| match outcome {
            PageOutcome::Failed { page, error } => Some((*page, error.as_str())),
            PageOutcome::Inspected(_) => None,
        })
    }

    /// Hidden texts across all pages, in page then reading order
    pub fn hidden_texts(&self) -> Vec<&str> {
        self.inspected()
            .flat_map(|page| page.hidden.texts.iter().map(String::as_str))
            .collect()
    }

    pub fn hidden_count(&self) -> usize {
        self.inspected().map(|page| page.hidden.len()).sum()
    }

    pub fn span_count(&self) -> usize {
        self.inspected().map(|page| page.results.len()).sum()
    }

    /// HTML for all processed pages, concatenated in page order
    pub fn combined_markup(&self) -> String {
        self.inspected().map(|page| page.markup.as_str()).collect()
    }

    pub fn to_json(&self) -> Result<String, PdfError> {
        serde_json::to_string_pretty(self).map_err(|e| PdfError::Parse(e.to_string()))
    }
}

/// Inspect a document for hidden text.
///
/// Errors that concern the request as a whole (bad page range, nothing
/// selected, bad scale) are returned; errors of a single page are recorded
/// as [`PageOutcome::Failed`].
pub fn inspect_document<S: DocumentSource>(
    source: &S,
    options: &InspectOptions,
) -> Result<InspectionReport, PdfError> {
    let start = std::time::Instant::now();

    if !options.scale.is_finite() || options.scale < 1.0 {
        return Err(PdfError::InvalidScale(options.scale));
    }

    let page_count = source.page_count();
    let selection = PageRangeSet::parse(options.pages.as_deref(), page_count)?;
    if selection.is_empty() {
        return Err(PdfError::EmptySelection);
    }

    let run = |page: u32| match inspect_page(source, page, options) {
        Ok(result) => PageOutcome::Inspected(result),
        Err(e) => {
            warn!("page {} failed: {}", page, e);
            PageOutcome::Failed {
                page,
                error: e.to_string(),
            }
        }
    };

    // par_iter over a slice is indexed, so collect keeps page order
    let pages: Vec<PageOutcome> = if options.parallel {
        selection.pages().par_iter().map(|&page| run(page)).collect()
    } else {
        selection.iter().map(run).collect()
    };

    let report = InspectionReport {
        page_count,
        tolerance: options.tolerance,
        scale: options.scale,
        pages,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "inspected {} of {} pages: {} hidden of {} spans, {} failed",
        selection.len(),
        page_count,
        report.hidden_count(),
        report.span_count(),
        report.failures().count()
    );
    Ok(report)
}

/// Process a single page. The raster lives only inside this call until it
/// is handed back, annotated, in the [`PageResult`].
pub fn inspect_page<S: DocumentSource + ?Sized>(
    source: &S,
    page: u32,
    options: &InspectOptions,
) -> Result<PageResult, PdfError> {
    let spans = source.spans(page)?;
    let mut raster = source.raster(page, options.scale)?;

    // Classify against the clean raster before anything is drawn on it
    let results = classify_spans(spans, &raster, options.tolerance);
    let hidden = HiddenContent::from_results(&results);
    let drawn = highlight_hidden(&mut raster, &results);
    debug!(
        "page {}: {} spans, {} hidden, {} outlines",
        page,
        results.len(),
        hidden.len(),
        drawn
    );

    Ok(PageResult {
        page,
        width: raster.width(),
        height: raster.height(),
        markup: to_html(&results),
        results,
        hidden,
        annotated: raster,
    })
}
