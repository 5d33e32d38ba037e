//! Document access
//!
//! The inspection pipeline only needs three things from a document: how many
//! pages it has, the text spans of a page, and a raster of a page. That
//! capability is the [`DocumentSource`] trait; [`PdfDocument`] implements it
//! on top of lopdf.

use crate::extractor::{extract_page_layout, spans_from_layout, PageLayout, TextSpan};
use crate::raster::{rasterize_page, PageRaster};
use crate::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Maximum depth when following Form XObjects or indirect references
pub(crate) const MAX_NESTING: usize = 8;

/// US Letter, used when a page has neither CropBox nor MediaBox
const DEFAULT_PAGE_BOX: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Everything the inspection pipeline reads from a document
pub trait DocumentSource: Sync {
    /// Number of pages
    fn page_count(&self) -> u32;

    /// Text spans of a page (1-indexed) in reading order, bboxes in page
    /// space at scale 1 with a top-left origin
    fn spans(&self, page: u32) -> Result<Vec<TextSpan>, PdfError>;

    /// Render a page (1-indexed) at the given scale
    fn raster(&self, page: u32, scale: f32) -> Result<PageRaster, PdfError>;
}

/// A loaded PDF document
pub struct PdfDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfDocument {
    /// Load a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PdfError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let doc = Document::load(path).map_err(|e| PdfError::DocumentLoad(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    /// Load a PDF from a memory buffer
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(buffer).map_err(|e| PdfError::DocumentLoad(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded lopdf document
    pub fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    pub fn inner(&self) -> &Document {
        &self.doc
    }

    pub fn page_id(&self, page: u32) -> Result<ObjectId, PdfError> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(PdfError::PageNotFound(page))
    }

    /// Structured text layout (blocks, lines, spans) of a page
    pub fn layout(&self, page: u32) -> Result<PageLayout, PdfError> {
        let page_id = self.page_id(page)?;
        extract_page_layout(&self.doc, page_id, page)
    }
}

impl DocumentSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn spans(&self, page: u32) -> Result<Vec<TextSpan>, PdfError> {
        let layout = self.layout(page)?;
        Ok(spans_from_layout(&layout))
    }

    fn raster(&self, page: u32, scale: f32) -> Result<PageRaster, PdfError> {
        let page_id = self.page_id(page)?;
        rasterize_page(&self.doc, page_id, scale)
    }
}

/// Visible page area in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Map a device-space point to top-left-origin page space
    pub fn to_page_space(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.x0, self.y1 - y)
    }

    fn from_object(doc: &Document, obj: &Object) -> Option<Self> {
        let arr = resolve(doc, obj).as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let nums: Vec<f32> = arr
            .iter()
            .filter_map(|o| get_number(resolve(doc, o)))
            .collect();
        if nums.len() != 4 {
            return None;
        }
        let b = PageBox {
            x0: nums[0].min(nums[2]),
            y0: nums[1].min(nums[3]),
            x1: nums[0].max(nums[2]),
            y1: nums[1].max(nums[3]),
        };
        (b.width() > 0.0 && b.height() > 0.0).then_some(b)
    }
}

/// CropBox, falling back to MediaBox, falling back to US Letter
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    [b"CropBox".as_slice(), b"MediaBox".as_slice()]
        .iter()
        .find_map(|key| inherited(doc, page_id, key).and_then(|o| PageBox::from_object(doc, o)))
        .unwrap_or(DEFAULT_PAGE_BOX)
}

/// Resources dictionary of a page, following `/Parent` inheritance
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    inherited(doc, page_id, b"Resources").and_then(|o| resolve(doc, o).as_dict().ok())
}

/// Look up a page attribute, walking up the page tree when missing
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_NESTING * 4 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow indirect references
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..MAX_NESTING {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => current = target,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

/// Resolve a sub-dictionary of a resources dictionary (`/Font`, `/XObject`, ...)
pub fn resource_dict<'a>(
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    key: &[u8],
) -> Option<&'a Dictionary> {
    resources
        .and_then(|r| r.get(key).ok())
        .and_then(|o| resolve(doc, o).as_dict().ok())
}

/// Decoded stream bytes, falling back to the raw content
pub fn stream_bytes(stream: &lopdf::Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_ok() {
        match stream.decompressed_content() {
            Ok(data) => data,
            Err(_) => stream.content.clone(),
        }
    } else {
        stream.content.clone()
    }
}

/// Helper to get f32 from Object
pub fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
