//! Text span extraction using lopdf
//!
//! This module walks a page's content stream and builds a structured layout
//! (text blocks -> lines -> spans, plus image blocks), then flattens it into
//! [`TextSpan`]s that carry the literal text, the rendered fill color and a
//! bounding box in top-left-origin page space.

use crate::color::Rgb;
use crate::document::{
    get_number, page_box, page_resources, resolve, resource_dict, stream_bytes, PageBox,
    MAX_NESTING,
};
use crate::graphics::{
    matrix_from_operands, multiply_matrices, transform_point, translation, GraphicsState, Matrix,
    IDENTITY,
};
use crate::PdfError;
use log::debug;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::HashMap;

/// Baselines closer than this (page units) belong to the same line
const LINE_TOLERANCE: f32 = 1.0;

/// Axis-aligned bounding box, `x0 <= x1` and `y0 <= y1`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Build a box from two corners in any order. A NaN coordinate is kept
    /// as is, so the result fails [`BBox::is_finite`].
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        if [x0, y0, x1, y1].iter().any(|v| v.is_nan()) {
            return Self { x0, y0, x1, y1 };
        }
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Hull of a set of points, `None` when empty or any coordinate is not finite
    pub fn from_points(points: &[(f32, f32)]) -> Option<Self> {
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return None;
        }
        let (first, rest) = points.split_first()?;
        let mut b = BBox::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            b.x0 = b.x0.min(x);
            b.y0 = b.y0.min(y);
            b.x1 = b.x1.max(x);
            b.y1 = b.y1.max(y);
        }
        Some(b)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            x0: self.x0 * scale,
            y0: self.y0 * scale,
            x1: self.x1 * scale,
            y1: self.y1 * scale,
        }
    }
}

/// A run of text with one color, the unit hidden-text detection works on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSpan {
    /// The text content, possibly empty or whitespace
    pub text: String,
    /// Rendered fill color
    pub color: Rgb,
    /// Bounding box in page space (scale 1, origin top-left)
    pub bbox: BBox,
    /// Page number (1-indexed)
    pub page: u32,
    /// Rendered font size
    pub font_size: f32,
}

/// Structured text model of one page
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub page: u32,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub enum Block {
    /// One BT..ET text object
    Text { lines: Vec<Line> },
    /// A placed image; has no line subdivision
    Image { bbox: BBox },
}

impl Block {
    pub fn lines(&self) -> Option<&[Line]> {
        match self {
            Block::Text { lines } => Some(lines.as_slice()),
            Block::Image { .. } => None,
        }
    }
}

/// Spans sharing a baseline
#[derive(Debug, Clone)]
pub struct Line {
    /// Baseline y in page space
    pub baseline: f32,
    pub spans: Vec<LayoutSpan>,
}

/// A span as stored in the layout model, color still packed `0xRRGGBB`
#[derive(Debug, Clone)]
pub struct LayoutSpan {
    pub text: String,
    pub color: u32,
    pub bbox: BBox,
    pub font: String,
    pub font_size: f32,
}

/// Flatten a layout into text spans in reading order.
///
/// Blocks without lines (images) are skipped.
pub fn spans_from_layout(layout: &PageLayout) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    for block in &layout.blocks {
        let Some(lines) = block.lines() else {
            continue;
        };
        for span in lines.iter().flat_map(|line| line.spans.iter()) {
            spans.push(TextSpan {
                text: span.text.clone(),
                color: Rgb::normalize(span.color),
                bbox: span.bbox,
                page: layout.page,
                font_size: span.font_size,
            });
        }
    }
    spans
}

/// Build the structured layout of a single page
pub fn extract_page_layout(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<PageLayout, PdfError> {
    let page_box = page_box(doc, page_id);
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut collector = SpanCollector {
        doc,
        page_box,
        blocks: Vec::new(),
        current_block: None,
    };
    collector.walk(
        &content,
        page_resources(doc, page_id),
        GraphicsState::new(IDENTITY),
        0,
    );
    collector.close_block();

    Ok(PageLayout {
        page: page_num,
        width: page_box.width(),
        height: page_box.height(),
        blocks: collector.blocks,
    })
}

/// Text state parameters (Tc, Tw, Tz, TL, Ts, Tf)
#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scaling: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct SpanCollector<'a> {
    doc: &'a Document,
    page_box: PageBox,
    blocks: Vec<Block>,
    current_block: Option<Vec<Line>>,
}

impl<'a> SpanCollector<'a> {
    fn close_block(&mut self) {
        if let Some(lines) = self.current_block.take() {
            if !lines.is_empty() {
                self.blocks.push(Block::Text { lines });
            }
        }
    }

    fn walk(
        &mut self,
        content: &Content,
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let fonts = resource_dict(doc, resources, b"Font");
        let mut metrics_cache: HashMap<Vec<u8>, FontMetrics> = HashMap::new();

        let mut gs = initial;
        let mut ts = TextState::default();
        let mut stack: Vec<(GraphicsState, TextState)> = Vec::new();
        let mut text_matrix = IDENTITY;
        let mut line_matrix = IDENTITY;

        for op in &content.operations {
            let operands = op.operands.as_slice();
            if gs.apply_fill_operator(doc, resources, &op.operator, operands) {
                continue;
            }
            match op.operator.as_str() {
                "q" => stack.push((gs, ts.clone())),
                "Q" => {
                    if let Some((saved_gs, saved_ts)) = stack.pop() {
                        gs = saved_gs;
                        ts = saved_ts;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from_operands(operands) {
                        gs.concat(&m);
                    }
                }
                "BT" => {
                    self.close_block();
                    self.current_block = Some(Vec::new());
                    text_matrix = IDENTITY;
                    line_matrix = IDENTITY;
                }
                "ET" => self.close_block(),
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Ok(name) = operands[0].as_name() {
                            ts.font = name.to_vec();
                        }
                        if let Some(size) = get_number(&operands[1]) {
                            ts.font_size = size;
                        }
                    }
                }
                "Tc" => set_number(&mut ts.char_spacing, operands),
                "Tw" => set_number(&mut ts.word_spacing, operands),
                "TL" => set_number(&mut ts.leading, operands),
                "Ts" => set_number(&mut ts.rise, operands),
                "Tz" => {
                    if let Some(v) = operands.first().and_then(get_number) {
                        ts.horiz_scaling = v / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            ts.leading = -ty;
                        }
                        line_matrix = multiply_matrices(&translation(tx, ty), &line_matrix);
                        text_matrix = line_matrix;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_from_operands(operands) {
                        text_matrix = m;
                        line_matrix = m;
                    }
                }
                "T*" => {
                    line_matrix = multiply_matrices(&translation(0.0, -ts.leading), &line_matrix);
                    text_matrix = line_matrix;
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "\"" && operands.len() >= 3 {
                        set_number(&mut ts.word_spacing, &operands[0..1]);
                        set_number(&mut ts.char_spacing, &operands[1..2]);
                    }
                    if op.operator == "'" || op.operator == "\"" {
                        line_matrix =
                            multiply_matrices(&translation(0.0, -ts.leading), &line_matrix);
                        text_matrix = line_matrix;
                    }
                    let Some(last) = operands.last() else {
                        continue;
                    };
                    let pieces: &[Object] = match (op.operator.as_str(), last) {
                        ("TJ", Object::Array(items)) => items.as_slice(),
                        ("TJ", _) => continue,
                        _ => std::slice::from_ref(last),
                    };

                    let font_dict = fonts
                        .and_then(|f| f.get(&ts.font).ok())
                        .and_then(|o| resolve(doc, o).as_dict().ok());
                    let metrics = metrics_cache
                        .entry(ts.font.clone())
                        .or_insert_with(|| FontMetrics::from_font(doc, font_dict));

                    let shown = layout_show(doc, font_dict, metrics, &ts, pieces);
                    let trm = multiply_matrices(&text_matrix, &gs.ctm);
                    self.push_span(&shown, &ts, &trm, metrics, gs.fill);
                    text_matrix = multiply_matrices(&translation(shown.advance, 0.0), &text_matrix);
                }
                "Do" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.place_xobject(resources, name, &gs, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn push_span(
        &mut self,
        shown: &ShownText,
        ts: &TextState,
        trm: &Matrix,
        metrics: &FontMetrics,
        fill: Rgb,
    ) {
        let Some(lines) = self.current_block.as_mut() else {
            debug!("text shown outside BT/ET, ignored: {:?}", shown.text);
            return;
        };

        let y_lo = ts.rise + metrics.descent * ts.font_size;
        let y_hi = ts.rise + metrics.ascent * ts.font_size;
        let corners: Vec<(f32, f32)> = [
            (0.0, y_lo),
            (shown.advance, y_lo),
            (0.0, y_hi),
            (shown.advance, y_hi),
        ]
        .iter()
        .map(|&(x, y)| {
            let (dx, dy) = transform_point(trm, x, y);
            self.page_box.to_page_space(dx, dy)
        })
        .collect();

        let Some(bbox) = BBox::from_points(&corners) else {
            debug!("dropping span with non-finite bbox: {:?}", shown.text);
            return;
        };

        let (bx, by) = transform_point(trm, 0.0, ts.rise);
        let baseline = self.page_box.to_page_space(bx, by).1;

        let span = LayoutSpan {
            text: shown.text.clone(),
            color: fill.packed(),
            bbox,
            font: String::from_utf8_lossy(&ts.font).into_owned(),
            font_size: effective_font_size(ts.font_size, trm),
        };

        if let Some(line) = lines
            .last_mut()
            .filter(|line| (line.baseline - baseline).abs() < LINE_TOLERANCE)
        {
            line.spans.push(span);
        } else {
            lines.push(Line {
                baseline,
                spans: vec![span],
            });
        }
    }

    fn place_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        gs: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(stream) = resource_dict(doc, resources, b"XObject")
            .and_then(|x| x.get(name).ok())
            .and_then(|o| resolve(doc, o).as_stream().ok())
        else {
            debug!("XObject {} not found", String::from_utf8_lossy(name));
            return;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                let corners: Vec<(f32, f32)> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
                    .iter()
                    .map(|&(x, y)| {
                        let (dx, dy) = transform_point(&gs.ctm, x, y);
                        self.page_box.to_page_space(dx, dy)
                    })
                    .collect();
                if let Some(bbox) = BBox::from_points(&corners) {
                    self.close_block();
                    self.blocks.push(Block::Image { bbox });
                }
            }
            Ok(b"Form") => {
                if depth >= MAX_NESTING {
                    debug!("Form XObject nesting too deep, skipped");
                    return;
                }
                let Ok(content) = Content::decode(&stream_bytes(stream)) else {
                    debug!("undecodable Form XObject {}", String::from_utf8_lossy(name));
                    return;
                };
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| resolve(doc, o).as_array().ok())
                    .and_then(|a| matrix_from_operands(a))
                    .unwrap_or(IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| resolve(doc, o).as_dict().ok())
                    .or(resources);
                let mut inner = *gs;
                inner.concat(&form_matrix);
                self.walk(&content, form_resources, inner, depth + 1);
            }
            _ => {}
        }
    }
}

fn set_number(target: &mut f32, operands: &[Object]) {
    if let Some(v) = operands.first().and_then(get_number) {
        *target = v;
    }
}

/// Decoded text of one show operator plus its horizontal advance in text space
struct ShownText {
    text: String,
    advance: f32,
}

fn layout_show(
    doc: &Document,
    font_dict: Option<&Dictionary>,
    metrics: &FontMetrics,
    ts: &TextState,
    pieces: &[Object],
) -> ShownText {
    let mut text = String::new();
    let mut advance = 0.0f32;

    for piece in pieces {
        match piece {
            Object::String(bytes, _) => {
                if let Some(decoded) = extract_text_from_operand(piece, doc, font_dict) {
                    text.push_str(&decoded);
                }
                for code in metrics.codes(bytes) {
                    let w0 = metrics.glyph_width(code) / 1000.0;
                    let mut tx = w0 * ts.font_size + ts.char_spacing;
                    if !metrics.two_byte && code == 32 {
                        tx += ts.word_spacing;
                    }
                    advance += tx * ts.horiz_scaling;
                }
            }
            other => {
                if let Some(adjust) = get_number(other) {
                    advance -= adjust / 1000.0 * ts.font_size * ts.horiz_scaling;
                }
            }
        }
    }

    ShownText { text, advance }
}

/// Glyph widths and vertical extent of a font
#[derive(Debug, Clone)]
struct FontMetrics {
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: CidWidths,
    default_width: f32,
    two_byte: bool,
    /// Ascent and descent as fractions of the font size
    ascent: f32,
    descent: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            cid_widths: CidWidths::default(),
            default_width: 500.0,
            two_byte: false,
            ascent: 0.8,
            descent: -0.2,
        }
    }
}

impl FontMetrics {
    fn from_font(doc: &Document, font: Option<&Dictionary>) -> Self {
        let mut metrics = FontMetrics::default();
        let Some(font) = font else {
            return metrics;
        };

        let is_type0 = matches!(font.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0"));
        let descriptor_owner = if is_type0 {
            metrics.two_byte = true;
            metrics.default_width = 1000.0;
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
                .and_then(|a| a.first())
                .and_then(|o| resolve(doc, o).as_dict().ok());
            if let Some(cid_font) = descendant {
                if let Some(dw) = cid_font.get(b"DW").ok().and_then(get_number) {
                    metrics.default_width = dw;
                }
                if let Some(w) = cid_font
                    .get(b"W")
                    .ok()
                    .and_then(|o| resolve(doc, o).as_array().ok())
                {
                    metrics.cid_widths = parse_cid_widths(doc, w);
                }
            }
            descendant
        } else {
            metrics.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
                .max(0) as u32;
            if let Some(widths) = font
                .get(b"Widths")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
            {
                metrics.widths = widths
                    .iter()
                    .map(|o| get_number(resolve(doc, o)).unwrap_or(0.0))
                    .collect();
            }
            Some(font)
        };

        let descriptor = descriptor_owner
            .and_then(|f| f.get(b"FontDescriptor").ok())
            .and_then(|o| resolve(doc, o).as_dict().ok());
        if let Some(descriptor) = descriptor {
            let ascent = descriptor.get(b"Ascent").ok().and_then(get_number);
            let descent = descriptor.get(b"Descent").ok().and_then(get_number);
            if let Some(a) = ascent.filter(|a| *a > 0.0) {
                metrics.ascent = a / 1000.0;
            }
            if let Some(d) = descent.filter(|d| *d != 0.0) {
                metrics.descent = -d.abs() / 1000.0;
            }
        }

        metrics
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        }
    }

    /// Width of a glyph in thousandths of an em
    fn glyph_width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self.cid_widths.get(code).unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

/// CIDFont glyph widths. Ranges from the `c_first c_last w` form are kept
/// as ranges, never expanded per CID.
#[derive(Debug, Clone, Default)]
struct CidWidths {
    single: HashMap<u32, f32>,
    ranges: Vec<(u32, u32, f32)>,
}

impl CidWidths {
    fn get(&self, cid: u32) -> Option<f32> {
        self.single.get(&cid).copied().or_else(|| {
            self.ranges
                .iter()
                .find(|(first, last, _)| (*first..=*last).contains(&cid))
                .map(|&(_, _, w)| w)
        })
    }
}

/// Parse a CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms
fn parse_cid_widths(doc: &Document, w: &[Object]) -> CidWidths {
    let mut widths = CidWidths::default();
    let mut i = 0;
    while i < w.len() {
        let Some(start) = resolve(doc, &w[i])
            .as_i64()
            .ok()
            .and_then(|v| u32::try_from(v).ok())
        else {
            debug!("malformed /W entry at index {}, rest ignored", i);
            break;
        };
        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, o) in list.iter().enumerate() {
                    let cid = u32::try_from(offset)
                        .ok()
                        .and_then(|offset| start.checked_add(offset));
                    if let (Some(cid), Some(width)) = (cid, get_number(resolve(doc, o))) {
                        widths.single.insert(cid, width);
                    }
                }
                i += 2;
            }
            Some(end) => {
                let (Some(end), Some(width)) = (
                    end.as_i64().ok().and_then(|v| u32::try_from(v).ok()),
                    w.get(i + 2).and_then(|o| get_number(resolve(doc, o))),
                ) else {
                    debug!("malformed /W range at index {}, rest ignored", i);
                    break;
                };
                if end >= start {
                    widths.ranges.push((start, end, width));
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Compute effective font size from base size and text rendering matrix
fn effective_font_size(base_size: f32, trm: &Matrix) -> f32 {
    let scale_x = (trm[0].powi(2) + trm[1].powi(2)).sqrt();
    let scale_y = (trm[2].powi(2) + trm[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Extract text from a text operand, handling encoding
fn extract_text_from_operand(
    obj: &Object,
    doc: &Document,
    font_dict: Option<&Dictionary>,
) -> Option<String> {
    if let Object::String(bytes, _) = obj {
        // Try to decode using font encoding
        if let Some(font_dict) = font_dict {
            if let Ok(encoding) = font_dict.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return Some(text);
                }
            }
        }

        // Fallback: try UTF-16BE then Latin-1
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect();
            return Some(String::from_utf16_lossy(&utf16));
        }

        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}
