//! Hidden-content classification
//!
//! A span is hidden when its fill color is within tolerance of the mean
//! color of the raster pixels under its bounding box. The whole bbox is
//! sampled, so on a raster that also contains the glyphs themselves the
//! mean is biased toward the text color.

use crate::color::{similar, Rgb};
use crate::extractor::{BBox, TextSpan};
use crate::raster::PageRaster;
use serde::Serialize;

/// Why a span did or did not get a background sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Sampled,
    /// Zero-area box after rounding to pixels
    Degenerate,
    /// Box lies entirely outside the raster
    OutOfBounds,
}

/// Classification of one span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub span: TextSpan,
    pub is_hidden: bool,
    /// Mean background color under the span, when one could be sampled
    pub background: Option<Rgb>,
    pub status: SampleStatus,
}

/// Hidden spans of a page as two parallel lists
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HiddenContent {
    pub texts: Vec<String>,
    pub bboxes: Vec<BBox>,
}

impl HiddenContent {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut hidden = HiddenContent::default();
        for result in results.iter().filter(|r| r.is_hidden) {
            hidden.texts.push(result.span.text.clone());
            hidden.bboxes.push(result.span.bbox);
        }
        hidden
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Integer pixel rectangle, half-open: `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelRect {
    /// Scale a page-space bbox to the raster and round each edge to nearest
    pub fn from_bbox(bbox: &BBox, scale: f32) -> Self {
        let b = bbox.scaled(scale);
        Self {
            x0: b.x0.round() as i64,
            y0: b.y0.round() as i64,
            x1: b.x1.round() as i64,
            y1: b.y1.round() as i64,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Intersect with `[0, width) x [0, height)`, `None` when nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let clamped = Self {
            x0: self.x0.clamp(0, width as i64),
            y0: self.y0.clamp(0, height as i64),
            x1: self.x1.clamp(0, width as i64),
            y1: self.y1.clamp(0, height as i64),
        };
        (!clamped.is_degenerate()).then_some(clamped)
    }
}

/// Mean color of a raster region, each channel truncated to an integer
pub fn mean_color(raster: &PageRaster, rect: &PixelRect) -> Rgb {
    let mut sums = [0u64; 3];
    let mut count = 0u64;
    let image = raster.image();
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let p = image.get_pixel(x as u32, y as u32);
            sums[0] += p[0] as u64;
            sums[1] += p[1] as u64;
            sums[2] += p[2] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return Rgb::BLACK;
    }
    Rgb::new(
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    )
}

/// Sample the background under a span's bbox.
///
/// Regions reaching past the raster are clamped to it; degenerate or
/// fully outside boxes produce no sample.
pub fn sample_background(raster: &PageRaster, bbox: &BBox) -> Result<Rgb, SampleStatus> {
    let rect = PixelRect::from_bbox(bbox, raster.scale());
    if rect.is_degenerate() {
        return Err(SampleStatus::Degenerate);
    }
    let clamped = rect
        .clamp_to(raster.width(), raster.height())
        .ok_or(SampleStatus::OutOfBounds)?;
    Ok(mean_color(raster, &clamped))
}

/// Classify one span against the raster
pub fn classify_span(span: TextSpan, raster: &PageRaster, tolerance: u8) -> ClassificationResult {
    match sample_background(raster, &span.bbox) {
        Ok(background) => ClassificationResult {
            is_hidden: similar(span.color, background, tolerance),
            background: Some(background),
            status: SampleStatus::Sampled,
            span,
        },
        Err(status) => ClassificationResult {
            span,
            is_hidden: false,
            background: None,
            status,
        },
    }
}

/// Classify every span of a page, preserving span order
pub fn classify_spans(
    spans: Vec<TextSpan>,
    raster: &PageRaster,
    tolerance: u8,
) -> Vec<ClassificationResult> {
    spans
        .into_iter()
        .map(|span| classify_span(span, raster, tolerance))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn span(color: Rgb, bbox: BBox) -> TextSpan {
        TextSpan {
            text: "word".into(),
            color,
            bbox,
            page: 1,
            font_size: 10.0,
        }
    }

    /// 100x100 raster: left half black, right half white
    fn split_raster(scale: f32) -> PageRaster {
        let size = (100.0 * scale) as u32;
        let img = RgbImage::from_fn(size, size, |x, _| {
            if x < size / 2 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        PageRaster::from_image(img, scale)
    }

    #[test]
    fn test_black_on_black_is_hidden() {
        let raster = split_raster(1.0);
        let r = classify_span(span(Rgb::BLACK, BBox::new(5.0, 5.0, 40.0, 20.0)), &raster, 30);
        assert!(r.is_hidden);
        assert_eq!(r.background, Some(Rgb::BLACK));
        assert_eq!(r.status, SampleStatus::Sampled);
    }

    #[test]
    fn test_red_on_white_is_visible() {
        let raster = split_raster(1.0);
        let r = classify_span(span(Rgb::RED, BBox::new(60.0, 5.0, 90.0, 20.0)), &raster, 30);
        assert!(!r.is_hidden);
        assert_eq!(r.background, Some(Rgb::WHITE));
    }

    #[test]
    fn test_exact_mean_match_hidden_for_any_tolerance() {
        let raster = split_raster(1.0);
        // Straddles the split evenly: mean is 127 on every channel
        let bbox = BBox::new(40.0, 0.0, 60.0, 10.0);
        let background = sample_background(&raster, &bbox).unwrap();
        assert_eq!(background, Rgb::new(127, 127, 127));
        for tolerance in [0, 1, 30, 255] {
            assert!(classify_span(span(background, bbox), &raster, tolerance).is_hidden);
        }
    }

    #[test]
    fn test_zero_area_never_hidden() {
        let raster = split_raster(1.0);
        for bbox in [
            BBox::new(10.0, 10.0, 10.0, 20.0),
            BBox::new(10.0, 10.0, 20.0, 10.0),
            // Rounds to the same pixel edge
            BBox::new(10.2, 10.0, 10.4, 20.0),
        ] {
            let r = classify_span(span(Rgb::BLACK, bbox), &raster, 255);
            assert!(!r.is_hidden);
            assert_eq!(r.status, SampleStatus::Degenerate);
            assert_eq!(r.background, None);
        }
    }

    #[test]
    fn test_out_of_bounds_clamped() {
        let raster = split_raster(1.0);
        // Overflows the right edge: only white pixels remain after clamping
        let r = classify_span(span(Rgb::WHITE, BBox::new(90.0, 0.0, 130.0, 10.0)), &raster, 0);
        assert!(r.is_hidden);

        let r = classify_span(span(Rgb::WHITE, BBox::new(120.0, 0.0, 130.0, 10.0)), &raster, 255);
        assert!(!r.is_hidden);
        assert_eq!(r.status, SampleStatus::OutOfBounds);
    }

    #[test]
    fn test_bbox_scaled_to_raster() {
        let raster = split_raster(2.0);
        // In page space the span sits on the white half
        let r = classify_span(span(Rgb::WHITE, BBox::new(55.0, 0.0, 95.0, 10.0)), &raster, 0);
        assert!(r.is_hidden);
    }

    #[test]
    fn test_tolerance_boundary() {
        let raster = PageRaster::filled(20, 20, Rgb::new(100, 100, 100), 1.0);
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(classify_span(span(Rgb::new(130, 100, 100), bbox), &raster, 30).is_hidden);
        assert!(!classify_span(span(Rgb::new(131, 100, 100), bbox), &raster, 30).is_hidden);
    }

    #[test]
    fn test_empty_text_still_classified() {
        let raster = split_raster(1.0);
        let mut s = span(Rgb::BLACK, BBox::new(0.0, 0.0, 10.0, 10.0));
        s.text.clear();
        assert!(classify_span(s, &raster, 30).is_hidden);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let raster = split_raster(1.0);
        let spans = vec![
            span(Rgb::BLACK, BBox::new(5.0, 5.0, 40.0, 20.0)),
            span(Rgb::RED, BBox::new(60.0, 5.0, 90.0, 20.0)),
            span(Rgb::new(120, 120, 120), BBox::new(30.0, 0.0, 70.0, 50.0)),
        ];
        let first = classify_spans(spans.clone(), &raster, 30);
        let second = classify_spans(spans, &raster, 30);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hidden_content_parallel_lists() {
        let raster = split_raster(1.0);
        let results = classify_spans(
            vec![
                span(Rgb::BLACK, BBox::new(5.0, 5.0, 40.0, 20.0)),
                span(Rgb::RED, BBox::new(60.0, 5.0, 90.0, 20.0)),
            ],
            &raster,
            30,
        );
        let hidden = HiddenContent::from_results(&results);
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden.texts, vec!["word".to_string()]);
        assert_eq!(hidden.bboxes, vec![BBox::new(5.0, 5.0, 40.0, 20.0)]);
    }
}
