//! Highlighting of hidden spans
//!
//! Draws outlined rectangles over hidden spans on a page raster and renders
//! span lists as HTML fragments with hidden spans styled apart.

use crate::classifier::ClassificationResult;
use crate::color::Rgb;
use crate::extractor::BBox;
use crate::raster::PageRaster;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Outline color for hidden spans
pub const HIGHLIGHT_COLOR: Rgb = Rgb::RED;

/// Outline width in pixels
pub const OUTLINE_WIDTH: u32 = 2;

const HIDDEN_STYLE: &str = "color:red; font-family:Arial; font-size:10pt;";
const VISIBLE_STYLE: &str = "font-family:Arial; font-size:10pt;";

/// Draw an outline of `width` pixels inside the box's rounded, scaled
/// edges. Edges are inclusive, so a box from 10 to 20 covers 11 pixels.
pub fn draw_outline(raster: &mut PageRaster, bbox: &BBox, color: Rgb, width: u32) {
    let b = bbox.scaled(raster.scale());
    // Edges far off the raster are pulled in to just past the outline width,
    // which keeps every inset ring off-raster and the sizes small
    let margin = i64::from(width) + 1;
    let edge = |v: f32, extent: u32| (v.round() as i64).clamp(-margin, i64::from(extent) + margin);
    let x0 = edge(b.x0, raster.width());
    let y0 = edge(b.y0, raster.height());
    let x1 = edge(b.x1, raster.width());
    let y1 = edge(b.y1, raster.height());
    let color: image::Rgb<u8> = color.into();

    for t in 0..i64::from(width) {
        let inner_w = x1 - x0 + 1 - 2 * t;
        let inner_h = y1 - y0 + 1 - 2 * t;
        if inner_w <= 0 || inner_h <= 0 {
            break;
        }
        let (Ok(left), Ok(top), Ok(w), Ok(h)) = (
            i32::try_from(x0 + t),
            i32::try_from(y0 + t),
            u32::try_from(inner_w),
            u32::try_from(inner_h),
        ) else {
            return;
        };
        draw_hollow_rect_mut(raster.image_mut(), Rect::at(left, top).of_size(w, h), color);
    }
}

/// Outline every hidden span, in span order. Returns the number drawn.
pub fn highlight_hidden(raster: &mut PageRaster, results: &[ClassificationResult]) -> usize {
    let mut drawn = 0;
    for result in results.iter().filter(|r| r.is_hidden) {
        draw_outline(raster, &result.span.bbox, HIGHLIGHT_COLOR, OUTLINE_WIDTH);
        drawn += 1;
    }
    drawn
}

/// HTML fragment for a sequence of classified spans.
///
/// Every span becomes a `<span>`; hidden ones are colored red. Text is
/// escaped so span content cannot inject markup.
pub fn to_html<'a, I>(results: I) -> String
where
    I: IntoIterator<Item = &'a ClassificationResult>,
{
    let mut html = String::new();
    for result in results {
        let style = if result.is_hidden {
            HIDDEN_STYLE
        } else {
            VISIBLE_STYLE
        };
        html.push_str("<span style=\"");
        html.push_str(style);
        html.push_str("\">");
        html.push_str(&html_escape::encode_quoted_attribute(&result.span.text));
        html.push_str("</span>");
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SampleStatus;
    use crate::extractor::TextSpan;

    fn result(text: &str, bbox: BBox, is_hidden: bool) -> ClassificationResult {
        ClassificationResult {
            span: TextSpan {
                text: text.into(),
                color: Rgb::BLACK,
                bbox,
                page: 1,
                font_size: 10.0,
            },
            is_hidden,
            background: None,
            status: SampleStatus::Sampled,
        }
    }

    #[test]
    fn test_outline_is_two_pixels_inward() {
        let mut raster = PageRaster::filled(50, 50, Rgb::WHITE, 1.0);
        draw_outline(&mut raster, &BBox::new(10.0, 10.0, 20.0, 20.0), Rgb::RED, 2);
        assert_eq!(raster.pixel(10, 10), Rgb::RED);
        assert_eq!(raster.pixel(11, 15), Rgb::RED);
        assert_eq!(raster.pixel(20, 20), Rgb::RED);
        assert_eq!(raster.pixel(19, 15), Rgb::RED);
        assert_eq!(raster.pixel(12, 15), Rgb::WHITE);
        assert_eq!(raster.pixel(9, 15), Rgb::WHITE);
        assert_eq!(raster.pixel(21, 15), Rgb::WHITE);
    }

    #[test]
    fn test_outline_respects_scale() {
        let mut raster = PageRaster::filled(100, 100, Rgb::WHITE, 2.0);
        draw_outline(&mut raster, &BBox::new(10.0, 10.0, 20.0, 20.0), Rgb::RED, 2);
        assert_eq!(raster.pixel(20, 30), Rgb::RED);
        assert_eq!(raster.pixel(40, 30), Rgb::RED);
        assert_eq!(raster.pixel(10, 30), Rgb::WHITE);
    }

    #[test]
    fn test_outline_clipped_at_edges() {
        let mut raster = PageRaster::filled(10, 10, Rgb::WHITE, 1.0);
        draw_outline(&mut raster, &BBox::new(-5.0, -5.0, 30.0, 30.0), Rgb::RED, 2);
        // Entirely off-raster edges leave the interior untouched
        assert_eq!(raster.pixel(5, 5), Rgb::WHITE);
    }

    #[test]
    fn test_outline_of_huge_box() {
        let mut raster = PageRaster::filled(10, 10, Rgb::WHITE, 1.0);
        draw_outline(&mut raster, &BBox::new(-1e30, -1e30, 1e30, 1e30), Rgb::RED, 2);
        assert!(raster.image().pixels().all(|p| *p == image::Rgb([255, 255, 255])));

        // Only the near edges are on the raster
        draw_outline(&mut raster, &BBox::new(2.0, 2.0, 1e30, 1e30), Rgb::RED, 2);
        assert_eq!(raster.pixel(2, 5), Rgb::RED);
        assert_eq!(raster.pixel(3, 5), Rgb::RED);
        assert_eq!(raster.pixel(4, 5), Rgb::WHITE);
        assert_eq!(raster.pixel(9, 9), Rgb::WHITE);
    }

    #[test]
    fn test_highlight_hidden_span_covering_everything() {
        let mut raster = PageRaster::filled(20, 20, Rgb::WHITE, 2.0);
        let results = vec![result("huge", BBox::new(-1e30, -1e30, 1e30, 1e30), true)];
        assert_eq!(highlight_hidden(&mut raster, &results), 1);
        assert_eq!(raster.pixel(0, 0), Rgb::WHITE);
    }

    #[test]
    fn test_only_hidden_spans_highlighted() {
        let mut raster = PageRaster::filled(100, 50, Rgb::WHITE, 1.0);
        let results = vec![
            result("a", BBox::new(5.0, 5.0, 20.0, 20.0), true),
            result("b", BBox::new(50.0, 5.0, 70.0, 20.0), false),
        ];
        assert_eq!(highlight_hidden(&mut raster, &results), 1);
        assert_eq!(raster.pixel(5, 5), Rgb::RED);
        assert_eq!(raster.pixel(50, 5), Rgb::WHITE);
        assert_eq!(raster.pixel(70, 20), Rgb::WHITE);
    }

    #[test]
    fn test_html_styles_and_escaping() {
        let results = vec![
            result("<b>&", BBox::default(), true),
            result("plain", BBox::default(), false),
        ];
        let html = to_html(&results);
        assert_eq!(
            html,
            "<span style=\"color:red; font-family:Arial; font-size:10pt;\">&lt;b&gt;&amp;</span>\
             <span style=\"font-family:Arial; font-size:10pt;\">plain</span>"
        );
    }

    #[test]
    fn test_html_escapes_quotes() {
        let results = vec![result("say \"hi\" it's", BBox::default(), true)];
        let html = to_html(&results);
        let body = html
            .strip_prefix("<span style=\"color:red; font-family:Arial; font-size:10pt;\">")
            .and_then(|rest| rest.strip_suffix("</span>"))
            .unwrap();
        assert!(body.contains("&quot;hi&quot;"));
        assert!(!body.contains('"'));
        assert!(!body.contains('\''));
        assert!(body.starts_with("say ") && body.ends_with('s'));
    }

    #[test]
    fn test_html_preserves_span_order() {
        let results = vec![
            result("first", BBox::default(), false),
            result("second", BBox::default(), true),
            result("third", BBox::default(), false),
        ];
        let html = to_html(&results);
        let a = html.find("first").unwrap();
        let b = html.find("second").unwrap();
        let c = html.find("third").unwrap();
        assert!(a < b && b < c);
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_html_decision_is_per_span() {
        // Same text, only the second occurrence hidden
        let results = vec![
            result("dup", BBox::default(), false),
            result("dup", BBox::default(), true),
        ];
        let html = to_html(&results);
        assert!(html.starts_with("<span style=\"font-family"));
        assert_eq!(html.matches("color:red").count(), 1);
    }
}
