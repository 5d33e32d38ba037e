//! Page rasterization
//!
//! A small software renderer for the parts of a page that form the
//! background text sits on: filled paths and placed images. Glyph outlines,
//! strokes, shadings, clipping and transparency are not rendered. Output is
//! aliased and fully deterministic.

use crate::color::Rgb;
use crate::document::{
    get_number, page_box, page_resources, resolve, resource_dict, stream_bytes, PageBox,
    MAX_NESTING,
};
use crate::graphics::{
    invert_matrix, matrix_from_operands, multiply_matrices, transform_point, ColorSpaceKind,
    GraphicsState, Matrix, IDENTITY,
};
use crate::PdfError;
use image::RgbImage;
use log::debug;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::path::Path;

/// Segments used to flatten one Bézier curve
const CURVE_SEGMENTS: usize = 8;

/// Largest RGB buffer a page may rasterize to (512 MiB)
pub const MAX_RASTER_BYTES: u64 = 512 * 1024 * 1024;

/// An RGB pixel grid for one page at a given render scale
#[derive(Debug, Clone)]
pub struct PageRaster {
    image: RgbImage,
    scale: f32,
}

impl PageRaster {
    /// Wrap an existing image rendered at `scale`
    pub fn from_image(image: RgbImage, scale: f32) -> Self {
        Self { image, scale }
    }

    /// A raster filled with a single color
    pub fn filled(width: u32, height: u32, color: Rgb, scale: f32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, color.into()),
            scale,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        (*self.image.get_pixel(x, y)).into()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, PdfError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| PdfError::Image(e.to_string()))?;
        Ok(buf)
    }

    /// Write as a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), PdfError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| PdfError::Image(e.to_string()))
    }
}

/// Pixel dimensions of a page box rendered at `scale`.
///
/// Fails when the RGB buffer would exceed [`MAX_RASTER_BYTES`].
pub fn raster_size(page_box: &PageBox, scale: f32) -> Result<(u32, u32), PdfError> {
    let w = (f64::from(page_box.width()) * f64::from(scale)).ceil().max(1.0);
    let h = (f64::from(page_box.height()) * f64::from(scale)).ceil().max(1.0);
    if !(w.is_finite() && h.is_finite()) || w * h * 3.0 > MAX_RASTER_BYTES as f64 {
        return Err(PdfError::RasterTooLarge {
            width: w as u64,
            height: h as u64,
        });
    }
    Ok((w as u32, h as u32))
}

/// Render a page to a raster. `scale` must be finite and at least 1.
pub fn rasterize_page(
    doc: &Document,
    page_id: ObjectId,
    scale: f32,
) -> Result<PageRaster, PdfError> {
    if !scale.is_finite() || scale < 1.0 {
        return Err(PdfError::InvalidScale(scale));
    }

    let page_box = page_box(doc, page_id);
    let (width, height) = raster_size(&page_box, scale)?;
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    // Device space -> pixel space: shift to the box origin, flip y, scale
    let to_pixels: Matrix = [
        scale,
        0.0,
        0.0,
        -scale,
        -page_box.x0 * scale,
        page_box.y1 * scale,
    ];

    let mut painter = Painter {
        doc,
        image: RgbImage::from_pixel(width, height, Rgb::WHITE.into()),
        to_pixels,
    };
    painter.paint(
        &content,
        page_resources(doc, page_id),
        GraphicsState::new(IDENTITY),
        0,
    );

    Ok(PageRaster::from_image(painter.image, scale))
}

struct Painter<'a> {
    doc: &'a Document,
    image: RgbImage,
    to_pixels: Matrix,
}

impl<'a> Painter<'a> {
    fn paint(
        &mut self,
        content: &Content,
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let mut gs = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        // Subpaths in device space
        let mut path: Vec<Vec<(f32, f32)>> = Vec::new();

        for op in &content.operations {
            let operands = op.operands.as_slice();
            if gs.apply_fill_operator(doc, resources, &op.operator, operands) {
                continue;
            }
            let nums: Vec<f32> = operands.iter().filter_map(get_number).collect();
            match op.operator.as_str() {
                "q" => stack.push(gs),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from_operands(operands) {
                        gs.concat(&m);
                    }
                }
                "m" => {
                    if let [x, y] = nums[..] {
                        path.push(vec![transform_point(&gs.ctm, x, y)]);
                    }
                }
                "l" => {
                    if let ([x, y], Some(sub)) = (&nums[..], path.last_mut()) {
                        sub.push(transform_point(&gs.ctm, *x, *y));
                    }
                }
                "c" | "v" | "y" => {
                    let Some(sub) = path.last_mut() else {
                        continue;
                    };
                    let Some(&start) = sub.last() else {
                        continue;
                    };
                    let controls = match (op.operator.as_str(), &nums[..]) {
                        ("c", [x1, y1, x2, y2, x3, y3]) => {
                            Some(((*x1, *y1), (*x2, *y2), (*x3, *y3)))
                        }
                        ("v", [x2, y2, x3, y3]) => {
                            let start_user = invert_matrix(&gs.ctm)
                                .map(|inv| transform_point(&inv, start.0, start.1))
                                .unwrap_or(start);
                            Some((start_user, (*x2, *y2), (*x3, *y3)))
                        }
                        ("y", [x1, y1, x3, y3]) => Some(((*x1, *y1), (*x3, *y3), (*x3, *y3))),
                        _ => None,
                    };
                    if let Some((p1, p2, p3)) = controls {
                        let p1 = transform_point(&gs.ctm, p1.0, p1.1);
                        let p2 = transform_point(&gs.ctm, p2.0, p2.1);
                        let p3 = transform_point(&gs.ctm, p3.0, p3.1);
                        flatten_cubic(sub, start, p1, p2, p3);
                    }
                }
                "re" => {
                    if let [x, y, w, h] = nums[..] {
                        path.push(
                            [(x, y), (x + w, y), (x + w, y + h), (x, y + h)]
                                .iter()
                                .map(|&(px, py)| transform_point(&gs.ctm, px, py))
                                .collect(),
                        );
                    }
                }
                // Subpaths are closed implicitly when filled
                "h" => {}
                "f" | "F" | "B" | "b" => {
                    self.fill_path(&path, gs.fill, false);
                    path.clear();
                }
                "f*" | "B*" | "b*" => {
                    self.fill_path(&path, gs.fill, true);
                    path.clear();
                }
                "S" | "s" | "n" => path.clear(),
                "Do" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.draw_xobject(resources, name, &gs, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn draw_xobject(
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
            Ok(b"Image") => match decode_image(doc, stream) {
                Some(img) => self.draw_image(&img, &gs.ctm),
                None => debug!("skipping undecodable image {}", String::from_utf8_lossy(name)),
            },
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
                self.paint(&content, form_resources, inner, depth + 1);
            }
            _ => {}
        }
    }

    /// Scanline fill of device-space subpaths, sampling pixel centers
    fn fill_path(&mut self, subpaths: &[Vec<(f32, f32)>], color: Rgb, even_odd: bool) {
        let polygons: Vec<Vec<(f32, f32)>> = subpaths
            .iter()
            .filter(|sub| sub.len() >= 3)
            .map(|sub| {
                sub.iter()
                    .map(|&(x, y)| transform_point(&self.to_pixels, x, y))
                    .collect()
            })
            .collect();
        if polygons.is_empty() {
            return;
        }

        let (width, height) = self.image.dimensions();
        let (min_y, max_y) = polygons
            .iter()
            .flatten()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, y)| {
                (lo.min(y), hi.max(y))
            });
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }
        let row_start = (min_y - 0.5).ceil().max(0.0) as u32;
        let row_end = ((max_y - 0.5).ceil().max(0.0) as u32).min(height);
        let pixel: image::Rgb<u8> = color.into();

        let mut crossings: Vec<(f32, i32)> = Vec::new();
        for row in row_start..row_end {
            let yc = row as f32 + 0.5;
            crossings.clear();
            for poly in &polygons {
                for i in 0..poly.len() {
                    let (x0, y0) = poly[i];
                    let (x1, y1) = poly[(i + 1) % poly.len()];
                    let dir = if y0 <= yc && y1 > yc {
                        1
                    } else if y1 <= yc && y0 > yc {
                        -1
                    } else {
                        continue;
                    };
                    let x = x0 + (yc - y0) * (x1 - x0) / (y1 - y0);
                    crossings.push((x, dir));
                }
            }
            crossings.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                let inside = if even_odd {
                    winding % 2 != 0
                } else {
                    winding != 0
                };
                if !inside {
                    continue;
                }
                // Pixels whose centers lie in [xa, xb)
                let first = (pair[0].0 - 0.5).ceil().max(0.0) as u32;
                let last = ((pair[1].0 - 0.5).ceil().max(0.0) as u32).min(width);
                for col in first..last {
                    self.image.put_pixel(col, row, pixel);
                }
            }
        }
    }

    /// Map an image through the CTM (unit square) onto the canvas
    fn draw_image(&mut self, img: &RgbImage, ctm: &Matrix) {
        let to_canvas = multiply_matrices(ctm, &self.to_pixels);
        let Some(to_unit) = invert_matrix(&to_canvas) else {
            return;
        };

        let corners: Vec<(f32, f32)> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .iter()
            .map(|&(u, v)| transform_point(&to_canvas, u, v))
            .collect();
        let (width, height) = self.image.dimensions();
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
        if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
            return;
        }

        let (iw, ih) = (img.width() as f32, img.height() as f32);
        let x_range = (min_x.floor().max(0.0) as u32)..(max_x.ceil().max(0.0) as u32).min(width);
        let y_range = (min_y.floor().max(0.0) as u32)..(max_y.ceil().max(0.0) as u32).min(height);

        for py in y_range {
            for px in x_range.clone() {
                let (u, v) = transform_point(&to_unit, px as f32 + 0.5, py as f32 + 0.5);
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                // Image row 0 is the top of the unit square (v = 1)
                let col = ((u * iw) as u32).min(img.width() - 1);
                let row = (((1.0 - v) * ih) as u32).min(img.height() - 1);
                self.image.put_pixel(px, py, *img.get_pixel(col, row));
            }
        }
    }
}

fn flatten_cubic(
    out: &mut Vec<(f32, f32)>,
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
) {
    for i in 1..=CURVE_SEGMENTS {
        let t = i as f32 / CURVE_SEGMENTS as f32;
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        out.push((
            a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
            a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
        ));
    }
}

/// Decode an image XObject into RGB pixels.
///
/// Handles JPEG (DCTDecode) and 8-bit raw samples in gray, RGB or CMYK
/// (including ICCBased with 1, 3 or 4 components). Masks, indexed color
/// and other filters yield `None`.
fn decode_image(doc: &Document, stream: &Stream) -> Option<RgbImage> {
    let dict = &stream.dict;
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return None;
    }

    let filter = last_filter_name(doc, dict);
    if filter.as_deref() == Some("DCTDecode") {
        return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
            .ok()
            .map(|img| img.to_rgb8());
    }
    if matches!(
        filter.as_deref(),
        Some("JPXDecode") | Some("CCITTFaxDecode") | Some("JBIG2Decode")
    ) {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 || width == 0 || height == 0 {
        return None;
    }

    let space = dict
        .get(b"ColorSpace")
        .map(|o| ColorSpaceKind::from_object(doc, o))
        .unwrap_or(ColorSpaceKind::DeviceGray);
    let channels = match space {
        ColorSpaceKind::DeviceGray => 1,
        ColorSpaceKind::DeviceRgb => 3,
        ColorSpaceKind::DeviceCmyk => 4,
        ColorSpaceKind::Unknown => return None,
    };

    let data = stream_bytes(stream);
    let expected = width as usize * height as usize * channels;
    if data.len() < expected {
        return None;
    }

    let rgb: Vec<u8> = match channels {
        1 => data[..expected].iter().flat_map(|&g| [g, g, g]).collect(),
        3 => data[..expected].to_vec(),
        _ => data[..expected]
            .chunks_exact(4)
            .flat_map(|p| {
                let k = p[3] as u16;
                [
                    255u16.saturating_sub((p[0] as u16 + k).min(255)) as u8,
                    255u16.saturating_sub((p[1] as u16 + k).min(255)) as u8,
                    255u16.saturating_sub((p[2] as u16 + k).min(255)) as u8,
                ]
            })
            .collect(),
    };
    RgbImage::from_raw(width, height, rgb)
}

/// Name of the last filter in the chain, which determines the sample format
fn last_filter_name(doc: &Document, dict: &Dictionary) -> Option<String> {
    let filter = resolve(doc, dict.get(b"Filter").ok()?);
    let name = match filter {
        Object::Name(n) => n.as_slice(),
        Object::Array(items) => resolve(doc, items.last()?).as_name().ok()?,
        _ => return None,
    };
    Some(String::from_utf8_lossy(name).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn page(content: &[u8], resources: Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(100),
                Object::Integer(50),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        });
        (doc, page_id)
    }

    #[test]
    fn test_blank_page_is_white() {
        let (doc, page_id) = page(b"", dictionary! {});
        let raster = rasterize_page(&doc, page_id, 1.0).unwrap();
        assert_eq!((raster.width(), raster.height()), (100, 50));
        assert_eq!(raster.pixel(0, 0), Rgb::WHITE);
        assert_eq!(raster.pixel(99, 49), Rgb::WHITE);
    }

    #[test]
    fn test_rect_fill_top_left_origin() {
        // Bottom-left 10x10 square in PDF space is the bottom-left in pixels too
        let (doc, page_id) = page(b"0 0 0 rg 0 0 10 10 re f", dictionary! {});
        let raster = rasterize_page(&doc, page_id, 1.0).unwrap();
        assert_eq!(raster.pixel(0, 49), Rgb::BLACK);
        assert_eq!(raster.pixel(9, 40), Rgb::BLACK);
        assert_eq!(raster.pixel(10, 40), Rgb::WHITE);
        assert_eq!(raster.pixel(0, 39), Rgb::WHITE);
    }

    #[test]
    fn test_scale_doubles_dimensions_and_shapes() {
        let (doc, page_id) = page(b"1 0 0 rg 0 0 10 10 re f", dictionary! {});
        let raster = rasterize_page(&doc, page_id, 2.0).unwrap();
        assert_eq!((raster.width(), raster.height()), (200, 100));
        assert_eq!(raster.scale(), 2.0);
        assert_eq!(raster.pixel(19, 80), Rgb::RED);
        assert_eq!(raster.pixel(20, 80), Rgb::WHITE);
    }

    #[test]
    fn test_same_scale_same_dimensions() {
        let (doc, page_id) = page(b"0 g 5 5 20 20 re f", dictionary! {});
        let a = rasterize_page(&doc, page_id, 1.5).unwrap();
        let b = rasterize_page(&doc, page_id, 1.5).unwrap();
        assert_eq!((a.width(), a.height()), (b.width(), b.height()));
        assert_eq!(a.image(), b.image());
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let (doc, page_id) = page(b"", dictionary! {});
        assert!(matches!(
            rasterize_page(&doc, page_id, 0.5),
            Err(PdfError::InvalidScale(_))
        ));
        assert!(matches!(
            rasterize_page(&doc, page_id, f32::NAN),
            Err(PdfError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_even_odd_leaves_hole() {
        let (doc, page_id) = page(
            b"0 g 0 0 40 40 re 10 10 20 20 re f* 1 0 0 rg 50 0 40 40 re 60 10 20 20 re f",
            dictionary! {},
        );
        let raster = rasterize_page(&doc, page_id, 1.0).unwrap();
        assert_eq!(raster.pixel(5, 45), Rgb::BLACK);
        assert_eq!(raster.pixel(20, 30), Rgb::WHITE);
        // Nonzero with same winding fills the inner square
        assert_eq!(raster.pixel(70, 30), Rgb::RED);
    }

    #[test]
    fn test_stroke_and_no_paint_clear_path() {
        let (doc, page_id) = page(b"0 g 0 0 10 10 re S f 0 0 10 10 re n f", dictionary! {});
        let raster = rasterize_page(&doc, page_id, 1.0).unwrap();
        assert_eq!(raster.pixel(5, 45), Rgb::WHITE);
    }

    #[test]
    fn test_cm_transforms_paths() {
        let (doc, page_id) = page(b"q 1 0 0 1 50 20 cm 0 g 0 0 10 10 re f Q", dictionary! {});
        let raster = rasterize_page(&doc, page_id, 1.0).unwrap();
        assert_eq!(raster.pixel(55, 25), Rgb::BLACK);
        assert_eq!(raster.pixel(5, 45), Rgb::WHITE);
    }

    #[test]
    fn test_raw_gray_image_drawn() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(2),
                "Height" => Object::Integer(1),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => Object::Integer(8),
            },
            vec![0, 255],
        ));
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"q 20 0 0 10 0 0 cm /Im1 Do Q".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(100),
                Object::Integer(50),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => Object::Reference(image_id) },
            },
        });

        let raster = rasterize_page(&doc, page_id, 1.0).unwrap();
        // Left half black, right half white, bottom 10 rows of the page
        assert_eq!(raster.pixel(5, 45), Rgb::BLACK);
        assert_eq!(raster.pixel(15, 45), Rgb::WHITE);
        assert_eq!(raster.pixel(5, 35), Rgb::WHITE);
    }

    #[test]
    fn test_oversized_page_box_rejected() {
        let mut doc = Document::with_version("1.5");
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 g 0 0 10 10 re f".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(10_000_000_000),
                Object::Integer(10_000_000_000),
            ],
            "Contents" => Object::Reference(content_id),
        });
        assert!(matches!(
            rasterize_page(&doc, page_id, 1.0),
            Err(PdfError::RasterTooLarge { .. })
        ));
    }

    #[test]
    fn test_raster_size_cap() {
        let letter = PageBox {
            x0: 0.0,
            y0: 0.0,
            x1: 612.0,
            y1: 792.0,
        };
        assert_eq!(raster_size(&letter, 1.0).unwrap(), (612, 792));
        assert_eq!(raster_size(&letter, 2.0).unwrap(), (1224, 1584));
        // 100000 x 100000 x 3 bytes is far past the cap
        let huge = PageBox {
            x0: 0.0,
            y0: 0.0,
            x1: 100_000.0,
            y1: 100_000.0,
        };
        assert!(matches!(
            raster_size(&huge, 1.0),
            Err(PdfError::RasterTooLarge {
                width: 100_000,
                height: 100_000
            })
        ));
    }

    #[test]
    fn test_png_encoding() {
        let raster = PageRaster::filled(4, 3, Rgb::RED, 1.0);
        let png = raster.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(2, 2), &image::Rgb([255, 0, 0]));
    }
}
