//! Color normalization and similarity
//!
//! Colors reach this crate either as a packed 24-bit integer (red in the
//! highest byte, the form the page layout model stores) or as a separated
//! triple. Everything downstream works on the canonical [`Rgb`].

use serde::Serialize;

/// Default per-channel tolerance for [`similar`]
pub const DEFAULT_TOLERANCE: u8 = 30;

/// Canonical 3-channel color, each channel in 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A color value as it appears at the boundary, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorValue {
    /// 24-bit RGB packed into an integer, `0xRRGGBB`
    Packed(u32),
    /// Already separated channels; out-of-range values are clamped
    Triple([i32; 3]),
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalize any color representation into canonical form
    pub fn normalize(value: impl Into<ColorValue>) -> Self {
        match value.into() {
            ColorValue::Packed(v) => Self {
                r: ((v >> 16) & 0xFF) as u8,
                g: ((v >> 8) & 0xFF) as u8,
                b: (v & 0xFF) as u8,
            },
            ColorValue::Triple([r, g, b]) => Self {
                r: r.clamp(0, 255) as u8,
                g: g.clamp(0, 255) as u8,
                b: b.clamp(0, 255) as u8,
            },
        }
    }

    /// Pack into `0xRRGGBB`
    pub fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Build from PDF unit-interval components (DeviceRGB)
    pub fn from_unit_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(unit_to_byte(r), unit_to_byte(g), unit_to_byte(b))
    }

    /// Build from a PDF unit-interval gray level (DeviceGray)
    pub fn from_unit_gray(g: f32) -> Self {
        let v = unit_to_byte(g);
        Self::new(v, v, v)
    }

    /// Naive CMYK -> RGB, matching what most viewers do without a profile
    pub fn from_unit_cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        let c = clamp_unit(c);
        let m = clamp_unit(m);
        let y = clamp_unit(y);
        let k = clamp_unit(k);
        Self::from_unit_rgb(
            1.0 - (c + k).min(1.0),
            1.0 - (m + k).min(1.0),
            1.0 - (y + k).min(1.0),
        )
    }
}

impl From<u32> for ColorValue {
    fn from(v: u32) -> Self {
        ColorValue::Packed(v)
    }
}

impl From<[i32; 3]> for ColorValue {
    fn from(v: [i32; 3]) -> Self {
        ColorValue::Triple(v)
    }
}

impl From<(u8, u8, u8)> for ColorValue {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        ColorValue::Triple([r as i32, g as i32, b as i32])
    }
}

impl From<Rgb> for ColorValue {
    fn from(c: Rgb) -> Self {
        ColorValue::Triple([c.r as i32, c.g as i32, c.b as i32])
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(p: image::Rgb<u8>) -> Self {
        Rgb::new(p[0], p[1], p[2])
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

/// True iff every channel differs by at most `tolerance`.
///
/// This is a per-channel (Chebyshev) bound, not a Euclidean distance: two
/// near-gray colors that each drift by `tolerance` on all three channels
/// still match, which makes the check more permissive on gray backgrounds
/// than a distance threshold of the same value would be.
pub fn similar(a: Rgb, b: Rgb, tolerance: u8) -> bool {
    a.channels()
        .iter()
        .zip(b.channels().iter())
        .all(|(&x, &y)| x.abs_diff(y) <= tolerance)
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn unit_to_byte(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}
