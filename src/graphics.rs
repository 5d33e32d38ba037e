//! Graphics state shared by span extraction and rasterization
//!
//! Matrices use the PDF row-vector convention. Format `[a, b, c, d, e, f]`:
//! | a  b  0 |
//! | c  d  0 |
//! | e  f  1 |

use crate::color::Rgb;
use crate::document::{get_number, resolve};
use lopdf::{Dictionary, Document, Object};

pub type Matrix = [f32; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Multiply two 2D transformation matrices (`m1` applied first)
pub fn multiply_matrices(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

pub fn transform_point(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Inverse of an affine matrix, `None` when singular
pub fn invert_matrix(m: &Matrix) -> Option<Matrix> {
    let det = m[0] * m[3] - m[1] * m[2];
    if det.abs() < f32::EPSILON || !det.is_finite() {
        return None;
    }
    let a = m[3] / det;
    let b = -m[1] / det;
    let c = -m[2] / det;
    let d = m[0] / det;
    Some([a, b, c, d, -(m[4] * a + m[5] * c), -(m[4] * b + m[5] * d)])
}

pub fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Read six numeric operands as a matrix (for `cm`, `Tm` and `/Matrix`)
pub fn matrix_from_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand)?;
    }
    Some(m)
}

/// Non-stroking color space families we can convert to RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpaceKind {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    Unknown,
}

impl ColorSpaceKind {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Some(Self::DeviceGray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(Self::DeviceRgb),
            b"DeviceCMYK" | b"CMYK" => Some(Self::DeviceCmyk),
            b"Pattern" | b"Indexed" | b"Separation" | b"DeviceN" | b"Lab" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn from_components(n: i64) -> Self {
        match n {
            1 => Self::DeviceGray,
            3 => Self::DeviceRgb,
            4 => Self::DeviceCmyk,
            _ => Self::Unknown,
        }
    }

    /// Resolve a color space object: a name, or an array like `[/ICCBased 12 0 R]`
    pub fn from_object(doc: &Document, obj: &Object) -> Self {
        match resolve(doc, obj) {
            Object::Name(name) => Self::from_name(name).unwrap_or(Self::Unknown),
            Object::Array(items) => {
                let Some(family) = items.first().and_then(|o| resolve(doc, o).as_name().ok())
                else {
                    return Self::Unknown;
                };
                if family == b"ICCBased" {
                    items
                        .get(1)
                        .and_then(|o| resolve(doc, o).as_stream().ok())
                        .and_then(|s| s.dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok())
                        .map(Self::from_components)
                        .unwrap_or(Self::Unknown)
                } else {
                    Self::from_name(family).unwrap_or(Self::Unknown)
                }
            }
            _ => Self::Unknown,
        }
    }

    /// Resolve a `cs` operand against the `/ColorSpace` resource dictionary
    pub fn resolve_named(doc: &Document, resources: Option<&Dictionary>, name: &[u8]) -> Self {
        if let Some(kind) = Self::from_name(name) {
            return kind;
        }
        resources
            .and_then(|r| r.get(b"ColorSpace").ok())
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .and_then(|spaces| spaces.get(name).ok())
            .map(|space| Self::from_object(doc, space))
            .unwrap_or(Self::Unknown)
    }
}

/// The part of the PDF graphics state both walkers care about
#[derive(Debug, Clone, Copy)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub fill: Rgb,
    pub fill_space: ColorSpaceKind,
}

impl GraphicsState {
    pub fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill: Rgb::BLACK,
            fill_space: ColorSpaceKind::DeviceGray,
        }
    }

    /// Apply `cm`
    pub fn concat(&mut self, m: &Matrix) {
        self.ctm = multiply_matrices(m, &self.ctm);
    }

    /// Apply a non-stroking color operator. Returns false for operators this
    /// method does not handle, so callers can chain it in a `match`.
    pub fn apply_fill_operator(
        &mut self,
        doc: &Document,
        resources: Option<&Dictionary>,
        operator: &str,
        operands: &[Object],
    ) -> bool {
        match operator {
            "cs" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.fill_space = ColorSpaceKind::resolve_named(doc, resources, name);
                    // Initial color of every device space is black
                    self.fill = Rgb::BLACK;
                }
            }
            "g" => {
                self.fill_space = ColorSpaceKind::DeviceGray;
                if let Some(color) = parse_fill(ColorSpaceKind::DeviceGray, operands) {
                    self.fill = color;
                }
            }
            "rg" => {
                self.fill_space = ColorSpaceKind::DeviceRgb;
                if let Some(color) = parse_fill(ColorSpaceKind::DeviceRgb, operands) {
                    self.fill = color;
                }
            }
            "k" => {
                self.fill_space = ColorSpaceKind::DeviceCmyk;
                if let Some(color) = parse_fill(ColorSpaceKind::DeviceCmyk, operands) {
                    self.fill = color;
                }
            }
            "sc" | "scn" => {
                if let Some(color) = parse_fill(self.fill_space, operands) {
                    self.fill = color;
                }
            }
            _ => return false,
        }
        true
    }
}

fn parse_fill(space: ColorSpaceKind, operands: &[Object]) -> Option<Rgb> {
    let nums: Vec<f32> = operands.iter().filter_map(get_number).collect();
    match (space, nums.as_slice()) {
        (ColorSpaceKind::DeviceGray, [g]) => Some(Rgb::from_unit_gray(*g)),
        (ColorSpaceKind::DeviceRgb, [r, g, b]) => Some(Rgb::from_unit_rgb(*r, *g, *b)),
        (ColorSpaceKind::DeviceCmyk, [c, m, y, k]) => Some(Rgb::from_unit_cmyk(*c, *m, *y, *k)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn test_multiply_applies_first_matrix_first() {
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let shift = translation(10.0, 5.0);
        let m = multiply_matrices(&scale, &shift);
        assert!(approx(transform_point(&m, 1.0, 1.0), (12.0, 7.0)));
    }

    #[test]
    fn test_invert_roundtrip() {
        let m = [2.0, 0.5, -1.0, 3.0, 7.0, -4.0];
        let inv = invert_matrix(&m).unwrap();
        let p = transform_point(&m, 3.0, 9.0);
        assert!(approx(transform_point(&inv, p.0, p.1), (3.0, 9.0)));
    }

    #[test]
    fn test_invert_singular() {
        assert!(invert_matrix(&[0.0, 0.0, 0.0, 0.0, 1.0, 1.0]).is_none());
    }

    fn ints(values: &[i64]) -> Vec<Object> {
        values.iter().map(|&v| Object::Integer(v)).collect()
    }

    #[test]
    fn test_fill_operators() {
        let doc = Document::with_version("1.5");
        let mut gs = GraphicsState::new(IDENTITY);
        assert!(gs.apply_fill_operator(&doc, None, "rg", &ints(&[1, 0, 0])));
        assert_eq!(gs.fill, Rgb::RED);
        assert!(gs.apply_fill_operator(&doc, None, "g", &[Object::Real(1.0)]));
        assert_eq!(gs.fill, Rgb::WHITE);
        assert!(gs.apply_fill_operator(&doc, None, "k", &ints(&[0, 0, 0, 1])));
        assert_eq!(gs.fill, Rgb::BLACK);
        assert!(!gs.apply_fill_operator(&doc, None, "re", &[]));
    }

    #[test]
    fn test_sc_uses_current_space() {
        let doc = Document::with_version("1.5");
        let mut gs = GraphicsState::new(IDENTITY);
        gs.apply_fill_operator(&doc, None, "cs", &[Object::Name(b"DeviceRGB".to_vec())]);
        gs.apply_fill_operator(&doc, None, "sc", &ints(&[0, 1, 0]));
        assert_eq!(gs.fill, Rgb::new(0, 255, 0));
        // Wrong arity for the space leaves the color unchanged
        gs.apply_fill_operator(&doc, None, "sc", &[Object::Real(0.5)]);
        assert_eq!(gs.fill, Rgb::new(0, 255, 0));
    }
}
