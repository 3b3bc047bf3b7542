//! Affine transforms and the `transform` attribute grammar.

use crate::{GeometryError, Point};
use smallvec::SmallVec;
use std::f64::consts::PI;

/// A 2D affine transform matrix.
///
/// Matrix elements [a, b, c, d, e, f] represent:
/// ```text
/// [a c e]
/// [b d f]
/// [0 0 1]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Append a translation.
    pub fn translate(self, tx: f64, ty: f64) -> Self {
        self.multiply(&Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        })
    }

    /// Append a scale.
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        self.multiply(&Matrix {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Append a rotation (degrees).
    pub fn rotate(self, degrees: f64) -> Self {
        let radians = degrees * PI / 180.0;
        let cos = radians.cos();
        let sin = radians.sin();
        self.multiply(&Matrix {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Append a skew along X (degrees).
    pub fn skew_x(self, degrees: f64) -> Self {
        self.multiply(&Matrix {
            a: 1.0,
            b: 0.0,
            c: (degrees * PI / 180.0).tan(),
            d: 1.0,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Append a skew along Y (degrees).
    pub fn skew_y(self, degrees: f64) -> Self {
        self.multiply(&Matrix {
            a: 1.0,
            b: (degrees * PI / 180.0).tan(),
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Multiply two transforms (self applied first in user space).
    pub fn multiply(&self, other: &Matrix) -> Self {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Transform a point value.
    pub fn apply_point(&self, p: Point) -> Point {
        let (x, y) = self.apply(p.x, p.y);
        Point::new(x, y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or None for a singular matrix.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Matrix {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            e: (self.c * self.f - self.d * self.e) * inv_det,
            f: (self.b * self.e - self.a * self.f) * inv_det,
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// The function kind of one entry in a transform list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Matrix,
    Translate,
    Scale,
    Rotate,
    SkewX,
    SkewY,
}

/// One parsed entry of a `transform` attribute.
///
/// Keeps the source function kind and angle so the value can round-trip
/// through the DOM; `matrix` is the resolved form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub kind: TransformKind,
    pub matrix: Matrix,
    /// Rotation or skew angle in degrees; 0 for other kinds.
    pub angle: f64,
}

impl Transform {
    pub fn from_matrix(matrix: Matrix) -> Self {
        Self {
            kind: TransformKind::Matrix,
            matrix,
            angle: 0.0,
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            kind: TransformKind::Translate,
            matrix: Matrix::identity().translate(tx, ty),
            angle: 0.0,
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            kind: TransformKind::Scale,
            matrix: Matrix::identity().scale(sx, sy),
            angle: 0.0,
        }
    }

    pub fn rotate(degrees: f64, cx: f64, cy: f64) -> Self {
        Self {
            kind: TransformKind::Rotate,
            matrix: Matrix::identity()
                .translate(cx, cy)
                .rotate(degrees)
                .translate(-cx, -cy),
            angle: degrees,
        }
    }

    pub fn skew_x(degrees: f64) -> Self {
        Self {
            kind: TransformKind::SkewX,
            matrix: Matrix::identity().skew_x(degrees),
            angle: degrees,
        }
    }

    pub fn skew_y(degrees: f64) -> Self {
        Self {
            kind: TransformKind::SkewY,
            matrix: Matrix::identity().skew_y(degrees),
            angle: degrees,
        }
    }
}

/// An ordered list of transforms, as written in a `transform` attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformList {
    items: SmallVec<[Transform; 2]>,
}

impl TransformList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, index: usize) -> Result<&Transform, GeometryError> {
        self.items.get(index).ok_or(GeometryError::IndexSize {
            index,
            len: self.items.len(),
        })
    }

    pub fn append_item(&mut self, transform: Transform) {
        self.items.push(transform);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.items.iter()
    }

    /// Collapse the list into a single matrix, left-to-right.
    pub fn consolidate(&self) -> Matrix {
        self.items
            .iter()
            .fold(Matrix::identity(), |acc, t| acc.multiply(&t.matrix))
    }

    /// Parse a `transform` attribute value.
    ///
    /// Functions are separated by whitespace and/or commas; arguments by
    /// whitespace/commas inside parentheses. Malformed text is a syntax
    /// error carrying the byte offset of the offending function.
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        let mut list = TransformList::new();
        let bytes = text.as_bytes();
        let mut pos = 0usize;

        loop {
            while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
                pos += 1;
            }
            if pos >= bytes.len() {
                break;
            }

            let name_start = pos;
            while pos < bytes.len() && (bytes[pos].is_ascii_alphabetic()) {
                pos += 1;
            }
            let name = &text[name_start..pos];
            if name.is_empty() {
                return Err(GeometryError::syntax(pos, "expected transform function"));
            }

            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= bytes.len() || bytes[pos] != b'(' {
                return Err(GeometryError::syntax(pos, "expected '('"));
            }
            pos += 1;

            let args_start = pos;
            while pos < bytes.len() && bytes[pos] != b')' {
                pos += 1;
            }
            if pos >= bytes.len() {
                return Err(GeometryError::syntax(args_start, "unterminated argument list"));
            }
            let args_text = &text[args_start..pos];
            pos += 1;

            let mut args = Vec::new();
            for token in args_text.split(|c: char| c.is_whitespace() || c == ',') {
                if token.is_empty() {
                    continue;
                }
                let value: f64 = token.parse().map_err(|_| {
                    GeometryError::syntax(args_start, format!("invalid number '{token}'"))
                })?;
                args.push(value);
            }

            let transform = match (name, args.len()) {
                ("translate", 1) => Transform::translate(args[0], 0.0),
                ("translate", 2) => Transform::translate(args[0], args[1]),
                ("scale", 1) => Transform::scale(args[0], args[0]),
                ("scale", 2) => Transform::scale(args[0], args[1]),
                ("rotate", 1) => Transform::rotate(args[0], 0.0, 0.0),
                ("rotate", 3) => Transform::rotate(args[0], args[1], args[2]),
                ("skewX", 1) => Transform::skew_x(args[0]),
                ("skewY", 1) => Transform::skew_y(args[0]),
                ("matrix", 6) => Transform::from_matrix(Matrix::new(
                    args[0], args[1], args[2], args[3], args[4], args[5],
                )),
                ("translate" | "scale" | "rotate" | "skewX" | "skewY" | "matrix", n) => {
                    return Err(GeometryError::syntax(
                        name_start,
                        format!("wrong argument count {n} for '{name}'"),
                    ));
                }
                _ => {
                    return Err(GeometryError::syntax(
                        name_start,
                        format!("unknown transform function '{name}'"),
                    ));
                }
            };

            list.append_item(transform);
        }

        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_apply() {
        let m = Matrix::identity();
        assert_eq!(m.apply(10.0, 20.0), (10.0, 20.0));
    }

    #[test]
    fn test_translate_scale() {
        let m = Matrix::identity().translate(5.0, 10.0);
        assert_eq!(m.apply(10.0, 20.0), (15.0, 30.0));

        let m = Matrix::identity().scale(2.0, 3.0);
        assert_eq!(m.apply(10.0, 20.0), (20.0, 60.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let m = Matrix::identity().rotate(90.0);
        let (x, y) = m.apply(1.0, 0.0);
        assert!(x.abs() < 1e-12);
        assert!((y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse() {
        let m = Matrix::identity().translate(3.0, 4.0).scale(2.0, 2.0);
        let inv = m.inverse().unwrap();
        let (x, y) = inv.apply(m.apply(7.0, 9.0).0, m.apply(7.0, 9.0).1);
        assert!((x - 7.0).abs() < 1e-12);
        assert!((y - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Matrix::identity().scale(0.0, 1.0);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_parse_list() {
        let list = TransformList::parse("translate(10, 20) scale(2)").unwrap();
        assert_eq!(list.number_of_items(), 2);
        let m = list.consolidate();
        assert_eq!(m.apply(1.0, 1.0), (12.0, 22.0));
    }

    #[test]
    fn test_parse_rotate_about_center() {
        let list = TransformList::parse("rotate(180 5 5)").unwrap();
        let (x, y) = list.consolidate().apply(0.0, 0.0);
        assert!((x - 10.0).abs() < 1e-12);
        assert!((y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_matrix_function() {
        let list = TransformList::parse("matrix(1 0 0 1 7 8)").unwrap();
        assert_eq!(list.get_item(0).unwrap().kind, TransformKind::Matrix);
        assert_eq!(list.consolidate().apply(0.0, 0.0), (7.0, 8.0));
    }

    #[test]
    fn test_parse_rejects_unknown_function() {
        assert!(matches!(
            TransformList::parse("spin(45)"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_arity() {
        assert!(matches!(
            TransformList::parse("rotate(1 2)"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_parse_empty_is_empty_list() {
        let list = TransformList::parse("   ").unwrap();
        assert!(list.is_empty());
        assert_eq!(list.consolidate(), Matrix::identity());
    }

    #[test]
    fn test_out_of_range_item() {
        let list = TransformList::new();
        assert!(matches!(
            list.get_item(0),
            Err(GeometryError::IndexSize { .. })
        ));
    }
}
