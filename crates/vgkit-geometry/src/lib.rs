//! # vgkit Geometry
//!
//! Path-data and geometry core for the vgkit SVG engine.
//!
//! ## Features
//!
//! - **Path Segments**: typed variants of the 20 SVG path commands
//! - **Path Segment List**: mutable, indexable segment storage with derived
//!   absolute positions and tangent angles
//! - **Polynomial Engine**: Horner evaluation, Neville interpolation,
//!   Simpson/Romberg integration for Bezier arc lengths
//! - **Transforms**: affine matrices and the `transform` attribute grammar
//! - **Markers**: vertex positions and tangent angles for marker placement
//!
//! ## Architecture
//!
//! ```text
//! PathSegList (arena)
//!    ├── PathSeg (20 command kinds, mutable parameters)
//!    ├── resolved geometry (endpoints, tangents), generation-stamped
//!    └── MarkerHost (vertex positions + angles)
//!
//! Polynomial / SqrtPolynomial
//!    └── RealFunction (simpson, romberg)  →  arc length
//! ```

use thiserror::Error;

pub mod marker;
pub mod parser;
pub mod path;
pub mod polynomial;
pub mod segment;
pub mod transform;

pub use marker::{
    auto_angle, place_markers, resolve_marker_angle, Marker, MarkerHost, MarkerOrient,
    MarkerPosition, MarkerUnits,
};
pub use parser::{parse_path_data, parse_points};
pub use path::PathSegList;
pub use polynomial::{interpolate, Polynomial, RealFunction, SqrtPolynomial};
pub use segment::PathSeg;
pub use transform::{Matrix, Transform, TransformKind, TransformList};

/// Errors that can occur in geometry operations.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Index {index} out of range for list of {len} segments")]
    IndexSize { index: usize, len: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl GeometryError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}

impl From<GeometryError> for vgkit_common::VgKitError {
    fn from(err: GeometryError) -> Self {
        vgkit_common::VgKitError::geometry(err.to_string())
    }
}

/// A point in user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_index_error_display() {
        let err = GeometryError::IndexSize { index: 5, len: 2 };
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_unified_error_category() {
        let err: vgkit_common::VgKitError = GeometryError::InvalidValue("x".into()).into();
        assert_eq!(err.category(), "geometry");
    }
}
