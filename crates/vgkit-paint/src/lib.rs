//! # vgkit Paint
//!
//! Fill and stroke paint resolution for the vgkit SVG engine.
//!
//! ## Features
//!
//! - **Color grammar**: named colors, hex forms, rgb() with percentages
//! - **ICC color**: `icc-color(profile, values...)` alongside sRGB
//! - **Paint classification**: the ten paint types of the SVG `fill` /
//!   `stroke` grammar, with `url(...)` prefixes and fallbacks
//! - **Stroke enumerations**: line cap, line join, fill rule

use thiserror::Error;

pub mod color;
pub mod paint;

pub use color::{parse_color, Color, IccColor};
pub use paint::{PaintType, SvgPaint};

/// Errors that can occur in paint operations.
#[derive(Error, Debug)]
pub enum PaintError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<PaintError> for vgkit_common::VgKitError {
    fn from(err: PaintError) -> Self {
        vgkit_common::VgKitError::paint(err.to_string())
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn parse(text: &str) -> Result<Self, PaintError> {
        match text.trim() {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            other => Err(PaintError::InvalidValue(format!("stroke-linecap '{other}'"))),
        }
    }
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn parse(text: &str) -> Result<Self, PaintError> {
        match text.trim() {
            "miter" => Ok(LineJoin::Miter),
            "round" => Ok(LineJoin::Round),
            "bevel" => Ok(LineJoin::Bevel),
            other => Err(PaintError::InvalidValue(format!(
                "stroke-linejoin '{other}'"
            ))),
        }
    }
}

/// Fill rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn parse(text: &str) -> Result<Self, PaintError> {
        match text.trim() {
            "nonzero" => Ok(FillRule::NonZero),
            "evenodd" => Ok(FillRule::EvenOdd),
            other => Err(PaintError::InvalidValue(format!("fill-rule '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_enumerations() {
        assert_eq!(LineCap::parse("round").unwrap(), LineCap::Round);
        assert_eq!(LineJoin::parse("bevel").unwrap(), LineJoin::Bevel);
        assert_eq!(FillRule::parse("evenodd").unwrap(), FillRule::EvenOdd);
        assert!(LineCap::parse("pointy").is_err());
    }

    #[test]
    fn test_unified_error_category() {
        let err: vgkit_common::VgKitError = PaintError::InvalidValue("x".into()).into();
        assert_eq!(err.category(), "paint");
    }
}
