//! The SVG paint value: classification of `fill` / `stroke` text into the
//! ten paint types, and the validated mutator surface.

use crate::color::{parse_color, Color, IccColor};
use crate::PaintError;
use tracing::trace;

/// Classification of a paint value.
///
/// The `Uri*` variants carry an `url(...)` reference plus the fallback
/// that follows it in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintType {
    Unknown,
    RgbColor,
    RgbColorIccColor,
    None,
    CurrentColor,
    Uri,
    UriNone,
    UriCurrentColor,
    UriRgbColor,
    UriRgbColorIccColor,
}

impl PaintType {
    /// Whether this type carries a URI reference.
    pub fn has_uri(&self) -> bool {
        matches!(
            self,
            PaintType::Uri
                | PaintType::UriNone
                | PaintType::UriCurrentColor
                | PaintType::UriRgbColor
                | PaintType::UriRgbColorIccColor
        )
    }

    /// Whether this type carries an RGB color value.
    pub fn has_rgb(&self) -> bool {
        matches!(
            self,
            PaintType::RgbColor
                | PaintType::RgbColorIccColor
                | PaintType::UriRgbColor
                | PaintType::UriRgbColorIccColor
        )
    }

    /// Whether this type carries an ICC color value.
    pub fn has_icc(&self) -> bool {
        matches!(
            self,
            PaintType::RgbColorIccColor | PaintType::UriRgbColorIccColor
        )
    }
}

/// A parsed paint value.
///
/// Component presence is kept consistent with the classified type: the
/// parse entry point classifies from what the text contains, and the
/// mutators reject contradictory combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPaint {
    paint_type: PaintType,
    uri: Option<String>,
    color: Option<Color>,
    icc_color: Option<IccColor>,
}

impl Default for SvgPaint {
    fn default() -> Self {
        Self {
            paint_type: PaintType::Unknown,
            uri: None,
            color: None,
            icc_color: None,
        }
    }
}

impl SvgPaint {
    /// Tokenize and classify a CSS paint value.
    ///
    /// Grammar, left to right: an optional `url(...)` prefix, then one of
    /// `none` / `currentColor` / a color with an optional `icc-color(...)`
    /// tail / nothing. Unclassifiable text yields `PaintType::Unknown`.
    pub fn parse(text: &str) -> Self {
        let mut rest = text.trim();
        let mut uri = None;

        if let Some(after) = rest.strip_prefix("url(") {
            match after.find(')') {
                Some(close) => {
                    let inner = after[..close].trim().trim_matches(|c| c == '"' || c == '\'');
                    uri = Some(inner.to_string());
                    rest = after[close + 1..].trim_start();
                }
                None => {
                    trace!(text, "unterminated url() in paint value");
                    return Self::default();
                }
            }
        }

        let has_uri = uri.is_some();

        if rest.is_empty() {
            return match uri {
                Some(uri) => Self {
                    paint_type: PaintType::Uri,
                    uri: Some(uri),
                    color: None,
                    icc_color: None,
                },
                None => Self::default(),
            };
        }

        if rest.eq_ignore_ascii_case("none") {
            return Self {
                paint_type: if has_uri {
                    PaintType::UriNone
                } else {
                    PaintType::None
                },
                uri,
                color: None,
                icc_color: None,
            };
        }

        if rest.eq_ignore_ascii_case("currentcolor") {
            return Self {
                paint_type: if has_uri {
                    PaintType::UriCurrentColor
                } else {
                    PaintType::CurrentColor
                },
                uri,
                color: None,
                icc_color: None,
            };
        }

        // A color, optionally followed by an icc-color specification.
        let (color_text, icc_text) = match rest.find("icc-color(") {
            Some(at) => (rest[..at].trim(), Some(&rest[at..])),
            None => (rest, None),
        };

        let color = match parse_color(color_text) {
            Ok(color) => color,
            Err(_) => {
                trace!(text, "unclassifiable paint value");
                return Self {
                    paint_type: PaintType::Unknown,
                    uri,
                    color: None,
                    icc_color: None,
                };
            }
        };

        let icc_color = icc_text.and_then(|t| IccColor::parse(t).ok());
        let has_icc = icc_color.is_some();

        let paint_type = match (has_uri, has_icc) {
            (false, false) => PaintType::RgbColor,
            (false, true) => PaintType::RgbColorIccColor,
            (true, false) => PaintType::UriRgbColor,
            (true, true) => PaintType::UriRgbColorIccColor,
        };

        Self {
            paint_type,
            uri,
            color: Some(color),
            icc_color,
        }
    }

    pub fn paint_type(&self) -> PaintType {
        self.paint_type
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn icc_color(&self) -> Option<&IccColor> {
        self.icc_color.as_ref()
    }

    /// Replace the whole paint value.
    ///
    /// The supplied components must be present or absent exactly as the
    /// target type requires; a contradictory combination (a URI for a
    /// non-URI type, a missing color for an RGB type, and so on) is an
    /// invalid-value error and leaves the paint unchanged.
    pub fn set_paint(
        &mut self,
        paint_type: PaintType,
        uri: Option<&str>,
        color: Option<Color>,
        icc_color: Option<IccColor>,
    ) -> Result<(), PaintError> {
        if paint_type.has_uri() != uri.is_some() {
            return Err(PaintError::InvalidValue(format!(
                "paint type {paint_type:?} and uri presence disagree"
            )));
        }
        if paint_type.has_rgb() != color.is_some() {
            return Err(PaintError::InvalidValue(format!(
                "paint type {paint_type:?} and color presence disagree"
            )));
        }
        if paint_type.has_icc() != icc_color.is_some() {
            return Err(PaintError::InvalidValue(format!(
                "paint type {paint_type:?} and icc-color presence disagree"
            )));
        }

        self.paint_type = paint_type;
        self.uri = uri.map(str::to_string);
        self.color = color;
        self.icc_color = icc_color;
        Ok(())
    }

    /// Switch to a plain URI paint.
    pub fn set_uri(&mut self, uri: &str) {
        self.paint_type = PaintType::Uri;
        self.uri = Some(uri.to_string());
        self.color = None;
        self.icc_color = None;
    }

    /// Serialize back to CSS paint text.
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        if let Some(uri) = &self.uri {
            out.push_str("url(");
            out.push_str(uri);
            out.push(')');
        }

        let tail = match self.paint_type {
            PaintType::None | PaintType::UriNone => Some("none".to_string()),
            PaintType::CurrentColor | PaintType::UriCurrentColor => {
                Some("currentColor".to_string())
            }
            PaintType::RgbColor
            | PaintType::RgbColorIccColor
            | PaintType::UriRgbColor
            | PaintType::UriRgbColorIccColor => {
                let mut text = self.color.unwrap_or_default().css_text();
                if let Some(icc) = &self.icc_color {
                    text.push(' ');
                    text.push_str(&icc.css_text());
                }
                Some(text)
            }
            PaintType::Uri | PaintType::Unknown => None,
        };

        if let Some(tail) = tail {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&tail);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_none() {
        let paint = SvgPaint::parse("none");
        assert_eq!(paint.paint_type(), PaintType::None);
        assert_eq!(paint.uri(), None);
        assert_eq!(paint.color(), None);
    }

    #[test]
    fn test_parse_current_color() {
        let paint = SvgPaint::parse("currentColor");
        assert_eq!(paint.paint_type(), PaintType::CurrentColor);
    }

    #[test]
    fn test_parse_color_keyword() {
        let paint = SvgPaint::parse("red");
        assert_eq!(paint.paint_type(), PaintType::RgbColor);
        assert_eq!(paint.color(), Some(Color::from_rgb(255, 0, 0)));
    }

    #[test]
    fn test_parse_uri_variants() {
        let paint = SvgPaint::parse("url(#g)");
        assert_eq!(paint.paint_type(), PaintType::Uri);
        assert_eq!(paint.uri(), Some("#g"));

        let paint = SvgPaint::parse("url(#g) none");
        assert_eq!(paint.paint_type(), PaintType::UriNone);
        assert_eq!(paint.uri(), Some("#g"));

        let paint = SvgPaint::parse("url(#g) currentColor");
        assert_eq!(paint.paint_type(), PaintType::UriCurrentColor);

        let paint = SvgPaint::parse("url(#g) #00ff00");
        assert_eq!(paint.paint_type(), PaintType::UriRgbColor);
        assert_eq!(paint.color(), Some(Color::from_rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_icc_color() {
        let paint = SvgPaint::parse("#ff0000 icc-color(acme, 0.2, 0.4, 0.6)");
        assert_eq!(paint.paint_type(), PaintType::RgbColorIccColor);
        assert_eq!(paint.icc_color().unwrap().profile, "acme");

        let paint = SvgPaint::parse("url(#p) rgb(0,0,255) icc-color(acme, 1)");
        assert_eq!(paint.paint_type(), PaintType::UriRgbColorIccColor);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(SvgPaint::parse("").paint_type(), PaintType::Unknown);
        assert_eq!(SvgPaint::parse("splorch").paint_type(), PaintType::Unknown);
    }

    #[test]
    fn test_set_paint_validates_uri_presence() {
        let mut paint = SvgPaint::default();
        let result = paint.set_paint(PaintType::Uri, None, None, None);
        assert!(matches!(result, Err(PaintError::InvalidValue(_))));
        assert_eq!(paint.paint_type(), PaintType::Unknown);

        let result = paint.set_paint(PaintType::None, Some("#g"), None, None);
        assert!(matches!(result, Err(PaintError::InvalidValue(_))));
    }

    #[test]
    fn test_set_paint_validates_color_presence() {
        let mut paint = SvgPaint::default();
        let result = paint.set_paint(PaintType::RgbColor, None, None, None);
        assert!(result.is_err());

        let result = paint.set_paint(
            PaintType::RgbColor,
            None,
            Some(Color::from_rgb(1, 2, 3)),
            None,
        );
        assert!(result.is_ok());
        assert_eq!(paint.color(), Some(Color::from_rgb(1, 2, 3)));
    }

    #[test]
    fn test_set_paint_validates_icc_presence() {
        let mut paint = SvgPaint::default();
        let icc = IccColor {
            profile: "p".into(),
            values: vec![1.0],
        };
        // ICC without the matching type is contradictory.
        let result = paint.set_paint(
            PaintType::RgbColor,
            None,
            Some(Color::BLACK),
            Some(icc.clone()),
        );
        assert!(result.is_err());

        let result = paint.set_paint(
            PaintType::RgbColorIccColor,
            None,
            Some(Color::BLACK),
            Some(icc),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_set_uri() {
        let mut paint = SvgPaint::parse("red");
        paint.set_uri("#grad");
        assert_eq!(paint.paint_type(), PaintType::Uri);
        assert_eq!(paint.uri(), Some("#grad"));
        assert_eq!(paint.color(), None);
    }

    #[test]
    fn test_css_text_round_trip() {
        for text in [
            "none",
            "currentColor",
            "rgb(255, 0, 0)",
            "url(#g)",
            "url(#g) none",
            "url(#g) currentColor",
            "url(#g) rgb(0, 0, 255)",
            "rgb(10, 20, 30) icc-color(acme, 0.5)",
        ] {
            let first = SvgPaint::parse(text);
            let second = SvgPaint::parse(&first.css_text());
            assert_eq!(first.paint_type(), second.paint_type(), "{text}");
            assert_eq!(first.uri(), second.uri(), "{text}");
            assert_eq!(first.color(), second.color(), "{text}");
            assert_eq!(first.icc_color(), second.icc_color(), "{text}");
        }
    }
}
