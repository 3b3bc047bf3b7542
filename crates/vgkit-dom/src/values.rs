//! Attribute value grammars: lengths, number lists, and
//! `preserveAspectRatio`.

use crate::DomError;

/// Unit of an SVG length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    /// Unitless user units.
    #[default]
    Number,
    Percent,
    Em,
    Ex,
    Px,
    Cm,
    Mm,
    In,
    Pt,
    Pc,
}

impl LengthUnit {
    fn suffix(&self) -> &'static str {
        match self {
            LengthUnit::Number => "",
            LengthUnit::Percent => "%",
            LengthUnit::Em => "em",
            LengthUnit::Ex => "ex",
            LengthUnit::Px => "px",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::In => "in",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
        }
    }
}

/// Context for resolving relative length units.
#[derive(Debug, Clone, Copy)]
pub struct LengthContext {
    /// Reference size for percentages.
    pub viewport: f64,
    /// Current font size for `em`.
    pub font_size: f64,
    /// Current x-height for `ex`.
    pub x_height: f64,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            viewport: 100.0,
            font_size: 16.0,
            x_height: 8.0,
        }
    }
}

/// An SVG length: a number with an optional unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SvgLength {
    pub value: f64,
    pub unit: LengthUnit,
}

impl SvgLength {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    /// Parse a length value. Malformed text is a syntax error, never a
    /// silent default; an absent attribute is the caller's concern.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomError::Syntax("empty length".into()));
        }

        let split = text
            .char_indices()
            .find(|(_, c)| c.is_ascii_alphabetic() || *c == '%')
            .map(|(i, _)| i)
            .unwrap_or(text.len());

        // Exponents would be caught by the split above; recover the 'e'
        // when it is followed by a digit or sign.
        let (number_text, unit_text) = split_exponent_aware(text, split);

        let value: f64 = number_text
            .parse()
            .map_err(|_| DomError::Syntax(format!("bad length number '{number_text}'")))?;

        let unit = match unit_text {
            "" => LengthUnit::Number,
            "%" => LengthUnit::Percent,
            "em" => LengthUnit::Em,
            "ex" => LengthUnit::Ex,
            "px" => LengthUnit::Px,
            "cm" => LengthUnit::Cm,
            "mm" => LengthUnit::Mm,
            "in" => LengthUnit::In,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            other => {
                return Err(DomError::Syntax(format!("unknown length unit '{other}'")));
            }
        };

        Ok(Self { value, unit })
    }

    /// Resolve to user units (CSS pixel-equivalent, 96 per inch).
    pub fn to_user_units(&self, ctx: &LengthContext) -> f64 {
        match self.unit {
            LengthUnit::Number | LengthUnit::Px => self.value,
            LengthUnit::Percent => self.value / 100.0 * ctx.viewport,
            LengthUnit::Em => self.value * ctx.font_size,
            LengthUnit::Ex => self.value * ctx.x_height,
            LengthUnit::In => self.value * 96.0,
            LengthUnit::Cm => self.value * 96.0 / 2.54,
            LengthUnit::Mm => self.value * 96.0 / 25.4,
            LengthUnit::Pt => self.value * 96.0 / 72.0,
            LengthUnit::Pc => self.value * 16.0,
        }
    }

    pub fn css_text(&self) -> String {
        format!("{}{}", self.value, self.unit.suffix())
    }
}

fn split_exponent_aware(text: &str, split: usize) -> (&str, &str) {
    let bytes = text.as_bytes();
    if split < text.len()
        && (bytes[split] == b'e' || bytes[split] == b'E')
        && bytes
            .get(split + 1)
            .is_some_and(|&c| c.is_ascii_digit() || c == b'+' || c == b'-')
    {
        let rest = &text[split + 1..];
        let offset = rest
            .char_indices()
            .skip(usize::from(rest.starts_with(['+', '-'])))
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let end = split + 1 + offset;
        (&text[..end], &text[end..])
    } else {
        (&text[..split], &text[split..])
    }
}

/// Parse a whitespace/comma-separated number list.
pub fn parse_number_list(text: &str) -> Result<Vec<f64>, DomError> {
    let mut numbers = Vec::new();
    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        let value = token
            .parse()
            .map_err(|_| DomError::Syntax(format!("bad number '{token}'")))?;
        numbers.push(value);
    }
    Ok(numbers)
}

/// Parse a whitespace/comma-separated length list.
pub fn parse_length_list(text: &str) -> Result<Vec<SvgLength>, DomError> {
    let mut lengths = Vec::new();
    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        lengths.push(SvgLength::parse(token)?);
    }
    Ok(lengths)
}

/// Alignment of a `preserveAspectRatio` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    None,
    XMinYMin,
    XMidYMin,
    XMaxYMin,
    XMinYMid,
    #[default]
    XMidYMid,
    XMaxYMid,
    XMinYMax,
    XMidYMax,
    XMaxYMax,
}

/// Meet-or-slice of a `preserveAspectRatio` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetOrSlice {
    #[default]
    Meet,
    Slice,
}

/// A parsed `preserveAspectRatio` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreserveAspectRatio {
    pub align: Align,
    pub meet_or_slice: MeetOrSlice,
}

impl PreserveAspectRatio {
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let mut tokens = text.split_whitespace();
        let first = tokens
            .next()
            .ok_or_else(|| DomError::Syntax("empty preserveAspectRatio".into()))?;

        // The deferral flag is recognized but intentionally unimplemented.
        if first == "defer" {
            return Err(DomError::NotSupported(
                "preserveAspectRatio 'defer'".into(),
            ));
        }

        let align = match first {
            "none" => Align::None,
            "xMinYMin" => Align::XMinYMin,
            "xMidYMin" => Align::XMidYMin,
            "xMaxYMin" => Align::XMaxYMin,
            "xMinYMid" => Align::XMinYMid,
            "xMidYMid" => Align::XMidYMid,
            "xMaxYMid" => Align::XMaxYMid,
            "xMinYMax" => Align::XMinYMax,
            "xMidYMax" => Align::XMidYMax,
            "xMaxYMax" => Align::XMaxYMax,
            other => {
                return Err(DomError::Syntax(format!(
                    "unknown preserveAspectRatio alignment '{other}'"
                )));
            }
        };

        let meet_or_slice = match tokens.next() {
            None => MeetOrSlice::Meet,
            Some("meet") => MeetOrSlice::Meet,
            Some("slice") => MeetOrSlice::Slice,
            Some(other) => {
                return Err(DomError::Syntax(format!(
                    "unknown meetOrSlice '{other}'"
                )));
            }
        };

        Ok(Self {
            align,
            meet_or_slice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_parse_units() {
        assert_eq!(
            SvgLength::parse("10").unwrap(),
            SvgLength::new(10.0, LengthUnit::Number)
        );
        assert_eq!(
            SvgLength::parse("50px").unwrap(),
            SvgLength::new(50.0, LengthUnit::Px)
        );
        assert_eq!(
            SvgLength::parse("120%").unwrap(),
            SvgLength::new(120.0, LengthUnit::Percent)
        );
        assert_eq!(
            SvgLength::parse("-1.5em").unwrap(),
            SvgLength::new(-1.5, LengthUnit::Em)
        );
        assert_eq!(
            SvgLength::parse("2.54cm").unwrap(),
            SvgLength::new(2.54, LengthUnit::Cm)
        );
    }

    #[test]
    fn test_length_parse_exponent() {
        assert_eq!(
            SvgLength::parse("1e2").unwrap(),
            SvgLength::new(100.0, LengthUnit::Number)
        );
        assert_eq!(
            SvgLength::parse("1E-1px").unwrap(),
            SvgLength::new(0.1, LengthUnit::Px)
        );
    }

    #[test]
    fn test_length_parse_errors() {
        assert!(matches!(SvgLength::parse(""), Err(DomError::Syntax(_))));
        assert!(matches!(SvgLength::parse("abc"), Err(DomError::Syntax(_))));
        assert!(matches!(
            SvgLength::parse("10furlong"),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn test_length_to_user_units() {
        let ctx = LengthContext {
            viewport: 200.0,
            font_size: 10.0,
            x_height: 5.0,
        };
        assert_eq!(SvgLength::new(50.0, LengthUnit::Percent).to_user_units(&ctx), 100.0);
        assert_eq!(SvgLength::new(2.0, LengthUnit::Em).to_user_units(&ctx), 20.0);
        assert_eq!(SvgLength::new(1.0, LengthUnit::In).to_user_units(&ctx), 96.0);
        assert_eq!(SvgLength::new(72.0, LengthUnit::Pt).to_user_units(&ctx), 96.0);
        assert_eq!(SvgLength::new(3.0, LengthUnit::Px).to_user_units(&ctx), 3.0);
    }

    #[test]
    fn test_length_css_text() {
        assert_eq!(SvgLength::new(120.0, LengthUnit::Percent).css_text(), "120%");
        assert_eq!(SvgLength::new(3.0, LengthUnit::Number).css_text(), "3");
    }

    #[test]
    fn test_number_list() {
        assert_eq!(
            parse_number_list("1, 2.5 -3").unwrap(),
            vec![1.0, 2.5, -3.0]
        );
        assert!(parse_number_list("1 two").is_err());
        assert!(parse_number_list("").unwrap().is_empty());
    }

    #[test]
    fn test_length_list() {
        let lengths = parse_length_list("1px, 50%").unwrap();
        assert_eq!(lengths.len(), 2);
        assert_eq!(lengths[1].unit, LengthUnit::Percent);
    }

    #[test]
    fn test_preserve_aspect_ratio() {
        assert_eq!(
            PreserveAspectRatio::parse("xMidYMid meet").unwrap(),
            PreserveAspectRatio::default()
        );
        assert_eq!(
            PreserveAspectRatio::parse("xMinYMax slice").unwrap().align,
            Align::XMinYMax
        );
        assert_eq!(
            PreserveAspectRatio::parse("none").unwrap().meet_or_slice,
            MeetOrSlice::Meet
        );
        assert!(matches!(
            PreserveAspectRatio::parse("defer xMidYMid"),
            Err(DomError::NotSupported(_))
        ));
        assert!(matches!(
            PreserveAspectRatio::parse("sideways"),
            Err(DomError::Syntax(_))
        ));
    }
}
