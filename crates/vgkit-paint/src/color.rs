//! Color values and the SVG color grammar.

use crate::PaintError;

/// An sRGB color value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Serialize in the rgb() functional form.
    pub fn css_text(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// An ICC color specification attached to an sRGB fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct IccColor {
    /// Name of the referenced color profile.
    pub profile: String,
    /// Component values in the profile's color space.
    pub values: Vec<f64>,
}

impl IccColor {
    /// Parse an `icc-color(profile, v1, v2, ...)` specification.
    pub fn parse(text: &str) -> Result<Self, PaintError> {
        let text = text.trim();
        let inner = text
            .strip_prefix("icc-color(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| PaintError::ParseError(format!("not an icc-color: '{text}'")))?;

        let mut parts = inner.split(|c: char| c == ',' || c.is_whitespace());
        let profile = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PaintError::ParseError("icc-color missing profile name".into()))?;

        let mut values = Vec::new();
        for token in parts {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let value = token
                .parse()
                .map_err(|_| PaintError::ParseError(format!("bad icc-color value '{token}'")))?;
            values.push(value);
        }

        Ok(Self {
            profile: profile.to_string(),
            values,
        })
    }

    pub fn css_text(&self) -> String {
        let mut out = format!("icc-color({}", self.profile);
        for value in &self.values {
            out.push_str(", ");
            out.push_str(&value.to_string());
        }
        out.push(')');
        out
    }
}

/// Parse an SVG color value: `#rgb`, `#rrggbb`, `rgb(...)` with integers
/// or percentages, or a recognized color keyword.
pub fn parse_color(text: &str) -> Result<Color, PaintError> {
    let text = text.trim();

    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex)
            .ok_or_else(|| PaintError::ParseError(format!("bad hex color '#{hex}'")));
    }

    let lower = text.to_ascii_lowercase();
    if let Some(inner) = lower
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_components(inner);
    }

    named_color(&lower).ok_or_else(|| PaintError::ParseError(format!("unknown color '{text}'")))
}

fn parse_hex(hex: &str) -> Option<Color> {
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::from_rgb(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::from_rgb(r, g, b))
        }
        _ => None,
    }
}

fn parse_rgb_components(inner: &str) -> Result<Color, PaintError> {
    let parts: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return Err(PaintError::ParseError(format!(
            "rgb() needs 3 components, got {}",
            parts.len()
        )));
    }

    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        *slot = if let Some(percent) = part.strip_suffix('%') {
            let value: f64 = percent
                .trim()
                .parse()
                .map_err(|_| PaintError::ParseError(format!("bad rgb component '{part}'")))?;
            (value.clamp(0.0, 100.0) * 255.0 / 100.0).round() as u8
        } else {
            let value: i64 = part
                .parse()
                .map_err(|_| PaintError::ParseError(format!("bad rgb component '{part}'")))?;
            value.clamp(0, 255) as u8
        };
    }

    Ok(Color::from_rgb(channels[0], channels[1], channels[2]))
}

fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        "white" => (255, 255, 255),
        "maroon" => (128, 0, 0),
        "red" => (255, 0, 0),
        "purple" => (128, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "olive" => (128, 128, 0),
        "yellow" => (255, 255, 0),
        "navy" => (0, 0, 128),
        "blue" => (0, 0, 255),
        "teal" => (0, 128, 128),
        "aqua" | "cyan" => (0, 255, 255),
        "orange" => (255, 165, 0),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "gold" => (255, 215, 0),
        "indigo" => (75, 0, 130),
        "violet" => (238, 130, 238),
        "crimson" => (220, 20, 60),
        "coral" => (255, 127, 80),
        "salmon" => (250, 128, 114),
        "khaki" => (240, 230, 140),
        "turquoise" => (64, 224, 208),
        "tan" => (210, 180, 140),
        "beige" => (245, 245, 220),
        "lavender" => (230, 230, 250),
        "slategray" | "slategrey" => (112, 128, 144),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "darkred" => (139, 0, 0),
        "darkgreen" => (0, 100, 0),
        "darkblue" => (0, 0, 139),
        "lightblue" => (173, 216, 230),
        "lightgreen" => (144, 238, 144),
        "transparent" => return Some(Color::TRANSPARENT),
        _ => return None,
    };
    Some(Color::from_rgb(r, g, b))
}
