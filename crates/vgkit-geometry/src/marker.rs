//! Marker placement: vertex positions, orientation angles, and the
//! enumerations of the marker attributes.

use crate::{GeometryError, Point};

/// A shape that can host markers.
///
/// Implementors expose one entry per vertex; for a path that is the
/// endpoint of every segment, the initial moveto included. Angles are
/// degrees. `start_angle` is the outgoing tangent at the vertex and
/// `end_angle` the incoming one; at the terminal vertices of an open
/// subpath each falls back to the other, and on a closed subpath they
/// wrap around the closing segment.
pub trait MarkerHost {
    fn marker_positions(&self) -> Vec<Point>;
    fn start_angle(&self, index: usize) -> f64;
    fn end_angle(&self, index: usize) -> f64;
}

/// A marker placement computed for one vertex. Transient: built during
/// marker rendering, not persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// Index of the owning segment/vertex.
    pub index: usize,
    /// Absolute position of the vertex.
    pub position: Point,
    /// Resolved orientation in degrees.
    pub angle: f64,
}

/// Coordinate system of the marker content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerUnits {
    /// Scale marker content by the host's stroke width (default).
    #[default]
    StrokeWidth,
    /// Marker content is in user space.
    UserSpaceOnUse,
}

impl MarkerUnits {
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        match text.trim() {
            "strokeWidth" => Ok(MarkerUnits::StrokeWidth),
            "userSpaceOnUse" => Ok(MarkerUnits::UserSpaceOnUse),
            other => Err(GeometryError::InvalidValue(format!(
                "markerUnits '{other}'"
            ))),
        }
    }

    /// Scale factor applied to the marker coordinate system.
    pub fn scale(&self, stroke_width: f64) -> f64 {
        match self {
            MarkerUnits::StrokeWidth => stroke_width,
            MarkerUnits::UserSpaceOnUse => 1.0,
        }
    }
}

/// The `orient` attribute of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MarkerOrient {
    /// Fixed angle in degrees; `orient="0"` is the initial value.
    #[default]
    Angle0,
    Auto,
    AutoStartReverse,
    Angle(f64),
}

impl MarkerOrient {
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        let text = text.trim();
        match text {
            "auto" => Ok(MarkerOrient::Auto),
            "auto-start-reverse" => Ok(MarkerOrient::AutoStartReverse),
            _ => {
                // Plain number, optionally with a "deg" suffix.
                let number = text.strip_suffix("deg").unwrap_or(text).trim();
                number
                    .parse::<f64>()
                    .map(MarkerOrient::Angle)
                    .map_err(|_| {
                        GeometryError::InvalidValue(format!("orient '{text}'"))
                    })
            }
        }
    }
}

/// Which vertex class a marker attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPosition {
    Start,
    Mid,
    End,
}

/// The orientation-neutral "auto" angle at a vertex: the bisector of the
/// incoming and outgoing tangents, computed on unit vectors so the result
/// is stable across the ±180 wrap.
pub fn auto_angle(host: &dyn MarkerHost, vertex: usize) -> f64 {
    let incoming = host.end_angle(vertex).to_radians();
    let outgoing = host.start_angle(vertex).to_radians();
    let y = (incoming.sin() + outgoing.sin()) / 2.0;
    let x = (incoming.cos() + outgoing.cos()) / 2.0;
    if x == 0.0 && y == 0.0 {
        // Opposed tangents: keep the incoming direction.
        return host.end_angle(vertex);
    }
    y.atan2(x).to_degrees()
}

/// Resolve the rendered angle of a marker at a vertex.
///
/// `auto-start-reverse` flips the start marker by 180 degrees; on closed
/// subpaths this makes the start marker point exactly opposite the end
/// marker sharing the vertex.
pub fn resolve_marker_angle(
    host: &dyn MarkerHost,
    vertex: usize,
    position: MarkerPosition,
    orient: MarkerOrient,
) -> f64 {
    match orient {
        MarkerOrient::Angle0 => 0.0,
        MarkerOrient::Angle(deg) => deg,
        MarkerOrient::Auto => auto_angle(host, vertex),
        MarkerOrient::AutoStartReverse => {
            let angle = auto_angle(host, vertex);
            if position == MarkerPosition::Start {
                angle + 180.0
            } else {
                angle
            }
        }
    }
}

/// Compute the marker placements for every vertex of a host.
pub fn place_markers(host: &dyn MarkerHost, orient: MarkerOrient) -> Vec<Marker> {
    let positions = host.marker_positions();
    let last = positions.len().saturating_sub(1);
    positions
        .into_iter()
        .enumerate()
        .map(|(index, position)| {
            let class = if index == 0 {
                MarkerPosition::Start
            } else if index == last {
                MarkerPosition::End
            } else {
                MarkerPosition::Mid
            };
            Marker {
                index,
                position,
                angle: resolve_marker_angle(host, index, class, orient),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_path_data;

    #[test]
    fn test_marker_units() {
        assert_eq!(
            MarkerUnits::parse("strokeWidth").unwrap(),
            MarkerUnits::StrokeWidth
        );
        assert_eq!(MarkerUnits::StrokeWidth.scale(3.0), 3.0);
        assert_eq!(MarkerUnits::UserSpaceOnUse.scale(3.0), 1.0);
        assert!(MarkerUnits::parse("bogus").is_err());
    }

    #[test]
    fn test_orient_parse() {
        assert_eq!(MarkerOrient::parse("auto").unwrap(), MarkerOrient::Auto);
        assert_eq!(
            MarkerOrient::parse("auto-start-reverse").unwrap(),
            MarkerOrient::AutoStartReverse
        );
        assert_eq!(
            MarkerOrient::parse("45").unwrap(),
            MarkerOrient::Angle(45.0)
        );
        assert_eq!(
            MarkerOrient::parse("90deg").unwrap(),
            MarkerOrient::Angle(90.0)
        );
        assert!(MarkerOrient::parse("slanted").is_err());
    }

    #[test]
    fn test_auto_angle_straight_line() {
        let path = parse_path_data("M 0,0 L 10,0").unwrap();
        assert_eq!(auto_angle(&path, 0), 0.0);
        assert_eq!(auto_angle(&path, 1), 0.0);
    }

    #[test]
    fn test_auto_angle_corner_bisects() {
        let path = parse_path_data("M 0,0 L 10,0 L 10,10").unwrap();
        // Incoming 0, outgoing 90: bisector 45.
        assert!((auto_angle(&path, 1) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_start_reverse_on_closed_square() {
        let path = parse_path_data("M 0,0 L 10,0 L 10,10 L 0,10 Z").unwrap();
        let last = path.number_of_items() - 1;

        let end_auto = resolve_marker_angle(&path, last, MarkerPosition::End, MarkerOrient::Auto);
        let start_reversed = resolve_marker_angle(
            &path,
            0,
            MarkerPosition::Start,
            MarkerOrient::AutoStartReverse,
        );
        assert!((start_reversed - end_auto - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_orientation_ignores_geometry() {
        let path = parse_path_data("M 0,0 L 10,10").unwrap();
        assert_eq!(
            resolve_marker_angle(&path, 0, MarkerPosition::Start, MarkerOrient::Angle(30.0)),
            30.0
        );
        assert_eq!(
            resolve_marker_angle(&path, 0, MarkerPosition::Start, MarkerOrient::Angle0),
            0.0
        );
    }

    #[test]
    fn test_place_markers_classifies_vertices() {
        let path = parse_path_data("M 0,0 L 10,0 L 10,10").unwrap();
        let markers = place_markers(&path, MarkerOrient::Auto);
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].index, 0);
        assert_eq!(markers[2].position, Point::new(10.0, 10.0));
        assert!((markers[1].angle - 45.0).abs() < 1e-9);
    }
}
