//! Grammars for the path `d` attribute and the polyline/polygon
//! `points` attribute.
//!
//! Malformed text is reported as a syntax error carrying the byte offset
//! of the offending token; it is never silently defaulted.

use crate::path::PathSegList;
use crate::segment::PathSeg;
use crate::{GeometryError, Point};

/// Parse a path `d` attribute into a segment list.
///
/// Implements the full grammar: implicit lineto after moveto, repeated
/// parameter groups, compressed arc flags, scientific notation. Empty or
/// whitespace-only input yields an empty list; a path that does not start
/// with a moveto is a syntax error.
pub fn parse_path_data(text: &str) -> Result<PathSegList, GeometryError> {
    let mut scanner = Scanner::new(text);
    let mut segs: Vec<PathSeg> = Vec::new();

    scanner.skip_separators();
    if scanner.at_end() {
        return Ok(PathSegList::new());
    }

    let mut previous: Option<u8> = None;

    while !scanner.at_end() {
        let c = scanner.peek();
        let command = if c.is_ascii_alphabetic() {
            scanner.advance();
            c
        } else {
            // A bare parameter group repeats the previous command, with
            // moveto degrading to lineto.
            match previous {
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(b'Z') | Some(b'z') | None => {
                    return Err(GeometryError::syntax(
                        scanner.pos,
                        "expected path command",
                    ));
                }
                Some(same) => same,
            }
        };
        previous = Some(command);

        if segs.is_empty() && !matches!(command, b'M' | b'm') {
            return Err(GeometryError::syntax(
                scanner.pos,
                "path data must begin with a moveto",
            ));
        }

        let seg = match command {
            b'M' => {
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::MoveToAbs { x, y }
            }
            b'm' => {
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::MoveToRel { x, y }
            }
            b'L' => {
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::LineToAbs { x, y }
            }
            b'l' => {
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::LineToRel { x, y }
            }
            b'H' => PathSeg::LineToHorizontalAbs {
                x: scanner.number()?,
            },
            b'h' => PathSeg::LineToHorizontalRel {
                x: scanner.number()?,
            },
            b'V' => PathSeg::LineToVerticalAbs {
                y: scanner.number()?,
            },
            b'v' => PathSeg::LineToVerticalRel {
                y: scanner.number()?,
            },
            b'C' => {
                let (x1, y1) = scanner.coordinate_pair()?;
                let (x2, y2) = scanner.coordinate_pair()?;
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToCubicAbs {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                }
            }
            b'c' => {
                let (x1, y1) = scanner.coordinate_pair()?;
                let (x2, y2) = scanner.coordinate_pair()?;
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToCubicRel {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                }
            }
            b'S' => {
                let (x2, y2) = scanner.coordinate_pair()?;
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToCubicSmoothAbs { x2, y2, x, y }
            }
            b's' => {
                let (x2, y2) = scanner.coordinate_pair()?;
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToCubicSmoothRel { x2, y2, x, y }
            }
            b'Q' => {
                let (x1, y1) = scanner.coordinate_pair()?;
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToQuadraticAbs { x1, y1, x, y }
            }
            b'q' => {
                let (x1, y1) = scanner.coordinate_pair()?;
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToQuadraticRel { x1, y1, x, y }
            }
            b'T' => {
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToQuadraticSmoothAbs { x, y }
            }
            b't' => {
                let (x, y) = scanner.coordinate_pair()?;
                PathSeg::CurveToQuadraticSmoothRel { x, y }
            }
            b'A' | b'a' => {
                let rx = scanner.number()?;
                let ry = scanner.number()?;
                let angle = scanner.number()?;
                let large_arc_flag = scanner.flag()?;
                let sweep_flag = scanner.flag()?;
                let (x, y) = scanner.coordinate_pair()?;
                if command == b'A' {
                    PathSeg::ArcAbs {
                        rx,
                        ry,
                        angle,
                        large_arc_flag,
                        sweep_flag,
                        x,
                        y,
                    }
                } else {
                    PathSeg::ArcRel {
                        rx,
                        ry,
                        angle,
                        large_arc_flag,
                        sweep_flag,
                        x,
                        y,
                    }
                }
            }
            b'Z' | b'z' => PathSeg::ClosePath,
            other => {
                return Err(GeometryError::syntax(
                    scanner.pos.saturating_sub(1),
                    format!("unknown path command '{}'", other as char),
                ));
            }
        };

        segs.push(seg);
        scanner.skip_separators();
    }

    Ok(PathSegList::from_segs(segs))
}

/// Parse a `points` attribute into a list of coordinate pairs.
///
/// An odd number of coordinates is a syntax error.
pub fn parse_points(text: &str) -> Result<Vec<Point>, GeometryError> {
    let mut scanner = Scanner::new(text);
    let mut points = Vec::new();

    loop {
        scanner.skip_separators();
        if scanner.at_end() {
            break;
        }
        let x = scanner.number()?;
        scanner.skip_separators();
        if scanner.at_end() {
            return Err(GeometryError::syntax(
                scanner.pos,
                "odd number of coordinates in points list",
            ));
        }
        let y = scanner.number()?;
        points.push(Point::new(x, y));
    }

    Ok(points)
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_separators(&mut self) {
        while !self.at_end() && (self.peek().is_ascii_whitespace() || self.peek() == b',') {
            self.advance();
        }
    }

    fn coordinate_pair(&mut self) -> Result<(f64, f64), GeometryError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok((x, y))
    }

    fn number(&mut self) -> Result<f64, GeometryError> {
        self.skip_separators();
        let start = self.pos;

        if !self.at_end() && (self.peek() == b'+' || self.peek() == b'-') {
            self.advance();
        }
        let mut digits = false;
        while !self.at_end() && self.peek().is_ascii_digit() {
            self.advance();
            digits = true;
        }
        if !self.at_end() && self.peek() == b'.' {
            self.advance();
            while !self.at_end() && self.peek().is_ascii_digit() {
                self.advance();
                digits = true;
            }
        }
        if !digits {
            return Err(GeometryError::syntax(start, "expected number"));
        }
        if !self.at_end() && (self.peek() == b'e' || self.peek() == b'E') {
            let exp_start = self.pos;
            self.advance();
            if !self.at_end() && (self.peek() == b'+' || self.peek() == b'-') {
                self.advance();
            }
            let mut exp_digits = false;
            while !self.at_end() && self.peek().is_ascii_digit() {
                self.advance();
                exp_digits = true;
            }
            if !exp_digits {
                return Err(GeometryError::syntax(exp_start, "malformed exponent"));
            }
        }

        self.text[start..self.pos]
            .parse()
            .map_err(|_| GeometryError::syntax(start, "malformed number"))
    }

    /// Arc flags are a single '0' or '1', possibly run together with the
    /// following value.
    fn flag(&mut self) -> Result<bool, GeometryError> {
        self.skip_separators();
        if self.at_end() {
            return Err(GeometryError::syntax(self.pos, "expected arc flag"));
        }
        let value = match self.peek() {
            b'0' => false,
            b'1' => true,
            _ => {
                return Err(GeometryError::syntax(
                    self.pos,
                    "arc flag must be 0 or 1",
                ));
            }
        };
        self.advance();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_path() {
        let list = parse_path_data("M 10 20 L 30 40 Z").unwrap();
        assert_eq!(list.number_of_items(), 3);
        assert_eq!(
            *list.get_item(0).unwrap(),
            PathSeg::MoveToAbs { x: 10.0, y: 20.0 }
        );
        assert_eq!(
            *list.get_item(1).unwrap(),
            PathSeg::LineToAbs { x: 30.0, y: 40.0 }
        );
        assert_eq!(*list.get_item(2).unwrap(), PathSeg::ClosePath);
    }

    #[test]
    fn test_implicit_lineto_after_moveto() {
        let list = parse_path_data("M 0 0 10 10 20 20").unwrap();
        assert_eq!(list.number_of_items(), 3);
        assert_eq!(
            *list.get_item(1).unwrap(),
            PathSeg::LineToAbs { x: 10.0, y: 10.0 }
        );

        let list = parse_path_data("m 0 0 10 10").unwrap();
        assert_eq!(
            *list.get_item(1).unwrap(),
            PathSeg::LineToRel { x: 10.0, y: 10.0 }
        );
    }

    #[test]
    fn test_repeated_parameter_groups() {
        let list = parse_path_data("M 0 0 L 1 1 2 2 3 3").unwrap();
        assert_eq!(list.number_of_items(), 4);
        assert_eq!(
            *list.get_item(3).unwrap(),
            PathSeg::LineToAbs { x: 3.0, y: 3.0 }
        );
    }

    #[test]
    fn test_compressed_numbers_and_flags() {
        // Flags run together with the endpoint, negative numbers as
        // separators, decimal shorthand.
        let list = parse_path_data("M0,0A5 5 0 1110,0").unwrap();
        assert_eq!(list.number_of_items(), 2);
        assert_eq!(
            *list.get_item(1).unwrap(),
            PathSeg::ArcAbs {
                rx: 5.0,
                ry: 5.0,
                angle: 0.0,
                large_arc_flag: true,
                sweep_flag: true,
                x: 10.0,
                y: 0.0
            }
        );

        let list = parse_path_data("M0.5.5L-1-1").unwrap();
        assert_eq!(
            *list.get_item(0).unwrap(),
            PathSeg::MoveToAbs { x: 0.5, y: 0.5 }
        );
        assert_eq!(
            *list.get_item(1).unwrap(),
            PathSeg::LineToAbs { x: -1.0, y: -1.0 }
        );
    }

    #[test]
    fn test_scientific_notation() {
        let list = parse_path_data("M 1e2 -2.5E-1").unwrap();
        assert_eq!(
            *list.get_item(0).unwrap(),
            PathSeg::MoveToAbs { x: 100.0, y: -0.25 }
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_path_data("").unwrap().is_empty());
        assert!(parse_path_data("   ").unwrap().is_empty());
    }

    #[test]
    fn test_error_offsets() {
        let err = parse_path_data("M 0 0 L 10 x").unwrap_err();
        match err {
            GeometryError::Syntax { offset, .. } => assert_eq!(offset, 11),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_must_begin_with_moveto() {
        assert!(matches!(
            parse_path_data("L 10 10"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_flag() {
        assert!(matches!(
            parse_path_data("M 0 0 A 5 5 0 2 0 10 0"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_rejects_numbers_after_close() {
        assert!(matches!(
            parse_path_data("M 0 0 Z 5 5"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_command() {
        assert!(matches!(
            parse_path_data("M 0 0 X 5 5"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_parse_points() {
        let points = parse_points("10,20 30,40 50,60").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], Point::new(30.0, 40.0));
    }

    #[test]
    fn test_parse_points_odd_count() {
        assert!(matches!(
            parse_points("10,20 30"),
            Err(GeometryError::Syntax { .. })
        ));
    }

    #[test]
    fn test_parse_points_empty() {
        assert!(parse_points("").unwrap().is_empty());
    }
}
