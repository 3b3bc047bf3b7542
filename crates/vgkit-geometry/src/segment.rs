//! The path segment model: typed variants of the 20 SVG path commands.

/// One command of an SVG path's `d` attribute.
///
/// Numeric parameters are plain public fields; the DOM contract lets
/// scripts rewrite coordinates in place. Derived geometry (absolute
/// endpoint, tangent angles) lives on the owning
/// [`PathSegList`](crate::path::PathSegList) and is only valid while the
/// segment is attached to a list, since it depends on the preceding chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg {
    ClosePath,
    MoveToAbs { x: f64, y: f64 },
    MoveToRel { x: f64, y: f64 },
    LineToAbs { x: f64, y: f64 },
    LineToRel { x: f64, y: f64 },
    CurveToCubicAbs { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    CurveToCubicRel { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    CurveToQuadraticAbs { x1: f64, y1: f64, x: f64, y: f64 },
    CurveToQuadraticRel { x1: f64, y1: f64, x: f64, y: f64 },
    ArcAbs {
        rx: f64,
        ry: f64,
        angle: f64,
        large_arc_flag: bool,
        sweep_flag: bool,
        x: f64,
        y: f64,
    },
    ArcRel {
        rx: f64,
        ry: f64,
        angle: f64,
        large_arc_flag: bool,
        sweep_flag: bool,
        x: f64,
        y: f64,
    },
    LineToHorizontalAbs { x: f64 },
    LineToHorizontalRel { x: f64 },
    LineToVerticalAbs { y: f64 },
    LineToVerticalRel { y: f64 },
    CurveToCubicSmoothAbs { x2: f64, y2: f64, x: f64, y: f64 },
    CurveToCubicSmoothRel { x2: f64, y2: f64, x: f64, y: f64 },
    CurveToQuadraticSmoothAbs { x: f64, y: f64 },
    CurveToQuadraticSmoothRel { x: f64, y: f64 },
}

impl PathSeg {
    /// The command letter; case encodes absolute vs. relative.
    pub fn letter(&self) -> char {
        match self {
            PathSeg::ClosePath => 'z',
            PathSeg::MoveToAbs { .. } => 'M',
            PathSeg::MoveToRel { .. } => 'm',
            PathSeg::LineToAbs { .. } => 'L',
            PathSeg::LineToRel { .. } => 'l',
            PathSeg::CurveToCubicAbs { .. } => 'C',
            PathSeg::CurveToCubicRel { .. } => 'c',
            PathSeg::CurveToQuadraticAbs { .. } => 'Q',
            PathSeg::CurveToQuadraticRel { .. } => 'q',
            PathSeg::ArcAbs { .. } => 'A',
            PathSeg::ArcRel { .. } => 'a',
            PathSeg::LineToHorizontalAbs { .. } => 'H',
            PathSeg::LineToHorizontalRel { .. } => 'h',
            PathSeg::LineToVerticalAbs { .. } => 'V',
            PathSeg::LineToVerticalRel { .. } => 'v',
            PathSeg::CurveToCubicSmoothAbs { .. } => 'S',
            PathSeg::CurveToCubicSmoothRel { .. } => 's',
            PathSeg::CurveToQuadraticSmoothAbs { .. } => 'T',
            PathSeg::CurveToQuadraticSmoothRel { .. } => 't',
        }
    }

    /// Whether the segment traces a curve rather than a straight line.
    pub fn is_curve(&self) -> bool {
        matches!(
            self,
            PathSeg::CurveToCubicAbs { .. }
                | PathSeg::CurveToCubicRel { .. }
                | PathSeg::CurveToQuadraticAbs { .. }
                | PathSeg::CurveToQuadraticRel { .. }
                | PathSeg::CurveToCubicSmoothAbs { .. }
                | PathSeg::CurveToCubicSmoothRel { .. }
                | PathSeg::CurveToQuadraticSmoothAbs { .. }
                | PathSeg::CurveToQuadraticSmoothRel { .. }
                | PathSeg::ArcAbs { .. }
                | PathSeg::ArcRel { .. }
        )
    }

    /// Whether the segment starts a new subpath.
    pub fn is_move_to(&self) -> bool {
        matches!(self, PathSeg::MoveToAbs { .. } | PathSeg::MoveToRel { .. })
    }

    /// Whether coordinates are relative to the current point.
    pub fn is_relative(&self) -> bool {
        matches!(
            self,
            PathSeg::MoveToRel { .. }
                | PathSeg::LineToRel { .. }
                | PathSeg::CurveToCubicRel { .. }
                | PathSeg::CurveToQuadraticRel { .. }
                | PathSeg::ArcRel { .. }
                | PathSeg::LineToHorizontalRel { .. }
                | PathSeg::LineToVerticalRel { .. }
                | PathSeg::CurveToCubicSmoothRel { .. }
                | PathSeg::CurveToQuadraticSmoothRel { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters() {
        assert_eq!(PathSeg::MoveToAbs { x: 0.0, y: 0.0 }.letter(), 'M');
        assert_eq!(PathSeg::MoveToRel { x: 0.0, y: 0.0 }.letter(), 'm');
        assert_eq!(PathSeg::ClosePath.letter(), 'z');
        assert_eq!(
            PathSeg::ArcAbs {
                rx: 1.0,
                ry: 1.0,
                angle: 0.0,
                large_arc_flag: false,
                sweep_flag: false,
                x: 0.0,
                y: 0.0
            }
            .letter(),
            'A'
        );
    }

    #[test]
    fn test_is_curve() {
        assert!(!PathSeg::LineToAbs { x: 1.0, y: 1.0 }.is_curve());
        assert!(!PathSeg::ClosePath.is_curve());
        assert!(PathSeg::CurveToQuadraticSmoothRel { x: 1.0, y: 1.0 }.is_curve());
        assert!(PathSeg::ArcRel {
            rx: 1.0,
            ry: 1.0,
            angle: 0.0,
            large_arc_flag: true,
            sweep_flag: true,
            x: 0.0,
            y: 0.0
        }
        .is_curve());
    }

    #[test]
    fn test_is_relative() {
        assert!(PathSeg::LineToVerticalRel { y: 2.0 }.is_relative());
        assert!(!PathSeg::LineToVerticalAbs { y: 2.0 }.is_relative());
        assert!(!PathSeg::ClosePath.is_relative());
    }
}
