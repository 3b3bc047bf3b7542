//! The path segment list: arena storage, list editing, and derived geometry.

use crate::marker::MarkerHost;
use crate::polynomial::{RealFunction, SqrtPolynomial};
use crate::segment::PathSeg;
use crate::{GeometryError, Point};
use std::cell::RefCell;
use tracing::trace;

/// Derived geometry of one segment, resolved against the preceding chain.
///
/// Angles are in degrees, 0 along +X, measured counter-clockwise in SVG
/// user space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSeg {
    /// Current point before the segment.
    pub start: Point,
    /// Absolute endpoint of the segment.
    pub end: Point,
    /// Tangent direction at the segment start.
    pub start_angle: f64,
    /// Tangent direction at the segment end.
    pub end_angle: f64,
    /// Start of the subpath the segment belongs to.
    pub subpath_start: Point,
    /// Resolved absolute first control point (cubic and quadratic curves).
    pub ctrl1: Option<Point>,
    /// Resolved absolute second control point (cubic curves).
    pub ctrl2: Option<Point>,
    /// Center parameterization for elliptical arcs; None when the arc
    /// degenerates to a straight line.
    pub arc: Option<ArcGeometry>,
}

/// Center parameterization of an elliptical arc (angles in radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
    /// x-axis rotation.
    pub phi: f64,
    /// Start angle on the ellipse.
    pub theta1: f64,
    /// Signed sweep; positive follows increasing angle.
    pub delta: f64,
}

impl ArcGeometry {
    /// Point on the arc at normalized parameter `t` in [0, 1].
    pub fn point_at(&self, t: f64) -> Point {
        let theta = self.theta1 + t * self.delta;
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_t, cos_t) = theta.sin_cos();
        Point::new(
            self.cx + self.rx * cos_t * cos_phi - self.ry * sin_t * sin_phi,
            self.cy + self.rx * cos_t * sin_phi + self.ry * sin_t * cos_phi,
        )
    }

    /// Tangent direction (degrees) at normalized parameter `t`.
    pub fn tangent_at(&self, t: f64) -> f64 {
        let theta = self.theta1 + t * self.delta;
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_t, cos_t) = theta.sin_cos();
        let mut dx = -self.rx * sin_t * cos_phi - self.ry * cos_t * sin_phi;
        let mut dy = -self.rx * sin_t * sin_phi + self.ry * cos_t * cos_phi;
        if self.delta < 0.0 {
            dx = -dx;
            dy = -dy;
        }
        dy.atan2(dx).to_degrees()
    }
}

/// Speed function of an elliptical arc as a function of the ellipse angle.
/// Rotation does not change arc length, so `phi` does not appear.
struct ArcSpeed {
    rx: f64,
    ry: f64,
}

impl RealFunction for ArcSpeed {
    fn evaluate(&self, theta: f64) -> f64 {
        let (sin_t, cos_t) = theta.sin_cos();
        ((self.rx * sin_t).powi(2) + (self.ry * cos_t).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Default)]
struct ResolvedCache {
    generation: u64,
    valid: bool,
    entries: Vec<ResolvedSeg>,
}

/// An ordered, mutable list of path segments.
///
/// Segments are stored in a contiguous arena; neighbor navigation is by
/// index, so list mutation renumbers in one pass with no dangling
/// back-references. Derived geometry is resolved lazily and cached,
/// stamped with a generation counter that every mutation bumps.
#[derive(Debug, Clone, Default)]
pub struct PathSegList {
    segs: Vec<PathSeg>,
    generation: u64,
    cache: RefCell<ResolvedCache>,
}

impl PathSegList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segs(segs: Vec<PathSeg>) -> Self {
        Self {
            segs,
            generation: 0,
            cache: RefCell::new(ResolvedCache::default()),
        }
    }

    pub fn number_of_items(&self) -> usize {
        self.segs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), GeometryError> {
        if index >= self.segs.len() {
            return Err(GeometryError::IndexSize {
                index,
                len: self.segs.len(),
            });
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Read access to a segment. Never mutates.
    pub fn get_item(&self, index: usize) -> Result<&PathSeg, GeometryError> {
        self.check_index(index)?;
        Ok(&self.segs[index])
    }

    /// Write access to a segment's parameters. Invalidates derived
    /// geometry, since the caller may rewrite coordinates in place.
    pub fn get_item_mut(&mut self, index: usize) -> Result<&mut PathSeg, GeometryError> {
        self.check_index(index)?;
        self.invalidate();
        Ok(&mut self.segs[index])
    }

    /// Clear the list and start over with a single segment.
    pub fn initialize(&mut self, seg: PathSeg) {
        self.segs.clear();
        self.segs.push(seg);
        self.invalidate();
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert_item_before(&mut self, seg: PathSeg, index: usize) -> Result<(), GeometryError> {
        if index > self.segs.len() {
            return Err(GeometryError::IndexSize {
                index,
                len: self.segs.len(),
            });
        }
        self.segs.insert(index, seg);
        self.invalidate();
        trace!(index, total = self.segs.len(), "inserted path segment");
        Ok(())
    }

    /// Replace the segment at `index`, returning the old one.
    pub fn replace_item(&mut self, seg: PathSeg, index: usize) -> Result<PathSeg, GeometryError> {
        self.check_index(index)?;
        let old = std::mem::replace(&mut self.segs[index], seg);
        self.invalidate();
        Ok(old)
    }

    /// Remove and return the segment at `index`.
    pub fn remove_item(&mut self, index: usize) -> Result<PathSeg, GeometryError> {
        self.check_index(index)?;
        let old = self.segs.remove(index);
        self.invalidate();
        trace!(index, total = self.segs.len(), "removed path segment");
        Ok(old)
    }

    pub fn append_item(&mut self, seg: PathSeg) {
        self.segs.push(seg);
        self.invalidate();
    }

    pub fn clear(&mut self) {
        self.segs.clear();
        self.invalidate();
    }

    /// The segment preceding `index`, if any.
    pub fn previous_seg(&self, index: usize) -> Option<&PathSeg> {
        index.checked_sub(1).and_then(|i| self.segs.get(i))
    }

    /// The segment following `index`, if any.
    pub fn next_seg(&self, index: usize) -> Option<&PathSeg> {
        self.segs.get(index + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSeg> {
        self.segs.iter()
    }

    // ==================== Derived geometry ====================

    /// Resolved geometry of the segment at `index`.
    pub fn resolved(&self, index: usize) -> Result<ResolvedSeg, GeometryError> {
        self.check_index(index)?;
        self.ensure_resolved();
        Ok(self.cache.borrow().entries[index])
    }

    /// Absolute endpoint of the segment at `index`.
    pub fn abs_position(&self, index: usize) -> Result<Point, GeometryError> {
        Ok(self.resolved(index)?.end)
    }

    /// Tangent direction at the segment start, degrees.
    pub fn seg_start_angle(&self, index: usize) -> Result<f64, GeometryError> {
        Ok(self.resolved(index)?.start_angle)
    }

    /// Tangent direction at the segment end, degrees.
    pub fn seg_end_angle(&self, index: usize) -> Result<f64, GeometryError> {
        Ok(self.resolved(index)?.end_angle)
    }

    /// Arc length of the segment at `index`.
    pub fn segment_length(&self, index: usize) -> Result<f64, GeometryError> {
        let resolved = self.resolved(index)?;
        let seg = &self.segs[index];
        Ok(segment_arc_length(seg, &resolved))
    }

    /// Total length of the path.
    pub fn total_length(&self) -> f64 {
        self.ensure_resolved();
        let cache = self.cache.borrow();
        self.segs
            .iter()
            .zip(cache.entries.iter())
            .map(|(seg, resolved)| segment_arc_length(seg, resolved))
            .sum()
    }

    /// Point on the segment at normalized parameter `t` in [0, 1].
    pub fn point_at(&self, index: usize, t: f64) -> Result<Point, GeometryError> {
        let r = self.resolved(index)?;
        let seg = &self.segs[index];
        Ok(sample_segment(seg, &r, t))
    }

    /// Flatten to polylines, one per subpath. Curves are sampled with
    /// `curve_steps` fixed parameter steps.
    pub fn flatten(&self, curve_steps: usize) -> Vec<Vec<Point>> {
        self.ensure_resolved();
        let cache = self.cache.borrow();
        let steps = curve_steps.max(1);

        let mut subpaths = Vec::new();
        let mut current: Vec<Point> = Vec::new();

        for (seg, resolved) in self.segs.iter().zip(cache.entries.iter()) {
            if seg.is_move_to() {
                if current.len() > 1 {
                    subpaths.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current.push(resolved.end);
                continue;
            }
            if current.is_empty() {
                current.push(resolved.start);
            }
            if seg.is_curve() {
                for step in 1..=steps {
                    let t = step as f64 / steps as f64;
                    current.push(sample_segment(seg, resolved, t));
                }
            } else {
                current.push(resolved.end);
            }
        }
        if current.len() > 1 {
            subpaths.push(current);
        }

        subpaths
    }

    /// Marker vertices: the absolute endpoint of every segment, the
    /// initial moveto included.
    pub fn vertex_positions(&self) -> Vec<Point> {
        self.ensure_resolved();
        self.cache
            .borrow()
            .entries
            .iter()
            .map(|r| r.end)
            .collect()
    }

    /// Serialize back to path-data text.
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        for seg in &self.segs {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push(seg.letter());
            let params = seg_parameters(seg);
            for value in params {
                out.push(' ');
                out.push_str(&format_number(value));
            }
        }
        out
    }

    /// Inclusive segment-index range of the subpath containing `index`.
    fn subpath_range(&self, index: usize) -> (usize, usize) {
        let mut start = index;
        while start > 0 && !self.segs[start].is_move_to() {
            start -= 1;
        }
        let mut end = index;
        while end + 1 < self.segs.len() && !self.segs[end + 1].is_move_to() {
            end += 1;
        }
        (start, end)
    }

    fn ensure_resolved(&self) {
        let mut cache = self.cache.borrow_mut();
        if cache.valid && cache.generation == self.generation {
            return;
        }
        cache.entries = resolve_chain(&self.segs);
        cache.generation = self.generation;
        cache.valid = true;
    }
}

impl MarkerHost for PathSegList {
    fn marker_positions(&self) -> Vec<Point> {
        self.vertex_positions()
    }

    /// Outgoing tangent at the vertex: the start angle of the following
    /// segment, wrapping around a closed subpath at its final vertex.
    fn start_angle(&self, index: usize) -> f64 {
        if index >= self.segs.len() {
            return 0.0;
        }
        self.ensure_resolved();
        let cache = self.cache.borrow();
        let (first, last) = self.subpath_range(index);

        if index < last {
            return cache.entries[index + 1].start_angle;
        }
        // Final vertex of the subpath.
        if matches!(self.segs[last], PathSeg::ClosePath) {
            let wrapped = if self.segs[first].is_move_to() && first + 1 <= last {
                first + 1
            } else {
                first
            };
            return cache.entries[wrapped].start_angle;
        }
        cache.entries[index].end_angle
    }

    /// Incoming tangent at the vertex: the end angle of the segment,
    /// borrowing the closing segment's end angle at a closed subpath's
    /// initial vertex.
    fn end_angle(&self, index: usize) -> f64 {
        if index >= self.segs.len() {
            return 0.0;
        }
        self.ensure_resolved();
        let cache = self.cache.borrow();

        if !self.segs[index].is_move_to() {
            return cache.entries[index].end_angle;
        }
        let (_, last) = self.subpath_range(index);
        if matches!(self.segs[last], PathSeg::ClosePath) {
            return cache.entries[last].end_angle;
        }
        // Open subpath head: fall back to the outgoing direction.
        if index < last {
            cache.entries[index + 1].start_angle
        } else {
            cache.entries[index].end_angle
        }
    }
}

// ==================== Chain resolution ====================

fn direction_angle(from: Point, to: Point) -> Option<f64> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        None
    } else {
        Some(dy.atan2(dx).to_degrees())
    }
}

/// Tangent directions of a cubic segment, from the parametric derivative.
/// Coincident control points fall through to the next direction source.
fn cubic_tangents(p0: Point, c1: Point, c2: Point, p1: Point) -> (Option<f64>, Option<f64>) {
    let start = direction_angle(p0, c1)
        .or_else(|| direction_angle(p0, c2))
        .or_else(|| direction_angle(p0, p1));
    let end = direction_angle(c2, p1)
        .or_else(|| direction_angle(c1, p1))
        .or_else(|| direction_angle(p0, p1));
    (start, end)
}

fn quadratic_tangents(p0: Point, c: Point, p1: Point) -> (Option<f64>, Option<f64>) {
    let start = direction_angle(p0, c).or_else(|| direction_angle(p0, p1));
    let end = direction_angle(c, p1).or_else(|| direction_angle(p0, p1));
    (start, end)
}

/// Endpoint-to-center conversion for an elliptical arc.
///
/// Returns None when the arc degenerates (coincident endpoints or a zero
/// radius), in which case the segment behaves as a straight line.
fn arc_center_parameters(
    start: Point,
    rx: f64,
    ry: f64,
    x_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    end: Point,
) -> Option<ArcGeometry> {
    if start == end {
        return None;
    }
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if rx == 0.0 || ry == 0.0 {
        return None;
    }

    let phi = x_rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    let half_dx = (start.x - end.x) / 2.0;
    let half_dy = (start.y - end.y) / 2.0;
    let x1p = cos_phi * half_dx + sin_phi * half_dy;
    let y1p = -sin_phi * half_dx + cos_phi * half_dy;

    // Scale radii up when no ellipse of the given radii can reach.
    let lambda = (x1p / rx).powi(2) + (y1p / ry).powi(2);
    if lambda > 1.0 {
        let scale = lambda.sqrt();
        rx *= scale;
        ry *= scale;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;

    let numerator = rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2;
    let denominator = rx2 * y1p2 + ry2 * x1p2;
    let radicand = (numerator / denominator).max(0.0);
    let sign = if large_arc != sweep { 1.0 } else { -1.0 };
    let coefficient = sign * radicand.sqrt();

    let cxp = coefficient * rx * y1p / ry;
    let cyp = -coefficient * ry * x1p / rx;

    let cx = cos_phi * cxp - sin_phi * cyp + (start.x + end.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (start.y + end.y) / 2.0;

    let theta1 = ((y1p - cyp) / ry).atan2((x1p - cxp) / rx);
    let theta2 = ((-y1p - cyp) / ry).atan2((-x1p - cxp) / rx);

    let two_pi = std::f64::consts::TAU;
    let mut delta = (theta2 - theta1) % two_pi;
    if !sweep && delta > 0.0 {
        delta -= two_pi;
    } else if sweep && delta < 0.0 {
        delta += two_pi;
    }

    Some(ArcGeometry {
        cx,
        cy,
        rx,
        ry,
        phi,
        theta1,
        delta,
    })
}

/// One pass over the segment chain, resolving endpoints, control points,
/// and tangent angles.
///
/// Zero-length segments with no directional control points inherit the
/// predecessor's end angle; a degenerate segment at the head of the path
/// reports 0 degrees.
fn resolve_chain(segs: &[PathSeg]) -> Vec<ResolvedSeg> {
    let mut entries = Vec::with_capacity(segs.len());

    let mut cur = Point::ZERO;
    let mut subpath_start = Point::ZERO;
    let mut prev_cubic_ctrl: Option<Point> = None;
    let mut prev_quad_ctrl: Option<Point> = None;
    let mut prev_angle = 0.0f64;

    for seg in segs {
        let start = cur;
        let mut ctrl1 = None;
        let mut ctrl2 = None;
        let mut arc = None;
        let mut next_cubic_ctrl = None;
        let mut next_quad_ctrl = None;

        let (end, angles): (Point, (Option<f64>, Option<f64>)) = match *seg {
            PathSeg::MoveToAbs { x, y } => {
                let end = Point::new(x, y);
                subpath_start = end;
                (end, (None, None))
            }
            PathSeg::MoveToRel { x, y } => {
                let end = Point::new(start.x + x, start.y + y);
                subpath_start = end;
                (end, (None, None))
            }
            PathSeg::LineToAbs { x, y } => line_resolution(start, Point::new(x, y)),
            PathSeg::LineToRel { x, y } => {
                line_resolution(start, Point::new(start.x + x, start.y + y))
            }
            PathSeg::LineToHorizontalAbs { x } => line_resolution(start, Point::new(x, start.y)),
            PathSeg::LineToHorizontalRel { x } => {
                line_resolution(start, Point::new(start.x + x, start.y))
            }
            PathSeg::LineToVerticalAbs { y } => line_resolution(start, Point::new(start.x, y)),
            PathSeg::LineToVerticalRel { y } => {
                line_resolution(start, Point::new(start.x, start.y + y))
            }
            PathSeg::ClosePath => line_resolution(start, subpath_start),
            PathSeg::CurveToCubicAbs {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = Point::new(x1, y1);
                let c2 = Point::new(x2, y2);
                let end = Point::new(x, y);
                ctrl1 = Some(c1);
                ctrl2 = Some(c2);
                next_cubic_ctrl = Some(c2);
                (end, cubic_tangents(start, c1, c2, end))
            }
            PathSeg::CurveToCubicRel {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = Point::new(start.x + x1, start.y + y1);
                let c2 = Point::new(start.x + x2, start.y + y2);
                let end = Point::new(start.x + x, start.y + y);
                ctrl1 = Some(c1);
                ctrl2 = Some(c2);
                next_cubic_ctrl = Some(c2);
                (end, cubic_tangents(start, c1, c2, end))
            }
            PathSeg::CurveToCubicSmoothAbs { x2, y2, x, y } => {
                let c1 = reflect_control(start, prev_cubic_ctrl);
                let c2 = Point::new(x2, y2);
                let end = Point::new(x, y);
                ctrl1 = Some(c1);
                ctrl2 = Some(c2);
                next_cubic_ctrl = Some(c2);
                (end, cubic_tangents(start, c1, c2, end))
            }
            PathSeg::CurveToCubicSmoothRel { x2, y2, x, y } => {
                let c1 = reflect_control(start, prev_cubic_ctrl);
                let c2 = Point::new(start.x + x2, start.y + y2);
                let end = Point::new(start.x + x, start.y + y);
                ctrl1 = Some(c1);
                ctrl2 = Some(c2);
                next_cubic_ctrl = Some(c2);
                (end, cubic_tangents(start, c1, c2, end))
            }
            PathSeg::CurveToQuadraticAbs { x1, y1, x, y } => {
                let c = Point::new(x1, y1);
                let end = Point::new(x, y);
                ctrl1 = Some(c);
                next_quad_ctrl = Some(c);
                (end, quadratic_tangents(start, c, end))
            }
            PathSeg::CurveToQuadraticRel { x1, y1, x, y } => {
                let c = Point::new(start.x + x1, start.y + y1);
                let end = Point::new(start.x + x, start.y + y);
                ctrl1 = Some(c);
                next_quad_ctrl = Some(c);
                (end, quadratic_tangents(start, c, end))
            }
            PathSeg::CurveToQuadraticSmoothAbs { x, y } => {
                let c = reflect_control(start, prev_quad_ctrl);
                let end = Point::new(x, y);
                ctrl1 = Some(c);
                next_quad_ctrl = Some(c);
                (end, quadratic_tangents(start, c, end))
            }
            PathSeg::CurveToQuadraticSmoothRel { x, y } => {
                let c = reflect_control(start, prev_quad_ctrl);
                let end = Point::new(start.x + x, start.y + y);
                ctrl1 = Some(c);
                next_quad_ctrl = Some(c);
                (end, quadratic_tangents(start, c, end))
            }
            PathSeg::ArcAbs {
                rx,
                ry,
                angle,
                large_arc_flag,
                sweep_flag,
                x,
                y,
            } => {
                let end = Point::new(x, y);
                arc = arc_center_parameters(start, rx, ry, angle, large_arc_flag, sweep_flag, end);
                let angles = match &arc {
                    Some(geometry) => (Some(geometry.tangent_at(0.0)), Some(geometry.tangent_at(1.0))),
                    None => {
                        let d = direction_angle(start, end);
                        (d, d)
                    }
                };
                (end, angles)
            }
            PathSeg::ArcRel {
                rx,
                ry,
                angle,
                large_arc_flag,
                sweep_flag,
                x,
                y,
            } => {
                let end = Point::new(start.x + x, start.y + y);
                arc = arc_center_parameters(start, rx, ry, angle, large_arc_flag, sweep_flag, end);
                let angles = match &arc {
                    Some(geometry) => (Some(geometry.tangent_at(0.0)), Some(geometry.tangent_at(1.0))),
                    None => {
                        let d = direction_angle(start, end);
                        (d, d)
                    }
                };
                (end, angles)
            }
        };

        let start_angle = angles.0.unwrap_or(prev_angle);
        let end_angle = angles.1.unwrap_or(start_angle);

        entries.push(ResolvedSeg {
            start,
            end,
            start_angle,
            end_angle,
            subpath_start,
            ctrl1,
            ctrl2,
            arc,
        });

        prev_cubic_ctrl = next_cubic_ctrl;
        prev_quad_ctrl = next_quad_ctrl;
        prev_angle = end_angle;
        cur = end;
    }

    entries
}

fn line_resolution(start: Point, end: Point) -> (Point, (Option<f64>, Option<f64>)) {
    let d = direction_angle(start, end);
    (end, (d, d))
}

/// Reflection of the previous curve's control point about the current
/// point; the current point itself when the previous segment was not a
/// curve of the matching order.
fn reflect_control(current: Point, previous_ctrl: Option<Point>) -> Point {
    match previous_ctrl {
        Some(c) => Point::new(2.0 * current.x - c.x, 2.0 * current.y - c.y),
        None => current,
    }
}

// ==================== Arc length ====================

fn segment_arc_length(seg: &PathSeg, resolved: &ResolvedSeg) -> f64 {
    if seg.is_move_to() {
        return 0.0;
    }
    if !seg.is_curve() {
        return resolved.start.distance(resolved.end);
    }

    match (resolved.ctrl1, resolved.ctrl2, &resolved.arc) {
        (Some(c1), Some(c2), _) => cubic_length(resolved.start, c1, c2, resolved.end),
        (Some(c), None, _) => quadratic_length(resolved.start, c, resolved.end),
        (None, None, Some(arc)) => {
            let speed = ArcSpeed {
                rx: arc.rx,
                ry: arc.ry,
            };
            speed
                .romberg(arc.theta1, arc.theta1 + arc.delta)
                .abs()
        }
        // Degenerate arc: a straight line.
        _ => resolved.start.distance(resolved.end),
    }
}

/// Arc length of a cubic Bezier by integrating the speed function.
///
/// x'(t) and y'(t) are quadratics, so the squared speed is a quartic
/// polynomial handed to the square-root integrator.
fn cubic_length(p0: Point, c1: Point, c2: Point, p1: Point) -> f64 {
    let ax = [
        3.0 * (c1.x - p0.x),
        6.0 * (p0.x - 2.0 * c1.x + c2.x),
        3.0 * (p1.x - p0.x + 3.0 * (c1.x - c2.x)),
    ];
    let ay = [
        3.0 * (c1.y - p0.y),
        6.0 * (p0.y - 2.0 * c1.y + c2.y),
        3.0 * (p1.y - p0.y + 3.0 * (c1.y - c2.y)),
    ];

    let speed_squared = [
        ax[0] * ax[0] + ay[0] * ay[0],
        2.0 * (ax[0] * ax[1] + ay[0] * ay[1]),
        ax[1] * ax[1] + ay[1] * ay[1] + 2.0 * (ax[0] * ax[2] + ay[0] * ay[2]),
        2.0 * (ax[1] * ax[2] + ay[1] * ay[2]),
        ax[2] * ax[2] + ay[2] * ay[2],
    ];

    SqrtPolynomial::new(&speed_squared).romberg(0.0, 1.0)
}

/// Arc length of a quadratic Bezier; the squared speed is quadratic.
fn quadratic_length(p0: Point, c: Point, p1: Point) -> f64 {
    let ax = [2.0 * (c.x - p0.x), 2.0 * (p0.x - 2.0 * c.x + p1.x)];
    let ay = [2.0 * (c.y - p0.y), 2.0 * (p0.y - 2.0 * c.y + p1.y)];

    let speed_squared = [
        ax[0] * ax[0] + ay[0] * ay[0],
        2.0 * (ax[0] * ax[1] + ay[0] * ay[1]),
        ax[1] * ax[1] + ay[1] * ay[1],
    ];

    SqrtPolynomial::new(&speed_squared).romberg(0.0, 1.0)
}

// ==================== Sampling ====================

fn sample_segment(seg: &PathSeg, resolved: &ResolvedSeg, t: f64) -> Point {
    let t = t.clamp(0.0, 1.0);
    if seg.is_move_to() {
        return resolved.end;
    }
    if !seg.is_curve() {
        return lerp_point(resolved.start, resolved.end, t);
    }
    match (resolved.ctrl1, resolved.ctrl2, &resolved.arc) {
        (Some(c1), Some(c2), _) => cubic_point(resolved.start, c1, c2, resolved.end, t),
        (Some(c), None, _) => quadratic_point(resolved.start, c, resolved.end, t),
        (None, None, Some(arc)) => arc.point_at(t),
        _ => lerp_point(resolved.start, resolved.end, t),
    }
}

fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p1.x,
        a * p0.y + b * c1.y + c * c2.y + d * p1.y,
    )
}

fn quadratic_point(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt;
    let b = 2.0 * mt * t;
    let d = t * t;
    Point::new(
        a * p0.x + b * c.x + d * p1.x,
        a * p0.y + b * c.y + d * p1.y,
    )
}

fn seg_parameters(seg: &PathSeg) -> Vec<f64> {
    match *seg {
        PathSeg::ClosePath => vec![],
        PathSeg::MoveToAbs { x, y }
        | PathSeg::MoveToRel { x, y }
        | PathSeg::LineToAbs { x, y }
        | PathSeg::LineToRel { x, y }
        | PathSeg::CurveToQuadraticSmoothAbs { x, y }
        | PathSeg::CurveToQuadraticSmoothRel { x, y } => vec![x, y],
        PathSeg::LineToHorizontalAbs { x } | PathSeg::LineToHorizontalRel { x } => vec![x],
        PathSeg::LineToVerticalAbs { y } | PathSeg::LineToVerticalRel { y } => vec![y],
        PathSeg::CurveToCubicAbs {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        }
        | PathSeg::CurveToCubicRel {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => vec![x1, y1, x2, y2, x, y],
        PathSeg::CurveToQuadraticAbs { x1, y1, x, y }
        | PathSeg::CurveToQuadraticRel { x1, y1, x, y } => vec![x1, y1, x, y],
        PathSeg::CurveToCubicSmoothAbs { x2, y2, x, y }
        | PathSeg::CurveToCubicSmoothRel { x2, y2, x, y } => vec![x2, y2, x, y],
        PathSeg::ArcAbs {
            rx,
            ry,
            angle,
            large_arc_flag,
            sweep_flag,
            x,
            y,
        }
        | PathSeg::ArcRel {
            rx,
            ry,
            angle,
            large_arc_flag,
            sweep_flag,
            x,
            y,
        } => vec![
            rx,
            ry,
            angle,
            if large_arc_flag { 1.0 } else { 0.0 },
            if sweep_flag { 1.0 } else { 0.0 },
            x,
            y,
        ],
    }
}

fn format_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_path_data;

    fn square() -> PathSegList {
        parse_path_data("M 0,0 L 10,0 L 10,10 L 0,10 Z").unwrap()
    }

    #[test]
    fn test_number_of_items_counts_moveto() {
        let list = parse_path_data("M 0,0 L 10,0 L 10,10 Z").unwrap();
        assert_eq!(list.number_of_items(), 4);
    }

    #[test]
    fn test_abs_position_line() {
        let list = parse_path_data("M 0,0 L 10,0").unwrap();
        assert_eq!(list.abs_position(1).unwrap(), Point::new(10.0, 0.0));
        assert_eq!(list.seg_start_angle(1).unwrap(), 0.0);
        assert_eq!(list.seg_end_angle(1).unwrap(), 0.0);
    }

    #[test]
    fn test_relative_chain() {
        let list = parse_path_data("m 1,1 l 2,0 l 0,3").unwrap();
        assert_eq!(list.abs_position(0).unwrap(), Point::new(1.0, 1.0));
        assert_eq!(list.abs_position(1).unwrap(), Point::new(3.0, 1.0));
        assert_eq!(list.abs_position(2).unwrap(), Point::new(3.0, 4.0));
        assert_eq!(list.seg_end_angle(2).unwrap(), 90.0);
    }

    #[test]
    fn test_close_path_returns_to_subpath_start() {
        let list = square();
        assert_eq!(list.abs_position(4).unwrap(), Point::new(0.0, 0.0));
        // Closing edge runs from (0,10) to (0,0): straight up in user space.
        assert_eq!(list.seg_end_angle(4).unwrap(), -90.0);
    }

    #[test]
    fn test_cubic_tangents_from_derivative() {
        // Control points pull the curve upward; the chord is horizontal.
        let list = parse_path_data("M 0,0 C 0,10 10,10 10,0").unwrap();
        assert_eq!(list.seg_start_angle(1).unwrap(), 90.0);
        assert_eq!(list.seg_end_angle(1).unwrap(), -90.0);
    }

    #[test]
    fn test_quadratic_tangent() {
        let list = parse_path_data("M 0,0 Q 10,0 10,10").unwrap();
        assert_eq!(list.seg_start_angle(1).unwrap(), 0.0);
        assert_eq!(list.seg_end_angle(1).unwrap(), 90.0);
    }

    #[test]
    fn test_smooth_cubic_reflects_control() {
        let list = parse_path_data("M 0,0 C 0,5 5,10 10,10 S 20,5 20,0").unwrap();
        let resolved = list.resolved(2).unwrap();
        // Reflection of (5,10) about (10,10).
        assert_eq!(resolved.ctrl1, Some(Point::new(15.0, 10.0)));
    }

    #[test]
    fn test_smooth_without_predecessor_uses_current_point() {
        let list = parse_path_data("M 5,5 S 10,0 10,10").unwrap();
        let resolved = list.resolved(1).unwrap();
        assert_eq!(resolved.ctrl1, Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_zero_length_segment_inherits_angle() {
        let list = parse_path_data("M 0,0 L 10,10 L 10,10").unwrap();
        assert_eq!(list.seg_start_angle(2).unwrap(), 45.0);
        assert_eq!(list.seg_end_angle(2).unwrap(), 45.0);
    }

    #[test]
    fn test_zero_length_at_head_is_zero_degrees() {
        let list = parse_path_data("M 5,5 L 5,5").unwrap();
        assert_eq!(list.seg_start_angle(1).unwrap(), 0.0);
    }

    #[test]
    fn test_line_length_exact() {
        let list = parse_path_data("M 0,0 L 3,4").unwrap();
        assert_eq!(list.segment_length(1).unwrap(), 5.0);
        assert_eq!(list.segment_length(0).unwrap(), 0.0);
    }

    #[test]
    fn test_degenerate_cubic_length_is_chord() {
        // Control points on the chord: the "curve" is a straight line.
        let list = parse_path_data("M 0,0 C 1,0 2,0 3,0").unwrap();
        let length = list.segment_length(1).unwrap();
        assert!((length - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_quadratic_length_reasonable() {
        let list = parse_path_data("M 0,0 Q 5,5 10,0").unwrap();
        let length = list.segment_length(1).unwrap();
        // Longer than the chord, shorter than the control polygon.
        assert!(length > 10.0);
        assert!(length < 10.0 * std::f64::consts::SQRT_2);
    }

    #[test]
    fn test_half_circle_arc_length() {
        let list = parse_path_data("M 0,0 A 5,5 0 0 1 10,0").unwrap();
        let length = list.segment_length(1).unwrap();
        assert!((length - 5.0 * std::f64::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn test_total_length_square() {
        let list = square();
        assert!((list.total_length() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_arc_endpoint_hit() {
        let list = parse_path_data("M 0,0 A 5,5 0 0 1 10,0").unwrap();
        let end = list.point_at(1, 1.0).unwrap();
        assert!((end.x - 10.0).abs() < 1e-9);
        assert!(end.y.abs() < 1e-9);
        // Sweep-positive arc bulges to negative y in user space.
        let mid = list.point_at(1, 0.5).unwrap();
        assert!((mid.x - 5.0).abs() < 1e-9);
        assert!((mid.y + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_mutation_bounds_checks() {
        let mut list = square();
        assert!(matches!(
            list.remove_item(99),
            Err(GeometryError::IndexSize { .. })
        ));
        assert!(matches!(
            list.replace_item(PathSeg::ClosePath, 99),
            Err(GeometryError::IndexSize { .. })
        ));
        assert!(matches!(
            list.get_item(99),
            Err(GeometryError::IndexSize { .. })
        ));
        assert!(list
            .insert_item_before(PathSeg::ClosePath, list.number_of_items() + 1)
            .is_err());
    }

    #[test]
    fn test_mutation_relinks_and_invalidates() {
        let mut list = parse_path_data("M 0,0 L 10,0 L 10,10 Z").unwrap();
        assert_eq!(list.abs_position(2).unwrap(), Point::new(10.0, 10.0));

        list.remove_item(1).unwrap();
        assert_eq!(list.number_of_items(), 3);
        assert_eq!(
            list.previous_seg(1).unwrap().letter(),
            'M',
            "neighbor links follow the renumbered arena"
        );
        assert_eq!(list.abs_position(1).unwrap(), Point::new(10.0, 10.0));

        list.insert_item_before(PathSeg::LineToAbs { x: 5.0, y: 5.0 }, 1)
            .unwrap();
        assert_eq!(list.abs_position(1).unwrap(), Point::new(5.0, 5.0));
        assert_eq!(list.next_seg(1).unwrap().letter(), 'L');
    }

    #[test]
    fn test_parameter_write_invalidates_geometry() {
        let mut list = parse_path_data("M 0,0 L 10,0").unwrap();
        assert_eq!(list.abs_position(1).unwrap(), Point::new(10.0, 0.0));

        if let PathSeg::LineToAbs { x, .. } = list.get_item_mut(1).unwrap() {
            *x = 20.0;
        }
        assert_eq!(list.abs_position(1).unwrap(), Point::new(20.0, 0.0));
    }

    #[test]
    fn test_append_and_initialize() {
        let mut list = PathSegList::new();
        list.initialize(PathSeg::MoveToAbs { x: 1.0, y: 2.0 });
        list.append_item(PathSeg::LineToAbs { x: 4.0, y: 6.0 });
        assert_eq!(list.number_of_items(), 2);
        assert_eq!(list.abs_position(1).unwrap(), Point::new(4.0, 6.0));
    }

    #[test]
    fn test_vertex_positions() {
        let list = parse_path_data("M 0,0 L 10,0 L 10,10 Z").unwrap();
        let vertices = list.vertex_positions();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0], Point::new(0.0, 0.0));
        assert_eq!(vertices[3], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_flatten_subpaths() {
        let list = parse_path_data("M 0,0 L 10,0 M 20,0 L 30,0").unwrap();
        let subpaths = list.flatten(8);
        assert_eq!(subpaths.len(), 2);
        assert_eq!(subpaths[0], vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert_eq!(subpaths[1][0], Point::new(20.0, 0.0));
    }

    #[test]
    fn test_serialization_round_trip() {
        let text = "M 0 0 L 10 0 C 10 5 15 5 15 0 A 2 2 0 0 1 19 0 z";
        let list = parse_path_data(text).unwrap();
        assert_eq!(list.to_svg_string(), text);
    }

    #[test]
    fn test_marker_host_open_path() {
        let list = parse_path_data("M 0,0 L 10,0 L 10,10").unwrap();
        assert_eq!(list.marker_positions().len(), 3);
        // Head vertex: both directions face outgoing.
        assert_eq!(list.start_angle(0), 0.0);
        assert_eq!(list.end_angle(0), 0.0);
        // Tail vertex: both directions face incoming.
        assert_eq!(list.start_angle(2), 90.0);
        assert_eq!(list.end_angle(2), 90.0);
    }

    #[test]
    fn test_marker_host_closed_path_wraps() {
        let list = square();
        let last = list.number_of_items() - 1;
        // Incoming at the shared vertex is the closing edge.
        assert_eq!(list.end_angle(0), -90.0);
        assert_eq!(list.end_angle(last), -90.0);
        // Outgoing wraps to the first drawn edge.
        assert_eq!(list.start_angle(0), 0.0);
        assert_eq!(list.start_angle(last), 0.0);
    }
}
