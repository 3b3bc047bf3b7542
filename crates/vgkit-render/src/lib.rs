//! # vgkit Render
//!
//! Display-list adapter at the renderer boundary: walks the SVG element
//! DOM and emits backend-neutral drawing commands.
//!
//! ## Features
//!
//! - **Style resolution**: presentation-attribute inheritance down the tree
//! - **Geometry**: shape-to-path conversion and fixed-step curve flattening
//! - **Paint**: color/currentColor/url() resolution against the document's
//!   paint servers
//! - **Markers**: placement commands from host vertices and tangent angles
//!
//! Per-element error containment lives here, not in the core: a malformed
//! attribute on one element logs a warning and skips that element, and the
//! rest of the document still renders.

use smallvec::SmallVec;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};
use vgkit_dom::{Document, DomError, ElementKind, LengthContext, Node, SvgElement};
use vgkit_geometry::{
    resolve_marker_angle, MarkerHost, MarkerPosition, Matrix, PathSegList, Point,
};
use vgkit_paint::{parse_color, Color, FillRule, LineCap, LineJoin, PaintType, SvgPaint};

/// Fixed parameter steps used to flatten one curve segment.
const CURVE_STEPS: usize = 16;

/// Recursion guard; generous for element nesting, terminates `<use>`
/// reference cycles.
const MAX_REFERENCE_DEPTH: usize = 256;

/// Errors that can occur building a display list.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Document has no root element")]
    EmptyDocument,

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<RenderError> for vgkit_common::VgKitError {
    fn from(err: RenderError) -> Self {
        vgkit_common::VgKitError::render(err.to_string())
    }
}

/// An axis-aligned rectangle in device space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One backend-neutral drawing command.
///
/// Path geometry arrives flattened to point lists, one per subpath, with
/// all transforms applied; a rasterizer or vector backend can consume the
/// list without touching the DOM.
#[derive(Debug, Clone)]
pub enum DisplayCommand {
    FillPath {
        subpaths: Vec<Vec<Point>>,
        color: Color,
        fill_rule: FillRule,
    },
    StrokePath {
        subpaths: Vec<Vec<Point>>,
        color: Color,
        width: f64,
        cap: LineCap,
        join: LineJoin,
        dashes: SmallVec<[f64; 4]>,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f64,
    },
    /// Open point-chain stroke for line and polyline elements.
    Polyline {
        points: Vec<Point>,
        color: Color,
        width: f64,
    },
    /// Text placeholder; shaping and font selection are a backend concern.
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        color: Color,
    },
    /// A marker symbol placement: where, at what angle, at what scale.
    Marker {
        reference: String,
        position: Point,
        angle: f64,
        scale: f64,
    },
}

/// Style state carried down the element tree.
#[derive(Debug, Clone)]
struct RenderStyle {
    fill: SvgPaint,
    stroke: SvgPaint,
    stroke_width: f64,
    fill_rule: FillRule,
    line_cap: LineCap,
    line_join: LineJoin,
    dashes: SmallVec<[f64; 4]>,
    opacity: f64,
    fill_opacity: f64,
    stroke_opacity: f64,
    current_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            fill: SvgPaint::parse("black"),
            stroke: SvgPaint::parse("none"),
            stroke_width: 1.0,
            fill_rule: FillRule::NonZero,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            dashes: SmallVec::new(),
            opacity: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            current_color: Color::BLACK,
        }
    }
}

impl RenderStyle {
    /// Fold the element's presentation attributes into the inherited state.
    fn apply(&mut self, element: &SvgElement, ctx: &LengthContext) -> Result<(), DomError> {
        let style = element.stylable();

        if let Some(text) = style.color() {
            self.current_color =
                parse_color(&text).map_err(|e| DomError::Syntax(e.to_string()))?;
        }
        if let Some(fill) = style.fill() {
            self.fill = fill;
        }
        if let Some(stroke) = style.stroke() {
            self.stroke = stroke;
        }
        if let Some(width) = style.stroke_width(ctx)? {
            self.stroke_width = width;
        }
        if let Some(rule) = style.fill_rule()? {
            self.fill_rule = rule;
        }
        if let Some(cap) = style.line_cap()? {
            self.line_cap = cap;
        }
        if let Some(join) = style.line_join()? {
            self.line_join = join;
        }
        if let Some(dashes) = style.dash_array()? {
            self.dashes = dashes;
        }
        if let Some(opacity) = style.opacity()? {
            // Group opacity composes multiplicatively down the tree.
            self.opacity *= opacity;
        }
        if let Some(opacity) = style.fill_opacity()? {
            self.fill_opacity = opacity;
        }
        if let Some(opacity) = style.stroke_opacity()? {
            self.stroke_opacity = opacity;
        }
        Ok(())
    }
}

/// A display list of drawing commands in document order.
#[derive(Debug, Default)]
pub struct DisplayList {
    pub commands: Vec<DisplayCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a display list by walking the document.
    ///
    /// Conditional processing matches against English (`en`); use
    /// [`DisplayList::build_with_languages`] to render for other locales.
    pub fn build(doc: &Document) -> Result<Self, RenderError> {
        Self::build_with_languages(doc, &["en"])
    }

    pub fn build_with_languages(
        doc: &Document,
        languages: &[&str],
    ) -> Result<Self, RenderError> {
        let root = doc.document_element().ok_or(RenderError::EmptyDocument)?;
        let mut walker = Walker {
            doc,
            ctx: LengthContext::default(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            commands: Vec::new(),
        };
        walker.render_contained(&root, &Matrix::identity(), &RenderStyle::default(), 0);
        Ok(Self {
            commands: walker.commands,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

struct Walker<'a> {
    doc: &'a Document,
    ctx: LengthContext,
    languages: Vec<String>,
    commands: Vec<DisplayCommand>,
}

impl Walker<'_> {
    /// Render one element, containing its errors: a broken element is
    /// logged and skipped, its siblings still render.
    fn render_contained(
        &mut self,
        node: &Rc<Node>,
        matrix: &Matrix,
        style: &RenderStyle,
        depth: usize,
    ) {
        if let Err(err) = self.render_element(node, matrix, style, depth) {
            warn!(
                tag = node.tag_name().unwrap_or("?"),
                error = %err,
                "skipping unrenderable element"
            );
        }
    }

    fn render_element(
        &mut self,
        node: &Rc<Node>,
        matrix: &Matrix,
        style: &RenderStyle,
        depth: usize,
    ) -> Result<(), DomError> {
        if !node.is_element() {
            return Ok(());
        }
        if depth > MAX_REFERENCE_DEPTH {
            return Err(DomError::InvalidModification(
                "reference chain too deep".into(),
            ));
        }

        let element = SvgElement::new(node.clone())?;
        if !element.stylable().visible() {
            return Ok(());
        }
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        if !element.conditional().passes(&languages) {
            return Ok(());
        }

        let mut style = style.clone();
        style.apply(&element, &self.ctx)?;

        let matrix = match element.transformable() {
            Some(transformable) => matrix.multiply(&transformable.matrix()?),
            None => *matrix,
        };

        match element.kind() {
            ElementKind::Svg => {
                let matrix = matrix.multiply(&self.viewport_matrix(&element)?);
                self.render_children(node, &matrix, &style, depth);
            }
            ElementKind::Group => {
                self.render_children(node, &matrix, &style, depth);
            }
            // Definition content renders only by reference.
            ElementKind::Defs
            | ElementKind::Symbol
            | ElementKind::Marker
            | ElementKind::Mask
            | ElementKind::ClipPath
            | ElementKind::LinearGradient
            | ElementKind::RadialGradient
            | ElementKind::Stop => {}
            ElementKind::Use => {
                self.render_use(&element, &matrix, &style, depth)?;
            }
            ElementKind::Text => {
                self.render_text(&element, &matrix, &style)?;
            }
            kind if kind.is_shape() => {
                self.render_shape(&element, &matrix, &style)?;
            }
            _ => {
                debug!(tag = element.tag_name(), "unsupported element");
            }
        }
        Ok(())
    }

    fn render_children(
        &mut self,
        node: &Rc<Node>,
        matrix: &Matrix,
        style: &RenderStyle,
        depth: usize,
    ) {
        for child in node.element_children() {
            self.render_contained(&child, matrix, style, depth + 1);
        }
    }

    /// The viewBox-to-viewport mapping of an `<svg>` element: uniform
    /// scale, centered by the default `xMidYMid meet` policy.
    fn viewport_matrix(&self, element: &SvgElement) -> Result<Matrix, DomError> {
        let view_box = match element.node().get_attribute("viewBox") {
            Some(text) => text,
            None => return Ok(Matrix::identity()),
        };
        let numbers = vgkit_dom::parse_number_list(&view_box)?;
        if numbers.len() != 4 {
            return Err(DomError::Syntax(format!("bad viewBox '{view_box}'")));
        }
        let (min_x, min_y, vb_width, vb_height) =
            (numbers[0], numbers[1], numbers[2], numbers[3]);
        if vb_width <= 0.0 || vb_height <= 0.0 {
            return Err(DomError::Syntax("viewBox with non-positive size".into()));
        }

        let width = element
            .animated_length("width", "100%")?
            .anim_val()
            .to_user_units(&self.ctx);
        let height = element
            .animated_length("height", "100%")?
            .anim_val()
            .to_user_units(&self.ctx);
        let scale = (width / vb_width).min(height / vb_height);

        let tx = (width - vb_width * scale) / 2.0 - min_x * scale;
        let ty = (height - vb_height * scale) / 2.0 - min_y * scale;
        Ok(Matrix::identity().translate(tx, ty).scale(scale, scale))
    }

    fn render_use(
        &mut self,
        element: &SvgElement,
        matrix: &Matrix,
        style: &RenderStyle,
        depth: usize,
    ) -> Result<(), DomError> {
        let href = element
            .node()
            .get_attribute("href")
            .or_else(|| element.node().get_attribute("xlink:href"))
            .ok_or_else(|| DomError::NotFound("use element without href".into()))?;
        let id = Document::local_fragment(&href)
            .ok_or_else(|| DomError::NotSupported(format!("external reference '{href}'")))?;
        let target = self
            .doc
            .get_element_by_id(id)
            .ok_or_else(|| DomError::NotFound(format!("#{id}")))?;

        let x = element
            .animated_length("x", "0")?
            .anim_val()
            .to_user_units(&self.ctx);
        let y = element
            .animated_length("y", "0")?
            .anim_val()
            .to_user_units(&self.ctx);
        let matrix = matrix.multiply(&Matrix::identity().translate(x, y));
        self.render_element(&target, &matrix, style, depth + 1)
    }

    fn render_text(
        &mut self,
        element: &SvgElement,
        matrix: &Matrix,
        style: &RenderStyle,
    ) -> Result<(), DomError> {
        let text = element.node().text_content();
        if text.trim().is_empty() {
            return Ok(());
        }
        let x = element
            .animated_length("x", "0")?
            .anim_val()
            .to_user_units(&self.ctx);
        let y = element
            .animated_length("y", "0")?
            .anim_val()
            .to_user_units(&self.ctx);
        let size = element
            .animated_length("font-size", "16")?
            .anim_val()
            .to_user_units(&self.ctx);
        let Some(color) = self.resolve_paint(&style.fill, style, style.fill_opacity) else {
            return Ok(());
        };
        let (x, y) = matrix.apply(x, y);
        self.commands.push(DisplayCommand::Text {
            text: text.trim().to_string(),
            x,
            y,
            size,
            color,
        });
        Ok(())
    }

    fn render_shape(
        &mut self,
        element: &SvgElement,
        matrix: &Matrix,
        style: &RenderStyle,
    ) -> Result<(), DomError> {
        let Some(geometry) = element.geometry(&self.ctx)? else {
            return Ok(());
        };
        let path = geometry.into_path();
        if path.is_empty() {
            return Ok(());
        }

        let fill = self.resolve_paint(&style.fill, style, style.fill_opacity);
        let stroke = self.resolve_paint(&style.stroke, style, style.stroke_opacity);

        // Axis-aligned unrounded rects keep their rect form.
        if element.kind() == ElementKind::Rect
            && is_axis_aligned(matrix)
            && !element.node().has_attribute("rx")
            && !element.node().has_attribute("ry")
        {
            let rect = transformed_rect(&path, matrix)?;
            if let Some(color) = fill {
                self.commands.push(DisplayCommand::FillRect { rect, color });
            }
            if let Some(color) = stroke {
                self.commands.push(DisplayCommand::StrokeRect {
                    rect,
                    color,
                    width: style.stroke_width,
                });
            }
            self.emit_markers(element, &path, matrix, style.stroke_width)?;
            return Ok(());
        }

        let subpaths: Vec<Vec<Point>> = path
            .flatten(CURVE_STEPS)
            .into_iter()
            .map(|points| points.iter().map(|p| matrix.apply_point(*p)).collect())
            .collect();
        if subpaths.is_empty() {
            self.emit_markers(element, &path, matrix, style.stroke_width)?;
            return Ok(());
        }

        let open_chain = matches!(
            element.kind(),
            ElementKind::Line | ElementKind::Polyline
        );

        if let Some(color) = fill {
            if !open_chain || element.kind() == ElementKind::Polyline {
                self.commands.push(DisplayCommand::FillPath {
                    subpaths: subpaths.clone(),
                    color,
                    fill_rule: style.fill_rule,
                });
            }
        }
        if let Some(color) = stroke {
            if open_chain {
                for points in &subpaths {
                    self.commands.push(DisplayCommand::Polyline {
                        points: points.clone(),
                        color,
                        width: style.stroke_width,
                    });
                }
            } else {
                self.commands.push(DisplayCommand::StrokePath {
                    subpaths,
                    color,
                    width: style.stroke_width,
                    cap: style.line_cap,
                    join: style.line_join,
                    dashes: style.dashes.clone(),
                });
            }
        }

        self.emit_markers(element, &path, matrix, style.stroke_width)?;
        Ok(())
    }

    /// Resolve a paint to a concrete color with the given opacity folded
    /// into the alpha channel. `None` means "do not paint".
    fn resolve_paint(
        &self,
        paint: &SvgPaint,
        style: &RenderStyle,
        component_opacity: f64,
    ) -> Option<Color> {
        let opacity = style.opacity * component_opacity;
        let color = match paint.paint_type() {
            PaintType::None | PaintType::Unknown => None,
            PaintType::CurrentColor => Some(style.current_color),
            PaintType::RgbColor | PaintType::RgbColorIccColor => paint.color(),
            PaintType::Uri | PaintType::UriNone => {
                // No fallback: an unresolvable reference paints nothing.
                self.paint_server_color(paint.uri()?)
            }
            PaintType::UriCurrentColor => self
                .paint_server_color(paint.uri()?)
                .or(Some(style.current_color)),
            PaintType::UriRgbColor | PaintType::UriRgbColorIccColor => {
                self.paint_server_color(paint.uri()?).or(paint.color())
            }
        }?;
        Some(with_alpha(color, opacity))
    }

    /// Look a `url(...)` paint reference up in the document. Gradients
    /// resolve to their first stop's color at this boundary; a raster
    /// backend can upgrade the reference to a real ramp.
    fn paint_server_color(&self, uri: &str) -> Option<Color> {
        let id = Document::local_fragment(uri)?;
        let node = self.doc.get_element_by_id(id)?;
        let element = SvgElement::new(node).ok()?;
        match element.kind() {
            ElementKind::LinearGradient | ElementKind::RadialGradient => element
                .node()
                .element_children()
                .into_iter()
                .find(|child| child.tag_name() == Some("stop"))
                .and_then(|stop| stop.get_attribute("stop-color"))
                .and_then(|text| parse_color(&text).ok()),
            _ => {
                debug!(reference = id, "unsupported paint server");
                None
            }
        }
    }

    fn emit_markers(
        &mut self,
        element: &SvgElement,
        path: &PathSegList,
        matrix: &Matrix,
        stroke_width: f64,
    ) -> Result<(), DomError> {
        let positions = path.marker_positions();
        if positions.is_empty() {
            return Ok(());
        }
        let last = positions.len() - 1;

        for (attr, class) in [
            ("marker-start", MarkerPosition::Start),
            ("marker-mid", MarkerPosition::Mid),
            ("marker-end", MarkerPosition::End),
        ] {
            let Some(value) = element.node().get_attribute(attr) else {
                continue;
            };
            let Some(id) = Document::local_fragment(&value) else {
                continue;
            };
            let Some(marker_node) = self.doc.get_element_by_id(id) else {
                debug!(reference = id, "marker reference not found");
                continue;
            };
            let Some(view) = SvgElement::new(marker_node)?.marker_view()? else {
                continue;
            };
            let scale = view.units.scale(stroke_width);

            let vertices: Vec<usize> = match class {
                MarkerPosition::Start => vec![0],
                MarkerPosition::End => vec![last],
                MarkerPosition::Mid => (1..last).collect(),
            };
            for vertex in vertices {
                let angle = resolve_marker_angle(path, vertex, class, view.orient);
                self.commands.push(DisplayCommand::Marker {
                    reference: id.to_string(),
                    position: matrix.apply_point(positions[vertex]),
                    angle,
                    scale,
                });
            }
        }
        Ok(())
    }
}

fn with_alpha(color: Color, opacity: f64) -> Color {
    Color {
        a: (color.a as f64 * opacity.clamp(0.0, 1.0)) as f32,
        ..color
    }
}

fn is_axis_aligned(matrix: &Matrix) -> bool {
    matrix.b == 0.0 && matrix.c == 0.0 && matrix.a > 0.0 && matrix.d > 0.0
}

/// Device-space rect of an unrounded rect path under an axis-aligned
/// transform, read back from its corner vertices.
fn transformed_rect(path: &PathSegList, matrix: &Matrix) -> Result<Rect, DomError> {
    let origin = matrix.apply_point(path.abs_position(0)?);
    let opposite = matrix.apply_point(path.abs_position(2)?);
    Ok(Rect {
        x: origin.x,
        y: origin.y,
        width: opposite.x - origin.x,
        height: opposite.y - origin.y,
    })
}
