//! The typed SVG element layer.
//!
//! An [`SvgElement`] wraps a node and classifies it by tag name. Instead
//! of a deep interface hierarchy, behavior is exposed through capability
//! views queried per concern: geometry for shapes, style for presentation
//! attributes, transforms, conditional processing, and the marker/mask
//! reference boxes. Parsed attribute values are cached on the element
//! stamped with the node's attribute generation; a write to the attribute
//! invalidates the cache and the next access re-parses.

use crate::animated::{
    SvgAnimatedEnumeration, SvgAnimatedLength, SvgAnimatedLengthList, SvgAnimatedNumber,
    SvgAnimatedNumberList, SvgAnimatedPathData, SvgAnimatedPreserveAspectRatio,
    SvgAnimatedTransformList,
};
use crate::node::Node;
use crate::values::{
    parse_length_list, parse_number_list, LengthContext, PreserveAspectRatio, SvgLength,
};
use crate::DomError;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use vgkit_geometry::{
    parse_path_data, parse_points, MarkerOrient, MarkerUnits, Matrix, PathSeg, PathSegList,
    TransformList,
};
use vgkit_paint::{FillRule, LineCap, LineJoin, SvgPaint};

/// Classification of an SVG element by tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Svg,
    Group,
    Defs,
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Text,
    Use,
    Marker,
    Mask,
    ClipPath,
    LinearGradient,
    RadialGradient,
    Stop,
    Symbol,
    Unknown,
}

impl ElementKind {
    pub fn classify(tag_name: &str) -> Self {
        match tag_name {
            "svg" => ElementKind::Svg,
            "g" => ElementKind::Group,
            "defs" => ElementKind::Defs,
            "path" => ElementKind::Path,
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "text" => ElementKind::Text,
            "use" => ElementKind::Use,
            "marker" => ElementKind::Marker,
            "mask" => ElementKind::Mask,
            "clipPath" => ElementKind::ClipPath,
            "linearGradient" => ElementKind::LinearGradient,
            "radialGradient" => ElementKind::RadialGradient,
            "stop" => ElementKind::Stop,
            "symbol" => ElementKind::Symbol,
            _ => ElementKind::Unknown,
        }
    }

    /// Whether the element draws geometry of its own.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            ElementKind::Path
                | ElementKind::Rect
                | ElementKind::Circle
                | ElementKind::Ellipse
                | ElementKind::Line
                | ElementKind::Polyline
                | ElementKind::Polygon
        )
    }

    /// Whether the element renders its children in place. Definition
    /// containers (defs, symbol, marker, mask, clipPath, gradients) hold
    /// content that is only rendered by reference.
    pub fn is_rendered_container(&self) -> bool {
        matches!(self, ElementKind::Svg | ElementKind::Group)
    }
}

#[derive(Debug, Default)]
struct AttrCache {
    lengths: HashMap<String, (u64, SvgLength)>,
    numbers: HashMap<String, (u64, f64)>,
    number_lists: HashMap<String, (u64, Vec<f64>)>,
    length_lists: HashMap<String, (u64, Vec<SvgLength>)>,
    path_data: Option<(u64, PathSegList)>,
    transform: Option<(u64, TransformList)>,
    aspect_ratio: Option<(u64, PreserveAspectRatio)>,
}

/// A typed view over an element node.
pub struct SvgElement {
    node: Rc<Node>,
    kind: ElementKind,
    cache: RefCell<AttrCache>,
}

impl SvgElement {
    /// Wrap an element node. Non-element nodes are rejected.
    pub fn new(node: Rc<Node>) -> Result<Self, DomError> {
        let kind = match node.tag_name() {
            Some(tag) => ElementKind::classify(tag),
            None => {
                return Err(DomError::InvalidModification(
                    "only element nodes carry SVG semantics".into(),
                ));
            }
        };
        Ok(Self {
            node,
            kind,
            cache: RefCell::new(AttrCache::default()),
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn node(&self) -> &Rc<Node> {
        &self.node
    }

    pub fn tag_name(&self) -> &str {
        self.node.tag_name().unwrap_or_default()
    }

    // ==================== Animated attribute wrappers ====================

    /// The element's length attribute as a base/animated pair.
    ///
    /// An unset attribute takes `default` (the per-attribute default from
    /// the SVG definition, e.g. `"0"` for marker `refX`, `"120%"` for mask
    /// `width`); malformed attribute text is a syntax error, never a
    /// silent fallback.
    pub fn animated_length(
        &self,
        name: &str,
        default: &str,
    ) -> Result<SvgAnimatedLength, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, value)) = self.cache.borrow().lengths.get(name) {
            if *stamp == generation {
                return Ok(SvgAnimatedLength::new(*value));
            }
        }
        let text = self.node.get_attribute(name);
        let value = SvgLength::parse(text.as_deref().unwrap_or(default))?;
        self.cache
            .borrow_mut()
            .lengths
            .insert(name.to_string(), (generation, value));
        Ok(SvgAnimatedLength::new(value))
    }

    /// The element's number attribute as a base/animated pair.
    pub fn animated_number(&self, name: &str, default: f64) -> Result<SvgAnimatedNumber, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, value)) = self.cache.borrow().numbers.get(name) {
            if *stamp == generation {
                return Ok(SvgAnimatedNumber::new(*value));
            }
        }
        let value = match self.node.get_attribute(name) {
            Some(text) => text
                .trim()
                .parse()
                .map_err(|_| DomError::Syntax(format!("bad number '{text}' in '{name}'")))?,
            None => default,
        };
        self.cache
            .borrow_mut()
            .numbers
            .insert(name.to_string(), (generation, value));
        Ok(SvgAnimatedNumber::new(value))
    }

    /// A whitespace/comma-separated number-list attribute as a
    /// base/animated pair; unset parses as empty.
    pub fn animated_number_list(&self, name: &str) -> Result<SvgAnimatedNumberList, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, list)) = self.cache.borrow().number_lists.get(name) {
            if *stamp == generation {
                return Ok(SvgAnimatedNumberList::new(list.clone()));
            }
        }
        let text = self.node.get_attribute(name).unwrap_or_default();
        let list = parse_number_list(&text)?;
        self.cache
            .borrow_mut()
            .number_lists
            .insert(name.to_string(), (generation, list.clone()));
        Ok(SvgAnimatedNumberList::new(list))
    }

    /// A length-list attribute as a base/animated pair; unset parses as
    /// empty.
    pub fn animated_length_list(&self, name: &str) -> Result<SvgAnimatedLengthList, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, list)) = self.cache.borrow().length_lists.get(name) {
            if *stamp == generation {
                return Ok(SvgAnimatedLengthList::new(list.clone()));
            }
        }
        let text = self.node.get_attribute(name).unwrap_or_default();
        let list = parse_length_list(&text)?;
        self.cache
            .borrow_mut()
            .length_lists
            .insert(name.to_string(), (generation, list.clone()));
        Ok(SvgAnimatedLengthList::new(list))
    }

    /// An enumerated keyword attribute as a base/animated pair, parsed by
    /// the keyword set's own grammar.
    pub fn animated_enumeration<T, F>(
        &self,
        name: &str,
        default: T,
        parse: F,
    ) -> Result<SvgAnimatedEnumeration<T>, DomError>
    where
        T: Clone,
        F: FnOnce(&str) -> Result<T, DomError>,
    {
        let value = match self.node.get_attribute(name) {
            Some(text) => parse(&text)?,
            None => default,
        };
        Ok(SvgAnimatedEnumeration::new(value))
    }

    /// The parsed `d` attribute as a base/animated pair.
    pub fn animated_path_data(&self) -> Result<SvgAnimatedPathData, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, list)) = &self.cache.borrow().path_data {
            if *stamp == generation {
                return Ok(SvgAnimatedPathData::new(list.clone()));
            }
        }
        let text = self.node.get_attribute("d").unwrap_or_default();
        let list = parse_path_data(&text)?;
        self.cache.borrow_mut().path_data = Some((generation, list.clone()));
        Ok(SvgAnimatedPathData::new(list))
    }

    /// The parsed `transform` attribute as a base/animated pair.
    pub fn animated_transform(&self) -> Result<SvgAnimatedTransformList, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, list)) = &self.cache.borrow().transform {
            if *stamp == generation {
                return Ok(SvgAnimatedTransformList::new(list.clone()));
            }
        }
        let text = self.node.get_attribute("transform").unwrap_or_default();
        let list = TransformList::parse(&text)?;
        self.cache.borrow_mut().transform = Some((generation, list.clone()));
        Ok(SvgAnimatedTransformList::new(list))
    }

    /// The parsed `preserveAspectRatio` attribute as a base/animated pair;
    /// defaults to `xMidYMid meet`.
    pub fn animated_preserve_aspect_ratio(
        &self,
    ) -> Result<SvgAnimatedPreserveAspectRatio, DomError> {
        let generation = self.node.attribute_generation();
        if let Some((stamp, value)) = self.cache.borrow().aspect_ratio {
            if stamp == generation {
                return Ok(SvgAnimatedPreserveAspectRatio::new(value));
            }
        }
        let text = self.node.get_attribute("preserveAspectRatio");
        let value = PreserveAspectRatio::parse(text.as_deref().unwrap_or("xMidYMid meet"))?;
        self.cache.borrow_mut().aspect_ratio = Some((generation, value));
        Ok(SvgAnimatedPreserveAspectRatio::new(value))
    }

    // ==================== Capability views ====================

    /// The shape's geometry as a path segment list; `None` for elements
    /// that draw no geometry of their own.
    pub fn geometry(&self, ctx: &LengthContext) -> Result<Option<GeometryView>, DomError> {
        let path = match self.kind {
            ElementKind::Path => self.animated_path_data()?.anim_val(),
            ElementKind::Rect => self.rect_geometry(ctx)?,
            ElementKind::Circle => {
                let cx = self.resolved_length("cx", "0", ctx)?;
                let cy = self.resolved_length("cy", "0", ctx)?;
                let r = self.resolved_length("r", "0", ctx)?;
                if r < 0.0 {
                    return Err(DomError::Syntax("negative circle radius".into()));
                }
                ellipse_path(cx, cy, r, r)
            }
            ElementKind::Ellipse => {
                let cx = self.resolved_length("cx", "0", ctx)?;
                let cy = self.resolved_length("cy", "0", ctx)?;
                let rx = self.resolved_length("rx", "0", ctx)?;
                let ry = self.resolved_length("ry", "0", ctx)?;
                if rx < 0.0 || ry < 0.0 {
                    return Err(DomError::Syntax("negative ellipse radius".into()));
                }
                ellipse_path(cx, cy, rx, ry)
            }
            ElementKind::Line => {
                let x1 = self.resolved_length("x1", "0", ctx)?;
                let y1 = self.resolved_length("y1", "0", ctx)?;
                let x2 = self.resolved_length("x2", "0", ctx)?;
                let y2 = self.resolved_length("y2", "0", ctx)?;
                let mut list = PathSegList::new();
                list.append_item(PathSeg::MoveToAbs { x: x1, y: y1 });
                list.append_item(PathSeg::LineToAbs { x: x2, y: y2 });
                list
            }
            ElementKind::Polyline | ElementKind::Polygon => {
                let text = self.node.get_attribute("points").unwrap_or_default();
                let points = parse_points(&text)?;
                let mut list = PathSegList::new();
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        list.append_item(PathSeg::MoveToAbs { x: p.x, y: p.y });
                    } else {
                        list.append_item(PathSeg::LineToAbs { x: p.x, y: p.y });
                    }
                }
                if self.kind == ElementKind::Polygon && !points.is_empty() {
                    list.append_item(PathSeg::ClosePath);
                }
                list
            }
            _ => return Ok(None),
        };
        Ok(Some(GeometryView {
            kind: self.kind,
            path,
        }))
    }

    fn rect_geometry(&self, ctx: &LengthContext) -> Result<PathSegList, DomError> {
        let x = self.resolved_length("x", "0", ctx)?;
        let y = self.resolved_length("y", "0", ctx)?;
        let width = self.resolved_length("width", "0", ctx)?;
        let height = self.resolved_length("height", "0", ctx)?;
        if width < 0.0 || height < 0.0 {
            return Err(DomError::Syntax("negative rect dimensions".into()));
        }

        // rx/ry default to each other when only one is given.
        let rx_attr = self.node.get_attribute("rx");
        let ry_attr = self.node.get_attribute("ry");
        let mut rx = match &rx_attr {
            Some(_) => self.resolved_length("rx", "0", ctx)?,
            None if ry_attr.is_some() => self.resolved_length("ry", "0", ctx)?,
            None => 0.0,
        };
        let mut ry = match &ry_attr {
            Some(_) => self.resolved_length("ry", "0", ctx)?,
            None if rx_attr.is_some() => rx,
            None => 0.0,
        };
        rx = rx.min(width / 2.0);
        ry = ry.min(height / 2.0);

        let mut list = PathSegList::new();
        if rx <= 0.0 || ry <= 0.0 {
            list.append_item(PathSeg::MoveToAbs { x, y });
            list.append_item(PathSeg::LineToAbs { x: x + width, y });
            list.append_item(PathSeg::LineToAbs {
                x: x + width,
                y: y + height,
            });
            list.append_item(PathSeg::LineToAbs { x, y: y + height });
            list.append_item(PathSeg::ClosePath);
            return Ok(list);
        }

        let arc = |x: f64, y: f64| PathSeg::ArcAbs {
            rx,
            ry,
            angle: 0.0,
            large_arc_flag: false,
            sweep_flag: true,
            x,
            y,
        };
        list.append_item(PathSeg::MoveToAbs { x: x + rx, y });
        list.append_item(PathSeg::LineToAbs {
            x: x + width - rx,
            y,
        });
        list.append_item(arc(x + width, y + ry));
        list.append_item(PathSeg::LineToAbs {
            x: x + width,
            y: y + height - ry,
        });
        list.append_item(arc(x + width - rx, y + height));
        list.append_item(PathSeg::LineToAbs {
            x: x + rx,
            y: y + height,
        });
        list.append_item(arc(x, y + height - ry));
        list.append_item(PathSeg::LineToAbs { x, y: y + ry });
        list.append_item(arc(x + rx, y));
        list.append_item(PathSeg::ClosePath);
        Ok(list)
    }

    fn resolved_length(
        &self,
        name: &str,
        default: &str,
        ctx: &LengthContext,
    ) -> Result<f64, DomError> {
        Ok(self.animated_length(name, default)?.anim_val().to_user_units(ctx))
    }

    /// Presentation attributes.
    pub fn stylable(&self) -> Stylable<'_> {
        Stylable { element: self }
    }

    /// The transform capability; `None` for elements the transform
    /// attribute does not apply to.
    pub fn transformable(&self) -> Option<Transformable> {
        if matches!(self.kind, ElementKind::Stop) {
            return None;
        }
        Some(Transformable { element: self })
    }

    /// The marker-host capability: vertex positions and tangent angles,
    /// available for any element that produces geometry. The returned
    /// list implements [`vgkit_geometry::MarkerHost`].
    pub fn marker_host(&self, ctx: &LengthContext) -> Result<Option<PathSegList>, DomError> {
        Ok(self.geometry(ctx)?.map(GeometryView::into_path))
    }

    /// Conditional-processing attributes.
    pub fn conditional(&self) -> Conditional {
        Conditional {
            required_features: list_attribute(&self.node, "requiredFeatures"),
            required_extensions: list_attribute(&self.node, "requiredExtensions"),
            system_language: self
                .node
                .get_attribute("systemLanguage")
                .map(|text| {
                    text.split(',')
                        .map(|tag| tag.trim().to_string())
                        .filter(|tag| !tag.is_empty())
                        .collect()
                }),
        }
    }

    /// The marker reference box; `None` unless this is a `<marker>`.
    pub fn marker_view(&self) -> Result<Option<MarkerElement>, DomError> {
        if self.kind != ElementKind::Marker {
            return Ok(None);
        }
        let units = self
            .animated_enumeration("markerUnits", MarkerUnits::default(), |text| {
                Ok(MarkerUnits::parse(text)?)
            })?
            .anim_val();
        let orient = self
            .animated_enumeration("orient", MarkerOrient::default(), |text| {
                Ok(MarkerOrient::parse(text)?)
            })?
            .anim_val();
        Ok(Some(MarkerElement {
            ref_x: self.animated_length("refX", "0")?.anim_val(),
            ref_y: self.animated_length("refY", "0")?.anim_val(),
            marker_width: self.animated_length("markerWidth", "3")?.anim_val(),
            marker_height: self.animated_length("markerHeight", "3")?.anim_val(),
            units,
            orient,
        }))
    }

    /// The mask region box; `None` unless this is a `<mask>`.
    pub fn mask_view(&self) -> Result<Option<MaskElement>, DomError> {
        if self.kind != ElementKind::Mask {
            return Ok(None);
        }
        Ok(Some(MaskElement {
            x: self.animated_length("x", "-10%")?.anim_val(),
            y: self.animated_length("y", "-10%")?.anim_val(),
            width: self.animated_length("width", "120%")?.anim_val(),
            height: self.animated_length("height", "120%")?.anim_val(),
        }))
    }
}

fn list_attribute(node: &Node, name: &str) -> Option<Vec<String>> {
    node.get_attribute(name).map(|text| {
        text.split_whitespace()
            .map(str::to_string)
            .collect()
    })
}

/// Geometry produced by a shape element.
pub struct GeometryView {
    kind: ElementKind,
    path: PathSegList,
}

impl GeometryView {
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn path(&self) -> &PathSegList {
        &self.path
    }

    pub fn into_path(self) -> PathSegList {
        self.path
    }
}

/// Presentation-attribute access.
///
/// Accessors return `Ok(None)` for an unset attribute (inheritance is the
/// renderer's concern) and a syntax error for malformed text.
pub struct Stylable<'a> {
    element: &'a SvgElement,
}

impl Stylable<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        self.element.node.get_attribute(name)
    }

    pub fn fill(&self) -> Option<SvgPaint> {
        self.attr("fill").map(|text| SvgPaint::parse(&text))
    }

    pub fn stroke(&self) -> Option<SvgPaint> {
        self.attr("stroke").map(|text| SvgPaint::parse(&text))
    }

    /// The `color` property, the referent of `currentColor` paints.
    pub fn color(&self) -> Option<String> {
        self.attr("color")
    }

    pub fn stroke_width(&self, ctx: &LengthContext) -> Result<Option<f64>, DomError> {
        match self.attr("stroke-width") {
            Some(text) => Ok(Some(SvgLength::parse(&text)?.to_user_units(ctx))),
            None => Ok(None),
        }
    }

    pub fn opacity(&self) -> Result<Option<f64>, DomError> {
        self.parse_opacity("opacity")
    }

    pub fn fill_opacity(&self) -> Result<Option<f64>, DomError> {
        self.parse_opacity("fill-opacity")
    }

    pub fn stroke_opacity(&self) -> Result<Option<f64>, DomError> {
        self.parse_opacity("stroke-opacity")
    }

    fn parse_opacity(&self, name: &str) -> Result<Option<f64>, DomError> {
        match self.attr(name) {
            Some(text) => {
                let value: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| DomError::Syntax(format!("bad opacity '{text}'")))?;
                Ok(Some(value.clamp(0.0, 1.0)))
            }
            None => Ok(None),
        }
    }

    pub fn fill_rule(&self) -> Result<Option<FillRule>, DomError> {
        match self.attr("fill-rule") {
            Some(text) => FillRule::parse(&text)
                .map(Some)
                .map_err(|e| DomError::Syntax(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn line_cap(&self) -> Result<Option<LineCap>, DomError> {
        match self.attr("stroke-linecap") {
            Some(text) => LineCap::parse(&text)
                .map(Some)
                .map_err(|e| DomError::Syntax(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn line_join(&self) -> Result<Option<LineJoin>, DomError> {
        match self.attr("stroke-linejoin") {
            Some(text) => LineJoin::parse(&text)
                .map(Some)
                .map_err(|e| DomError::Syntax(e.to_string())),
            None => Ok(None),
        }
    }

    /// The `stroke-dasharray` value; `none` and an unset attribute both
    /// yield `None`.
    pub fn dash_array(&self) -> Result<Option<SmallVec<[f64; 4]>>, DomError> {
        let Some(text) = self.attr("stroke-dasharray") else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() || text == "none" {
            return Ok(None);
        }
        let mut dashes = SmallVec::new();
        for token in text.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let value: f64 = token
                .parse()
                .map_err(|_| DomError::Syntax(format!("bad dash length '{token}'")))?;
            if value < 0.0 {
                return Err(DomError::Syntax("negative dash length".into()));
            }
            dashes.push(value);
        }
        Ok(Some(dashes))
    }

    pub fn visible(&self) -> bool {
        !matches!(
            self.attr("visibility").as_deref(),
            Some("hidden") | Some("collapse")
        ) && self.attr("display").as_deref() != Some("none")
    }
}

/// The transform capability.
pub struct Transformable<'a> {
    element: &'a SvgElement,
}

impl Transformable<'_> {
    pub fn transform_list(&self) -> Result<TransformList, DomError> {
        Ok(self.element.animated_transform()?.anim_val())
    }

    /// The transform list collapsed to a single matrix.
    pub fn matrix(&self) -> Result<Matrix, DomError> {
        Ok(self.transform_list()?.consolidate())
    }
}

/// Conditional-processing attributes of an element.
///
/// Feature strings are accepted wholesale (this engine does not refuse
/// any SVG static feature); extensions are all unsupported; language
/// matching is by case-insensitive prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    pub required_features: Option<Vec<String>>,
    pub required_extensions: Option<Vec<String>>,
    pub system_language: Option<Vec<String>>,
}

impl Conditional {
    pub fn passes(&self, user_languages: &[&str]) -> bool {
        // A present-but-empty conditional attribute evaluates to false.
        if let Some(features) = &self.required_features {
            if features.is_empty() {
                return false;
            }
        }
        if let Some(extensions) = &self.required_extensions {
            if !extensions.is_empty() {
                return false;
            }
        }
        if let Some(languages) = &self.system_language {
            let matched = languages.iter().any(|tag| {
                user_languages.iter().any(|user| {
                    let user = user.to_ascii_lowercase();
                    let tag = tag.to_ascii_lowercase();
                    user == tag || user.starts_with(&format!("{tag}-")) || tag.starts_with(&format!("{user}-"))
                })
            });
            if !matched {
                return false;
            }
        }
        true
    }
}

/// The reference box of a `<marker>` element, with the attribute defaults
/// of the SVG definition applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerElement {
    pub ref_x: SvgLength,
    pub ref_y: SvgLength,
    pub marker_width: SvgLength,
    pub marker_height: SvgLength,
    pub units: MarkerUnits,
    pub orient: MarkerOrient,
}

/// The region box of a `<mask>` element. The defaults extend the region
/// 10% past the bounding box on every side.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskElement {
    pub x: SvgLength,
    pub y: SvgLength,
    pub width: SvgLength,
    pub height: SvgLength,
}

/// Close the circle/ellipse outline as two arc halves.
fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> PathSegList {
    let mut list = PathSegList::new();
    if rx == 0.0 || ry == 0.0 {
        return list;
    }
    let arc = |x: f64, y: f64| PathSeg::ArcAbs {
        rx,
        ry,
        angle: 0.0,
        large_arc_flag: true,
        sweep_flag: true,
        x,
        y,
    };
    list.append_item(PathSeg::MoveToAbs { x: cx + rx, y: cy });
    list.append_item(arc(cx - rx, cy));
    list.append_item(arc(cx + rx, cy));
    list.append_item(PathSeg::ClosePath);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Document;
    use vgkit_geometry::MarkerHost;
    use vgkit_geometry::Point;

    fn element(markup: &str) -> SvgElement {
        let doc = Document::parse_svg(&format!("<svg>{markup}</svg>")).unwrap();
        let node = doc.document_element().unwrap().element_children()[0].clone();
        SvgElement::new(node).unwrap()
    }

    #[test]
    fn test_classification() {
        assert_eq!(element("<path d=\"M 0 0\"/>").kind(), ElementKind::Path);
        assert_eq!(element("<g/>").kind(), ElementKind::Group);
        assert_eq!(element("<blink/>").kind(), ElementKind::Unknown);
        assert!(ElementKind::Circle.is_shape());
        assert!(!ElementKind::Defs.is_rendered_container());
    }

    #[test]
    fn test_wrapping_non_element_fails() {
        let doc = Document::new();
        let text = doc.create_text("hi");
        assert!(matches!(
            SvgElement::new(text),
            Err(DomError::InvalidModification(_))
        ));
    }

    #[test]
    fn test_length_default_vs_malformed() {
        let el = element("<marker/>");
        // Unset refX takes the documented default.
        let ref_x = el.animated_length("refX", "0").unwrap();
        assert_eq!(ref_x.base_val().value, 0.0);

        // Malformed text is an error, not a default.
        el.node().set_attribute("refX", "wide").unwrap();
        assert!(matches!(
            el.animated_length("refX", "0"),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn test_animated_length_reparses_after_write() {
        let el = element("<rect width=\"10\"/>");
        assert_eq!(el.animated_length("width", "0").unwrap().base_val().value, 10.0);

        el.node().set_attribute("width", "25").unwrap();
        assert_eq!(el.animated_length("width", "0").unwrap().base_val().value, 25.0);
    }

    #[test]
    fn test_animated_path_data_cached_and_invalidated() {
        let el = element("<path d=\"M 0 0 L 10 0\"/>");
        assert_eq!(el.animated_path_data().unwrap().base_val().number_of_items(), 2);

        el.node().set_attribute("d", "M 0 0 L 10 0 L 10 10").unwrap();
        assert_eq!(el.animated_path_data().unwrap().base_val().number_of_items(), 3);
    }

    #[test]
    fn test_animated_lists() {
        let el = element("<text x=\"1 2, 3\" rotate=\"10 20\"/>");
        let xs = el.animated_length_list("x").unwrap().base_val();
        assert_eq!(xs.len(), 3);
        assert_eq!(xs[2].value, 3.0);
        assert_eq!(
            el.animated_number_list("rotate").unwrap().base_val(),
            vec![10.0, 20.0]
        );
        assert!(el.animated_number_list("dy").unwrap().base_val().is_empty());

        el.node().set_attribute("rotate", "10 twenty").unwrap();
        assert!(el.animated_number_list("rotate").is_err());
    }

    #[test]
    fn test_animated_enumeration() {
        let el = element("<marker markerUnits=\"userSpaceOnUse\"/>");
        let units = el
            .animated_enumeration("markerUnits", MarkerUnits::default(), |text| {
                Ok(MarkerUnits::parse(text)?)
            })
            .unwrap();
        assert_eq!(units.base_val(), MarkerUnits::UserSpaceOnUse);
        assert_eq!(units.anim_val(), units.base_val());
    }

    #[test]
    fn test_transformable() {
        let el = element("<g transform=\"translate(3,4)\"/>");
        let matrix = el.transformable().unwrap().matrix().unwrap();
        assert_eq!(matrix.apply(0.0, 0.0), (3.0, 4.0));

        let el = element("<stop/>");
        assert!(el.transformable().is_none());
    }

    #[test]
    fn test_rect_geometry() {
        let el = element("<rect x=\"1\" y=\"2\" width=\"10\" height=\"20\"/>");
        let ctx = LengthContext::default();
        let path = el.geometry(&ctx).unwrap().unwrap().into_path();
        assert_eq!(path.number_of_items(), 5);
        assert_eq!(path.abs_position(0).unwrap(), Point::new(1.0, 2.0));
        assert_eq!(path.abs_position(2).unwrap(), Point::new(11.0, 22.0));
        assert!((path.total_length() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_rounded_rect_geometry() {
        let el = element("<rect width=\"10\" height=\"10\" rx=\"2\"/>");
        let ctx = LengthContext::default();
        let path = el.geometry(&ctx).unwrap().unwrap().into_path();
        // Four edges, four corner arcs, close.
        assert_eq!(path.number_of_items(), 10);
        assert_eq!(path.abs_position(0).unwrap(), Point::new(2.0, 0.0));
    }

    #[test]
    fn test_negative_rect_rejected() {
        let el = element("<rect width=\"-5\" height=\"10\"/>");
        assert!(matches!(
            el.geometry(&LengthContext::default()),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn test_circle_geometry_length() {
        let el = element("<circle cx=\"5\" cy=\"5\" r=\"3\"/>");
        let ctx = LengthContext::default();
        let path = el.geometry(&ctx).unwrap().unwrap().into_path();
        let circumference = 2.0 * std::f64::consts::PI * 3.0;
        assert!((path.total_length() - circumference).abs() < 1e-3);
    }

    #[test]
    fn test_polygon_geometry_closes() {
        let el = element("<polygon points=\"0,0 10,0 10,10\"/>");
        let ctx = LengthContext::default();
        let path = el.geometry(&ctx).unwrap().unwrap().into_path();
        assert_eq!(path.number_of_items(), 4);
        assert_eq!(path.get_item(3).unwrap().letter(), 'z');

        let el = element("<polyline points=\"0,0 10,0 10,10\"/>");
        let path = el.geometry(&ctx).unwrap().unwrap().into_path();
        assert_eq!(path.number_of_items(), 3);
    }

    #[test]
    fn test_group_has_no_geometry() {
        let el = element("<g/>");
        assert!(el.geometry(&LengthContext::default()).unwrap().is_none());
    }

    #[test]
    fn test_marker_host_vertices() {
        let el = element("<line x1=\"0\" y1=\"0\" x2=\"10\" y2=\"0\"/>");
        let host = el
            .marker_host(&LengthContext::default())
            .unwrap()
            .unwrap();
        assert_eq!(host.marker_positions().len(), 2);
    }

    #[test]
    fn test_stylable_accessors() {
        let el = element(
            "<rect fill=\"red\" stroke=\"url(#p) blue\" stroke-width=\"2\" \
             fill-opacity=\"0.5\" stroke-linecap=\"round\" stroke-dasharray=\"4 2\"/>",
        );
        let style = el.stylable();
        let ctx = LengthContext::default();

        assert!(style.fill().unwrap().color().is_some());
        assert_eq!(style.stroke().unwrap().uri(), Some("#p"));
        assert_eq!(style.stroke_width(&ctx).unwrap(), Some(2.0));
        assert_eq!(style.fill_opacity().unwrap(), Some(0.5));
        assert_eq!(style.line_cap().unwrap(), Some(LineCap::Round));
        assert_eq!(style.dash_array().unwrap().unwrap().as_slice(), &[4.0, 2.0]);
        assert_eq!(style.opacity().unwrap(), None);
        assert!(style.visible());
    }

    #[test]
    fn test_stylable_malformed_values() {
        let el = element("<rect stroke-width=\"wide\" fill-rule=\"spiral\"/>");
        assert!(el.stylable().stroke_width(&LengthContext::default()).is_err());
        assert!(el.stylable().fill_rule().is_err());
    }

    #[test]
    fn test_visibility() {
        assert!(!element("<rect visibility=\"hidden\"/>").stylable().visible());
        assert!(!element("<rect display=\"none\"/>").stylable().visible());
        assert!(element("<rect/>").stylable().visible());
    }

    #[test]
    fn test_conditional() {
        let el = element("<g systemLanguage=\"en, fr\"/>");
        assert!(el.conditional().passes(&["en-US"]));
        assert!(!el.conditional().passes(&["de"]));

        let el = element("<g requiredExtensions=\"http://example.com/ext\"/>");
        assert!(!el.conditional().passes(&["en"]));

        let el = element("<g requiredFeatures=\"\"/>");
        assert!(!el.conditional().passes(&["en"]));

        let el = element("<g/>");
        assert!(el.conditional().passes(&["en"]));
    }

    #[test]
    fn test_marker_view_defaults() {
        let el = element("<marker/>");
        let marker = el.marker_view().unwrap().unwrap();
        assert_eq!(marker.ref_x.value, 0.0);
        assert_eq!(marker.marker_width.value, 3.0);
        assert_eq!(marker.units, MarkerUnits::StrokeWidth);
        assert_eq!(marker.orient, MarkerOrient::Angle0);

        assert!(element("<g/>").marker_view().unwrap().is_none());
    }

    #[test]
    fn test_marker_view_explicit() {
        let el = element(
            "<marker refX=\"5\" refY=\"5\" markerWidth=\"10\" markerHeight=\"8\" \
             markerUnits=\"userSpaceOnUse\" orient=\"auto\"/>",
        );
        let marker = el.marker_view().unwrap().unwrap();
        assert_eq!(marker.ref_x.value, 5.0);
        assert_eq!(marker.marker_height.value, 8.0);
        assert_eq!(marker.units, MarkerUnits::UserSpaceOnUse);
        assert_eq!(marker.orient, MarkerOrient::Auto);
    }

    #[test]
    fn test_mask_view_defaults() {
        let el = element("<mask/>");
        let mask = el.mask_view().unwrap().unwrap();
        assert_eq!(mask.x.css_text(), "-10%");
        assert_eq!(mask.width.css_text(), "120%");
    }
}
