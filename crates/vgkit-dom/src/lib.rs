//! # vgkit DOM
//!
//! SVG document object model for the vgkit engine: a generic XML node
//! tree, a typed element layer, and lazy "animated" attribute resolution.
//!
//! ## Design Goals
//!
//! 1. **Generic node tree**: elements, text, comments over an arena map
//! 2. **Change tracking**: attribute writes bump a generation counter
//!    that invalidates cached parsed values
//! 3. **Typed elements**: capability views (geometry, style, transform,
//!    conditional processing) instead of a deep interface hierarchy
//! 4. **Lazy parsing**: attribute text is parsed on first access and
//!    cached until the underlying attribute changes
//!
//! ## Architecture
//!
//! ```text
//! Document
//!    └── Node tree (Rc/Weak, NodeId arena map)
//!           └── SvgElement (classified)
//!                  ├── GeometryView   → PathSegList
//!                  ├── Stylable       → SvgPaint, stroke properties
//!                  ├── Transformable  → TransformList
//!                  └── Conditional    → feature/language switches
//! ```

use thiserror::Error;
use vgkit_geometry::GeometryError;

pub mod animated;
pub mod cache;
pub mod element;
pub mod node;
pub mod reader;
pub mod values;

pub use animated::{
    SvgAnimated, SvgAnimatedEnumeration, SvgAnimatedLength, SvgAnimatedLengthList,
    SvgAnimatedNumber, SvgAnimatedNumberList, SvgAnimatedPathData,
    SvgAnimatedPreserveAspectRatio, SvgAnimatedTransformList,
};
pub use cache::{CachedResource, ResourceCache};
pub use element::{
    Conditional, ElementKind, GeometryView, MarkerElement, MaskElement, Stylable, SvgElement,
    Transformable,
};
pub use node::{Document, Node, NodeId, NodeKind};
pub use values::{
    parse_length_list, parse_number_list, Align, LengthContext, LengthUnit, MeetOrSlice,
    PreserveAspectRatio, SvgLength,
};

/// Errors that can occur in DOM operations.
///
/// The taxonomy distinguishes malformed value text (syntax), illegal
/// names (invalid character), contradictory mutations, out-of-range list
/// access, missing referents, and recognized-but-unimplemented features.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Index {index} out of range (size {size})")]
    IndexSize { index: usize, size: usize },

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Invalid character in name: {0}")]
    InvalidCharacter(String),

    #[error("Invalid modification: {0}")]
    InvalidModification(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Node belongs to a different document")]
    WrongDocument,
}

impl From<GeometryError> for DomError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::Syntax { offset, message } => {
                DomError::Syntax(format!("{message} (at offset {offset})"))
            }
            GeometryError::IndexSize { index, len } => DomError::IndexSize { index, size: len },
            GeometryError::InvalidValue(message) => DomError::Syntax(message),
        }
    }
}

impl From<DomError> for vgkit_common::VgKitError {
    fn from(err: DomError) -> Self {
        vgkit_common::VgKitError::dom(err.to_string())
    }
}
