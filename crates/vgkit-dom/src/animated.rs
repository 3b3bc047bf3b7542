//! Animated attribute wrappers.
//!
//! Every SVG attribute surfaces as a pair of values: the base value
//! parsed from the live XML attribute, and the animated value after
//! animation is applied. Absent animation the two are equal. Wrappers are
//! built lazily on first access by the owning element and cached there,
//! stamped with the element's attribute generation; a write to the
//! attribute invalidates the cache and the next access re-parses.

use crate::values::{PreserveAspectRatio, SvgLength};
use vgkit_geometry::{PathSegList, TransformList};

/// A base/animated value pair.
///
/// The animated side is `None` until an animator installs an override;
/// [`SvgAnimated::anim_val`] then falls back to the base value, which is
/// the SVG DOM contract for unanimated attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SvgAnimated<T: Clone> {
    base: T,
    animated: Option<T>,
}

impl<T: Clone> SvgAnimated<T> {
    pub fn new(base: T) -> Self {
        Self {
            base,
            animated: None,
        }
    }

    /// The value parsed from the attribute text.
    pub fn base_val(&self) -> T {
        self.base.clone()
    }

    /// The post-animation value; equals the base value absent animation.
    pub fn anim_val(&self) -> T {
        self.animated.clone().unwrap_or_else(|| self.base.clone())
    }

    /// Install an animated override.
    pub fn set_anim_val(&mut self, value: T) {
        self.animated = Some(value);
    }

    /// Drop the animated override, reverting to the base value.
    pub fn clear_anim_val(&mut self) {
        self.animated = None;
    }

    pub fn is_animated(&self) -> bool {
        self.animated.is_some()
    }
}

pub type SvgAnimatedLength = SvgAnimated<SvgLength>;
pub type SvgAnimatedNumber = SvgAnimated<f64>;
pub type SvgAnimatedEnumeration<T> = SvgAnimated<T>;
pub type SvgAnimatedNumberList = SvgAnimated<Vec<f64>>;
pub type SvgAnimatedLengthList = SvgAnimated<Vec<SvgLength>>;
pub type SvgAnimatedTransformList = SvgAnimated<TransformList>;
pub type SvgAnimatedPathData = SvgAnimated<PathSegList>;
pub type SvgAnimatedPreserveAspectRatio = SvgAnimated<PreserveAspectRatio>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::LengthUnit;

    #[test]
    fn test_anim_val_defaults_to_base() {
        let wrapper = SvgAnimatedNumber::new(4.0);
        assert_eq!(wrapper.base_val(), 4.0);
        assert_eq!(wrapper.anim_val(), 4.0);
        assert!(!wrapper.is_animated());
    }

    #[test]
    fn test_animated_override_and_clear() {
        let mut wrapper = SvgAnimatedLength::new(SvgLength::new(10.0, LengthUnit::Px));
        wrapper.set_anim_val(SvgLength::new(20.0, LengthUnit::Px));
        assert_eq!(wrapper.anim_val().value, 20.0);
        assert_eq!(wrapper.base_val().value, 10.0);

        wrapper.clear_anim_val();
        assert_eq!(wrapper.anim_val().value, 10.0);
    }
}
