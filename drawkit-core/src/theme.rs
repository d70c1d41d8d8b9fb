//! The attribute source drawables resolve deferred values against.
//!
//! Resource loading is out of scope for this crate: an external layer hands
//! drawables already-typed values. What remains in scope is *deferral*: a
//! drawable may be configured with attribute names whose values only become
//! known once a theme is applied, and `apply_theme` resolves them through
//! this boundary. The core never consults a theme during steady-state
//! drawing.

use indexmap::IndexMap;
use vello::peniko::Color;

use crate::color::ColorList;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A plain color.
    Color(Color),
    /// A state-dependent color.
    ColorList(ColorList),
    /// A dimension in pixels.
    Dimension(f64),
    /// A unitless float.
    Float(f32),
    /// A fraction of some base (0.0–1.0).
    Fraction(f32),
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i32),
}

/// Supplies typed values for named attributes.
pub trait Theme {
    /// The raw value for `attr`, if the theme defines it.
    fn value(&self, attr: &str) -> Option<&AttrValue>;

    /// The color value for `attr`. A color-list attribute resolves to its
    /// default color.
    fn color(&self, attr: &str) -> Option<Color> {
        match self.value(attr)? {
            AttrValue::Color(color) => Some(*color),
            AttrValue::ColorList(list) => Some(list.default_color()),
            _ => None,
        }
    }

    /// The color-list value for `attr`. A plain color is promoted to a
    /// solid list.
    fn color_list(&self, attr: &str) -> Option<ColorList> {
        match self.value(attr)? {
            AttrValue::ColorList(list) => Some(list.clone()),
            AttrValue::Color(color) => Some(ColorList::solid(*color)),
            _ => None,
        }
    }

    /// The dimension value for `attr`, in pixels.
    fn dimension(&self, attr: &str) -> Option<f64> {
        match self.value(attr)? {
            AttrValue::Dimension(px) => Some(*px),
            _ => None,
        }
    }

    /// The float value for `attr`.
    fn float(&self, attr: &str) -> Option<f32> {
        match self.value(attr)? {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The fraction value for `attr`.
    fn fraction(&self, attr: &str) -> Option<f32> {
        match self.value(attr)? {
            AttrValue::Fraction(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean value for `attr`.
    fn boolean(&self, attr: &str) -> Option<bool> {
        match self.value(attr)? {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer value for `attr`.
    fn integer(&self, attr: &str) -> Option<i32> {
        match self.value(attr)? {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// A [`Theme`] backed by an ordered map of attribute values.
#[derive(Debug, Clone, Default)]
pub struct MapTheme {
    values: IndexMap<String, AttrValue>,
}

impl MapTheme {
    /// Creates an empty theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an attribute value, builder style.
    pub fn with(mut self, attr: impl Into<String>, value: AttrValue) -> Self {
        self.values.insert(attr.into(), value);
        self
    }

    /// Inserts or replaces an attribute value.
    pub fn insert(&mut self, attr: impl Into<String>, value: AttrValue) {
        self.values.insert(attr.into(), value);
    }
}

impl Theme for MapTheme {
    fn value(&self, attr: &str) -> Option<&AttrValue> {
        self.values.get(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookups() {
        let theme = MapTheme::new()
            .with("accent", AttrValue::Color(Color::from_rgb8(10, 20, 30)))
            .with("stroke_width", AttrValue::Dimension(2.0))
            .with("disabled_alpha", AttrValue::Float(0.3));

        assert_eq!(theme.color("accent"), Some(Color::from_rgb8(10, 20, 30)));
        assert_eq!(theme.dimension("stroke_width"), Some(2.0));
        assert_eq!(theme.float("disabled_alpha"), Some(0.3));
        assert_eq!(theme.color("missing"), None);
        // Wrong type does not coerce.
        assert_eq!(theme.dimension("accent"), None);
        // A color promotes to a solid color list.
        let list = theme.color_list("accent").unwrap();
        assert!(!list.is_stateful());
    }
}
