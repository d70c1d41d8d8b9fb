//! State-dependent color lists, color filters and blend modes.

use vello::peniko::Color;

use crate::state::{StateSet, StateSpec};

/// Blend modes usable for color filters and tinting.
///
/// The source is the filter/tint color, the destination is the drawable's
/// own paint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source drawn over the destination.
    SrcOver,
    /// Source kept where the destination is opaque. The default tint mode.
    #[default]
    SrcIn,
    /// Source drawn over the destination, clipped to the destination.
    SrcAtop,
    /// Channel-wise product.
    Multiply,
    /// Channel-wise screen.
    Screen,
    /// Channel-wise saturating addition.
    Add,
}

/// A color plus a blend mode, applied to a drawable's paint output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFilter {
    /// The filter (source) color.
    pub color: Color,
    /// How the filter color combines with the paint color.
    pub mode: BlendMode,
}

impl ColorFilter {
    /// Creates a filter from a color and a blend mode.
    pub fn new(color: Color, mode: BlendMode) -> Self {
        Self { color, mode }
    }

    /// Applies the filter to a solid paint color.
    pub fn apply(&self, dst: Color) -> Color {
        let s = self.color.components;
        let d = dst.components;
        let (sa, da) = (s[3], d[3]);

        let blend = |f: &dyn Fn(f32, f32) -> f32| {
            Color::new([f(s[0], d[0]), f(s[1], d[1]), f(s[2], d[2]), f(sa, da)])
        };

        match self.mode {
            BlendMode::SrcOver => {
                let a = sa + da * (1.0 - sa);
                let ch = |sc: f32, dc: f32| sc * sa + dc * da * (1.0 - sa);
                unpremultiply([ch(s[0], d[0]), ch(s[1], d[1]), ch(s[2], d[2])], a)
            }
            BlendMode::SrcIn => Color::new([s[0], s[1], s[2], sa * da]),
            BlendMode::SrcAtop => {
                let ch = |sc: f32, dc: f32| sc * sa + dc * (1.0 - sa);
                Color::new([ch(s[0], d[0]), ch(s[1], d[1]), ch(s[2], d[2]), da])
            }
            BlendMode::Multiply => blend(&|a, b| a * b),
            BlendMode::Screen => blend(&|a, b| a + b - a * b),
            BlendMode::Add => blend(&|a, b| (a + b).min(1.0)),
        }
    }
}

fn unpremultiply(premul: [f32; 3], alpha: f32) -> Color {
    if alpha <= 0.0 {
        return Color::TRANSPARENT;
    }
    Color::new([premul[0] / alpha, premul[1] / alpha, premul[2] / alpha, alpha])
}

/// A state-dependent color: an ordered list of (spec, color) entries plus a
/// default used when nothing matches.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorList {
    entries: Vec<(StateSpec, Color)>,
    default_color: Color,
}

impl ColorList {
    /// A list that resolves to `color` in every state.
    pub fn solid(color: Color) -> Self {
        Self {
            entries: vec![(StateSpec::WILDCARD, color)],
            default_color: color,
        }
    }

    /// Builds a list from (spec, color) entries, first match wins.
    ///
    /// The default color is the first entry whose spec is the wildcard, or
    /// the first entry when none is.
    pub fn new(entries: Vec<(StateSpec, Color)>) -> Self {
        let default_color = entries
            .iter()
            .find(|(spec, _)| spec.is_wildcard())
            .or_else(|| entries.first())
            .map(|(_, color)| *color)
            .unwrap_or(Color::TRANSPARENT);
        Self {
            entries,
            default_color,
        }
    }

    /// The color for the given state vector.
    pub fn color_for_state(&self, state: StateSet) -> Color {
        self.entries
            .iter()
            .find(|(spec, _)| spec.matches(state))
            .map(|(_, color)| *color)
            .unwrap_or(self.default_color)
    }

    /// The color used when no entry matches.
    pub fn default_color(&self) -> Color {
        self.default_color
    }

    /// Whether the resolved color can change with the state vector.
    pub fn is_stateful(&self) -> bool {
        self.entries.iter().any(|(spec, _)| !spec.is_wildcard())
    }

    /// Whether every entry is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.entries.iter().all(|(_, color)| is_opaque(*color))
    }
}

/// Whether a color's alpha channel is fully opaque.
pub fn is_opaque(color: Color) -> bool {
    color.components[3] >= 1.0
}

/// Modulates a paint alpha by a drawable alpha.
///
/// Keeps the integer ramp of the original so 0xFF maps to 0xFF exactly:
/// `scale = alpha + (alpha >> 7); out = paint * scale >> 8`.
pub fn modulate_alpha(paint_alpha: u8, alpha: u8) -> u8 {
    let scale = alpha as u32 + ((alpha as u32) >> 7);
    ((paint_alpha as u32 * scale) >> 8) as u8
}
