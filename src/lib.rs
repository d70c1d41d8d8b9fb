#![warn(missing_docs)]

//! Retained-mode 2D drawable framework for Rust.
//!
//! A drawable is a renderable unit with bounds, a state set, a level and an
//! alpha, drawn into an abstract [`Canvas`](core::canvas::Canvas). Drawables
//! compose: containers select one child at a time (optionally cross-fading),
//! layer stacks composite several children with per-layer insets, and
//! animated variants advance themselves from a monotonic clock so every
//! animation is deterministic and testable without a display.

pub use drawkit_core as core;
pub use drawkit_drawables as drawables;

pub use vello::kurbo;
pub use vello::peniko;

/// The most common types needed to build and drive drawables.
///
/// ```rust
/// use drawkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::canvas::{Canvas, SceneCanvas};
    pub use crate::core::clock::{Clock, ManualClock, UptimeClock};
    pub use crate::core::color::{BlendMode, ColorFilter, ColorList};
    pub use crate::core::drawable::{
        Animatable, Drawable, DrawableCallback, DrawableState, Opacity,
    };
    pub use crate::core::geometry::Insets;
    pub use crate::core::state::{StateSet, StateSpec};
    pub use crate::core::theme::{MapTheme, Theme};

    pub use crate::drawables::animated_rotate::AnimatedRotateDrawable;
    pub use crate::drawables::animated_state_list::AnimatedStateListDrawable;
    pub use crate::drawables::animation::AnimationDrawable;
    pub use crate::drawables::bitmap::{BitmapDrawable, Gravity, TileMode};
    pub use crate::drawables::container::DrawableContainer;
    pub use crate::drawables::inset::InsetDrawable;
    pub use crate::drawables::layer::LayerDrawable;
    pub use crate::drawables::nine_patch::{NinePatchChunk, NinePatchDrawable};
    pub use crate::drawables::progress::{
        HorizontalProgressDrawable, IndeterminateProgressDrawable, ProgressBarDrawable,
    };
    pub use crate::drawables::ripple::RippleDrawable;
    pub use crate::drawables::shape::{
        GradientKind, Orientation, RadiusKind, ShapeDrawable, ShapeKind,
    };
    pub use crate::drawables::state_list::StateListDrawable;
    pub use crate::drawables::transition::TransitionDrawable;
}
