#![warn(missing_docs)]

//! Drawable variants for drawkit => See the `drawkit` crate.
//!
//! Leaf drawables (shape, bitmap, nine-patch), the selecting container and
//! its state-list/animated-state-list wrappers, layered composites
//! (layer, transition, inset), frame and rotation animations, ripples and
//! progress drawables.

/// Keyframed state selection with animated transitions.
pub mod animated_state_list;

/// A child drawable rotated in discrete timed steps.
pub mod animated_rotate;

/// Frame-by-frame flipbook animation.
pub mod animation;

/// Raster images with gravity and tiling.
pub mod bitmap;

/// The child-selecting container with enter/exit cross-fade.
pub mod container;

/// A single child drawn at fixed margins.
pub mod inset;

/// Stacked children with per-layer insets and padding composition.
pub mod layer;

/// Stretchable rasters with fixed border regions.
pub mod nine_patch;

/// Level-driven and indeterminate progress drawables.
pub mod progress;

/// Touch-feedback ripple math and its compositing drawable.
pub mod ripple;

/// Shapes with solid or gradient fill: rectangle, oval, line, ring.
pub mod shape;

/// State-set keyed child selection.
pub mod state_list;

/// Time-driven two-layer cross-fade.
pub mod transition;
