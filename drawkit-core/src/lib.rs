#![warn(missing_docs)]

//! Core library for drawkit => See the `drawkit` crate.
//!
//! Contains the drawable contract, the canvas abstraction and the small
//! value types (insets, state sets, color lists) every drawable builds on.

pub use vello as vg;

/// The abstract drawing surface drawables render into.
pub mod canvas;

/// Monotonic time sources driving every animation.
pub mod clock;

/// Color lists, color filters and blend modes.
pub mod color;

/// The [Drawable](drawable::Drawable) contract and its constant-state model.
pub mod drawable;

/// Error types for drawable configuration.
pub mod error;

/// Float helpers and the [Insets](geometry::Insets) value type.
pub mod geometry;

/// Runtime state sets and state-spec matching.
pub mod state;

/// The attribute source drawables resolve deferred theme values against.
pub mod theme;
