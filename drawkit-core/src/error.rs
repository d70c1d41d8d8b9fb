//! Error types for drawable configuration.
//!
//! Configuration errors abort construction of the offending drawable and
//! propagate; geometry degeneracies never reach this type — they are
//! normalized at the drawing site instead.

use thiserror::Error;

/// Errors raised while configuring a drawable.
#[derive(Error, Debug)]
pub enum DrawableError {
    /// A linear gradient angle was not a multiple of 45 degrees.
    #[error("gradient angle must be a multiple of 45, got {angle}")]
    InvalidGradientAngle {
        /// The rejected angle in degrees.
        angle: i32,
    },

    /// A radial gradient was configured without a radius.
    #[error("radial gradient requires a radius")]
    MissingGradientRadius,

    /// A wrapper drawable was configured without its required child.
    #[error("{element} requires a child drawable")]
    MissingChildDrawable {
        /// The element missing its child.
        element: &'static str,
    },

    /// An animation frame was given a non-positive duration.
    #[error("animation frame requires a positive duration, got {duration}ms")]
    InvalidFrameDuration {
        /// The rejected duration in milliseconds.
        duration: i64,
    },

    /// A nine-patch chunk did not describe the backing image.
    #[error("invalid nine-patch chunk: {reason}")]
    InvalidNinePatchChunk {
        /// What was wrong with the chunk.
        reason: String,
    },

    /// A bitmap could not be decoded.
    #[error("failed to decode bitmap: {reason}")]
    BitmapDecode {
        /// The decoder's message.
        reason: String,
    },
}

impl DrawableError {
    /// Creates an invalid-gradient-angle error.
    pub fn invalid_angle(angle: i32) -> Self {
        Self::InvalidGradientAngle { angle }
    }

    /// Creates a missing-child error for the named element.
    pub fn missing_child(element: &'static str) -> Self {
        Self::MissingChildDrawable { element }
    }

    /// Creates an invalid nine-patch chunk error.
    pub fn invalid_chunk(reason: impl Into<String>) -> Self {
        Self::InvalidNinePatchChunk {
            reason: reason.into(),
        }
    }
}

/// Result alias for drawable configuration.
pub type DrawableResult<T> = Result<T, DrawableError>;
