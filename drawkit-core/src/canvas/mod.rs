//! The abstract drawing surface.
//!
//! This module decouples drawables from the rendering backend. Methods take
//! `&BezPath` for object-safety; concrete shape types (`Rect`,
//! `RoundedRect`, `Circle`, ...) are converted with [`shape_to_path`].

use vello::kurbo::{Affine, BezPath, Shape, Stroke};
use vello::peniko::{Brush, Fill, ImageBrush, Mix};

/// A surface drawables render into.
pub trait Canvas {
    /// Fills a shape with the given brush.
    fn fill(
        &mut self,
        rule: Fill,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &BezPath,
    );

    /// Strokes a shape with the given brush.
    fn stroke(
        &mut self,
        style: &Stroke,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &BezPath,
    );

    /// Draws an image under the given transform.
    fn draw_image(&mut self, image: &ImageBrush, transform: Affine);

    /// Pushes a clipped alpha layer; drawing until the matching
    /// [`pop_layer`](Canvas::pop_layer) composites through it.
    fn push_layer(&mut self, mix: Mix, alpha: f32, transform: Affine, clip: &BezPath);

    /// Pops the most recent layer.
    fn pop_layer(&mut self);
}

/// Converts a concrete shape into a path for use with [`Canvas`].
pub fn shape_to_path(shape: &impl Shape) -> BezPath {
    shape.to_path(0.1)
}

/// A canvas adapter composing an extra transform into every command.
///
/// Lets a wrapper drawable rotate or offset a child's entire output
/// without the child knowing.
pub struct TransformCanvas<'a> {
    inner: &'a mut dyn Canvas,
    transform: Affine,
}

impl<'a> TransformCanvas<'a> {
    /// Wraps `inner`, pre-multiplying `transform` into every command.
    pub fn new(inner: &'a mut dyn Canvas, transform: Affine) -> Self {
        Self { inner, transform }
    }
}

impl Canvas for TransformCanvas<'_> {
    fn fill(
        &mut self,
        rule: Fill,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &BezPath,
    ) {
        self.inner
            .fill(rule, self.transform * transform, brush, brush_transform, shape);
    }

    fn stroke(
        &mut self,
        style: &Stroke,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &BezPath,
    ) {
        self.inner
            .stroke(style, self.transform * transform, brush, brush_transform, shape);
    }

    fn draw_image(&mut self, image: &ImageBrush, transform: Affine) {
        self.inner.draw_image(image, self.transform * transform);
    }

    fn push_layer(&mut self, mix: Mix, alpha: f32, transform: Affine, clip: &BezPath) {
        self.inner
            .push_layer(mix, alpha, self.transform * transform, clip);
    }

    fn pop_layer(&mut self) {
        self.inner.pop_layer();
    }
}

/// A command-recording canvas for tests.
pub mod recording;
/// The vello [Scene](vello::Scene) backed canvas.
pub mod scene;

pub use recording::{CanvasOp, RecordingCanvas};
pub use scene::SceneCanvas;
