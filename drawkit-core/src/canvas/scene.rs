//! Canvas implementation writing into a vello [`Scene`].

use vello::kurbo::{Affine, BezPath, Shape, Stroke};
use vello::peniko::{Brush, Fill, ImageBrush, Mix};
use vello::Scene;

use super::Canvas;

/// A [`Canvas`] that records into a vello [`Scene`].
pub struct SceneCanvas<'a> {
    scene: &'a mut Scene,
}

impl<'a> SceneCanvas<'a> {
    /// Wraps a scene reference.
    pub fn new(scene: &'a mut Scene) -> Self {
        Self { scene }
    }

    /// The underlying scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    /// Fills a concrete shape without converting to a `BezPath` first.
    pub fn fill_shape(
        &mut self,
        rule: Fill,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &impl Shape,
    ) {
        self.scene.fill(rule, transform, brush, brush_transform, shape);
    }

    /// Strokes a concrete shape without converting to a `BezPath` first.
    pub fn stroke_shape(
        &mut self,
        style: &Stroke,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &impl Shape,
    ) {
        self.scene
            .stroke(style, transform, brush, brush_transform, shape);
    }
}

impl Canvas for SceneCanvas<'_> {
    fn fill(
        &mut self,
        rule: Fill,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &BezPath,
    ) {
        self.scene.fill(rule, transform, brush, brush_transform, shape);
    }

    fn stroke(
        &mut self,
        style: &Stroke,
        transform: Affine,
        brush: &Brush,
        brush_transform: Option<Affine>,
        shape: &BezPath,
    ) {
        self.scene
            .stroke(style, transform, brush, brush_transform, shape);
    }

    fn draw_image(&mut self, image: &ImageBrush, transform: Affine) {
        self.scene.draw_image(image, transform);
    }

    fn push_layer(&mut self, mix: Mix, alpha: f32, transform: Affine, clip: &BezPath) {
        self.scene.push_layer(mix, alpha, transform, clip);
    }

    fn pop_layer(&mut self) {
        self.scene.pop_layer();
    }
}
