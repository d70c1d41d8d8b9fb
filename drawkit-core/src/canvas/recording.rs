//! A canvas that records commands instead of rasterizing.
//!
//! Drawable tests assert on the recorded command stream, so rendering
//! behavior is checked without a scene, surface or GPU.

use vello::kurbo::{Affine, BezPath, Rect, Shape, Stroke};
use vello::peniko::{Brush, Color, Fill, ImageBrush, Mix};

use super::Canvas;

/// One recorded canvas command.
#[derive(Debug, Clone)]
pub enum CanvasOp {
    /// A fill command.
    Fill {
        /// Fill rule used.
        rule: Fill,
        /// Canvas transform.
        transform: Affine,
        /// Brush used.
        brush: Brush,
        /// Filled path.
        shape: BezPath,
    },
    /// A stroke command.
    Stroke {
        /// Stroke style used.
        style: Stroke,
        /// Canvas transform.
        transform: Affine,
        /// Brush used.
        brush: Brush,
        /// Stroked path.
        shape: BezPath,
    },
    /// An image draw command.
    Image {
        /// Canvas transform.
        transform: Affine,
    },
    /// A layer push.
    PushLayer {
        /// Layer alpha.
        alpha: f32,
        /// Clip path.
        clip: BezPath,
    },
    /// A layer pop.
    PopLayer,
}

impl CanvasOp {
    /// The solid brush color of a fill/stroke command, if it has one.
    pub fn solid_color(&self) -> Option<Color> {
        match self {
            CanvasOp::Fill { brush, .. } | CanvasOp::Stroke { brush, .. } => match brush {
                Brush::Solid(color) => Some(*color),
                _ => None,
            },
            _ => None,
        }
    }

    /// The bounding box of the command's path, if it has one.
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            CanvasOp::Fill { shape, .. } | CanvasOp::Stroke { shape, .. } => {
                Some(shape.bounding_box())
            }
            CanvasOp::PushLayer { clip, .. } => Some(clip.bounding_box()),
            _ => None,
        }
    }
}

/// A [`Canvas`] that stores every command it receives.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    /// Creates an empty recording canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded commands, in order.
    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Drops all recorded commands.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// The recorded fill commands, in order.
    pub fn fills(&self) -> Vec<&CanvasOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, CanvasOp::Fill { .. }))
            .collect()
    }

    /// The recorded stroke commands, in order.
    pub fn strokes(&self) -> Vec<&CanvasOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, CanvasOp::Stroke { .. }))
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn fill(
        &mut self,
        rule: Fill,
        transform: Affine,
        brush: &Brush,
        _brush_transform: Option<Affine>,
        shape: &BezPath,
    ) {
        self.ops.push(CanvasOp::Fill {
            rule,
            transform,
            brush: brush.clone(),
            shape: shape.clone(),
        });
    }

    fn stroke(
        &mut self,
        style: &Stroke,
        transform: Affine,
        brush: &Brush,
        _brush_transform: Option<Affine>,
        shape: &BezPath,
    ) {
        self.ops.push(CanvasOp::Stroke {
            style: style.clone(),
            transform,
            brush: brush.clone(),
            shape: shape.clone(),
        });
    }

    fn draw_image(&mut self, _image: &ImageBrush, transform: Affine) {
        self.ops.push(CanvasOp::Image { transform });
    }

    fn push_layer(&mut self, _mix: Mix, alpha: f32, _transform: Affine, clip: &BezPath) {
        self.ops.push(CanvasOp::PushLayer {
            alpha,
            clip: clip.clone(),
        });
    }

    fn pop_layer(&mut self) {
        self.ops.push(CanvasOp::PopLayer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::shape_to_path;
    use vello::kurbo::Rect;

    #[test]
    fn test_records_in_order() {
        let mut canvas = RecordingCanvas::new();
        let path = shape_to_path(&Rect::new(0.0, 0.0, 10.0, 10.0));
        let brush = Brush::Solid(Color::from_rgb8(10, 20, 30));

        canvas.fill(Fill::NonZero, Affine::IDENTITY, &brush, None, &path);
        canvas.push_layer(Mix::Normal, 0.5, Affine::IDENTITY, &path);
        canvas.pop_layer();

        assert_eq!(canvas.ops().len(), 3);
        assert_eq!(
            canvas.ops()[0].solid_color(),
            Some(Color::from_rgb8(10, 20, 30))
        );
        assert!(matches!(canvas.ops()[1], CanvasOp::PushLayer { alpha, .. } if alpha == 0.5));
        assert!(matches!(canvas.ops()[2], CanvasOp::PopLayer));
    }
}
