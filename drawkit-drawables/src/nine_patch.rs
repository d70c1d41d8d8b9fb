//! A stretchable raster with fixed border regions.
//!
//! The chunk metadata (which rows/columns stretch, and the content
//! padding) arrives pre-parsed; this drawable only does the geometry:
//! fixed regions keep their pixel size, stretchable regions share the
//! remaining space in proportion to their source size, and each patch is
//! drawn clipped to its destination rectangle.

use std::sync::Arc;

use drawkit_core::canvas::{shape_to_path, Canvas};
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::error::{DrawableError, DrawableResult};
use drawkit_core::geometry::Insets;
use drawkit_core::theme::Theme;
use vello::kurbo::{Affine, Rect, Vec2};
use vello::peniko::{ImageBrush, ImageData, ImageSampler, Mix};

/// Pre-parsed nine-patch metadata: stretchable ranges per axis (pixel
/// start/end pairs in source coordinates) and the content padding.
#[derive(Debug, Clone, Default)]
pub struct NinePatchChunk {
    /// Stretchable column ranges, ascending and non-overlapping.
    pub x_segments: Vec<(u32, u32)>,
    /// Stretchable row ranges, ascending and non-overlapping.
    pub y_segments: Vec<(u32, u32)>,
    /// Content padding.
    pub padding: Insets,
}

impl NinePatchChunk {
    /// Validates the chunk against the backing image dimensions.
    pub fn validate(&self, width: u32, height: u32) -> DrawableResult<()> {
        validate_axis(&self.x_segments, width, "x")?;
        validate_axis(&self.y_segments, height, "y")?;
        Ok(())
    }
}

fn validate_axis(segments: &[(u32, u32)], limit: u32, axis: &str) -> DrawableResult<()> {
    let mut previous_end = 0;
    for &(start, end) in segments {
        if start >= end {
            return Err(DrawableError::invalid_chunk(format!(
                "empty {axis} stretch segment {start}..{end}"
            )));
        }
        if start < previous_end {
            return Err(DrawableError::invalid_chunk(format!(
                "overlapping {axis} stretch segment {start}..{end}"
            )));
        }
        if end > limit {
            return Err(DrawableError::invalid_chunk(format!(
                "{axis} stretch segment {start}..{end} exceeds size {limit}"
            )));
        }
        previous_end = end;
    }
    Ok(())
}

/// One axis slice: a source range and whether it stretches.
#[derive(Debug, Clone, Copy)]
struct Slice {
    src_start: f64,
    src_len: f64,
    stretch: bool,
}

/// Cuts an axis into alternating fixed/stretch slices.
fn slices(total: u32, segments: &[(u32, u32)]) -> Vec<Slice> {
    let mut out = Vec::new();
    let mut cursor = 0u32;
    for &(start, end) in segments {
        if start > cursor {
            out.push(Slice {
                src_start: cursor as f64,
                src_len: (start - cursor) as f64,
                stretch: false,
            });
        }
        out.push(Slice {
            src_start: start as f64,
            src_len: (end - start) as f64,
            stretch: true,
        });
        cursor = end;
    }
    if cursor < total {
        out.push(Slice {
            src_start: cursor as f64,
            src_len: (total - cursor) as f64,
            stretch: false,
        });
    }
    out
}

/// Maps slices onto a destination extent: fixed slices keep their size
/// (compressed uniformly when the destination is too small), stretch
/// slices share the leftover pro rata.
fn destinations(slices: &[Slice], dest_total: f64) -> Vec<(f64, f64)> {
    let fixed_total: f64 = slices.iter().filter(|s| !s.stretch).map(|s| s.src_len).sum();
    let stretch_total: f64 = slices.iter().filter(|s| s.stretch).map(|s| s.src_len).sum();

    let fixed_scale = if fixed_total > dest_total && fixed_total > 0.0 {
        dest_total / fixed_total
    } else {
        1.0
    };
    let leftover = (dest_total - fixed_total * fixed_scale).max(0.0);

    let mut out = Vec::with_capacity(slices.len());
    let mut cursor = 0.0;
    for slice in slices {
        let len = if slice.stretch {
            if stretch_total > 0.0 {
                leftover * slice.src_len / stretch_total
            } else {
                0.0
            }
        } else {
            slice.src_len * fixed_scale
        };
        out.push((cursor, len));
        cursor += len;
    }
    out
}

/// Shared configuration of a [`NinePatchDrawable`].
#[derive(Clone)]
pub struct NinePatchState {
    image: ImageData,
    chunk: NinePatchChunk,
}

impl DrawableState for NinePatchState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(NinePatchDrawable::from_state(self))
    }
}

/// A raster image whose stretch regions grow with the bounds while the
/// fixed border regions keep their pixel size.
pub struct NinePatchDrawable {
    base: DrawableBase,
    state: Arc<NinePatchState>,
    alpha: u8,
    color_filter: Option<ColorFilter>,
    tint_list: Option<ColorList>,
    tint_mode: BlendMode,
    mutated: bool,
}

impl NinePatchDrawable {
    /// Creates a nine-patch from pixel data and its chunk metadata.
    pub fn new(image: ImageData, chunk: NinePatchChunk) -> DrawableResult<Self> {
        chunk.validate(image.width, image.height)?;
        Ok(Self::from_state(Arc::new(NinePatchState { image, chunk })))
    }

    /// Creates an instance backed by shared constant state.
    pub fn from_state(state: Arc<NinePatchState>) -> Self {
        Self {
            base: DrawableBase::new(),
            state,
            alpha: 0xFF,
            color_filter: None,
            tint_list: None,
            tint_mode: BlendMode::default(),
            mutated: false,
        }
    }

    /// The chunk metadata.
    pub fn chunk(&self) -> &NinePatchChunk {
        &self.state.chunk
    }

    fn sampler(&self) -> ImageSampler {
        ImageSampler {
            alpha: self.alpha as f32 / 255.0,
            ..ImageSampler::default()
        }
    }
}

impl Drawable for NinePatchDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        let bounds = self.base.bounds();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }

        let image = &self.state.image;
        let chunk = &self.state.chunk;

        let x_slices = slices(image.width, &chunk.x_segments);
        let y_slices = slices(image.height, &chunk.y_segments);
        let x_dests = destinations(&x_slices, bounds.width());
        let y_dests = destinations(&y_slices, bounds.height());

        let brush = ImageBrush {
            image: image.clone(),
            sampler: self.sampler(),
        };

        for (ys, &(dy, dh)) in y_slices.iter().zip(&y_dests) {
            if dh <= 0.0 {
                continue;
            }
            for (xs, &(dx, dw)) in x_slices.iter().zip(&x_dests) {
                if dw <= 0.0 {
                    continue;
                }
                let dest = Rect::new(
                    bounds.x0 + dx,
                    bounds.y0 + dy,
                    bounds.x0 + dx + dw,
                    bounds.y0 + dy + dh,
                );
                let scale_x = dw / xs.src_len;
                let scale_y = dh / ys.src_len;
                let transform = Affine::translate(Vec2::new(dest.x0, dest.y0))
                    * Affine::scale_non_uniform(scale_x, scale_y)
                    * Affine::translate(Vec2::new(-xs.src_start, -ys.src_start));

                let clip = shape_to_path(&dest);
                canvas.push_layer(Mix::Normal, 1.0, Affine::IDENTITY, &clip);
                canvas.draw_image(&brush, transform);
                canvas.pop_layer();
            }
        }

        // Tint/filter composites its color over the patches.
        let filter = self.color_filter.or_else(|| {
            self.tint_list
                .as_ref()
                .map(|t| ColorFilter::new(t.color_for_state(self.base.state()), self.tint_mode))
        });
        if let Some(filter) = filter {
            let path = shape_to_path(&bounds);
            canvas.push_layer(Mix::Multiply, 1.0, Affine::IDENTITY, &path);
            canvas.fill(
                vello::peniko::Fill::NonZero,
                Affine::IDENTITY,
                &vello::peniko::Brush::Solid(filter.color),
                None,
                &path,
            );
            canvas.pop_layer();
        }
    }

    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn set_alpha(&mut self, alpha: u8) {
        if alpha != self.alpha {
            self.alpha = alpha;
            self.base.invalidate();
        }
    }

    fn alpha(&self) -> u8 {
        self.alpha
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        if filter != self.color_filter {
            self.color_filter = filter;
            self.base.invalidate();
        }
    }

    fn color_filter(&self) -> Option<ColorFilter> {
        self.color_filter
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        self.tint_list = tint;
        self.base.invalidate();
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.tint_mode = mode;
        self.base.invalidate();
    }

    fn opacity(&self) -> Opacity {
        // Nine-patch sources carry alpha in their stretch borders; stay
        // conservative.
        Opacity::Translucent
    }

    fn intrinsic_width(&self) -> i32 {
        self.state.image.width as i32
    }

    fn intrinsic_height(&self) -> i32 {
        self.state.image.height as i32
    }

    fn padding(&self) -> Option<Insets> {
        let padding = self.state.chunk.padding;
        (!padding.is_zero()).then_some(padding)
    }

    fn is_stateful(&self) -> bool {
        self.tint_list
            .as_ref()
            .map(ColorList::is_stateful)
            .unwrap_or(false)
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        Some(self.state.clone())
    }

    fn mutate(&mut self) {
        if !self.mutated {
            self.state = Arc::new((*self.state).clone());
            self.mutated = true;
        }
    }

    fn apply_theme(&mut self, _theme: &dyn Theme) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawkit_core::canvas::{CanvasOp, RecordingCanvas};
    use vello::kurbo::Shape;
    use vello::peniko::{Blob, ImageAlphaType, ImageFormat};

    fn pixels(width: u32, height: u32) -> ImageData {
        ImageData {
            data: Blob::from(vec![0u8; (width * height * 4) as usize]),
            format: ImageFormat::Rgba8,
            alpha_type: ImageAlphaType::Alpha,
            width,
            height,
        }
    }

    fn chunk() -> NinePatchChunk {
        NinePatchChunk {
            x_segments: vec![(10, 20)],
            y_segments: vec![(10, 20)],
            padding: Insets::uniform(10),
        }
    }

    #[test]
    fn test_chunk_validation() {
        assert!(chunk().validate(30, 30).is_ok());

        let bad = NinePatchChunk {
            x_segments: vec![(10, 40)],
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(30, 30),
            Err(DrawableError::InvalidNinePatchChunk { .. })
        ));

        let overlapping = NinePatchChunk {
            x_segments: vec![(5, 15), (10, 20)],
            ..Default::default()
        };
        assert!(overlapping.validate(30, 30).is_err());

        let empty = NinePatchChunk {
            y_segments: vec![(8, 8)],
            ..Default::default()
        };
        assert!(empty.validate(30, 30).is_err());
    }

    #[test]
    fn test_stretch_keeps_borders_fixed() {
        // 30x30 image with a 10px stretch band in the middle of each axis.
        let mut nine = NinePatchDrawable::new(pixels(30, 30), chunk()).unwrap();
        nine.set_bounds(Rect::new(0.0, 0.0, 100.0, 30.0));

        let mut canvas = RecordingCanvas::new();
        nine.draw(&mut canvas);

        // 3x3 patches, each clipped: 9 layers with an image each.
        let clips: Vec<Rect> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                CanvasOp::PushLayer { clip, .. } => Some(clip.bounding_box()),
                _ => None,
            })
            .collect();
        assert_eq!(clips.len(), 9);

        // Middle column of the first row: stretch band takes all leftover
        // width (100 - 20 fixed = 80), corners stay 10px.
        assert_eq!(clips[0], Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(clips[1], Rect::new(10.0, 0.0, 90.0, 10.0));
        assert_eq!(clips[2], Rect::new(90.0, 0.0, 100.0, 10.0));
    }

    #[test]
    fn test_padding_and_intrinsics_from_chunk() {
        let nine = NinePatchDrawable::new(pixels(30, 30), chunk()).unwrap();
        assert_eq!(nine.intrinsic_width(), 30);
        assert_eq!(nine.intrinsic_height(), 30);
        assert_eq!(nine.padding(), Some(Insets::uniform(10)));
    }

    #[test]
    fn test_undersized_bounds_compress_borders() {
        let mut nine = NinePatchDrawable::new(pixels(30, 30), chunk()).unwrap();
        nine.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));

        let mut canvas = RecordingCanvas::new();
        nine.draw(&mut canvas);

        // The stretch band collapses; fixed borders compress to fit and no
        // destination rect escapes the bounds.
        for op in canvas.ops() {
            if let CanvasOp::PushLayer { clip, .. } = op {
                let bbox = clip.bounding_box();
                assert!(bbox.x1 <= 10.0 + 1e-6);
                assert!(bbox.y1 <= 10.0 + 1e-6);
            }
        }
    }
}
