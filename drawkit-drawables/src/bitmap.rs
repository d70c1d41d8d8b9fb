//! A drawable wrapping a raster image, with gravity placement and tiling.

use std::sync::Arc;

use drawkit_core::canvas::{shape_to_path, Canvas};
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::error::{DrawableError, DrawableResult};
use drawkit_core::theme::Theme;
use vello::kurbo::{Affine, Rect, Vec2};
use vello::peniko::{
    Blob, Brush, Extend, Fill, ImageAlphaType, ImageBrush, ImageData, ImageFormat, ImageSampler,
    Mix,
};

/// How a bitmap repeats along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    /// Edge pixels extend outward; no repetition.
    Clamp,
    /// The bitmap repeats.
    Repeat,
    /// The bitmap repeats, mirrored on every other tile.
    Mirror,
}

impl TileMode {
    fn extend(self) -> Extend {
        match self {
            TileMode::Clamp => Extend::Pad,
            TileMode::Repeat => Extend::Repeat,
            TileMode::Mirror => Extend::Reflect,
        }
    }
}

/// Where an untiled bitmap sits within the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    /// Stretch to fill the bounds. The default.
    #[default]
    Fill,
    /// Centered at intrinsic size.
    Center,
    /// Left edge, vertically centered.
    Left,
    /// Top edge, horizontally centered.
    Top,
    /// Right edge, vertically centered.
    Right,
    /// Bottom edge, horizontally centered.
    Bottom,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl Gravity {
    /// Positions a `w` x `h` box inside `container` per this gravity.
    pub fn apply(self, w: f64, h: f64, container: Rect) -> Rect {
        if self == Gravity::Fill {
            return container;
        }
        let x = match self {
            Gravity::Left | Gravity::TopLeft | Gravity::BottomLeft => container.x0,
            Gravity::Right | Gravity::TopRight | Gravity::BottomRight => container.x1 - w,
            _ => container.x0 + (container.width() - w) / 2.0,
        };
        let y = match self {
            Gravity::Top | Gravity::TopLeft | Gravity::TopRight => container.y0,
            Gravity::Bottom | Gravity::BottomLeft | Gravity::BottomRight => container.y1 - h,
            _ => container.y0 + (container.height() - h) / 2.0,
        };
        Rect::new(x, y, x + w, y + h)
    }
}

/// Shared configuration of a [`BitmapDrawable`].
#[derive(Clone)]
pub struct BitmapState {
    image: ImageData,
    gravity: Gravity,
    tile_x: Option<TileMode>,
    tile_y: Option<TileMode>,
    /// Whether the pixels carry meaningful alpha.
    has_alpha: bool,
    /// Scale applied to the intrinsic size for density mismatches.
    density_scale: f32,
}

impl DrawableState for BitmapState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(BitmapDrawable::from_state(self))
    }
}

/// A drawable that draws a bitmap, tiled, stretched or gravity-aligned.
pub struct BitmapDrawable {
    base: DrawableBase,
    state: Arc<BitmapState>,
    alpha: u8,
    color_filter: Option<ColorFilter>,
    tint_list: Option<ColorList>,
    tint_mode: BlendMode,
    mutated: bool,
}

impl BitmapDrawable {
    /// Creates a drawable for the given image.
    pub fn new(image: ImageData) -> Self {
        Self::from_state(Arc::new(BitmapState {
            image,
            gravity: Gravity::Fill,
            tile_x: None,
            tile_y: None,
            has_alpha: true,
            density_scale: 1.0,
        }))
    }

    /// Creates an instance backed by shared constant state.
    pub fn from_state(state: Arc<BitmapState>) -> Self {
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

    /// Decodes an encoded image (PNG, JPEG) into pixel data.
    pub fn decode(bytes: &[u8]) -> DrawableResult<ImageData> {
        let decoded = image::load_from_memory(bytes).map_err(|e| DrawableError::BitmapDecode {
            reason: e.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(ImageData {
            data: Blob::from(rgba.into_raw()),
            format: ImageFormat::Rgba8,
            alpha_type: ImageAlphaType::Alpha,
            width,
            height,
        })
    }

    fn state_mut(&mut self) -> &mut BitmapState {
        Arc::make_mut(&mut self.state)
    }

    /// The placement of an untiled bitmap within the bounds.
    pub fn gravity(&self) -> Gravity {
        self.state.gravity
    }

    /// Sets the placement of an untiled bitmap within the bounds.
    pub fn set_gravity(&mut self, gravity: Gravity) {
        if self.state.gravity != gravity {
            self.state_mut().gravity = gravity;
            self.base.invalidate();
        }
    }

    /// Sets the repetition mode for both axes.
    pub fn set_tile_modes(&mut self, x: Option<TileMode>, y: Option<TileMode>) {
        if self.state.tile_x != x || self.state.tile_y != y {
            let st = self.state_mut();
            st.tile_x = x;
            st.tile_y = y;
            self.base.invalidate();
        }
    }

    /// The horizontal repetition mode.
    pub fn tile_mode_x(&self) -> Option<TileMode> {
        self.state.tile_x
    }

    /// The vertical repetition mode.
    pub fn tile_mode_y(&self) -> Option<TileMode> {
        self.state.tile_y
    }

    /// Declares whether the pixels carry meaningful alpha, refining the
    /// reported opacity.
    pub fn set_has_alpha(&mut self, has_alpha: bool) {
        self.state_mut().has_alpha = has_alpha;
        self.base.invalidate();
    }

    /// Scales the reported intrinsic size, e.g. for a density mismatch
    /// between the bitmap and the target surface.
    pub fn set_density_scale(&mut self, scale: f32) {
        self.state_mut().density_scale = scale;
        self.base.invalidate();
    }

    fn scaled_width(&self) -> f64 {
        (self.state.image.width as f32 * self.state.density_scale) as f64
    }

    fn scaled_height(&self) -> f64 {
        (self.state.image.height as f32 * self.state.density_scale) as f64
    }

    fn active_filter(&self) -> Option<ColorFilter> {
        self.color_filter.or_else(|| {
            self.tint_list
                .as_ref()
                .map(|t| ColorFilter::new(t.color_for_state(self.base.state()), self.tint_mode))
        })
    }

    fn image_brush(&self) -> ImageBrush {
        ImageBrush {
            image: self.state.image.clone(),
            sampler: ImageSampler {
                x_extend: self.state.tile_x.map(TileMode::extend).unwrap_or(Extend::Pad),
                y_extend: self.state.tile_y.map(TileMode::extend).unwrap_or(Extend::Pad),
                alpha: self.alpha as f32 / 255.0,
                ..ImageSampler::default()
            },
        }
    }
}

impl Drawable for BitmapDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        let bounds = self.base.bounds();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        let (iw, ih) = (
            self.state.image.width as f64,
            self.state.image.height as f64,
        );
        if iw <= 0.0 || ih <= 0.0 {
            return;
        }

        let tiled = self.state.tile_x.is_some() || self.state.tile_y.is_some();
        let brush = self.image_brush();

        let dest = if tiled {
            // The brush tiles across the whole bounds, anchored at the
            // bounds origin.
            let path = shape_to_path(&bounds);
            canvas.fill(
                Fill::NonZero,
                Affine::IDENTITY,
                &Brush::Image(brush),
                Some(Affine::translate(Vec2::new(bounds.x0, bounds.y0))),
                &path,
            );
            bounds
        } else {
            let dest = self
                .state
                .gravity
                .apply(self.scaled_width(), self.scaled_height(), bounds);
            let transform = Affine::translate(Vec2::new(dest.x0, dest.y0))
                * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
            canvas.draw_image(&brush, transform);
            dest
        };

        // Tint/filter composites its color over the bitmap within the
        // destination rect.
        if let Some(filter) = self.active_filter() {
            let path = shape_to_path(&dest);
            canvas.push_layer(Mix::Multiply, 1.0, Affine::IDENTITY, &path);
            canvas.fill(
                Fill::NonZero,
                Affine::IDENTITY,
                &Brush::Solid(filter.color),
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

    fn on_state_change(&mut self) -> bool {
        if self
            .tint_list
            .as_ref()
            .map(ColorList::is_stateful)
            .unwrap_or(false)
        {
            self.base.invalidate();
            return true;
        }
        false
    }

    fn opacity(&self) -> Opacity {
        if self.state.gravity != Gravity::Fill || self.state.has_alpha || self.alpha < 255 {
            Opacity::Translucent
        } else {
            Opacity::Opaque
        }
    }

    fn intrinsic_width(&self) -> i32 {
        self.scaled_width().round() as i32
    }

    fn intrinsic_height(&self) -> i32 {
        self.scaled_height().round() as i32
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
