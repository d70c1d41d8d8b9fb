//! A drawable with a color gradient or solid fill: rectangle, oval, line
//! or ring.
//!
//! The drawing rectangle and the gradient brush are cached and only rebuilt
//! when bounds, level or paint configuration are marked dirty, because the
//! stroke half-width insets the fill rect and the gradient geometry derives
//! from the rect.

use std::f64::consts::PI;
use std::sync::Arc;

use drawkit_core::canvas::{shape_to_path, Canvas};
use drawkit_core::color::{is_opaque, modulate_alpha, BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{
    Drawable, DrawableBase, DrawableState, Opacity, MAX_LEVEL,
};
use drawkit_core::error::{DrawableError, DrawableResult};
use drawkit_core::geometry::Insets;
use drawkit_core::theme::Theme;
use vello::kurbo::{
    Arc as KurboArc, Affine, BezPath, Ellipse, Line, Point, Rect, RoundedRect, Stroke, Vec2,
};
use vello::peniko::color::{DynamicColor, Srgb};
use vello::peniko::{Brush, Color, Extend, Fill, Gradient, Mix};

const DEFAULT_INNER_RADIUS_RATIO: f32 = 3.0;
const DEFAULT_THICKNESS_RATIO: f32 = 9.0;

/// The geometric primitive a [`ShapeDrawable`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeKind {
    /// A rectangle, optionally with rounded corners.
    #[default]
    Rectangle,
    /// An ellipse filling the bounds.
    Oval,
    /// A horizontal line across the vertical center.
    Line,
    /// An annulus, optionally swept partially by level.
    Ring,
}

/// The gradient family used for the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientKind {
    /// Colors interpolated along a line through the bounds.
    #[default]
    Linear,
    /// Colors radiating from a center point.
    Radial,
    /// Colors swept around a center point.
    Sweep,
}

/// Orientation of a linear gradient relative to the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Top edge to bottom edge.
    #[default]
    TopBottom,
    /// Top-right corner to bottom-left corner.
    TrBl,
    /// Right edge to left edge.
    RightLeft,
    /// Bottom-right corner to top-left corner.
    BrTl,
    /// Bottom edge to top edge.
    BottomTop,
    /// Bottom-left corner to top-right corner.
    BlTr,
    /// Left edge to right edge.
    LeftRight,
    /// Top-left corner to bottom-right corner.
    TlBr,
}

impl Orientation {
    /// The orientation for an angle in multiples of 45 degrees,
    /// counter-clockwise from left-to-right.
    pub fn from_angle(angle: i32) -> DrawableResult<Self> {
        let angle = angle.rem_euclid(360);
        if angle % 45 != 0 {
            return Err(DrawableError::invalid_angle(angle));
        }
        Ok(match angle {
            0 => Orientation::LeftRight,
            45 => Orientation::BlTr,
            90 => Orientation::BottomTop,
            135 => Orientation::BrTl,
            180 => Orientation::RightLeft,
            225 => Orientation::TrBl,
            270 => Orientation::TopBottom,
            _ => Orientation::TlBr,
        })
    }

    /// Gradient endpoints for this orientation over `r`, with the end point
    /// scaled by `level` (0..1) for level-gated reveals.
    fn endpoints(self, r: Rect, level: f64) -> (Point, Point) {
        match self {
            Orientation::TopBottom => {
                (Point::new(r.x0, r.y0), Point::new(r.x0, level * r.y1))
            }
            Orientation::TrBl => (
                Point::new(r.x1, r.y0),
                Point::new(level * r.x0, level * r.y1),
            ),
            Orientation::RightLeft => {
                (Point::new(r.x1, r.y0), Point::new(level * r.x0, r.y0))
            }
            Orientation::BrTl => (
                Point::new(r.x1, r.y1),
                Point::new(level * r.x0, level * r.y0),
            ),
            Orientation::BottomTop => {
                (Point::new(r.x0, r.y1), Point::new(r.x0, level * r.y0))
            }
            Orientation::BlTr => (
                Point::new(r.x0, r.y1),
                Point::new(level * r.x1, level * r.y0),
            ),
            Orientation::LeftRight => {
                (Point::new(r.x0, r.y0), Point::new(level * r.x1, r.y0))
            }
            Orientation::TlBr => (
                Point::new(r.x0, r.y0),
                Point::new(level * r.x1, level * r.y1),
            ),
        }
    }
}

/// How a radial gradient radius is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusKind {
    /// A literal pixel value.
    Pixels(f32),
    /// A fraction of the drawable's intrinsic size (smaller dimension).
    Fraction(f32),
    /// A fraction of the current bounds (smaller dimension).
    BoundsFraction(f32),
}

/// Which property a deferred theme attribute resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeAttr {
    /// The solid fill color list.
    Solid,
    /// The stroke color list.
    StrokeColor,
    /// The single corner radius, as a dimension.
    CornerRadius,
    /// The intrinsic width, as a dimension.
    Width,
    /// The intrinsic height, as a dimension.
    Height,
}

/// Shared configuration of a [`ShapeDrawable`].
#[derive(Debug, Clone)]
pub struct ShapeState {
    shape: ShapeKind,
    gradient: GradientKind,
    orientation: Orientation,
    colors: Option<Vec<Color>>,
    positions: Option<Vec<f32>>,
    color_list: Option<ColorList>,
    stroke_width: f32,
    stroke_color_list: Option<ColorList>,
    stroke_dash_width: f32,
    stroke_dash_gap: f32,
    radius: f32,
    radius_array: Option<[f32; 4]>,
    padding: Option<Insets>,
    width: i32,
    height: i32,
    inner_radius: i32,
    inner_radius_ratio: f32,
    thickness: i32,
    thickness_ratio: f32,
    center_x: f32,
    center_y: f32,
    gradient_radius: RadiusKind,
    use_level: bool,
    use_level_for_shape: bool,
    opaque_over_bounds: bool,
    opaque_over_shape: bool,
    theme_attrs: Vec<(String, ShapeAttr)>,
}

impl Default for ShapeState {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Rectangle,
            gradient: GradientKind::Linear,
            orientation: Orientation::TopBottom,
            colors: None,
            positions: None,
            color_list: None,
            stroke_width: -1.0,
            stroke_color_list: None,
            stroke_dash_width: 0.0,
            stroke_dash_gap: 0.0,
            radius: 0.0,
            radius_array: None,
            padding: None,
            width: -1,
            height: -1,
            inner_radius: -1,
            inner_radius_ratio: DEFAULT_INNER_RADIUS_RATIO,
            thickness: -1,
            thickness_ratio: DEFAULT_THICKNESS_RATIO,
            center_x: 0.5,
            center_y: 0.5,
            gradient_radius: RadiusKind::Pixels(0.5),
            use_level: false,
            use_level_for_shape: true,
            opaque_over_bounds: false,
            opaque_over_shape: false,
            theme_attrs: Vec::new(),
        }
    }
}

impl ShapeState {
    fn compute_opacity(&mut self) {
        self.opaque_over_bounds = false;
        self.opaque_over_shape = false;

        if let Some(colors) = &self.colors {
            if colors.iter().any(|c| !is_opaque(*c)) {
                return;
            }
        }

        // An unfilled shape is not opaque over bounds or shape.
        if self.colors.is_none() && self.color_list.is_none() {
            return;
        }

        if let Some(list) = &self.color_list {
            if !list.is_opaque() {
                return;
            }
        }

        self.opaque_over_shape = true;

        // Opaque over bounds iff the shape fills them: a rectangle with no
        // corner rounding at all.
        self.opaque_over_bounds = self.shape == ShapeKind::Rectangle
            && self.radius <= 0.0
            && self.radius_array.is_none();
    }

    fn set_colors(&mut self, colors: Option<Vec<Color>>) {
        self.colors = colors;
        self.color_list = None;
        self.compute_opacity();
    }

    fn set_color_list(&mut self, list: Option<ColorList>) {
        self.colors = None;
        self.color_list = list;
        self.compute_opacity();
    }

    fn set_corner_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
        self.radius_array = None;
        self.compute_opacity();
    }

    fn set_corner_radii(&mut self, radii: Option<[f32; 4]>) {
        self.radius_array = radii;
        if radii.is_none() {
            self.radius = 0.0;
        }
        self.compute_opacity();
    }
}

impl DrawableState for ShapeState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(ShapeDrawable::from_state(self))
    }

    fn can_apply_theme(&self) -> bool {
        !self.theme_attrs.is_empty()
    }
}

/// A drawable filling a shape with a solid color or a gradient, with an
/// optional centered stroke.
pub struct ShapeDrawable {
    base: DrawableBase,
    state: Arc<ShapeState>,
    fill_color: Color,
    stroke_color: Color,
    alpha: u8,
    color_filter: Option<ColorFilter>,
    tint_list: Option<ColorList>,
    tint_mode: BlendMode,
    tint_filter: Option<ColorFilter>,
    rect: Rect,
    path: BezPath,
    ring_path: Option<BezPath>,
    fill_brush: Brush,
    gradient_dirty: bool,
    path_dirty: bool,
    mutated: bool,
}

impl Default for ShapeDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeDrawable {
    /// Creates a rectangle with no fill and no stroke.
    pub fn new() -> Self {
        Self::from_state(Arc::new(ShapeState::default()))
    }

    /// Creates a linear gradient over the given colors.
    pub fn with_gradient(orientation: Orientation, colors: Vec<Color>) -> Self {
        let mut state = ShapeState::default();
        state.orientation = orientation;
        state.set_colors(Some(colors));
        Self::from_state(Arc::new(state))
    }

    /// Creates a shape filled with a single solid color.
    pub fn with_color(color: Color) -> Self {
        let mut state = ShapeState::default();
        state.set_color_list(Some(ColorList::solid(color)));
        Self::from_state(Arc::new(state))
    }

    /// Creates an instance backed by shared constant state.
    pub fn from_state(state: Arc<ShapeState>) -> Self {
        let mut this = Self {
            base: DrawableBase::new(),
            state,
            fill_color: Color::TRANSPARENT,
            stroke_color: Color::TRANSPARENT,
            alpha: 0xFF,
            color_filter: None,
            tint_list: None,
            tint_mode: BlendMode::default(),
            tint_filter: None,
            rect: Rect::ZERO,
            path: BezPath::new(),
            ring_path: None,
            fill_brush: Brush::Solid(Color::TRANSPARENT),
            gradient_dirty: true,
            path_dirty: true,
            mutated: false,
        };
        this.initialize_from_state();
        this
    }

    fn initialize_from_state(&mut self) {
        let state = self.base.state();
        if let Some(list) = &self.state.color_list {
            self.fill_color = list.color_for_state(state);
        } else if self.state.colors.is_none() {
            // Neither gradient nor solid: the shape is stroke-only.
            self.fill_color = Color::TRANSPARENT;
        } else {
            // With a gradient the fill alpha channel must be maxed out so
            // alpha modulation works against the shader output.
            self.fill_color = Color::BLACK;
        }
        if let Some(list) = &self.state.stroke_color_list {
            self.stroke_color = list.color_for_state(state);
        }
    }

    fn state_mut(&mut self) -> &mut ShapeState {
        Arc::make_mut(&mut self.state)
    }

    /// The shape kind drawn.
    pub fn shape(&self) -> ShapeKind {
        self.state.shape
    }

    /// Sets the shape kind.
    pub fn set_shape(&mut self, shape: ShapeKind) {
        self.path_dirty = true;
        self.ring_path = None;
        let st = self.state_mut();
        st.shape = shape;
        st.compute_opacity();
        self.base.invalidate();
    }

    /// Switches to a single solid fill color.
    pub fn set_color(&mut self, color: Color) {
        self.set_color_list(Some(ColorList::solid(color)));
    }

    /// Switches to a state-dependent solid fill. `None` clears the fill.
    pub fn set_color_list(&mut self, list: Option<ColorList>) {
        self.state_mut().set_color_list(list);
        self.fill_color = match &self.state.color_list {
            Some(list) => list.color_for_state(self.base.state()),
            None => Color::TRANSPARENT,
        };
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Switches to a gradient over the given colors (at least two).
    pub fn set_colors(&mut self, colors: Vec<Color>) {
        self.state_mut().set_colors(Some(colors));
        self.fill_color = Color::BLACK;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets explicit gradient stop positions, parallel to the colors.
    pub fn set_positions(&mut self, positions: Option<Vec<f32>>) {
        self.state_mut().positions = positions;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets the gradient family.
    pub fn set_gradient_kind(&mut self, kind: GradientKind) {
        self.state_mut().gradient = kind;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets the linear gradient orientation.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.state_mut().orientation = orientation;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets the linear gradient orientation from an angle, which must be a
    /// multiple of 45 degrees.
    pub fn set_gradient_angle(&mut self, angle: i32) -> DrawableResult<()> {
        let orientation = Orientation::from_angle(angle)?;
        self.set_orientation(orientation);
        Ok(())
    }

    /// Sets the fractional gradient center.
    pub fn set_gradient_center(&mut self, x: f32, y: f32) {
        let st = self.state_mut();
        st.center_x = x;
        st.center_y = y;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets the radial gradient radius.
    pub fn set_gradient_radius(&mut self, radius: RadiusKind) {
        self.state_mut().gradient_radius = radius;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// The effective radial gradient radius in pixels, after the current
    /// bounds and level are applied. Zero for non-radial gradients.
    pub fn gradient_radius(&self) -> f32 {
        if self.state.gradient != GradientKind::Radial {
            return 0.0;
        }
        self.resolved_gradient_radius()
    }

    fn resolved_gradient_radius(&self) -> f32 {
        let r = self.rect;
        let mut radius = match self.state.gradient_radius {
            RadiusKind::Pixels(v) => v,
            RadiusKind::Fraction(v) => {
                v * self.state.width.min(self.state.height).max(0) as f32
            }
            RadiusKind::BoundsFraction(v) => v * r.width().min(r.height()) as f32,
        };
        if self.state.use_level {
            radius *= self.base.level() as f32 / MAX_LEVEL as f32;
        }
        radius
    }

    /// Sets one radius for all four corners, in pixels. Clears any
    /// per-corner radii.
    pub fn set_corner_radius(&mut self, radius: f32) {
        self.state_mut().set_corner_radius(radius);
        self.path_dirty = true;
        self.base.invalidate();
    }

    /// Sets per-corner radii (top-left, top-right, bottom-right,
    /// bottom-left). `None` clears rounding entirely.
    pub fn set_corner_radii(&mut self, radii: Option<[f32; 4]>) {
        self.state_mut().set_corner_radii(radii);
        self.path_dirty = true;
        self.base.invalidate();
    }

    /// Sets the stroke width and color. A width of zero draws no stroke.
    pub fn set_stroke(&mut self, width: f32, color: Color) {
        self.set_stroke_dashed(width, color, 0.0, 0.0);
    }

    /// Sets a dashed stroke. A dash width of zero disables dashing.
    pub fn set_stroke_dashed(&mut self, width: f32, color: Color, dash_width: f32, dash_gap: f32) {
        self.set_stroke_list(width, ColorList::solid(color), dash_width, dash_gap);
    }

    /// Sets the stroke from a state-dependent color list.
    pub fn set_stroke_list(
        &mut self,
        width: f32,
        colors: ColorList,
        dash_width: f32,
        dash_gap: f32,
    ) {
        self.stroke_color = colors.color_for_state(self.base.state());
        let st = self.state_mut();
        st.stroke_width = width;
        st.stroke_color_list = Some(colors);
        st.stroke_dash_width = dash_width;
        st.stroke_dash_gap = dash_gap;
        st.compute_opacity();
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets the intrinsic size reported to hosts.
    pub fn set_size(&mut self, width: i32, height: i32) {
        let st = self.state_mut();
        st.width = width;
        st.height = height;
        self.path_dirty = true;
        self.base.invalidate();
    }

    /// Sets the padding reported to hosts.
    pub fn set_padding(&mut self, padding: Insets) {
        self.state_mut().padding = Some(padding);
        self.base.invalidate();
    }

    /// Sets whether the gradient honors the level property.
    pub fn set_use_level(&mut self, use_level: bool) {
        self.state_mut().use_level = use_level;
        self.gradient_dirty = true;
        self.base.invalidate();
    }

    /// Sets whether a ring's sweep is gated by the level property.
    pub fn set_use_level_for_shape(&mut self, use_level: bool) {
        self.state_mut().use_level_for_shape = use_level;
        self.path_dirty = true;
        self.base.invalidate();
    }

    /// Configures the ring geometry. Literal values take precedence over
    /// the bounds-fraction ratios.
    pub fn set_ring(&mut self, inner_radius: i32, thickness: i32) {
        let st = self.state_mut();
        st.inner_radius = inner_radius;
        st.thickness = thickness;
        self.path_dirty = true;
        self.ring_path = None;
        self.base.invalidate();
    }

    /// Configures ring geometry as ratios of the bounds width.
    pub fn set_ring_ratios(&mut self, inner_radius_ratio: f32, thickness_ratio: f32) {
        let st = self.state_mut();
        st.inner_radius_ratio = inner_radius_ratio;
        st.thickness_ratio = thickness_ratio;
        self.path_dirty = true;
        self.ring_path = None;
        self.base.invalidate();
    }

    /// Defers a property to a theme attribute, resolved by `apply_theme`.
    pub fn defer_to_theme(&mut self, attr: impl Into<String>, target: ShapeAttr) {
        self.state_mut().theme_attrs.push((attr.into(), target));
    }

    /// Rebuilds the fill rect and gradient when dirty. Returns whether the
    /// resulting rect is non-empty.
    fn ensure_valid_rect(&mut self) -> bool {
        if self.gradient_dirty {
            self.gradient_dirty = false;

            let bounds = self.base.bounds();
            let inset = if self.state.stroke_width > 0.0 {
                self.state.stroke_width as f64 * 0.5
            } else {
                0.0
            };
            self.rect = Rect::new(
                bounds.x0 + inset,
                bounds.y0 + inset,
                bounds.x1 - inset,
                bounds.y1 - inset,
            );

            if let Some(colors) = self.state.colors.clone() {
                self.fill_brush = Brush::Gradient(self.build_gradient(&colors));
            } else {
                self.fill_brush = Brush::Solid(self.fill_color);
            }
        }
        self.rect.width() > 0.0 && self.rect.height() > 0.0
    }

    fn build_gradient(&self, colors: &[Color]) -> Gradient {
        let r = self.rect;
        let level = if self.state.use_level {
            self.base.level() as f64 / MAX_LEVEL as f64
        } else {
            1.0
        };
        let center = Point::new(
            r.x0 + (r.x1 - r.x0) * self.state.center_x as f64,
            r.y0 + (r.y1 - r.y0) * self.state.center_y as f64,
        );

        match self.state.gradient {
            GradientKind::Linear => {
                let (start, end) = self.state.orientation.endpoints(r, level);
                Gradient::new_linear(start, end)
                    .with_stops(self.stops(colors).as_slice())
                    .with_extend(Extend::Pad)
            }
            GradientKind::Radial => {
                let mut radius = self.resolved_gradient_radius();
                if radius == 0.0 {
                    // A zero-radius shader is invalid; substitute a
                    // negligible epsilon.
                    radius = 0.001;
                }
                Gradient::new_radial(center, radius)
                    .with_stops(self.stops(colors).as_slice())
                    .with_extend(Extend::Pad)
            }
            GradientKind::Sweep => {
                let stops = if self.state.use_level {
                    // Extend by one synthetic stop pinned at the last color
                    // so the level-scaled sweep has no visible seam.
                    let level = self.base.level() as f32 / MAX_LEVEL as f32;
                    let n = colors.len();
                    let fraction = 1.0 / (n.max(2) - 1) as f32;
                    let mut stops: Vec<(f32, Color)> = colors
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (i as f32 * fraction * level, *c))
                        .collect();
                    stops.push((1.0, colors[n - 1]));
                    stops
                } else {
                    self.stops(colors)
                };
                Gradient::new_sweep(center, 0.0, (2.0 * PI) as f32).with_stops(stops.as_slice())
            }
        }
    }

    fn stops(&self, colors: &[Color]) -> Vec<(f32, Color)> {
        match &self.state.positions {
            Some(positions) => colors
                .iter()
                .zip(positions.iter())
                .map(|(c, p)| (*p, *c))
                .collect(),
            None => {
                let step = 1.0 / (colors.len().max(2) - 1) as f32;
                colors
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i as f32 * step, *c))
                    .collect()
            }
        }
    }

    fn build_path_if_dirty(&mut self) {
        if !self.path_dirty {
            return;
        }
        self.ensure_valid_rect();
        let radii = self.state.radius_array.unwrap_or([0.0; 4]);
        let rounded = RoundedRect::from_rect(
            self.rect,
            (
                radii[0] as f64,
                radii[1] as f64,
                radii[2] as f64,
                radii[3] as f64,
            ),
        );
        self.path = shape_to_path(&rounded);
        self.path_dirty = false;
    }

    fn build_ring(&mut self) -> BezPath {
        if let Some(path) = &self.ring_path {
            if !self.state.use_level_for_shape || !self.path_dirty {
                return path.clone();
            }
        }
        self.path_dirty = false;

        let st = &self.state;
        let bounds = self.rect;
        let x = bounds.x0 + bounds.width() / 2.0;
        let y = bounds.y0 + bounds.height() / 2.0;

        let sweep = if st.use_level_for_shape {
            360.0 * self.base.level() as f64 / MAX_LEVEL as f64
        } else {
            360.0
        };

        let thickness = if st.thickness != -1 {
            st.thickness as f64
        } else {
            bounds.width() / st.thickness_ratio as f64
        };
        let radius = if st.inner_radius != -1 {
            st.inner_radius as f64
        } else {
            bounds.width() / st.inner_radius_ratio as f64
        };

        let center = Point::new(x, y);
        let inner = radius;
        let outer = radius + thickness;

        let mut path = BezPath::new();

        if sweep < 360.0 && sweep > -360.0 {
            // Trace the inner edge out to the outer edge, the outer arc
            // forward, and the inner arc back; even-odd fill closes the
            // wedge-shaped annulus segment.
            path.move_to(Point::new(x + inner, y));
            path.line_to(Point::new(x + outer, y));
            append_arc(&mut path, center, outer, 0.0, sweep.to_radians());
            let end = Point::new(
                x + inner * sweep.to_radians().cos(),
                y + inner * sweep.to_radians().sin(),
            );
            path.line_to(end);
            append_arc(&mut path, center, inner, sweep.to_radians(), -sweep.to_radians());
            path.close_path();
        } else {
            // A full sweep degenerates to two concentric ovals forming a
            // true hollow ring, avoiding an arc seam.
            let outer_rect = Rect::new(x - outer, y - outer, x + outer, y + outer);
            let inner_rect = Rect::new(x - inner, y - inner, x + inner, y + inner);
            path.extend(shape_to_path(&Ellipse::from_rect(outer_rect)));
            path.extend(shape_to_path(&Ellipse::from_rect(inner_rect)));
        }

        self.ring_path = Some(path.clone());
        path
    }

    fn active_filter(&self) -> Option<ColorFilter> {
        self.color_filter.or(self.tint_filter)
    }

    fn update_tint_filter(&mut self) -> bool {
        let next = self.tint_list.as_ref().map(|tint| {
            ColorFilter::new(tint.color_for_state(self.base.state()), self.tint_mode)
        });
        if next != self.tint_filter {
            self.tint_filter = next;
            true
        } else {
            false
        }
    }

    /// The color a paint resolves to after filtering and alpha modulation.
    fn paint_color(&self, color: Color) -> Color {
        let filtered = match self.active_filter() {
            Some(filter) => filter.apply(color),
            None => color,
        };
        let paint_alpha = (filtered.components[3] * 255.0).round() as u8;
        let modulated = modulate_alpha(paint_alpha, self.alpha);
        filtered.with_alpha(modulated as f32 / 255.0)
    }

    fn is_opaque_for_state(&self) -> bool {
        if self.state.stroke_width >= 0.0
            && self.state.stroke_color_list.is_some()
            && !is_opaque(self.stroke_color)
        {
            return false;
        }
        is_opaque(self.fill_color)
    }

    fn stroke_style(&self) -> Stroke {
        let mut style = Stroke::new(self.state.stroke_width as f64);
        if self.state.stroke_dash_width > 0.0 {
            style = style.with_dashes(
                0.0,
                [
                    self.state.stroke_dash_width as f64,
                    self.state.stroke_dash_gap as f64,
                ],
            );
        }
        style
    }
}

fn append_arc(path: &mut BezPath, center: Point, radius: f64, start_angle: f64, sweep_angle: f64) {
    let arc = KurboArc {
        center,
        radii: Vec2::new(radius, radius),
        start_angle,
        sweep_angle,
        x_rotation: 0.0,
    };
    arc.to_cubic_beziers(0.1, |p1, p2, p| {
        path.curve_to(p1, p2, p);
    });
}

impl Drawable for ShapeDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        if !self.ensure_valid_rect() {
            // nothing to draw
            return;
        }

        let fill_alpha = modulate_alpha(
            (self.fill_color.components[3] * 255.0).round() as u8,
            self.alpha,
        );
        let stroke_alpha = modulate_alpha(
            (self.stroke_color.components[3] * 255.0).round() as u8,
            self.alpha,
        );

        let have_fill = fill_alpha > 0 || self.state.colors.is_some();
        let have_stroke = stroke_alpha > 0 && self.state.stroke_width > 0.0;

        // A layer is needed only when fill and stroke would blend against
        // each other: both present, stroke non-opaque, and a global alpha
        // or filter that must apply to their composite.
        let use_layer = have_stroke
            && have_fill
            && self.state.shape != ShapeKind::Line
            && stroke_alpha < 255
            && (self.alpha < 255 || self.active_filter().is_some());

        let (fill_brush, stroke_brush) = if use_layer {
            let rad = self.state.stroke_width as f64;
            let layer_rect = self.rect.inflate(rad, rad);
            canvas.push_layer(
                Mix::Normal,
                self.alpha as f32 / 255.0,
                Affine::IDENTITY,
                &shape_to_path(&layer_rect),
            );
            // The layer applies alpha to the composite; paints keep their
            // own colors.
            (
                self.brush_unmodulated(self.fill_color),
                Brush::Solid(self.stroke_color),
            )
        } else {
            (
                self.modulated_fill_brush(),
                Brush::Solid(self.paint_color(self.stroke_color)),
            )
        };

        let rect = self.rect;
        let stroke_style = self.stroke_style();

        match self.state.shape {
            ShapeKind::Oval => {
                let path = shape_to_path(&Ellipse::from_rect(rect));
                canvas.fill(Fill::NonZero, Affine::IDENTITY, &fill_brush, None, &path);
                if have_stroke {
                    canvas.stroke(&stroke_style, Affine::IDENTITY, &stroke_brush, None, &path);
                }
            }
            ShapeKind::Line => {
                if have_stroke {
                    let y = rect.y0 + rect.height() / 2.0;
                    let line = Line::new(Point::new(rect.x0, y), Point::new(rect.x1, y));
                    canvas.stroke(
                        &stroke_style,
                        Affine::IDENTITY,
                        &stroke_brush,
                        None,
                        &shape_to_path(&line),
                    );
                }
            }
            ShapeKind::Rectangle => {
                if self.state.radius_array.is_some() {
                    self.build_path_if_dirty();
                    let path = self.path.clone();
                    canvas.fill(Fill::NonZero, Affine::IDENTITY, &fill_brush, None, &path);
                    if have_stroke {
                        canvas.stroke(&stroke_style, Affine::IDENTITY, &stroke_brush, None, &path);
                    }
                } else if self.state.radius > 0.0 {
                    // A single radius is clamped so a rect that is small in
                    // one dimension still shows circular corners rather
                    // than thin ellipses.
                    let rad = (self.state.radius as f64)
                        .min(rect.width().min(rect.height()) * 0.5);
                    let path = shape_to_path(&RoundedRect::from_rect(rect, rad));
                    canvas.fill(Fill::NonZero, Affine::IDENTITY, &fill_brush, None, &path);
                    if have_stroke {
                        canvas.stroke(&stroke_style, Affine::IDENTITY, &stroke_brush, None, &path);
                    }
                } else {
                    let draw_fill = self.fill_color != Color::TRANSPARENT
                        || self.active_filter().is_some()
                        || self.state.colors.is_some();
                    let path = shape_to_path(&rect);
                    if draw_fill {
                        canvas.fill(Fill::NonZero, Affine::IDENTITY, &fill_brush, None, &path);
                    }
                    if have_stroke {
                        canvas.stroke(&stroke_style, Affine::IDENTITY, &stroke_brush, None, &path);
                    }
                }
            }
            ShapeKind::Ring => {
                let path = self.build_ring();
                canvas.fill(Fill::EvenOdd, Affine::IDENTITY, &fill_brush, None, &path);
                if have_stroke {
                    canvas.stroke(&stroke_style, Affine::IDENTITY, &stroke_brush, None, &path);
                }
            }
        }

        if use_layer {
            canvas.pop_layer();
        }
    }

    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn on_bounds_change(&mut self) {
        self.gradient_dirty = true;
        self.path_dirty = true;
        self.ring_path = None;
    }

    fn on_level_change(&mut self) -> bool {
        self.gradient_dirty = true;
        self.path_dirty = true;
        self.base.invalidate();
        true
    }

    fn on_state_change(&mut self) -> bool {
        let mut changed = false;
        let state = self.base.state();

        if let Some(list) = &self.state.color_list {
            let next = list.color_for_state(state);
            if next != self.fill_color {
                self.fill_color = next;
                self.gradient_dirty = true;
                changed = true;
            }
        }
        if let Some(list) = &self.state.stroke_color_list {
            let next = list.color_for_state(state);
            if next != self.stroke_color {
                self.stroke_color = next;
                changed = true;
            }
        }
        if self.update_tint_filter() {
            changed = true;
        }

        if changed {
            self.base.invalidate();
        }
        changed
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
        if self.update_tint_filter() {
            self.base.invalidate();
        }
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.tint_mode = mode;
        if self.update_tint_filter() {
            self.base.invalidate();
        }
    }

    fn opacity(&self) -> Opacity {
        if self.alpha == 255 && self.state.opaque_over_bounds && self.is_opaque_for_state() {
            Opacity::Opaque
        } else {
            Opacity::Translucent
        }
    }

    fn intrinsic_width(&self) -> i32 {
        self.state.width
    }

    fn intrinsic_height(&self) -> i32 {
        self.state.height
    }

    fn padding(&self) -> Option<Insets> {
        self.state.padding
    }

    fn is_stateful(&self) -> bool {
        self.state
            .color_list
            .as_ref()
            .map(ColorList::is_stateful)
            .unwrap_or(false)
            || self
                .state
                .stroke_color_list
                .as_ref()
                .map(ColorList::is_stateful)
                .unwrap_or(false)
            || self
                .tint_list
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
            self.initialize_from_state();
            self.mutated = true;
        }
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        let attrs = std::mem::take(&mut self.state_mut().theme_attrs);
        for (attr, target) in &attrs {
            match target {
                ShapeAttr::Solid => {
                    if let Some(list) = theme.color_list(attr) {
                        self.set_color_list(Some(list));
                    }
                }
                ShapeAttr::StrokeColor => {
                    if let Some(list) = theme.color_list(attr) {
                        let st = &self.state;
                        let (width, dash_width, dash_gap) = (
                            st.stroke_width.max(0.0),
                            st.stroke_dash_width,
                            st.stroke_dash_gap,
                        );
                        self.set_stroke_list(width, list, dash_width, dash_gap);
                    }
                }
                ShapeAttr::CornerRadius => {
                    if let Some(radius) = theme.dimension(attr) {
                        self.set_corner_radius(radius as f32);
                    }
                }
                ShapeAttr::Width => {
                    if let Some(width) = theme.dimension(attr) {
                        let height = self.state.height;
                        self.set_size(width as i32, height);
                    }
                }
                ShapeAttr::Height => {
                    if let Some(height) = theme.dimension(attr) {
                        let width = self.state.width;
                        self.set_size(width, height as i32);
                    }
                }
            }
        }
        self.state_mut().compute_opacity();
    }

    fn can_apply_theme(&self) -> bool {
        !self.state.theme_attrs.is_empty()
    }
}

impl ShapeDrawable {
    fn modulated_fill_brush(&self) -> Brush {
        match &self.fill_brush {
            Brush::Gradient(gradient) => {
                if self.alpha == 0xFF && self.active_filter().is_none() {
                    self.fill_brush.clone()
                } else {
                    let mut gradient = gradient.clone();
                    let filter = self.active_filter();
                    for stop in gradient.stops.iter_mut() {
                        let mut color = stop.color.to_alpha_color::<Srgb>();
                        if let Some(filter) = filter {
                            color = filter.apply(color);
                        }
                        color = color.multiply_alpha(self.alpha as f32 / 255.0);
                        stop.color = DynamicColor::from_alpha_color(color);
                    }
                    Brush::Gradient(gradient)
                }
            }
            Brush::Solid(_) => Brush::Solid(self.paint_color(self.fill_color)),
            other => other.clone(),
        }
    }

    fn brush_unmodulated(&self, fallback: Color) -> Brush {
        match &self.fill_brush {
            Brush::Gradient(_) => self.fill_brush.clone(),
            _ => Brush::Solid(fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawkit_core::canvas::{CanvasOp, RecordingCanvas};
    use drawkit_core::state::{StateSet, StateSpec};
    use vello::kurbo::Shape;

    fn bounds(drawable: &mut ShapeDrawable, w: f64, h: f64) {
        drawable.set_bounds(Rect::new(0.0, 0.0, w, h));
    }

    #[test]
    fn test_solid_rect_fill() {
        let mut shape = ShapeDrawable::with_color(Color::from_rgb8(10, 20, 30));
        bounds(&mut shape, 100.0, 50.0);

        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);

        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].solid_color(), Some(Color::from_rgb8(10, 20, 30)));
        let bbox = fills[0].bounding_box().unwrap();
        assert_eq!(bbox, Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_empty_bounds_draw_nothing() {
        let mut shape = ShapeDrawable::with_color(Color::BLACK);
        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn test_stroke_insets_fill_rect() {
        let mut shape = ShapeDrawable::with_color(Color::BLACK);
        shape.set_stroke(10.0, Color::from_rgb8(1, 1, 1));
        bounds(&mut shape, 100.0, 100.0);

        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);

        // The fill rect is inset by half the stroke width to keep the
        // stroke centered on the boundary.
        let bbox = canvas.fills()[0].bounding_box().unwrap();
        assert_eq!(bbox, Rect::new(5.0, 5.0, 95.0, 95.0));
        assert_eq!(canvas.strokes().len(), 1);
    }

    #[test]
    fn test_corner_radius_clamp_idempotent() {
        let draw_with_radius = |radius: f32| {
            let mut shape = ShapeDrawable::with_color(Color::BLACK);
            shape.set_corner_radius(radius);
            bounds(&mut shape, 100.0, 40.0);
            let mut canvas = RecordingCanvas::new();
            shape.draw(&mut canvas);
            match &canvas.ops()[0] {
                CanvasOp::Fill { shape, .. } => shape.clone(),
                op => panic!("expected fill, got {op:?}"),
            }
        };

        // Any radius at or above half the shorter dimension renders the
        // same as exactly half of it.
        let clamped = draw_with_radius(20.0);
        let huge = draw_with_radius(500.0);
        assert_eq!(clamped.elements().len(), huge.elements().len());
        assert_eq!(
            clamped.bounding_box(),
            huge.bounding_box(),
        );
    }

    #[test]
    fn test_radius_and_radii_are_exclusive() {
        let mut shape = ShapeDrawable::with_color(Color::BLACK);
        shape.set_corner_radius(8.0);
        shape.set_corner_radii(Some([1.0, 2.0, 3.0, 4.0]));
        assert!(shape.state.radius_array.is_some());
        shape.set_corner_radii(None);
        assert_eq!(shape.state.radius, 0.0);
        assert!(shape.state.radius_array.is_none());
    }

    #[test]
    fn test_ring_degeneracy() {
        let ring_path = |level: i32| {
            let mut shape = ShapeDrawable::with_color(Color::BLACK);
            shape.set_shape(ShapeKind::Ring);
            shape.set_use_level_for_shape(true);
            bounds(&mut shape, 90.0, 90.0);
            shape.set_level(level);
            let mut canvas = RecordingCanvas::new();
            shape.draw(&mut canvas);
            match &canvas.ops()[0] {
                CanvasOp::Fill { shape, rule, .. } => (shape.clone(), *rule),
                op => panic!("expected fill, got {op:?}"),
            }
        };

        // A zero sweep produces an empty path.
        let (empty, _) = ring_path(0);
        assert!(empty.bounding_box().area().abs() < 1e-6);

        // A full sweep produces the two-oval annulus.
        let (full, rule) = ring_path(MAX_LEVEL);
        assert_eq!(rule, Fill::EvenOdd);
        let bbox = full.bounding_box();
        // Outer radius = inner (90/3=30) + thickness (90/9=10) = 40,
        // centered in the 90x90 bounds.
        assert!((bbox.width() - 80.0).abs() < 0.5);
        assert!((bbox.height() - 80.0).abs() < 0.5);
    }

    #[test]
    fn test_linear_gradient_level_gating() {
        let mut shape = ShapeDrawable::with_gradient(
            Orientation::LeftRight,
            vec![Color::from_rgb8(255, 0, 0), Color::from_rgb8(0, 0, 255)],
        );
        shape.set_use_level(true);
        bounds(&mut shape, 100.0, 10.0);
        shape.set_level(5000);

        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);

        match &canvas.ops()[0] {
            CanvasOp::Fill { brush, .. } => match brush {
                Brush::Gradient(gradient) => match gradient.kind {
                    vello::peniko::GradientKind::Linear(
                        vello::peniko::LinearGradientPosition { start, end },
                    ) => {
                        assert_eq!(start, Point::new(0.0, 0.0));
                        // End x is scaled by level/10000.
                        assert_eq!(end, Point::new(50.0, 0.0));
                    }
                    ref kind => panic!("expected linear gradient, got {kind:?}"),
                },
                _ => panic!("expected gradient brush"),
            },
            op => panic!("expected fill, got {op:?}"),
        }
    }

    #[test]
    fn test_radial_zero_radius_nudged() {
        let mut shape = ShapeDrawable::with_gradient(
            Orientation::TopBottom,
            vec![Color::BLACK, Color::WHITE],
        );
        shape.set_gradient_kind(GradientKind::Radial);
        shape.set_gradient_radius(RadiusKind::Pixels(0.0));
        bounds(&mut shape, 10.0, 10.0);

        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);

        match &canvas.ops()[0] {
            CanvasOp::Fill { brush, .. } => match brush {
                Brush::Gradient(gradient) => match gradient.kind {
                    vello::peniko::GradientKind::Radial(
                        vello::peniko::RadialGradientPosition { end_radius, .. },
                    ) => {
                        assert!(end_radius > 0.0);
                    }
                    ref kind => panic!("expected radial gradient, got {kind:?}"),
                },
                _ => panic!("expected gradient brush"),
            },
            op => panic!("expected fill, got {op:?}"),
        }
    }

    #[test]
    fn test_stateful_fill_color() {
        let mut shape = ShapeDrawable::new();
        shape.set_color_list(Some(ColorList::new(vec![
            (
                StateSpec::requires(StateSet::PRESSED),
                Color::from_rgb8(255, 0, 0),
            ),
            (StateSpec::WILDCARD, Color::from_rgb8(0, 255, 0)),
        ])));
        bounds(&mut shape, 10.0, 10.0);

        assert!(shape.is_stateful());
        assert!(shape.set_state(StateSet::PRESSED));

        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);
        assert_eq!(
            canvas.fills()[0].solid_color(),
            Some(Color::from_rgb8(255, 0, 0))
        );

        // Same resolved color for a different state: no appearance change.
        assert!(!shape.set_state(StateSet::PRESSED | StateSet::ENABLED));
    }

    #[test]
    fn test_opacity_follows_shape() {
        let mut shape = ShapeDrawable::with_color(Color::from_rgb8(0, 0, 0));
        assert_eq!(shape.opacity(), Opacity::Opaque);

        shape.set_corner_radius(4.0);
        assert_eq!(shape.opacity(), Opacity::Translucent);

        shape.set_corner_radius(0.0);
        assert_eq!(shape.opacity(), Opacity::Opaque);

        shape.set_alpha(128);
        assert_eq!(shape.opacity(), Opacity::Translucent);
    }

    #[test]
    fn test_mutate_isolation() {
        let mut a = ShapeDrawable::with_color(Color::from_rgb8(1, 2, 3));
        let state = a.constant_state().unwrap();
        let mut b = state.new_drawable();

        a.mutate();
        a.set_color(Color::from_rgb8(200, 0, 0));
        bounds(&mut a, 10.0, 10.0);
        b.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));

        let mut canvas = RecordingCanvas::new();
        b.draw(&mut canvas);
        assert_eq!(
            canvas.fills()[0].solid_color(),
            Some(Color::from_rgb8(1, 2, 3))
        );
    }

    #[test]
    fn test_gradient_angle_validation() {
        let mut shape = ShapeDrawable::new();
        assert!(shape.set_gradient_angle(90).is_ok());
        assert!(matches!(
            shape.set_gradient_angle(30),
            Err(DrawableError::InvalidGradientAngle { angle: 30 })
        ));
    }

    #[test]
    fn test_theme_deferral() {
        use drawkit_core::theme::{AttrValue, MapTheme};

        let mut shape = ShapeDrawable::new();
        shape.defer_to_theme("accent", ShapeAttr::Solid);
        assert!(shape.can_apply_theme());

        let theme =
            MapTheme::new().with("accent", AttrValue::Color(Color::from_rgb8(9, 9, 9)));
        shape.apply_theme(&theme);

        assert!(!shape.can_apply_theme());
        bounds(&mut shape, 4.0, 4.0);
        let mut canvas = RecordingCanvas::new();
        shape.draw(&mut canvas);
        assert_eq!(
            canvas.fills()[0].solid_color(),
            Some(Color::from_rgb8(9, 9, 9))
        );
    }
}
