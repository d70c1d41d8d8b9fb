//! Progress drawables: a level-driven horizontal bar built from stacked
//! layers, and a clock-sampled indeterminate spinner.

use std::f64::consts::PI;
use std::sync::Arc;

use drawkit_core::canvas::{shape_to_path, Canvas};
use drawkit_core::color::{modulate_alpha, BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{
    Animatable, Drawable, DrawableBase, DrawableState, Opacity, MAX_LEVEL,
};
use drawkit_core::geometry::{constrain, lerp, Insets};
use drawkit_core::theme::Theme;
use vello::kurbo::{Affine, Arc as KurboArc, BezPath, Point, Rect, Stroke, Vec2};
use vello::peniko::{Brush, Color, Fill};

use crate::layer::{LayerDrawable, LayerId};

/// Layer id of the track behind a horizontal progress bar.
pub const TRACK_LAYER_ID: LayerId = 1;
/// Layer id of the secondary (buffered) progress bar.
pub const SECONDARY_LAYER_ID: LayerId = 2;
/// Layer id of the primary progress bar.
pub const PRIMARY_LAYER_ID: LayerId = 3;

/// Theme attribute consulted for the bar color.
pub const ATTR_COLOR_CONTROL_ACTIVATED: &str = "color_control_activated";
/// Theme attribute consulted for the track alpha.
pub const ATTR_DISABLED_ALPHA: &str = "disabled_alpha";

const BAR_INTRINSIC_HEIGHT: i32 = 16;
const BAR_VERTICAL_PADDING: i32 = 6;
const SPINNER_INTRINSIC_SIZE: i32 = 48;
const SPINNER_PADDING: i32 = 6;
const SPINNER_STROKE_WIDTH: f64 = 4.0;

const DEFAULT_ACTIVATED_COLOR: Color = Color::from_rgb8(0x42, 0x85, 0xF4);
const DEFAULT_DISABLED_ALPHA: f32 = 0.3;

/// Shared configuration of a [`ProgressBarDrawable`].
#[derive(Debug, Clone)]
pub struct ProgressBarState {
    color: Color,
    /// Whether the filled width follows the level (false draws the full
    /// track).
    fill_level: bool,
    use_intrinsic_padding: bool,
    base_alpha: f32,
}

impl DrawableState for ProgressBarState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(ProgressBarDrawable::from_state(self))
    }
}

/// A single horizontal bar. As the level moves from 0 to 10000 the filled
/// width sweeps across the bounds; a track variant ignores the level and
/// fills the whole width at a reduced base alpha.
pub struct ProgressBarDrawable {
    base: DrawableBase,
    state: Arc<ProgressBarState>,
    alpha: u8,
    color_filter: Option<ColorFilter>,
    tint_list: Option<ColorList>,
    tint_mode: BlendMode,
    mutated: bool,
}

impl ProgressBarDrawable {
    /// Creates a level-driven bar.
    pub fn bar(color: Color) -> Self {
        Self::from_state(Arc::new(ProgressBarState {
            color,
            fill_level: true,
            use_intrinsic_padding: true,
            base_alpha: 1.0,
        }))
    }

    /// Creates a full-width track at the given base alpha.
    pub fn track(color: Color, base_alpha: f32) -> Self {
        Self::from_state(Arc::new(ProgressBarState {
            color,
            fill_level: false,
            use_intrinsic_padding: true,
            base_alpha,
        }))
    }

    /// Creates an instance backed by shared constant state.
    pub fn from_state(state: Arc<ProgressBarState>) -> Self {
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

    fn state_mut(&mut self) -> &mut ProgressBarState {
        Arc::make_mut(&mut self.state)
    }

    /// Whether the intrinsic vertical padding is reported.
    pub fn set_use_intrinsic_padding(&mut self, use_padding: bool) {
        if self.state.use_intrinsic_padding != use_padding {
            self.state_mut().use_intrinsic_padding = use_padding;
            self.base.invalidate();
        }
    }

    fn effective_color(&self) -> Color {
        let mut color = self.state.color;
        if let Some(tint) = &self.tint_list {
            color = ColorFilter::new(tint.color_for_state(self.base.state()), self.tint_mode)
                .apply(color);
        }
        if let Some(filter) = self.color_filter {
            color = filter.apply(color);
        }
        let paint_alpha = (color.components[3] * self.state.base_alpha * 255.0).round() as u8;
        let modulated = modulate_alpha(paint_alpha, self.alpha);
        color.with_alpha(modulated as f32 / 255.0)
    }
}

impl Drawable for ProgressBarDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        let bounds = self.base.bounds();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }

        let pad = if self.state.use_intrinsic_padding {
            f64::from(BAR_VERTICAL_PADDING)
        } else {
            0.0
        };
        let top = (bounds.y0 + pad).min(bounds.y1);
        let bottom = (bounds.y1 - pad).max(top);

        let width = if self.state.fill_level {
            bounds.width() * f64::from(self.base.level()) / f64::from(MAX_LEVEL)
        } else {
            bounds.width()
        };
        if width <= 0.0 {
            return;
        }

        let rect = Rect::new(bounds.x0, top, bounds.x0 + width, bottom);
        canvas.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            &Brush::Solid(self.effective_color()),
            None,
            &shape_to_path(&rect),
        );
    }

    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn on_level_change(&mut self) -> bool {
        if self.state.fill_level {
            self.base.invalidate();
            true
        } else {
            false
        }
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
        Opacity::Translucent
    }

    fn intrinsic_height(&self) -> i32 {
        BAR_INTRINSIC_HEIGHT
    }

    fn padding(&self) -> Option<Insets> {
        self.state
            .use_intrinsic_padding
            .then_some(Insets::of(0, BAR_VERTICAL_PADDING, 0, BAR_VERTICAL_PADDING))
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

/// A determinate horizontal progress bar: a dimmed track, a secondary
/// (buffered) bar and a primary bar, stacked as layers.
///
/// Drive it through the layer ids: set the level of
/// [`PRIMARY_LAYER_ID`]/[`SECONDARY_LAYER_ID`] via
/// [`set_progress`](Self::set_progress) and
/// [`set_secondary_progress`](Self::set_secondary_progress).
pub struct HorizontalProgressDrawable {
    layer: LayerDrawable,
    show_track: bool,
}

impl Default for HorizontalProgressDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl HorizontalProgressDrawable {
    /// Creates a bar with the default accent color and track alpha.
    pub fn new() -> Self {
        Self::with_colors(DEFAULT_ACTIVATED_COLOR, DEFAULT_DISABLED_ALPHA)
    }

    /// Creates a bar colored from the theme's
    /// [`ATTR_COLOR_CONTROL_ACTIVATED`] and [`ATTR_DISABLED_ALPHA`].
    pub fn from_theme(theme: &dyn Theme) -> Self {
        let color = theme
            .color(ATTR_COLOR_CONTROL_ACTIVATED)
            .unwrap_or(DEFAULT_ACTIVATED_COLOR);
        let alpha = theme
            .float(ATTR_DISABLED_ALPHA)
            .unwrap_or(DEFAULT_DISABLED_ALPHA);
        Self::with_colors(color, alpha)
    }

    /// Creates a bar with an explicit color and track alpha.
    pub fn with_colors(color: Color, track_alpha: f32) -> Self {
        let mut layer = LayerDrawable::new();
        layer.add_layer_with(
            Box::new(ProgressBarDrawable::track(color, track_alpha)),
            Some(TRACK_LAYER_ID),
            Insets::ZERO,
        );
        // The secondary bar is level-driven like the primary but shares
        // the track alpha, so buffered progress reads as a lighter band.
        let secondary = ProgressBarDrawable::from_state(Arc::new(ProgressBarState {
            color,
            fill_level: true,
            use_intrinsic_padding: true,
            base_alpha: track_alpha,
        }));
        layer.add_layer_with(Box::new(secondary), Some(SECONDARY_LAYER_ID), Insets::ZERO);
        layer.add_layer_with(
            Box::new(ProgressBarDrawable::bar(color)),
            Some(PRIMARY_LAYER_ID),
            Insets::ZERO,
        );
        Self {
            layer,
            show_track: true,
        }
    }

    /// Sets the primary progress level (0–10000).
    pub fn set_progress(&mut self, level: i32) {
        if let Some(primary) = self.layer.find_by_layer_id(PRIMARY_LAYER_ID) {
            primary.set_level(level);
        }
    }

    /// Sets the secondary (buffered) progress level (0–10000).
    pub fn set_secondary_progress(&mut self, level: i32) {
        if let Some(secondary) = self.layer.find_by_layer_id(SECONDARY_LAYER_ID) {
            secondary.set_level(level);
        }
    }

    /// Whether the dimmed track behind the bars is drawn.
    pub fn show_track(&self) -> bool {
        self.show_track
    }

    /// Shows or hides the dimmed track.
    pub fn set_show_track(&mut self, show: bool) {
        if self.show_track != show {
            self.show_track = show;
            if let Some(track) = self.layer.find_by_layer_id(TRACK_LAYER_ID) {
                track.set_visible(show, false);
            }
            self.layer.base().invalidate();
        }
    }

    /// Toggles intrinsic padding on every bar.
    pub fn set_use_intrinsic_padding(&mut self, use_padding: bool) {
        for id in [TRACK_LAYER_ID, SECONDARY_LAYER_ID, PRIMARY_LAYER_ID] {
            if let Some(bar) = self.layer.find_by_layer_id(id) {
                if let Some(bar) = bar.as_any_mut().downcast_mut::<ProgressBarDrawable>() {
                    bar.set_use_intrinsic_padding(use_padding);
                }
            }
        }
    }

    /// The backing layer stack.
    pub fn layers_mut(&mut self) -> &mut LayerDrawable {
        &mut self.layer
    }
}

impl Drawable for HorizontalProgressDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        for index in 0..self.layer.layer_count() {
            if index == 0 && !self.show_track {
                continue;
            }
            if let Some(child) = self.layer.drawable_mut(index) {
                child.draw(canvas);
            }
        }
    }

    fn base(&self) -> &DrawableBase {
        self.layer.base()
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        self.layer.base_mut()
    }

    fn on_bounds_change(&mut self) {
        self.layer.on_bounds_change();
    }

    fn on_state_change(&mut self) -> bool {
        self.layer.on_state_change()
    }

    fn on_level_change(&mut self) -> bool {
        // The overall level drives the primary bar, matching hosts that
        // only know the drawable contract.
        let level = self.base().level();
        if let Some(primary) = self.layer.find_by_layer_id(PRIMARY_LAYER_ID) {
            return primary.set_level(level);
        }
        false
    }

    fn set_alpha(&mut self, alpha: u8) {
        self.layer.set_alpha(alpha);
    }

    fn alpha(&self) -> u8 {
        self.layer.alpha()
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        self.layer.set_color_filter(filter);
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        self.layer.set_tint_list(tint);
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.layer.set_tint_mode(mode);
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        self.layer.set_visible(visible, restart)
    }

    fn opacity(&self) -> Opacity {
        Opacity::Translucent
    }

    fn intrinsic_height(&self) -> i32 {
        self.layer.intrinsic_height()
    }

    fn padding(&self) -> Option<Insets> {
        self.layer.padding()
    }

    fn is_stateful(&self) -> bool {
        self.layer.is_stateful()
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        None
    }

    fn mutate(&mut self) {
        self.layer.mutate();
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        self.layer.apply_theme(theme);
    }
}

/// An indeterminate circular spinner: a stroked arc whose sweep breathes
/// while the whole figure rotates, sampled from the clock.
pub struct IndeterminateProgressDrawable {
    base: DrawableBase,
    color: Color,
    alpha: u8,
    use_intrinsic_padding: bool,
    running: bool,
    start_time: u64,
}

impl Default for IndeterminateProgressDrawable {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATED_COLOR)
    }
}

impl IndeterminateProgressDrawable {
    /// Sweep cycle length in milliseconds.
    const CYCLE: u64 = 1333;
    /// Full-figure rotation period in milliseconds.
    const ROTATION: u64 = 2200;
    const MIN_SWEEP_DEG: f32 = 30.0;
    const MAX_SWEEP_DEG: f32 = 270.0;

    /// Creates a spinner in the given color.
    pub fn new(color: Color) -> Self {
        Self {
            base: DrawableBase::new(),
            color,
            alpha: 0xFF,
            use_intrinsic_padding: true,
            running: false,
            start_time: 0,
        }
    }

    /// Creates a spinner colored from [`ATTR_COLOR_CONTROL_ACTIVATED`].
    pub fn from_theme(theme: &dyn Theme) -> Self {
        Self::new(
            theme
                .color(ATTR_COLOR_CONTROL_ACTIVATED)
                .unwrap_or(DEFAULT_ACTIVATED_COLOR),
        )
    }

    /// Whether the intrinsic padding is reported.
    pub fn set_use_intrinsic_padding(&mut self, use_padding: bool) {
        if self.use_intrinsic_padding != use_padding {
            self.use_intrinsic_padding = use_padding;
            self.base.invalidate();
        }
    }

    /// The arc geometry at `elapsed` milliseconds: (start, sweep) degrees.
    fn arc_at(&self, elapsed: u64) -> (f32, f32) {
        let cycle_count = (elapsed / Self::CYCLE) as f32;
        let t = (elapsed % Self::CYCLE) as f32 / Self::CYCLE as f32;

        // The sweep grows over the first half-cycle and collapses over the
        // second; the head keeps advancing so collapse pulls the tail.
        let eased = |f: f32| f * f * (3.0 - 2.0 * f);
        let sweep = if t < 0.5 {
            lerp(Self::MIN_SWEEP_DEG, Self::MAX_SWEEP_DEG, eased(t * 2.0))
        } else {
            lerp(Self::MAX_SWEEP_DEG, Self::MIN_SWEEP_DEG, eased((t - 0.5) * 2.0))
        };

        let head = if t < 0.5 {
            0.0
        } else {
            (Self::MAX_SWEEP_DEG - Self::MIN_SWEEP_DEG) * eased((t - 0.5) * 2.0)
        };
        let rotation = (elapsed % Self::ROTATION) as f32 / Self::ROTATION as f32 * 360.0;
        let per_cycle = cycle_count * (Self::MAX_SWEEP_DEG - Self::MIN_SWEEP_DEG);

        let start = rotation + per_cycle + head;
        (start % 360.0, constrain(sweep, Self::MIN_SWEEP_DEG, Self::MAX_SWEEP_DEG))
    }
}

impl Animatable for IndeterminateProgressDrawable {
    fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.start_time = self.base.now();
            self.base.schedule(self.start_time + 1000 / 60);
            self.base.invalidate();
        }
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.base.unschedule();
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drawable for IndeterminateProgressDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        let bounds = self.base.bounds();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }

        let pad = if self.use_intrinsic_padding {
            f64::from(SPINNER_PADDING)
        } else {
            0.0
        };
        let radius = ((bounds.width().min(bounds.height()) / 2.0) - pad - SPINNER_STROKE_WIDTH)
            .max(1.0);
        let center = bounds.center();

        let elapsed = if self.running {
            self.base.now().saturating_sub(self.start_time)
        } else {
            0
        };
        let (start_deg, sweep_deg) = self.arc_at(elapsed);

        let start_angle = f64::from(start_deg) * PI / 180.0;
        let arc = KurboArc {
            center: Point::new(center.x, center.y),
            radii: Vec2::new(radius, radius),
            start_angle,
            sweep_angle: f64::from(sweep_deg) * PI / 180.0,
            x_rotation: 0.0,
        };
        let start_point = Point::new(
            center.x + radius * start_angle.cos(),
            center.y + radius * start_angle.sin(),
        );
        let mut path = BezPath::new();
        path.move_to(start_point);
        arc.to_cubic_beziers(0.1, |p1, p2, p| {
            path.curve_to(p1, p2, p);
        });

        let paint = self.color.multiply_alpha(self.alpha as f32 / 255.0);
        canvas.stroke(
            &Stroke::new(SPINNER_STROKE_WIDTH),
            Affine::IDENTITY,
            &Brush::Solid(paint),
            None,
            &path,
        );

        if self.running {
            let now = self.base.now();
            self.base.schedule(now + 1000 / 60);
            self.base.invalidate();
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
        if let Some(filter) = filter {
            self.color = filter.apply(self.color);
            self.base.invalidate();
        }
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        if let Some(tint) = tint {
            self.color = tint.color_for_state(self.base.state());
            self.base.invalidate();
        }
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        let changed = self.base.is_visible() != visible;
        if changed {
            self.base.set_visible_raw(visible);
            self.base.invalidate();
        }
        if !visible {
            self.stop();
        } else if restart {
            self.running = false;
            self.start();
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        Opacity::Translucent
    }

    fn intrinsic_width(&self) -> i32 {
        SPINNER_INTRINSIC_SIZE
    }

    fn intrinsic_height(&self) -> i32 {
        SPINNER_INTRINSIC_SIZE
    }

    fn padding(&self) -> Option<Insets> {
        self.use_intrinsic_padding
            .then_some(Insets::uniform(SPINNER_PADDING))
    }

    fn as_animatable(&mut self) -> Option<&mut dyn Animatable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawkit_core::canvas::{CanvasOp, RecordingCanvas};
    use drawkit_core::clock::ManualClock;

    #[test]
    fn test_bar_width_follows_level() {
        let mut bar = ProgressBarDrawable::bar(Color::from_rgb8(10, 10, 10));
        bar.set_use_intrinsic_padding(false);
        bar.set_bounds(Rect::new(0.0, 0.0, 200.0, 16.0));

        let width_at = |bar: &mut ProgressBarDrawable, level: i32| {
            bar.set_level(level);
            let mut canvas = RecordingCanvas::new();
            bar.draw(&mut canvas);
            canvas
                .fills()
                .first()
                .and_then(|op| op.bounding_box())
                .map(|b| b.width())
                .unwrap_or(0.0)
        };

        assert_eq!(width_at(&mut bar, 0), 0.0);
        assert_eq!(width_at(&mut bar, 5000), 100.0);
        assert_eq!(width_at(&mut bar, MAX_LEVEL), 200.0);
    }

    #[test]
    fn test_track_ignores_level_and_dims() {
        let mut track = ProgressBarDrawable::track(Color::from_rgb8(10, 10, 10), 0.25);
        track.set_use_intrinsic_padding(false);
        track.set_bounds(Rect::new(0.0, 0.0, 100.0, 16.0));
        assert!(!track.set_level(2500));

        let mut canvas = RecordingCanvas::new();
        track.draw(&mut canvas);
        let op = &canvas.fills()[0];
        assert_eq!(op.bounding_box().unwrap().width(), 100.0);
        let alpha = op.solid_color().unwrap().components[3];
        assert!((alpha - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_horizontal_progress_layers() {
        let mut progress = HorizontalProgressDrawable::new();
        progress.set_bounds(Rect::new(0.0, 0.0, 100.0, 16.0));
        progress.set_use_intrinsic_padding(false);
        progress.set_progress(5000);
        progress.set_secondary_progress(7500);

        let mut canvas = RecordingCanvas::new();
        progress.draw(&mut canvas);
        let widths: Vec<f64> = canvas
            .fills()
            .iter()
            .map(|op| op.bounding_box().unwrap().width())
            .collect();
        // Track full width, secondary at 75%, primary at 50%.
        assert_eq!(widths, vec![100.0, 75.0, 50.0]);

        progress.set_show_track(false);
        let mut canvas = RecordingCanvas::new();
        progress.draw(&mut canvas);
        assert_eq!(canvas.fills().len(), 2);
    }

    #[test]
    fn test_spinner_arc_varies_over_time() {
        let clock = ManualClock::shared(0);
        let mut spinner = IndeterminateProgressDrawable::new(Color::from_rgb8(1, 2, 3));
        spinner.base_mut().set_clock(clock.clone());
        spinner.set_bounds(Rect::new(0.0, 0.0, 48.0, 48.0));
        spinner.start();
        assert!(spinner.is_running());

        let stroke_at = |spinner: &mut IndeterminateProgressDrawable| {
            let mut canvas = RecordingCanvas::new();
            spinner.draw(&mut canvas);
            match &canvas.ops()[0] {
                CanvasOp::Stroke { shape, .. } => shape.clone(),
                op => panic!("expected stroke, got {op:?}"),
            }
        };

        let early = stroke_at(&mut spinner);
        clock.advance(600);
        let later = stroke_at(&mut spinner);
        // The arc changed shape as the sweep grew.
        assert_ne!(early.elements().len(), 0);
        assert_ne!(
            format!("{early:?}"),
            format!("{later:?}")
        );

        spinner.stop();
        assert!(!spinner.is_running());
    }

    #[test]
    fn test_spinner_is_deterministic_for_equal_times() {
        let arc = |millis: u64| {
            let spinner = IndeterminateProgressDrawable::new(Color::BLACK);
            spinner.arc_at(millis)
        };
        assert_eq!(arc(500), arc(500));
        assert_ne!(arc(100), arc(700));
    }
}
