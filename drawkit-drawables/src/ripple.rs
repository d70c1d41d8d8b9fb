//! Touch-feedback ripples: per-touch expanding circles and a soft
//! background sheen, composited over content layers.
//!
//! The tween math mirrors the material ripple: enter radius grows with a
//! square-root-of-size duration after a short press delay, exit decelerates
//! on a log curve while opacity decays linearly. All progress is sampled
//! from the owner's clock.

use std::sync::Arc;

use drawkit_core::canvas::{shape_to_path, Canvas};
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::geometry::{constrain, lerp, Insets};
use drawkit_core::state::StateSet;
use drawkit_core::theme::Theme;
use vello::kurbo::{Affine, Circle, Point, Rect};
use vello::peniko::{Brush, Color, Fill};

use crate::layer::{LayerDrawable, LayerState};

const GLOBAL_SPEED: f32 = 1.0;
const WAVE_OPACITY_DECAY_VELOCITY: f32 = 3.0 / GLOBAL_SPEED;
const WAVE_TOUCH_DOWN_ACCELERATION: f32 = 1024.0 * GLOBAL_SPEED;
const WAVE_TOUCH_UP_ACCELERATION: f32 = 3400.0 * GLOBAL_SPEED;
const RIPPLE_ENTER_DELAY: u64 = 80;

const WAVE_OUTER_OPACITY_ENTER_VELOCITY: f32 = 10.0 * GLOBAL_SPEED;
const WAVE_OUTER_OPACITY_EXIT_VELOCITY_MAX: f32 = 4.5 * GLOBAL_SPEED;
const WAVE_OUTER_OPACITY_EXIT_VELOCITY_MIN: f32 = 1.5 * GLOBAL_SPEED;
const WAVE_OUTER_SIZE_INFLUENCE_MAX: f32 = 200.0;
const WAVE_OUTER_SIZE_INFLUENCE_MIN: f32 = 40.0;

/// Smooth log deceleration used by the exit radius.
fn log_interpolate(input: f32) -> f32 {
    1.0 - 400f32.powf(-input * 1.4)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RipplePhase {
    Idle,
    Entering {
        start: u64,
        duration: u64,
    },
    Entered,
    Exiting {
        start: u64,
        radius_duration: u64,
        opacity_duration: u64,
        from_radius: f32,
        from_x: f32,
        from_y: f32,
        from_opacity: f32,
    },
    Done,
}

/// One touch-point ripple: an expanding circle tweened between its touch
/// position and the hotspot-bounds center.
pub struct Ripple {
    /// Bounds used for computing the maximum radius.
    bounds: Rect,
    starting_x: f32,
    starting_y: f32,
    clamped_x: f32,
    clamped_y: f32,
    /// Screen density used to adjust pixel-based velocities.
    density: f32,
    outer_radius: f32,
    has_max_radius: bool,
    opacity: f32,
    tween_radius: f32,
    tween_x: f32,
    tween_y: f32,
    phase: RipplePhase,
}

impl Ripple {
    /// Creates a ripple starting at the given position within `bounds`.
    pub fn new(bounds: Rect, starting_x: f32, starting_y: f32) -> Self {
        Self {
            bounds,
            starting_x,
            starting_y,
            clamped_x: starting_x,
            clamped_y: starting_y,
            density: 1.0,
            outer_radius: 0.0,
            has_max_radius: false,
            opacity: 1.0,
            tween_radius: 0.0,
            tween_x: 0.0,
            tween_y: 0.0,
            phase: RipplePhase::Idle,
        }
    }

    /// Configures the maximum radius (`None` derives the half-diagonal of
    /// the bounds) and the density velocity adjustment.
    pub fn setup(&mut self, max_radius: Option<f32>, density: f32) {
        match max_radius {
            Some(radius) => {
                self.has_max_radius = true;
                self.outer_radius = radius;
            }
            None => {
                let half_width = self.bounds.width() as f32 / 2.0;
                let half_height = self.bounds.height() as f32 / 2.0;
                self.outer_radius =
                    (half_width * half_width + half_height * half_height).sqrt();
            }
        }
        self.density = density;
        self.clamp_starting_position();
    }

    /// Moves the starting position; no-op once the ripple has entered.
    pub fn move_to(&mut self, x: f32, y: f32) {
        if self.phase == RipplePhase::Idle {
            self.starting_x = x;
            self.starting_y = y;
            self.clamp_starting_position();
        }
    }

    fn clamp_starting_position(&mut self) {
        let cx = self.bounds.center().x as f32;
        let cy = self.bounds.center().y as f32;
        let dx = self.starting_x - cx;
        let dy = self.starting_y - cy;
        let r = self.outer_radius;

        if dx * dx + dy * dy > r * r {
            // Point is outside the circle; clamp to the circumference.
            let angle = (dy as f64).atan2(dx as f64);
            self.clamped_x = cx + (angle.cos() as f32) * r;
            self.clamped_y = cy + (angle.sin() as f32) * r;
        } else {
            self.clamped_x = self.starting_x;
            self.clamped_y = self.starting_y;
        }
    }

    /// Recomputes the max radius after the hotspot bounds changed.
    pub fn on_hotspot_bounds_changed(&mut self, bounds: Rect) {
        self.bounds = bounds;
        if !self.has_max_radius {
            let half_width = self.bounds.width() as f32 / 2.0;
            let half_height = self.bounds.height() as f32 / 2.0;
            self.outer_radius = (half_width * half_width + half_height * half_height).sqrt();
            self.clamp_starting_position();
        }
    }

    /// Starts the enter animation.
    pub fn enter(&mut self, now: u64) {
        let duration = (1000.0
            * (self.outer_radius / WAVE_TOUCH_DOWN_ACCELERATION * self.density).sqrt()
            + 0.5) as u64;
        self.phase = RipplePhase::Entering {
            start: now,
            duration: duration.max(1),
        };
    }

    /// Starts the exit animation, continuing from the current progress.
    pub fn exit(&mut self, now: u64) {
        self.step(now);
        let radius = lerp(0.0, self.outer_radius, self.tween_radius);
        let remaining = match self.phase {
            RipplePhase::Entering { .. } => self.outer_radius - radius,
            _ => self.outer_radius,
        };

        let opacity_duration =
            (1000.0 * self.opacity / WAVE_OPACITY_DECAY_VELOCITY + 0.5) as u64;
        let radius_duration = (1000.0
            * (remaining / (WAVE_TOUCH_UP_ACCELERATION + WAVE_TOUCH_DOWN_ACCELERATION)
                * self.density)
                .sqrt()
            + 0.5) as u64;

        self.phase = RipplePhase::Exiting {
            start: now,
            radius_duration: radius_duration.max(1),
            opacity_duration: opacity_duration.max(1),
            from_radius: self.tween_radius,
            from_x: self.tween_x,
            from_y: self.tween_y,
            from_opacity: self.opacity,
        };
    }

    /// Samples the tweens at `now`.
    pub fn step(&mut self, now: u64) {
        match self.phase {
            RipplePhase::Entering { start, duration } => {
                let t = now.saturating_sub(start).saturating_sub(RIPPLE_ENTER_DELAY);
                let f = constrain(t as f32 / duration as f32, 0.0, 1.0);
                self.tween_radius = f;
                self.tween_x = f;
                self.tween_y = f;
                if f >= 1.0 {
                    self.phase = RipplePhase::Entered;
                }
            }
            RipplePhase::Exiting {
                start,
                radius_duration,
                opacity_duration,
                from_radius,
                from_x,
                from_y,
                from_opacity,
            } => {
                let t = now.saturating_sub(start);
                let fr = log_interpolate(constrain(
                    t as f32 / radius_duration as f32,
                    0.0,
                    1.0,
                ));
                self.tween_radius = lerp(from_radius, 1.0, fr);
                self.tween_x = lerp(from_x, 1.0, fr);
                self.tween_y = lerp(from_y, 1.0, fr);
                self.opacity = lerp(
                    from_opacity,
                    0.0,
                    constrain(t as f32 / opacity_duration as f32, 0.0, 1.0),
                );
                if t >= opacity_duration && t >= radius_duration {
                    self.phase = RipplePhase::Done;
                }
            }
            _ => {}
        }
    }

    /// Cancels all animations; the caller removes the ripple.
    pub fn cancel(&mut self) {
        self.phase = RipplePhase::Done;
    }

    /// Jumps the animation to its end state.
    pub fn jump(&mut self) {
        match self.phase {
            RipplePhase::Entering { .. } => {
                self.tween_radius = 1.0;
                self.tween_x = 1.0;
                self.tween_y = 1.0;
                self.phase = RipplePhase::Entered;
            }
            RipplePhase::Exiting { .. } => {
                self.opacity = 0.0;
                self.phase = RipplePhase::Done;
            }
            _ => {}
        }
    }

    /// Whether the ripple has fully faded and can be dropped.
    pub fn is_finished(&self) -> bool {
        self.phase == RipplePhase::Done
    }

    /// Whether a tween is still in flight.
    pub fn is_animating(&self) -> bool {
        matches!(
            self.phase,
            RipplePhase::Entering { .. } | RipplePhase::Exiting { .. }
        )
    }

    /// The current circle center.
    pub fn center(&self) -> Point {
        let cx = self.bounds.center().x as f32;
        let cy = self.bounds.center().y as f32;
        Point::new(
            f64::from(lerp(self.clamped_x, cx, self.tween_x)),
            f64::from(lerp(self.clamped_y, cy, self.tween_y)),
        )
    }

    /// The current circle radius in pixels.
    pub fn radius(&self) -> f32 {
        lerp(0.0, self.outer_radius, self.tween_radius)
    }

    /// The current opacity (0.0–1.0).
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Draws the ripple circle. Returns whether anything was drawn.
    pub fn draw(&self, canvas: &mut dyn Canvas, color: Color, paint_alpha: u8) -> bool {
        let alpha = (paint_alpha as f32 * self.opacity + 0.5) / 255.0;
        let radius = self.radius();
        if alpha <= 0.0 || radius <= 0.0 {
            return false;
        }
        let circle = Circle::new(self.center(), f64::from(radius));
        // The computed alpha replaces the paint alpha, as the original's
        // setAlpha does.
        let paint = color.with_alpha(alpha);
        canvas.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            &Brush::Solid(paint),
            None,
            &shape_to_path(&circle),
        );
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BackgroundPhase {
    Idle,
    Entering {
        start: u64,
        duration: u64,
        from: f32,
    },
    Exiting {
        start: u64,
        /// Opacity keeps rising to this value until the inflection...
        inflection_opacity: f32,
        inflection_duration: u64,
        /// ...then decays to zero over the remainder.
        fade_duration: u64,
        from: f32,
    },
}

/// The soft full-bounds sheen shown behind the ripples while the owner is
/// focused or hovered.
pub struct RippleBackground {
    bounds: Rect,
    density: f32,
    outer_radius: f32,
    has_max_radius: bool,
    outer_opacity: f32,
    phase: BackgroundPhase,
}

impl RippleBackground {
    /// Creates a background sized to `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            density: 1.0,
            outer_radius: 0.0,
            has_max_radius: false,
            outer_opacity: 0.0,
            phase: BackgroundPhase::Idle,
        }
    }

    /// Configures the maximum radius and density, as for [`Ripple::setup`].
    pub fn setup(&mut self, max_radius: Option<f32>, density: f32) {
        match max_radius {
            Some(radius) => {
                self.has_max_radius = true;
                self.outer_radius = radius;
            }
            None => self.derive_radius(),
        }
        self.density = density;
    }

    fn derive_radius(&mut self) {
        let half_width = self.bounds.width() as f32 / 2.0;
        let half_height = self.bounds.height() as f32 / 2.0;
        self.outer_radius = (half_width * half_width + half_height * half_height).sqrt();
    }

    /// Recomputes the radius after the hotspot bounds changed.
    pub fn on_hotspot_bounds_changed(&mut self, bounds: Rect) {
        self.bounds = bounds;
        if !self.has_max_radius {
            self.derive_radius();
        }
    }

    /// Starts fading the sheen in.
    pub fn enter(&mut self, now: u64) {
        let duration = (1000.0 / WAVE_OUTER_OPACITY_ENTER_VELOCITY) as u64;
        self.phase = BackgroundPhase::Entering {
            start: now,
            duration: duration.max(1),
            from: self.outer_opacity,
        };
    }

    /// Starts fading the sheen out. Larger sheens keep rising briefly
    /// before decaying so the hand-off from an exiting ripple stays
    /// smooth.
    pub fn exit(&mut self, now: u64) {
        self.step(now);

        let opacity_duration = (1000.0 / WAVE_OPACITY_DECAY_VELOCITY + 0.5) as u64;
        let influence = constrain(
            (self.outer_radius - WAVE_OUTER_SIZE_INFLUENCE_MIN * self.density)
                / (WAVE_OUTER_SIZE_INFLUENCE_MAX * self.density),
            0.0,
            1.0,
        );
        let velocity = lerp(
            WAVE_OUTER_OPACITY_EXIT_VELOCITY_MIN,
            WAVE_OUTER_OPACITY_EXIT_VELOCITY_MAX,
            influence,
        );
        let inflection_duration = ((1000.0 * (1.0 - self.outer_opacity)
            / (WAVE_OPACITY_DECAY_VELOCITY + velocity)
            + 0.5)
            .max(0.0)) as u64;
        let inflection_opacity = (self.outer_opacity
            + inflection_duration as f32 * velocity * influence / 1000.0)
            .min(1.0);

        self.phase = BackgroundPhase::Exiting {
            start: now,
            inflection_opacity,
            inflection_duration,
            fade_duration: opacity_duration.saturating_sub(inflection_duration).max(1),
            from: self.outer_opacity,
        };
    }

    /// Samples the opacity at `now`.
    pub fn step(&mut self, now: u64) {
        match self.phase {
            BackgroundPhase::Entering {
                start,
                duration,
                from,
            } => {
                let f = constrain(
                    now.saturating_sub(start) as f32 / duration as f32,
                    0.0,
                    1.0,
                );
                self.outer_opacity = lerp(from, 1.0, f);
            }
            BackgroundPhase::Exiting {
                start,
                inflection_opacity,
                inflection_duration,
                fade_duration,
                from,
            } => {
                let t = now.saturating_sub(start);
                if t < inflection_duration {
                    let f = t as f32 / inflection_duration as f32;
                    self.outer_opacity = lerp(from, inflection_opacity, f);
                } else {
                    let f = constrain(
                        (t - inflection_duration) as f32 / fade_duration as f32,
                        0.0,
                        1.0,
                    );
                    self.outer_opacity = lerp(inflection_opacity, 0.0, f);
                    if f >= 1.0 {
                        self.phase = BackgroundPhase::Idle;
                    }
                }
            }
            BackgroundPhase::Idle => {}
        }
    }

    /// Ends any animation immediately.
    pub fn jump(&mut self) {
        if let BackgroundPhase::Exiting { .. } = self.phase {
            self.outer_opacity = 0.0;
        } else if let BackgroundPhase::Entering { .. } = self.phase {
            self.outer_opacity = 1.0;
        }
        self.phase = BackgroundPhase::Idle;
    }

    /// The current opacity (0.0–1.0).
    pub fn outer_opacity(&self) -> f32 {
        self.outer_opacity
    }

    /// Whether a tween is still in flight.
    pub fn is_animating(&self) -> bool {
        !matches!(self.phase, BackgroundPhase::Idle)
    }

    /// Whether drawing would produce visible output.
    pub fn should_draw(&self) -> bool {
        self.outer_opacity > 0.0 && self.outer_radius > 0.0
    }

    /// Draws the sheen circle. Returns whether anything was drawn.
    pub fn draw(&self, canvas: &mut dyn Canvas, color: Color, paint_alpha: u8) -> bool {
        let alpha = (paint_alpha as f32 * self.outer_opacity + 0.5) / 255.0;
        if alpha <= 0.0 || self.outer_radius <= 0.0 {
            return false;
        }
        let circle = Circle::new(self.bounds.center(), f64::from(self.outer_radius));
        let paint = color.with_alpha(alpha);
        canvas.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            &Brush::Solid(paint),
            None,
            &shape_to_path(&circle),
        );
        true
    }
}

/// Constant state of a [`RippleDrawable`].
pub struct RippleDrawableState {
    layers: LayerState,
    color: ColorList,
    max_radius: Option<f32>,
    density: f32,
}

impl DrawableState for RippleDrawableState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        let mut drawable = RippleDrawable::from_layer(self.layers.build(), self.color.clone());
        drawable.max_radius = self.max_radius;
        drawable.density = self.density;
        Box::new(drawable)
    }
}

/// Content layers with procedural touch-feedback circles composited on
/// top.
///
/// Pressing (with the enabled token set) spawns a ripple at the hotspot;
/// releasing moves it to the exiting list where it fades out. Focus and
/// hover drive the background sheen.
pub struct RippleDrawable {
    layer: LayerDrawable,
    color: ColorList,
    max_radius: Option<f32>,
    density: f32,
    hotspot: Option<(f64, f64)>,
    hotspot_bounds: Option<Rect>,
    ripple: Option<Ripple>,
    background: Option<RippleBackground>,
    exiting: Vec<Ripple>,
    ripple_active: bool,
    background_active: bool,
}

impl RippleDrawable {
    /// Creates a ripple effect over optional content.
    pub fn new(color: ColorList, content: Option<Box<dyn Drawable>>) -> Self {
        let mut layer = LayerDrawable::new();
        if let Some(content) = content {
            layer.add_layer(content);
        }
        Self::from_layer(layer, color)
    }

    fn from_layer(layer: LayerDrawable, color: ColorList) -> Self {
        Self {
            layer,
            color,
            max_radius: None,
            density: 1.0,
            hotspot: None,
            hotspot_bounds: None,
            ripple: None,
            background: None,
            exiting: Vec::new(),
            ripple_active: false,
            background_active: false,
        }
    }

    /// Sets the ripple color.
    pub fn set_color(&mut self, color: ColorList) {
        self.color = color;
        self.layer.base().invalidate();
    }

    /// Sets an explicit maximum ripple radius; `None` derives it from the
    /// hotspot bounds (half-diagonal).
    pub fn set_max_radius(&mut self, max_radius: Option<f32>) {
        self.max_radius = max_radius;
    }

    /// Sets the density factor applied to the tween velocities.
    pub fn set_density(&mut self, density: f32) {
        self.density = density.max(f32::EPSILON);
    }

    /// Whether any ripple or sheen would currently draw.
    pub fn has_visible_ripples(&self) -> bool {
        self.ripple.is_some()
            || !self.exiting.is_empty()
            || self
                .background
                .as_ref()
                .map(RippleBackground::should_draw)
                .unwrap_or(false)
    }

    fn effect_bounds(&self) -> Rect {
        self.hotspot_bounds
            .unwrap_or_else(|| self.layer.base().bounds())
    }

    fn set_ripple_active(&mut self, active: bool) {
        if self.ripple_active == active {
            return;
        }
        self.ripple_active = active;
        let now = self.layer.base().now();
        if active {
            self.ripple_enter(now);
        } else if let Some(mut ripple) = self.ripple.take() {
            ripple.exit(now);
            self.exiting.push(ripple);
        }
        self.layer.base().invalidate();
    }

    fn set_background_active(&mut self, active: bool) {
        if self.background_active == active {
            return;
        }
        self.background_active = active;
        let now = self.layer.base().now();
        let bounds = self.effect_bounds();
        let background = self
            .background
            .get_or_insert_with(|| RippleBackground::new(bounds));
        background.setup(self.max_radius, self.density);
        if active {
            background.enter(now);
        } else {
            background.exit(now);
        }
        self.layer.base().invalidate();
    }

    fn ripple_enter(&mut self, now: u64) {
        let bounds = self.effect_bounds();
        let (x, y) = self
            .hotspot
            .unwrap_or_else(|| (bounds.center().x, bounds.center().y));
        let mut ripple = Ripple::new(bounds, x as f32, y as f32);
        ripple.setup(self.max_radius, self.density);
        ripple.enter(now);
        self.ripple = Some(ripple);
    }

    fn step_all(&mut self) {
        let now = self.layer.base().now();
        if let Some(ripple) = &mut self.ripple {
            ripple.step(now);
        }
        for ripple in &mut self.exiting {
            ripple.step(now);
        }
        self.exiting.retain(|ripple| !ripple.is_finished());
        if let Some(background) = &mut self.background {
            background.step(now);
        }
    }
}

impl Drawable for RippleDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        self.layer.draw(canvas);
        self.step_all();

        if !self.has_visible_ripples() {
            return;
        }

        let color = self.color.color_for_state(self.layer.base().state());
        let paint_alpha = (color.components[3] * 255.0).round() as u8;
        let bounds = self.effect_bounds();

        // Composite the circles behind one alpha layer clipped to the
        // effect bounds so overlapping ripples don't over-darken.
        let clip = shape_to_path(&bounds);
        canvas.push_layer(vello::peniko::Mix::Normal, 1.0, Affine::IDENTITY, &clip);
        if let Some(background) = &self.background {
            background.draw(canvas, color, paint_alpha);
        }
        for ripple in &self.exiting {
            ripple.draw(canvas, color, paint_alpha);
        }
        if let Some(ripple) = &self.ripple {
            ripple.draw(canvas, color, paint_alpha);
        }
        canvas.pop_layer();

        // Request another frame while anything is still animating.
        let animating = self
            .ripple
            .as_ref()
            .map(Ripple::is_animating)
            .unwrap_or(false)
            || !self.exiting.is_empty()
            || self
                .background
                .as_ref()
                .map(RippleBackground::is_animating)
                .unwrap_or(false);
        if animating {
            let now = self.layer.base().now();
            self.layer.base().schedule(now + 1000 / 60);
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
        let bounds = self.effect_bounds();
        if let Some(ripple) = &mut self.ripple {
            ripple.on_hotspot_bounds_changed(bounds);
        }
        if let Some(background) = &mut self.background {
            background.on_hotspot_bounds_changed(bounds);
        }
    }

    fn on_state_change(&mut self) -> bool {
        let state = self.layer.base().state();
        let changed = self.layer.on_state_change();

        let enabled = state.contains(StateSet::ENABLED);
        let pressed = enabled && state.contains(StateSet::PRESSED);
        let focused = enabled && state.contains(StateSet::FOCUSED);
        let hovered = enabled && state.contains(StateSet::HOVERED);

        self.set_ripple_active(pressed);
        self.set_background_active(focused || hovered);

        changed || pressed || focused || hovered
    }

    fn on_level_change(&mut self) -> bool {
        self.layer.on_level_change()
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
        let changed = self.layer.set_visible(visible, restart);
        if !visible {
            self.jump_to_current_state();
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        // The projected ripples may draw outside the content.
        Opacity::Translucent
    }

    fn intrinsic_width(&self) -> i32 {
        self.layer.intrinsic_width()
    }

    fn intrinsic_height(&self) -> i32 {
        self.layer.intrinsic_height()
    }

    fn padding(&self) -> Option<Insets> {
        self.layer.padding()
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn jump_to_current_state(&mut self) {
        self.layer.jump_to_current_state();
        if let Some(ripple) = &mut self.ripple {
            ripple.jump();
        }
        for ripple in &mut self.exiting {
            ripple.jump();
        }
        self.exiting.clear();
        if let Some(background) = &mut self.background {
            background.jump();
        }
        self.layer.base().unschedule();
        self.layer.base().invalidate();
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        Some(Arc::new(RippleDrawableState {
            layers: self.layer.snapshot()?,
            color: self.color.clone(),
            max_radius: self.max_radius,
            density: self.density,
        }))
    }

    fn mutate(&mut self) {
        self.layer.mutate();
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        self.layer.apply_theme(theme);
    }

    fn can_apply_theme(&self) -> bool {
        self.layer.can_apply_theme()
    }

    fn set_hotspot(&mut self, x: f64, y: f64) {
        self.hotspot = Some((x, y));
        if let Some(ripple) = &mut self.ripple {
            ripple.move_to(x as f32, y as f32);
        }
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        self.hotspot_bounds = Some(bounds);
        self.layer.set_hotspot_bounds(bounds);
        let effect = self.effect_bounds();
        if let Some(ripple) = &mut self.ripple {
            ripple.on_hotspot_bounds_changed(effect);
        }
        if let Some(background) = &mut self.background {
            background.on_hotspot_bounds_changed(effect);
        }
    }

    fn hotspot_bounds(&self) -> Option<Rect> {
        self.hotspot_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDrawable;
    use drawkit_core::canvas::{CanvasOp, RecordingCanvas};
    use drawkit_core::clock::ManualClock;
    use drawkit_core::geometry::dist;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 60.0, 80.0)
    }

    #[test]
    fn test_ripple_enter_radius_grows_monotonically() {
        let mut ripple = Ripple::new(bounds(), 30.0, 40.0);
        ripple.setup(None, 1.0);
        // Half-diagonal of a 60x80 rect.
        assert!((ripple.radius() - 0.0).abs() < 1e-6);

        ripple.enter(0);
        let mut previous = -1.0f32;
        for t in [0u64, 80, 120, 200, 400, 2000] {
            ripple.step(t);
            let radius = ripple.radius();
            assert!(radius >= previous);
            previous = radius;
        }
        // Fully entered: the radius reaches the outer radius (50).
        assert!((previous - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_ripple_enter_delay_holds_radius_at_zero() {
        let mut ripple = Ripple::new(bounds(), 30.0, 40.0);
        ripple.setup(None, 1.0);
        ripple.enter(1000);
        ripple.step(1000 + RIPPLE_ENTER_DELAY / 2);
        assert_eq!(ripple.radius(), 0.0);
    }

    #[test]
    fn test_ripple_exit_fades_and_finishes() {
        let mut ripple = Ripple::new(bounds(), 10.0, 10.0);
        ripple.setup(None, 1.0);
        ripple.enter(0);
        ripple.step(10_000);
        assert!(ripple.opacity() >= 1.0);

        ripple.exit(10_000);
        ripple.step(10_100);
        let mid_opacity = ripple.opacity();
        assert!(mid_opacity < 1.0 && mid_opacity > 0.0);

        ripple.step(20_000);
        assert_eq!(ripple.opacity(), 0.0);
        assert!(ripple.is_finished());
    }

    #[test]
    fn test_start_position_clamped_to_outer_circle() {
        let mut ripple = Ripple::new(bounds(), 500.0, 40.0);
        ripple.setup(Some(20.0), 1.0);
        // The starting point is outside the max circle: clamped onto it.
        let center = bounds().center();
        let d = dist(
            ripple.clamped_x,
            ripple.clamped_y,
            center.x as f32,
            center.y as f32,
        );
        assert!((d - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_background_enter_then_exit() {
        let mut background = RippleBackground::new(bounds());
        background.setup(None, 1.0);
        background.enter(0);
        background.step(1000);
        assert!((background.outer_opacity() - 1.0).abs() < 1e-6);
        assert!(background.should_draw());

        background.exit(1000);
        background.step(10_000);
        assert_eq!(background.outer_opacity(), 0.0);
        assert!(!background.should_draw());
    }

    #[test]
    fn test_drawable_spawns_ripple_on_press() {
        let clock = ManualClock::shared(0);
        let content = ShapeDrawable::with_color(vello::peniko::Color::from_rgb8(20, 20, 20));
        let mut drawable = RippleDrawable::new(
            ColorList::solid(vello::peniko::Color::from_rgba8(255, 255, 255, 128)),
            Some(Box::new(content)),
        );
        drawable.base_mut().set_clock(clock.clone());
        drawable.set_bounds(bounds());
        drawable.set_hotspot(15.0, 20.0);

        drawable.set_state(StateSet::ENABLED | StateSet::PRESSED);
        assert!(drawable.has_visible_ripples());

        clock.advance(400);
        let mut canvas = RecordingCanvas::new();
        drawable.draw(&mut canvas);

        // Content fill, then a layer with the ripple circle inside it.
        assert!(matches!(canvas.ops()[0], CanvasOp::Fill { .. }));
        assert!(matches!(canvas.ops()[1], CanvasOp::PushLayer { .. }));
        assert!(matches!(canvas.ops()[2], CanvasOp::Fill { .. }));

        // Release: the ripple exits and eventually disappears.
        drawable.set_state(StateSet::ENABLED);
        clock.advance(10_000);
        let mut canvas = RecordingCanvas::new();
        drawable.draw(&mut canvas);
        assert_eq!(canvas.ops().len(), 1);
        assert!(!drawable.has_visible_ripples());
    }

    #[test]
    fn test_jump_clears_all_ripples() {
        let clock = ManualClock::shared(0);
        let mut drawable = RippleDrawable::new(
            ColorList::solid(vello::peniko::Color::from_rgba8(0, 0, 0, 60)),
            None,
        );
        drawable.base_mut().set_clock(clock.clone());
        drawable.set_bounds(bounds());
        drawable.set_state(StateSet::ENABLED | StateSet::PRESSED | StateSet::FOCUSED);
        assert!(drawable.has_visible_ripples());

        drawable.jump_to_current_state();
        drawable.set_state(StateSet::empty());
        drawable.jump_to_current_state();
        assert!(!drawable.has_visible_ripples());
    }
}
