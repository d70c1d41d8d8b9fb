//! A two-layer cross-fade driven by wall-clock time.
//!
//! Shows the first layer, then blends toward the second after
//! [`TransitionDrawable::start_transition`]. With cross-fade enabled the
//! first layer fades out as the second fades in; otherwise the first layer
//! stays opaque underneath. Alpha changes applied to the layers during the
//! fade are restored to 0xFF after each draw so they never leak into other
//! holders of the same constant state.

use std::sync::Arc;

use drawkit_core::canvas::Canvas;
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::geometry::{lerp, Insets};
use drawkit_core::theme::Theme;
use vello::kurbo::Rect;

use crate::layer::{LayerDrawable, LayerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// A transition is about to start.
    Starting,
    /// The transition is in progress.
    Running,
    /// No transition is applied.
    None,
}

/// Constant state of a [`TransitionDrawable`].
pub struct TransitionState {
    layers: LayerState,
    cross_fade: bool,
}

impl DrawableState for TransitionState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        let mut drawable = TransitionDrawable::from_layer(self.layers.build());
        drawable.cross_fade = self.cross_fade;
        Box::new(drawable)
    }
}

/// An extension of [`LayerDrawable`] that cross-fades between its first
/// and second layer.
pub struct TransitionDrawable {
    layer: LayerDrawable,
    cross_fade: bool,
    reverse: bool,
    alpha: u8,
    from: u8,
    to: u8,
    duration: u64,
    original_duration: u64,
    phase: Phase,
    start_time: Option<u64>,
}

impl TransitionDrawable {
    /// Creates a transition between two layers; only the first shows until
    /// a transition starts.
    pub fn new(first: Box<dyn Drawable>, second: Box<dyn Drawable>) -> Self {
        Self::from_layer(LayerDrawable::from_layers(vec![first, second]))
    }

    fn from_layer(layer: LayerDrawable) -> Self {
        Self {
            layer,
            cross_fade: false,
            reverse: false,
            alpha: 0,
            from: 0,
            to: 0,
            duration: 0,
            original_duration: 0,
            phase: Phase::None,
            start_time: None,
        }
    }

    /// The backing layer stack.
    pub fn layers(&self) -> &LayerDrawable {
        &self.layer
    }

    /// The backing layer stack, mutably.
    pub fn layers_mut(&mut self) -> &mut LayerDrawable {
        &mut self.layer
    }

    /// Whether the first layer fades out while the second fades in.
    pub fn is_cross_fade_enabled(&self) -> bool {
        self.cross_fade
    }

    /// Enables or disables cross-fading. Disabled, the first layer is
    /// always drawn opaque. Off by default.
    pub fn set_cross_fade_enabled(&mut self, enabled: bool) {
        self.cross_fade = enabled;
    }

    /// Begins showing the second layer on top of the first over
    /// `duration_millis`.
    pub fn start_transition(&mut self, duration_millis: u64) {
        self.alpha = 0;
        self.duration = duration_millis;
        self.original_duration = duration_millis;
        self.from = 0;
        self.to = 255;
        self.reverse = false;
        self.phase = Phase::Starting;
        self.layer.base().invalidate();
    }

    /// Shows only the first layer again, immediately.
    pub fn reset_transition(&mut self) {
        self.alpha = 0;
        self.phase = Phase::None;
        self.layer.base().invalidate();
    }

    /// Reverses the transition, picking up where it currently is. If the
    /// previous run already completed this behaves like a fresh transition
    /// toward the opposite end using `duration_millis`; otherwise the
    /// remaining portion of the previous run sets the pace so the visible
    /// blend is continuous.
    pub fn reverse_transition(&mut self, duration_millis: u64) {
        let time = self.layer.base().now();
        let elapsed = self
            .start_time
            .map(|start| time.saturating_sub(start))
            .unwrap_or(u64::MAX);

        // Animation is over.
        if elapsed > self.duration {
            if self.to == 0 {
                self.alpha = 0;
                self.from = 0;
                self.to = 255;
                self.reverse = false;
            } else {
                self.alpha = 255;
                self.from = 255;
                self.to = 0;
                self.reverse = true;
            }
            self.duration = duration_millis;
            self.original_duration = duration_millis;
            self.phase = Phase::Starting;
            self.layer.base().invalidate();
            return;
        }

        self.reverse = !self.reverse;
        self.from = self.alpha;
        self.to = if self.reverse { 0 } else { 255 };
        self.duration = if self.reverse {
            elapsed
        } else {
            self.original_duration.saturating_sub(elapsed)
        };
        self.phase = Phase::Starting;
    }
}

impl Drawable for TransitionDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        let mut done = true;

        match self.phase {
            Phase::Starting => {
                done = false;
                self.start_time = Some(self.layer.base().now());
                self.phase = Phase::Running;
            }
            Phase::Running => {
                if let Some(start) = self.start_time {
                    let now = self.layer.base().now();
                    let normalized = if self.duration == 0 {
                        1.0
                    } else {
                        ((now - start) as f32 / self.duration as f32).min(1.0)
                    };
                    done = normalized >= 1.0;
                    self.alpha =
                        lerp(self.from as f32, self.to as f32, normalized).round() as u8;
                }
            }
            Phase::None => {}
        }

        let alpha = self.alpha;
        let cross_fade = self.cross_fade;

        if done {
            // Completed: draw only the fully visible layer(s) and skip the
            // alpha churn (the set_alpha calls below invalidate).
            if !cross_fade || alpha == 0 {
                if let Some(first) = self.layer.drawable_mut(0) {
                    first.draw(canvas);
                }
            }
            if alpha == 0xFF {
                if let Some(second) = self.layer.drawable_mut(1) {
                    second.draw(canvas);
                }
            }
            return;
        }

        if let Some(first) = self.layer.drawable_mut(0) {
            if cross_fade {
                first.set_alpha(255 - alpha);
            }
            first.draw(canvas);
            if cross_fade {
                first.set_alpha(0xFF);
            }
        }

        if alpha > 0 {
            if let Some(second) = self.layer.drawable_mut(1) {
                second.set_alpha(alpha);
                second.draw(canvas);
                second.set_alpha(0xFF);
            }
        }

        self.layer.base().invalidate();
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
        self.layer.set_visible(visible, restart)
    }

    fn opacity(&self) -> Opacity {
        self.layer.opacity()
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
        self.layer.is_stateful()
    }

    fn jump_to_current_state(&mut self) {
        self.layer.jump_to_current_state();
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        Some(Arc::new(TransitionState {
            layers: self.layer.snapshot()?,
            cross_fade: self.cross_fade,
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
        self.layer.set_hotspot(x, y);
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        self.layer.set_hotspot_bounds(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDrawable;
    use drawkit_core::canvas::RecordingCanvas;
    use drawkit_core::clock::ManualClock;
    use std::sync::Arc as StdArc;
    use vello::peniko::Color;

    fn build(clock: StdArc<ManualClock>) -> TransitionDrawable {
        let first = ShapeDrawable::with_color(Color::from_rgb8(255, 0, 0));
        let second = ShapeDrawable::with_color(Color::from_rgb8(0, 0, 255));
        let mut transition = TransitionDrawable::new(Box::new(first), Box::new(second));
        transition.base_mut().set_clock(clock);
        transition.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));
        transition
    }

    fn draw_alphas(transition: &mut TransitionDrawable) -> Vec<f32> {
        let mut canvas = RecordingCanvas::new();
        transition.draw(&mut canvas);
        canvas
            .fills()
            .iter()
            .map(|op| op.solid_color().unwrap().components[3])
            .collect()
    }

    #[test]
    fn test_idle_shows_first_layer_only() {
        let clock = ManualClock::shared(0);
        let mut transition = build(clock);
        let mut canvas = RecordingCanvas::new();
        transition.draw(&mut canvas);
        assert_eq!(canvas.fills().len(), 1);
        assert_eq!(
            canvas.fills()[0].solid_color(),
            Some(Color::from_rgb8(255, 0, 0))
        );
    }

    #[test]
    fn test_linear_blend_over_duration() {
        let clock = ManualClock::shared(0);
        let mut transition = build(clock.clone());
        transition.set_cross_fade_enabled(true);
        transition.start_transition(1000);

        // First draw stamps the start time: layer 0 opaque, layer 1 absent.
        let alphas = draw_alphas(&mut transition);
        assert_eq!(alphas.len(), 1);
        assert!((alphas[0] - 1.0).abs() < 0.01);

        // Halfway: both layers near half alpha.
        clock.advance(500);
        let alphas = draw_alphas(&mut transition);
        assert_eq!(alphas.len(), 2);
        assert!((alphas[0] - 0.5).abs() < 0.05);
        assert!((alphas[1] - 0.5).abs() < 0.05);

        // Completed: only layer 1 draws, fully opaque.
        clock.advance(600);
        let alphas = draw_alphas(&mut transition);
        assert_eq!(alphas.len(), 1);
        assert!((alphas[0] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_without_cross_fade_first_layer_stays_opaque() {
        let clock = ManualClock::shared(0);
        let mut transition = build(clock.clone());
        transition.start_transition(1000);
        draw_alphas(&mut transition);

        clock.advance(500);
        let alphas = draw_alphas(&mut transition);
        assert_eq!(alphas.len(), 2);
        assert!((alphas[0] - 1.0).abs() < 0.01);
        assert!((alphas[1] - 0.5).abs() < 0.05);

        // Completed without cross-fade: both layers draw.
        clock.advance(600);
        let alphas = draw_alphas(&mut transition);
        assert_eq!(alphas.len(), 2);
        assert!((alphas[0] - 1.0).abs() < 0.01);
        assert!((alphas[1] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_alpha_restored_after_fade_draw() {
        let clock = ManualClock::shared(0);
        let mut transition = build(clock.clone());
        transition.set_cross_fade_enabled(true);
        transition.start_transition(1000);
        draw_alphas(&mut transition);
        clock.advance(500);
        draw_alphas(&mut transition);

        // The children's own alpha is back at 0xFF after the draw.
        assert_eq!(transition.layers_mut().drawable_mut(0).unwrap().alpha(), 0xFF);
        assert_eq!(transition.layers_mut().drawable_mut(1).unwrap().alpha(), 0xFF);
    }

    #[test]
    fn test_reverse_mid_flight_preserves_continuity() {
        let clock = ManualClock::shared(0);
        let mut transition = build(clock.clone());
        transition.set_cross_fade_enabled(true);
        transition.start_transition(1000);
        draw_alphas(&mut transition);

        clock.advance(400);
        draw_alphas(&mut transition);

        // Reversing at 40%: the way back takes the 400ms already played.
        transition.reverse_transition(1000);
        let alphas = draw_alphas(&mut transition);
        assert!((alphas[1] - 0.4).abs() < 0.05);

        clock.advance(200);
        let alphas = draw_alphas(&mut transition);
        assert!((alphas[1] - 0.2).abs() < 0.05);

        clock.advance(300);
        let alphas = draw_alphas(&mut transition);
        // Fully reversed: only the first layer remains.
        assert_eq!(alphas.len(), 1);
        assert!((alphas[0] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_reverse_after_completion_restarts_backward() {
        let clock = ManualClock::shared(0);
        let mut transition = build(clock.clone());
        transition.set_cross_fade_enabled(true);
        transition.start_transition(100);
        draw_alphas(&mut transition);
        clock.advance(200);
        draw_alphas(&mut transition);

        // The previous run completed; reversing restarts a full-length run
        // toward the first layer.
        transition.reverse_transition(400);
        draw_alphas(&mut transition);
        clock.advance(200);
        let alphas = draw_alphas(&mut transition);
        assert_eq!(alphas.len(), 2);
        assert!((alphas[0] - 0.5).abs() < 0.05);
        assert!((alphas[1] - 0.5).abs() < 0.05);
    }
}
