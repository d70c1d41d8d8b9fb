//! A child drawable rotated about a pivot in discrete timed steps.

use std::sync::Arc;

use drawkit_core::canvas::{Canvas, TransformCanvas};
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{
    Animatable, Drawable, DrawableBase, DrawableState, Opacity,
};
use drawkit_core::geometry::Insets;
use drawkit_core::theme::Theme;
use vello::kurbo::{Affine, Point, Rect};

const DEFAULT_FRAMES_COUNT: u32 = 12;
const DEFAULT_FRAME_DURATION: u64 = 150;

/// Constant state of an [`AnimatedRotateDrawable`].
pub struct AnimatedRotateState {
    child: Arc<dyn DrawableState>,
    pivot_x: f32,
    pivot_y: f32,
    pivot_relative: bool,
    frames_count: u32,
    frame_duration: u64,
}

impl DrawableState for AnimatedRotateState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        let mut drawable = AnimatedRotateDrawable::new(Arc::clone(&self.child).new_drawable());
        drawable.set_pivot(self.pivot_x, self.pivot_y, self.pivot_relative);
        drawable.set_frames_count(self.frames_count);
        drawable.set_frame_duration(self.frame_duration);
        Box::new(drawable)
    }
}

/// Rotates a child in `frames_count` discrete steps, one step per
/// `frame_duration` milliseconds while running.
pub struct AnimatedRotateDrawable {
    base: DrawableBase,
    child: Box<dyn Drawable>,
    pivot_x: f32,
    pivot_y: f32,
    /// Whether the pivot is a fraction of the bounds instead of pixels.
    pivot_relative: bool,
    frames_count: u32,
    frame_duration: u64,
    current_degrees: f32,
    increment: f32,
    running: bool,
    next_due: u64,
    mutated: bool,
}

impl AnimatedRotateDrawable {
    /// Wraps `child`, rotating about the bounds center by default.
    pub fn new(child: Box<dyn Drawable>) -> Self {
        Self {
            base: DrawableBase::new(),
            child,
            pivot_x: 0.5,
            pivot_y: 0.5,
            pivot_relative: true,
            frames_count: DEFAULT_FRAMES_COUNT,
            frame_duration: DEFAULT_FRAME_DURATION,
            current_degrees: 0.0,
            increment: 360.0 / DEFAULT_FRAMES_COUNT as f32,
            running: false,
            next_due: 0,
            mutated: false,
        }
    }

    /// Sets the rotation pivot; `relative` pivots are fractions of the
    /// bounds, absolute ones are pixels from the top-left corner.
    pub fn set_pivot(&mut self, x: f32, y: f32, relative: bool) {
        self.pivot_x = x;
        self.pivot_y = y;
        self.pivot_relative = relative;
    }

    /// Sets the number of discrete rotation steps per revolution.
    pub fn set_frames_count(&mut self, frames_count: u32) {
        self.frames_count = frames_count.max(1);
        self.increment = 360.0 / self.frames_count as f32;
    }

    /// Sets how long each rotation step is shown, in milliseconds.
    pub fn set_frame_duration(&mut self, frame_duration: u64) {
        self.frame_duration = frame_duration.max(1);
    }

    /// The wrapped drawable.
    pub fn child_mut(&mut self) -> &mut dyn Drawable {
        self.child.as_mut()
    }

    /// The current rotation in degrees.
    pub fn current_degrees(&self) -> f32 {
        self.current_degrees
    }

    /// Advances past any elapsed rotation steps.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let now = self.base.now();
        while now >= self.next_due {
            self.current_degrees += self.increment;
            if self.current_degrees > 360.0 - self.increment {
                self.current_degrees = 0.0;
            }
            self.next_due = now + self.frame_duration;
            self.base.invalidate();
        }
    }

    fn pivot_point(&self) -> Point {
        let bounds = self.base.bounds();
        let px = if self.pivot_relative {
            bounds.x0 + bounds.width() * self.pivot_x as f64
        } else {
            bounds.x0 + self.pivot_x as f64
        };
        let py = if self.pivot_relative {
            bounds.y0 + bounds.height() * self.pivot_y as f64
        } else {
            bounds.y0 + self.pivot_y as f64
        };
        Point::new(px, py)
    }
}

impl Animatable for AnimatedRotateDrawable {
    fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.current_degrees = 0.0;
            self.next_due = self.base.now() + self.frame_duration;
            self.base.schedule(self.next_due);
            self.base.invalidate();
        }
    }

    fn stop(&mut self) {
        self.running = false;
        self.base.unschedule();
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drawable for AnimatedRotateDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        self.tick();
        let rotation =
            Affine::rotate_about(f64::from(self.current_degrees).to_radians(), self.pivot_point());
        let mut rotated = TransformCanvas::new(canvas, rotation);
        self.child.draw(&mut rotated);
        if self.running {
            self.base.schedule(self.base.now() + self.frame_duration);
        }
    }

    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn on_bounds_change(&mut self) {
        let bounds = self.base.bounds();
        self.child.set_bounds(bounds);
    }

    fn on_state_change(&mut self) -> bool {
        let state = self.base.state();
        self.child.set_state(state)
    }

    fn on_level_change(&mut self) -> bool {
        let level = self.base.level();
        self.child.set_level(level)
    }

    fn set_alpha(&mut self, alpha: u8) {
        self.child.set_alpha(alpha);
    }

    fn alpha(&self) -> u8 {
        self.child.alpha()
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        self.child.set_color_filter(filter);
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        self.child.set_tint_list(tint);
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.child.set_tint_mode(mode);
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        self.child.set_visible(visible, restart);
        let changed = self.base.is_visible() != visible;
        if changed {
            self.base.set_visible_raw(visible);
            self.base.invalidate();
        }
        if visible {
            if restart || changed {
                self.current_degrees = 0.0;
                if self.running {
                    self.next_due = self.base.now() + self.frame_duration;
                    self.base.schedule(self.next_due);
                }
            }
        } else {
            self.base.unschedule();
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        self.child.opacity()
    }

    fn intrinsic_width(&self) -> i32 {
        self.child.intrinsic_width()
    }

    fn intrinsic_height(&self) -> i32 {
        self.child.intrinsic_height()
    }

    fn is_stateful(&self) -> bool {
        self.child.is_stateful()
    }

    fn padding(&self) -> Option<Insets> {
        self.child.padding()
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        Some(Arc::new(AnimatedRotateState {
            child: self.child.constant_state()?,
            pivot_x: self.pivot_x,
            pivot_y: self.pivot_y,
            pivot_relative: self.pivot_relative,
            frames_count: self.frames_count,
            frame_duration: self.frame_duration,
        }))
    }

    fn mutate(&mut self) {
        if !self.mutated {
            self.child.mutate();
            self.mutated = true;
        }
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        if self.child.can_apply_theme() {
            self.child.apply_theme(theme);
        }
    }

    fn can_apply_theme(&self) -> bool {
        self.child.can_apply_theme()
    }

    fn set_hotspot(&mut self, x: f64, y: f64) {
        self.child.set_hotspot(x, y);
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        self.child.set_hotspot_bounds(bounds);
    }

    fn as_animatable(&mut self) -> Option<&mut dyn Animatable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDrawable;
    use drawkit_core::canvas::RecordingCanvas;
    use drawkit_core::clock::ManualClock;
    use vello::peniko::Color;

    fn build(clock: Arc<ManualClock>) -> AnimatedRotateDrawable {
        let child = ShapeDrawable::with_color(Color::BLACK);
        let mut rotate = AnimatedRotateDrawable::new(Box::new(child));
        rotate.base_mut().set_clock(clock);
        rotate.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));
        rotate
    }

    #[test]
    fn test_steps_advance_with_clock() {
        let clock = ManualClock::shared(0);
        let mut rotate = build(clock.clone());
        rotate.set_frames_count(4);
        rotate.set_frame_duration(100);

        rotate.start();
        assert!(rotate.is_running());
        assert_eq!(rotate.current_degrees(), 0.0);

        clock.advance(100);
        rotate.tick();
        assert_eq!(rotate.current_degrees(), 90.0);

        clock.advance(100);
        rotate.tick();
        assert_eq!(rotate.current_degrees(), 180.0);
    }

    #[test]
    fn test_rotation_wraps_to_zero() {
        let clock = ManualClock::shared(0);
        let mut rotate = build(clock.clone());
        rotate.set_frames_count(4);
        rotate.set_frame_duration(100);
        rotate.start();

        for _ in 0..4 {
            clock.advance(100);
            rotate.tick();
        }
        // 0 -> 90 -> 180 -> 270 -> wraps back to 0.
        assert_eq!(rotate.current_degrees(), 0.0);
    }

    #[test]
    fn test_stop_freezes_rotation() {
        let clock = ManualClock::shared(0);
        let mut rotate = build(clock.clone());
        rotate.set_frame_duration(100);
        rotate.start();
        clock.advance(100);
        rotate.tick();
        let frozen = rotate.current_degrees();

        rotate.stop();
        clock.advance(1000);
        rotate.tick();
        assert_eq!(rotate.current_degrees(), frozen);
    }

    #[test]
    fn test_draw_applies_rotation_transform() {
        let clock = ManualClock::shared(0);
        let mut rotate = build(clock.clone());
        rotate.set_frames_count(4);
        rotate.set_frame_duration(100);
        rotate.start();
        clock.advance(100);

        let mut canvas = RecordingCanvas::new();
        rotate.draw(&mut canvas);

        // At 90 degrees about the center, the square child maps onto
        // itself but through a non-identity transform.
        let bbox = canvas.fills()[0].bounding_box().unwrap();
        assert_eq!(bbox, Rect::new(0.0, 0.0, 10.0, 10.0));
        match &canvas.ops()[0] {
            drawkit_core::canvas::CanvasOp::Fill { transform, .. } => {
                assert_ne!(*transform, Affine::IDENTITY);
            }
            op => panic!("expected fill, got {op:?}"),
        }
    }
}
