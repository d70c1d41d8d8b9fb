//! Frame-by-frame flipbook animation.
//!
//! Each frame is a child drawable shown for its own duration. Frame
//! advancement is sampled from the clock: [`AnimationDrawable::tick`] (and
//! every draw) advances past any elapsed frame deadlines and re-requests a
//! wakeup through the host callback, so no self-referential timer callback
//! is needed and tests drive the clock directly.

use std::sync::Arc;

use drawkit_core::canvas::Canvas;
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{
    Animatable, Drawable, DrawableBase, DrawableState, Opacity,
};
use drawkit_core::error::{DrawableError, DrawableResult};
use drawkit_core::geometry::Insets;
use drawkit_core::theme::Theme;
use vello::kurbo::Rect;

use crate::container::{ContainerState, DrawableContainer};

/// An animation built from a series of frame drawables.
///
/// Starts in the stopped state; call [`Animatable::start`] to play. A
/// one-shot animation stops on its last frame, otherwise playback loops.
/// Becoming invisible pauses the animation; becoming visible with
/// `restart` begins again from the first frame.
pub struct AnimationDrawable {
    container: DrawableContainer,
    durations: Vec<u64>,
    one_shot: bool,
    /// Whether the drawable should animate while visible.
    animating: bool,
    /// Whether a frame deadline is pending.
    running: bool,
    cur_frame: Option<usize>,
    next_due: u64,
}

/// Constant state of an [`AnimationDrawable`].
pub struct AnimationState {
    container: ContainerState,
    durations: Vec<u64>,
    one_shot: bool,
}

impl DrawableState for AnimationState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        let mut animation = AnimationDrawable {
            container: DrawableContainer::from_snapshot(&self.container),
            durations: self.durations.clone(),
            one_shot: self.one_shot,
            animating: false,
            running: false,
            cur_frame: None,
            next_due: 0,
        };
        animation.set_frame(0, true, false);
        Box::new(animation)
    }
}

impl Default for AnimationDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDrawable {
    /// Creates an empty, looping animation.
    pub fn new() -> Self {
        Self {
            container: DrawableContainer::new(),
            durations: Vec::new(),
            one_shot: false,
            animating: false,
            running: false,
            cur_frame: None,
            next_due: 0,
        }
    }

    /// Appends a frame shown for `duration` milliseconds.
    pub fn add_frame(
        &mut self,
        frame: Box<dyn Drawable>,
        duration: u64,
    ) -> DrawableResult<usize> {
        if duration == 0 {
            return Err(DrawableError::InvalidFrameDuration { duration: 0 });
        }
        let index = self.container.add_child(frame);
        self.durations.push(duration);
        if self.cur_frame.is_none() {
            self.set_frame(0, true, false);
        }
        Ok(index)
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.durations.len()
    }

    /// Duration of the frame at `index`, in milliseconds.
    pub fn frame_duration(&self, index: usize) -> u64 {
        self.durations[index]
    }

    /// The currently shown frame index.
    pub fn current_frame(&self) -> Option<usize> {
        self.cur_frame
    }

    /// Shows `frame` without scheduling; used by transition drivers.
    pub fn set_current_frame(&mut self, frame: usize) {
        self.set_frame(frame, true, false);
    }

    /// Whether the animation plays once and stops on the last frame.
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Sets whether the animation should play once or repeat.
    pub fn set_one_shot(&mut self, one_shot: bool) {
        self.one_shot = one_shot;
    }

    /// The backing container.
    pub fn container(&self) -> &DrawableContainer {
        &self.container
    }

    /// Advances past any elapsed frame deadlines.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let now = self.container.base().now();
        while self.running && now >= self.next_due {
            self.next_frame();
        }
    }

    fn next_frame(&mut self) {
        let count = self.frame_count();
        if count == 0 {
            return;
        }
        let mut next = self.cur_frame.map(|f| f + 1).unwrap_or(0);
        if next >= count {
            next = 0;
        }
        let keep_going = !self.one_shot || next < count - 1;
        self.set_frame(next, false, keep_going);
    }

    fn set_frame(&mut self, frame: usize, unschedule: bool, animate: bool) {
        if frame >= self.frame_count() {
            return;
        }

        self.animating = animate;
        self.cur_frame = Some(frame);
        self.container.select(Some(frame));

        if unschedule || animate {
            self.container.base().unschedule();
        }
        self.running = false;

        if animate {
            self.running = true;
            self.next_due = self.container.base().now() + self.durations[frame];
            self.container.base().schedule(self.next_due);
        }
    }

    fn unschedule_frames(&mut self) {
        self.cur_frame = None;
        self.running = false;
        self.container.base().unschedule();
    }
}

impl Animatable for AnimationDrawable {
    /// Starts the animation, looping if necessary. No effect while the
    /// animation is already running.
    fn start(&mut self) {
        self.animating = true;
        if !self.running {
            self.next_frame();
        }
    }

    fn stop(&mut self) {
        self.animating = false;
        if self.running {
            self.unschedule_frames();
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drawable for AnimationDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        self.tick();
        self.container.draw(canvas);
    }

    fn base(&self) -> &DrawableBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        self.container.base_mut()
    }

    fn on_bounds_change(&mut self) {
        self.container.on_bounds_change();
    }

    fn on_state_change(&mut self) -> bool {
        self.container.on_state_change()
    }

    fn on_level_change(&mut self) -> bool {
        self.container.on_level_change()
    }

    fn set_alpha(&mut self, alpha: u8) {
        self.container.set_alpha(alpha);
    }

    fn alpha(&self) -> u8 {
        self.container.alpha()
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        self.container.set_color_filter(filter);
    }

    fn color_filter(&self) -> Option<ColorFilter> {
        self.container.color_filter()
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        self.container.set_tint_list(tint);
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.container.set_tint_mode(mode);
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        let changed = self.container.set_visible(visible, restart);
        if visible {
            if restart || changed {
                let start_from_zero = restart
                    || self
                        .cur_frame
                        .map(|f| f >= self.frame_count())
                        .unwrap_or(true);
                let frame = if start_from_zero {
                    0
                } else {
                    self.cur_frame.unwrap_or(0)
                };
                let animating = self.animating;
                self.set_frame(frame, true, animating);
            }
        } else {
            self.unschedule_frames();
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        self.container.opacity()
    }

    fn intrinsic_width(&self) -> i32 {
        self.container.intrinsic_width()
    }

    fn intrinsic_height(&self) -> i32 {
        self.container.intrinsic_height()
    }

    fn padding(&self) -> Option<Insets> {
        self.container.padding()
    }

    fn is_stateful(&self) -> bool {
        self.container.is_stateful()
    }

    fn jump_to_current_state(&mut self) {
        self.container.jump_to_current_state();
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        let container = self.container.snapshot()?;
        Some(Arc::new(AnimationState {
            container,
            durations: self.durations.clone(),
            one_shot: self.one_shot,
        }))
    }

    fn mutate(&mut self) {
        self.container.mutate();
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        self.container.apply_theme(theme);
    }

    fn can_apply_theme(&self) -> bool {
        self.container.can_apply_theme()
    }

    fn set_hotspot(&mut self, x: f64, y: f64) {
        self.container.set_hotspot(x, y);
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        self.container.set_hotspot_bounds(bounds);
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

    fn colored(rgb: (u8, u8, u8)) -> Box<dyn Drawable> {
        Box::new(ShapeDrawable::with_color(Color::from_rgb8(rgb.0, rgb.1, rgb.2)))
    }

    fn three_frames(clock: Arc<ManualClock>) -> AnimationDrawable {
        let mut animation = AnimationDrawable::new();
        animation.base_mut().set_clock(clock);
        animation.add_frame(colored((1, 0, 0)), 50).unwrap();
        animation.add_frame(colored((0, 1, 0)), 50).unwrap();
        animation.add_frame(colored((0, 0, 1)), 100).unwrap();
        animation.set_bounds(Rect::new(0.0, 0.0, 4.0, 4.0));
        animation
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut animation = AnimationDrawable::new();
        assert!(matches!(
            animation.add_frame(colored((0, 0, 0)), 0),
            Err(DrawableError::InvalidFrameDuration { .. })
        ));
    }

    #[test]
    fn test_frames_advance_with_clock() {
        let clock = ManualClock::shared(0);
        let mut animation = three_frames(clock.clone());
        assert_eq!(animation.current_frame(), Some(0));
        assert!(!animation.is_running());

        animation.start();
        assert!(animation.is_running());
        // Starting advances off the initial frame.
        assert_eq!(animation.current_frame(), Some(1));

        clock.advance(50);
        animation.tick();
        assert_eq!(animation.current_frame(), Some(2));

        // Looping wraps past the last frame.
        clock.advance(100);
        animation.tick();
        assert_eq!(animation.current_frame(), Some(0));
        assert!(animation.is_running());
    }

    #[test]
    fn test_one_shot_stops_on_last_frame() {
        let clock = ManualClock::shared(0);
        let mut animation = three_frames(clock.clone());
        animation.set_one_shot(true);
        animation.start();

        clock.advance(1000);
        animation.tick();
        assert_eq!(animation.current_frame(), Some(2));
        assert!(!animation.is_running());

        // Staying put: no wraparound on later ticks.
        clock.advance(1000);
        animation.tick();
        assert_eq!(animation.current_frame(), Some(2));
    }

    #[test]
    fn test_draw_samples_elapsed_time() {
        let clock = ManualClock::shared(0);
        let mut animation = three_frames(clock.clone());
        animation.start();

        clock.advance(50);
        let mut canvas = RecordingCanvas::new();
        animation.draw(&mut canvas);
        assert_eq!(animation.current_frame(), Some(2));
        assert_eq!(
            canvas.fills()[0].solid_color(),
            Some(Color::from_rgb8(0, 0, 1))
        );
    }

    #[test]
    fn test_visibility_pause_and_restart() {
        let clock = ManualClock::shared(0);
        let mut animation = three_frames(clock.clone());
        animation.start();
        clock.advance(50);
        animation.tick();
        assert_eq!(animation.current_frame(), Some(2));

        animation.set_visible(false, false);
        assert!(!animation.is_running());

        // Revisible with restart: back to the first frame, still animating.
        animation.set_visible(true, true);
        assert_eq!(animation.current_frame(), Some(0));
        assert!(animation.is_running());
    }

    #[test]
    fn test_stop_freezes_current_frame() {
        let clock = ManualClock::shared(0);
        let mut animation = three_frames(clock.clone());
        animation.start();
        animation.stop();
        assert!(!animation.is_running());

        clock.advance(500);
        animation.tick();
        // No pending deadline: the frame does not move.
        assert_eq!(animation.container().current_index(), Some(1));
    }
}
