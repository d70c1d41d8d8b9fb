//! A state list whose keyframes animate between each other.
//!
//! Children are keyframes tagged with ids. A directional transition graph
//! maps (from, to) keyframe pairs to extra children that play while
//! switching; a reversible edge also serves the opposite direction played
//! backwards. When no edge exists for a switch the drawable falls back to
//! a hard cut, never an error.

use std::sync::Arc;

use drawkit_core::canvas::Canvas;
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::geometry::Insets;
use drawkit_core::state::StateSpec;
use drawkit_core::theme::Theme;
use indexmap::IndexMap;
use log::{debug, warn};
use vello::kurbo::Rect;

use crate::animation::AnimationDrawable;
use crate::state_list::{StateListDrawable, StateListState};

/// A keyframe id. Zero means "no id"; transitions require both endpoints
/// to carry a non-zero id.
pub type KeyframeId = i64;

#[derive(Debug, Clone, Copy)]
struct TransitionEntry {
    index: usize,
    reversed: bool,
}

/// Duration-weighted frame walk over a flipbook child, sampled from the
/// clock and reversible in place.
struct FrameTransition {
    /// Signed so a mid-flight reversal may move the origin before zero.
    start: i64,
    total: u64,
    /// Frame durations in play order.
    durations: Vec<u64>,
    reversed: bool,
}

impl FrameTransition {
    fn new(animation: &AnimationDrawable, reversed: bool, now: u64) -> Self {
        let count = animation.frame_count();
        let durations: Vec<u64> = (0..count)
            .map(|i| {
                let frame = if reversed { count - i - 1 } else { i };
                animation.frame_duration(frame)
            })
            .collect();
        let total = durations.iter().sum();
        Self {
            start: now as i64,
            total,
            durations,
            reversed,
        }
    }

    fn elapsed(&self, now: u64) -> u64 {
        (now as i64 - self.start).clamp(0, self.total as i64) as u64
    }

    /// The flipbook frame to show at `now`, and whether the walk is done.
    fn frame_at(&self, now: u64) -> (usize, bool) {
        let count = self.durations.len();
        if count == 0 || self.total == 0 {
            return (0, true);
        }
        let elapsed = self.elapsed(now);
        let mut acc = 0;
        let mut play_index = count - 1;
        for (i, duration) in self.durations.iter().enumerate() {
            acc += duration;
            if elapsed < acc {
                play_index = i;
                break;
            }
        }
        let frame = if self.reversed {
            count - play_index - 1
        } else {
            play_index
        };
        (frame, elapsed >= self.total)
    }

    /// Flips direction, continuing from the complement of the current
    /// progress so the visible frame walks back the way it came.
    fn reverse(&mut self, now: u64) {
        let remaining = self.total - self.elapsed(now);
        self.reversed = !self.reversed;
        self.durations.reverse();
        self.start = now as i64 - remaining as i64;
    }

    fn restart(&mut self, now: u64) {
        self.start = now as i64;
    }
}

enum RunningTransition {
    /// A flipbook child driven frame-by-frame.
    Frames { index: usize, walk: FrameTransition },
    /// A child with its own animator, started and stopped as a whole.
    Animatable { index: usize },
}

impl RunningTransition {
    fn can_reverse(&self) -> bool {
        matches!(self, RunningTransition::Frames { .. })
    }
}

/// A state list whose keyframe switches can play transition children.
pub struct AnimatedStateListDrawable {
    list: StateListDrawable,
    /// Keyframe ids parallel to the children; 0 for unselectable entries.
    keyframe_ids: Vec<KeyframeId>,
    transitions: IndexMap<(KeyframeId, KeyframeId), TransitionEntry>,
    transition: Option<RunningTransition>,
    /// Index away from which the running transition animates.
    transition_from: Option<usize>,
    /// Index to be selected after the running transition ends.
    transition_to: Option<usize>,
}

/// Constant state of an [`AnimatedStateListDrawable`].
pub struct AnimatedStateListState {
    list: StateListState,
    keyframe_ids: Vec<KeyframeId>,
    transitions: IndexMap<(KeyframeId, KeyframeId), TransitionEntry>,
}

impl DrawableState for AnimatedStateListState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        let mut drawable = AnimatedStateListDrawable {
            list: self.list.build(),
            keyframe_ids: self.keyframe_ids.clone(),
            transitions: self.transitions.clone(),
            transition: None,
            transition_from: None,
            transition_to: None,
        };
        drawable.jump_to_current_state();
        Box::new(drawable)
    }
}

impl Default for AnimatedStateListDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimatedStateListDrawable {
    /// Creates an empty animated state list.
    pub fn new() -> Self {
        Self {
            list: StateListDrawable::new(),
            keyframe_ids: Vec::new(),
            transitions: IndexMap::new(),
            transition: None,
            transition_from: None,
            transition_to: None,
        }
    }

    /// Adds a keyframe shown while `spec` matches, tagged with `id`.
    pub fn add_state(
        &mut self,
        spec: StateSpec,
        drawable: Box<dyn Drawable>,
        id: KeyframeId,
    ) -> usize {
        let index = self.list.add_state(spec, drawable);
        self.keyframe_ids.push(id);
        index
    }

    /// Adds a transition played when switching from keyframe `from_id` to
    /// keyframe `to_id`. With `reversible`, the same child also serves the
    /// opposite switch played backwards.
    pub fn add_transition(
        &mut self,
        from_id: KeyframeId,
        to_id: KeyframeId,
        transition: Box<dyn Drawable>,
        reversible: bool,
    ) -> usize {
        let index = self.list.container.add_child(transition);
        self.list.specs.push(None);
        self.keyframe_ids.push(0);

        self.transitions.insert(
            (from_id, to_id),
            TransitionEntry {
                index,
                reversed: false,
            },
        );
        if reversible {
            self.transitions.insert(
                (to_id, from_id),
                TransitionEntry {
                    index,
                    reversed: true,
                },
            );
        }
        index
    }

    /// The backing state list.
    pub fn state_list(&self) -> &StateListDrawable {
        &self.list
    }

    /// Whether a transition is currently animating.
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    fn keyframe_id_at(&self, index: Option<usize>) -> KeyframeId {
        index
            .and_then(|i| self.keyframe_ids.get(i).copied())
            .unwrap_or(0)
    }

    fn index_of_keyframe(&self) -> Option<usize> {
        let state = self.list.container.base().state();
        self.list
            .index_for_state(state)
            .or_else(|| self.list.wildcard_index())
    }

    fn select_transition(&mut self, to_index: usize) -> bool {
        let now = self.list.container.base().now();

        let from_index = if self.transition.is_some() {
            if Some(to_index) == self.transition_to {
                // Already animating to that keyframe.
                return true;
            }
            let reversible = self
                .transition
                .as_ref()
                .map(RunningTransition::can_reverse)
                .unwrap_or(false);
            if Some(to_index) == self.transition_from && reversible {
                // Reverse the current animation in place, picking up from
                // the visible progress rather than restarting.
                if let Some(RunningTransition::Frames { walk, .. }) = &mut self.transition {
                    walk.reverse(now);
                }
                std::mem::swap(&mut self.transition_from, &mut self.transition_to);
                self.list.container.base().invalidate();
                return true;
            }
            // Changing animation: end the current one and start the next
            // from its target.
            let from = self.transition_to;
            self.stop_transition();
            from
        } else {
            self.list.container.current_index()
        };

        self.transition = None;
        self.transition_from = None;
        self.transition_to = None;

        let from_id = self.keyframe_id_at(from_index);
        let to_id = self.keyframe_id_at(Some(to_index));
        if from_id == 0 || to_id == 0 {
            // Missing a keyframe id.
            return false;
        }

        let Some(entry) = self.transitions.get(&(from_id, to_id)).copied() else {
            debug!("no transition registered for {from_id} -> {to_id}, hard cut");
            return false;
        };

        // This may fail if we're already on the transition, but that's okay.
        self.list.container.select(Some(entry.index));

        let transition = match self.list.container.child_mut(entry.index) {
            Some(child) => {
                if let Some(animation) =
                    child.as_any_mut().downcast_mut::<AnimationDrawable>()
                {
                    let walk = FrameTransition::new(animation, entry.reversed, now);
                    let (frame, _) = walk.frame_at(now);
                    animation.set_current_frame(frame);
                    RunningTransition::Frames {
                        index: entry.index,
                        walk,
                    }
                } else if let Some(animatable) = child.as_animatable() {
                    animatable.start();
                    RunningTransition::Animatable { index: entry.index }
                } else {
                    warn!("transition child for {from_id} -> {to_id} is not animatable, hard cut");
                    return false;
                }
            }
            None => return false,
        };

        self.transition = Some(transition);
        self.transition_from = from_index;
        self.transition_to = Some(to_index);
        self.list.container.base().schedule(now + 1000 / 60);
        true
    }

    fn stop_transition(&mut self) {
        if let Some(RunningTransition::Animatable { index }) = self.transition.take() {
            if let Some(child) = self.list.container.child_mut(index) {
                if let Some(animatable) = child.as_animatable() {
                    animatable.stop();
                }
            }
        }
    }

    /// Samples the running transition against the clock, stepping the
    /// flipbook child and re-requesting ticks until it finishes.
    fn update_transition(&mut self) {
        let now = self.list.container.base().now();
        let step = match &self.transition {
            Some(RunningTransition::Frames { index, walk }) => {
                let (frame, finished) = walk.frame_at(now);
                Some((*index, frame, finished))
            }
            _ => None,
        };
        let Some((index, frame, finished)) = step else {
            return;
        };
        if let Some(child) = self.list.container.child_mut(index) {
            if let Some(animation) = child.as_any_mut().downcast_mut::<AnimationDrawable>() {
                animation.set_current_frame(frame);
            }
        }
        if !finished {
            self.list.container.base().schedule(now + 1000 / 60);
        }
    }

    /// Host entry point for a scheduled tick.
    pub fn tick(&mut self) {
        self.update_transition();
        self.list.container.tick();
    }
}

impl Drawable for AnimatedStateListDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        self.update_transition();
        self.list.draw(canvas);
    }

    fn base(&self) -> &DrawableBase {
        self.list.base()
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        self.list.base_mut()
    }

    fn on_bounds_change(&mut self) {
        self.list.on_bounds_change();
    }

    fn on_level_change(&mut self) -> bool {
        self.list.on_level_change()
    }

    fn on_state_change(&mut self) -> bool {
        let target = self.index_of_keyframe();

        if target.is_some() && target == self.list.container.current_index() {
            // Propagate the state change to the current keyframe.
            let state = self.list.container.base().state();
            if let Some(child) = self.list.container.current_mut() {
                return child.set_state(state);
            }
            return false;
        }

        // Attempt a transition to the keyframe, then fall back to a hard
        // cut.
        if let Some(target) = target {
            if self.select_transition(target) {
                return true;
            }
        }
        if self.list.container.select(target) {
            return true;
        }
        self.list.container.on_state_change()
    }

    fn set_alpha(&mut self, alpha: u8) {
        self.list.set_alpha(alpha);
    }

    fn alpha(&self) -> u8 {
        self.list.alpha()
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        self.list.set_color_filter(filter);
    }

    fn color_filter(&self) -> Option<ColorFilter> {
        self.list.color_filter()
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        self.list.set_tint_list(tint);
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.list.set_tint_mode(mode);
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        let changed = self.list.set_visible(visible, restart);
        if self.transition.is_some() && (changed || restart) {
            if visible {
                let now = self.list.container.base().now();
                if let Some(RunningTransition::Frames { walk, .. }) = &mut self.transition {
                    walk.restart(now);
                }
            } else {
                // Ensure we're showing the correct state when visible.
                self.jump_to_current_state();
            }
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        self.list.opacity()
    }

    fn intrinsic_width(&self) -> i32 {
        self.list.intrinsic_width()
    }

    fn intrinsic_height(&self) -> i32 {
        self.list.intrinsic_height()
    }

    fn padding(&self) -> Option<Insets> {
        self.list.padding()
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn jump_to_current_state(&mut self) {
        self.list.jump_to_current_state();
        if self.transition.is_some() {
            self.stop_transition();
            let target = self.transition_to.take();
            self.transition_from = None;
            self.list.container.select(target);
        }
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        let container = self.list.container.snapshot()?;
        Some(Arc::new(AnimatedStateListState {
            list: StateListState {
                container,
                specs: self.list.specs.clone(),
            },
            keyframe_ids: self.keyframe_ids.clone(),
            transitions: self.transitions.clone(),
        }))
    }

    fn mutate(&mut self) {
        self.list.mutate();
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        self.list.apply_theme(theme);
    }

    fn can_apply_theme(&self) -> bool {
        self.list.can_apply_theme()
    }

    fn set_hotspot(&mut self, x: f64, y: f64) {
        self.list.set_hotspot(x, y);
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        self.list.set_hotspot_bounds(bounds);
    }

    fn hotspot_bounds(&self) -> Option<Rect> {
        self.list.hotspot_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDrawable;
    use drawkit_core::clock::ManualClock;
    use drawkit_core::drawable::Animatable;
    use drawkit_core::state::StateSet;
    use vello::peniko::Color;

    const OFF: KeyframeId = 1;
    const ON: KeyframeId = 2;

    fn colored(rgb: (u8, u8, u8)) -> Box<dyn Drawable> {
        Box::new(ShapeDrawable::with_color(Color::from_rgb8(rgb.0, rgb.1, rgb.2)))
    }

    fn flipbook(clock: Arc<ManualClock>, frames: usize) -> Box<dyn Drawable> {
        let mut animation = AnimationDrawable::new();
        animation.base_mut().set_clock(clock);
        for i in 0..frames {
            animation.add_frame(colored((i as u8, 0, 0)), 100).unwrap();
        }
        animation.set_one_shot(true);
        Box::new(animation)
    }

    fn build(clock: Arc<ManualClock>, reversible: bool) -> AnimatedStateListDrawable {
        let mut drawable = AnimatedStateListDrawable::new();
        drawable.base_mut().set_clock(clock.clone());
        drawable.add_state(
            StateSpec::requires(StateSet::CHECKED),
            colored((0, 255, 0)),
            ON,
        );
        drawable.add_state(StateSpec::WILDCARD, colored((255, 0, 0)), OFF);
        drawable.add_transition(OFF, ON, flipbook(clock, 5), reversible);
        drawable
    }

    fn transition_frame(drawable: &mut AnimatedStateListDrawable) -> usize {
        let index = drawable.list.container.current_index().unwrap();
        let child = drawable.list.container.child_mut(index).unwrap();
        child
            .as_any_mut()
            .downcast_mut::<AnimationDrawable>()
            .unwrap()
            .current_frame()
            .unwrap()
    }

    #[test]
    fn test_same_keyframe_forwards_state() {
        let clock = ManualClock::shared(0);
        let mut drawable = build(clock, false);
        // Initial resolution lands on the wildcard keyframe.
        assert_eq!(drawable.list.container.current_index(), Some(1));

        // A state change resolving to the same keyframe does not switch.
        drawable.set_state(StateSet::PRESSED);
        assert_eq!(drawable.list.container.current_index(), Some(1));
        assert!(!drawable.is_transitioning());
    }

    #[test]
    fn test_transition_plays_frames_over_time() {
        let clock = ManualClock::shared(0);
        let mut drawable = build(clock.clone(), false);

        drawable.set_state(StateSet::CHECKED);
        assert!(drawable.is_transitioning());
        // The transition child (index 2) is selected at its first frame.
        assert_eq!(drawable.list.container.current_index(), Some(2));
        assert_eq!(transition_frame(&mut drawable), 0);

        clock.advance(250);
        drawable.tick();
        assert_eq!(transition_frame(&mut drawable), 2);

        clock.advance(1000);
        drawable.tick();
        assert_eq!(transition_frame(&mut drawable), 4);
    }

    #[test]
    fn test_missing_edge_hard_cuts() {
        let clock = ManualClock::shared(0);
        let mut drawable = build(clock, false);

        drawable.set_state(StateSet::CHECKED);
        drawable.jump_to_current_state();
        assert_eq!(drawable.list.container.current_index(), Some(0));

        // ON -> OFF has no registered edge: direct selection.
        drawable.set_state(StateSet::empty());
        assert!(!drawable.is_transitioning());
        assert_eq!(drawable.list.container.current_index(), Some(1));
    }

    #[test]
    fn test_reversal_picks_up_progress() {
        let clock = ManualClock::shared(0);
        let mut drawable = build(clock.clone(), true);

        drawable.set_state(StateSet::CHECKED);
        // 5 frames x 100ms: at 250ms we are mid-way through frame 2.
        clock.advance(250);
        drawable.tick();
        assert_eq!(transition_frame(&mut drawable), 2);

        // Requesting the opposite keyframe reverses the same walk in
        // place: still on frame 2, not restarted at 4.
        drawable.set_state(StateSet::empty());
        assert!(drawable.is_transitioning());
        drawable.tick();
        assert_eq!(transition_frame(&mut drawable), 2);

        // 50% forward progress continues as 50% backward progress.
        clock.advance(200);
        drawable.tick();
        assert_eq!(transition_frame(&mut drawable), 0);
    }

    #[test]
    fn test_repeat_target_is_noop() {
        let clock = ManualClock::shared(0);
        let mut drawable = build(clock.clone(), false);
        drawable.set_state(StateSet::CHECKED);
        let before = drawable.list.container.current_index();

        // Already en route: a second change to the same target changes
        // nothing.
        drawable.set_state(StateSet::CHECKED | StateSet::ENABLED);
        assert_eq!(drawable.list.container.current_index(), before);
        assert!(drawable.is_transitioning());
    }

    #[test]
    fn test_jump_to_current_state_cancels() {
        let clock = ManualClock::shared(0);
        let mut drawable = build(clock.clone(), false);

        drawable.set_state(StateSet::CHECKED);
        assert!(drawable.is_transitioning());

        drawable.jump_to_current_state();
        assert!(!drawable.is_transitioning());
        // Snapped straight to the target keyframe.
        assert_eq!(drawable.list.container.current_index(), Some(0));
    }

    #[test]
    fn test_animatable_transition_started() {
        let clock = ManualClock::shared(0);
        let mut drawable = AnimatedStateListDrawable::new();
        drawable.base_mut().set_clock(clock.clone());
        drawable.add_state(
            StateSpec::requires(StateSet::CHECKED),
            colored((0, 255, 0)),
            ON,
        );
        drawable.add_state(StateSpec::WILDCARD, colored((255, 0, 0)), OFF);

        let mut spinner = crate::animated_rotate::AnimatedRotateDrawable::new(colored((1, 1, 1)));
        spinner.base_mut().set_clock(clock.clone());
        drawable.add_transition(OFF, ON, Box::new(spinner), false);

        drawable.set_state(StateSet::CHECKED);
        assert!(drawable.is_transitioning());
        let index = drawable.list.container.current_index().unwrap();
        let running = drawable
            .list
            .container
            .child_mut(index)
            .unwrap()
            .as_animatable()
            .unwrap()
            .is_running();
        assert!(running);

        drawable.jump_to_current_state();
        assert_eq!(drawable.list.container.current_index(), Some(0));
    }
}
