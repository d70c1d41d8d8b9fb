//! The drawable contract.
//!
//! Every renderable unit implements [`Drawable`]: a polymorphic object with
//! bounds, a state set, a level (0–10000), an alpha and a draw operation.
//! Implementations embed a [`DrawableBase`] holding the per-instance fields
//! shared by all variants; the trait's provided methods route mutations
//! through the `on_*_change` hooks and signal the host through the
//! [`DrawableCallback`] exactly once per logical change, never on a no-op.
//!
//! Configuration a family of cloned instances can share lives in a
//! [`DrawableState`] record behind an `Arc`. Writes go through
//! copy-on-write, so a shared record is never mutated in place; `mutate()`
//! detaches an instance from its siblings idempotently.

use std::any::Any;
use std::sync::{Arc, Weak};

use vello::kurbo::Rect;
use vello::peniko::Color;

use crate::canvas::Canvas;
use crate::clock::{SharedClock, UptimeClock};
use crate::color::{BlendMode, ColorFilter, ColorList};
use crate::geometry::Insets;
use crate::state::StateSet;
use crate::theme::Theme;

/// The maximum level value.
pub const MAX_LEVEL: i32 = 10000;

/// Host-side callback a drawable signals redraws and timer requests to.
pub trait DrawableCallback {
    /// The drawable's visible output changed; redraw it.
    fn invalidate_drawable(&self);

    /// The drawable wants to be ticked at `when` (clock milliseconds).
    fn schedule_drawable(&self, when: u64);

    /// Any pending tick request is obsolete.
    fn unschedule_drawable(&self);
}

/// How opaque a drawable's output is over its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opacity {
    /// Fully opaque everywhere within the bounds.
    Opaque,
    /// Some pixels may be partially transparent.
    Translucent,
    /// Draws nothing visible.
    Transparent,
    /// Not known.
    Unknown,
}

/// Combines two opacities; the more transparent one wins.
pub fn resolve_opacity(a: Opacity, b: Opacity) -> Opacity {
    if a == b {
        return a;
    }
    if a == Opacity::Unknown || b == Opacity::Unknown {
        return Opacity::Unknown;
    }
    if a == Opacity::Translucent || b == Opacity::Translucent {
        return Opacity::Translucent;
    }
    if a == Opacity::Transparent || b == Opacity::Transparent {
        return Opacity::Transparent;
    }
    Opacity::Opaque
}

/// A drawable that can run a self-contained animation.
pub trait Animatable {
    /// Starts the animation; no effect while already running.
    fn start(&mut self);
    /// Stops the animation; no effect while stopped.
    fn stop(&mut self);
    /// Whether the animation is currently running.
    fn is_running(&self) -> bool;
}

/// Shared constant state a family of cloned drawables references.
///
/// Records are immutable once shared: instances copy-on-write before any
/// field update. `new_drawable` is the clone path.
pub trait DrawableState: Any {
    /// Creates a new drawable instance backed by this state.
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable>;

    /// Whether the state still holds unresolved theme attributes.
    fn can_apply_theme(&self) -> bool {
        false
    }
}

/// Upcast helper so `dyn Drawable` supports downcasting.
pub trait AsAny {
    /// `&self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// `&mut self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-instance fields shared by every drawable variant.
#[derive(Clone)]
pub struct DrawableBase {
    bounds: Rect,
    state: StateSet,
    level: i32,
    visible: bool,
    callback: Option<Weak<dyn DrawableCallback>>,
    clock: SharedClock,
}

impl Default for DrawableBase {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawableBase {
    /// Creates a base with empty bounds, the empty state set, level 0 and
    /// the process uptime clock.
    pub fn new() -> Self {
        Self::with_clock(UptimeClock::shared())
    }

    /// Creates a base sampling time from the given clock.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            bounds: Rect::ZERO,
            state: StateSet::empty(),
            level: 0,
            visible: true,
            callback: None,
            clock,
        }
    }

    /// Current bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Writes the bounds without running hooks or invalidating. Intended
    /// for the [`Drawable`] provided methods and their overrides.
    pub fn set_bounds_raw(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Current state set.
    pub fn state(&self) -> StateSet {
        self.state
    }

    /// Writes the state set without running hooks.
    pub fn set_state_raw(&mut self, state: StateSet) {
        self.state = state;
    }

    /// Current level.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Writes the level without running hooks.
    pub fn set_level_raw(&mut self, level: i32) {
        self.level = level;
    }

    /// Current visibility.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Writes the visibility flag without running hooks.
    pub fn set_visible_raw(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Installs the host callback.
    pub fn set_callback(&mut self, callback: Weak<dyn DrawableCallback>) {
        self.callback = Some(callback);
    }

    /// Removes the host callback.
    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Signals the host that visible output changed.
    pub fn invalidate(&self) {
        if let Some(callback) = self.callback.as_ref().and_then(Weak::upgrade) {
            callback.invalidate_drawable();
        }
    }

    /// Asks the host for a tick at `when` (clock milliseconds).
    pub fn schedule(&self, when: u64) {
        match self.callback.as_ref().and_then(Weak::upgrade) {
            Some(callback) => callback.schedule_drawable(when),
            // Animations still resolve on the next draw; the host just
            // won't be woken for it.
            None => log::debug!("tick request at {when}ms dropped, no callback installed"),
        }
    }

    /// Withdraws any pending tick request.
    pub fn unschedule(&self) {
        if let Some(callback) = self.callback.as_ref().and_then(Weak::upgrade) {
            callback.unschedule_drawable();
        }
    }

    /// Current clock time in milliseconds.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// The clock animations sample from.
    pub fn clock(&self) -> SharedClock {
        Arc::clone(&self.clock)
    }

    /// Replaces the clock. Intended for tests.
    pub fn set_clock(&mut self, clock: SharedClock) {
        self.clock = clock;
    }
}

/// A polymorphic renderable unit.
pub trait Drawable: AsAny {
    /// Renders within the current bounds into `canvas`.
    fn draw(&mut self, canvas: &mut dyn Canvas);

    /// The embedded per-instance fields.
    fn base(&self) -> &DrawableBase;

    /// The embedded per-instance fields, mutably.
    fn base_mut(&mut self) -> &mut DrawableBase;

    /// Bounds changed; caches depending on geometry are stale.
    fn on_bounds_change(&mut self) {}

    /// State set changed. Returns whether the appearance changed.
    fn on_state_change(&mut self) -> bool {
        false
    }

    /// Level changed. Returns whether the appearance changed.
    fn on_level_change(&mut self) -> bool {
        false
    }

    /// Sets the bounds and, on change, runs [`on_bounds_change`]
    /// (Drawable::on_bounds_change) and invalidates once.
    fn set_bounds(&mut self, bounds: Rect) {
        if self.base().bounds() != bounds {
            self.base_mut().set_bounds_raw(bounds);
            self.on_bounds_change();
            self.base().invalidate();
        }
    }

    /// Current bounds.
    fn bounds(&self) -> Rect {
        self.base().bounds()
    }

    /// Sets the state set. Returns whether the appearance changed.
    fn set_state(&mut self, state: StateSet) -> bool {
        if self.base().state() != state {
            self.base_mut().set_state_raw(state);
            self.on_state_change()
        } else {
            false
        }
    }

    /// Current state set.
    fn state(&self) -> StateSet {
        self.base().state()
    }

    /// Sets the level (0–10000). Returns whether the appearance changed.
    fn set_level(&mut self, level: i32) -> bool {
        if self.base().level() != level {
            self.base_mut().set_level_raw(level);
            self.on_level_change()
        } else {
            false
        }
    }

    /// Current level.
    fn level(&self) -> i32 {
        self.base().level()
    }

    /// Sets visibility. `restart` asks animated drawables to restart from
    /// the beginning when becoming visible. Returns whether visibility
    /// actually changed.
    fn set_visible(&mut self, visible: bool, _restart: bool) -> bool {
        let changed = self.base().is_visible() != visible;
        if changed {
            self.base_mut().set_visible_raw(visible);
            self.base().invalidate();
        }
        changed
    }

    /// Current visibility.
    fn is_visible(&self) -> bool {
        self.base().is_visible()
    }

    /// Sets the global alpha (0 transparent, 255 opaque).
    fn set_alpha(&mut self, alpha: u8);

    /// Current global alpha.
    fn alpha(&self) -> u8 {
        0xFF
    }

    /// Sets or clears the color filter. A set filter overrides any tint.
    fn set_color_filter(&mut self, filter: Option<ColorFilter>);

    /// Current color filter.
    fn color_filter(&self) -> Option<ColorFilter> {
        None
    }

    /// Tints the drawable with a single color (default blend mode SrcIn).
    fn set_tint(&mut self, color: Color) {
        self.set_tint_list(Some(ColorList::solid(color)));
    }

    /// Sets or clears the state-dependent tint list.
    fn set_tint_list(&mut self, _tint: Option<ColorList>) {}

    /// Sets the blend mode used for tinting.
    fn set_tint_mode(&mut self, _mode: BlendMode) {}

    /// How opaque the output is over the bounds.
    fn opacity(&self) -> Opacity;

    /// Intrinsic width in pixels, or −1 when it has none.
    fn intrinsic_width(&self) -> i32 {
        -1
    }

    /// Intrinsic height in pixels, or −1 when it has none.
    fn intrinsic_height(&self) -> i32 {
        -1
    }

    /// Minimum width suggested to hosts.
    fn minimum_width(&self) -> i32 {
        self.intrinsic_width().max(0)
    }

    /// Minimum height suggested to hosts.
    fn minimum_height(&self) -> i32 {
        self.intrinsic_height().max(0)
    }

    /// Padding hosts should place content within, if any.
    fn padding(&self) -> Option<Insets> {
        None
    }

    /// Whether appearance depends on the state set.
    fn is_stateful(&self) -> bool {
        false
    }

    /// Skips any active animations straight to the current target state.
    fn jump_to_current_state(&mut self) {}

    /// The shared constant state, or `None` when this instance cannot be
    /// cheaply cloned.
    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        None
    }

    /// Detaches this instance from constant state shared with siblings.
    /// Idempotent.
    fn mutate(&mut self) {}

    /// Resolves deferred theme attributes against `theme`.
    fn apply_theme(&mut self, _theme: &dyn Theme) {}

    /// Whether unresolved theme attributes remain.
    fn can_apply_theme(&self) -> bool {
        false
    }

    /// Moves the interaction hotspot (e.g. the touch point).
    fn set_hotspot(&mut self, _x: f64, _y: f64) {}

    /// Constrains the hotspot to the given bounds.
    fn set_hotspot_bounds(&mut self, _bounds: Rect) {}

    /// The explicit hotspot bounds, if set.
    fn hotspot_bounds(&self) -> Option<Rect> {
        None
    }

    /// The drawable as an [`Animatable`], when it supports one.
    fn as_animatable(&mut self) -> Option<&mut dyn Animatable> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Probe {
        base: DrawableBase,
        bounds_changes: usize,
        state_changes: usize,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                base: DrawableBase::new(),
                bounds_changes: 0,
                state_changes: 0,
            }
        }
    }

    impl Drawable for Probe {
        fn draw(&mut self, _canvas: &mut dyn Canvas) {}

        fn base(&self) -> &DrawableBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut DrawableBase {
            &mut self.base
        }

        fn on_bounds_change(&mut self) {
            self.bounds_changes += 1;
        }

        fn on_state_change(&mut self) -> bool {
            self.state_changes += 1;
            true
        }

        fn set_alpha(&mut self, _alpha: u8) {}

        fn set_color_filter(&mut self, _filter: Option<ColorFilter>) {}

        fn opacity(&self) -> Opacity {
            Opacity::Translucent
        }
    }

    #[test]
    fn test_setters_skip_noops() {
        let mut probe = Probe::new();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        probe.set_bounds(rect);
        probe.set_bounds(rect);
        assert_eq!(probe.bounds_changes, 1);

        assert!(probe.set_state(StateSet::PRESSED));
        assert!(!probe.set_state(StateSet::PRESSED));
        assert_eq!(probe.state_changes, 1);

        assert!(!probe.set_level(0));
        assert!(!probe.set_level(5000)); // default hook reports no change
        assert_eq!(probe.level(), 5000);
    }

    #[test]
    fn test_resolve_opacity() {
        use Opacity::*;
        assert_eq!(resolve_opacity(Opaque, Opaque), Opaque);
        assert_eq!(resolve_opacity(Opaque, Translucent), Translucent);
        assert_eq!(resolve_opacity(Opaque, Transparent), Transparent);
        assert_eq!(resolve_opacity(Transparent, Translucent), Translucent);
        assert_eq!(resolve_opacity(Unknown, Opaque), Unknown);
    }

    struct CountingCallback {
        invalidations: Cell<usize>,
    }

    impl DrawableCallback for CountingCallback {
        fn invalidate_drawable(&self) {
            self.invalidations.set(self.invalidations.get() + 1);
        }

        fn schedule_drawable(&self, _when: u64) {}

        fn unschedule_drawable(&self) {}
    }

    #[test]
    fn test_invalidate_once_per_change() {
        let callback = Arc::new(CountingCallback {
            invalidations: Cell::new(0),
        });
        let strong: Arc<dyn DrawableCallback> = callback.clone();
        let mut probe = Probe::new();
        probe.base_mut().set_callback(Arc::downgrade(&strong));

        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        probe.set_bounds(rect);
        probe.set_bounds(rect);
        assert_eq!(callback.invalidations.get(), 1);

        probe.set_visible(false, false);
        probe.set_visible(false, false);
        assert_eq!(callback.invalidations.get(), 2);
    }
}
