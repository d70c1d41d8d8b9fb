//! Selects one child drawable by matching the runtime state set against an
//! ordered list of state-spec patterns.

use std::sync::Arc;

use drawkit_core::canvas::Canvas;
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::geometry::Insets;
use drawkit_core::state::{StateSet, StateSpec};
use drawkit_core::theme::Theme;
use vello::kurbo::Rect;

use crate::container::{ContainerState, DrawableContainer};

/// A container that swaps the shown child when the state set changes.
///
/// Patterns are matched in insertion order; the first spec satisfied by the
/// runtime state wins, so callers order entries from most to least
/// specific and typically end with [`StateSpec::WILDCARD`].
pub struct StateListDrawable {
    pub(crate) container: DrawableContainer,
    /// Parallel to the container's children. `None` marks children that are
    /// not selectable by state (e.g. transition frames added by wrappers).
    pub(crate) specs: Vec<Option<StateSpec>>,
}

/// Constant state of a [`StateListDrawable`].
pub struct StateListState {
    pub(crate) container: ContainerState,
    pub(crate) specs: Vec<Option<StateSpec>>,
}

impl StateListState {
    /// Builds a fresh instance, resolving the empty state vector.
    pub(crate) fn build(&self) -> StateListDrawable {
        let mut list = StateListDrawable {
            container: DrawableContainer::from_snapshot(&self.container),
            specs: self.specs.clone(),
        };
        list.select_for_state();
        list
    }
}

impl DrawableState for StateListState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(self.build())
    }
}

impl Default for StateListDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl StateListDrawable {
    /// Creates an empty state list.
    pub fn new() -> Self {
        Self {
            container: DrawableContainer::new(),
            specs: Vec::new(),
        }
    }

    /// Adds a child shown while `spec` matches the runtime state.
    ///
    /// Re-resolves the selection in case the new entry matches the current
    /// state.
    pub fn add_state(&mut self, spec: StateSpec, drawable: Box<dyn Drawable>) -> usize {
        let index = self.container.add_child(drawable);
        self.specs.push(Some(spec));
        self.select_for_state();
        index
    }

    /// Number of registered entries (including unselectable ones).
    pub fn state_count(&self) -> usize {
        self.specs.len()
    }

    /// The spec registered at `index`, when that child is state-selectable.
    pub fn spec_at(&self, index: usize) -> Option<StateSpec> {
        self.specs.get(index).copied().flatten()
    }

    /// The child registered at `index`.
    pub fn state_drawable_mut(&mut self, index: usize) -> Option<&mut dyn Drawable> {
        self.container.child_mut(index)
    }

    /// The shared container.
    pub fn container(&self) -> &DrawableContainer {
        &self.container
    }

    /// The shared container, mutably.
    pub fn container_mut(&mut self) -> &mut DrawableContainer {
        &mut self.container
    }

    /// Index of the first entry matched by `state`, without the wildcard
    /// fallback.
    pub fn index_for_state(&self, state: StateSet) -> Option<usize> {
        self.specs
            .iter()
            .position(|spec| spec.map(|s| s.matches(state)).unwrap_or(false))
    }

    /// Index of the first entry accepting the empty state vector.
    pub(crate) fn wildcard_index(&self) -> Option<usize> {
        self.specs
            .iter()
            .position(|spec| spec.map(|s| s.matches(StateSet::empty())).unwrap_or(false))
    }

    /// Resolves the current state to an entry and selects it.
    pub(crate) fn select_for_state(&mut self) -> bool {
        let state = self.container.base().state();
        let index = self
            .index_for_state(state)
            .or_else(|| self.wildcard_index());
        self.container.select(index)
    }
}

impl Drawable for StateListDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
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

    fn on_level_change(&mut self) -> bool {
        self.container.on_level_change()
    }

    fn on_state_change(&mut self) -> bool {
        if self.select_for_state() {
            return true;
        }
        self.container.on_state_change()
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
        self.container.set_visible(visible, restart)
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

    fn minimum_width(&self) -> i32 {
        self.container.minimum_width()
    }

    fn minimum_height(&self) -> i32 {
        self.container.minimum_height()
    }

    fn padding(&self) -> Option<Insets> {
        self.container.padding()
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn jump_to_current_state(&mut self) {
        self.container.jump_to_current_state();
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        let container = self.container.snapshot()?;
        Some(Arc::new(StateListState {
            container,
            specs: self.specs.clone(),
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

    fn hotspot_bounds(&self) -> Option<Rect> {
        self.container.hotspot_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDrawable;
    use drawkit_core::canvas::RecordingCanvas;
    use vello::peniko::Color;

    fn colored(rgb: (u8, u8, u8)) -> Box<dyn Drawable> {
        Box::new(ShapeDrawable::with_color(Color::from_rgb8(rgb.0, rgb.1, rgb.2)))
    }

    fn fill_color(list: &mut StateListDrawable) -> Color {
        let mut canvas = RecordingCanvas::new();
        list.draw(&mut canvas);
        canvas.fills()[0].solid_color().unwrap()
    }

    #[test]
    fn test_first_match_wins_over_later_patterns() {
        let mut list = StateListDrawable::new();
        list.add_state(StateSpec::requires(StateSet::FOCUSED), colored((1, 0, 0)));
        list.add_state(StateSpec::requires(StateSet::PRESSED), colored((0, 1, 0)));
        list.add_state(StateSpec::WILDCARD, colored((0, 0, 1)));
        list.set_bounds(Rect::new(0.0, 0.0, 8.0, 8.0));

        // Both focused and pressed patterns match; index 0 wins.
        list.set_state(StateSet::PRESSED | StateSet::FOCUSED);
        assert_eq!(list.container().current_index(), Some(0));
        assert_eq!(fill_color(&mut list), Color::from_rgb8(1, 0, 0));

        list.set_state(StateSet::PRESSED);
        assert_eq!(list.container().current_index(), Some(1));

        // Nothing matches; the wildcard entry is the fallback.
        list.set_state(StateSet::ENABLED);
        assert_eq!(list.container().current_index(), Some(2));
        assert_eq!(fill_color(&mut list), Color::from_rgb8(0, 0, 1));
    }

    #[test]
    fn test_resolution_is_history_independent() {
        let build = || {
            let mut list = StateListDrawable::new();
            list.add_state(StateSpec::requires(StateSet::PRESSED), colored((9, 0, 0)));
            list.add_state(StateSpec::WILDCARD, colored((0, 9, 0)));
            list
        };

        let mut a = build();
        a.set_state(StateSet::FOCUSED);
        a.set_state(StateSet::PRESSED);

        let mut b = build();
        b.set_state(StateSet::PRESSED);

        assert_eq!(
            a.container().current_index(),
            b.container().current_index()
        );
    }

    #[test]
    fn test_no_match_without_wildcard_clears() {
        let mut list = StateListDrawable::new();
        list.add_state(StateSpec::requires(StateSet::PRESSED), colored((9, 0, 0)));
        list.set_state(StateSet::PRESSED);
        assert_eq!(list.container().current_index(), Some(0));

        list.set_state(StateSet::FOCUSED);
        assert_eq!(list.container().current_index(), None);
    }

    #[test]
    fn test_adding_entry_reselects() {
        let mut list = StateListDrawable::new();
        list.set_state(StateSet::PRESSED);
        list.add_state(StateSpec::WILDCARD, colored((1, 1, 1)));
        assert_eq!(list.container().current_index(), Some(0));

        // A more specific entry added later does not shadow the earlier
        // match for the current state.
        list.add_state(StateSpec::requires(StateSet::PRESSED), colored((2, 2, 2)));
        assert_eq!(list.container().current_index(), Some(0));
    }

    #[test]
    fn test_clone_reselects_from_state() {
        let mut list = StateListDrawable::new();
        list.add_state(StateSpec::requires(StateSet::PRESSED), colored((9, 0, 0)));
        list.add_state(StateSpec::WILDCARD, colored((0, 9, 0)));
        list.set_state(StateSet::PRESSED);

        let state = list.constant_state().unwrap();
        let mut clone = state.new_drawable();

        // A fresh clone starts from the empty state vector: wildcard.
        let clone_list = clone
            .as_any_mut()
            .downcast_mut::<StateListDrawable>()
            .unwrap();
        assert_eq!(clone_list.container().current_index(), Some(1));

        clone_list.set_state(StateSet::PRESSED);
        assert_eq!(clone_list.container().current_index(), Some(0));
    }
}
