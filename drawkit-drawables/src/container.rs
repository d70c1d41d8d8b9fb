//! A drawable that holds several children and selects which one to show.
//!
//! The container owns its children exclusively. Cloning through the
//! constant state hands out lazy futures: each child slot starts as the
//! child's shared state and materializes into an owned drawable on first
//! access, so cloning a large container only pays for the children that
//! are actually shown.
//!
//! Switching children can cross-fade: the outgoing child keeps drawing as
//! the "last" drawable while its alpha ramps down and the incoming child's
//! alpha ramps up, both sampled from the container's clock.

use std::cell::Cell;
use std::sync::Arc;

use drawkit_core::canvas::Canvas;
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{
    resolve_opacity, Drawable, DrawableBase, DrawableState, Opacity,
};
use drawkit_core::geometry::Insets;
use drawkit_core::theme::Theme;
use vello::kurbo::Rect;

/// One child slot: an owned drawable, or the shared state it will be
/// cloned from on first access.
enum ChildSlot {
    Drawable(Box<dyn Drawable>),
    Future(Arc<dyn DrawableState>),
}

/// Container configuration plus cached aggregates over the children.
///
/// The caches hold one invariant: they are either copied whole from the
/// snapshot this container was cloned from, or recomputed over a slot
/// vector with no remaining futures. Mutating entry points that invalidate
/// them materialize every future first.
#[derive(Clone)]
pub(crate) struct ContainerConfig {
    pub(crate) variable_padding: bool,
    pub(crate) constant_size: bool,
    pub(crate) enter_fade_duration: u64,
    pub(crate) exit_fade_duration: u64,
    pub(crate) color_filter: Option<ColorFilter>,
    pub(crate) has_color_filter: bool,
    pub(crate) tint_list: Option<ColorList>,
    pub(crate) has_tint_list: bool,
    pub(crate) tint_mode: BlendMode,
    pub(crate) has_tint_mode: bool,
    pub(crate) mutated: bool,

    constant_width: Cell<i32>,
    constant_height: Cell<i32>,
    constant_min_width: Cell<i32>,
    constant_min_height: Cell<i32>,
    computed_constant_size: Cell<bool>,
    constant_padding: Cell<Option<Insets>>,
    padding_checked: Cell<bool>,
    opacity: Cell<Opacity>,
    checked_opacity: Cell<bool>,
    stateful: Cell<bool>,
    checked_stateful: Cell<bool>,
    can_constant_state: Cell<bool>,
    checked_constant_state: Cell<bool>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            variable_padding: false,
            constant_size: false,
            enter_fade_duration: 0,
            exit_fade_duration: 0,
            color_filter: None,
            has_color_filter: false,
            tint_list: None,
            has_tint_list: false,
            tint_mode: BlendMode::default(),
            has_tint_mode: false,
            mutated: false,
            constant_width: Cell::new(-1),
            constant_height: Cell::new(-1),
            constant_min_width: Cell::new(0),
            constant_min_height: Cell::new(0),
            computed_constant_size: Cell::new(false),
            constant_padding: Cell::new(None),
            padding_checked: Cell::new(false),
            opacity: Cell::new(Opacity::Transparent),
            checked_opacity: Cell::new(false),
            stateful: Cell::new(false),
            checked_stateful: Cell::new(false),
            can_constant_state: Cell::new(false),
            checked_constant_state: Cell::new(false),
        }
    }
}

impl ContainerConfig {
    fn invalidate_caches(&self) {
        self.computed_constant_size.set(false);
        self.padding_checked.set(false);
        self.constant_padding.set(None);
        self.checked_opacity.set(false);
        self.checked_stateful.set(false);
        self.checked_constant_state.set(false);
    }
}

/// The cloneable snapshot of a container: configuration, filled aggregate
/// caches, and every child's shared state.
pub struct ContainerState {
    pub(crate) config: ContainerConfig,
    pub(crate) children: Vec<Arc<dyn DrawableState>>,
}

impl DrawableState for ContainerState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(DrawableContainer::from_snapshot(&self))
    }
}

/// A drawable holding several children and showing one of them, optionally
/// cross-fading on switches.
pub struct DrawableContainer {
    base: DrawableBase,
    config: ContainerConfig,
    slots: Vec<ChildSlot>,
    cur_index: Option<usize>,
    last_index: Option<usize>,
    alpha: u8,
    /// Whether `set_alpha` has been called at least once.
    has_alpha: bool,
    enter_end: u64,
    exit_end: u64,
    hotspot_bounds: Option<Rect>,
    mutated: bool,
}

impl Default for DrawableContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawableContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            base: DrawableBase::new(),
            config: ContainerConfig::default(),
            slots: Vec::new(),
            cur_index: None,
            last_index: None,
            alpha: 0xFF,
            has_alpha: false,
            enter_end: 0,
            exit_end: 0,
            hotspot_bounds: None,
            mutated: false,
        }
    }

    /// Rebuilds a container from a snapshot; children start as futures.
    pub(crate) fn from_snapshot(state: &ContainerState) -> Self {
        let mut container = Self::new();
        container.config = state.config.clone();
        container.slots = state
            .children
            .iter()
            .map(|child| ChildSlot::Future(Arc::clone(child)))
            .collect();
        container
    }

    /// Appends a child. Children start hidden until selected.
    pub fn add_child(&mut self, mut child: Box<dyn Drawable>) -> usize {
        child.set_visible(false, true);
        self.materialize_all();
        self.slots.push(ChildSlot::Drawable(child));
        self.config.invalidate_caches();
        self.slots.len() - 1
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.slots.len()
    }

    /// The index of the currently selected child.
    pub fn current_index(&self) -> Option<usize> {
        self.cur_index
    }

    /// The currently selected child.
    pub fn current_mut(&mut self) -> Option<&mut dyn Drawable> {
        let index = self.cur_index?;
        self.child_mut(index)
    }

    /// The child at `index`, materializing it if it is still a future.
    /// Materialization is idempotent: the same owned instance is returned
    /// on every later call.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut dyn Drawable> {
        self.materialize(index);
        match self.slots.get_mut(index) {
            Some(ChildSlot::Drawable(child)) => Some(child.as_mut()),
            _ => None,
        }
    }

    fn materialize(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if let ChildSlot::Future(state) = slot {
            let mut child = Arc::clone(state).new_drawable();
            if self.config.mutated {
                child.mutate();
            }
            *slot = ChildSlot::Drawable(child);
        }
    }

    fn materialize_all(&mut self) {
        for index in 0..self.slots.len() {
            self.materialize(index);
        }
    }

    /// Iterates the materialized children.
    fn children(&self) -> impl Iterator<Item = &dyn Drawable> {
        self.slots.iter().filter_map(|slot| match slot {
            ChildSlot::Drawable(child) => Some(child.as_ref()),
            ChildSlot::Future(_) => None,
        })
    }

    /// Enter fade duration applied when a child is selected.
    pub fn set_enter_fade_duration(&mut self, millis: u64) {
        self.config.enter_fade_duration = millis;
    }

    /// Exit fade duration applied to the outgoing child.
    pub fn set_exit_fade_duration(&mut self, millis: u64) {
        self.config.exit_fade_duration = millis;
    }

    /// Whether size queries report the maximum over all children instead
    /// of deferring to the current child.
    pub fn set_constant_size(&mut self, constant: bool) {
        self.config.constant_size = constant;
    }

    /// Whether [`constant_size`](Self::set_constant_size) is set.
    pub fn is_constant_size(&self) -> bool {
        self.config.constant_size
    }

    /// Whether padding follows the shown child (`true`) instead of the
    /// per-edge maximum over all children (`false`, the default).
    pub fn set_variable_padding(&mut self, variable: bool) {
        self.config.variable_padding = variable;
    }

    /// Whether an enter or exit fade is in flight.
    pub fn is_fading(&self) -> bool {
        self.enter_end != 0 || self.exit_end != 0
    }

    /// Selects the child at `index`, or clears the selection for `None` or
    /// an out-of-range index. Returns false when the selection did not
    /// change.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        let index = index.filter(|i| *i < self.slots.len());
        if index == self.cur_index {
            return false;
        }

        let now = self.base.now();

        if self.config.exit_fade_duration > 0 {
            if let Some(last) = self.last_index {
                if let Some(child) = self.child_mut(last) {
                    child.set_visible(false, false);
                }
            }
            if let Some(cur) = self.cur_index {
                self.last_index = Some(cur);
                self.exit_end = now + self.config.exit_fade_duration;
            } else {
                self.last_index = None;
                self.exit_end = 0;
            }
        } else if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.set_visible(false, false);
            }
        }

        if let Some(idx) = index {
            self.cur_index = Some(idx);
            self.configure_selected(idx, now);
        } else {
            self.cur_index = None;
        }

        if self.enter_end != 0 || self.exit_end != 0 {
            self.base.unschedule();
            // Compute the first frame and schedule the next one.
            self.animate(true);
        }

        self.base.invalidate();
        true
    }

    fn configure_selected(&mut self, index: usize, now: u64) {
        self.materialize(index);

        let enter_fade = self.config.enter_fade_duration;
        let alpha = self.alpha;
        let has_alpha = self.has_alpha;
        let filter = self.config.color_filter;
        let has_filter = self.config.has_color_filter;
        let tint_list = self.config.tint_list.clone();
        let has_tint_list = self.config.has_tint_list;
        let tint_mode = self.config.tint_mode;
        let has_tint_mode = self.config.has_tint_mode;
        let bounds = self.base.bounds();
        let level = self.base.level();
        let state = self.base.state();
        let visible = self.base.is_visible();
        let hotspot_bounds = self.hotspot_bounds;

        if enter_fade > 0 {
            self.enter_end = now + enter_fade;
        }

        let Some(ChildSlot::Drawable(child)) = self.slots.get_mut(index) else {
            return;
        };

        child.mutate();

        if enter_fade == 0 && has_alpha {
            child.set_alpha(alpha);
        }

        if has_filter {
            // A color filter always overrides tint.
            child.set_color_filter(filter);
        } else {
            if has_tint_list {
                child.set_tint_list(tint_list);
            }
            if has_tint_mode {
                child.set_tint_mode(tint_mode);
            }
        }

        child.set_bounds(bounds);
        child.set_level(level);
        child.set_state(state);
        child.set_visible(visible, true);

        if let Some(hb) = hotspot_bounds {
            child.set_hotspot_bounds(hb);
        }
    }

    /// Advances the enter/exit fades against the clock. With `schedule`,
    /// requests the next ~60fps tick from the host while still animating.
    pub fn animate(&mut self, schedule: bool) {
        self.has_alpha = true;

        let mut animating = false;
        let now = self.base.now();
        let alpha = self.alpha;
        let enter_fade = self.config.enter_fade_duration;
        let exit_fade = self.config.exit_fade_duration;

        if let Some(cur) = self.cur_index {
            if self.enter_end != 0 {
                if self.enter_end <= now {
                    self.enter_end = 0;
                    if let Some(child) = self.child_mut(cur) {
                        child.mutate();
                        child.set_alpha(alpha);
                    }
                } else {
                    let remaining = ((self.enter_end - now) * 255 / enter_fade) as u32;
                    animating = true;
                    let ramped = ((255 - remaining) * alpha as u32 / 255) as u8;
                    if let Some(child) = self.child_mut(cur) {
                        child.mutate();
                        child.set_alpha(ramped);
                    }
                }
            }
        } else {
            self.enter_end = 0;
        }

        if let Some(last) = self.last_index {
            if self.exit_end != 0 {
                if self.exit_end <= now {
                    self.exit_end = 0;
                    self.last_index = None;
                    if let Some(child) = self.child_mut(last) {
                        child.set_visible(false, false);
                    }
                } else {
                    let remaining = ((self.exit_end - now) * 255 / exit_fade) as u32;
                    animating = true;
                    let ramped = (remaining * alpha as u32 / 255) as u8;
                    if let Some(child) = self.child_mut(last) {
                        child.mutate();
                        child.set_alpha(ramped);
                    }
                }
            }
        } else {
            self.exit_end = 0;
        }

        if schedule && animating {
            self.base.schedule(now + 1000 / 60);
        }
    }

    /// Host entry point for a scheduled fade tick.
    pub fn tick(&mut self) {
        self.animate(true);
        self.base.invalidate();
    }

    fn constant_padding(&self) -> Option<Insets> {
        if self.config.variable_padding {
            return None;
        }
        if self.config.padding_checked.get() {
            return self.config.constant_padding.get();
        }

        let mut padding: Option<Insets> = None;
        for child in self.children() {
            if let Some(p) = child.padding() {
                let merged = padding.unwrap_or(Insets::ZERO).max(p);
                padding = Some(merged);
            }
        }

        self.config.padding_checked.set(true);
        self.config.constant_padding.set(padding);
        padding
    }

    fn compute_constant_size(&self) {
        if self.config.computed_constant_size.get() {
            return;
        }
        let mut width = -1;
        let mut height = -1;
        let mut min_width = 0;
        let mut min_height = 0;
        for child in self.children() {
            width = width.max(child.intrinsic_width());
            height = height.max(child.intrinsic_height());
            min_width = min_width.max(child.minimum_width());
            min_height = min_height.max(child.minimum_height());
        }
        self.config.constant_width.set(width);
        self.config.constant_height.set(height);
        self.config.constant_min_width.set(min_width);
        self.config.constant_min_height.set(min_height);
        self.config.computed_constant_size.set(true);
    }

    fn aggregate_opacity(&self) -> Opacity {
        if self.config.checked_opacity.get() {
            return self.config.opacity.get();
        }
        let mut children = self.children();
        let mut opacity = children
            .next()
            .map(Drawable::opacity)
            .unwrap_or(Opacity::Transparent);
        for child in children {
            opacity = resolve_opacity(opacity, child.opacity());
        }
        self.config.checked_opacity.set(true);
        self.config.opacity.set(opacity);
        opacity
    }

    fn aggregate_stateful(&self) -> bool {
        if self.config.checked_stateful.get() {
            return self.config.stateful.get();
        }
        let stateful = self.children().any(Drawable::is_stateful);
        self.config.checked_stateful.set(true);
        self.config.stateful.set(stateful);
        stateful
    }

    fn can_constant_state(&self) -> bool {
        if self.config.checked_constant_state.get() {
            return self.config.can_constant_state.get();
        }
        let can = self.slots.iter().all(|slot| match slot {
            ChildSlot::Drawable(child) => child.constant_state().is_some(),
            ChildSlot::Future(_) => true,
        });
        self.config.checked_constant_state.set(true);
        self.config.can_constant_state.set(can);
        can
    }

    /// Builds the cloneable snapshot of this container, or `None` when a
    /// child cannot be cloned.
    pub(crate) fn snapshot(&self) -> Option<ContainerState> {
        if !self.can_constant_state() {
            return None;
        }

        // Fill the aggregate caches eagerly; the clone inherits them so it
        // never needs to materialize children just to answer size or
        // padding queries.
        self.compute_constant_size();
        self.constant_padding();
        self.aggregate_opacity();
        self.aggregate_stateful();

        let mut children = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            match slot {
                ChildSlot::Drawable(child) => children.push(child.constant_state()?),
                ChildSlot::Future(state) => children.push(Arc::clone(state)),
            }
        }

        Some(ContainerState {
            config: self.config.clone(),
            children,
        })
    }
}

impl Drawable for DrawableContainer {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        if self.is_fading() {
            self.animate(true);
        }
        // Outgoing first, incoming composites on top.
        if let Some(last) = self.last_index {
            if let Some(child) = self.child_mut(last) {
                child.draw(canvas);
            }
        }
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.draw(canvas);
            }
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
        if let Some(last) = self.last_index {
            if let Some(child) = self.child_mut(last) {
                child.set_bounds(bounds);
            }
        }
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.set_bounds(bounds);
            }
        }
    }

    fn on_state_change(&mut self) -> bool {
        let state = self.base.state();
        if let Some(last) = self.last_index {
            if let Some(child) = self.child_mut(last) {
                return child.set_state(state);
            }
        }
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                return child.set_state(state);
            }
        }
        false
    }

    fn on_level_change(&mut self) -> bool {
        let level = self.base.level();
        if let Some(last) = self.last_index {
            if let Some(child) = self.child_mut(last) {
                return child.set_level(level);
            }
        }
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                return child.set_level(level);
            }
        }
        false
    }

    fn set_alpha(&mut self, alpha: u8) {
        if !self.has_alpha || self.alpha != alpha {
            self.alpha = alpha;
            self.has_alpha = true;
            if let Some(cur) = self.cur_index {
                if self.enter_end == 0 {
                    if let Some(child) = self.child_mut(cur) {
                        child.mutate();
                        child.set_alpha(alpha);
                    }
                } else {
                    self.animate(false);
                }
            }
        }
    }

    fn alpha(&self) -> u8 {
        self.alpha
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        self.config.has_color_filter = filter.is_some();
        if self.config.color_filter != filter {
            self.config.color_filter = filter;
            if let Some(cur) = self.cur_index {
                if let Some(child) = self.child_mut(cur) {
                    child.mutate();
                    child.set_color_filter(filter);
                }
            }
        }
    }

    fn color_filter(&self) -> Option<ColorFilter> {
        self.config.color_filter
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        self.config.has_tint_list = true;
        if self.config.tint_list != tint {
            self.config.tint_list = tint.clone();
            if let Some(cur) = self.cur_index {
                if let Some(child) = self.child_mut(cur) {
                    child.mutate();
                    child.set_tint_list(tint);
                }
            }
        }
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        self.config.has_tint_mode = true;
        if self.config.tint_mode != mode {
            self.config.tint_mode = mode;
            if let Some(cur) = self.cur_index {
                if let Some(child) = self.child_mut(cur) {
                    child.mutate();
                    child.set_tint_mode(mode);
                }
            }
        }
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        let changed = self.base.is_visible() != visible;
        if changed {
            self.base_mut().set_visible_raw(visible);
            self.base.invalidate();
        }
        if let Some(last) = self.last_index {
            if let Some(child) = self.child_mut(last) {
                child.set_visible(visible, restart);
            }
        }
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.set_visible(visible, restart);
            }
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        let current_visible = self
            .cur_index
            .and_then(|i| match self.slots.get(i) {
                Some(ChildSlot::Drawable(child)) => Some(child.is_visible()),
                _ => None,
            })
            .unwrap_or(false);
        if !current_visible {
            return Opacity::Transparent;
        }
        self.aggregate_opacity()
    }

    fn intrinsic_width(&self) -> i32 {
        if self.config.constant_size {
            self.compute_constant_size();
            return self.config.constant_width.get();
        }
        match self.cur_index.and_then(|i| match self.slots.get(i) {
            Some(ChildSlot::Drawable(child)) => Some(child.intrinsic_width()),
            _ => None,
        }) {
            Some(width) => width,
            None => -1,
        }
    }

    fn intrinsic_height(&self) -> i32 {
        if self.config.constant_size {
            self.compute_constant_size();
            return self.config.constant_height.get();
        }
        match self.cur_index.and_then(|i| match self.slots.get(i) {
            Some(ChildSlot::Drawable(child)) => Some(child.intrinsic_height()),
            _ => None,
        }) {
            Some(height) => height,
            None => -1,
        }
    }

    fn minimum_width(&self) -> i32 {
        if self.config.constant_size {
            self.compute_constant_size();
            return self.config.constant_min_width.get();
        }
        self.cur_index
            .and_then(|i| match self.slots.get(i) {
                Some(ChildSlot::Drawable(child)) => Some(child.minimum_width()),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn minimum_height(&self) -> i32 {
        if self.config.constant_size {
            self.compute_constant_size();
            return self.config.constant_min_height.get();
        }
        self.cur_index
            .and_then(|i| match self.slots.get(i) {
                Some(ChildSlot::Drawable(child)) => Some(child.minimum_height()),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn padding(&self) -> Option<Insets> {
        if let Some(padding) = self.constant_padding() {
            return Some(padding);
        }
        self.cur_index.and_then(|i| match self.slots.get(i) {
            Some(ChildSlot::Drawable(child)) => child.padding(),
            _ => None,
        })
    }

    fn is_stateful(&self) -> bool {
        self.aggregate_stateful()
    }

    fn jump_to_current_state(&mut self) {
        let mut changed = false;

        if let Some(last) = self.last_index.take() {
            if let Some(child) = self.child_mut(last) {
                child.jump_to_current_state();
            }
            changed = true;
        }

        let alpha = self.alpha;
        let has_alpha = self.has_alpha;
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.jump_to_current_state();
                if has_alpha {
                    child.mutate();
                    child.set_alpha(alpha);
                }
            }
        }

        if self.exit_end != 0 {
            self.exit_end = 0;
            changed = true;
        }
        if self.enter_end != 0 {
            self.enter_end = 0;
            changed = true;
        }

        if changed {
            self.base.unschedule();
            self.base.invalidate();
        }
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        let snapshot = self.snapshot()?;
        Some(Arc::new(snapshot))
    }

    fn mutate(&mut self) {
        if !self.mutated {
            self.config.mutated = true;
            for slot in &mut self.slots {
                if let ChildSlot::Drawable(child) = slot {
                    child.mutate();
                }
            }
            self.mutated = true;
        }
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        self.materialize_all();
        for slot in &mut self.slots {
            if let ChildSlot::Drawable(child) = slot {
                if child.can_apply_theme() {
                    child.apply_theme(theme);
                }
            }
        }
    }

    fn can_apply_theme(&self) -> bool {
        self.slots.iter().any(|slot| match slot {
            ChildSlot::Drawable(child) => child.can_apply_theme(),
            ChildSlot::Future(state) => state.can_apply_theme(),
        })
    }

    fn set_hotspot(&mut self, x: f64, y: f64) {
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.set_hotspot(x, y);
            }
        }
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        self.hotspot_bounds = Some(bounds);
        if let Some(cur) = self.cur_index {
            if let Some(child) = self.child_mut(cur) {
                child.set_hotspot_bounds(bounds);
            }
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
    use drawkit_core::canvas::RecordingCanvas;
    use drawkit_core::clock::ManualClock;
    use vello::peniko::Color;

    fn colored(rgb: (u8, u8, u8)) -> Box<dyn Drawable> {
        Box::new(ShapeDrawable::with_color(Color::from_rgb8(rgb.0, rgb.1, rgb.2)))
    }

    fn sized(width: i32, height: i32) -> Box<dyn Drawable> {
        let mut shape = ShapeDrawable::with_color(Color::BLACK);
        shape.set_size(width, height);
        Box::new(shape)
    }

    #[test]
    fn test_select_and_draw_current() {
        let mut container = DrawableContainer::new();
        container.add_child(colored((255, 0, 0)));
        container.add_child(colored((0, 255, 0)));
        container.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));

        assert!(container.select(Some(1)));
        assert!(!container.select(Some(1)));

        let mut canvas = RecordingCanvas::new();
        container.draw(&mut canvas);
        assert_eq!(
            canvas.fills()[0].solid_color(),
            Some(Color::from_rgb8(0, 255, 0))
        );
    }

    #[test]
    fn test_out_of_range_clears() {
        let mut container = DrawableContainer::new();
        container.add_child(colored((255, 0, 0)));
        assert!(container.select(Some(0)));
        assert!(container.select(Some(7)));
        assert_eq!(container.current_index(), None);

        let mut canvas = RecordingCanvas::new();
        container.draw(&mut canvas);
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn test_selection_propagates_properties() {
        let mut container = DrawableContainer::new();
        container.add_child(colored((1, 2, 3)));
        container.set_bounds(Rect::new(0.0, 0.0, 20.0, 30.0));
        container.set_level(4000);
        container.set_state(drawkit_core::state::StateSet::PRESSED);
        container.set_alpha(128);

        container.select(Some(0));
        let child = container.current_mut().unwrap();
        assert_eq!(child.bounds(), Rect::new(0.0, 0.0, 20.0, 30.0));
        assert_eq!(child.level(), 4000);
        assert_eq!(child.state(), drawkit_core::state::StateSet::PRESSED);
        assert_eq!(child.alpha(), 128);
        assert!(child.is_visible());
    }

    #[test]
    fn test_constant_size_is_max_over_children() {
        let mut container = DrawableContainer::new();
        container.add_child(sized(10, 40));
        container.add_child(sized(30, 20));
        container.set_constant_size(true);

        assert_eq!(container.intrinsic_width(), 30);
        assert_eq!(container.intrinsic_height(), 40);

        // Without constant size the container defers to the selection.
        container.set_constant_size(false);
        assert_eq!(container.intrinsic_width(), -1);
        container.select(Some(0));
        assert_eq!(container.intrinsic_width(), 10);
    }

    #[test]
    fn test_cross_fade_alpha_ramp() {
        let clock = ManualClock::shared(1000);
        let mut container = DrawableContainer::new();
        container.base_mut().set_clock(clock.clone());
        container.add_child(colored((255, 0, 0)));
        container.add_child(colored((0, 0, 255)));
        container.set_enter_fade_duration(100);
        container.set_exit_fade_duration(100);
        container.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));

        container.select(Some(0));
        clock.advance(200);
        container.animate(false);
        assert!(!container.is_fading());

        container.select(Some(1));
        assert!(container.is_fading());

        // Halfway: incoming at ~half alpha, outgoing at ~half alpha, and
        // the incoming child draws on top of the outgoing one.
        clock.advance(50);
        container.animate(false);
        let mut canvas = RecordingCanvas::new();
        container.draw(&mut canvas);
        let fills = canvas.fills();
        assert_eq!(fills.len(), 2);
        let outgoing = fills[0].solid_color().unwrap();
        let incoming = fills[1].solid_color().unwrap();
        assert!((outgoing.components[3] - 0.5).abs() < 0.05);
        assert!((incoming.components[3] - 0.5).abs() < 0.05);

        // Past the end both fades resolve; the outgoing child is dropped.
        clock.advance(100);
        container.animate(false);
        assert!(!container.is_fading());
        let mut canvas = RecordingCanvas::new();
        container.draw(&mut canvas);
        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].solid_color(), Some(Color::from_rgb8(0, 0, 255)));
    }

    #[test]
    fn test_cross_fade_energy_conservation() {
        let clock = ManualClock::shared(0);
        let mut container = DrawableContainer::new();
        container.base_mut().set_clock(clock.clone());
        container.add_child(colored((255, 0, 0)));
        container.add_child(colored((0, 0, 255)));
        container.set_enter_fade_duration(100);
        container.set_exit_fade_duration(100);
        container.select(Some(0));
        clock.advance(1000);
        container.animate(false);
        container.select(Some(1));

        // enter(t) + (255 - exit(t)) climbs monotonically to the container
        // alpha as the fade progresses.
        let mut previous = -1i32;
        for _ in 0..10 {
            clock.advance(10);
            container.animate(false);
            let incoming = container.child_mut(1).unwrap().alpha() as i32;
            let outgoing_gone = 255 - container.child_mut(0).unwrap().alpha() as i32;
            let energy = incoming + outgoing_gone - 255;
            assert!(energy >= previous);
            previous = energy;
        }
        assert_eq!(container.child_mut(1).unwrap().alpha(), 255);
    }

    #[test]
    fn test_jump_to_current_state_ends_fade() {
        let clock = ManualClock::shared(0);
        let mut container = DrawableContainer::new();
        container.base_mut().set_clock(clock.clone());
        container.add_child(colored((255, 0, 0)));
        container.add_child(colored((0, 0, 255)));
        container.set_exit_fade_duration(500);
        container.select(Some(0));
        container.select(Some(1));
        assert!(container.is_fading());

        container.jump_to_current_state();
        assert!(!container.is_fading());

        let mut canvas = RecordingCanvas::new();
        container.draw(&mut canvas);
        assert_eq!(canvas.fills().len(), 1);
    }

    #[test]
    fn test_lazy_future_materialization() {
        let mut container = DrawableContainer::new();
        container.add_child(colored((9, 9, 9)));
        container.add_child(colored((7, 7, 7)));
        container.set_constant_size(true);
        let _ = container.intrinsic_width();

        let state = container.constant_state().expect("cloneable");
        let mut clone = state.new_drawable();

        // Aggregates answer from the copied caches without materializing.
        assert_eq!(clone.intrinsic_width(), -1);

        let clone = clone
            .as_any_mut()
            .downcast_mut::<DrawableContainer>()
            .unwrap();
        assert_eq!(clone.current_index(), None);

        // Materialization is idempotent: same instance on both calls.
        clone.select(Some(0));
        let first = clone.child_mut(0).unwrap() as *mut dyn Drawable as *mut u8 as usize;
        let second = clone.child_mut(0).unwrap() as *mut dyn Drawable as *mut u8 as usize;
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_cloneable_child_blocks_cloning() {
        let mut container = DrawableContainer::new();
        container.add_child(colored((1, 1, 1)));
        assert!(container.constant_state().is_some());

        // HorizontalProgressDrawable exposes no constant state; adding it
        // makes the whole container non-cloneable.
        container.add_child(Box::new(crate::progress::HorizontalProgressDrawable::new()));
        assert!(container.constant_state().is_none());
    }

    #[test]
    fn test_clone_isolation() {
        let mut container = DrawableContainer::new();
        container.add_child(colored((10, 10, 10)));
        let state = container.constant_state().unwrap();

        let mut clone = state.new_drawable();
        clone.mutate();
        let clone_container = clone
            .as_any_mut()
            .downcast_mut::<DrawableContainer>()
            .unwrap();
        clone_container.select(Some(0));
        clone_container.set_bounds(Rect::new(0.0, 0.0, 5.0, 5.0));
        if let Some(child) = clone_container.current_mut() {
            child.set_alpha(3);
        }

        // The original's child is untouched.
        container.select(Some(0));
        assert_eq!(container.current_mut().unwrap().alpha(), 255);
    }
}
