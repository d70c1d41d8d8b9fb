//! A drawable that insets another drawable by a fixed distance.
//!
//! Used when an owner needs a background smaller than its own bounds. The
//! child keeps reporting its intrinsic size; padding is the child's own
//! padding grown by the insets.

use std::sync::Arc;

use drawkit_core::canvas::Canvas;
use drawkit_core::color::{BlendMode, ColorFilter, ColorList};
use drawkit_core::drawable::{Drawable, DrawableBase, DrawableState, Opacity};
use drawkit_core::geometry::Insets;
use drawkit_core::theme::Theme;
use vello::kurbo::Rect;

/// Constant state of an [`InsetDrawable`].
pub struct InsetState {
    child: Arc<dyn DrawableState>,
    insets: Insets,
}

impl DrawableState for InsetState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(InsetDrawable::with_insets(
            Arc::clone(&self.child).new_drawable(),
            self.insets,
        ))
    }

    fn can_apply_theme(&self) -> bool {
        self.child.can_apply_theme()
    }
}

/// A single child drawn at fixed margins inside the bounds.
pub struct InsetDrawable {
    base: DrawableBase,
    child: Box<dyn Drawable>,
    insets: Insets,
    mutated: bool,
}

impl InsetDrawable {
    /// Wraps `child` with the same inset on every edge.
    pub fn new(child: Box<dyn Drawable>, inset: i32) -> Self {
        Self::with_insets(child, Insets::uniform(inset))
    }

    /// Wraps `child` with per-edge insets.
    pub fn with_insets(child: Box<dyn Drawable>, insets: Insets) -> Self {
        Self {
            base: DrawableBase::new(),
            child,
            insets,
            mutated: false,
        }
    }

    /// The wrapped drawable.
    pub fn child(&self) -> &dyn Drawable {
        self.child.as_ref()
    }

    /// The wrapped drawable, mutably.
    pub fn child_mut(&mut self) -> &mut dyn Drawable {
        self.child.as_mut()
    }

    /// The configured insets.
    pub fn insets(&self) -> Insets {
        self.insets
    }

    fn layout_child(&mut self) {
        let b = self.base.bounds();
        let left = b.x0 + f64::from(self.insets.left);
        let top = b.y0 + f64::from(self.insets.top);
        // Insets never invert the child rect to a negative size.
        let right = (b.x1 - f64::from(self.insets.right)).max(left);
        let bottom = (b.y1 - f64::from(self.insets.bottom)).max(top);
        self.child.set_bounds(Rect::new(left, top, right, bottom));
    }
}

impl Drawable for InsetDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        self.child.draw(canvas);
    }

    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn on_bounds_change(&mut self) {
        self.layout_child();
    }

    fn on_state_change(&mut self) -> bool {
        let state = self.base.state();
        let changed = self.child.set_state(state);
        self.layout_child();
        changed
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

    fn color_filter(&self) -> Option<ColorFilter> {
        self.child.color_filter()
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

    fn padding(&self) -> Option<Insets> {
        let padding = self
            .child
            .padding()
            .unwrap_or(Insets::ZERO)
            .add(self.insets);
        (!padding.is_zero()).then_some(padding)
    }

    fn is_stateful(&self) -> bool {
        self.child.is_stateful()
    }

    fn jump_to_current_state(&mut self) {
        self.child.jump_to_current_state();
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        Some(Arc::new(InsetState {
            child: self.child.constant_state()?,
            insets: self.insets,
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDrawable;
    use vello::peniko::Color;

    fn shape() -> Box<dyn Drawable> {
        Box::new(ShapeDrawable::with_color(Color::BLACK))
    }

    #[test]
    fn test_child_bounds_shrink_by_insets() {
        let mut inset = InsetDrawable::with_insets(shape(), Insets::of(2, 4, 6, 8));
        inset.set_bounds(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(inset.child().bounds(), Rect::new(2.0, 4.0, 94.0, 92.0));
    }

    #[test]
    fn test_oversized_insets_clamp_to_empty() {
        let mut inset = InsetDrawable::new(shape(), 60);
        inset.set_bounds(Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = inset.child().bounds();
        assert!(b.width() >= 0.0 && b.height() >= 0.0);
        assert_eq!(b.width(), 0.0);
    }

    #[test]
    fn test_padding_adds_insets_to_child_padding() {
        let mut padded = ShapeDrawable::with_color(Color::BLACK);
        padded.set_padding(Insets::uniform(3));
        let inset = InsetDrawable::with_insets(Box::new(padded), Insets::of(1, 2, 3, 4));
        assert_eq!(inset.padding(), Some(Insets::of(4, 5, 6, 7)));

        // Zero child padding still reports the insets.
        let inset = InsetDrawable::new(shape(), 5);
        assert_eq!(inset.padding(), Some(Insets::uniform(5)));

        // No padding at all reports none.
        let inset = InsetDrawable::new(shape(), 0);
        assert_eq!(inset.padding(), None);
    }

    #[test]
    fn test_passthrough_properties() {
        let mut inset = InsetDrawable::new(shape(), 1);
        inset.set_alpha(99);
        assert_eq!(inset.child().alpha(), 99);
        assert_eq!(inset.alpha(), 99);

        inset.set_level(1234);
        assert_eq!(inset.child().level(), 1234);

        let mut sized = ShapeDrawable::with_color(Color::BLACK);
        sized.set_size(40, 50);
        let inset = InsetDrawable::new(Box::new(sized), 10);
        // The child's un-inset intrinsic size is reported as-is.
        assert_eq!(inset.intrinsic_width(), 40);
        assert_eq!(inset.intrinsic_height(), 50);
    }

    #[test]
    fn test_clone_keeps_insets() {
        let inset = InsetDrawable::with_insets(shape(), Insets::uniform(7));
        let state = inset.constant_state().unwrap();
        let mut clone = state.new_drawable();
        clone.set_bounds(Rect::new(0.0, 0.0, 20.0, 20.0));
        let clone = clone.as_any_mut().downcast_mut::<InsetDrawable>().unwrap();
        assert_eq!(clone.insets(), Insets::uniform(7));
        assert_eq!(clone.child().bounds(), Rect::new(7.0, 7.0, 13.0, 13.0));
    }
}
