//! A drawable managing a stack of other drawables.
//!
//! Layers draw in index order, so the layer with the largest index ends up
//! on top. Each layer carries optional per-edge insets and an optional id;
//! padding reported by layers composes either nested (accumulating, each
//! layer sits inside the padding of the layers before it) or stacked
//! (per-edge maximum).

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

/// A layer id used to look layers up after construction.
pub type LayerId = i64;

/// How successive layers' padding affects the bounds of later layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingMode {
    /// Each layer nests inside the accumulated padding of the layers
    /// before it. The default.
    #[default]
    Nest,
    /// Every layer stacks directly atop the container bounds; padding is
    /// the per-edge maximum.
    Stack,
}

struct ChildLayer {
    drawable: Box<dyn Drawable>,
    id: Option<LayerId>,
    insets: Insets,
    /// Last padding reported by the child, for change detection.
    padding: Insets,
}

/// Constant state of a [`LayerDrawable`].
pub struct LayerState {
    children: Vec<(Arc<dyn DrawableState>, Option<LayerId>, Insets)>,
    padding_mode: PaddingMode,
    opacity_override: Option<Opacity>,
}

impl LayerState {
    /// Builds a fresh layer stack from the stored child states.
    pub(crate) fn build(&self) -> LayerDrawable {
        let mut layer = LayerDrawable::new();
        layer.padding_mode = self.padding_mode;
        layer.opacity_override = self.opacity_override;
        for (state, id, insets) in &self.children {
            let child = Arc::clone(state).new_drawable();
            layer.push_layer_internal(child, *id, *insets);
        }
        layer
    }
}

impl DrawableState for LayerState {
    fn new_drawable(self: Arc<Self>) -> Box<dyn Drawable> {
        Box::new(self.build())
    }
}

/// A stack of child drawables drawn in index order.
pub struct LayerDrawable {
    base: DrawableBase,
    layers: Vec<ChildLayer>,
    padding_mode: PaddingMode,
    opacity_override: Option<Opacity>,
    cached_opacity: Cell<Option<Opacity>>,
    cached_stateful: Cell<Option<bool>>,
    mutated: bool,
}

impl Default for LayerDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerDrawable {
    /// Creates an empty layer stack.
    pub fn new() -> Self {
        Self {
            base: DrawableBase::new(),
            layers: Vec::new(),
            padding_mode: PaddingMode::default(),
            opacity_override: None,
            cached_opacity: Cell::new(None),
            cached_stateful: Cell::new(None),
            mutated: false,
        }
    }

    /// Creates a layer stack from the given children, bottom first.
    pub fn from_layers(layers: Vec<Box<dyn Drawable>>) -> Self {
        let mut this = Self::new();
        for layer in layers {
            this.add_layer(layer);
        }
        this
    }

    /// Appends a layer on top with no id and zero insets.
    pub fn add_layer(&mut self, drawable: Box<dyn Drawable>) -> usize {
        self.push_layer_internal(drawable, None, Insets::ZERO)
    }

    /// Appends a layer on top with an id and per-edge insets.
    pub fn add_layer_with(
        &mut self,
        drawable: Box<dyn Drawable>,
        id: Option<LayerId>,
        insets: Insets,
    ) -> usize {
        self.push_layer_internal(drawable, id, insets)
    }

    fn push_layer_internal(
        &mut self,
        drawable: Box<dyn Drawable>,
        id: Option<LayerId>,
        insets: Insets,
    ) -> usize {
        self.layers.push(ChildLayer {
            drawable,
            id,
            insets,
            padding: Insets::ZERO,
        });
        self.invalidate_caches();
        self.layers.len() - 1
    }

    fn invalidate_caches(&self) {
        self.cached_opacity.set(None);
        self.cached_stateful.set(None);
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The drawable at the given layer index.
    pub fn drawable_mut(&mut self, index: usize) -> Option<&mut (dyn Drawable + '_)> {
        match self.layers.get_mut(index) {
            Some(l) => Some(l.drawable.as_mut()),
            None => None,
        }
    }

    /// The id of the layer at `index`.
    pub fn id_at(&self, index: usize) -> Option<LayerId> {
        self.layers.get(index).and_then(|l| l.id)
    }

    /// Assigns an id to the layer at `index`.
    pub fn set_id(&mut self, index: usize, id: LayerId) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.id = Some(id);
        }
    }

    /// The drawable of the highest-indexed layer carrying `id`; a later
    /// layer shadows earlier ones with the same id.
    pub fn find_by_layer_id(&mut self, id: LayerId) -> Option<&mut (dyn Drawable + '_)> {
        match self
            .layers
            .iter_mut()
            .rev()
            .find(|l| l.id == Some(id))
        {
            Some(l) => Some(l.drawable.as_mut()),
            None => None,
        }
    }

    /// Replaces the drawable of the highest-indexed layer carrying `id`.
    /// Returns whether a layer was found.
    pub fn set_drawable_by_layer_id(&mut self, id: LayerId, mut drawable: Box<dyn Drawable>) -> bool {
        let Some(layer) = self.layers.iter_mut().rev().find(|l| l.id == Some(id)) else {
            return false;
        };
        drawable.set_bounds(layer.drawable.bounds());
        layer.drawable = drawable;
        self.invalidate_caches();
        true
    }

    /// Sets the insets of the layer at `index`, in pixels.
    pub fn set_layer_inset(&mut self, index: usize, insets: Insets) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.insets = insets;
        }
    }

    /// Sets how layer padding composes.
    pub fn set_padding_mode(&mut self, mode: PaddingMode) {
        self.padding_mode = mode;
    }

    /// The current padding mode.
    pub fn padding_mode(&self) -> PaddingMode {
        self.padding_mode
    }

    /// Overrides the aggregated opacity, or restores aggregation with
    /// `None`.
    pub fn set_opacity_override(&mut self, opacity: Option<Opacity>) {
        self.opacity_override = opacity;
    }

    fn compute_nested_padding(&self) -> Insets {
        let mut padding = Insets::ZERO;
        for layer in &self.layers {
            let p = layer.drawable.padding().unwrap_or(Insets::ZERO);
            padding = padding.add(p);
        }
        padding
    }

    fn compute_stacked_padding(&self) -> Insets {
        let mut padding = Insets::ZERO;
        for layer in &self.layers {
            let p = layer.drawable.padding().unwrap_or(Insets::ZERO);
            padding = padding.max(p);
        }
        padding
    }

    /// Updates the cached padding of every layer. Returns whether any
    /// layer's padding changed.
    fn refresh_child_padding(&mut self) -> bool {
        let mut changed = false;
        for layer in &mut self.layers {
            let p = layer.drawable.padding().unwrap_or(Insets::ZERO);
            if p != layer.padding {
                layer.padding = p;
                changed = true;
            }
        }
        changed
    }

    /// Builds the cloneable snapshot of this stack, or `None` when a child
    /// cannot be cloned.
    pub(crate) fn snapshot(&self) -> Option<LayerState> {
        let mut children = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            children.push((layer.drawable.constant_state()?, layer.id, layer.insets));
        }
        Some(LayerState {
            children,
            padding_mode: self.padding_mode,
            opacity_override: self.opacity_override,
        })
    }

    fn layout_layers(&mut self) {
        let bounds = self.base.bounds();
        let nest = self.padding_mode == PaddingMode::Nest;

        let mut pad = Insets::ZERO;
        for layer in &mut self.layers {
            let insets = layer.insets;
            layer.drawable.set_bounds(Rect::new(
                bounds.x0 + f64::from(insets.left + pad.left),
                bounds.y0 + f64::from(insets.top + pad.top),
                bounds.x1 - f64::from(insets.right + pad.right),
                bounds.y1 - f64::from(insets.bottom + pad.bottom),
            ));
            if nest {
                pad = pad.add(layer.padding);
            }
        }
    }
}

impl Drawable for LayerDrawable {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        for layer in &mut self.layers {
            layer.drawable.draw(canvas);
        }
    }

    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn on_bounds_change(&mut self) {
        self.refresh_child_padding();
        self.layout_layers();
    }

    fn on_state_change(&mut self) -> bool {
        let state = self.base.state();
        let mut changed = false;
        for layer in &mut self.layers {
            if layer.drawable.is_stateful() && layer.drawable.set_state(state) {
                changed = true;
            }
        }
        if self.refresh_child_padding() {
            self.layout_layers();
        }
        changed
    }

    fn on_level_change(&mut self) -> bool {
        let level = self.base.level();
        let mut changed = false;
        for layer in &mut self.layers {
            if layer.drawable.set_level(level) {
                changed = true;
            }
        }
        if self.refresh_child_padding() {
            self.layout_layers();
        }
        changed
    }

    fn set_alpha(&mut self, alpha: u8) {
        for layer in &mut self.layers {
            layer.drawable.set_alpha(alpha);
        }
    }

    fn alpha(&self) -> u8 {
        // All layers carry the same alpha; report the first one's.
        self.layers
            .first()
            .map(|l| l.drawable.alpha())
            .unwrap_or(0xFF)
    }

    fn set_color_filter(&mut self, filter: Option<ColorFilter>) {
        for layer in &mut self.layers {
            layer.drawable.set_color_filter(filter);
        }
    }

    fn set_tint_list(&mut self, tint: Option<ColorList>) {
        for layer in &mut self.layers {
            layer.drawable.set_tint_list(tint.clone());
        }
    }

    fn set_tint_mode(&mut self, mode: BlendMode) {
        for layer in &mut self.layers {
            layer.drawable.set_tint_mode(mode);
        }
    }

    fn set_visible(&mut self, visible: bool, restart: bool) -> bool {
        let changed = self.base.is_visible() != visible;
        if changed {
            self.base.set_visible_raw(visible);
            self.base.invalidate();
        }
        for layer in &mut self.layers {
            layer.drawable.set_visible(visible, restart);
        }
        changed
    }

    fn opacity(&self) -> Opacity {
        if let Some(opacity) = self.opacity_override {
            return opacity;
        }
        if let Some(opacity) = self.cached_opacity.get() {
            return opacity;
        }
        let mut layers = self.layers.iter();
        let mut opacity = layers
            .next()
            .map(|l| l.drawable.opacity())
            .unwrap_or(Opacity::Transparent);
        for layer in layers {
            opacity = resolve_opacity(opacity, layer.drawable.opacity());
        }
        self.cached_opacity.set(Some(opacity));
        opacity
    }

    fn intrinsic_width(&self) -> i32 {
        let nest = self.padding_mode == PaddingMode::Nest;
        let mut width = -1;
        let mut pad_l = 0;
        let mut pad_r = 0;
        for layer in &self.layers {
            let w = layer.drawable.intrinsic_width()
                + layer.insets.left
                + layer.insets.right
                + pad_l
                + pad_r;
            width = width.max(w);
            if nest {
                pad_l += layer.padding.left;
                pad_r += layer.padding.right;
            }
        }
        width
    }

    fn intrinsic_height(&self) -> i32 {
        let nest = self.padding_mode == PaddingMode::Nest;
        let mut height = -1;
        let mut pad_t = 0;
        let mut pad_b = 0;
        for layer in &self.layers {
            let h = layer.drawable.intrinsic_height()
                + layer.insets.top
                + layer.insets.bottom
                + pad_t
                + pad_b;
            height = height.max(h);
            if nest {
                pad_t += layer.padding.top;
                pad_b += layer.padding.bottom;
            }
        }
        height
    }

    fn padding(&self) -> Option<Insets> {
        let padding = match self.padding_mode {
            PaddingMode::Nest => self.compute_nested_padding(),
            PaddingMode::Stack => self.compute_stacked_padding(),
        };
        (!padding.is_zero()).then_some(padding)
    }

    fn is_stateful(&self) -> bool {
        if let Some(stateful) = self.cached_stateful.get() {
            return stateful;
        }
        let stateful = self.layers.iter().any(|l| l.drawable.is_stateful());
        self.cached_stateful.set(Some(stateful));
        stateful
    }

    fn jump_to_current_state(&mut self) {
        for layer in &mut self.layers {
            layer.drawable.jump_to_current_state();
        }
    }

    fn constant_state(&self) -> Option<Arc<dyn DrawableState>> {
        Some(Arc::new(self.snapshot()?))
    }

    fn mutate(&mut self) {
        if !self.mutated {
            for layer in &mut self.layers {
                layer.drawable.mutate();
            }
            self.mutated = true;
        }
    }

    fn apply_theme(&mut self, theme: &dyn Theme) {
        for layer in &mut self.layers {
            if layer.drawable.can_apply_theme() {
                layer.drawable.apply_theme(theme);
            }
        }
        self.refresh_child_padding();
        self.layout_layers();
    }

    fn can_apply_theme(&self) -> bool {
        self.layers.iter().any(|l| l.drawable.can_apply_theme())
    }

    fn set_hotspot(&mut self, x: f64, y: f64) {
        for layer in &mut self.layers {
            layer.drawable.set_hotspot(x, y);
        }
    }

    fn set_hotspot_bounds(&mut self, bounds: Rect) {
        for layer in &mut self.layers {
            layer.drawable.set_hotspot_bounds(bounds);
        }
    }
}
