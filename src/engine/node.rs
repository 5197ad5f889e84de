//! LayoutNode - a `Copy` handle plus the per-node operations of the manager.
//!
//! A node carries no data of its own. Everything lives in the manager's
//! [`super::NodeStore`]; the methods here read and write those records and
//! keep the dirty bits consistent.
//!
//! Two ways to change style:
//!
//! - `update_*` apply a closure and propagate dirtiness when the record
//!   actually changed (byte comparison).
//! - `*_mut` hand out the raw record. No dirty marking; call
//!   [`LayoutManager::mark_dirty`] afterwards.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{LayoutError, Result};
use crate::types::{Align, Direction, FlexDirection, StyleValue};

use super::config::LayoutConfig;
use super::handle::{Handle, ManagerId};
use super::manager::LayoutManager;
use super::records::{
    ComputedLayout, LayoutCache, LayoutStyle, NodeFlags, StyleDimensions, StyleEdges,
};

// =============================================================================
// HANDLE TYPE
// =============================================================================

/// Reference to a node owned by a [`LayoutManager`].
///
/// Copies refer to the same node. Once the node is destroyed every copy is
/// stale; accessors panic on stale handles, hierarchy operations return
/// [`LayoutError::StaleHandle`].
#[derive(Clone, Copy)]
pub struct LayoutNode {
    manager: ManagerId,
    handle: Handle,
}

impl LayoutNode {
    pub const UNDEFINED: Self = Self {
        manager: ManagerId::NONE,
        handle: Handle::UNDEFINED,
    };

    pub(crate) const fn new(manager: ManagerId, handle: Handle) -> Self {
        Self { manager, handle }
    }

    pub const fn handle(self) -> Handle {
        self.handle
    }

    pub const fn manager_id(self) -> ManagerId {
        self.manager
    }

    pub const fn is_undefined(self) -> bool {
        self.handle.is_undefined()
    }
}

impl Default for LayoutNode {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

// Every undefined node is the same node, whichever manager produced it.
impl PartialEq for LayoutNode {
    fn eq(&self, other: &Self) -> bool {
        if self.is_undefined() || other.is_undefined() {
            return self.is_undefined() == other.is_undefined();
        }
        self.manager == other.manager && self.handle == other.handle
    }
}

impl Eq for LayoutNode {}

impl Hash for LayoutNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.is_undefined() {
            Handle::UNDEFINED.hash(state);
        } else {
            self.manager.hash(state);
            self.handle.hash(state);
        }
    }
}

impl fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            f.write_str("LayoutNode(undefined)")
        } else {
            write!(
                f,
                "LayoutNode(m{}:{}v{})",
                self.manager.get(),
                self.handle.index(),
                self.handle.generation()
            )
        }
    }
}

// =============================================================================
// RECORD ACCESS
// =============================================================================

macro_rules! style_record_access {
    ($($record:ident, $record_mut:ident, $update:ident: $ty:ty;)*) => {
        impl LayoutManager {
            $(
                pub fn $record(&self, node: LayoutNode) -> &$ty {
                    self.nodes.$record(self.node_handle(node))
                }

                /// Raw access; does not mark the node dirty.
                pub fn $record_mut(&mut self, node: LayoutNode) -> &mut $ty {
                    let handle = self.node_handle(node);
                    self.nodes.$record_mut(handle)
                }

                /// Apply `change` and mark the node dirty if the record changed.
                pub fn $update(&mut self, node: LayoutNode, change: impl FnOnce(&mut $ty)) {
                    let handle = self.node_handle(node);
                    let record = self.nodes.$record_mut(handle);
                    let before = *record;
                    change(record);
                    if *record != before {
                        self.mark_dirty(node);
                    }
                }
            )*
        }
    };
}

style_record_access! {
    style, style_mut, update_style: LayoutStyle;
    dimensions, dimensions_mut, update_dimensions: StyleDimensions;
    margin, margin_mut, update_margin: StyleEdges;
    border, border_mut, update_border: StyleEdges;
}

impl LayoutManager {
    /// Result of the last layout pass.
    pub fn computed(&self, node: LayoutNode) -> &ComputedLayout {
        self.nodes.computed(self.node_handle(node))
    }

    pub fn computed_mut(&mut self, node: LayoutNode) -> &mut ComputedLayout {
        let handle = self.node_handle(node);
        self.nodes.computed_mut(handle)
    }

    pub fn cache(&self, node: LayoutNode) -> &LayoutCache {
        self.nodes.cache(self.node_handle(node))
    }

    pub fn cache_mut(&mut self, node: LayoutNode) -> &mut LayoutCache {
        let handle = self.node_handle(node);
        self.nodes.cache_mut(handle)
    }

    /// Parent node, or undefined for a root.
    pub fn parent(&self, node: LayoutNode) -> LayoutNode {
        self.wrap(self.nodes.data(self.node_handle(node)).parent)
    }

    /// Following sibling in the parent's child list, or undefined.
    pub fn next_sibling(&self, node: LayoutNode) -> LayoutNode {
        self.wrap(self.nodes.data(self.node_handle(node)).next_sibling)
    }

    pub fn is_dirty(&self, node: LayoutNode) -> bool {
        self.flags(node).contains(NodeFlags::DIRTY)
    }

    /// Set or clear the dirty bit without touching ancestors.
    pub fn set_dirty(&mut self, node: LayoutNode, dirty: bool) {
        let handle = self.node_handle(node);
        self.nodes.data_mut(handle).flags.set(NodeFlags::DIRTY, dirty);
    }

    pub fn has_new_layout(&self, node: LayoutNode) -> bool {
        self.flags(node).contains(NodeFlags::HAS_NEW_LAYOUT)
    }

    pub fn set_has_new_layout(&mut self, node: LayoutNode, value: bool) {
        let handle = self.node_handle(node);
        self.nodes.data_mut(handle).flags.set(NodeFlags::HAS_NEW_LAYOUT, value);
    }

    /// Acknowledge the latest layout.
    pub fn mark_layout_seen(&mut self, node: LayoutNode) {
        self.set_has_new_layout(node, false);
    }

    pub fn line_index(&self, node: LayoutNode) -> u32 {
        self.nodes.data(self.node_handle(node)).line_index
    }

    pub fn set_line_index(&mut self, node: LayoutNode, line: u32) {
        let handle = self.node_handle(node);
        self.nodes.data_mut(handle).line_index = line;
    }

    pub fn node_config(&self, node: LayoutNode) -> LayoutConfig {
        let config = self.nodes.data(self.node_handle(node)).config;
        LayoutConfig::new(self.id, config)
    }

    /// Point the node at another config. Unknown configs are ignored.
    pub fn set_node_config(&mut self, node: LayoutNode, config: LayoutConfig) {
        let handle = self.node_handle(node);
        if config.manager_id() != self.id || !self.configs.is_live(config.handle()) {
            log::warn!("set_node_config: {config:?} is not a live config of this manager");
            return;
        }
        self.nodes.data_mut(handle).config = config.handle();
    }

    /// Style width/height in effect for the last layout.
    pub fn resolved_dimensions(&self, node: LayoutNode) -> [StyleValue; 2] {
        self.nodes.data(self.node_handle(node)).resolved_dimensions
    }

    pub fn set_resolved_dimensions(&mut self, node: LayoutNode, dimensions: [StyleValue; 2]) {
        let handle = self.node_handle(node);
        self.nodes.data_mut(handle).resolved_dimensions = dimensions;
    }

    /// Effective direction: the node's own, else the nearest ancestor's,
    /// else left-to-right.
    pub fn resolved_direction(&self, node: LayoutNode) -> Direction {
        let mut current = self.node_handle(node);
        while let Some(data) = self.nodes.try_data(current) {
            let direction = self.nodes.style(current).direction;
            if direction != Direction::Inherit {
                return direction;
            }
            current = data.parent;
        }
        Direction::Ltr
    }

    fn flags(&self, node: LayoutNode) -> NodeFlags {
        self.nodes.data(self.node_handle(node)).flags
    }

    pub(super) fn wrap(&self, handle: Handle) -> LayoutNode {
        if handle.is_undefined() {
            LayoutNode::UNDEFINED
        } else {
            LayoutNode::new(self.id, handle)
        }
    }
}

// =============================================================================
// DIRTINESS / STYLE LIFECYCLE
// =============================================================================

impl LayoutManager {
    /// Mark the node and its ancestors as needing layout.
    ///
    /// Stops at the first ancestor that is already dirty. Each newly dirtied
    /// node also forgets its computed flex basis.
    pub fn mark_dirty(&mut self, node: LayoutNode) {
        let mut current = self.node_handle(node);
        while let Some(data) = self.nodes.try_data_mut(current) {
            if data.flags.contains(NodeFlags::DIRTY) {
                break;
            }
            data.flags.insert(NodeFlags::DIRTY);
            let parent = data.parent;
            self.nodes.computed_mut(current).computed_flex_basis = f32::NAN;
            current = parent;
        }
    }

    /// Reset the style to defaults, then apply the config's web defaults.
    pub fn initialize_style(&mut self, node: LayoutNode) {
        let handle = self.node_handle(node);
        let config = self.nodes.data(handle).config;
        let use_web_defaults = self.config_data(config).use_web_defaults;

        let mut style = LayoutStyle::default();
        if use_web_defaults {
            style.flex_direction = FlexDirection::Row;
            style.align_content = Align::Stretch;
            style.flex_shrink = 1.0;
        }
        *self.nodes.style_mut(handle) = style;
        *self.nodes.dimensions_mut(handle) = StyleDimensions::default();
        *self.nodes.margin_mut(handle) = StyleEdges::default();
        *self.nodes.border_mut(handle) = StyleEdges::default();
    }

    /// Copy the four style records of `source` onto `node`.
    ///
    /// Records that already match are left alone; the node is marked dirty
    /// once if anything changed.
    pub fn copy_style(&mut self, node: LayoutNode, source: LayoutNode) {
        let target = self.node_handle(node);
        let source = self.node_handle(source);
        let mut changed = false;

        let style = *self.nodes.style(source);
        if *self.nodes.style(target) != style {
            *self.nodes.style_mut(target) = style;
            changed = true;
        }
        let dimensions = *self.nodes.dimensions(source);
        if *self.nodes.dimensions(target) != dimensions {
            *self.nodes.dimensions_mut(target) = dimensions;
            changed = true;
        }
        let margin = *self.nodes.margin(source);
        if *self.nodes.margin(target) != margin {
            *self.nodes.margin_mut(target) = margin;
            changed = true;
        }
        let border = *self.nodes.border(source);
        if *self.nodes.border(target) != border {
            *self.nodes.border_mut(target) = border;
            changed = true;
        }

        if changed {
            self.mark_dirty(node);
        }
    }

    /// Return a childless node to its freshly created state.
    ///
    /// Leaves the parent, drops measure/baseline callbacks and clears every
    /// record. The config and owner survive.
    pub fn reset(&mut self, node: LayoutNode) -> Result<()> {
        let handle = self.live_handle(node)?;
        let count = self.nodes.data(handle).child_count();
        if count > 0 {
            return Err(LayoutError::NodeHasChildren { count });
        }

        self.detach(handle);
        self.set_measure_function(node, None);
        self.set_baseline_function(node, None);

        let data = self.nodes.data_mut(handle);
        data.children = None;
        data.flags = NodeFlags::HAS_NEW_LAYOUT;
        data.line_index = 0;
        data.resolved_dimensions = [StyleValue::UNDEFINED; 2];
        *self.nodes.computed_mut(handle) = ComputedLayout::default();
        *self.nodes.cache_mut(handle) = LayoutCache::default();
        self.initialize_style(node);
        Ok(())
    }

    /// Run the manager's processor on the subtree rooted at `node`.
    ///
    /// `width`/`height` are the available size; NaN leaves an axis
    /// unconstrained. `Direction::Inherit` is resolved from the node and its
    /// ancestors before the processor sees it.
    ///
    /// Laying out a subtree rewrites its root's position relative to
    /// itself, so every ancestor's layout cache is invalidated.
    pub fn calculate_layout(
        &mut self,
        node: LayoutNode,
        width: f32,
        height: f32,
        direction: Direction,
    ) {
        if !self.contains(node) {
            log::warn!("calculate_layout: {node:?} is not a live node of this manager");
            return;
        }
        let direction = match direction {
            Direction::Inherit => self.resolved_direction(node),
            other => other,
        };

        let mut ancestor = self.parent(node);
        while !ancestor.is_undefined() {
            self.cache_mut(ancestor).valid = false;
            ancestor = self.parent(ancestor);
        }

        let processor = self.processor();
        processor.calculate_layout(self, node, width, height, direction);
    }
}
