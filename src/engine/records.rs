//! Fixed-layout records stored per node and per config.
//!
//! A node is split across seven parallel component arrays keyed by the same
//! handle (see [`super::NodeStore`]):
//!
//! ```text
//! data        parent, children, flags, config, callback slots
//! style       flex properties, padding, position
//! dimensions  width/height and their min/max
//! margin      StyleEdges
//! border      StyleEdges
//! computed    results written by the layout processor
//! cache       last layout inputs/outputs of the node
//! ```
//!
//! The four style records are `#[repr(C)]` and padding free, so equality is
//! plain byte equality. That keeps `copy_style` deterministic even for NaN
//! sentinels.

use bitflags::bitflags;
use bytemuck::NoUninit;

use super::handle::Handle;
use crate::types::{
    Align, Direction, Display, Edge, FlexDirection, Justify, MeasureMode, Overflow, PositionType,
    StyleValue, Wrap,
};

/// Byte equality for padding-free records.
macro_rules! impl_bitwise_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
                }
            }

            impl Eq for $ty {}
        )*
    };
}

// =============================================================================
// STYLE RECORDS
// =============================================================================

/// Nine addressable edges, resolved to physical edges at layout time.
#[derive(Debug, Clone, Copy, Default, NoUninit)]
#[repr(C)]
pub struct StyleEdges {
    pub left: StyleValue,
    pub top: StyleValue,
    pub right: StyleValue,
    pub bottom: StyleValue,
    pub start: StyleValue,
    pub end: StyleValue,
    pub horizontal: StyleValue,
    pub vertical: StyleValue,
    pub all: StyleValue,
}

impl StyleEdges {
    pub fn get(&self, edge: Edge) -> StyleValue {
        match edge {
            Edge::Left => self.left,
            Edge::Top => self.top,
            Edge::Right => self.right,
            Edge::Bottom => self.bottom,
            Edge::Start => self.start,
            Edge::End => self.end,
            Edge::Horizontal => self.horizontal,
            Edge::Vertical => self.vertical,
            Edge::All => self.all,
        }
    }

    pub fn set(&mut self, edge: Edge, value: StyleValue) {
        let slot = match edge {
            Edge::Left => &mut self.left,
            Edge::Top => &mut self.top,
            Edge::Right => &mut self.right,
            Edge::Bottom => &mut self.bottom,
            Edge::Start => &mut self.start,
            Edge::End => &mut self.end,
            Edge::Horizontal => &mut self.horizontal,
            Edge::Vertical => &mut self.vertical,
            Edge::All => &mut self.all,
        };
        *slot = value;
    }

    /// Resolve a physical edge (`Left`, `Top`, `Right`, `Bottom`).
    ///
    /// Precedence: the physical edge, then the logical start/end edge for
    /// `direction`, then the axis shorthand, then `all`. Logical and shorthand
    /// edges passed in are returned as stored.
    pub fn resolve(&self, edge: Edge, direction: Direction) -> StyleValue {
        let rtl = direction == Direction::Rtl;
        let (logical, axis) = match edge {
            Edge::Left => (Some(if rtl { self.end } else { self.start }), self.horizontal),
            Edge::Right => (Some(if rtl { self.start } else { self.end }), self.horizontal),
            Edge::Top | Edge::Bottom => (None, self.vertical),
            _ => return self.get(edge),
        };

        [Some(self.get(edge)), logical, Some(axis), Some(self.all)]
            .into_iter()
            .flatten()
            .find(|value| !value.is_undefined())
            .unwrap_or(StyleValue::UNDEFINED)
    }
}

/// Width/height constraints.
#[derive(Debug, Clone, Copy, NoUninit)]
#[repr(C)]
pub struct StyleDimensions {
    pub width: StyleValue,
    pub height: StyleValue,
    pub min_width: StyleValue,
    pub min_height: StyleValue,
    pub max_width: StyleValue,
    pub max_height: StyleValue,
}

impl Default for StyleDimensions {
    fn default() -> Self {
        Self {
            width: StyleValue::AUTO,
            height: StyleValue::AUTO,
            min_width: StyleValue::UNDEFINED,
            min_height: StyleValue::UNDEFINED,
            max_width: StyleValue::UNDEFINED,
            max_height: StyleValue::UNDEFINED,
        }
    }
}

/// Flex container/item properties plus padding and position offsets.
///
/// `flex`, `flex_grow`, `flex_shrink` and `aspect_ratio` use NaN for "unset";
/// the processor resolves grow/shrink from `flex` and the config defaults.
#[derive(Debug, Clone, Copy, NoUninit)]
#[repr(C)]
pub struct LayoutStyle {
    pub flex: f32,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub aspect_ratio: f32,
    pub flex_basis: StyleValue,
    pub padding: StyleEdges,
    pub position: StyleEdges,

    pub direction: Direction,
    pub flex_direction: FlexDirection,
    pub justify_content: Justify,
    pub align_content: Align,
    pub align_items: Align,
    pub align_self: Align,
    pub position_type: PositionType,
    pub flex_wrap: Wrap,
    pub overflow: Overflow,
    pub display: Display,
    _reserved: [u8; 2],
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            flex: f32::NAN,
            flex_grow: f32::NAN,
            flex_shrink: f32::NAN,
            aspect_ratio: f32::NAN,
            flex_basis: StyleValue::AUTO,
            padding: StyleEdges::default(),
            position: StyleEdges::default(),
            direction: Direction::Inherit,
            flex_direction: FlexDirection::Column,
            justify_content: Justify::FlexStart,
            align_content: Align::FlexStart,
            align_items: Align::Stretch,
            align_self: Align::Auto,
            position_type: PositionType::Relative,
            flex_wrap: Wrap::NoWrap,
            overflow: Overflow::Visible,
            display: Display::Flex,
            _reserved: [0; 2],
        }
    }
}

impl LayoutStyle {
    /// Effective flex-grow: explicit value, else positive `flex`, else 0.
    pub fn resolved_flex_grow(&self) -> f32 {
        if !self.flex_grow.is_nan() {
            self.flex_grow
        } else if !self.flex.is_nan() && self.flex > 0.0 {
            self.flex
        } else {
            0.0
        }
    }

    /// Effective flex-shrink: explicit value, else negated negative `flex`,
    /// else 1 with web defaults and 0 without.
    pub fn resolved_flex_shrink(&self, use_web_defaults: bool) -> f32 {
        if !self.flex_shrink.is_nan() {
            self.flex_shrink
        } else if !self.flex.is_nan() && self.flex < 0.0 {
            -self.flex
        } else if use_web_defaults {
            1.0
        } else {
            0.0
        }
    }
}

impl_bitwise_eq!(StyleEdges, StyleDimensions, LayoutStyle);

// =============================================================================
// NODE DATA
// =============================================================================

bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        const DIRTY = 1 << 0;
        const HAS_NEW_LAYOUT = 1 << 1;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::HAS_NEW_LAYOUT
    }
}

/// Hierarchy links, flags and indirections for one node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Non-owning back reference.
    pub parent: Handle,
    /// Following entry in the parent's child list.
    pub next_sibling: Handle,
    /// Allocated on first insert; released on destroy.
    pub children: Option<Vec<Handle>>,
    pub flags: NodeFlags,
    pub line_index: u32,
    pub config: Handle,
    /// Cached style width/height in effect for the last layout.
    pub resolved_dimensions: [StyleValue; 2],
    /// Slot in the manager's measure function store, 0 = none.
    pub measure_function: u32,
    /// Slot in the manager's baseline function store, 0 = none.
    pub baseline_function: u32,
    /// Slot in the manager's owner store, 0 = none.
    pub owner: u32,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            parent: Handle::UNDEFINED,
            next_sibling: Handle::UNDEFINED,
            children: None,
            flags: NodeFlags::default(),
            line_index: 0,
            config: Handle::UNDEFINED,
            resolved_dimensions: [StyleValue::UNDEFINED; 2],
            measure_function: 0,
            baseline_function: 0,
            owner: 0,
        }
    }
}

impl NodeData {
    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }
}

// =============================================================================
// COMPUTED / CACHE
// =============================================================================

/// Resolved per-edge lengths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Output of the last layout pass for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedLayout {
    /// Offset from the parent's border box.
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub margin: Insets,
    pub border: Insets,
    pub padding: Insets,
    pub direction: Direction,
    /// Main-axis size settled by the last pass; NaN means "needs recompute".
    pub computed_flex_basis: f32,
    /// Size before rounding to the config's point grid.
    pub measured_width: f32,
    pub measured_height: f32,
    /// Layout pass counter value when this record was written.
    pub generation: u32,
}

impl Default for ComputedLayout {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: f32::NAN,
            height: f32::NAN,
            margin: Insets::default(),
            border: Insets::default(),
            padding: Insets::default(),
            direction: Direction::Inherit,
            computed_flex_basis: f32::NAN,
            measured_width: f32::NAN,
            measured_height: f32::NAN,
            generation: 0,
        }
    }
}

/// Inputs and outputs of the last layout request rooted at a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCache {
    pub available_width: f32,
    pub available_height: f32,
    pub width_mode: MeasureMode,
    pub height_mode: MeasureMode,
    pub direction: Direction,
    pub computed_width: f32,
    pub computed_height: f32,
    pub valid: bool,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self {
            available_width: f32::NAN,
            available_height: f32::NAN,
            width_mode: MeasureMode::Undefined,
            height_mode: MeasureMode::Undefined,
            direction: Direction::Inherit,
            computed_width: f32::NAN,
            computed_height: f32::NAN,
            valid: false,
        }
    }
}

impl LayoutCache {
    /// True when a request with these inputs would reproduce the cached result.
    pub fn matches(&self, width: f32, height: f32, direction: Direction) -> bool {
        self.valid
            && same_length(self.available_width, width)
            && same_length(self.available_height, height)
            && self.direction == direction
    }
}

/// Length equality where NaN ("unconstrained") matches NaN.
fn same_length(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

// =============================================================================
// CONFIG
// =============================================================================

/// Tree-wide options shared by every node that references the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigData {
    /// Row direction, stretched align-content and shrink 1 by default.
    pub use_web_defaults: bool,
    /// Layout results are rounded to `1 / point_scale_factor`; 0 disables rounding.
    pub point_scale_factor: f32,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            use_web_defaults: false,
            point_scale_factor: 1.0,
        }
    }
}
