//! Taffy Bridge - the default layout processor.
//!
//! Mirrors the handle subtree into a Taffy tree, runs Taffy's flexbox
//! implementation and writes the results back into each node's computed
//! record.
//!
//! Per call:
//!
//! 1. Skip entirely if the root is clean and its cache matches the request.
//! 2. Build one Taffy node per handle node. Leaves with a measure function
//!    carry it as node context.
//! 3. Compute with the root's available size (NaN -> max-content).
//! 4. Copy position/size back, resolve margin/border/padding, round to the
//!    config's point grid, clear dirty bits and flag new layouts.
//!
//! Taffy has no baseline hook; baseline functions are stored on nodes but
//! not consulted here.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use taffy::{
    AlignContent as TaffyAlignContent, AlignItems as TaffyAlignItems, AvailableSpace,
    Dimension as TaffyDimension, Display as TaffyDisplay, FlexDirection as TaffyFlexDirection,
    FlexWrap as TaffyFlexWrap, LengthPercentage, LengthPercentageAuto, NodeId,
    Overflow as TaffyOverflow, Point, Position as TaffyPosition, Rect, Size as TaffySize, Style,
    TaffyTree,
};

use crate::engine::records::{ComputedLayout, Insets, LayoutCache, StyleEdges};
use crate::engine::{LayoutManager, LayoutNode};
use crate::types::{
    Align, Direction, Display, Edge, FlexDirection, Justify, MeasureMode, Overflow, PositionType,
    StyleValue, Unit, Wrap,
};

use super::{LayoutProcessor, MeasureFunction};

// =============================================================================
// VALUE CONVERSION
// =============================================================================

fn to_taffy_dimension(value: StyleValue) -> TaffyDimension {
    match value.unit {
        Unit::Point => TaffyDimension::Length(value.value),
        Unit::Percent => TaffyDimension::Percent(value.value / 100.0),
        _ => TaffyDimension::Auto,
    }
}

/// `undefined` maps to `undefined_as` (zero for margins, auto for insets).
fn to_taffy_lpa(value: StyleValue, undefined_as: LengthPercentageAuto) -> LengthPercentageAuto {
    match value.unit {
        Unit::Point => LengthPercentageAuto::Length(value.value),
        Unit::Percent => LengthPercentageAuto::Percent(value.value / 100.0),
        Unit::Auto => LengthPercentageAuto::Auto,
        Unit::Undefined => undefined_as,
    }
}

fn to_taffy_lp(value: StyleValue) -> LengthPercentage {
    match value.unit {
        Unit::Point => LengthPercentage::Length(value.value),
        Unit::Percent => LengthPercentage::Percent(value.value / 100.0),
        _ => LengthPercentage::Length(0.0),
    }
}

fn edges_rect<T>(
    edges: &StyleEdges,
    direction: Direction,
    convert: impl Fn(StyleValue) -> T,
) -> Rect<T> {
    Rect {
        left: convert(edges.resolve(Edge::Left, direction)),
        right: convert(edges.resolve(Edge::Right, direction)),
        top: convert(edges.resolve(Edge::Top, direction)),
        bottom: convert(edges.resolve(Edge::Bottom, direction)),
    }
}

// =============================================================================
// ENUM CONVERSIONS
// =============================================================================

/// RTL mirrors the row axis.
fn to_taffy_flex_direction(dir: FlexDirection, direction: Direction) -> TaffyFlexDirection {
    let rtl = direction == Direction::Rtl;
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::Row if rtl => TaffyFlexDirection::RowReverse,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::RowReverse if rtl => TaffyFlexDirection::Row,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_taffy_flex_wrap(wrap: Wrap) -> TaffyFlexWrap {
    match wrap {
        Wrap::NoWrap => TaffyFlexWrap::NoWrap,
        Wrap::Wrap => TaffyFlexWrap::Wrap,
        Wrap::WrapReverse => TaffyFlexWrap::WrapReverse,
    }
}

fn to_taffy_justify_content(justify: Justify) -> Option<TaffyAlignContent> {
    Some(match justify {
        Justify::FlexStart => TaffyAlignContent::FlexStart,
        Justify::Center => TaffyAlignContent::Center,
        Justify::FlexEnd => TaffyAlignContent::FlexEnd,
        Justify::SpaceBetween => TaffyAlignContent::SpaceBetween,
        Justify::SpaceAround => TaffyAlignContent::SpaceAround,
        Justify::SpaceEvenly => TaffyAlignContent::SpaceEvenly,
    })
}

/// Distribution values have no meaning for items; they fall back to
/// Taffy's default (stretch).
fn to_taffy_align_items(align: Align) -> Option<TaffyAlignItems> {
    match align {
        Align::FlexStart => Some(TaffyAlignItems::FlexStart),
        Align::Center => Some(TaffyAlignItems::Center),
        Align::FlexEnd => Some(TaffyAlignItems::FlexEnd),
        Align::Stretch => Some(TaffyAlignItems::Stretch),
        Align::Baseline => Some(TaffyAlignItems::Baseline),
        Align::Auto | Align::SpaceBetween | Align::SpaceAround | Align::SpaceEvenly => None,
    }
}

fn to_taffy_align_content(align: Align) -> Option<TaffyAlignContent> {
    match align {
        Align::FlexStart => Some(TaffyAlignContent::FlexStart),
        Align::Center => Some(TaffyAlignContent::Center),
        Align::FlexEnd => Some(TaffyAlignContent::FlexEnd),
        Align::Stretch => Some(TaffyAlignContent::Stretch),
        Align::SpaceBetween => Some(TaffyAlignContent::SpaceBetween),
        Align::SpaceAround => Some(TaffyAlignContent::SpaceAround),
        Align::SpaceEvenly => Some(TaffyAlignContent::SpaceEvenly),
        Align::Auto | Align::Baseline => None,
    }
}

fn to_taffy_overflow(overflow: Overflow) -> TaffyOverflow {
    match overflow {
        Overflow::Visible => TaffyOverflow::Visible,
        Overflow::Hidden => TaffyOverflow::Hidden,
        Overflow::Scroll => TaffyOverflow::Scroll,
    }
}

// =============================================================================
// STYLE BUILDING
// =============================================================================

/// Build a Taffy style from a node's four style records.
fn build_style(manager: &LayoutManager, node: LayoutNode, direction: Direction) -> Style {
    let style = manager.style(node);
    let dimensions = manager.dimensions(node);
    let use_web_defaults = manager.use_web_defaults(manager.node_config(node));
    let zero = LengthPercentageAuto::Length(0.0);

    Style {
        display: match style.display {
            Display::Flex => TaffyDisplay::Flex,
            Display::None => TaffyDisplay::None,
        },
        position: match style.position_type {
            PositionType::Relative => TaffyPosition::Relative,
            PositionType::Absolute => TaffyPosition::Absolute,
        },
        inset: edges_rect(&style.position, direction, |v| {
            to_taffy_lpa(v, LengthPercentageAuto::Auto)
        }),

        flex_direction: to_taffy_flex_direction(style.flex_direction, direction),
        flex_wrap: to_taffy_flex_wrap(style.flex_wrap),
        justify_content: to_taffy_justify_content(style.justify_content),
        align_items: to_taffy_align_items(style.align_items),
        align_content: to_taffy_align_content(style.align_content),
        align_self: to_taffy_align_items(style.align_self),

        flex_grow: style.resolved_flex_grow(),
        flex_shrink: style.resolved_flex_shrink(use_web_defaults),
        flex_basis: to_taffy_dimension(style.flex_basis),
        aspect_ratio: (!style.aspect_ratio.is_nan()).then_some(style.aspect_ratio),

        size: TaffySize {
            width: to_taffy_dimension(dimensions.width),
            height: to_taffy_dimension(dimensions.height),
        },
        min_size: TaffySize {
            width: to_taffy_dimension(dimensions.min_width),
            height: to_taffy_dimension(dimensions.min_height),
        },
        max_size: TaffySize {
            width: to_taffy_dimension(dimensions.max_width),
            height: to_taffy_dimension(dimensions.max_height),
        },

        margin: edges_rect(manager.margin(node), direction, |v| to_taffy_lpa(v, zero)),
        padding: edges_rect(&style.padding, direction, to_taffy_lp),
        border: edges_rect(manager.border(node), direction, to_taffy_lp),

        overflow: Point {
            x: to_taffy_overflow(style.overflow),
            y: to_taffy_overflow(style.overflow),
        },

        ..Default::default()
    }
}

// =============================================================================
// MEASUREMENT
// =============================================================================

/// Context attached to Taffy leaves that have a measure function.
struct MeasureContext {
    node: LayoutNode,
    measure: MeasureFunction,
}

fn measure_axis(known: Option<f32>, available: AvailableSpace) -> (f32, MeasureMode) {
    match (known, available) {
        (Some(length), _) => (length, MeasureMode::Exactly),
        (None, AvailableSpace::Definite(length)) => (length, MeasureMode::AtMost),
        (None, AvailableSpace::MinContent | AvailableSpace::MaxContent) => {
            (f32::NAN, MeasureMode::Undefined)
        }
    }
}

fn measure_leaf(
    context: &MeasureContext,
    known: TaffySize<Option<f32>>,
    available: TaffySize<AvailableSpace>,
) -> TaffySize<f32> {
    let (width, width_mode) = measure_axis(known.width, available.width);
    let (height, height_mode) = measure_axis(known.height, available.height);
    let measured = (context.measure)(context.node, width, width_mode, height, height_mode);

    TaffySize {
        width: known.width.unwrap_or(sanitize(measured.width)),
        height: known.height.unwrap_or(sanitize(measured.height)),
    }
}

fn sanitize(length: f32) -> f32 {
    if length.is_finite() {
        length.max(0.0)
    } else {
        0.0
    }
}

// =============================================================================
// PROCESSOR
// =============================================================================

/// One handle node mirrored into the Taffy tree.
///
/// Entries are stored parent-first, so a parent's results are written back
/// before its children need them.
struct Mirrored {
    node: LayoutNode,
    id: NodeId,
    /// Position of the parent entry; `None` at the root.
    parent: Option<usize>,
    /// Whether the parent's main axis is horizontal (own axis at the root).
    parent_row: bool,
    direction: Direction,
}

/// Default processor backed by Taffy's flexbox algorithm.
#[derive(Debug, Default)]
pub struct TaffyProcessor {
    passes: AtomicU32,
}

impl TaffyProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of layout passes that actually ran (cache hits excluded).
    pub fn pass_count(&self) -> u32 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Recursively mirror `node` and its subtree; children are created first.
    fn mirror(
        manager: &LayoutManager,
        tree: &mut TaffyTree<MeasureContext>,
        node: LayoutNode,
        parent: Option<usize>,
        inherited: Direction,
        out: &mut Vec<Mirrored>,
    ) -> taffy::TaffyResult<NodeId> {
        let own = manager.style(node).direction;
        let direction = if own == Direction::Inherit {
            inherited
        } else {
            own
        };
        let row = manager.style(node).flex_direction.is_row();
        let style = build_style(manager, node, direction);

        let slot = out.len();
        let parent_row = match parent {
            Some(p) => manager.style(out[p].node).flex_direction.is_row(),
            None => row,
        };
        out.push(Mirrored {
            node,
            id: NodeId::from(0_u64),
            parent,
            parent_row,
            direction,
        });

        let id = if manager.child_count(node) == 0 {
            match manager.measure_function(node) {
                Some(measure) => tree.new_leaf_with_context(
                    style,
                    MeasureContext {
                        node,
                        measure: Arc::clone(measure),
                    },
                )?,
                None => tree.new_leaf(style)?,
            }
        } else {
            let mut children = Vec::with_capacity(manager.child_count(node));
            for child in manager.children(node) {
                children.push(Self::mirror(
                    manager,
                    tree,
                    child,
                    Some(slot),
                    direction,
                    out,
                )?);
            }
            tree.new_with_children(style, &children)?
        };

        out[slot].id = id;
        Ok(id)
    }

    fn write_back(
        manager: &mut LayoutManager,
        tree: &TaffyTree<MeasureContext>,
        mirrored: &[Mirrored],
        root_width: f32,
        generation: u32,
    ) {
        // Unrounded border-box widths, for percentage edges of children.
        let mut widths = Vec::with_capacity(mirrored.len());

        for entry in mirrored {
            let (location, size) = match tree.layout(entry.id) {
                Ok(layout) => (layout.location, layout.size),
                Err(err) => {
                    log::warn!("taffy layout missing for {:?}: {err}", entry.node);
                    widths.push(f32::NAN);
                    continue;
                }
            };
            widths.push(size.width);

            let basis = entry.parent.map_or(root_width, |p| widths[p]);
            let basis = if basis.is_nan() { 0.0 } else { basis };
            let scale = manager.point_scale_factor(manager.node_config(entry.node));
            let direction = entry.direction;
            let dimensions = manager.dimensions(entry.node);
            let resolved = [dimensions.width, dimensions.height];

            *manager.computed_mut(entry.node) = ComputedLayout {
                left: round_to_grid(location.x, scale),
                top: round_to_grid(location.y, scale),
                width: round_to_grid(size.width, scale),
                height: round_to_grid(size.height, scale),
                margin: resolve_insets(manager.margin(entry.node), direction, basis),
                border: resolve_insets(manager.border(entry.node), direction, basis),
                padding: resolve_insets(&manager.style(entry.node).padding, direction, basis),
                direction,
                computed_flex_basis: if entry.parent_row {
                    size.width
                } else {
                    size.height
                },
                measured_width: size.width,
                measured_height: size.height,
                generation,
            };
            manager.set_resolved_dimensions(entry.node, resolved);
            manager.set_line_index(entry.node, 0);
            manager.set_dirty(entry.node, false);
            manager.set_has_new_layout(entry.node, true);
        }
    }
}

impl LayoutProcessor for TaffyProcessor {
    fn calculate_layout(
        &self,
        manager: &mut LayoutManager,
        node: LayoutNode,
        width: f32,
        height: f32,
        direction: Direction,
    ) {
        if !manager.is_dirty(node) && manager.cache(node).matches(width, height, direction) {
            log::trace!("layout cache hit for {node:?}");
            return;
        }

        let mut tree: TaffyTree<MeasureContext> = TaffyTree::new();
        tree.disable_rounding();
        let mut mirrored = Vec::new();
        let root = match Self::mirror(manager, &mut tree, node, None, direction, &mut mirrored) {
            Ok(root) => root,
            Err(err) => {
                log::warn!("failed to build taffy tree for {node:?}: {err}");
                return;
            }
        };

        // Yoga-style: an auto-sized root takes the requested size.
        if let Ok(mut root_style) = tree.style(root).cloned() {
            let dimensions = manager.dimensions(node);
            let mut changed = false;
            if !width.is_nan()
                && matches!(root_style.size.width, TaffyDimension::Auto)
                && dimensions.width.is_auto()
            {
                root_style.size.width = TaffyDimension::Length(width);
                changed = true;
            }
            if !height.is_nan()
                && matches!(root_style.size.height, TaffyDimension::Auto)
                && dimensions.height.is_auto()
            {
                root_style.size.height = TaffyDimension::Length(height);
                changed = true;
            }
            if changed {
                if let Err(err) = tree.set_style(root, root_style) {
                    log::warn!("failed to size taffy root for {node:?}: {err}");
                }
            }
        }

        let available = TaffySize {
            width: available_space(width),
            height: available_space(height),
        };
        let result = tree.compute_layout_with_measure(
            root,
            available,
            |known, available, _id, context, _style| match context {
                Some(context) => measure_leaf(context, known, available),
                None => TaffySize::ZERO,
            },
        );
        if let Err(err) = result {
            log::warn!("taffy layout failed for {node:?}: {err}");
            return;
        }

        let generation = self.passes.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        Self::write_back(manager, &tree, &mirrored, width, generation);

        let computed = *manager.computed(node);
        *manager.cache_mut(node) = LayoutCache {
            available_width: width,
            available_height: height,
            width_mode: axis_mode(width),
            height_mode: axis_mode(height),
            direction,
            computed_width: computed.width,
            computed_height: computed.height,
            valid: true,
        };
        log::debug!(
            "laid out {} nodes under {node:?}: {}x{}",
            mirrored.len(),
            computed.width,
            computed.height
        );
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn available_space(length: f32) -> AvailableSpace {
    if length.is_nan() {
        AvailableSpace::MaxContent
    } else {
        AvailableSpace::Definite(length)
    }
}

fn axis_mode(length: f32) -> MeasureMode {
    if length.is_nan() {
        MeasureMode::Undefined
    } else {
        MeasureMode::Exactly
    }
}

fn resolve_insets(edges: &StyleEdges, direction: Direction, basis: f32) -> Insets {
    let resolve = |edge| {
        let value = edges.resolve(edge, direction).resolve(basis);
        if value.is_nan() { 0.0 } else { value }
    };
    Insets {
        left: resolve(Edge::Left),
        top: resolve(Edge::Top),
        right: resolve(Edge::Right),
        bottom: resolve(Edge::Bottom),
    }
}

/// Snap to the `1 / scale` grid. A zero or NaN scale disables rounding.
fn round_to_grid(value: f32, scale: f32) -> f32 {
    if scale == 0.0 || scale.is_nan() {
        value
    } else {
        (value * scale).round() / scale
    }
}
