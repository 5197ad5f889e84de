//! Computed style input - a resolved, CSS-shaped style description.
//!
//! UI layers that run their own cascade hand the result to the engine as a
//! [`ComputedStyle`]. [`LayoutManager::copy_from_computed_style`] translates
//! it into the node's internal records: CSS lengths become style values,
//! percentages stay 0-100, box edges become physical edges.
//!
//! The translation only writes fields. It never marks the node dirty; the
//! caller decides when a batch of changes is complete.

use crate::engine::records::StyleEdges;
use crate::engine::{LayoutManager, LayoutNode};
use crate::types::{
    Align, Direction, Display, FlexDirection, Justify, Overflow, PositionType, StyleValue, Wrap,
};

/// A CSS length after cascade.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Length {
    #[default]
    Auto,
    /// `none` (only meaningful for max-width/max-height).
    None,
    Px(f32),
    /// Percentage, 0-100.
    Percent(f32),
}

impl Length {
    pub fn to_style_value(self) -> StyleValue {
        match self {
            Length::Auto => StyleValue::AUTO,
            Length::None => StyleValue::UNDEFINED,
            Length::Px(px) => StyleValue::point(px),
            Length::Percent(percent) => StyleValue::percent(percent),
        }
    }
}

/// CSS overflow keywords; the engine only distinguishes three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CssOverflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Scroll,
    Auto,
}

impl From<CssOverflow> for Overflow {
    fn from(overflow: CssOverflow) -> Self {
        match overflow {
            CssOverflow::Visible => Overflow::Visible,
            CssOverflow::Hidden | CssOverflow::Clip => Overflow::Hidden,
            CssOverflow::Scroll | CssOverflow::Auto => Overflow::Scroll,
        }
    }
}

/// Four physical sides, CSS order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Sides<T> {
    pub const fn all(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    fn to_edges(self, convert: impl Fn(T) -> StyleValue) -> StyleEdges {
        StyleEdges {
            left: convert(self.left),
            top: convert(self.top),
            right: convert(self.right),
            bottom: convert(self.bottom),
            ..StyleEdges::default()
        }
    }
}

/// Resolved style of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub position: PositionType,
    pub direction: Direction,
    pub overflow: CssOverflow,

    pub flex_direction: FlexDirection,
    pub flex_wrap: Wrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Length,
    pub justify_content: Justify,
    pub align_items: Align,
    pub align_self: Align,
    pub align_content: Align,
    pub aspect_ratio: Option<f32>,

    pub width: Length,
    pub height: Length,
    pub min_width: Length,
    pub min_height: Length,
    pub max_width: Length,
    pub max_height: Length,

    pub inset: Sides<Length>,
    pub margin: Sides<Length>,
    pub padding: Sides<Length>,
    /// Border widths in px.
    pub border: Sides<f32>,
}

impl Default for ComputedStyle {
    /// CSS initial values.
    fn default() -> Self {
        Self {
            display: Display::Flex,
            position: PositionType::Relative,
            direction: Direction::Inherit,
            overflow: CssOverflow::Visible,
            flex_direction: FlexDirection::Row,
            flex_wrap: Wrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Length::Auto,
            justify_content: Justify::FlexStart,
            align_items: Align::Stretch,
            align_self: Align::Auto,
            align_content: Align::Stretch,
            aspect_ratio: None,
            width: Length::Auto,
            height: Length::Auto,
            min_width: Length::Auto,
            min_height: Length::Auto,
            max_width: Length::None,
            max_height: Length::None,
            inset: Sides::all(Length::Auto),
            margin: Sides::all(Length::Px(0.0)),
            padding: Sides::all(Length::Px(0.0)),
            border: Sides::all(0.0),
        }
    }
}

impl LayoutManager {
    /// Overwrite the node's style records from a computed style.
    ///
    /// Logical and shorthand edges are cleared; only physical edges are set.
    /// Does not mark the node dirty.
    pub fn copy_from_computed_style(&mut self, node: LayoutNode, computed: &ComputedStyle) {
        let style = self.style_mut(node);
        style.display = computed.display;
        style.position_type = computed.position;
        style.direction = computed.direction;
        style.overflow = computed.overflow.into();
        style.flex_direction = computed.flex_direction;
        style.flex_wrap = computed.flex_wrap;
        style.flex = f32::NAN;
        style.flex_grow = computed.flex_grow;
        style.flex_shrink = computed.flex_shrink;
        style.flex_basis = computed.flex_basis.to_style_value();
        style.justify_content = computed.justify_content;
        style.align_items = computed.align_items;
        style.align_self = computed.align_self;
        style.align_content = computed.align_content;
        style.aspect_ratio = computed.aspect_ratio.unwrap_or(f32::NAN);
        style.position = computed.inset.to_edges(Length::to_style_value);
        style.padding = computed.padding.to_edges(Length::to_style_value);

        let dimensions = self.dimensions_mut(node);
        dimensions.width = computed.width.to_style_value();
        dimensions.height = computed.height.to_style_value();
        // `auto` minimums carry no constraint in flex layout.
        dimensions.min_width = min_constraint(computed.min_width);
        dimensions.min_height = min_constraint(computed.min_height);
        dimensions.max_width = computed.max_width.to_style_value();
        dimensions.max_height = computed.max_height.to_style_value();

        *self.margin_mut(node) = computed.margin.to_edges(Length::to_style_value);
        *self.border_mut(node) = computed.border.to_edges(StyleValue::point);
    }
}

fn min_constraint(length: Length) -> StyleValue {
    match length {
        Length::Auto => StyleValue::UNDEFINED,
        other => other.to_style_value(),
    }
}
