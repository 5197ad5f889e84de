//! Core types for flexcore.
//!
//! Style enums, length values and the small geometry types that flow between
//! the node store, the layout processor and owner callbacks.
//!
//! Every enum stored inside a style record is `#[repr(u8)]` and every value
//! type is padding-free, so whole style records can be compared byte for byte
//! (see [`crate::engine::records`]).

use bytemuck::NoUninit;

// =============================================================================
// Unit / StyleValue
// =============================================================================

/// Unit attached to a [`StyleValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u32)]
pub enum Unit {
    /// Not set. The value is ignored.
    #[default]
    Undefined = 0,
    /// Absolute length in points.
    Point = 1,
    /// Percentage (0-100) of the containing block.
    Percent = 2,
    /// Content or container determined.
    Auto = 3,
}

impl From<u32> for Unit {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Point,
            2 => Self::Percent,
            3 => Self::Auto,
            _ => Self::Undefined,
        }
    }
}

/// A style length: a value plus its unit.
///
/// `StyleValue::UNDEFINED` (NaN, [`Unit::Undefined`]) is the distinguishable
/// "unset" sentinel; it is never the same thing as zero.
///
/// Equality is bitwise, so two undefined values compare equal even though
/// their payload is NaN.
#[derive(Debug, Clone, Copy, NoUninit)]
#[repr(C)]
pub struct StyleValue {
    pub value: f32,
    pub unit: Unit,
}

impl StyleValue {
    pub const UNDEFINED: Self = Self {
        value: f32::NAN,
        unit: Unit::Undefined,
    };
    pub const AUTO: Self = Self {
        value: f32::NAN,
        unit: Unit::Auto,
    };
    pub const ZERO: Self = Self {
        value: 0.0,
        unit: Unit::Point,
    };

    /// Absolute length. NaN collapses to [`StyleValue::UNDEFINED`].
    pub const fn point(value: f32) -> Self {
        if value.is_nan() {
            Self::UNDEFINED
        } else {
            Self {
                value,
                unit: Unit::Point,
            }
        }
    }

    /// Percentage of the containing block (0-100).
    pub const fn percent(value: f32) -> Self {
        if value.is_nan() {
            Self::UNDEFINED
        } else {
            Self {
                value,
                unit: Unit::Percent,
            }
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.unit == Unit::Undefined
    }

    pub fn is_auto(&self) -> bool {
        self.unit == Unit::Auto
    }

    /// Resolve against a reference length. Auto and undefined resolve to NaN.
    pub fn resolve(&self, basis: f32) -> f32 {
        match self.unit {
            Unit::Point => self.value,
            Unit::Percent => self.value * basis / 100.0,
            Unit::Auto | Unit::Undefined => f32::NAN,
        }
    }
}

impl Default for StyleValue {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl PartialEq for StyleValue {
    fn eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

impl Eq for StyleValue {}

// =============================================================================
// Flex enums (numeric values are the stored representation)
// =============================================================================

/// Text / box direction. `Inherit` resolves from the parent, `Ltr` at a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Inherit = 0,
    Ltr = 1,
    Rtl = 2,
}

impl From<u8> for Direction {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ltr,
            2 => Self::Rtl,
            _ => Self::Inherit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum FlexDirection {
    #[default]
    Column = 0,
    ColumnReverse = 1,
    Row = 2,
    RowReverse = 3,
}

impl FlexDirection {
    pub fn is_row(self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }
}

impl From<u8> for FlexDirection {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::ColumnReverse,
            2 => Self::Row,
            3 => Self::RowReverse,
            _ => Self::Column,
        }
    }
}

/// Main-axis distribution (justify-content).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum Justify {
    #[default]
    FlexStart = 0,
    Center = 1,
    FlexEnd = 2,
    SpaceBetween = 3,
    SpaceAround = 4,
    SpaceEvenly = 5,
}

impl From<u8> for Justify {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Center,
            2 => Self::FlexEnd,
            3 => Self::SpaceBetween,
            4 => Self::SpaceAround,
            5 => Self::SpaceEvenly,
            _ => Self::FlexStart,
        }
    }
}

/// Cross-axis alignment shared by align-items, align-self and align-content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum Align {
    #[default]
    Auto = 0,
    FlexStart = 1,
    Center = 2,
    FlexEnd = 3,
    Stretch = 4,
    Baseline = 5,
    SpaceBetween = 6,
    SpaceAround = 7,
    SpaceEvenly = 8,
}

impl From<u8> for Align {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::FlexStart,
            2 => Self::Center,
            3 => Self::FlexEnd,
            4 => Self::Stretch,
            5 => Self::Baseline,
            6 => Self::SpaceBetween,
            7 => Self::SpaceAround,
            8 => Self::SpaceEvenly,
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum Wrap {
    #[default]
    NoWrap = 0,
    Wrap = 1,
    WrapReverse = 2,
}

impl From<u8> for Wrap {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Wrap,
            2 => Self::WrapReverse,
            _ => Self::NoWrap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum Overflow {
    #[default]
    Visible = 0,
    Hidden = 1,
    Scroll = 2,
}

impl From<u8> for Overflow {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Hidden,
            2 => Self::Scroll,
            _ => Self::Visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum PositionType {
    #[default]
    Relative = 0,
    Absolute = 1,
}

impl From<u8> for PositionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Absolute,
            _ => Self::Relative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NoUninit)]
#[repr(u8)]
pub enum Display {
    #[default]
    Flex = 0,
    None = 1,
}

impl From<u8> for Display {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::None,
            _ => Self::Flex,
        }
    }
}

// =============================================================================
// Edges
// =============================================================================

/// Logical and shorthand edges addressable in a [`crate::engine::records::StyleEdges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
    /// Left in LTR, right in RTL.
    Start,
    /// Right in LTR, left in RTL.
    End,
    Horizontal,
    Vertical,
    All,
}

// =============================================================================
// Measurement
// =============================================================================

/// How a measure callback should treat a candidate length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeasureMode {
    /// No constraint; the length is NaN.
    #[default]
    Undefined,
    /// The result must be exactly this length.
    Exactly,
    /// The result may be at most this length.
    AtMost,
}

/// A width/height pair returned by measure callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_value_sentinels() {
        assert!(StyleValue::UNDEFINED.is_undefined());
        assert!(StyleValue::AUTO.is_auto());
        assert!(StyleValue::point(f32::NAN).is_undefined());
        assert_eq!(StyleValue::point(12.0).resolve(100.0), 12.0);
        assert_eq!(StyleValue::percent(25.0).resolve(200.0), 50.0);
        assert!(StyleValue::AUTO.resolve(100.0).is_nan());
    }

    #[test]
    fn test_enum_from_u8() {
        assert_eq!(FlexDirection::from(2), FlexDirection::Row);
        assert_eq!(FlexDirection::from(99), FlexDirection::Column);
        assert_eq!(Align::from(5), Align::Baseline);
        assert_eq!(Justify::from(5), Justify::SpaceEvenly);
        assert_eq!(Direction::from(2), Direction::Rtl);
        assert_eq!(Unit::from(2), Unit::Percent);
        assert!(FlexDirection::RowReverse.is_row());
        assert!(!FlexDirection::ColumnReverse.is_row());
    }
}
