//! Layout - the pluggable algorithm seam.
//!
//! The engine never does flexbox math itself. [`LayoutManager::calculate_layout`]
//! hands the node to the manager's [`LayoutProcessor`], which walks the
//! handle tree, runs an algorithm and writes results back into each node's
//! computed record.
//!
//! # Processors
//!
//! - [`TaffyProcessor`] (default) maps every node's style records onto a
//!   [Taffy](https://github.com/DioxusLabs/taffy) tree, computes, and copies
//!   the results back.
//! - Any other `LayoutProcessor` can be installed per manager with
//!   [`LayoutManager::set_processor`]; the swap takes effect on the next
//!   `calculate_layout` call.
//!
//! [`LayoutManager::calculate_layout`]: crate::engine::LayoutManager::calculate_layout
//! [`LayoutManager::set_processor`]: crate::engine::LayoutManager::set_processor

mod computed_style;
mod taffy_bridge;

use std::sync::Arc;

use crate::engine::{LayoutManager, LayoutNode};
use crate::types::{Direction, MeasureMode, Size};

pub use computed_style::*;
pub use taffy_bridge::TaffyProcessor;

/// Owner-supplied intrinsic size callback.
///
/// Arguments: node, candidate width and its mode, candidate height and its mode.
pub type MeasureFunction =
    Arc<dyn Fn(LayoutNode, f32, MeasureMode, f32, MeasureMode) -> Size + Send + Sync>;

/// Owner-supplied baseline callback: node, width, height -> baseline offset.
pub type BaselineFunction = Arc<dyn Fn(LayoutNode, f32, f32) -> f32 + Send + Sync>;

/// A layout algorithm.
///
/// Implementations receive the whole manager so they can walk children,
/// read style records, invoke measure callbacks and write computed records.
/// Calls are synchronous and must not be re-entered for the same tree.
pub trait LayoutProcessor: Send + Sync {
    /// Lay out the subtree rooted at `node`.
    ///
    /// `width`/`height` are the available size; NaN means unconstrained.
    fn calculate_layout(
        &self,
        manager: &mut LayoutManager,
        node: LayoutNode,
        width: f32,
        height: f32,
        direction: Direction,
    );
}
