//! # flexcore
//!
//! Handle-based flexbox layout data engine.
//!
//! ## Architecture
//!
//! Layout nodes are not objects. A [`LayoutNode`] is a `Copy` handle (slot
//! index + generation) into struct-of-arrays storage owned by a
//! [`LayoutManager`]. Style, computed and cache records live in parallel
//! chunked columns keyed by the same handle.
//!
//! ```text
//! create_node -> style/hierarchy mutation -> mark_dirty -> calculate_layout
//!                                                            |
//!                                            LayoutProcessor (Taffy by default)
//!                                                            |
//!                                                  computed records
//! ```
//!
//! Destruction is two-phase: `destroy_node` releases the child list and
//! queues the slot; the slot is reclaimed on the next drain. Any thread can
//! queue a destruction through a [`DestroyQueue`] or
//! [`engine::registry::destroy_detached`].
//!
//! ## Modules
//!
//! - [`types`] - Style values, flex enums, measure modes
//! - [`engine`] - Stores, handles, manager, node and hierarchy operations
//! - [`layout`] - The processor seam and the Taffy-backed default
//! - [`error`] - [`LayoutError`]

pub mod engine;
pub mod error;
pub mod layout;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::records::{
    ComputedLayout, Insets, LayoutCache, LayoutStyle, StyleDimensions, StyleEdges,
};
pub use engine::{
    Children, DestroyQueue, Handle, LayoutConfig, LayoutManager, LayoutNode, ManagerId,
    ManagerOptions, OwnerRef,
};

pub use error::{LayoutError, Result};

pub use layout::{
    BaselineFunction, ComputedStyle, CssOverflow, LayoutProcessor, Length, MeasureFunction, Sides,
    TaffyProcessor,
};
