//! Error type for layout engine operations.

use thiserror::Error;

use crate::engine::Handle;

/// Errors surfaced by hierarchy, lifecycle and capacity operations.
///
/// Teardown races (destroying into a disposed manager) are not errors; they
/// are silently ignored. Suspicious-but-harmless misuse is logged instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("child index {index} out of range for a node with {count} children")]
    ChildIndexOutOfRange { index: usize, count: usize },

    #[error("cannot reset a node that still has {count} children")]
    NodeHasChildren { count: usize },

    #[error("inserting the node would make it its own ancestor")]
    WouldCreateCycle,

    #[error("node capacity of {capacity} exhausted")]
    CapacityExceeded { capacity: usize },

    #[error("layout manager has been disposed")]
    Disposed,

    #[error("the default layout config cannot be destroyed")]
    DefaultConfig,

    #[error("stale or foreign handle {0:?}")]
    StaleHandle(Handle),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
