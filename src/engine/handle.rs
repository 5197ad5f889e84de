//! Handles - stable integer references into a data store.
//!
//! A handle is a slot index plus the generation the slot had when it was
//! allocated. Freeing a slot bumps its generation, so a handle captured
//! before a free/reuse cycle no longer validates against the new occupant.
//!
//! Index 0 is reserved: [`Handle::UNDEFINED`] never names a live record.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Index + generation reference into a [`super::DataStore`] or [`super::NodeStore`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub const UNDEFINED: Self = Self {
        index: 0,
        generation: 0,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }

    pub const fn is_undefined(self) -> bool {
        self.index == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            f.write_str("Handle(undefined)")
        } else {
            write!(f, "Handle({}v{})", self.index, self.generation)
        }
    }
}

// =============================================================================
// Manager identity
// =============================================================================

/// Identity of the [`super::LayoutManager`] that owns a handle's store.
///
/// Lets a bare [`super::LayoutNode`] find its manager through the registry
/// and lets the manager reject handles minted by another instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ManagerId(u32);

static NEXT_MANAGER_ID: AtomicU32 = AtomicU32::new(1);

impl ManagerId {
    pub const NONE: Self = Self(0);

    pub(crate) fn next() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_handle() {
        assert!(Handle::UNDEFINED.is_undefined());
        assert_eq!(Handle::default(), Handle::UNDEFINED);
        assert!(!Handle::new(1, 1).is_undefined());
    }

    #[test]
    fn test_handle_equality_includes_generation() {
        assert_eq!(Handle::new(3, 1), Handle::new(3, 1));
        assert_ne!(Handle::new(3, 1), Handle::new(3, 2));
        assert_ne!(Handle::new(3, 1), Handle::new(4, 1));
    }

    #[test]
    fn test_manager_ids_are_unique() {
        let a = ManagerId::next();
        let b = ManagerId::next();
        assert_ne!(a, b);
        assert_ne!(a, ManagerId::NONE);
    }
}
