//! Manager registry - live managers by id, plus the process-wide instance.
//!
//! A [`LayoutNode`] only knows the id of its manager. The registry maps that
//! id to the manager's deferred-free queue so a node can be destroyed from
//! code that has no access to the manager itself (owner `Drop` impls,
//! worker threads). Managers register on construction and unregister on
//! dispose.
//!
//! The shared manager is created lazily on first use and torn down once by
//! [`shutdown_shared`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use super::handle::ManagerId;
use super::manager::{DeferredFrees, LayoutManager};
use super::node::LayoutNode;

// =============================================================================
// Registry State
// =============================================================================

static MANAGERS: LazyLock<Mutex<HashMap<ManagerId, Weak<DeferredFrees>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static SHARED: OnceLock<Mutex<LayoutManager>> = OnceLock::new();

static SHARED_SHUT_DOWN: AtomicBool = AtomicBool::new(false);

fn managers() -> MutexGuard<'static, HashMap<ManagerId, Weak<DeferredFrees>>> {
    MANAGERS.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Registration
// =============================================================================

pub(crate) fn register(id: ManagerId, frees: &Arc<DeferredFrees>) {
    managers().insert(id, Arc::downgrade(frees));
}

pub(crate) fn unregister(id: ManagerId) {
    managers().remove(&id);
}

/// Whether a manager with this id is alive and not disposed.
pub fn is_registered(id: ManagerId) -> bool {
    managers().get(&id).is_some_and(|frees| frees.strong_count() > 0)
}

/// Queue `node` for destruction on whichever manager created it.
///
/// Safe from any thread. Returns false when the node is undefined or its
/// manager is gone; both are ignored like any other teardown race.
pub fn destroy_detached(node: LayoutNode) -> bool {
    if node.is_undefined() {
        return false;
    }
    let frees = managers().get(&node.manager_id()).and_then(Weak::upgrade);
    match frees {
        Some(frees) => {
            frees.push(node.handle());
            true
        }
        None => {
            log::debug!("destroy_detached: manager of {node:?} is gone");
            false
        }
    }
}

// =============================================================================
// Shared Instance
// =============================================================================

/// The process-wide manager, created on first call.
pub fn shared() -> &'static Mutex<LayoutManager> {
    SHARED.get_or_init(|| Mutex::new(LayoutManager::new()))
}

/// Dispose the shared manager. Later calls do nothing.
pub fn shutdown_shared() {
    if SHARED_SHUT_DOWN.swap(true, Ordering::AcqRel) {
        return;
    }
    if let Some(manager) = SHARED.get() {
        manager.lock().unwrap_or_else(PoisonError::into_inner).dispose();
        log::debug!("shared layout manager shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_registers_and_unregisters() {
        let mut manager = LayoutManager::new();
        let id = manager.id();
        assert!(is_registered(id));
        manager.dispose();
        assert!(!is_registered(id));
    }

    #[test]
    fn test_destroy_detached_reaches_manager() {
        let mut manager = LayoutManager::new();
        let node = manager.create_node().unwrap();
        assert!(destroy_detached(node));
        assert_eq!(manager.pending_free_count(), 1);

        manager.collect();
        assert!(!manager.contains(node));
    }

    #[test]
    fn test_destroy_detached_after_drop_is_ignored() {
        let node = {
            let mut manager = LayoutManager::new();
            manager.create_node().unwrap()
        };
        assert!(!destroy_detached(node));
        assert!(!destroy_detached(LayoutNode::UNDEFINED));
    }

    #[test]
    fn test_shared_manager_creates_nodes() {
        let mut manager = shared().lock().unwrap();
        if manager.is_disposed() {
            return;
        }
        let mut node = manager.create_node().unwrap();
        assert!(manager.contains(node));
        manager.destroy_node(&mut node);
        manager.collect();
    }
}
