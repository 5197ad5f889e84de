//! LayoutManager - node/config factory, deferred destruction and teardown.
//!
//! Destruction is split in two phases:
//!
//! 1. `destroy_node` releases what the node owns directly (its child list,
//!    its place in the parent's list) and pushes the handle onto the
//!    deferred-free stack.
//! 2. The slot itself is reclaimed later, when the stack is drained.
//!
//! The stack is the only state shared across threads. [`DestroyQueue`] and
//! the registry let any thread push onto it; the manager drains it with a
//! non-blocking `try_lock` before every allocation and with a blocking lock
//! in [`LayoutManager::collect`]. Skipping a drain is always safe: the
//! handles simply wait for the next one.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};

use crate::error::{LayoutError, Result};
use crate::layout::{BaselineFunction, LayoutProcessor, MeasureFunction, TaffyProcessor};

use super::config::LayoutConfig;
use super::data_store::{DataStore, NodeStore};
use super::handle::{Handle, ManagerId};
use super::managed_store::ManagedObjectStore;
use super::node::LayoutNode;
use super::records::{ConfigData, NodeData};
use super::registry;

/// Weakly held external object associated with a node.
pub type OwnerRef = Weak<dyn Any + Send + Sync>;

// =============================================================================
// OPTIONS
// =============================================================================

/// Construction options for a [`LayoutManager`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerOptions {
    /// Maximum number of node slots. `None` grows without bound.
    pub node_capacity: Option<usize>,
    /// `use_web_defaults` of the default config.
    pub use_web_defaults: bool,
    /// `point_scale_factor` of the default config.
    pub point_scale_factor: f32,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        let config = ConfigData::default();
        Self {
            node_capacity: None,
            use_web_defaults: config.use_web_defaults,
            point_scale_factor: config.point_scale_factor,
        }
    }
}

// =============================================================================
// DEFERRED FREES
// =============================================================================

/// Pending node frees, shared with [`DestroyQueue`]s and the registry.
#[derive(Debug, Default)]
pub(crate) struct DeferredFrees {
    disposed: AtomicBool,
    stack: Mutex<Vec<Handle>>,
}

impl DeferredFrees {
    /// Queue a handle. Ignored once the manager is disposed.
    pub(crate) fn push(&self, handle: Handle) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        self.lock().push(handle);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Handle>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take everything queued without blocking. `None` if another thread
    /// holds the lock.
    fn try_take(&self) -> Option<Vec<Handle>> {
        match self.stack.try_lock() {
            Ok(mut stack) => Some(std::mem::take(&mut *stack)),
            Err(TryLockError::Poisoned(poisoned)) => {
                Some(std::mem::take(&mut *poisoned.into_inner()))
            }
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn take(&self) -> Vec<Handle> {
        std::mem::take(&mut *self.lock())
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Thread-safe destruction entry point for one manager.
///
/// Cheap to clone and safe to call from any thread, including from `Drop`
/// impls of owner objects. The node's slot is reclaimed on the manager's
/// next drain; requests made after the manager is disposed are ignored.
#[derive(Debug, Clone)]
pub struct DestroyQueue {
    manager: ManagerId,
    frees: Arc<DeferredFrees>,
}

impl DestroyQueue {
    pub fn destroy(&self, node: LayoutNode) {
        if node.is_undefined() || node.manager_id() != self.manager {
            return;
        }
        self.frees.push(node.handle());
    }
}

// =============================================================================
// LAYOUT MANAGER
// =============================================================================

/// Owns the node and config stores of one layout tree family.
pub struct LayoutManager {
    pub(super) id: ManagerId,
    pub(super) nodes: NodeStore,
    pub(super) configs: DataStore<ConfigData>,
    pub(super) default_config: LayoutConfig,
    measure_functions: ManagedObjectStore<MeasureFunction>,
    baseline_functions: ManagedObjectStore<BaselineFunction>,
    owners: ManagedObjectStore<OwnerRef>,
    frees: Arc<DeferredFrees>,
    processor: Arc<dyn LayoutProcessor>,
    disposed: bool,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self::with_options(ManagerOptions::default())
    }

    pub fn with_options(options: ManagerOptions) -> Self {
        let id = ManagerId::next();
        let mut configs = DataStore::new(None);
        let default_config = match configs.allocate(ConfigData {
            use_web_defaults: options.use_web_defaults,
            point_scale_factor: options.point_scale_factor,
        }) {
            Ok(handle) => LayoutConfig::new(id, handle),
            // An unbounded store cannot refuse its first slot.
            Err(_) => LayoutConfig::UNDEFINED,
        };

        let frees = Arc::new(DeferredFrees::default());
        registry::register(id, &frees);
        log::debug!("layout manager {} created", id.get());

        Self {
            id,
            nodes: NodeStore::new(options.node_capacity),
            configs,
            default_config,
            measure_functions: ManagedObjectStore::new(),
            baseline_functions: ManagedObjectStore::new(),
            owners: ManagedObjectStore::new(),
            frees,
            processor: Arc::new(TaffyProcessor::default()),
            disposed: false,
        }
    }

    pub fn id(&self) -> ManagerId {
        self.id
    }

    pub fn default_config(&self) -> LayoutConfig {
        self.default_config
    }

    pub fn processor(&self) -> Arc<dyn LayoutProcessor> {
        Arc::clone(&self.processor)
    }

    /// Install a different layout algorithm for subsequent layouts.
    pub fn set_processor(&mut self, processor: Arc<dyn LayoutProcessor>) {
        self.processor = processor;
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// New node referencing the default config.
    pub fn create_node(&mut self) -> Result<LayoutNode> {
        self.create_node_with_config(self.default_config)
    }

    pub fn create_node_with_config(&mut self, config: LayoutConfig) -> Result<LayoutNode> {
        if self.disposed {
            return Err(LayoutError::Disposed);
        }
        self.try_free_nodes();

        let config = if config.manager_id() == self.id && self.configs.is_live(config.handle()) {
            config.handle()
        } else {
            log::warn!("node created with unknown config {config:?}, using the default config");
            self.default_config.handle()
        };

        let handle = self.nodes.allocate(NodeData {
            config,
            ..NodeData::default()
        })?;
        let node = LayoutNode::new(self.id, handle);
        self.initialize_style(node);
        log::trace!("created {node:?}");
        Ok(node)
    }

    /// New node sharing `source`'s config and a copy of its style.
    pub fn create_node_from(&mut self, source: LayoutNode) -> Result<LayoutNode> {
        let source_handle = self.live_handle(source)?;
        let config = LayoutConfig::new(self.id, self.nodes.data(source_handle).config);
        let node = self.create_node_with_config(config)?;
        self.copy_style(node, source);
        Ok(node)
    }

    // =========================================================================
    // DESTRUCTION
    // =========================================================================

    /// Destroy `node` and reset the variable to [`LayoutNode::UNDEFINED`].
    ///
    /// The child list is released immediately (children become roots) and
    /// the node leaves its parent's list. The slot is reclaimed on the next
    /// drain. Undefined nodes and disposed managers are ignored; a node of
    /// another manager is logged and left alone. The variable is reset in
    /// every case.
    pub fn destroy_node(&mut self, node: &mut LayoutNode) {
        if node.is_undefined() || self.disposed {
            *node = LayoutNode::UNDEFINED;
            return;
        }
        if node.manager_id() != self.id {
            log::warn!("destroy_node: {node:?} belongs to another manager");
            *node = LayoutNode::UNDEFINED;
            return;
        }

        let handle = node.handle();
        if self.nodes.is_live(handle) {
            self.release_children(handle);
            self.detach(handle);
            self.frees.push(handle);
        }
        *node = LayoutNode::UNDEFINED;
    }

    /// A handle other threads can use to request destruction.
    pub fn destroy_queue(&self) -> DestroyQueue {
        DestroyQueue {
            manager: self.id,
            frees: Arc::clone(&self.frees),
        }
    }

    /// Apply every pending free. Blocks on the queue lock.
    pub fn collect(&mut self) {
        let pending = self.frees.take();
        self.free_all(pending);
    }

    /// Apply pending frees if the queue lock is free; otherwise do nothing.
    pub(crate) fn try_free_nodes(&mut self) {
        if let Some(pending) = self.frees.try_take() {
            self.free_all(pending);
        }
    }

    fn free_all(&mut self, pending: Vec<Handle>) {
        if !pending.is_empty() {
            log::trace!("reclaiming {} node slots", pending.len());
        }
        for handle in pending {
            self.free_node(handle);
        }
    }

    fn free_node(&mut self, handle: Handle) {
        // Destroyed twice, or queued after a reuse cycle.
        if !self.nodes.is_live(handle) {
            return;
        }

        // Remote destroy requests arrive here without phase one.
        self.release_children(handle);
        self.detach(handle);

        let data = self.nodes.data_mut(handle);
        let (mut measure, mut baseline, mut owner) =
            (data.measure_function, data.baseline_function, data.owner);
        self.measure_functions.update(&mut measure, None);
        self.baseline_functions.update(&mut baseline, None);
        self.owners.update(&mut owner, None);

        self.nodes.free(handle);
    }

    /// Drop the child list; children whose parent link still points here
    /// become roots.
    fn release_children(&mut self, handle: Handle) {
        let Some(children) = self.nodes.data_mut(handle).children.take() else {
            return;
        };
        for child in children {
            if let Some(data) = self.nodes.try_data_mut(child) {
                if data.parent == handle {
                    data.parent = Handle::UNDEFINED;
                    data.next_sibling = Handle::UNDEFINED;
                }
            }
        }
    }

    // =========================================================================
    // CALLBACKS / OWNER
    // =========================================================================

    /// Install or clear (`None`) the measure callback of `node`.
    pub fn set_measure_function(&mut self, node: LayoutNode, function: Option<MeasureFunction>) {
        let handle = self.node_handle(node);
        if function.is_some() && self.owner(node).is_none() {
            log::warn!("measure function set on {node:?}, which has no owner");
        }
        let data = self.nodes.data_mut(handle);
        self.measure_functions.update(&mut data.measure_function, function);
    }

    /// Install or clear (`None`) the baseline callback of `node`.
    pub fn set_baseline_function(&mut self, node: LayoutNode, function: Option<BaselineFunction>) {
        let handle = self.node_handle(node);
        if function.is_some() && self.owner(node).is_none() {
            log::warn!("baseline function set on {node:?}, which has no owner");
        }
        let data = self.nodes.data_mut(handle);
        self.baseline_functions.update(&mut data.baseline_function, function);
    }

    pub fn measure_function(&self, node: LayoutNode) -> Option<&MeasureFunction> {
        let handle = self.node_handle(node);
        self.measure_functions.get(self.nodes.data(handle).measure_function)
    }

    pub fn baseline_function(&self, node: LayoutNode) -> Option<&BaselineFunction> {
        let handle = self.node_handle(node);
        self.baseline_functions.get(self.nodes.data(handle).baseline_function)
    }

    pub fn has_measure_function(&self, node: LayoutNode) -> bool {
        self.measure_function(node).is_some()
    }

    pub fn has_baseline_function(&self, node: LayoutNode) -> bool {
        self.baseline_function(node).is_some()
    }

    /// Associate (or clear) the external object that owns `node`.
    ///
    /// The reference is weak: the node never keeps its owner alive.
    pub fn set_owner(&mut self, node: LayoutNode, owner: Option<OwnerRef>) {
        let handle = self.node_handle(node);
        let data = self.nodes.data_mut(handle);
        if owner.is_none() && (data.measure_function != 0 || data.baseline_function != 0) {
            log::warn!("owner cleared on {node:?} while measure/baseline functions are still set");
        }
        self.owners.update(&mut data.owner, owner);
    }

    /// The owner, if one was set and is still alive.
    pub fn owner(&self, node: LayoutNode) -> Option<Arc<dyn Any + Send + Sync>> {
        let handle = self.node_handle(node);
        self.owners.get(self.nodes.data(handle).owner).and_then(Weak::upgrade)
    }

    /// The owner downcast to its concrete type.
    pub fn owner_as<T: Any + Send + Sync>(&self, node: LayoutNode) -> Option<Arc<T>> {
        self.owner(node).and_then(|owner| owner.downcast::<T>().ok())
    }

    // =========================================================================
    // LIFECYCLE / PROBES
    // =========================================================================

    /// Release every node's child list, then both stores.
    ///
    /// Idempotent; also runs on drop. Afterwards creation fails with
    /// [`LayoutError::Disposed`] and destruction is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.frees.disposed.store(true, Ordering::Release);
        registry::unregister(self.id);

        let live: Vec<Handle> = self.nodes.live_handles().collect();
        for handle in live {
            self.nodes.data_mut(handle).children = None;
        }

        self.nodes.dispose();
        self.configs.dispose();
        self.measure_functions.clear();
        self.baseline_functions.clear();
        self.owners.clear();
        self.frees.take();
        log::debug!("layout manager {} disposed", self.id.get());
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Live node slots, including destroyed nodes not yet reclaimed.
    pub fn node_count(&self) -> usize {
        self.nodes.live_count()
    }

    pub fn high_water_mark(&self) -> usize {
        self.nodes.high_water_mark()
    }

    pub fn chunk_count(&self) -> usize {
        self.nodes.chunk_count()
    }

    pub fn pending_free_count(&self) -> usize {
        self.frees.len()
    }

    // =========================================================================
    // HANDLE VALIDATION
    // =========================================================================

    /// Whether `node` is a live node of this manager.
    pub fn contains(&self, node: LayoutNode) -> bool {
        node.manager_id() == self.id && self.nodes.is_live(node.handle())
    }

    /// Handle of a node of this manager. Panics on a foreign node; the store
    /// panics on a stale one.
    pub(super) fn node_handle(&self, node: LayoutNode) -> Handle {
        assert!(
            node.manager_id() == self.id,
            "{node:?} does not belong to layout manager {}",
            self.id.get()
        );
        node.handle()
    }

    /// Handle of a live node, as a `Result`.
    pub(super) fn live_handle(&self, node: LayoutNode) -> Result<Handle> {
        if self.disposed {
            return Err(LayoutError::Disposed);
        }
        if self.contains(node) {
            Ok(node.handle())
        } else {
            Err(LayoutError::StaleHandle(node.handle()))
        }
    }
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LayoutManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for LayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutManager")
            .field("id", &self.id)
            .field("nodes", &self.nodes.live_count())
            .field("configs", &self.configs.len())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Size, StyleValue};

    #[test]
    fn test_create_node_uses_default_config() {
        let mut manager = LayoutManager::new();
        let node = manager.create_node().unwrap();
        assert!(!node.is_undefined());
        assert_eq!(manager.node_config(node), manager.default_config());
        assert_eq!(manager.node_count(), 1);
    }

    #[test]
    fn test_create_node_from_copies_style() {
        let mut manager = LayoutManager::new();
        let source = manager.create_node().unwrap();
        manager.style_mut(source).flex_grow = 2.0;
        manager.dimensions_mut(source).width = StyleValue::point(42.0);

        let clone = manager.create_node_from(source).unwrap();
        assert_ne!(clone, source);
        assert_ne!(clone.handle(), source.handle());
        assert_eq!(manager.style(clone), manager.style(source));
        assert_eq!(manager.dimensions(clone), manager.dimensions(source));
        assert_eq!(manager.node_config(clone), manager.node_config(source));
    }

    #[test]
    fn test_destroy_is_deferred_until_drain() {
        let mut manager = LayoutManager::new();
        let mut node = manager.create_node().unwrap();
        let copy = node;

        manager.destroy_node(&mut node);
        assert!(node.is_undefined());
        assert_eq!(manager.pending_free_count(), 1);
        assert!(manager.contains(copy));

        manager.collect();
        assert_eq!(manager.pending_free_count(), 0);
        assert!(!manager.contains(copy));
    }

    #[test]
    fn test_create_drains_pending_frees() {
        let mut manager = LayoutManager::new();
        let mut node = manager.create_node().unwrap();
        let index = node.handle().index();
        manager.destroy_node(&mut node);

        let reused = manager.create_node().unwrap();
        assert_eq!(reused.handle().index(), index);
        assert_eq!(manager.high_water_mark(), 1);
    }

    #[test]
    fn test_try_free_skips_when_locked() {
        let mut manager = LayoutManager::new();
        let mut node = manager.create_node().unwrap();
        let copy = node;
        manager.destroy_node(&mut node);

        let frees = Arc::clone(&manager.frees);
        let guard = frees.stack.lock().unwrap();
        manager.try_free_nodes();
        drop(guard);
        assert!(manager.contains(copy));

        manager.try_free_nodes();
        assert!(!manager.contains(copy));
    }

    #[test]
    fn test_destroy_releases_children_and_parent_link() {
        let mut manager = LayoutManager::new();
        let root = manager.create_node().unwrap();
        let mut middle = manager.create_node().unwrap();
        let leaf = manager.create_node().unwrap();
        manager.insert_child(root, 0, middle).unwrap();
        manager.insert_child(middle, 0, leaf).unwrap();

        manager.destroy_node(&mut middle);
        assert_eq!(manager.child_count(root), 0);
        assert!(manager.parent(leaf).is_undefined());
    }

    #[test]
    fn test_destroy_twice_through_copies_is_harmless() {
        let mut manager = LayoutManager::new();
        let mut a = manager.create_node().unwrap();
        let mut b = a;
        manager.destroy_node(&mut a);
        manager.destroy_node(&mut b);
        manager.collect();
        assert_eq!(manager.node_count(), 0);

        // Slot reused once, not twice.
        let x = manager.create_node().unwrap();
        let y = manager.create_node().unwrap();
        assert_ne!(x.handle().index(), y.handle().index());
    }

    #[test]
    fn test_destroy_foreign_node_resets_variable_only() {
        let mut manager = LayoutManager::new();
        let mut other = LayoutManager::new();
        let foreign = other.create_node().unwrap();

        let mut variable = foreign;
        manager.destroy_node(&mut variable);
        assert!(variable.is_undefined());
        assert_eq!(manager.pending_free_count(), 0);
        assert!(other.contains(foreign));
    }

    #[test]
    fn test_disposed_manager_ignores_destroy_and_rejects_create() {
        let mut manager = LayoutManager::new();
        let mut node = manager.create_node().unwrap();
        let queue = manager.destroy_queue();
        manager.dispose();
        manager.dispose();

        manager.destroy_node(&mut node);
        assert!(node.is_undefined());
        queue.destroy(node);
        assert_eq!(manager.pending_free_count(), 0);
        assert_eq!(manager.create_node(), Err(LayoutError::Disposed));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut manager = LayoutManager::with_options(ManagerOptions {
            node_capacity: Some(1),
            ..ManagerOptions::default()
        });
        manager.create_node().unwrap();
        assert_eq!(
            manager.create_node(),
            Err(LayoutError::CapacityExceeded { capacity: 1 })
        );
    }

    #[test]
    fn test_callbacks_round_trip_and_free_with_node() {
        let mut manager = LayoutManager::new();
        let owner: Arc<dyn Any + Send + Sync> = Arc::new(String::from("owner"));
        let mut node = manager.create_node().unwrap();
        manager.set_owner(node, Some(Arc::downgrade(&owner)));
        manager.set_measure_function(node, Some(Arc::new(|_, _, _, _, _| Size::new(1.0, 2.0))));
        manager.set_baseline_function(node, Some(Arc::new(|_, _, height: f32| height / 2.0)));

        assert!(manager.has_measure_function(node));
        assert!(manager.has_baseline_function(node));
        assert_eq!(
            manager.owner_as::<String>(node).as_deref().map(String::as_str),
            Some("owner")
        );

        manager.destroy_node(&mut node);
        manager.collect();
        assert!(manager.measure_functions.is_empty());
        assert!(manager.baseline_functions.is_empty());
        assert!(manager.owners.is_empty());
    }

    #[test]
    fn test_owner_is_weak() {
        let mut manager = LayoutManager::new();
        let node = manager.create_node().unwrap();
        let owner: Arc<dyn Any + Send + Sync> = Arc::new(5_u32);
        manager.set_owner(node, Some(Arc::downgrade(&owner)));
        assert!(manager.owner(node).is_some());

        drop(owner);
        assert!(manager.owner(node).is_none());
    }

    #[test]
    #[should_panic(expected = "does not belong to layout manager")]
    fn test_foreign_node_panics() {
        let mut a = LayoutManager::new();
        let b = LayoutManager::new();
        let node = a.create_node().unwrap();
        let _ = b.style(node);
    }
}
