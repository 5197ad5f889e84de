//! Data stores - chunked, slab-allocated component storage keyed by handle.
//!
//! Storage is split in two layers:
//!
//! - [`SlotAllocator`] hands out handles: a LIFO free list first, then a
//!   growing high-water mark. Each slot carries a generation that is bumped
//!   on free.
//! - [`ComponentArray`] holds one record type in fixed-size chunks. Growing
//!   appends a chunk; existing chunks never move.
//!
//! [`DataStore`] pairs one allocator with one component array (configs).
//! [`NodeStore`] pairs one allocator with the seven parallel node arrays.

use crate::error::{LayoutError, Result};

use super::handle::Handle;
use super::records::{
    ComputedLayout, LayoutCache, LayoutStyle, NodeData, StyleDimensions, StyleEdges,
};

/// Records per chunk.
pub const CHUNK_SIZE: usize = 256;

// =============================================================================
// SLOT ALLOCATOR
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    generation: u32,
    live: bool,
}

/// Index allocation with free-list reuse and per-slot generations.
#[derive(Debug)]
pub struct SlotAllocator {
    /// Slot 0 is a permanent placeholder for [`Handle::UNDEFINED`].
    slots: Vec<SlotState>,
    free: Vec<u32>,
    live: usize,
    capacity: Option<usize>,
}

impl SlotAllocator {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            slots: vec![SlotState::default()],
            free: Vec::new(),
            live: 0,
            capacity,
        }
    }

    /// Take a slot from the free list, or grow.
    pub fn allocate(&mut self) -> Result<Handle> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if let Some(capacity) = self.capacity {
                    if self.high_water_mark() >= capacity {
                        return Err(LayoutError::CapacityExceeded { capacity });
                    }
                }
                self.slots.push(SlotState {
                    generation: 0,
                    live: false,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.live = true;
        self.live += 1;
        Ok(Handle::new(index, slot.generation))
    }

    /// Return a slot to the free list. Returns false for stale handles.
    pub fn free(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.live = false;
        self.live -= 1;
        self.free.push(handle.index());
        true
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        if handle.is_undefined() {
            return false;
        }
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|slot| slot.live && slot.generation == handle.generation())
    }

    /// Slot index for a live handle.
    pub fn checked_index(&self, handle: Handle) -> Option<usize> {
        self.is_live(handle).then_some(handle.index() as usize)
    }

    /// Number of slots ever created (excluding the reserved slot 0).
    pub fn high_water_mark(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Live handles in slot order.
    pub fn live_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.live)
            .map(|(index, slot)| Handle::new(index as u32, slot.generation))
    }

    /// Forget every slot. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.free.clear();
        self.live = 0;
    }
}

// =============================================================================
// COMPONENT ARRAY
// =============================================================================

/// One record type stored in fixed-size chunks.
#[derive(Debug)]
pub struct ComponentArray<T> {
    chunks: Vec<Box<[T]>>,
}

impl<T: Default> ComponentArray<T> {
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Make sure `index` is backed by a chunk.
    pub fn ensure(&mut self, index: usize) {
        while self.chunks.len() * CHUNK_SIZE <= index {
            let chunk: Box<[T]> = (0..CHUNK_SIZE).map(|_| T::default()).collect();
            self.chunks.push(chunk);
        }
    }

    pub fn get(&self, index: usize) -> &T {
        &self.chunks[index / CHUNK_SIZE][index % CHUNK_SIZE]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.chunks[index / CHUNK_SIZE][index % CHUNK_SIZE]
    }

    /// Restore the default record, returning what was stored.
    pub fn take(&mut self, index: usize) -> T {
        std::mem::take(self.get_mut(index))
    }

    pub fn set(&mut self, index: usize, value: T) {
        *self.get_mut(index) = value;
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

impl<T: Default> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DATA STORE (single component)
// =============================================================================

/// Slab storage for one record type.
#[derive(Debug)]
pub struct DataStore<T> {
    slots: SlotAllocator,
    records: ComponentArray<T>,
}

impl<T: Default> DataStore<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            slots: SlotAllocator::new(capacity),
            records: ComponentArray::new(),
        }
    }

    pub fn allocate(&mut self, value: T) -> Result<Handle> {
        let handle = self.slots.allocate()?;
        let index = handle.index() as usize;
        self.records.ensure(index);
        self.records.set(index, value);
        Ok(handle)
    }

    /// Release a slot, returning its record. `None` for stale handles.
    pub fn free(&mut self, handle: Handle) -> Option<T> {
        let index = self.slots.checked_index(handle)?;
        self.slots.free(handle);
        Some(self.records.take(index))
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.slots.is_live(handle)
    }

    pub fn try_get(&self, handle: Handle) -> Option<&T> {
        self.slots.checked_index(handle).map(|index| self.records.get(index))
    }

    pub fn try_get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.slots.checked_index(handle)?;
        Some(self.records.get_mut(index))
    }

    /// Panics on a stale handle.
    pub fn get(&self, handle: Handle) -> &T {
        self.records.get(index_or_panic(&self.slots, handle))
    }

    /// Panics on a stale handle.
    pub fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.records.get_mut(index_or_panic(&self.slots, handle))
    }

    pub fn len(&self) -> usize {
        self.slots.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispose(&mut self) {
        self.records.clear();
        self.slots.clear();
    }
}

fn index_or_panic(slots: &SlotAllocator, handle: Handle) -> usize {
    match slots.checked_index(handle) {
        Some(index) => index,
        None => panic!("stale or undefined layout handle {handle:?}"),
    }
}

// =============================================================================
// NODE STORE (seven parallel components)
// =============================================================================

macro_rules! component_accessors {
    ($($field:ident, $field_mut:ident: $ty:ty;)*) => {
        $(
            /// Panics on a stale handle.
            pub fn $field(&self, handle: Handle) -> &$ty {
                self.$field.get(index_or_panic(&self.slots, handle))
            }

            /// Panics on a stale handle.
            pub fn $field_mut(&mut self, handle: Handle) -> &mut $ty {
                self.$field.get_mut(index_or_panic(&self.slots, handle))
            }
        )*
    };
}

/// Struct-of-arrays storage for layout nodes.
#[derive(Debug)]
pub struct NodeStore {
    slots: SlotAllocator,
    data: ComponentArray<NodeData>,
    style: ComponentArray<LayoutStyle>,
    dimensions: ComponentArray<StyleDimensions>,
    margin: ComponentArray<StyleEdges>,
    border: ComponentArray<StyleEdges>,
    computed: ComponentArray<ComputedLayout>,
    cache: ComponentArray<LayoutCache>,
}

impl NodeStore {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            slots: SlotAllocator::new(capacity),
            data: ComponentArray::new(),
            style: ComponentArray::new(),
            dimensions: ComponentArray::new(),
            margin: ComponentArray::new(),
            border: ComponentArray::new(),
            computed: ComponentArray::new(),
            cache: ComponentArray::new(),
        }
    }

    /// Allocate a slot; `data` goes into the data column, every other column
    /// starts from its default record.
    pub fn allocate(&mut self, data: NodeData) -> Result<Handle> {
        let handle = self.slots.allocate()?;
        let index = handle.index() as usize;

        self.data.ensure(index);
        self.style.ensure(index);
        self.dimensions.ensure(index);
        self.margin.ensure(index);
        self.border.ensure(index);
        self.computed.ensure(index);
        self.cache.ensure(index);

        self.data.set(index, data);
        Ok(handle)
    }

    /// Release a slot and reset every column so the next occupant starts
    /// clean. Returns false for stale handles.
    pub fn free(&mut self, handle: Handle) -> bool {
        let Some(index) = self.slots.checked_index(handle) else {
            return false;
        };
        self.slots.free(handle);

        self.data.take(index);
        self.style.take(index);
        self.dimensions.take(index);
        self.margin.take(index);
        self.border.take(index);
        self.computed.take(index);
        self.cache.take(index);
        true
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.slots.is_live(handle)
    }

    pub fn try_data(&self, handle: Handle) -> Option<&NodeData> {
        self.slots.checked_index(handle).map(|index| self.data.get(index))
    }

    pub fn try_data_mut(&mut self, handle: Handle) -> Option<&mut NodeData> {
        let index = self.slots.checked_index(handle)?;
        Some(self.data.get_mut(index))
    }

    component_accessors! {
        data, data_mut: NodeData;
        style, style_mut: LayoutStyle;
        dimensions, dimensions_mut: StyleDimensions;
        margin, margin_mut: StyleEdges;
        border, border_mut: StyleEdges;
        computed, computed_mut: ComputedLayout;
        cache, cache_mut: LayoutCache;
    }

    pub fn live_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots.live_handles()
    }

    pub fn live_count(&self) -> usize {
        self.slots.live_count()
    }

    pub fn high_water_mark(&self) -> usize {
        self.slots.high_water_mark()
    }

    pub fn chunk_count(&self) -> usize {
        self.data.chunk_count()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.slots.capacity()
    }

    /// Drop every chunk. Callers release per-record resources first.
    pub fn dispose(&mut self) {
        self.data.clear();
        self.style.clear();
        self.dimensions.clear();
        self.margin.clear();
        self.border.clear();
        self.computed.clear();
        self.cache.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StyleValue;

    #[test]
    fn test_allocate_never_returns_undefined() {
        let mut slots = SlotAllocator::new(None);
        for _ in 0..1000 {
            let handle = slots.allocate().unwrap();
            assert!(!handle.is_undefined());
        }
        assert_eq!(slots.high_water_mark(), 1000);
        assert_eq!(slots.live_count(), 1000);
    }

    #[test]
    fn test_free_and_reuse_bumps_generation() {
        let mut slots = SlotAllocator::new(None);
        let a = slots.allocate().unwrap();
        let b = slots.allocate().unwrap();

        assert!(slots.free(a));
        assert!(!slots.is_live(a));
        assert!(slots.is_live(b));

        let c = slots.allocate().unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert!(!slots.is_live(a));
        assert!(slots.is_live(c));
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut slots = SlotAllocator::new(None);
        let a = slots.allocate().unwrap();
        assert!(slots.free(a));
        assert!(!slots.free(a));
        assert_eq!(slots.free_count(), 1);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut slots = SlotAllocator::new(None);
        let handles: Vec<_> = (0..4).map(|_| slots.allocate().unwrap()).collect();
        slots.free(handles[1]);
        slots.free(handles[3]);

        assert_eq!(slots.allocate().unwrap().index(), handles[3].index());
        assert_eq!(slots.allocate().unwrap().index(), handles[1].index());
        assert_eq!(slots.allocate().unwrap().index(), 5);
    }

    #[test]
    fn test_capacity_ceiling() {
        let mut slots = SlotAllocator::new(Some(2));
        let a = slots.allocate().unwrap();
        slots.allocate().unwrap();
        assert_eq!(
            slots.allocate(),
            Err(LayoutError::CapacityExceeded { capacity: 2 })
        );

        // Freed slots are still usable under the ceiling.
        slots.free(a);
        assert!(slots.allocate().is_ok());
    }

    #[test]
    fn test_component_array_grows_by_chunks() {
        let mut array: ComponentArray<u32> = ComponentArray::new();
        array.ensure(0);
        assert_eq!(array.chunk_count(), 1);
        array.ensure(CHUNK_SIZE - 1);
        assert_eq!(array.chunk_count(), 1);
        array.ensure(CHUNK_SIZE);
        assert_eq!(array.chunk_count(), 2);

        array.set(CHUNK_SIZE + 3, 7);
        assert_eq!(*array.get(CHUNK_SIZE + 3), 7);
        assert_eq!(array.take(CHUNK_SIZE + 3), 7);
        assert_eq!(*array.get(CHUNK_SIZE + 3), 0);
    }

    #[test]
    fn test_data_store_roundtrip() {
        let mut store: DataStore<u64> = DataStore::new(None);
        let a = store.allocate(11).unwrap();
        let b = store.allocate(22).unwrap();

        assert_eq!(*store.get(a), 11);
        *store.get_mut(b) += 1;
        assert_eq!(*store.get(b), 23);

        assert_eq!(store.free(a), Some(11));
        assert_eq!(store.free(a), None);
        assert!(store.try_get(a).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    #[should_panic(expected = "stale or undefined layout handle")]
    fn test_stale_handle_panics() {
        let mut store: DataStore<u64> = DataStore::new(None);
        let a = store.allocate(1).unwrap();
        store.free(a);
        store.allocate(2).unwrap();
        let _ = store.get(a);
    }

    #[test]
    fn test_node_store_resets_columns_on_reuse() {
        let mut store = NodeStore::new(None);
        let a = store.allocate(NodeData::default()).unwrap();
        store.style_mut(a).flex_grow = 3.0;
        store.dimensions_mut(a).width = StyleValue::point(50.0);
        store.data_mut(a).children = Some(vec![Handle::UNDEFINED]);

        assert!(store.free(a));
        let b = store.allocate(NodeData::default()).unwrap();
        assert_eq!(b.index(), a.index());
        assert!(store.style(b).flex_grow.is_nan());
        assert!(store.dimensions(b).width.is_auto());
        assert!(store.data(b).children.is_none());
    }

    #[test]
    fn test_node_store_dispose_invalidates_handles() {
        let mut store = NodeStore::new(None);
        let a = store.allocate(NodeData::default()).unwrap();
        store.dispose();
        assert!(!store.is_live(a));
        assert_eq!(store.chunk_count(), 0);
        assert_eq!(store.high_water_mark(), 0);
    }
}
