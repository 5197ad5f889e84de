//! Managed object store - owned, non-`Copy` payloads behind a `u32` slot.
//!
//! Node records only carry small integers. Callback closures and owner
//! references live here, addressed by the slot number the node keeps in one
//! of its fields. Slot 0 means "no value".

/// Free-list store for values referenced by index from node records.
#[derive(Debug)]
pub struct ManagedObjectStore<T> {
    /// Index 0 is reserved and always `None`.
    values: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> ManagedObjectStore<T> {
    pub fn new() -> Self {
        Self {
            values: vec![None],
            free: Vec::new(),
        }
    }

    /// Value stored at `index`, `None` for index 0.
    pub fn get(&self, index: u32) -> Option<&T> {
        self.values.get(index as usize).and_then(Option::as_ref)
    }

    /// Write `value` into the slot referenced by `index`.
    ///
    /// | `index` | `value` | effect |
    /// |---|---|---|
    /// | nonzero | `Some` | overwrite in place |
    /// | nonzero | `None` | clear the slot, recycle it, set `index` to 0 |
    /// | 0 | `Some` | allocate a slot (free list first), set `index` to it |
    /// | 0 | `None` | nothing |
    pub fn update(&mut self, index: &mut u32, value: Option<T>) {
        match (*index, value) {
            (0, None) => {}
            (0, Some(value)) => {
                *index = match self.free.pop() {
                    Some(slot) => {
                        self.values[slot as usize] = Some(value);
                        slot
                    }
                    None => {
                        self.values.push(Some(value));
                        (self.values.len() - 1) as u32
                    }
                };
            }
            (slot, Some(value)) => {
                self.values[slot as usize] = Some(value);
            }
            (slot, None) => {
                self.values[slot as usize] = None;
                self.free.push(slot);
                *index = 0;
            }
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len() - 1 - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.values.truncate(1);
        self.free.clear();
    }
}

impl<T> Default for ManagedObjectStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
