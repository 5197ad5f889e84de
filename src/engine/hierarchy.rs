//! Parent/child tree maintenance.
//!
//! A parent owns an ordered child list (allocated on first insert); each
//! child holds a non-owning parent link and a `next_sibling` link mirroring
//! its successor in that list. Every operation here updates both sides
//! together.

use crate::error::{LayoutError, Result};

use super::handle::{Handle, ManagerId};
use super::manager::LayoutManager;
use super::node::LayoutNode;

// =============================================================================
// CHILD ITERATOR
// =============================================================================

/// Iterator over a node's children in list order.
pub struct Children<'a> {
    manager: ManagerId,
    inner: std::slice::Iter<'a, Handle>,
}

impl Iterator for Children<'_> {
    type Item = LayoutNode;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|&handle| LayoutNode::new(self.manager, handle))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|&handle| LayoutNode::new(self.manager, handle))
    }
}

impl ExactSizeIterator for Children<'_> {}

// =============================================================================
// HIERARCHY OPERATIONS
// =============================================================================

impl LayoutManager {
    /// Insert `child` into `parent`'s child list at `index` (`0..=count`).
    ///
    /// A child that already has a parent is detached from it first. When it
    /// is moved within the same parent, `index` is clamped to the list
    /// length after the detach. Marks `parent` dirty.
    pub fn insert_child(
        &mut self,
        parent: LayoutNode,
        index: usize,
        child: LayoutNode,
    ) -> Result<()> {
        let parent_handle = self.live_handle(parent)?;
        let child_handle = self.live_handle(child)?;

        let count = self.nodes.data(parent_handle).child_count();
        if index > count {
            return Err(LayoutError::ChildIndexOutOfRange { index, count });
        }
        if self.is_ancestor_or_self(child_handle, parent_handle) {
            return Err(LayoutError::WouldCreateCycle);
        }

        self.detach(child_handle);

        let parent_data = self.nodes.data_mut(parent_handle);
        let siblings = parent_data.children.get_or_insert_with(Vec::new);
        let index = index.min(siblings.len());
        siblings.insert(index, child_handle);
        let previous = index.checked_sub(1).map(|i| siblings[i]);
        let next = siblings.get(index + 1).copied().unwrap_or(Handle::UNDEFINED);

        if let Some(previous) = previous {
            self.nodes.data_mut(previous).next_sibling = child_handle;
        }
        let data = self.nodes.data_mut(child_handle);
        data.parent = parent_handle;
        data.next_sibling = next;

        self.mark_dirty(parent);
        Ok(())
    }

    /// Remove and return the child at `index`.
    ///
    /// The child's parent link is only cleared (and `parent` only marked
    /// dirty) when it still points at `parent`; a stale entry left behind by
    /// an earlier reparent is simply dropped from the list.
    pub fn remove_child_at(&mut self, parent: LayoutNode, index: usize) -> Result<LayoutNode> {
        let parent_handle = self.live_handle(parent)?;
        let count = self.nodes.data(parent_handle).child_count();
        if index >= count {
            return Err(LayoutError::ChildIndexOutOfRange { index, count });
        }

        let child = self.unlink_at(parent_handle, index);
        if let Some(data) = self.nodes.try_data_mut(child) {
            if data.parent == parent_handle {
                data.parent = Handle::UNDEFINED;
                data.next_sibling = Handle::UNDEFINED;
                self.mark_dirty(parent);
            }
        }
        Ok(self.wrap(child))
    }

    /// Remove `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&mut self, parent: LayoutNode, child: LayoutNode) -> Result<bool> {
        self.live_handle(parent)?;
        match self.index_of_child(parent, child) {
            Some(index) => self.remove_child_at(parent, index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Remove every child, last to first.
    pub fn clear_children(&mut self, parent: LayoutNode) -> Result<()> {
        let handle = self.live_handle(parent)?;
        while let Some(last) = self.nodes.data(handle).child_count().checked_sub(1) {
            self.remove_child_at(parent, last)?;
        }
        Ok(())
    }

    /// Position of `child` in `parent`'s list, `None` if absent.
    pub fn index_of_child(&self, parent: LayoutNode, child: LayoutNode) -> Option<usize> {
        if parent.manager_id() != self.id || child.manager_id() != self.id {
            return None;
        }
        let children = self.nodes.try_data(parent.handle())?.children.as_ref()?;
        children.iter().position(|&handle| handle == child.handle())
    }

    pub fn child_count(&self, parent: LayoutNode) -> usize {
        self.nodes.data(self.node_handle(parent)).child_count()
    }

    pub fn child_at(&self, parent: LayoutNode, index: usize) -> Option<LayoutNode> {
        let children = self.nodes.data(self.node_handle(parent)).children.as_ref()?;
        children.get(index).map(|&handle| self.wrap(handle))
    }

    /// Children of `parent` in list order.
    pub fn children(&self, parent: LayoutNode) -> Children<'_> {
        let data = self.nodes.data(self.node_handle(parent));
        let children = data.children.as_deref().unwrap_or(&[]);
        Children {
            manager: self.id,
            inner: children.iter(),
        }
    }

    // =========================================================================
    // INTERNAL LINKING
    // =========================================================================

    /// Take the node out of its parent's list and clear its links.
    pub(super) fn detach(&mut self, handle: Handle) {
        let parent = self.nodes.data(handle).parent;
        if parent.is_undefined() {
            return;
        }

        let index = self
            .nodes
            .try_data(parent)
            .and_then(|data| data.children.as_ref())
            .and_then(|children| children.iter().position(|&h| h == handle));
        if let Some(index) = index {
            self.unlink_at(parent, index);
            self.mark_dirty(self.wrap(parent));
        }

        let data = self.nodes.data_mut(handle);
        data.parent = Handle::UNDEFINED;
        data.next_sibling = Handle::UNDEFINED;
    }

    /// Remove list entry `index`, relinking the previous sibling.
    fn unlink_at(&mut self, parent: Handle, index: usize) -> Handle {
        let Some(siblings) = self.nodes.data_mut(parent).children.as_mut() else {
            return Handle::UNDEFINED;
        };
        let removed = siblings.remove(index);
        let previous = index.checked_sub(1).map(|i| siblings[i]);
        let next = siblings.get(index).copied().unwrap_or(Handle::UNDEFINED);

        if let Some(data) = previous.and_then(|h| self.nodes.try_data_mut(h)) {
            data.next_sibling = next;
        }
        removed
    }

    fn is_ancestor_or_self(&self, candidate: Handle, mut node: Handle) -> bool {
        while !node.is_undefined() {
            if node == candidate {
                return true;
            }
            node = match self.nodes.try_data(node) {
                Some(data) => data.parent,
                None => Handle::UNDEFINED,
            };
        }
        false
    }
}
