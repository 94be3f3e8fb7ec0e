// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child index table for collection entries.
//!
//! A collection entry has one child binding per structural position. When an
//! element is inserted or removed, the child bindings after it must shift with
//! the data, otherwise a child would briefly show its neighbour's value.
//! [`ChildSlots`] keeps a stable [`ChildId`] per child; the structural index
//! of a child is its position in the table and its path is re-derived from
//! that position.

use alloc::vec::Vec;

use crate::path::PropertyPath;

/// Stable identity of one child binding.
///
/// The id survives insertions and removals at other positions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildId(u32);

/// One child binding: its identity and its current path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildSlot {
    id: ChildId,
    path: PropertyPath,
}

impl ChildSlot {
    /// Returns the stable id of this child.
    #[must_use]
    #[inline]
    pub fn id(&self) -> ChildId {
        self.id
    }

    /// Returns the current path of this child.
    #[must_use]
    #[inline]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }
}

/// Ordered table of child bindings.
#[derive(Clone, Debug, Default)]
pub struct ChildSlots {
    slots: Vec<ChildSlot>,
    next_id: u32,
}

impl ChildSlots {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of children.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no children.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the child at a structural index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChildSlot> {
        self.slots.get(index)
    }

    /// Returns the structural index of a child.
    #[must_use]
    pub fn index_of(&self, id: ChildId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    /// Returns the structural index of the child at `path`.
    #[must_use]
    pub fn find(&self, path: &PropertyPath) -> Option<usize> {
        self.slots.iter().position(|slot| slot.path == *path)
    }

    /// Iterates the children in structural order.
    pub fn iter(&self) -> impl Iterator<Item = &ChildSlot> + '_ {
        self.slots.iter()
    }

    fn allocate(&mut self, path: PropertyPath) -> ChildSlot {
        let id = ChildId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        ChildSlot { id, path }
    }

    /// Inserts a new child at `index`, shifting later children up.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, path: PropertyPath) -> ChildId {
        let slot = self.allocate(path);
        let id = slot.id;
        self.slots.insert(index, slot);
        id
    }

    /// Removes the child at `index`, shifting later children down.
    pub fn remove(&mut self, index: usize) -> Option<ChildSlot> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    /// Removes every child.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Re-derives every child's path from its structural index.
    pub fn relabel(&mut self, path_at: impl Fn(usize) -> PropertyPath) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.path = path_at(index);
        }
    }

    /// Grows or shrinks the table to `len`, then relabels it.
    ///
    /// Used for index-addressed children (list elements): existing children
    /// keep their ids, new ones are appended, surplus ones are dropped from
    /// the end.
    pub fn sync_len(&mut self, len: usize, path_at: impl Fn(usize) -> PropertyPath) {
        self.slots.truncate(len);
        while self.slots.len() < len {
            let slot = self.allocate(path_at(self.slots.len()));
            self.slots.push(slot);
        }
        self.relabel(path_at);
    }

    /// Replaces the table with children at `paths`, in order.
    ///
    /// Used for key-addressed children (dictionary entries): a child whose
    /// path was already present keeps its id.
    pub fn rebuild(&mut self, paths: impl IntoIterator<Item = PropertyPath>) {
        let mut previous = core::mem::take(&mut self.slots);
        for path in paths {
            let slot = match previous.iter().position(|slot| slot.path == path) {
                Some(idx) => previous.swap_remove(idx),
                None => self.allocate(path),
            };
            self.slots.push(slot);
        }
    }
}
