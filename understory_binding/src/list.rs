// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred list mutations across targets.
//!
//! A [`ListChanger`] queues add, insert, remove and clear operations while the
//! tree is being traversed, and applies them to every target's list in
//! lock-step at the commit point. Each operation also inserts or removes the
//! matching slot in the owning entry's [`ChildSlots`](crate::ChildSlots), so
//! child bindings never point at a shifted element.
//!
//! The algorithm is written against [`ListBacking`]; [`SharedList`] is the
//! provided backing.

use alloc::collections::VecDeque;
use core::fmt;
use core::marker::PhantomData;

use smallvec::SmallVec;

use crate::baseline::Modification;
use crate::error::BindError;
use crate::handle::{ObjectId, SharedList, first_holders};
use crate::session::ChangeKind;
use crate::structure::{StructureCx, Structural};

type PerTarget<T> = SmallVec<[T; 4]>;

/// Index-level access to one target's list.
///
/// All methods mutate through a shared handle and report null lists by
/// returning `None`/`false`.
pub trait ListBacking: Clone + 'static {
    /// Element type.
    type Element: Clone + 'static;

    /// Returns the identity of the backing list, or `None` for a null list.
    ///
    /// Targets that report the same id share one list, which is mutated once
    /// per operation.
    fn id(&self) -> Option<ObjectId>;

    /// Returns the number of elements, or `None` for a null list.
    fn len(&self) -> Option<usize>;

    /// Appends an element. Returns `false` for a null list.
    fn push(&self, value: Self::Element) -> bool;

    /// Inserts an element at `index`. Returns `false` if nothing was inserted.
    fn insert(&self, index: usize, value: Self::Element) -> bool;

    /// Removes the element at `index`.
    fn remove(&self, index: usize) -> Option<Self::Element>;

    /// Removes every element. Returns `true` if the list was non-empty.
    fn clear(&self) -> bool;
}

impl<E: Clone + 'static> ListBacking for SharedList<E> {
    type Element = E;

    fn id(&self) -> Option<ObjectId> {
        Self::id(self)
    }

    fn len(&self) -> Option<usize> {
        Self::len(self)
    }

    fn push(&self, value: E) -> bool {
        self.borrow_mut().map(|mut items| items.push(value)).is_some()
    }

    fn insert(&self, index: usize, value: E) -> bool {
        match self.borrow_mut() {
            Some(mut items) if index <= items.len() => {
                items.insert(index, value);
                true
            }
            _ => false,
        }
    }

    fn remove(&self, index: usize) -> Option<E> {
        self.borrow_mut()
            .and_then(|mut items| (index < items.len()).then(|| items.remove(index)))
    }

    fn clear(&self) -> bool {
        self.borrow_mut().is_some_and(|mut items| {
            let had_items = !items.is_empty();
            items.clear();
            had_items
        })
    }
}

/// A queued list operation.
#[derive(Clone, Debug, PartialEq)]
pub enum ListOp<E> {
    /// Append one value per target.
    Add(SmallVec<[E; 4]>),
    /// Insert one value per target at `index`.
    InsertAt {
        /// Structural index of the new element.
        index: usize,
        /// One value per target.
        values: SmallVec<[E; 4]>,
    },
    /// Remove the element at this index on every target.
    RemoveAt(usize),
    /// Remove every element on every target.
    Clear,
}

/// Queues structural list operations and applies them at the commit point.
///
/// Indices are validated when an operation is queued, against the length
/// each target's list will have once the operations queued before it have
/// run. A list shared by several targets receives each operation once, so
/// the projection for every target holding it is the projection of that one
/// list.
pub struct ListChanger<L: ListBacking> {
    target_count: usize,
    queue: VecDeque<ListOp<L::Element>>,
    known: PerTarget<Option<usize>>,
    projected: PerTarget<Option<usize>>,
    _backing: PhantomData<fn() -> L>,
}

impl<L: ListBacking> ListChanger<L> {
    /// Returns the queued operations, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &ListOp<L::Element>> + '_ {
        self.queue.iter()
    }

    /// Returns the length `target`'s list will have after the queue runs.
    #[must_use]
    pub fn projected_len(&self, target: usize) -> Option<usize> {
        self.projected.get(target).copied().flatten()
    }

    fn collect_values(
        &self,
        values: impl IntoIterator<Item = L::Element>,
    ) -> Result<PerTarget<L::Element>, BindError> {
        let values: PerTarget<L::Element> = values.into_iter().collect();
        if values.len() == self.target_count {
            Ok(values)
        } else {
            Err(BindError::ValueCountMismatch {
                expected: self.target_count,
                found: values.len(),
            })
        }
    }

    /// Queues an append of one value per target.
    pub fn queue_add(
        &mut self,
        values: impl IntoIterator<Item = L::Element>,
    ) -> Result<(), BindError> {
        let values = self.collect_values(values)?;
        let op = ListOp::Add(values);
        project(&mut self.projected, &op);
        self.queue.push_back(op);
        Ok(())
    }

    /// Queues an insertion of one value per target at `index`.
    pub fn queue_insert_at(
        &mut self,
        index: usize,
        values: impl IntoIterator<Item = L::Element>,
    ) -> Result<(), BindError> {
        let values = self.collect_values(values)?;
        self.check_index(index, |len| index <= len)?;
        let op = ListOp::InsertAt { index, values };
        project(&mut self.projected, &op);
        self.queue.push_back(op);
        Ok(())
    }

    /// Queues removal of the element at `index` on every target.
    pub fn queue_remove_at(&mut self, index: usize) -> Result<(), BindError> {
        self.check_index(index, |len| index < len)?;
        let op = ListOp::RemoveAt(index);
        project(&mut self.projected, &op);
        self.queue.push_back(op);
        Ok(())
    }

    /// Queues removal of every element on every target.
    pub fn queue_clear(&mut self) {
        let op = ListOp::Clear;
        project(&mut self.projected, &op);
        self.queue.push_back(op);
    }

    fn check_index(&self, index: usize, valid: impl Fn(usize) -> bool) -> Result<(), BindError> {
        for (target, len) in self.projected.iter().enumerate() {
            if let Some(len) = *len
                && !valid(len)
            {
                return Err(BindError::IndexOutOfRange { index, len, target });
            }
        }
        Ok(())
    }
}

/// Applies the length effect of `op` to projected per-target lengths.
fn project<E>(projected: &mut [Option<usize>], op: &ListOp<E>) {
    for len in projected.iter_mut().flatten() {
        match op {
            ListOp::Add(_) | ListOp::InsertAt { .. } => *len += 1,
            ListOp::RemoveAt(_) => *len = len.saturating_sub(1),
            ListOp::Clear => *len = 0,
        }
    }
}

fn min_len<L: ListBacking>(values: &[L]) -> usize {
    values.iter().filter_map(L::len).min().unwrap_or(0)
}

fn skip_out_of_range(index: usize, len: usize, target: usize) {
    tracing::error!(
        index,
        len,
        target,
        "skipping list operation with an out-of-range index"
    );
}

impl<L: ListBacking> Structural<L> for ListChanger<L> {
    fn create(target_count: usize) -> Self {
        Self {
            target_count,
            queue: VecDeque::new(),
            known: (0..target_count).map(|_| None).collect(),
            projected: (0..target_count).map(|_| None).collect(),
            _backing: PhantomData,
        }
    }

    fn refresh(&mut self, values: &[L], cx: &mut StructureCx<'_>) {
        self.known = values.iter().map(L::len).collect();
        self.projected.clone_from(&self.known);
        for op in &self.queue {
            project(&mut self.projected, op);
        }
        let path = cx.path;
        cx.children.sync_len(min_len(values), |i| path.element(i));
    }

    fn apply_queued(&mut self, values: &[L], cx: &mut StructureCx<'_>) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let path = cx.path;
        let holders = first_holders(values, L::id);
        let before: PerTarget<Option<usize>> = values.iter().map(L::len).collect();
        let mut touched: PerTarget<bool> = values.iter().map(|_| false).collect();

        while let Some(op) = self.queue.pop_front() {
            let mut applied: PerTarget<bool> = values.iter().map(|_| false).collect();
            let owned = |target: usize| holders[target] == target;
            match op {
                ListOp::Add(items) => {
                    let index = cx.children.len();
                    for (target, (list, item)) in values.iter().zip(items).enumerate() {
                        if owned(target) {
                            applied[target] = list.push(item);
                        }
                    }
                    cx.children.insert(index, path.element(index));
                }
                ListOp::InsertAt { index, values: items } => {
                    for (target, (list, item)) in values.iter().zip(items).enumerate() {
                        let Some(len) = list.len().filter(|_| owned(target)) else {
                            continue;
                        };
                        debug_assert!(index <= len, "insert at {index} past end of {target}");
                        if index <= len {
                            applied[target] = list.insert(index, item);
                        } else {
                            skip_out_of_range(index, len, target);
                        }
                    }
                    if index <= cx.children.len() {
                        cx.children.insert(index, path.element(index));
                    }
                }
                ListOp::RemoveAt(index) => {
                    for (target, list) in values.iter().enumerate() {
                        let Some(len) = list.len().filter(|_| owned(target)) else {
                            continue;
                        };
                        debug_assert!(index < len, "remove at {index} past end of {target}");
                        if index < len {
                            applied[target] = list.remove(index).is_some();
                        } else {
                            skip_out_of_range(index, len, target);
                        }
                    }
                    cx.children.remove(index);
                }
                ListOp::Clear => {
                    for (target, list) in values.iter().enumerate() {
                        if owned(target) {
                            applied[target] = list.clear();
                        }
                    }
                    cx.children.clear();
                }
            }
            for (target, &holder) in holders.iter().enumerate() {
                touched[target] |= applied[holder];
            }
        }
        cx.children.sync_len(min_len(values), |i| path.element(i));

        let mut changed = false;
        for (target, list) in values.iter().enumerate() {
            if !touched[target] {
                continue;
            }
            changed = true;
            cx.session.push_event(path, target, ChangeKind::Structure);
            let len = list.len();
            if len != before[target]
                && let Some(len) = len
                && cx.baselines.has(target)
            {
                cx.session.record(Modification::ListLength {
                    target,
                    path: path.clone(),
                    len,
                });
            }
        }
        self.known = values.iter().map(L::len).collect();
        self.projected.clone_from(&self.known);
        tracing::debug!(%path, changed, "list operations applied");
        changed
    }

    fn pending_len(&self) -> usize {
        self.queue.len()
    }

    fn discard_pending(&mut self) {
        self.queue.clear();
        self.projected.clone_from(&self.known);
    }
}

impl<L: ListBacking> fmt::Debug for ListChanger<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListChanger")
            .field("target_count", &self.target_count)
            .field("pending", &self.queue.len())
            .field("known", &self.known)
            .field("projected", &self.projected)
            .finish_non_exhaustive()
    }
}
