// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered keys and deferred mutations for dictionary entries.
//!
//! Dictionaries have no inherent order, but child bindings are addressed by
//! position. The [`DictionaryHandler`] keeps a per-target key list sorted by
//! the session's key order, recomputed at most once per generation, and maps
//! child indices to keys through it.
//!
//! Set and remove operations are queued during traversal and applied in FIFO
//! order at the commit point.

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::Hash;

use smallvec::SmallVec;

use crate::baseline::Modification;
use crate::children::ChildSlots;
use crate::handle::{SharedMap, first_holders};
use crate::kinds::KeyOrderFn;
use crate::path::PropertyPath;
use crate::session::ChangeKind;
use crate::structure::{StructureCx, Structural};

type PerTarget<T> = SmallVec<[T; 4]>;

/// A type usable as a dictionary key.
///
/// Keys are ordered for display by `Ord`, unless a
/// [`KindRegistry`](crate::KindRegistry) overrides the order.
pub trait DictionaryKey: Clone + Eq + Hash + Ord + fmt::Debug + 'static {
    /// Whether [`path_segment`](Self::path_segment) identifies a key stably.
    ///
    /// Baseline modifications are only recorded for path-stable keys;
    /// children of other keys are addressed by position.
    const PATH_STABLE: bool = true;

    /// Returns the segment naming this key in a child path.
    fn path_segment(&self) -> String;
}

macro_rules! display_keys {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DictionaryKey for $ty {
                fn path_segment(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_keys!(
    String,
    &'static str,
    char,
    bool,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
);

/// A queued dictionary mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum DictionaryChange<K, V> {
    /// Insert or replace `key` on every target.
    SetValue {
        /// Key to set.
        key: K,
        /// Value stored on every target.
        value: V,
    },
    /// Remove `key` from every target that has it.
    RemoveKey {
        /// Key to remove.
        key: K,
    },
}

/// Structural helper for dictionary entries.
pub struct DictionaryHandler<K, V> {
    maps: PerTarget<SharedMap<K, V>>,
    keys: PerTarget<Vec<K>>,
    old_keys: PerTarget<Vec<K>>,
    queue: VecDeque<DictionaryChange<K, V>>,
    order: KeyOrderFn<K>,
    generation: u64,
    synced: Option<u64>,
    children_stale: bool,
}

impl<K: DictionaryKey, V: Clone + 'static> DictionaryHandler<K, V> {
    /// Returns `true` if baseline modifications are recorded for this key
    /// type.
    #[must_use]
    #[inline]
    pub fn supports_baseline_modifications(&self) -> bool {
        K::PATH_STABLE
    }

    /// Forces the key lists to be recomputed on next access.
    pub fn force_update(&mut self) {
        self.synced = None;
    }

    /// Returns the key shown at `child` for `target`.
    pub fn get_key(&mut self, target: usize, child: usize) -> Option<&K> {
        self.ensure_keys();
        self.keys.get(target)?.get(child)
    }

    /// Returns the ordered keys of `target`.
    pub fn keys(&mut self, target: usize) -> Option<&[K]> {
        self.ensure_keys();
        self.keys.get(target).map(Vec::as_slice)
    }

    /// Returns the number of keys of `target`.
    pub fn key_count(&mut self, target: usize) -> Option<usize> {
        self.keys(target).map(<[K]>::len)
    }

    /// Queues setting `key` to `value` on every target.
    pub fn queue_set_value(&mut self, key: K, value: V) {
        self.queue.push_back(DictionaryChange::SetValue { key, value });
    }

    /// Queues removal of `key` from every target.
    pub fn queue_remove(&mut self, key: K) {
        self.queue.push_back(DictionaryChange::RemoveKey { key });
    }

    /// Returns the queued changes, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &DictionaryChange<K, V>> + '_ {
        self.queue.iter()
    }

    fn ensure_keys(&mut self) {
        if self.synced == Some(self.generation) {
            return;
        }
        if self.update_keys() {
            self.children_stale = true;
        }
        self.synced = Some(self.generation);
    }

    /// Re-reads and sorts every target's keys. Returns `true` if any key
    /// list differs from the previous one.
    fn update_keys(&mut self) -> bool {
        let order = self.order;
        let mut changed = false;
        for ((map, keys), old) in self
            .maps
            .iter()
            .zip(self.keys.iter_mut())
            .zip(self.old_keys.iter_mut())
        {
            *old = core::mem::replace(keys, sorted_keys(map, order));
            changed |= *old != *keys;
        }
        changed
    }

    fn resync_children(&mut self, path: &PropertyPath, children: &mut ChildSlots) {
        self.children_stale = false;
        let mut present = self
            .maps
            .iter()
            .zip(&self.keys)
            .filter(|(map, _)| !map.is_null())
            .map(|(_, keys)| keys);
        let Some(source) = present.next() else {
            children.clear();
            return;
        };
        let count = present.fold(source.len(), |count, keys| count.min(keys.len()));
        children.rebuild(
            source
                .iter()
                .take(count)
                .enumerate()
                .map(|(index, key)| child_path(path, key, index)),
        );
    }

    fn same_maps(&self, values: &[SharedMap<K, V>]) -> bool {
        self.maps.len() == values.len()
            && self.maps.iter().zip(values).all(|(a, b)| a.id() == b.id())
    }
}

fn sorted_keys<K: Clone, V>(map: &SharedMap<K, V>, order: KeyOrderFn<K>) -> Vec<K> {
    let Some(entries) = map.borrow() else {
        return Vec::new();
    };
    let mut keys: Vec<K> = entries.keys().cloned().collect();
    // Most maps come back already sorted; only sort when an inversion exists.
    if keys
        .windows(2)
        .any(|pair| order(&pair[0], &pair[1]) == Ordering::Greater)
    {
        tracing::trace!(len = keys.len(), "resorting dictionary keys");
        keys.sort_by(order);
    }
    keys
}

fn child_path<K: DictionaryKey>(path: &PropertyPath, key: &K, index: usize) -> PropertyPath {
    if K::PATH_STABLE {
        path.entry(&key.path_segment())
    } else {
        path.entry(&format!("#{index}"))
    }
}

impl<K: DictionaryKey, V: Clone + 'static> Structural<SharedMap<K, V>> for DictionaryHandler<K, V> {
    fn create(target_count: usize) -> Self {
        Self {
            maps: (0..target_count).map(|_| SharedMap::null()).collect(),
            keys: (0..target_count).map(|_| Vec::new()).collect(),
            old_keys: (0..target_count).map(|_| Vec::new()).collect(),
            queue: VecDeque::new(),
            order: K::cmp,
            generation: 0,
            synced: None,
            children_stale: true,
        }
    }

    fn refresh(&mut self, values: &[SharedMap<K, V>], cx: &mut StructureCx<'_>) {
        self.order = cx.session.kinds().key_order::<K>();
        self.generation = cx.session.generation();
        if !self.same_maps(values) {
            self.maps = values.iter().cloned().collect();
            self.synced = None;
        }
        self.ensure_keys();
        if self.children_stale {
            self.resync_children(cx.path, cx.children);
        }
    }

    fn apply_queued(&mut self, values: &[SharedMap<K, V>], cx: &mut StructureCx<'_>) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let path = cx.path;
        let tracked = self.supports_baseline_modifications();
        let holders = first_holders(values, SharedMap::id);
        let mut changed = false;

        while let Some(change) = self.queue.pop_front() {
            match change {
                DictionaryChange::SetValue { key, value } => {
                    let segment = tracked.then(|| key.path_segment());
                    let existing_child = segment
                        .as_ref()
                        .map(|segment| path.entry(segment))
                        .filter(|child| cx.children.find(child).is_some());
                    for (target, &holder) in holders.iter().enumerate() {
                        let Some(mut entries) = values[holder].borrow_mut() else {
                            continue;
                        };
                        if holder == target {
                            entries.insert(key.clone(), value.clone());
                        }
                        drop(entries);
                        changed = true;
                        cx.session.push_event(path, target, ChangeKind::Structure);
                        if let Some(segment) = &segment
                            && cx.baselines.has(target)
                        {
                            cx.session.record(Modification::DictionaryKeyAdded {
                                target,
                                path: path.clone(),
                                key: segment.clone(),
                            });
                            if let Some(child) = &existing_child {
                                cx.session.record(Modification::Value {
                                    target,
                                    path: child.clone(),
                                });
                            }
                        }
                    }
                }
                DictionaryChange::RemoveKey { key } => {
                    let removed: PerTarget<bool> = values
                        .iter()
                        .enumerate()
                        .map(|(target, map)| {
                            holders[target] == target
                                && map
                                    .borrow_mut()
                                    .and_then(|mut entries| entries.remove(&key))
                                    .is_some()
                        })
                        .collect();
                    for (target, &holder) in holders.iter().enumerate() {
                        if !removed[holder] {
                            tracing::trace!(%path, target, ?key, "key already absent");
                            continue;
                        }
                        changed = true;
                        cx.session.push_event(path, target, ChangeKind::Structure);
                        if tracked && cx.baselines.has(target) {
                            cx.session.record(Modification::DictionaryKeyRemoved {
                                target,
                                path: path.clone(),
                                key: key.path_segment(),
                            });
                        }
                    }
                }
            }
        }

        if changed {
            self.maps = values.iter().cloned().collect();
            self.generation = cx.session.generation();
            self.update_keys();
            self.synced = Some(self.generation);
            self.resync_children(path, cx.children);
        }
        tracing::debug!(%path, changed, "dictionary changes applied");
        changed
    }

    fn pending_len(&self) -> usize {
        self.queue.len()
    }

    fn discard_pending(&mut self) {
        self.queue.clear();
    }
}

impl<K: fmt::Debug, V> fmt::Debug for DictionaryHandler<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryHandler")
            .field("keys", &self.keys)
            .field("pending", &self.queue.len())
            .field("synced", &self.synced)
            .finish_non_exhaustive()
    }
}
