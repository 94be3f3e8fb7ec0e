// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value entries: one property bound across several targets.

use alloc::boxed::Box;
use core::fmt;

use smallvec::SmallVec;

use crate::baseline::{Baselines, Modification};
use crate::children::ChildSlots;
use crate::dictionary::{DictionaryHandler, DictionaryKey};
use crate::error::BindError;
use crate::handle::{SharedList, SharedMap};
use crate::kind::Bindable;
use crate::list::ListChanger;
use crate::path::PropertyPath;
use crate::registry::ReferenceRegistry;
use crate::session::{ChangeKind, EditSession};
use crate::storage::ValueStorage;
use crate::structure::{StructureCx, Structural};
use crate::value::ErasedValue;

type PerTarget<T> = SmallVec<[T; 4]>;

/// Agreement of an entry's targets, computed on refresh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueState {
    /// All targets agree.
    None,
    /// Every target holds a null reference.
    NullReference,
    /// The targets hold an object that was first seen at another path.
    Reference,
    /// Targets disagree on nullness or runtime type.
    ReferenceValueConflict,
    /// Targets alias objects first seen at different paths.
    ReferencePathConflict,
    /// Value-typed targets hold different values.
    PrimitiveValueConflict,
    /// Collections of the same type hold different element counts.
    CollectionLengthConflict,
}

impl ValueState {
    /// Returns `true` for the conflict states.
    #[must_use]
    #[inline]
    pub const fn is_conflict(self) -> bool {
        matches!(
            self,
            Self::ReferenceValueConflict
                | Self::ReferencePathConflict
                | Self::PrimitiveValueConflict
                | Self::CollectionLengthConflict
        )
    }
}

/// Builder for [`ValueEntry`].
pub struct ValueEntryBuilder<T> {
    path: PropertyPath,
    storage: Box<dyn ValueStorage<T>>,
    editable: bool,
    baselines: Baselines,
}

impl<T: Bindable> ValueEntryBuilder<T> {
    /// Replaces the property path given to [`ValueEntry::builder`].
    #[must_use]
    pub fn path(mut self, path: PropertyPath) -> Self {
        self.path = path;
        self
    }

    /// Sets whether writes are accepted. Entries are editable by default.
    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Marks `target` as an instance of a baseline object.
    #[must_use]
    pub fn baseline(mut self, target: usize) -> Self {
        self.baselines.insert(target);
        self
    }

    /// Replaces the set of baseline targets.
    #[must_use]
    pub fn baselines(mut self, baselines: Baselines) -> Self {
        self.baselines = baselines;
        self
    }

    /// Reads the initial values and creates the entry.
    ///
    /// Fails if the storage has no targets or a baseline target does not
    /// exist.
    pub fn build(self) -> Result<ValueEntry<T>, BindError> {
        let count = self.storage.target_count();
        if count == 0 {
            return Err(BindError::UnknownTarget {
                target: 0,
                count: 0,
            });
        }
        if let Some(target) = self.baselines.iter().find(|&target| target >= count) {
            return Err(BindError::UnknownTarget { target, count });
        }
        let current: PerTarget<T> = (0..count)
            .map(|target| self.storage.read(target))
            .collect();
        Ok(ValueEntry {
            path: self.path,
            storage: self.storage,
            original: current.clone(),
            current,
            state: None,
            editable: self.editable,
            baselines: self.baselines,
            structure: None,
            children: ChildSlots::new(),
        })
    }
}

impl<T> fmt::Debug for ValueEntryBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueEntryBuilder")
            .field("path", &self.path)
            .field("targets", &self.storage.target_count())
            .field("editable", &self.editable)
            .field("baselines", &self.baselines)
            .finish()
    }
}

/// One property bound across N targets.
///
/// Holds a per-target working copy of the value. Reads and writes during
/// traversal only touch the working copy; [`apply_changes`] writes it back
/// to the targets at the commit point.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
/// use understory_binding::{EditSession, FieldStorage, PropertyPath, ValueEntry, ValueState};
///
/// struct Node {
///     x: i32,
/// }
///
/// let a = Rc::new(RefCell::new(Node { x: 1 }));
/// let b = Rc::new(RefCell::new(Node { x: 2 }));
/// let storage = FieldStorage::new(
///     vec![a.clone(), b.clone()],
///     |node: &Node| node.x,
///     |node: &mut Node, x| node.x = x,
/// );
///
/// let mut session = EditSession::new();
/// let mut entry = ValueEntry::new(PropertyPath::new("root.x"), storage).unwrap();
///
/// session.begin_pass();
/// entry.refresh(&mut session);
/// assert_eq!(entry.state(), Some(ValueState::PrimitiveValueConflict));
///
/// entry.set_smart_value(5, &session).unwrap();
/// session.begin_commit();
/// assert!(entry.apply_changes(&mut session).unwrap());
/// session.end_commit();
///
/// assert_eq!((a.borrow().x, b.borrow().x), (5, 5));
/// ```
///
/// [`apply_changes`]: Self::apply_changes
pub struct ValueEntry<T: Bindable> {
    path: PropertyPath,
    storage: Box<dyn ValueStorage<T>>,
    original: PerTarget<T>,
    current: PerTarget<T>,
    state: Option<ValueState>,
    editable: bool,
    baselines: Baselines,
    structure: Option<T::Structure>,
    children: ChildSlots,
}

impl<T: Bindable> ValueEntry<T> {
    /// Starts building an entry over `storage`.
    pub fn builder(
        path: PropertyPath,
        storage: impl ValueStorage<T> + 'static,
    ) -> ValueEntryBuilder<T> {
        ValueEntryBuilder {
            path,
            storage: Box::new(storage),
            editable: true,
            baselines: Baselines::new(),
        }
    }

    /// Creates an editable entry with no baselines.
    pub fn new(
        path: PropertyPath,
        storage: impl ValueStorage<T> + 'static,
    ) -> Result<Self, BindError> {
        Self::builder(path, storage).build()
    }

    /// Returns the property path.
    #[must_use]
    #[inline]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Returns the number of targets.
    #[must_use]
    #[inline]
    pub fn target_count(&self) -> usize {
        self.current.len()
    }

    /// Returns the state computed by the last refresh.
    #[must_use]
    #[inline]
    pub fn state(&self) -> Option<ValueState> {
        self.state
    }

    /// Returns `true` if writes are accepted.
    #[must_use]
    #[inline]
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Sets whether writes are accepted.
    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Returns the targets that have a baseline instance.
    #[must_use]
    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    /// Returns the child table of a collection entry.
    #[must_use]
    pub fn children(&self) -> &ChildSlots {
        &self.children
    }

    /// Returns the working values, one per target.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.current
    }

    /// Returns the values as last read from or written to the targets.
    #[must_use]
    pub fn original_values(&self) -> &[T] {
        &self.original
    }

    /// Returns the working value of `target`.
    #[must_use]
    pub fn value(&self, target: usize) -> Option<&T> {
        self.current.get(target)
    }

    /// Returns the first target's working value.
    #[must_use]
    pub fn smart_value(&self) -> &T {
        &self.current[0]
    }

    /// Returns the structural helper, once the entry has been refreshed.
    #[must_use]
    pub fn structure(&self) -> Option<&T::Structure> {
        self.structure.as_ref()
    }

    /// Returns `true` if a value write or structural operation is pending.
    #[must_use]
    pub fn is_dirty(&self, session: &EditSession) -> bool {
        let equal = session.kinds().equality::<T>();
        self.current
            .iter()
            .zip(&self.original)
            .any(|(current, original)| !equal(current, original))
            || self.structure.as_ref().is_some_and(|s| s.pending_len() > 0)
    }

    /// Re-reads every target and recomputes the value state.
    ///
    /// Call once per entry per traversal pass, after
    /// [`EditSession::begin_pass`]. Working values not yet applied are
    /// replaced by what the targets hold.
    pub fn refresh(&mut self, session: &mut EditSession) {
        for (target, (current, original)) in self
            .current
            .iter_mut()
            .zip(self.original.iter_mut())
            .enumerate()
        {
            let value = self.storage.read(target);
            *original = value.clone();
            *current = value;
        }
        self.state = Some(self.compute_state(session));

        let count = self.current.len();
        let structure = self
            .structure
            .get_or_insert_with(|| <T::Structure as Structural<T>>::create(count));
        let mut cx = StructureCx {
            path: &self.path,
            baselines: &self.baselines,
            children: &mut self.children,
            session,
        };
        structure.refresh(&self.current, &mut cx);
    }

    fn compute_state(&self, session: &mut EditSession) -> ValueState {
        let Some((first, rest)) = self.current.split_first() else {
            return ValueState::None;
        };

        if T::KIND.is_value_type() {
            let equal = session.kinds().equality::<T>();
            return if rest.iter().all(|value| equal(first, value)) {
                ValueState::None
            } else {
                ValueState::PrimitiveValueConflict
            };
        }

        if first.is_null() {
            return if rest.iter().all(T::is_null) {
                ValueState::NullReference
            } else {
                ValueState::ReferenceValueConflict
            };
        }

        let references = session.references_mut();
        if let Some(id) = first.object_id() {
            let aliased = references
                .try_resolve(id)
                .filter(|seen_at| **seen_at != self.path)
                .cloned();
            if let Some(seen_at) = aliased {
                return alias_state(&seen_at, rest, references);
            }
            for id in self.current.iter().filter_map(T::object_id) {
                references.force_register(id, self.path.clone());
            }
            references.publish(
                self.path.clone(),
                self.current.iter().cloned().map(ErasedValue::new).collect(),
            );
        }

        let runtime_type = first.runtime_type();
        if rest
            .iter()
            .any(|value| value.is_null() || value.runtime_type() != runtime_type)
        {
            return ValueState::ReferenceValueConflict;
        }
        if T::KIND.is_collection() {
            let count = first.element_count();
            if rest.iter().any(|value| value.element_count() != count) {
                return ValueState::CollectionLengthConflict;
            }
        }
        ValueState::None
    }

    fn ensure_editable(&self) -> Result<(), BindError> {
        if self.editable {
            return Ok(());
        }
        tracing::warn!(path = %self.path, "dropping write to a read-only property");
        Err(BindError::NotEditable {
            path: self.path.clone(),
        })
    }

    fn fill(&mut self, value: &T) {
        for slot in &mut self.current {
            slot.clone_from(value);
        }
    }

    /// Assigns `value` across all targets.
    ///
    /// Value kinds, single-target entries and null are written to every
    /// target. A reference already held at another path this generation is
    /// *mirrored*: each target receives the object that target holds at
    /// that path. Otherwise the reference is shared by every target.
    pub fn set_smart_value(&mut self, value: T, session: &EditSession) -> Result<(), BindError> {
        self.ensure_editable()?;
        if T::KIND.is_value_type() || self.current.len() == 1 || value.is_null() {
            self.fill(&value);
            return Ok(());
        }
        match self.mirrored_values(&value, session.references()) {
            Some(values) => {
                tracing::trace!(path = %self.path, "mirroring reference assignment");
                for (slot, mirrored) in self.current.iter_mut().zip(values) {
                    *slot = mirrored;
                }
            }
            None => self.fill(&value),
        }
        Ok(())
    }

    fn mirrored_values(
        &self,
        value: &T,
        references: &ReferenceRegistry,
    ) -> Option<PerTarget<T>> {
        let seen_at = references.try_resolve(value.object_id()?)?;
        if *seen_at == self.path {
            return None;
        }
        let published = references.published(seen_at)?;
        if published.len() != self.current.len() {
            return None;
        }
        published.iter().map(ErasedValue::downcast::<T>).collect()
    }

    /// Assigns a weakly-typed value across all targets.
    ///
    /// Fails with [`BindError::TypeMismatch`] if `value` is not a `T`.
    pub fn set_smart_value_erased(
        &mut self,
        value: &ErasedValue,
        session: &EditSession,
    ) -> Result<(), BindError> {
        let Some(value) = value.downcast::<T>() else {
            let expected = core::any::type_name::<T>();
            let found = value.type_name();
            tracing::warn!(path = %self.path, expected, found, "dropping write of the wrong type");
            return Err(BindError::TypeMismatch {
                path: self.path.clone(),
                expected,
                found,
            });
        };
        self.set_smart_value(value, session)
    }

    /// Sets the working value of a single target.
    pub fn set_value(&mut self, target: usize, value: T) -> Result<(), BindError> {
        self.ensure_editable()?;
        let count = self.current.len();
        let slot = self
            .current
            .get_mut(target)
            .ok_or(BindError::UnknownTarget { target, count })?;
        *slot = value;
        Ok(())
    }

    /// Drops working values and queued structural operations.
    pub fn discard_pending(&mut self) {
        self.current.clone_from(&self.original);
        if let Some(structure) = self.structure.as_mut() {
            structure.discard_pending();
        }
    }

    /// Writes changed values back to the targets, then applies queued
    /// structural operations.
    ///
    /// Only allowed while the session's commit point is open. Returns `true`
    /// if any target changed.
    pub fn apply_changes(&mut self, session: &mut EditSession) -> Result<bool, BindError> {
        if !session.is_committing() {
            tracing::warn!(path = %self.path, "changes held back outside the commit point");
            return Err(BindError::OutsideCommitPoint {
                path: self.path.clone(),
            });
        }

        let equal = session.kinds().equality::<T>();
        let mut written = 0_usize;
        for target in 0..self.current.len() {
            if equal(&self.current[target], &self.original[target]) {
                continue;
            }
            let value = self.current[target].clone();
            self.storage.write(target, value.clone());
            self.original[target] = value;
            written += 1;
            session.push_event(&self.path, target, ChangeKind::Value);
            if self.baselines.has(target) {
                session.record(Modification::Value {
                    target,
                    path: self.path.clone(),
                });
            }
        }

        let mut changed = written > 0;
        if let Some(structure) = self.structure.as_mut() {
            let mut cx = StructureCx {
                path: &self.path,
                baselines: &self.baselines,
                children: &mut self.children,
                session,
            };
            changed |= structure.apply_queued(&self.current, &mut cx);
        }
        if changed {
            tracing::debug!(path = %self.path, written, "changes applied");
        }
        Ok(changed)
    }
}

fn alias_state<T: Bindable>(
    seen_at: &PropertyPath,
    rest: &[T],
    references: &ReferenceRegistry,
) -> ValueState {
    for value in rest {
        if value.is_null() {
            return ValueState::ReferenceValueConflict;
        }
        let same_path = value
            .object_id()
            .and_then(|id| references.try_resolve(id))
            .is_some_and(|path| path == seen_at);
        if !same_path {
            return ValueState::ReferencePathConflict;
        }
    }
    ValueState::Reference
}

impl<E: Clone + 'static> ValueEntry<SharedList<E>> {
    /// Returns the list changer, once the entry has been refreshed.
    pub fn list(&mut self) -> Option<&mut ListChanger<SharedList<E>>> {
        self.structure.as_mut()
    }
}

impl<K: DictionaryKey, V: Clone + 'static> ValueEntry<SharedMap<K, V>> {
    /// Returns the dictionary handler, once the entry has been refreshed.
    pub fn dictionary(&mut self) -> Option<&mut DictionaryHandler<K, V>> {
        self.structure.as_mut()
    }
}

impl<T: Bindable> fmt::Debug for ValueEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueEntry")
            .field("path", &self.path)
            .field("type", &core::any::type_name::<T>())
            .field("targets", &self.current.len())
            .field("state", &self.state)
            .field("editable", &self.editable)
            .field("baselines", &self.baselines)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ObjRef;
    use crate::storage::FieldStorage;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[derive(Clone, Default)]
    struct Node {
        x: i32,
        target: ObjRef,
        items: SharedList<i32>,
    }

    fn nodes(count: usize) -> Vec<Rc<RefCell<Node>>> {
        (0..count)
            .map(|_| Rc::new(RefCell::new(Node::default())))
            .collect()
    }

    fn x_entry(nodes: &[Rc<RefCell<Node>>]) -> ValueEntry<i32> {
        let storage = FieldStorage::new(nodes.to_vec(), |n: &Node| n.x, |n: &mut Node, x| n.x = x);
        ValueEntry::new(PropertyPath::new("root.x"), storage).unwrap()
    }

    fn target_entry(nodes: &[Rc<RefCell<Node>>], path: &str) -> ValueEntry<ObjRef> {
        let storage = FieldStorage::new(
            nodes.to_vec(),
            |n: &Node| n.target.clone(),
            |n: &mut Node, target| n.target = target,
        );
        ValueEntry::new(PropertyPath::new(path), storage).unwrap()
    }

    fn commit<T: Bindable>(entry: &mut ValueEntry<T>, session: &mut EditSession) -> bool {
        session.begin_commit();
        let changed = entry.apply_changes(session).unwrap();
        session.end_commit();
        changed
    }

    #[test]
    fn build_rejects_empty_storage() {
        let storage = FieldStorage::new(Vec::new(), |n: &Node| n.x, |n: &mut Node, x| n.x = x);
        assert_eq!(
            ValueEntry::new(PropertyPath::new("root.x"), storage).err(),
            Some(BindError::UnknownTarget {
                target: 0,
                count: 0
            })
        );
    }

    #[test]
    fn build_rejects_unknown_baseline_target() {
        let nodes = nodes(2);
        let storage = FieldStorage::new(nodes, |n: &Node| n.x, |n: &mut Node, x| n.x = x);
        let result = ValueEntry::builder(PropertyPath::new("root.x"), storage)
            .baseline(2)
            .build();
        assert_eq!(
            result.err(),
            Some(BindError::UnknownTarget {
                target: 2,
                count: 2
            })
        );
    }

    #[test]
    fn builder_path_overrides_initial_path() {
        let storage = FieldStorage::new(nodes(1), |n: &Node| n.x, |n: &mut Node, x| n.x = x);
        let entry = ValueEntry::builder(PropertyPath::new("draft"), storage)
            .path(PropertyPath::new("root.x"))
            .editable(false)
            .build()
            .unwrap();
        assert_eq!(entry.path(), &PropertyPath::new("root.x"));
        assert!(!entry.is_editable());
    }

    #[test]
    fn agreeing_primitives_have_no_state() {
        let nodes = nodes(3);
        let mut session = EditSession::new();
        let mut entry = x_entry(&nodes);
        session.begin_pass();
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::None));
        assert!(!entry.state().unwrap().is_conflict());
    }

    #[test]
    fn state_is_unknown_before_refresh() {
        let entry = x_entry(&nodes(1));
        assert_eq!(entry.state(), None);
        assert!(entry.structure().is_none());
    }

    #[test]
    fn set_value_targets_one_slot() {
        let nodes = nodes(2);
        let mut session = EditSession::new();
        let mut entry = x_entry(&nodes);
        session.begin_pass();
        entry.refresh(&mut session);

        entry.set_value(1, 9).unwrap();
        assert!(entry.is_dirty(&session));
        assert_eq!(entry.values(), &[0, 9]);
        assert_eq!(entry.original_values(), &[0, 0]);
        assert_eq!(
            entry.set_value(2, 1),
            Err(BindError::UnknownTarget {
                target: 2,
                count: 2
            })
        );

        assert!(commit(&mut entry, &mut session));
        assert_eq!(nodes[0].borrow().x, 0);
        assert_eq!(nodes[1].borrow().x, 9);
        let events = session.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, 1);
        assert_eq!(events[0].kind, ChangeKind::Value);
    }

    #[test]
    fn apply_outside_commit_is_rejected() {
        let nodes = nodes(1);
        let mut session = EditSession::new();
        let mut entry = x_entry(&nodes);
        session.begin_pass();
        entry.refresh(&mut session);
        entry.set_smart_value(4, &session).unwrap();

        assert_eq!(
            entry.apply_changes(&mut session),
            Err(BindError::OutsideCommitPoint {
                path: PropertyPath::new("root.x")
            })
        );
        assert_eq!(nodes[0].borrow().x, 0);
        // The write is still pending and lands at the next commit.
        assert!(commit(&mut entry, &mut session));
        assert_eq!(nodes[0].borrow().x, 4);
    }

    #[test]
    fn read_only_entries_drop_writes() {
        let nodes = nodes(2);
        let storage = FieldStorage::new(nodes.clone(), |n: &Node| n.x, |n: &mut Node, x| n.x = x);
        let mut entry = ValueEntry::builder(PropertyPath::new("root.x"), storage)
            .editable(false)
            .build()
            .unwrap();
        let mut session = EditSession::new();
        session.begin_pass();
        entry.refresh(&mut session);

        assert!(matches!(
            entry.set_smart_value(3, &session),
            Err(BindError::NotEditable { .. })
        ));
        assert!(matches!(
            entry.set_value(0, 3),
            Err(BindError::NotEditable { .. })
        ));
        assert!(!commit(&mut entry, &mut session));
        assert_eq!(nodes[0].borrow().x, 0);
    }

    #[test]
    fn erased_assignment_checks_type() {
        let nodes = nodes(2);
        let mut session = EditSession::new();
        let mut entry = x_entry(&nodes);
        session.begin_pass();
        entry.refresh(&mut session);

        let err = entry
            .set_smart_value_erased(&ErasedValue::new(1.5_f32), &session)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::TypeMismatch {
                path: PropertyPath::new("root.x"),
                expected: "i32",
                found: "f32",
            }
        );

        entry
            .set_smart_value_erased(&ErasedValue::new(7_i32), &session)
            .unwrap();
        assert_eq!(entry.values(), &[7, 7]);
    }

    #[test]
    fn discard_pending_restores_originals() {
        let nodes = nodes(2);
        let mut session = EditSession::new();
        let mut entry = x_entry(&nodes);
        session.begin_pass();
        entry.refresh(&mut session);

        entry.set_smart_value(3, &session).unwrap();
        entry.discard_pending();
        assert!(!entry.is_dirty(&session));
        assert!(!commit(&mut entry, &mut session));
    }

    #[test]
    fn baseline_targets_record_value_modifications() {
        let nodes = nodes(2);
        let storage = FieldStorage::new(nodes, |n: &Node| n.x, |n: &mut Node, x| n.x = x);
        let mut entry = ValueEntry::builder(PropertyPath::new("root.x"), storage)
            .baseline(0)
            .build()
            .unwrap();
        let mut session = EditSession::new();
        session.begin_pass();
        entry.refresh(&mut session);

        entry.set_smart_value(2, &session).unwrap();
        commit(&mut entry, &mut session);
        assert_eq!(
            session.drain_modifications(),
            vec![Modification::Value {
                target: 0,
                path: PropertyPath::new("root.x"),
            }]
        );
    }

    #[test]
    fn null_and_mixed_references() {
        let nodes = nodes(2);
        let mut session = EditSession::new();
        let mut entry = target_entry(&nodes, "root.target");
        session.begin_pass();
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::NullReference));

        nodes[0].borrow_mut().target = ObjRef::new(1_u8);
        session.begin_pass();
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::ReferenceValueConflict));

        nodes[1].borrow_mut().target = ObjRef::new(String::from("other type"));
        session.begin_pass();
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::ReferenceValueConflict));
    }

    #[test]
    fn distinct_objects_of_one_type_agree() {
        let nodes = nodes(2);
        nodes[0].borrow_mut().target = ObjRef::new(1_u8);
        nodes[1].borrow_mut().target = ObjRef::new(2_u8);
        let mut session = EditSession::new();
        let mut entry = target_entry(&nodes, "root.target");
        session.begin_pass();
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::None));
    }

    #[test]
    fn refresh_is_idempotent_within_a_pass() {
        let nodes = nodes(2);
        let shared = ObjRef::new(1_u8);
        for node in &nodes {
            node.borrow_mut().target = shared.clone();
        }
        let mut session = EditSession::new();
        let mut entry = target_entry(&nodes, "root.target");
        session.begin_pass();
        entry.refresh(&mut session);
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::None));
    }

    #[test]
    fn single_target_reference_is_assigned_directly() {
        let nodes = nodes(1);
        let mut session = EditSession::new();
        let mut entry = target_entry(&nodes, "root.target");
        session.begin_pass();
        entry.refresh(&mut session);

        let object = ObjRef::new(3_u8);
        entry.set_smart_value(object.clone(), &session).unwrap();
        commit(&mut entry, &mut session);
        assert_eq!(nodes[0].borrow().target, object);
    }

    #[test]
    fn list_entry_length_conflict_and_changer() {
        let nodes = nodes(2);
        nodes[0].borrow_mut().items = SharedList::new(vec![1, 2]);
        nodes[1].borrow_mut().items = SharedList::new(vec![1]);
        let storage = FieldStorage::new(
            nodes.clone(),
            |n: &Node| n.items.clone(),
            |n: &mut Node, items| n.items = items,
        );
        let mut entry = ValueEntry::new(PropertyPath::new("root.items"), storage).unwrap();
        let mut session = EditSession::new();
        assert!(entry.list().is_none());

        session.begin_pass();
        entry.refresh(&mut session);
        assert_eq!(entry.state(), Some(ValueState::CollectionLengthConflict));
        assert_eq!(entry.children().len(), 1);

        entry.list().unwrap().queue_add([3, 3]).unwrap();
        assert!(entry.is_dirty(&session));
        assert!(commit(&mut entry, &mut session));
        assert_eq!(nodes[0].borrow().items.to_vec(), Some(vec![1, 2, 3]));
        assert_eq!(nodes[1].borrow().items.to_vec(), Some(vec![1, 3]));
        assert_eq!(entry.children().len(), 2);
    }
}
