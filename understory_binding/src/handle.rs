// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-typed host values.
//!
//! Targets share objects through reference-counted handles, and the binder
//! needs to tell "the same object" apart from "an equal object". The handles
//! here expose a pointer-derived [`ObjectId`] for that purpose:
//!
//! - [`ObjRef`]: a nullable handle to a host object of any type.
//! - [`SharedList`]: a nullable, shared, mutable list.
//! - [`SharedMap`]: a nullable, shared, mutable dictionary.
//!
//! `Option<Rc<T>>` is also bindable as a reference kind.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::dictionary::{DictionaryHandler, DictionaryKey};
use crate::kind::{Bindable, ValueKind};
use crate::list::ListChanger;

/// Identity of a shared host object.
///
/// Two handles have the same id exactly when they point at the same
/// allocation. Ids are only meaningful while the object is alive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>().addr())
    }
}

/// For each target, the index of the first target holding the same object.
///
/// Null handles map to their own index. Structural changes are applied only
/// through the first holder so that a collection shared by several targets is
/// mutated once.
pub(crate) fn first_holders<T>(
    values: &[T],
    id: impl Fn(&T) -> Option<ObjectId>,
) -> SmallVec<[usize; 4]> {
    values
        .iter()
        .enumerate()
        .map(|(target, value)| {
            let Some(object) = id(value) else {
                return target;
            };
            values[..target]
                .iter()
                .position(|other| id(other) == Some(object))
                .unwrap_or(target)
        })
        .collect()
}

/// A nullable handle to a host object.
///
/// # Example
///
/// ```rust
/// use understory_binding::ObjRef;
///
/// let a = ObjRef::new(5_u32);
/// let b = a.clone();
/// let c = ObjRef::new(5_u32);
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.downcast_ref::<u32>(), Some(&5));
/// assert!(ObjRef::null().is_null());
/// ```
#[derive(Clone, Default)]
pub struct ObjRef(Option<Rc<dyn Any>>);

impl ObjRef {
    /// Wraps a new host object.
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    /// Returns the null handle.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Returns `true` for the null handle.
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the identity of the referenced object.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        self.0.as_ref().map(ObjectId::of)
    }

    /// Returns the runtime type of the referenced object.
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.0.as_deref().map(Any::type_id)
    }

    /// Borrows the referenced object as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|object| object.downcast_ref())
    }
}

impl PartialEq for ObjRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ObjRef {}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => f.debug_tuple("ObjRef").field(&id).finish(),
            None => f.write_str("ObjRef(null)"),
        }
    }
}

impl Bindable for ObjRef {
    const KIND: ValueKind = ValueKind::Reference;
    type Structure = ();

    fn values_equal(&self, other: &Self) -> bool {
        self == other
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.id()
    }

    fn is_null(&self) -> bool {
        Self::is_null(self)
    }

    fn runtime_type(&self) -> Option<TypeId> {
        self.type_id()
    }
}

impl<T: ?Sized + 'static> Bindable for Option<Rc<T>> {
    const KIND: ValueKind = ValueKind::Reference;
    type Structure = ();

    fn values_equal(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.as_ref().map(ObjectId::of)
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }

    fn runtime_type(&self) -> Option<TypeId> {
        self.as_ref().map(|_| TypeId::of::<T>())
    }
}

/// A nullable, shared, mutable list.
///
/// Cloning the handle shares the list; use [`SharedList::new`] for a
/// distinct list.
pub struct SharedList<E>(Option<Rc<RefCell<Vec<E>>>>);

impl<E> SharedList<E> {
    /// Creates a new list holding `items`.
    #[must_use]
    pub fn new(items: Vec<E>) -> Self {
        Self(Some(Rc::new(RefCell::new(items))))
    }

    /// Returns the null list.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Returns `true` for the null list.
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the identity of the list.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        self.0.as_ref().map(ObjectId::of)
    }

    /// Returns the number of elements, or `None` for null.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.0.as_ref().map(|cell| cell.borrow().len())
    }

    /// Borrows the elements, or `None` for null.
    #[must_use]
    pub fn borrow(&self) -> Option<Ref<'_, Vec<E>>> {
        self.0.as_ref().map(|cell| cell.borrow())
    }

    /// Mutably borrows the elements, or `None` for null.
    #[must_use]
    pub fn borrow_mut(&self) -> Option<RefMut<'_, Vec<E>>> {
        self.0.as_ref().map(|cell| cell.borrow_mut())
    }
}

impl<E: Clone> SharedList<E> {
    /// Copies the elements out, or `None` for null.
    #[must_use]
    pub fn to_vec(&self) -> Option<Vec<E>> {
        self.borrow().map(|items| items.clone())
    }
}

impl<E> Clone for SharedList<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E> Default for SharedList<E> {
    fn default() -> Self {
        Self::null()
    }
}

impl<E: fmt::Debug> fmt::Debug for SharedList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.borrow() {
            Some(items) => f.debug_tuple("SharedList").field(&*items).finish(),
            None => f.write_str("SharedList(null)"),
        }
    }
}

impl<E: Clone + 'static> Bindable for SharedList<E> {
    const KIND: ValueKind = ValueKind::List;
    type Structure = ListChanger<Self>;

    fn values_equal(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.id()
    }

    fn is_null(&self) -> bool {
        Self::is_null(self)
    }

    fn runtime_type(&self) -> Option<TypeId> {
        self.0.as_ref().map(|_| TypeId::of::<Vec<E>>())
    }

    fn element_count(&self) -> Option<usize> {
        self.len()
    }
}

/// A nullable, shared, mutable dictionary.
///
/// Iteration order of the underlying map is unspecified; the
/// [`DictionaryHandler`] imposes a stable order for display and editing.
pub struct SharedMap<K, V>(Option<Rc<RefCell<HashMap<K, V>>>>);

impl<K: Eq + Hash, V> SharedMap<K, V> {
    /// Creates a new dictionary from key/value pairs.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(Some(Rc::new(RefCell::new(entries.into_iter().collect()))))
    }

    /// Returns `true` if the dictionary holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.borrow().is_some_and(|map| map.contains_key(key))
    }
}

impl<K: Eq + Hash, V: Clone> SharedMap<K, V> {
    /// Clones the value stored at `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.borrow().and_then(|map| map.get(key).cloned())
    }
}

impl<K, V> SharedMap<K, V> {
    /// Returns the null dictionary.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Returns `true` for the null dictionary.
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the identity of the dictionary.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        self.0.as_ref().map(ObjectId::of)
    }

    /// Returns the number of entries, or `None` for null.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.0.as_ref().map(|cell| cell.borrow().len())
    }

    /// Borrows the entries, or `None` for null.
    #[must_use]
    pub fn borrow(&self) -> Option<Ref<'_, HashMap<K, V>>> {
        self.0.as_ref().map(|cell| cell.borrow())
    }

    /// Mutably borrows the entries, or `None` for null.
    #[must_use]
    pub fn borrow_mut(&self) -> Option<RefMut<'_, HashMap<K, V>>> {
        self.0.as_ref().map(|cell| cell.borrow_mut())
    }
}

impl<K, V> Clone for SharedMap<K, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K, V> Default for SharedMap<K, V> {
    fn default() -> Self {
        Self::null()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SharedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.borrow() {
            Some(map) => f.debug_tuple("SharedMap").field(&*map).finish(),
            None => f.write_str("SharedMap(null)"),
        }
    }
}

impl<K: DictionaryKey, V: Clone + 'static> Bindable for SharedMap<K, V> {
    const KIND: ValueKind = ValueKind::Dictionary;
    type Structure = DictionaryHandler<K, V>;

    fn values_equal(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.id()
    }

    fn is_null(&self) -> bool {
        Self::is_null(self)
    }

    fn runtime_type(&self) -> Option<TypeId> {
        self.0.as_ref().map(|_| TypeId::of::<HashMap<K, V>>())
    }

    fn element_count(&self) -> Option<usize> {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    #[test]
    fn first_holders_groups_shared_lists() {
        let shared = SharedList::new(vec![1_u8]);
        let lists = [
            SharedList::null(),
            shared.clone(),
            SharedList::new(vec![1]),
            shared,
            SharedList::null(),
        ];
        assert_eq!(first_holders(&lists, SharedList::id).as_slice(), &[0, 1, 2, 1, 4]);
    }

    #[test]
    fn obj_ref_identity() {
        let a = ObjRef::new(1_u8);
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), ObjRef::new(1_u8).id());
        assert_eq!(ObjRef::null().id(), None);
    }

    #[test]
    fn obj_ref_runtime_type_is_concrete() {
        let a = ObjRef::new(String::from("x"));
        assert_eq!(a.type_id(), Some(TypeId::of::<String>()));
        assert_eq!(a.runtime_type(), Some(TypeId::of::<String>()));
        assert_eq!(ObjRef::null().runtime_type(), None);
    }

    #[test]
    fn rc_option_is_a_reference_kind() {
        let a: Option<Rc<u32>> = Some(Rc::new(3));
        let b = a.clone();
        let c: Option<Rc<u32>> = Some(Rc::new(3));
        assert!(a.values_equal(&b));
        assert!(!a.values_equal(&c));
        assert!(None::<Rc<u32>>.is_null());
    }

    #[test]
    fn shared_list_clones_share_storage() {
        let list = SharedList::new(vec![1, 2]);
        let alias = list.clone();
        alias.borrow_mut().unwrap().push(3);
        assert_eq!(list.to_vec(), Some(vec![1, 2, 3]));
        assert_eq!(list.element_count(), Some(3));
        assert_eq!(SharedList::<u8>::null().len(), None);
    }

    #[test]
    fn shared_map_basics() {
        let map = SharedMap::new([(String::from("a"), 1), (String::from("b"), 2)]);
        assert_eq!(map.len(), Some(2));
        assert_eq!(map.get(&String::from("a")), Some(1));
        assert!(map.contains_key(&String::from("b")));
        assert!(!SharedMap::<String, i32>::null().contains_key(&String::from("a")));
    }
}
