// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type equality and key-order overrides.
//!
//! [`Bindable::values_equal`] and `Ord` are the defaults. A host that needs
//! a different rule for some type (tolerant float comparison, natural string
//! ordering for dictionary keys) registers it once at startup in a
//! [`KindRegistryBuilder`]; the resulting [`KindRegistry`] is immutable and
//! shared by every [`EditSession`](crate::EditSession) that uses it.

use core::any::TypeId;
use core::cmp::Ordering;
use core::fmt;

use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::dictionary::DictionaryKey;
use crate::kind::Bindable;
use crate::value::ErasedValue;

/// Equality used for conflict and dirty detection.
pub type EqualityFn<T> = fn(&T, &T) -> bool;

/// Strict total order over dictionary keys.
pub type KeyOrderFn<K> = fn(&K, &K) -> Ordering;

/// Overrides registered for one type.
struct KindRegistration {
    name: &'static str,
    equality: Option<ErasedValue>,
    key_order: Option<ErasedValue>,
}

impl fmt::Debug for KindRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistration")
            .field("name", &self.name)
            .field("has_equality", &self.equality.is_some())
            .field("has_key_order", &self.key_order.is_some())
            .finish()
    }
}

/// Builder for [`KindRegistry`].
///
/// # Example
///
/// ```rust
/// use understory_binding::KindRegistryBuilder;
///
/// let kinds = KindRegistryBuilder::new()
///     .equality::<f32>(|a, b| (a - b).abs() < 1e-4)
///     .key_order::<i32>(|a, b| b.cmp(a))
///     .build();
///
/// assert!(kinds.equality::<f32>()(&1.0, &1.00001));
/// assert!(!kinds.equality::<f64>()(&1.0, &1.00001));
/// assert_eq!(kinds.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct KindRegistryBuilder {
    entries: HashMap<TypeId, KindRegistration>,
}

impl KindRegistryBuilder {
    /// Creates a builder with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registration<T: 'static>(&mut self) -> &mut KindRegistration {
        self.entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| KindRegistration {
                name: core::any::type_name::<T>(),
                equality: None,
                key_order: None,
            })
    }

    /// Overrides equality for values of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if an equality override for `T` is already registered.
    #[must_use]
    pub fn equality<T: Bindable>(mut self, equality: EqualityFn<T>) -> Self {
        let registration = self.registration::<T>();
        assert!(
            registration.equality.is_none(),
            "equality for '{}' is already registered",
            registration.name
        );
        registration.equality = Some(ErasedValue::new(equality));
        self
    }

    /// Overrides the order of dictionary keys of type `K`.
    ///
    /// The function must be a strict total order.
    ///
    /// # Panics
    ///
    /// Panics if a key order for `K` is already registered.
    #[must_use]
    pub fn key_order<K: DictionaryKey>(mut self, order: KeyOrderFn<K>) -> Self {
        let registration = self.registration::<K>();
        assert!(
            registration.key_order.is_none(),
            "key order for '{}' is already registered",
            registration.name
        );
        registration.key_order = Some(ErasedValue::new(order));
        self
    }

    /// Freezes the overrides.
    #[must_use]
    pub fn build(self) -> KindRegistry {
        KindRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable table of per-type overrides.
///
/// Lookups fall back to the type's own rules when nothing is registered.
#[derive(Default)]
pub struct KindRegistry {
    entries: HashMap<TypeId, KindRegistration>,
}

impl KindRegistry {
    /// Creates a registry with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of types with at least one override.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no overrides are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `T` has any override.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the equality used for `T`.
    #[must_use]
    pub fn equality<T: Bindable>(&self) -> EqualityFn<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|r| r.equality.as_ref())
            .and_then(ErasedValue::downcast::<EqualityFn<T>>)
            .unwrap_or(T::values_equal)
    }

    /// Returns the key order used for `K`.
    #[must_use]
    pub fn key_order<K: DictionaryKey>(&self) -> KeyOrderFn<K> {
        self.entries
            .get(&TypeId::of::<K>())
            .and_then(|r| r.key_order.as_ref())
            .and_then(ErasedValue::downcast::<KeyOrderFn<K>>)
            .unwrap_or(K::cmp)
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("count", &self.entries.len())
            .field(
                "types",
                &self.entries.values().map(|r| r.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;

    #[test]
    fn defaults_without_overrides() {
        let kinds = KindRegistry::new();
        assert!(kinds.is_empty());
        assert!(kinds.equality::<i32>()(&1, &1));
        assert!(!kinds.equality::<i32>()(&1, &2));
        assert_eq!(
            kinds.key_order::<String>()(&String::from("a"), &String::from("b")),
            Ordering::Less
        );
    }

    #[test]
    fn overrides_take_precedence() {
        let kinds = KindRegistryBuilder::new()
            .equality::<i32>(|a, b| a % 10 == b % 10)
            .key_order::<String>(|a, b| b.cmp(a))
            .build();

        assert!(kinds.equality::<i32>()(&3, &13));
        assert_eq!(
            kinds.key_order::<String>()(&String::from("a"), &String::from("b")),
            Ordering::Greater
        );
        assert!(kinds.contains::<i32>());
        assert!(!kinds.contains::<u8>());
    }

    #[test]
    fn both_overrides_on_one_type_share_an_entry() {
        let kinds = KindRegistryBuilder::new()
            .equality::<i32>(|a, b| a == b)
            .key_order::<i32>(|a, b| b.cmp(a))
            .build();
        assert_eq!(kinds.len(), 1);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_equality_panics() {
        let _ = KindRegistryBuilder::new()
            .equality::<i32>(|a, b| a == b)
            .equality::<i32>(|a, b| a != b);
    }

    #[test]
    fn debug_lists_types() {
        let kinds = KindRegistryBuilder::new()
            .equality::<f64>(|a, b| a - b < 1e-9 && b - a < 1e-9)
            .build();
        let debug = format!("{kinds:?}");
        assert!(debug.contains("KindRegistry"));
        assert!(debug.contains("f64"));
    }
}
