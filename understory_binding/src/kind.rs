// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value kinds and the [`Bindable`] trait.
//!
//! Every type a [`ValueEntry`](crate::ValueEntry) can bind declares its
//! [`ValueKind`] statically. The kind picks the conflict rules used by
//! refresh and the assignment rules used by the smart-value setter, and the
//! associated [`Bindable::Structure`] type picks the structural helper
//! (list changer, dictionary handler, or nothing).

use alloc::string::String;
use core::any::TypeId;

use crate::handle::ObjectId;
use crate::structure::Structural;

/// The closed set of value shapes the binder distinguishes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Numbers, booleans, characters, strings.
    Primitive,
    /// Plain data structs compared field by field.
    Aggregate,
    /// Custom types edited as a single unit.
    Atomic,
    /// Shared handles to host objects, compared by identity.
    Reference,
    /// Shared, ordered collections.
    List,
    /// Shared keyed collections.
    Dictionary,
}

impl ValueKind {
    /// Returns `true` for kinds compared by value rather than by identity.
    #[must_use]
    #[inline]
    pub const fn is_value_type(self) -> bool {
        matches!(self, Self::Primitive | Self::Aggregate | Self::Atomic)
    }

    /// Returns `true` for list and dictionary kinds.
    #[must_use]
    #[inline]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Dictionary)
    }
}

/// A type that can be bound across several targets.
///
/// Value kinds only need [`values_equal`](Self::values_equal); the
/// [`bindable_value!`](crate::bindable_value) macro implements the trait for
/// types with a `PartialEq` impl. Reference kinds also report identity,
/// nullness, runtime type and (for collections) element count.
pub trait Bindable: Clone + 'static {
    /// Shape of this type.
    const KIND: ValueKind;

    /// Structural helper created lazily for entries of this type.
    type Structure: Structural<Self>;

    /// Default equality used for conflict and dirty detection.
    ///
    /// A [`KindRegistry`](crate::KindRegistry) override takes precedence.
    fn values_equal(&self, other: &Self) -> bool;

    /// Identity of the referenced object, or `None` for null and value kinds.
    fn object_id(&self) -> Option<ObjectId> {
        None
    }

    /// Returns `true` for a null reference.
    fn is_null(&self) -> bool {
        false
    }

    /// Runtime type of the referenced object, or `None` for null.
    fn runtime_type(&self) -> Option<TypeId> {
        None
    }

    /// Number of elements, for collection kinds.
    fn element_count(&self) -> Option<usize> {
        None
    }
}

/// Implements [`Bindable`] for value types with a `PartialEq` impl.
///
/// ```rust
/// use understory_binding::{Bindable, ValueKind, bindable_value};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Vec2 {
///     x: f32,
///     y: f32,
/// }
///
/// bindable_value!(Vec2 => Aggregate);
///
/// assert_eq!(<Vec2 as Bindable>::KIND, ValueKind::Aggregate);
/// ```
#[macro_export]
macro_rules! bindable_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl $crate::Bindable for $ty {
                const KIND: $crate::ValueKind = $crate::ValueKind::$kind;
                type Structure = ();

                #[inline]
                fn values_equal(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

bindable_value!(
    bool => Primitive,
    char => Primitive,
    i8 => Primitive,
    i16 => Primitive,
    i32 => Primitive,
    i64 => Primitive,
    i128 => Primitive,
    isize => Primitive,
    u8 => Primitive,
    u16 => Primitive,
    u32 => Primitive,
    u64 => Primitive,
    u128 => Primitive,
    usize => Primitive,
    f32 => Primitive,
    f64 => Primitive,
    String => Primitive,
    &'static str => Primitive,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_and_collection_kinds() {
        assert!(ValueKind::Primitive.is_value_type());
        assert!(ValueKind::Aggregate.is_value_type());
        assert!(ValueKind::Atomic.is_value_type());
        assert!(!ValueKind::Reference.is_value_type());
        assert!(ValueKind::List.is_collection());
        assert!(ValueKind::Dictionary.is_collection());
        assert!(!ValueKind::Reference.is_collection());
    }

    #[test]
    fn primitives_compare_by_value() {
        assert!(3_i32.values_equal(&3));
        assert!(!3_i32.values_equal(&4));
        assert!(String::from("a").values_equal(&String::from("a")));
        assert_eq!(1.0_f64.object_id(), None);
        assert!(!1.0_f64.is_null());
    }

    #[test]
    fn nan_is_not_equal_to_itself_by_default() {
        assert!(!f32::NAN.values_equal(&f32::NAN));
    }
}
