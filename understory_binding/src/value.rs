// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Values whose static type is only known to whoever created them.
//!
//! Entries publish their per-target working values to the
//! [`ReferenceRegistry`](crate::ReferenceRegistry) as [`ErasedValue`]s so that
//! entries of other types can mirror them. The
//! [`KindRegistry`](crate::KindRegistry) stores its per-type function
//! pointers the same way.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

/// A clonable value with its type erased.
///
/// # Example
///
/// ```rust
/// use understory_binding::ErasedValue;
///
/// let value = ErasedValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast::<i32>(), Some(42));
/// assert_eq!(value.downcast_ref::<u8>(), None);
/// assert_eq!(value.type_name(), "i32");
/// ```
pub struct ErasedValue {
    payload: Box<dyn Payload>,
    type_name: &'static str,
}

impl ErasedValue {
    /// Wraps `value`.
    #[must_use]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            payload: Box::new(value),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the wrapped value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Name of the wrapped type, used in mismatch errors.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Clones the wrapped value out as a `T`.
    #[must_use]
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    fn as_any(&self) -> &dyn Any {
        &*self.payload
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.boxed_clone(),
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErasedValue").field(&self.type_name).finish()
    }
}

trait Payload: Any {
    fn boxed_clone(&self) -> Box<dyn Payload>;
}

impl<T: Clone + 'static> Payload for T {
    fn boxed_clone(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;

    #[test]
    fn downcast_to_wrong_type_is_none() {
        let value = ErasedValue::new(1.5_f32);
        assert!(!value.is::<f64>());
        assert_eq!(value.downcast_ref::<f64>(), None);
        assert_eq!(value.downcast::<f32>(), Some(1.5));
        assert_eq!(value.type_id(), TypeId::of::<f32>());
    }

    #[test]
    fn clones_do_not_share_the_payload() {
        let value = ErasedValue::new(String::from("a"));
        let cloned = value.clone();
        assert_eq!(cloned.downcast_ref::<String>().map(String::as_str), Some("a"));
        assert_ne!(
            value.downcast_ref::<String>().map(|s| s.as_ptr()),
            cloned.downcast_ref::<String>().map(|s| s.as_ptr())
        );
    }

    #[test]
    fn function_pointers_round_trip() {
        fn always(_: &u8, _: &u8) -> bool {
            true
        }
        let erased = ErasedValue::new(always as fn(&u8, &u8) -> bool);
        let f = erased.downcast::<fn(&u8, &u8) -> bool>().unwrap();
        assert!(f(&1, &2));
    }

    #[test]
    fn debug_shows_type_name() {
        let value = ErasedValue::new(7_u64);
        assert_eq!(format!("{value:?}"), "ErasedValue(\"u64\")");
    }
}
