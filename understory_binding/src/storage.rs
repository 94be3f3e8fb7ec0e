// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Access to the real storage behind a value entry.
//!
//! The host owns the edited objects. A [`ValueStorage`] reads and writes one
//! property on each of them; entries only go through this trait, reading on
//! refresh and writing at the commit point.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// Per-target accessor for one property.
pub trait ValueStorage<T> {
    /// Returns the number of targets. Must not change over the storage's life.
    fn target_count(&self) -> usize;

    /// Reads the property from `target`.
    fn read(&self, target: usize) -> T;

    /// Writes the property on `target`.
    fn write(&mut self, target: usize, value: T);
}

/// Reads a field out of a host object.
pub type FieldGetter<H, T> = fn(&H) -> T;

/// Writes a field on a host object.
pub type FieldSetter<H, T> = fn(&mut H, T);

/// A [`ValueStorage`] over a field of shared host objects.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
/// use understory_binding::{FieldStorage, ValueStorage};
///
/// struct Node {
///     width: f32,
/// }
///
/// let a = Rc::new(RefCell::new(Node { width: 1.0 }));
/// let b = Rc::new(RefCell::new(Node { width: 2.0 }));
/// let mut storage = FieldStorage::new(
///     vec![a.clone(), b],
///     |node: &Node| node.width,
///     |node: &mut Node, width| node.width = width,
/// );
///
/// assert_eq!(storage.target_count(), 2);
/// storage.write(0, 5.0);
/// assert_eq!(a.borrow().width, 5.0);
/// ```
pub struct FieldStorage<H, T> {
    targets: Vec<Rc<RefCell<H>>>,
    get: FieldGetter<H, T>,
    set: FieldSetter<H, T>,
}

impl<H, T> FieldStorage<H, T> {
    /// Creates a storage over `targets` using the given accessors.
    #[must_use]
    pub fn new(
        targets: Vec<Rc<RefCell<H>>>,
        get: FieldGetter<H, T>,
        set: FieldSetter<H, T>,
    ) -> Self {
        Self { targets, get, set }
    }

    /// Returns the host objects.
    #[must_use]
    pub fn targets(&self) -> &[Rc<RefCell<H>>] {
        &self.targets
    }
}

impl<H, T> ValueStorage<T> for FieldStorage<H, T> {
    fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn read(&self, target: usize) -> T {
        (self.get)(&self.targets[target].borrow())
    }

    fn write(&mut self, target: usize, value: T) {
        (self.set)(&mut self.targets[target].borrow_mut(), value);
    }
}

impl<H, T> fmt::Debug for FieldStorage<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStorage")
            .field("targets", &self.targets.len())
            .finish_non_exhaustive()
    }
}
