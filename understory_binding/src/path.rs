// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property paths.
//!
//! A [`PropertyPath`] names one logical property in the edited tree, e.g.
//! `root.items[2]` or `root.lookup{speed}`. Paths are the currency of the
//! [`ReferenceRegistry`](crate::ReferenceRegistry) and of baseline
//! modification records.

use alloc::format;
use alloc::rc::Rc;
use core::fmt;

/// A cheaply clonable property path.
///
/// Segments are joined with `.` for fields, `[i]` for list elements and
/// `{key}` for dictionary entries.
///
/// # Example
///
/// ```rust
/// use understory_binding::PropertyPath;
///
/// let root = PropertyPath::new("root");
/// let items = root.field("items");
/// assert_eq!(items.element(2).as_str(), "root.items[2]");
/// assert_eq!(root.field("lookup").entry("speed").as_str(), "root.lookup{speed}");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyPath(Rc<str>);

impl PropertyPath {
    /// Creates a path from its textual form.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(Rc::from(path))
    }

    /// Returns the textual form of the path.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty path.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path of a named field below this one.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        if self.is_empty() {
            Self::new(name)
        } else {
            Self(Rc::from(format!("{}.{name}", self.0)))
        }
    }

    /// Returns the path of a list element below this one.
    #[must_use]
    pub fn element(&self, index: usize) -> Self {
        Self(Rc::from(format!("{}[{index}]", self.0)))
    }

    /// Returns the path of a dictionary entry below this one.
    #[must_use]
    pub fn entry(&self, key: &str) -> Self {
        Self(Rc::from(format!("{}{{{key}}}", self.0)))
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyPath").field(&&*self.0).finish()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
