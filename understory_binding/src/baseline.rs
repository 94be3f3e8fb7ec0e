// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Baseline (template) modification records.
//!
//! A target may be an instance of a baseline object, such as a prefab. When
//! such a target is changed, the binder emits a [`Modification`] describing
//! how it now diverges from its baseline. How the records are persisted is
//! up to the consumer; they are collected by the
//! [`EditSession`](crate::EditSession) and drained after the commit point.

use alloc::string::String;
use smallvec::SmallVec;

use crate::path::PropertyPath;

/// The set of targets that have a baseline instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Baselines {
    targets: SmallVec<[usize; 4]>,
}

impl Baselines {
    /// Creates an empty set: no target has a baseline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `target` as having a baseline.
    pub fn insert(&mut self, target: usize) {
        if let Err(idx) = self.targets.binary_search(&target) {
            self.targets.insert(idx, target);
        }
    }

    /// Returns `true` if `target` has a baseline.
    #[must_use]
    #[inline]
    pub fn has(&self, target: usize) -> bool {
        self.targets.binary_search(&target).is_ok()
    }

    /// Returns `true` if no target has a baseline.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterates the targets with a baseline, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.targets.iter().copied()
    }
}

impl FromIterator<usize> for Baselines {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut baselines = Self::new();
        for target in iter {
            baselines.insert(target);
        }
        baselines
    }
}

/// A divergence of one target from its baseline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modification {
    /// The value at `path` was changed.
    Value {
        /// Target that diverged.
        target: usize,
        /// Changed property.
        path: PropertyPath,
    },
    /// A key was set on the dictionary at `path`.
    DictionaryKeyAdded {
        /// Target that diverged.
        target: usize,
        /// Dictionary property.
        path: PropertyPath,
        /// Path segment of the key.
        key: String,
    },
    /// A key was removed from the dictionary at `path`.
    DictionaryKeyRemoved {
        /// Target that diverged.
        target: usize,
        /// Dictionary property.
        path: PropertyPath,
        /// Path segment of the key.
        key: String,
    },
    /// The list at `path` now has `len` elements.
    ListLength {
        /// Target that diverged.
        target: usize,
        /// List property.
        path: PropertyPath,
        /// New element count.
        len: usize,
    },
}

impl Modification {
    /// Returns the target this record belongs to.
    #[must_use]
    pub fn target(&self) -> usize {
        match self {
            Self::Value { target, .. }
            | Self::DictionaryKeyAdded { target, .. }
            | Self::DictionaryKeyRemoved { target, .. }
            | Self::ListLength { target, .. } => *target,
        }
    }

    /// Returns the property this record describes.
    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        match self {
            Self::Value { path, .. }
            | Self::DictionaryKeyAdded { path, .. }
            | Self::DictionaryKeyRemoved { path, .. }
            | Self::ListLength { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn baselines_are_sorted_and_deduplicated() {
        let baselines: Baselines = [3, 1, 3, 0].into_iter().collect();
        assert_eq!(baselines.iter().collect::<Vec<_>>(), [0, 1, 3]);
        assert!(baselines.has(1));
        assert!(!baselines.has(2));
        assert!(Baselines::new().is_empty());
    }

    #[test]
    fn modification_accessors() {
        let record = Modification::ListLength {
            target: 2,
            path: PropertyPath::new("root.items"),
            len: 4,
        };
        assert_eq!(record.target(), 2);
        assert_eq!(record.path().as_str(), "root.items");
    }
}
