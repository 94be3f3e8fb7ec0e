// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-target reference identity tracking.
//!
//! During one traversal pass (a *generation*) every reference-typed entry
//! registers the objects it holds under its own path. A later entry holding
//! an object that was first seen elsewhere is an alias of that path.
//!
//! Entries from older generations are never deleted eagerly; they are
//! ignored once the generation has moved on and overwritten on reuse.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::handle::ObjectId;
use crate::path::PropertyPath;
use crate::value::ErasedValue;

/// Per-target values published by a reference entry for mirroring.
pub type PublishedValues = SmallVec<[ErasedValue; 4]>;

/// Generation-stamped map from object identity to first-seen path.
///
/// # Example
///
/// ```rust
/// use understory_binding::{ObjRef, PropertyPath, ReferenceRegistry};
///
/// let shared = ObjRef::new(1_u32);
/// let id = shared.id().unwrap();
///
/// let mut registry = ReferenceRegistry::new();
/// assert!(registry.register(id, PropertyPath::new("root.a")));
/// assert!(!registry.register(id, PropertyPath::new("root.b")));
/// assert_eq!(registry.try_resolve(id).map(PropertyPath::as_str), Some("root.a"));
///
/// registry.advance_generation();
/// assert_eq!(registry.try_resolve(id), None);
/// ```
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    generation: u64,
    paths: HashMap<ObjectId, (u64, PropertyPath)>,
    published: HashMap<PropertyPath, (u64, PublishedValues)>,
}

impl ReferenceRegistry {
    /// Creates an empty registry at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generation.
    #[must_use]
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation, invalidating every entry.
    pub fn advance_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Records `id` at `path` unless it was already recorded this generation.
    ///
    /// Returns `true` if the entry was newly recorded.
    pub fn register(&mut self, id: ObjectId, path: PropertyPath) -> bool {
        if self.try_resolve(id).is_some() {
            return false;
        }
        tracing::trace!(?id, %path, "reference registered");
        self.paths.insert(id, (self.generation, path));
        true
    }

    /// Records `id` at `path`, replacing any entry from this generation.
    pub fn force_register(&mut self, id: ObjectId, path: PropertyPath) {
        self.paths.insert(id, (self.generation, path));
    }

    /// Returns the path `id` was recorded at this generation.
    #[must_use]
    pub fn try_resolve(&self, id: ObjectId) -> Option<&PropertyPath> {
        match self.paths.get(&id) {
            Some((generation, path)) if *generation == self.generation => Some(path),
            _ => None,
        }
    }

    /// Publishes the per-target values held by the entry at `path`.
    pub fn publish(&mut self, path: PropertyPath, values: PublishedValues) {
        self.published.insert(path, (self.generation, values));
    }

    /// Returns the per-target values published at `path` this generation.
    #[must_use]
    pub fn published(&self, path: &PropertyPath) -> Option<&[ErasedValue]> {
        match self.published.get(path) {
            Some((generation, values)) if *generation == self.generation => {
                Some(values.as_slice())
            }
            _ => None,
        }
    }

    /// Returns the number of identities recorded this generation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths
            .values()
            .filter(|(generation, _)| *generation == self.generation)
            .count()
    }

    /// Returns `true` if nothing was recorded this generation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops entries from older generations.
    pub fn prune(&mut self) {
        let current = self.generation;
        self.paths.retain(|_, (generation, _)| *generation == current);
        self.published.retain(|_, (generation, _)| *generation == current);
    }
}
