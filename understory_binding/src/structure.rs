// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural helpers owned by value entries.
//!
//! A [`ValueEntry`](crate::ValueEntry) whose value type is a collection owns
//! one [`Structural`] helper, created on its first refresh. The helper queues
//! structural mutations during traversal and applies them when the entry
//! applies its changes at the commit point.

use crate::baseline::Baselines;
use crate::children::ChildSlots;
use crate::path::PropertyPath;
use crate::session::EditSession;

/// Everything a structural helper may touch while refreshing or applying.
#[derive(Debug)]
pub struct StructureCx<'a> {
    /// Path of the owning entry.
    pub path: &'a PropertyPath,
    /// Targets of the owning entry that have a baseline instance.
    pub baselines: &'a Baselines,
    /// The owning entry's child index table.
    pub children: &'a mut ChildSlots,
    /// The session driving the current pass.
    pub session: &'a mut EditSession,
}

/// Per-entry structural helper for values of type `T`.
///
/// `()` is the helper for non-collection types and does nothing.
pub trait Structural<T>: Sized {
    /// Creates the helper for an entry with `target_count` targets.
    fn create(target_count: usize) -> Self;

    /// Observes freshly read per-target values.
    ///
    /// Runs during traversal and must not write to the values.
    fn refresh(&mut self, values: &[T], cx: &mut StructureCx<'_>);

    /// Applies queued mutations to every target in FIFO order.
    ///
    /// Returns `true` if any target changed.
    fn apply_queued(&mut self, values: &[T], cx: &mut StructureCx<'_>) -> bool;

    /// Returns the number of queued mutations.
    fn pending_len(&self) -> usize;

    /// Drops all queued mutations.
    fn discard_pending(&mut self);
}

impl<T> Structural<T> for () {
    fn create(_: usize) -> Self {}

    fn refresh(&mut self, _: &[T], _: &mut StructureCx<'_>) {}

    fn apply_queued(&mut self, _: &[T], _: &mut StructureCx<'_>) -> bool {
        false
    }

    fn pending_len(&self) -> usize {
        0
    }

    fn discard_pending(&mut self) {}
}
