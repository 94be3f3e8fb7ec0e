// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edit sessions: generations, the commit point, and deferred output.
//!
//! One [`EditSession`] drives all value entries of one edited tree. A UI cycle
//! looks like this:
//!
//! 1. [`begin_pass`](EditSession::begin_pass) starts a new generation.
//!    Entries refresh and are read; writes only touch entry-local state and
//!    structural mutations are queued.
//! 2. [`begin_commit`](EditSession::begin_commit) opens the commit point.
//!    Entries apply their changes to the targets.
//! 3. [`end_commit`](EditSession::end_commit) closes it. The host drains
//!    [`ChangeEvent`]s and baseline [`Modification`]s.
//!
//! Because writes to targets only happen in step 2, a traversal never sees a
//! collection change under it.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::baseline::Modification;
use crate::kinds::KindRegistry;
use crate::path::PropertyPath;
use crate::registry::ReferenceRegistry;

/// What a [`ChangeEvent`] reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The value held by the target was replaced.
    Value,
    /// The target's collection was mutated in place.
    Structure,
}

/// A "value changed" notification for one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Changed property.
    pub path: PropertyPath,
    /// Changed target.
    pub target: usize,
    /// Nature of the change.
    pub kind: ChangeKind,
}

/// Phase of the current UI cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Refreshing and reading entries; targets must not be written.
    #[default]
    Traversal,
    /// Applying queued changes to targets.
    Commit,
}

/// Shared state for all value entries of one edited tree.
///
/// # Example
///
/// ```rust
/// use understory_binding::{EditSession, Phase};
///
/// let mut session = EditSession::new();
/// assert_eq!(session.begin_pass(), 1);
/// assert_eq!(session.phase(), Phase::Traversal);
///
/// session.begin_commit();
/// assert!(session.is_committing());
/// session.end_commit();
/// assert!(session.drain_events().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct EditSession {
    kinds: Rc<KindRegistry>,
    references: ReferenceRegistry,
    phase: Phase,
    events: VecDeque<ChangeEvent>,
    modifications: Vec<Modification>,
}

impl EditSession {
    /// Creates a session with no kind overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session using a shared kind registry.
    #[must_use]
    pub fn with_kinds(kinds: Rc<KindRegistry>) -> Self {
        Self {
            kinds,
            ..Self::default()
        }
    }

    /// Returns the kind registry.
    #[must_use]
    #[inline]
    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Returns the reference registry.
    #[must_use]
    #[inline]
    pub fn references(&self) -> &ReferenceRegistry {
        &self.references
    }

    /// Returns the reference registry mutably.
    #[must_use]
    #[inline]
    pub fn references_mut(&mut self) -> &mut ReferenceRegistry {
        &mut self.references
    }

    /// Returns the current generation.
    #[must_use]
    #[inline]
    pub fn generation(&self) -> u64 {
        self.references.generation()
    }

    /// Returns the current phase.
    #[must_use]
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` while the commit point is open.
    #[must_use]
    #[inline]
    pub fn is_committing(&self) -> bool {
        self.phase == Phase::Commit
    }

    /// Starts a traversal pass and returns its generation.
    pub fn begin_pass(&mut self) -> u64 {
        self.phase = Phase::Traversal;
        let generation = self.references.advance_generation();
        tracing::trace!(generation, "traversal pass started");
        generation
    }

    /// Opens the commit point.
    pub fn begin_commit(&mut self) {
        self.phase = Phase::Commit;
    }

    /// Closes the commit point.
    pub fn end_commit(&mut self) {
        self.phase = Phase::Traversal;
        tracing::debug!(
            events = self.events.len(),
            modifications = self.modifications.len(),
            "commit point closed"
        );
    }

    pub(crate) fn push_event(&mut self, path: &PropertyPath, target: usize, kind: ChangeKind) {
        self.events.push_back(ChangeEvent {
            path: path.clone(),
            target,
            kind,
        });
    }

    pub(crate) fn record(&mut self, modification: Modification) {
        self.modifications.push(modification);
    }

    /// Returns the pending change events, oldest first.
    #[must_use]
    pub fn events(&self) -> &VecDeque<ChangeEvent> {
        &self.events
    }

    /// Takes the pending change events, oldest first.
    pub fn drain_events(&mut self) -> Vec<ChangeEvent> {
        self.events.drain(..).collect()
    }

    /// Returns the pending baseline modifications, oldest first.
    #[must_use]
    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    /// Takes the pending baseline modifications, oldest first.
    pub fn drain_modifications(&mut self) -> Vec<Modification> {
        core::mem::take(&mut self.modifications)
    }
}
