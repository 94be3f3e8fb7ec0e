// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding errors.
//!
//! Disagreement between targets is never an error; it is reported through
//! [`ValueState`](crate::ValueState). The variants here cover dropped writes
//! and caller mistakes.

use crate::path::PropertyPath;

/// Errors reported by value entries and their structural helpers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// A write was attempted on a read-only entry. The write was dropped.
    #[error("property `{path}` is not editable")]
    NotEditable {
        /// Path of the rejected entry.
        path: PropertyPath,
    },

    /// A weakly-typed value did not match the entry's value type.
    #[error("cannot assign `{found}` to property `{path}` of type `{expected}`")]
    TypeMismatch {
        /// Path of the rejected entry.
        path: PropertyPath,
        /// Declared value type of the entry.
        expected: &'static str,
        /// Runtime type of the rejected value.
        found: &'static str,
    },

    /// A list index was out of range for one of the targets.
    #[error("index {index} is out of range for target {target} (length {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length the target's list will have when the operation runs.
        len: usize,
        /// Offending target.
        target: usize,
    },

    /// A per-target value batch did not have one value per target.
    #[error("expected {expected} per-target values, got {found}")]
    ValueCountMismatch {
        /// Number of targets.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// Changes were applied outside the session's commit phase.
    #[error("changes to `{path}` can only be applied at the commit point")]
    OutsideCommitPoint {
        /// Path of the entry whose changes were held back.
        path: PropertyPath,
    },

    /// A target index did not name one of the entry's targets.
    #[error("target {target} does not exist (target count {count})")]
    UnknownTarget {
        /// Requested target.
        target: usize,
        /// Number of targets.
        count: usize,
    },
}
