// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Binding: one property, many targets.
//!
//! This crate binds a single property path across N target objects edited
//! at once, as in a property inspector with a multi-selection. It reports
//! whether the targets agree, applies writes back to every target, and
//! queues structural edits to lists and dictionaries until a safe commit
//! point.
//!
//! ## Core Concepts
//!
//! ### Value Entries
//!
//! A [`ValueEntry`] holds a per-target working copy of one property. It reads
//! and writes the targets only through a [`ValueStorage`]:
//!
//! - [`refresh`](ValueEntry::refresh) re-reads every target and computes a
//!   [`ValueState`]
//! - [`set_smart_value`](ValueEntry::set_smart_value) assigns across targets
//! - [`apply_changes`](ValueEntry::apply_changes) writes changed slots back
//!
//! ### Kinds
//!
//! Every bindable type implements [`Bindable`] and declares a [`ValueKind`].
//! Value kinds are compared by value; reference kinds ([`ObjRef`],
//! [`SharedList`], [`SharedMap`]) by identity. Equality and dictionary key
//! order can be overridden per type in a [`KindRegistry`].
//!
//! ### Sessions
//!
//! An [`EditSession`] drives one edited tree. Each pass advances its
//! generation, which invalidates the [`ReferenceRegistry`] used to detect
//! objects shared between paths. Writes to targets only happen between
//! [`begin_commit`](EditSession::begin_commit) and
//! [`end_commit`](EditSession::end_commit); [`ChangeEvent`]s and baseline
//! [`Modification`]s are drained afterwards.
//!
//! ### Structural Edits
//!
//! List entries own a [`ListChanger`] and dictionary entries a
//! [`DictionaryHandler`]. Both queue operations during traversal and keep
//! the entry's [`ChildSlots`] aligned with the data when they run.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use understory_binding::{
//!     EditSession, FieldStorage, PropertyPath, SharedList, ValueEntry, ValueState,
//! };
//!
//! struct Panel {
//!     width: f64,
//!     tags: SharedList<&'static str>,
//! }
//!
//! let a = Rc::new(RefCell::new(Panel { width: 10.0, tags: SharedList::new(vec!["a"]) }));
//! let b = Rc::new(RefCell::new(Panel { width: 20.0, tags: SharedList::new(vec!["b"]) }));
//! let panels = vec![a.clone(), b.clone()];
//!
//! let mut width = ValueEntry::new(
//!     PropertyPath::new("panel.width"),
//!     FieldStorage::new(panels.clone(), |p: &Panel| p.width, |p: &mut Panel, w| p.width = w),
//! )
//! .unwrap();
//! let mut tags = ValueEntry::new(
//!     PropertyPath::new("panel.tags"),
//!     FieldStorage::new(panels, |p: &Panel| p.tags.clone(), |p: &mut Panel, t| p.tags = t),
//! )
//! .unwrap();
//!
//! let mut session = EditSession::new();
//!
//! // Traversal: read, then edit the working copies.
//! session.begin_pass();
//! width.refresh(&mut session);
//! tags.refresh(&mut session);
//! assert_eq!(width.state(), Some(ValueState::PrimitiveValueConflict));
//! assert_eq!(tags.state(), Some(ValueState::None));
//!
//! width.set_smart_value(15.0, &session).unwrap();
//! tags.list().unwrap().queue_add(["new", "new"]).unwrap();
//!
//! // Commit point: write everything back.
//! session.begin_commit();
//! width.apply_changes(&mut session).unwrap();
//! tags.apply_changes(&mut session).unwrap();
//! session.end_commit();
//!
//! assert_eq!(b.borrow().width, 15.0);
//! assert_eq!(a.borrow().tags.to_vec(), Some(vec!["a", "new"]));
//! assert_eq!(session.drain_events().len(), 4);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod baseline;
mod children;
mod dictionary;
mod entry;
mod error;
mod handle;
mod kind;
mod kinds;
mod list;
mod path;
mod registry;
mod session;
mod storage;
mod structure;
mod value;

pub use baseline::{Baselines, Modification};
pub use children::{ChildId, ChildSlot, ChildSlots};
pub use dictionary::{DictionaryChange, DictionaryHandler, DictionaryKey};
pub use entry::{ValueEntry, ValueEntryBuilder, ValueState};
pub use error::BindError;
pub use handle::{ObjRef, ObjectId, SharedList, SharedMap};
pub use kind::{Bindable, ValueKind};
pub use kinds::{EqualityFn, KeyOrderFn, KindRegistry, KindRegistryBuilder};
pub use list::{ListBacking, ListChanger, ListOp};
pub use path::PropertyPath;
pub use registry::{PublishedValues, ReferenceRegistry};
pub use session::{ChangeEvent, ChangeKind, EditSession, Phase};
pub use storage::{FieldGetter, FieldSetter, FieldStorage, ValueStorage};
pub use structure::{StructureCx, Structural};
pub use value::ErasedValue;
