//! Dirty-field tracking.
//!
//! A record needs reindexing only when one of its *observed* fields changed
//! since it was last saved. Two strategies implement [`ChangeTracker`]:
//!
//! - [`ChangedFields`] keeps its own set of changed field names. Record
//!   setters report every assignment through [`ChangedFields::assign`] or
//!   [`ChangedFields::track`].
//! - [`NativeDirtyBridge`] delegates to dirty flags the host persistence layer
//!   already maintains ([`NativeDirtyState`]).
//!
//! The strategy is fixed per record type through
//! [`SearchableRecord::Tracker`](crate::model::SearchableRecord::Tracker).
//!
//! ```rust
//! use searchsync_fts::tracker::{ChangeTracker, ChangedFields, ObservedFields};
//!
//! let observed = ObservedFields::new(["title", "body"]);
//! let mut changes = ChangedFields::new(observed);
//!
//! let mut title = String::from("Draft");
//! changes.assign("title", &mut title, "Final".to_string());
//! assert!(changes.needs_update(Some("title")));
//!
//! changes.clear_changed();
//! assert!(!changes.needs_update(None));
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

/// Fields whose mutation can trigger a reindex.
///
/// Cheap to clone; every record instance of a type shares the same set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedFields(Arc<BTreeSet<String>>);

impl ObservedFields {
    /// Build the set from field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(fields.into_iter().map(Into::into).collect()))
    }

    /// Returns `true` if `field` is observed.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    /// Iterate observed field names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of observed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing is observed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decides whether a record instance needs its index entry refreshed.
pub trait ChangeTracker: Send + Sync {
    /// With no field: whether any observed field changed.
    /// With a field: whether that field changed.
    fn needs_update(&self, field: Option<&str>) -> bool;

    /// Forget recorded changes. Called after every save; idempotent.
    fn clear_changed(&mut self);
}

// ============================================================================
// Self-made strategy
// ============================================================================

/// Standalone change set fed by the record's setters.
#[derive(Debug, Clone, Default)]
pub struct ChangedFields {
    observed: ObservedFields,
    changed: BTreeSet<String>,
}

impl ChangedFields {
    /// Create an empty change set for the given observed fields.
    pub fn new(observed: ObservedFields) -> Self {
        Self {
            observed,
            changed: BTreeSet::new(),
        }
    }

    /// Record an assignment of `new` over `current`.
    ///
    /// The field is recorded only if it is observed and the values differ.
    /// Returns whether the field is recorded as changed afterwards.
    pub fn track<V>(&mut self, field: &str, current: &V, new: &V) -> bool
    where
        V: PartialEq + ?Sized,
    {
        if !self.observed.contains(field) {
            return false;
        }
        if current != new && !self.changed.contains(field) {
            log::trace!("Field '{field}' changed");
            self.changed.insert(field.to_string());
        }
        self.changed.contains(field)
    }

    /// Track and perform an assignment in one step.
    pub fn assign<T: PartialEq>(&mut self, field: &str, slot: &mut T, value: T) {
        self.track(field, &*slot, &value);
        *slot = value;
    }

    /// Changed field names in sorted order.
    pub fn changed(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// The observed fields this set reports on.
    pub fn observed(&self) -> &ObservedFields {
        &self.observed
    }
}

impl ChangeTracker for ChangedFields {
    fn needs_update(&self, field: Option<&str>) -> bool {
        match field {
            Some(field) => self.changed.contains(field),
            None => !self.changed.is_empty(),
        }
    }

    fn clear_changed(&mut self) {
        self.changed.clear();
    }
}

// ============================================================================
// Bridge strategy
// ============================================================================

/// Dirty flags maintained by the host persistence layer.
pub trait NativeDirtyState: Send + Sync {
    /// Whether `field` differs from its persisted value.
    fn is_dirty(&self, field: &str) -> bool;

    /// Reset dirty flags. Hosts usually do this themselves after a save, so
    /// the default does nothing.
    fn clear(&mut self) {}
}

/// [`ChangeTracker`] backed by the host's own dirty tracking.
#[derive(Debug, Clone)]
pub struct NativeDirtyBridge<S> {
    observed: ObservedFields,
    native: S,
}

impl<S: NativeDirtyState> NativeDirtyBridge<S> {
    /// Wrap the host's dirty state.
    pub fn new(observed: ObservedFields, native: S) -> Self {
        Self { observed, native }
    }

    /// The wrapped host state.
    pub fn native(&self) -> &S {
        &self.native
    }

    /// Mutable access to the wrapped host state.
    pub fn native_mut(&mut self) -> &mut S {
        &mut self.native
    }
}

impl<S: NativeDirtyState> ChangeTracker for NativeDirtyBridge<S> {
    fn needs_update(&self, field: Option<&str>) -> bool {
        match field {
            Some(field) => self.native.is_dirty(field),
            None => self.observed.iter().any(|f| self.native.is_dirty(f)),
        }
    }

    fn clear_changed(&mut self) {
        self.native.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
