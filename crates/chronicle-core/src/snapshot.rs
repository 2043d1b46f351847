//! Snapshot support for bounding replay cost.
//!
//! A snapshot is the full state of an entity as of a given stream version.
//! Applying it overwrites entity fields instead of mutating them
//! incrementally. Snapshots share the version space of the events: a snapshot
//! is tagged with the version of the last event it summarizes, and loading
//! replays only events strictly newer than it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainError;

/// Full entity state that can be applied back onto a fresh entity.
pub trait Snapshot<T>: Send + Sync + std::fmt::Debug {
    /// Identifies the snapshot and the version of its schema.
    fn name(&self) -> &'static str;

    /// Overwrites the entity state with the snapshot data.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if the snapshot cannot be applied.
    fn apply_to(&self, target: &mut T) -> Result<(), DomainError>;
}

impl<T, S> Snapshot<T> for Arc<S>
where
    S: Snapshot<T> + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply_to(&self, target: &mut T) -> Result<(), DomainError> {
        (**self).apply_to(target)
    }
}

impl<T, S> Snapshot<T> for Box<S>
where
    S: Snapshot<T> + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply_to(&self, target: &mut T) -> Result<(), DomainError> {
        (**self).apply_to(target)
    }
}

/// A snapshot paired with the stream version it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSnapshot<S> {
    /// The snapshot itself.
    pub snapshot: S,
    /// Version of the last event folded into the snapshot.
    pub stream_version: i64,
}

impl<S> VersionedSnapshot<S> {
    /// Pairs `snapshot` with `stream_version`.
    #[must_use]
    pub fn new(snapshot: S, stream_version: i64) -> Self {
        Self {
            snapshot,
            stream_version,
        }
    }
}

/// Optional extension of [`Entity`] for entities that can be snapshotted.
pub trait SnapshotEntity: Entity {
    /// The snapshot type for this entity.
    type Snapshot: Snapshot<Self> + 'static;

    /// Returns a snapshot of the current state.
    fn snapshot(&self) -> Self::Snapshot;
}

/// How often stores materialize snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPolicy {
    /// Minimum distance in versions between two snapshots; `0` or negative
    /// disables snapshotting.
    pub every_n_versions: i64,
}

impl SnapshotPolicy {
    /// A policy that never snapshots.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            every_n_versions: 0,
        }
    }

    /// A policy that snapshots once `n` versions have accumulated.
    #[must_use]
    pub const fn every(n: i64) -> Self {
        Self {
            every_n_versions: n,
        }
    }

    /// Returns `true` if snapshotting is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.every_n_versions > 0
    }

    /// Decides whether a snapshot is due at `current_version` given the
    /// version of the newest stored snapshot (0 if none).
    #[must_use]
    pub const fn is_due(&self, current_version: i64, last_snapshot_version: i64) -> bool {
        self.is_enabled() && current_version - last_snapshot_version >= self.every_n_versions
    }
}
