//! Event store abstraction.

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::DomainError;
use crate::stream::StreamId;

/// Loads and saves entities of type `T`.
///
/// Backends must honor the same contract:
///
/// - `load` returns `DomainError::StreamNotFound` when nothing is stored for
///   the id, never an empty entity.
/// - `save` drains the entity's stream and persists the batch all-or-nothing.
///   If any drained version is already taken it fails with
///   `DomainError::VersionConflict`; the caller reloads, re-applies its
///   operation and saves again. Stores never retry on their own.
#[async_trait]
pub trait EventStore<T: Entity>: Send + Sync {
    /// Rebuilds the entity stored under `id`.
    async fn load(&self, id: &StreamId) -> Result<T, DomainError>;

    /// Persists the events pending in the entity's stream.
    async fn save(&self, entity: &mut T) -> Result<(), DomainError>;
}
