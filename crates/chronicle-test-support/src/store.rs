//! Test stores — mock `EventStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::entity::{Entity, reconstruct};
use chronicle_core::error::DomainError;
use chronicle_core::event::VersionedEvent;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;

/// An event store that keeps saved batches in memory and records every
/// `save` call. `load` replays everything saved (or seeded) for the id.
pub struct RecordingEventStore<T: Entity> {
    history: Mutex<HashMap<StreamId, (Option<String>, Vec<VersionedEvent<T::Event>>)>>,
    saved: Mutex<Vec<(StreamId, Vec<VersionedEvent<T::Event>>)>>,
}

impl<T> RecordingEventStore<T>
where
    T: Entity,
    T::Event: Clone,
{
    /// Creates an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: Mutex::new(HashMap::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Creates a store that already holds `events` for `id`. Seeded events
    /// are not reported by [`RecordingEventStore::saved_batches`].
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_history(
        self,
        id: StreamId,
        stream_type: Option<String>,
        events: Vec<VersionedEvent<T::Event>>,
    ) -> Self {
        self.history
            .lock()
            .unwrap()
            .insert(id, (stream_type, events));
        self
    }

    /// Returns every batch passed to `save`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_batches(&self) -> Vec<(StreamId, Vec<VersionedEvent<T::Event>>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl<T> Default for RecordingEventStore<T>
where
    T: Entity,
    T::Event: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> EventStore<T> for RecordingEventStore<T>
where
    T: Entity + 'static,
    T::Event: Clone,
{
    async fn load(&self, id: &StreamId) -> Result<T, DomainError> {
        let (stream_type, events) = self
            .history
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default();
        reconstruct(id.clone(), stream_type, events)
    }

    async fn save(&self, entity: &mut T) -> Result<(), DomainError> {
        let id = entity.stream().id().clone();
        let events = entity.stream_mut().drain();
        if events.is_empty() {
            return Err(DomainError::NoEventsToSave(id));
        }

        let mut history = self.history.lock().unwrap();
        let (stream_type, stored) = history.entry(id.clone()).or_default();
        if stream_type.is_none() {
            *stream_type = entity.stream().stream_type().map(str::to_owned);
        }
        stored.extend(events.iter().cloned());
        self.saved.lock().unwrap().push((id, events));
        Ok(())
    }
}

/// An event store that holds nothing: `load` always reports
/// `StreamNotFound` and `save` silently discards the drained events. Useful
/// for testing "not found" scenarios and creation commands.
#[derive(Debug)]
pub struct EmptyEventStore;

#[async_trait]
impl<T: Entity + 'static> EventStore<T> for EmptyEventStore {
    async fn load(&self, id: &StreamId) -> Result<T, DomainError> {
        Err(DomainError::StreamNotFound(id.clone()))
    }

    async fn save(&self, entity: &mut T) -> Result<(), DomainError> {
        entity.stream_mut().drain();
        Ok(())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl<T: Entity + 'static> EventStore<T> for FailingEventStore {
    async fn load(&self, _id: &StreamId) -> Result<T, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save(&self, _entity: &mut T) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An event store whose `save` always loses the optimistic concurrency
/// race. `load` behaves like [`EmptyEventStore`].
#[derive(Debug)]
pub struct ConflictingEventStore;

#[async_trait]
impl<T: Entity + 'static> EventStore<T> for ConflictingEventStore {
    async fn load(&self, id: &StreamId) -> Result<T, DomainError> {
        Err(DomainError::StreamNotFound(id.clone()))
    }

    async fn save(&self, entity: &mut T) -> Result<(), DomainError> {
        let id = entity.stream().id().clone();
        let version = entity
            .stream_mut()
            .drain()
            .first()
            .map_or(entity.stream().version(), |e| e.stream_version);
        Err(DomainError::VersionConflict {
            stream_id: id,
            version,
        })
    }
}
