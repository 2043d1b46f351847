//! In-memory implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use chronicle_core::clock::{Clock, SystemClock};
use chronicle_core::entity::{Entity, reconstruct, reconstruct_from_snapshot};
use chronicle_core::error::DomainError;
use chronicle_core::event::VersionedEvent;
use chronicle_core::snapshot::{Snapshot, SnapshotEntity, SnapshotPolicy, VersionedSnapshot};
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;

/// Configuration for [`InMemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryStoreConfig {
    /// Versions between two snapshots; `0` disables snapshotting.
    pub snapshot_every_n_versions: i64,
}

impl InMemoryStoreConfig {
    /// Returns the snapshot policy described by this configuration.
    #[must_use]
    pub const fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy::every(self.snapshot_every_n_versions)
    }
}

type TakeSnapshot<T> = fn(&T) -> Arc<dyn Snapshot<T>>;

struct StoredEvent<E> {
    event: VersionedEvent<E>,
    stored_at: DateTime<Utc>,
}

struct StoredStream<T: Entity> {
    stream_type: Option<String>,
    events: Vec<StoredEvent<T::Event>>,
    snapshots: Vec<VersionedSnapshot<Arc<dyn Snapshot<T>>>>,
}

impl<T: Entity> StoredStream<T> {
    fn new(stream_type: Option<String>) -> Self {
        Self {
            stream_type,
            events: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    fn version(&self) -> i64 {
        self.events.last().map_or(0, |e| e.event.stream_version)
    }

    fn last_snapshot_version(&self) -> i64 {
        self.snapshots.last().map_or(0, |s| s.stream_version)
    }
}

/// Event store keeping every stream in process memory.
///
/// Intended for tests and prototyping. All access goes through a single
/// `RwLock`, so concurrent saves to the same stream are serialized and the
/// loser observes a `VersionConflict`.
pub struct InMemoryStore<T: Entity> {
    streams: RwLock<HashMap<StreamId, StoredStream<T>>>,
    config: InMemoryStoreConfig,
    clock: Arc<dyn Clock>,
    take_snapshot: Option<TakeSnapshot<T>>,
}

impl<T: Entity + 'static> InMemoryStore<T> {
    /// Creates an empty store without snapshot support.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            config: InMemoryStoreConfig::default(),
            clock: Arc::new(SystemClock),
            take_snapshot: None,
        }
    }

    /// Uses `clock` to stamp stored events.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the number of events stored for `id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store lock is poisoned.
    pub fn event_count(&self, id: &StreamId) -> Result<usize, DomainError> {
        let streams = self.read()?;
        Ok(streams.get(id).map_or(0, |s| s.events.len()))
    }

    /// Returns the number of streams holding at least one event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store lock is poisoned.
    pub fn stream_count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }

    /// Returns the versions at which snapshots of `id` were taken, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store lock is poisoned.
    pub fn snapshot_versions(&self, id: &StreamId) -> Result<Vec<i64>, DomainError> {
        let streams = self.read()?;
        Ok(streams
            .get(id)
            .map(|s| s.snapshots.iter().map(|v| v.stream_version).collect())
            .unwrap_or_default())
    }

    /// Returns when each stored event of `id` was written, in version order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store lock is poisoned.
    pub fn stored_at(&self, id: &StreamId) -> Result<Vec<DateTime<Utc>>, DomainError> {
        let streams = self.read()?;
        Ok(streams
            .get(id)
            .map(|s| s.events.iter().map(|e| e.stored_at).collect())
            .unwrap_or_default())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<StreamId, StoredStream<T>>>, DomainError>
    {
        self.streams
            .read()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".to_owned()))
    }
}

impl<T> InMemoryStore<T>
where
    T: SnapshotEntity + 'static,
{
    /// Creates a store that snapshots entities according to `config`.
    #[must_use]
    pub fn with_snapshots(config: InMemoryStoreConfig) -> Self {
        Self {
            config,
            take_snapshot: Some(|entity: &T| -> Arc<dyn Snapshot<T>> {
                Arc::new(entity.snapshot())
            }),
            ..Self::new()
        }
    }
}

impl<T: Entity + 'static> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> fmt::Debug for InMemoryStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("snapshots", &self.take_snapshot.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> EventStore<T> for InMemoryStore<T>
where
    T: Entity + 'static,
    T::Event: Clone,
{
    #[tracing::instrument(skip(self, id), fields(stream_id = %id), err)]
    async fn load(&self, id: &StreamId) -> Result<T, DomainError> {
        let streams = self.read()?;
        let stored = streams
            .get(id)
            .ok_or_else(|| DomainError::StreamNotFound(id.clone()))?;

        let snapshot = self
            .take_snapshot
            .and(stored.snapshots.last())
            .map(|s| VersionedSnapshot::new(Arc::clone(&s.snapshot), s.stream_version));

        let history = stored
            .events
            .iter()
            .filter(|e| {
                snapshot
                    .as_ref()
                    .is_none_or(|s| e.event.stream_version > s.stream_version)
            })
            .map(|e| e.event.clone())
            .collect();

        match snapshot {
            Some(snapshot) => {
                debug!(snapshot_version = snapshot.stream_version, "loading from snapshot");
                reconstruct_from_snapshot(id.clone(), stored.stream_type.clone(), snapshot, history)
            }
            None => reconstruct(id.clone(), stored.stream_type.clone(), history),
        }
    }

    #[tracing::instrument(skip(self, entity), fields(stream_id = %entity.stream().id()), err)]
    async fn save(&self, entity: &mut T) -> Result<(), DomainError> {
        let id = entity.stream().id().clone();
        let events = entity.stream_mut().drain();
        let Some(first) = events.first() else {
            return Err(DomainError::NoEventsToSave(id));
        };
        let first_version = first.stream_version;

        let mut streams = self
            .streams
            .write()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".to_owned()))?;
        let current = streams.get(&id).map_or(0, StoredStream::version);
        if first_version <= current {
            return Err(DomainError::VersionConflict {
                stream_id: id,
                version: first_version,
            });
        }
        if first_version != current + 1 {
            return Err(DomainError::InvalidHistory {
                stream_id: id,
                reason: format!("expected version {}, found {first_version}", current + 1),
            });
        }

        let stored = streams
            .entry(id.clone())
            .or_insert_with(|| StoredStream::new(None));
        if stored.stream_type.is_none() {
            stored.stream_type = entity.stream().stream_type().map(str::to_owned);
        }
        let stored_at = self.clock.now();
        let count = events.len();
        stored
            .events
            .extend(events.into_iter().map(|event| StoredEvent { event, stored_at }));
        debug!(count, version = stored.version(), "events committed");

        let policy = self.config.snapshot_policy();
        if let Some(take_snapshot) = self.take_snapshot {
            let version = stored.version();
            if policy.is_due(version, stored.last_snapshot_version()) {
                stored
                    .snapshots
                    .push(VersionedSnapshot::new(take_snapshot(entity), version));
                debug!(version, "snapshot taken");
            }
        }
        Ok(())
    }
}
