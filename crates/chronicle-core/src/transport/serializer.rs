//! Byte-level serializers consumed by persistent stores.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::mapper::Mapper;
use super::marshaler::{JsonMarshaler, Marshaler};
use crate::entity::Entity;
use crate::error::DomainError;
use crate::snapshot::{Snapshot, SnapshotEntity};
use crate::stream::StreamId;

/// Encodes the events of entity `T` to bytes: mapper first, then marshaler.
pub struct EventSerializer<T: Entity> {
    mapper: Box<dyn Mapper<T>>,
    marshaler: Box<dyn Marshaler>,
}

impl<T: Entity> EventSerializer<T> {
    /// Combines `mapper` and `marshaler`.
    pub fn new(mapper: impl Mapper<T> + 'static, marshaler: impl Marshaler + 'static) -> Self {
        Self {
            mapper: Box::new(mapper),
            marshaler: Box::new(marshaler),
        }
    }

    /// Encodes `event` as stored in `stream_id`.
    ///
    /// # Errors
    ///
    /// Propagates mapper and marshaler failures.
    pub fn to_bytes(&self, stream_id: &StreamId, event: &T::Event) -> Result<Vec<u8>, DomainError> {
        let value = self.mapper.to_transport(stream_id, event)?;
        self.marshaler.marshal(stream_id, &value)
    }

    /// Decodes an event stored under `name`.
    ///
    /// # Errors
    ///
    /// Propagates mapper and marshaler failures.
    pub fn from_bytes(
        &self,
        stream_id: &StreamId,
        name: &str,
        bytes: &[u8],
    ) -> Result<T::Event, DomainError> {
        let value = self.marshaler.unmarshal(stream_id, bytes)?;
        self.mapper.from_transport(stream_id, name, value)
    }
}

impl<T: Entity> fmt::Debug for EventSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSerializer")
            .field("marshaler", &self.marshaler)
            .finish_non_exhaustive()
    }
}

/// Snapshot persistence for stores that only know `T: Entity`.
///
/// [`SnapshotSerializer`] is the implementation; stores hold it boxed so the
/// snapshot capability stays optional.
pub trait SnapshotCodec<T>: Send + Sync {
    /// Takes a snapshot of `entity` and encodes it, returning the snapshot
    /// name alongside the bytes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the snapshot cannot be encoded.
    fn encode(&self, stream_id: &StreamId, entity: &T)
    -> Result<(&'static str, Vec<u8>), DomainError>;

    /// Decodes a snapshot stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the bytes do not decode to a
    /// snapshot of that name.
    fn decode(
        &self,
        stream_id: &StreamId,
        name: &str,
        bytes: &[u8],
    ) -> Result<Box<dyn Snapshot<T>>, DomainError>;
}

/// Encodes the snapshots of entity `T` with a marshaler.
pub struct SnapshotSerializer<T> {
    marshaler: Box<dyn Marshaler>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SnapshotSerializer<T> {
    /// Creates a serializer using `marshaler`.
    pub fn new(marshaler: impl Marshaler + 'static) -> Self {
        Self {
            marshaler: Box::new(marshaler),
            _entity: PhantomData,
        }
    }
}

impl<T> Default for SnapshotSerializer<T> {
    fn default() -> Self {
        Self::new(JsonMarshaler)
    }
}

impl<T> fmt::Debug for SnapshotSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotSerializer")
            .field("marshaler", &self.marshaler)
            .finish()
    }
}

impl<T> SnapshotCodec<T> for SnapshotSerializer<T>
where
    T: SnapshotEntity + 'static,
    T::Snapshot: Serialize + DeserializeOwned,
{
    fn encode(
        &self,
        stream_id: &StreamId,
        entity: &T,
    ) -> Result<(&'static str, Vec<u8>), DomainError> {
        let snapshot = entity.snapshot();
        let value = serde_json::to_value(&snapshot).map_err(|e| {
            DomainError::Serialization(format!("cannot encode {}: {e}", snapshot.name()))
        })?;
        let bytes = self.marshaler.marshal(stream_id, &value)?;
        Ok((snapshot.name(), bytes))
    }

    fn decode(
        &self,
        stream_id: &StreamId,
        name: &str,
        bytes: &[u8],
    ) -> Result<Box<dyn Snapshot<T>>, DomainError> {
        let value = self.marshaler.unmarshal(stream_id, bytes)?;
        let snapshot: T::Snapshot = serde_json::from_value(value)
            .map_err(|e| DomainError::Serialization(format!("cannot decode {name}: {e}")))?;
        if snapshot.name() != name {
            return Err(DomainError::Serialization(format!(
                "snapshot stored as {name} decodes to {}",
                snapshot.name()
            )));
        }
        Ok(Box::new(snapshot))
    }
}
