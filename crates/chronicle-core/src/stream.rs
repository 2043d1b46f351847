//! The per-entity event queue.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::VersionedEvent;

/// Opaque, non-empty stream identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamId(String);

impl StreamId {
    /// Creates a stream id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyStreamId` if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyStreamId);
        }
        Ok(Self(id))
    }

    /// Creates a random (UUID v4) stream id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StreamId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StreamId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StreamId> for String {
    fn from(value: StreamId) -> Self {
        value.0
    }
}

/// Ordered queue of events recorded by one entity but not yet persisted.
///
/// `version` is the highest version ever assigned and is never reset by
/// [`Stream::drain`]; the next recorded event always gets `version + 1`.
#[derive(Debug)]
pub struct Stream<E> {
    id: StreamId,
    stream_type: Option<String>,
    version: i64,
    queue: Vec<VersionedEvent<E>>,
}

impl<E> Stream<E> {
    /// Creates an empty stream at version 0.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyStreamId` if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self::empty(StreamId::new(id)?, None))
    }

    /// Creates an empty stream labelled with `stream_type`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyStreamId` if `id` is empty.
    pub fn with_type(
        id: impl Into<String>,
        stream_type: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self::empty(StreamId::new(id)?, Some(stream_type.into())))
    }

    fn empty(id: StreamId, stream_type: Option<String>) -> Self {
        Self {
            id,
            stream_type: stream_type.filter(|t| !t.is_empty()),
            version: 0,
            queue: Vec::new(),
        }
    }

    /// Hydrates a stream from persisted history.
    ///
    /// The history is left in the pending queue; whoever hydrates the stream
    /// is expected to drain and apply it before handing the entity out.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyHistory` if `history` is empty and
    /// `DomainError::InvalidHistory` if versions are not contiguous.
    pub fn from_history(
        id: StreamId,
        stream_type: Option<String>,
        history: Vec<VersionedEvent<E>>,
    ) -> Result<Self, DomainError> {
        let Some(first) = history.first() else {
            return Err(DomainError::EmptyHistory(id));
        };
        if first.stream_version < 1 {
            return Err(DomainError::InvalidHistory {
                stream_id: id,
                reason: format!("versions start at 1, found {}", first.stream_version),
            });
        }
        let base_version = first.stream_version - 1;
        Self::resume(id, stream_type, base_version, history)
    }

    /// Hydrates a stream whose history continues from `base_version`.
    pub(crate) fn resume(
        id: StreamId,
        stream_type: Option<String>,
        base_version: i64,
        history: Vec<VersionedEvent<E>>,
    ) -> Result<Self, DomainError> {
        let mut expected = base_version + 1;
        for event in &history {
            if event.stream_version != expected {
                return Err(DomainError::InvalidHistory {
                    stream_id: id,
                    reason: format!(
                        "expected version {expected}, found {}",
                        event.stream_version
                    ),
                });
            }
            expected += 1;
        }

        let mut stream = Self::empty(id, stream_type);
        stream.version = expected - 1;
        stream.queue = history;
        Ok(stream)
    }

    /// Returns the stream id.
    #[must_use]
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Returns the stream type, if one was set.
    #[must_use]
    pub fn stream_type(&self) -> Option<&str> {
        self.stream_type.as_deref()
    }

    /// Returns the highest assigned version (0 for a new, empty stream).
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns `true` if events are waiting to be persisted.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Returns and clears the pending queue.
    pub fn drain(&mut self) -> Vec<VersionedEvent<E>> {
        std::mem::take(&mut self.queue)
    }

    /// Enqueues an already applied event as the next version.
    pub(crate) fn record(&mut self, event: E) {
        self.version += 1;
        self.queue.push(VersionedEvent::new(event, self.version));
    }
}
