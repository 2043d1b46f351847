//! Domain error types.

use thiserror::Error;

use crate::stream::StreamId;

/// Top-level error type shared by streams, entities, codecs and stores.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A stream identifier was empty.
    #[error("stream id must not be empty")]
    EmptyStreamId,

    /// A stream was hydrated from an empty history.
    #[error("no events to load stream {0} from")]
    EmptyHistory(StreamId),

    /// A history was out of order or had gaps.
    #[error("invalid history for stream {stream_id}: {reason}")]
    InvalidHistory {
        /// The stream being hydrated.
        stream_id: StreamId,
        /// What was wrong with the history.
        reason: String,
    },

    /// No events or snapshots exist for the stream.
    #[error("stream not found: {0}")]
    StreamNotFound(StreamId),

    /// Optimistic concurrency conflict: the version is already taken.
    #[error("version conflict on stream {stream_id}: version {version} already exists")]
    VersionConflict {
        /// The stream that had the conflict.
        stream_id: StreamId,
        /// The first version that could not be written.
        version: i64,
    },

    /// `save` was called on an entity without pending events.
    #[error("no events to save for stream {0}")]
    NoEventsToSave(StreamId),

    /// A business rule rejected the operation before anything was recorded.
    #[error("validation error: {0}")]
    Validation(String),

    /// A previously accepted event failed to apply while rebuilding an entity.
    #[error("failed to replay {event_name} at version {version} of stream {stream_id}: {reason}")]
    Replay {
        /// The stream being rebuilt.
        stream_id: StreamId,
        /// Version of the event (or snapshot) that failed.
        version: i64,
        /// Name of the event (or snapshot) that failed.
        event_name: String,
        /// The underlying failure.
        reason: String,
    },

    /// An event name is not registered with the codec.
    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A schema adapter failed to build or run a statement.
    #[error("schema error: {0}")]
    Schema(String),

    /// Invalid store or codec configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for [`DomainError::StreamNotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StreamNotFound(_))
    }

    /// Returns `true` for [`DomainError::VersionConflict`].
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}
