//! Domain event abstractions.

use crate::error::DomainError;

/// A named, self-applying unit of change for entities of type `T`.
///
/// `apply_to` must be a pure function of the event data and the prior entity
/// state: no I/O, no clocks, no randomness. Events that were accepted once are
/// expected to replay cleanly forever after.
pub trait Event<T>: Send + Sync + std::fmt::Debug {
    /// Identifies the event and the version of its schema, e.g. `"Created_v1"`.
    fn name(&self) -> &'static str;

    /// Applies the event to the entity.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if the event cannot be applied to the current
    /// state of the entity.
    fn apply_to(&self, target: &mut T) -> Result<(), DomainError>;
}

/// An event paired with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEvent<E> {
    /// The event itself.
    pub event: E,
    /// Position of the event in its stream, starting at 1.
    pub stream_version: i64,
}

impl<E> VersionedEvent<E> {
    /// Pairs `event` with `stream_version`.
    #[must_use]
    pub fn new(event: E, stream_version: i64) -> Self {
        Self {
            event,
            stream_version,
        }
    }
}
