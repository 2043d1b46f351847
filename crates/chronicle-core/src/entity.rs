//! Entity abstraction and reconstruction from history.

use crate::error::DomainError;
use crate::event::{Event, VersionedEvent};
use crate::snapshot::{Snapshot, VersionedSnapshot};
use crate::stream::{Stream, StreamId};

/// An event-sourced domain object (the "aggregate root").
///
/// The entity owns exactly one [`Stream`] for its whole lifetime. Generic
/// code cannot call an arbitrary constructor, so implementors provide
/// [`Entity::with_stream`] as a factory that builds a blank instance around a
/// stream.
///
/// ```
/// use chronicle_core::entity::Entity;
/// use chronicle_core::error::DomainError;
/// use chronicle_core::event::Event;
/// use chronicle_core::stream::Stream;
///
/// #[derive(Debug)]
/// struct Renamed(String);
///
/// impl Event<User> for Renamed {
///     fn name(&self) -> &'static str {
///         "Renamed_v1"
///     }
///
///     fn apply_to(&self, user: &mut User) -> Result<(), DomainError> {
///         user.name = self.0.clone();
///         Ok(())
///     }
/// }
///
/// struct User {
///     stream: Stream<Renamed>,
///     name: String,
/// }
///
/// impl Entity for User {
///     type Event = Renamed;
///
///     fn stream(&self) -> &Stream<Renamed> {
///         &self.stream
///     }
///
///     fn stream_mut(&mut self) -> &mut Stream<Renamed> {
///         &mut self.stream
///     }
///
///     fn with_stream(stream: Stream<Renamed>) -> Self {
///         Self { stream, name: String::new() }
///     }
/// }
///
/// let mut user: User = chronicle_core::entity::new_entity("user-1").unwrap();
/// user.record(Renamed("Ada".to_owned())).unwrap();
/// assert_eq!(user.name, "Ada");
/// assert_eq!(user.stream().version(), 1);
/// ```
pub trait Entity: Sized + Send + Sync {
    /// The event type this entity records and replays.
    type Event: Event<Self>;

    /// Returns the entity's stream.
    fn stream(&self) -> &Stream<Self::Event>;

    /// Returns the entity's stream mutably.
    fn stream_mut(&mut self) -> &mut Stream<Self::Event>;

    /// Builds a blank entity around `stream`.
    fn with_stream(stream: Stream<Self::Event>) -> Self;

    /// Applies `event` to the entity and, only if that succeeds, enqueues it
    /// as the next version of the stream.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Event::apply_to`]; the stream is untouched.
    fn record(&mut self, event: Self::Event) -> Result<(), DomainError> {
        event.apply_to(self)?;
        self.stream_mut().record(event);
        Ok(())
    }
}

/// Builds a fresh entity with an empty stream.
///
/// # Errors
///
/// Returns `DomainError::EmptyStreamId` if `id` is empty.
pub fn new_entity<T: Entity>(id: impl Into<String>) -> Result<T, DomainError> {
    Ok(T::with_stream(Stream::new(id)?))
}

/// Builds a fresh entity with an empty stream labelled with `stream_type`.
///
/// # Errors
///
/// Returns `DomainError::EmptyStreamId` if `id` is empty.
pub fn new_entity_with_type<T: Entity>(
    id: impl Into<String>,
    stream_type: impl Into<String>,
) -> Result<T, DomainError> {
    Ok(T::with_stream(Stream::with_type(id, stream_type)?))
}

/// Rebuilds an entity by replaying its full history.
///
/// The returned entity has no pending events.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if `history` is empty,
/// `DomainError::InvalidHistory` if versions are not contiguous and
/// `DomainError::Replay` if an event fails to apply.
pub fn reconstruct<T: Entity>(
    id: StreamId,
    stream_type: Option<String>,
    history: Vec<VersionedEvent<T::Event>>,
) -> Result<T, DomainError> {
    if history.is_empty() {
        return Err(DomainError::StreamNotFound(id));
    }

    let mut stream = Stream::from_history(id, stream_type, history)?;
    let history = stream.drain();

    let mut entity = T::with_stream(stream);
    replay(&mut entity, history)?;
    Ok(entity)
}

/// Rebuilds an entity from a snapshot plus the events recorded after it.
///
/// Events at or below the snapshot's version are skipped; they are already
/// folded into the snapshot.
///
/// # Errors
///
/// Returns `DomainError::InvalidHistory` if the remaining events do not
/// continue directly after the snapshot and `DomainError::Replay` if the
/// snapshot or an event fails to apply.
pub fn reconstruct_from_snapshot<T, S>(
    id: StreamId,
    stream_type: Option<String>,
    snapshot: VersionedSnapshot<S>,
    history: Vec<VersionedEvent<T::Event>>,
) -> Result<T, DomainError>
where
    T: Entity,
    S: Snapshot<T>,
{
    let history: Vec<_> = history
        .into_iter()
        .filter(|e| e.stream_version > snapshot.stream_version)
        .collect();

    let mut stream = Stream::resume(id, stream_type, snapshot.stream_version, history)?;
    let history = stream.drain();
    let stream_id = stream.id().clone();

    let mut entity = T::with_stream(stream);
    snapshot.snapshot.apply_to(&mut entity).map_err(|e| {
        replay_error(&stream_id, snapshot.stream_version, snapshot.snapshot.name(), &e)
    })?;
    replay(&mut entity, history)?;
    Ok(entity)
}

fn replay<T: Entity>(
    entity: &mut T,
    history: Vec<VersionedEvent<T::Event>>,
) -> Result<(), DomainError> {
    let stream_id = entity.stream().id().clone();
    for versioned in history {
        versioned.event.apply_to(entity).map_err(|e| {
            replay_error(&stream_id, versioned.stream_version, versioned.event.name(), &e)
        })?;
    }
    Ok(())
}

fn replay_error(
    stream_id: &StreamId,
    version: i64,
    name: &str,
    source: &DomainError,
) -> DomainError {
    DomainError::Replay {
        stream_id: stream_id.clone(),
        version,
        event_name: name.to_owned(),
        reason: source.to_string(),
    }
}
