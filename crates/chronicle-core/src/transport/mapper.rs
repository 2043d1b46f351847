//! Mapping between domain events and transport values.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::anonymizer::Anonymizer;
use crate::entity::Entity;
use crate::error::DomainError;
use crate::event::Event;
use crate::stream::StreamId;

/// Converts the events of entity `T` to and from transport values.
pub trait Mapper<T: Entity>: Send + Sync {
    /// Produces the transport value stored for `event`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` if the event's name is not
    /// known to the mapper, or `DomainError::Serialization` if it cannot be
    /// encoded.
    fn to_transport(&self, stream_id: &StreamId, event: &T::Event) -> Result<Value, DomainError>;

    /// Rebuilds the domain event stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` for unknown names, or
    /// `DomainError::Serialization` if the value does not decode.
    fn from_transport(
        &self,
        stream_id: &StreamId,
        name: &str,
        value: Value,
    ) -> Result<T::Event, DomainError>;
}

/// Stores domain events as they are, using their own serde representation.
///
/// Only events whose names were declared up front are accepted in either
/// direction.
pub struct NoOpMapper<T> {
    supported: BTreeSet<&'static str>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> NoOpMapper<T> {
    /// Creates a mapper accepting the given event names.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            supported: names.into_iter().collect(),
            _entity: PhantomData,
        }
    }

    fn check_supported(&self, name: &str) -> Result<(), DomainError> {
        if self.supported.contains(name) {
            Ok(())
        } else {
            Err(DomainError::UnsupportedEvent(name.to_owned()))
        }
    }
}

impl<T> fmt::Debug for NoOpMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoOpMapper")
            .field("supported", &self.supported)
            .finish()
    }
}

impl<T> Mapper<T> for NoOpMapper<T>
where
    T: Entity,
    T::Event: Serialize + DeserializeOwned,
{
    fn to_transport(&self, _stream_id: &StreamId, event: &T::Event) -> Result<Value, DomainError> {
        self.check_supported(event.name())?;
        serde_json::to_value(event).map_err(|e| {
            DomainError::Serialization(format!("cannot encode {}: {e}", event.name()))
        })
    }

    fn from_transport(
        &self,
        _stream_id: &StreamId,
        name: &str,
        value: Value,
    ) -> Result<T::Event, DomainError> {
        self.check_supported(name)?;
        let event: T::Event = serde_json::from_value(value)
            .map_err(|e| DomainError::Serialization(format!("cannot decode {name}: {e}")))?;
        if event.name() != name {
            return Err(DomainError::Serialization(format!(
                "payload stored as {name} decodes to {}",
                event.name()
            )));
        }
        Ok(event)
    }
}

/// A storage-facing model for one event kind of entity `T`.
///
/// Keeping storage models apart from domain events lets the domain evolve
/// without rewriting history, and lets the model declare which of its fields
/// carry personal data.
pub trait TransportEvent<T: Entity>: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the domain event this model stores.
    const NAME: &'static str;

    /// Builds the model from a domain event, or `None` if the event is of a
    /// different kind.
    fn from_event(event: &T::Event) -> Option<Self>;

    /// Turns the model back into the domain event.
    fn into_event(self) -> T::Event;

    /// Hands every sensitive string field to `visit`. Models without
    /// personal data keep the default.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `visit`.
    fn visit_sensitive(
        &mut self,
        _visit: &mut dyn FnMut(&mut String) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

type EncodeFn<E> = fn(&StreamId, &E, Option<&dyn Anonymizer>) -> Result<Value, DomainError>;
type DecodeFn<E> = fn(&StreamId, Value, Option<&dyn Anonymizer>) -> Result<E, DomainError>;

struct Registration<E> {
    encode: EncodeFn<E>,
    decode: DecodeFn<E>,
}

/// Maps domain events through registered [`TransportEvent`] models,
/// anonymizing sensitive fields when an [`Anonymizer`] is configured.
pub struct DefaultMapper<T: Entity> {
    registrations: HashMap<&'static str, Registration<T::Event>>,
    anonymizer: Option<Arc<dyn Anonymizer>>,
}

impl<T: Entity> DefaultMapper<T> {
    /// Creates a mapper with no registered models.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            anonymizer: None,
        }
    }

    /// Registers the transport model `M` for events named `M::NAME`.
    #[must_use]
    pub fn register<M: TransportEvent<T>>(mut self) -> Self {
        self.registrations.insert(
            M::NAME,
            Registration {
                encode: encode_model::<T, M>,
                decode: decode_model::<T, M>,
            },
        );
        self
    }

    /// Anonymizes sensitive fields with `anonymizer`.
    #[must_use]
    pub fn with_anonymizer(mut self, anonymizer: Arc<dyn Anonymizer>) -> Self {
        self.anonymizer = Some(anonymizer);
        self
    }

    fn registration(&self, name: &str) -> Result<&Registration<T::Event>, DomainError> {
        self.registrations
            .get(name)
            .ok_or_else(|| DomainError::UnsupportedEvent(name.to_owned()))
    }
}

impl<T: Entity> Default for DefaultMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> fmt::Debug for DefaultMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.registrations.keys().collect();
        names.sort_unstable();
        f.debug_struct("DefaultMapper")
            .field("registered", &names)
            .field("anonymizer", &self.anonymizer)
            .finish()
    }
}

impl<T: Entity> Mapper<T> for DefaultMapper<T> {
    fn to_transport(&self, stream_id: &StreamId, event: &T::Event) -> Result<Value, DomainError> {
        let registration = self.registration(event.name())?;
        (registration.encode)(stream_id, event, self.anonymizer.as_deref())
    }

    fn from_transport(
        &self,
        stream_id: &StreamId,
        name: &str,
        value: Value,
    ) -> Result<T::Event, DomainError> {
        let registration = self.registration(name)?;
        (registration.decode)(stream_id, value, self.anonymizer.as_deref())
    }
}

fn encode_model<T: Entity, M: TransportEvent<T>>(
    stream_id: &StreamId,
    event: &T::Event,
    anonymizer: Option<&dyn Anonymizer>,
) -> Result<Value, DomainError> {
    let mut model = M::from_event(event).ok_or_else(|| {
        DomainError::Serialization(format!(
            "event {} does not fit transport model {}",
            event.name(),
            M::NAME
        ))
    })?;
    if let Some(anonymizer) = anonymizer {
        model.visit_sensitive(&mut |field: &mut String| -> Result<(), DomainError> {
            *field = anonymizer.anonymize(stream_id, field)?;
            Ok(())
        })?;
    }
    serde_json::to_value(&model)
        .map_err(|e| DomainError::Serialization(format!("cannot encode {}: {e}", M::NAME)))
}

fn decode_model<T: Entity, M: TransportEvent<T>>(
    stream_id: &StreamId,
    value: Value,
    anonymizer: Option<&dyn Anonymizer>,
) -> Result<T::Event, DomainError> {
    let mut model: M = serde_json::from_value(value)
        .map_err(|e| DomainError::Serialization(format!("cannot decode {}: {e}", M::NAME)))?;
    if let Some(anonymizer) = anonymizer {
        model.visit_sensitive(&mut |field: &mut String| -> Result<(), DomainError> {
            *field = anonymizer.deanonymize(stream_id, field)?;
            Ok(())
        })?;
    }
    Ok(model.into_event())
}
