//! Store wiring for postcards.
//!
//! Three serializer variants are offered: postcard events stored in their
//! own serde shape, events mapped through versioned transport models, and
//! mapped events whose names are anonymized.

use std::sync::Arc;

use chronicle_core::error::DomainError;
use chronicle_core::transport::{
    Anonymizer, DefaultMapper, EventSerializer, Marshaler, NoOpMapper, TransportEvent,
};
use chronicle_event_store::SqlConfig;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Address, Postcard};
use crate::domain::events::{
    ADDRESSED_EVENT_NAME, Addressed, CREATED_EVENT_NAME, Created, PostcardEvent,
    SENT_EVENT_NAME, Sent, WRITTEN_EVENT_NAME, Written,
};

/// Stored form of `Created`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedV1 {
    /// The postcard identifier.
    pub id: String,
}

impl TransportEvent<Postcard> for CreatedV1 {
    const NAME: &'static str = CREATED_EVENT_NAME;

    fn from_event(event: &PostcardEvent) -> Option<Self> {
        match event {
            PostcardEvent::Created(created) => Some(Self {
                id: created.id.clone(),
            }),
            _ => None,
        }
    }

    fn into_event(self) -> PostcardEvent {
        PostcardEvent::Created(Created { id: self.id })
    }
}

/// Stored form of an [`Address`].
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressV1 {
    /// Name of the person; anonymized when an anonymizer is configured.
    pub name: String,
    /// First address line.
    pub line1: String,
    /// Second address line.
    pub line2: String,
    /// Third address line.
    pub line3: String,
}

impl From<&Address> for AddressV1 {
    fn from(address: &Address) -> Self {
        Self {
            name: address.name.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            line3: address.line3.clone(),
        }
    }
}

impl From<AddressV1> for Address {
    fn from(address: AddressV1) -> Self {
        Self {
            name: address.name,
            line1: address.line1,
            line2: address.line2,
            line3: address.line3,
        }
    }
}

/// Stored form of `Addressed`. Both names are personal data.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressedV1 {
    /// Who sends the postcard.
    pub sender: AddressV1,
    /// Who receives it.
    pub addressee: AddressV1,
}

impl TransportEvent<Postcard> for AddressedV1 {
    const NAME: &'static str = ADDRESSED_EVENT_NAME;

    fn from_event(event: &PostcardEvent) -> Option<Self> {
        match event {
            PostcardEvent::Addressed(addressed) => Some(Self {
                sender: AddressV1::from(&addressed.sender),
                addressee: AddressV1::from(&addressed.addressee),
            }),
            _ => None,
        }
    }

    fn into_event(self) -> PostcardEvent {
        PostcardEvent::Addressed(Addressed {
            sender: self.sender.into(),
            addressee: self.addressee.into(),
        })
    }

    fn visit_sensitive(
        &mut self,
        visit: &mut dyn FnMut(&mut String) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        visit(&mut self.sender.name)?;
        visit(&mut self.addressee.name)
    }
}

/// Stored form of `Written`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WrittenV1 {
    /// The message.
    pub content: String,
}

impl TransportEvent<Postcard> for WrittenV1 {
    const NAME: &'static str = WRITTEN_EVENT_NAME;

    fn from_event(event: &PostcardEvent) -> Option<Self> {
        match event {
            PostcardEvent::Written(written) => Some(Self {
                content: written.content.clone(),
            }),
            _ => None,
        }
    }

    fn into_event(self) -> PostcardEvent {
        PostcardEvent::Written(Written {
            content: self.content,
        })
    }
}

/// Stored form of `Sent`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SentV1 {}

impl TransportEvent<Postcard> for SentV1 {
    const NAME: &'static str = SENT_EVENT_NAME;

    fn from_event(event: &PostcardEvent) -> Option<Self> {
        matches!(event, PostcardEvent::Sent(_)).then_some(Self {})
    }

    fn into_event(self) -> PostcardEvent {
        PostcardEvent::Sent(Sent)
    }
}

fn transport_mapper() -> DefaultMapper<Postcard> {
    DefaultMapper::new()
        .register::<CreatedV1>()
        .register::<AddressedV1>()
        .register::<WrittenV1>()
        .register::<SentV1>()
}

/// Serializer storing postcard events in their own serde shape.
pub fn simple_serializer(marshaler: impl Marshaler + 'static) -> EventSerializer<Postcard> {
    EventSerializer::new(NoOpMapper::new(PostcardEvent::NAMES), marshaler)
}

/// Serializer storing postcard events through the `*V1` transport models.
pub fn mapping_serializer(marshaler: impl Marshaler + 'static) -> EventSerializer<Postcard> {
    EventSerializer::new(transport_mapper(), marshaler)
}

/// Like [`mapping_serializer`], with sender and addressee names passed
/// through `anonymizer`.
pub fn anonymizing_serializer(
    marshaler: impl Marshaler + 'static,
    anonymizer: Arc<dyn Anonymizer>,
) -> EventSerializer<Postcard> {
    EventSerializer::new(transport_mapper().with_anonymizer(anonymizer), marshaler)
}

/// `PostgreSQL` configuration using `serializer`.
#[must_use]
pub fn postgres_config(serializer: EventSerializer<Postcard>) -> SqlConfig<Postcard> {
    SqlConfig::postgres(serializer)
}

/// `SQLite` configuration using `serializer`.
#[must_use]
pub fn sqlite_config(serializer: EventSerializer<Postcard>) -> SqlConfig<Postcard> {
    SqlConfig::sqlite(serializer)
}
