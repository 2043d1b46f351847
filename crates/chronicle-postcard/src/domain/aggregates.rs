//! Entities for the postcard context.

use chronicle_core::entity::{Entity, new_entity_with_type};
use chronicle_core::error::DomainError;
use chronicle_core::stream::Stream;
use serde::{Deserialize, Serialize};

use super::events::{Addressed, Created, PostcardEvent, Sent, Written};

/// A postal address. `name` is personal data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Name of the person.
    pub name: String,
    /// First address line.
    pub line1: String,
    /// Second address line.
    pub line2: String,
    /// Third address line.
    pub line3: String,
}

/// The entity for a postcard.
#[derive(Debug)]
pub struct Postcard {
    stream: Stream<PostcardEvent>,
    /// Postcard identifier, set by `Created`.
    pub(crate) id: String,
    pub(crate) sender: Address,
    pub(crate) addressee: Address,
    pub(crate) content: String,
    pub(crate) sent: bool,
}

impl Postcard {
    /// Stream type recorded for every postcard.
    pub const STREAM_TYPE: &'static str = "Postcard";

    /// Creates a blank postcard, producing a `Created` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyStreamId` if `id` is empty.
    pub fn create(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let mut postcard: Self = new_entity_with_type(id.clone(), Self::STREAM_TYPE)?;
        postcard.record(PostcardEvent::Created(Created { id }))?;
        Ok(postcard)
    }

    /// Sets sender and addressee.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be recorded.
    pub fn address(&mut self, sender: Address, addressee: Address) -> Result<(), DomainError> {
        self.record(PostcardEvent::Addressed(Addressed { sender, addressee }))
    }

    /// Writes the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be recorded.
    pub fn write(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        self.record(PostcardEvent::Written(Written {
            content: content.into(),
        }))
    }

    /// Sends the postcard.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if it was already sent.
    pub fn send(&mut self) -> Result<(), DomainError> {
        if self.sent {
            return Err(DomainError::Validation("postcard already sent".to_owned()));
        }
        self.record(PostcardEvent::Sent(Sent))
    }

    /// Returns the postcard identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns who sends the postcard.
    #[must_use]
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Returns who receives the postcard.
    #[must_use]
    pub fn addressee(&self) -> &Address {
        &self.addressee
    }

    /// Returns the message, empty until written.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns `true` once the postcard has been sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }
}

impl Entity for Postcard {
    type Event = PostcardEvent;

    fn stream(&self) -> &Stream<PostcardEvent> {
        &self.stream
    }

    fn stream_mut(&mut self) -> &mut Stream<PostcardEvent> {
        &mut self.stream
    }

    fn with_stream(stream: Stream<PostcardEvent>) -> Self {
        Self {
            stream,
            id: String::new(),
            sender: Address::default(),
            addressee: Address::default(),
            content: String::new(),
            sent: false,
        }
    }
}
