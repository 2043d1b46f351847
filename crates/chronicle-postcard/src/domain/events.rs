//! Domain events for the postcard context.

use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use serde::{Deserialize, Serialize};

use super::aggregates::{Address, Postcard};

/// Stored name of [`Created`].
pub const CREATED_EVENT_NAME: &str = "Created_v1";
/// Stored name of [`Addressed`].
pub const ADDRESSED_EVENT_NAME: &str = "Addressed_v1";
/// Stored name of [`Written`].
pub const WRITTEN_EVENT_NAME: &str = "Written_v1";
/// Stored name of [`Sent`].
pub const SENT_EVENT_NAME: &str = "Sent_v1";

/// Emitted when a postcard is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    /// The postcard identifier.
    pub id: String,
}

/// Emitted when sender and addressee are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressed {
    /// Who sends the postcard.
    pub sender: Address,
    /// Who receives it.
    pub addressee: Address,
}

/// Emitted when the content is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Written {
    /// The message on the card.
    pub content: String,
}

/// Emitted when the postcard is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sent;

/// Event variants for the postcard context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostcardEvent {
    /// The postcard has been created.
    Created(Created),
    /// The postcard has been addressed.
    Addressed(Addressed),
    /// The content has been written.
    Written(Written),
    /// The postcard has been sent.
    Sent(Sent),
}

impl PostcardEvent {
    /// Names of every postcard event, as stored.
    pub const NAMES: [&'static str; 4] = [
        CREATED_EVENT_NAME,
        ADDRESSED_EVENT_NAME,
        WRITTEN_EVENT_NAME,
        SENT_EVENT_NAME,
    ];
}

impl Event<Postcard> for PostcardEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => CREATED_EVENT_NAME,
            Self::Addressed(_) => ADDRESSED_EVENT_NAME,
            Self::Written(_) => WRITTEN_EVENT_NAME,
            Self::Sent(_) => SENT_EVENT_NAME,
        }
    }

    fn apply_to(&self, postcard: &mut Postcard) -> Result<(), DomainError> {
        match self {
            Self::Created(payload) => postcard.id.clone_from(&payload.id),
            Self::Addressed(payload) => {
                postcard.sender = payload.sender.clone();
                postcard.addressee = payload.addressee.clone();
            }
            Self::Written(payload) => postcard.content.clone_from(&payload.content),
            Self::Sent(_) => postcard.sent = true,
        }
        Ok(())
    }
}
