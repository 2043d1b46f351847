//! Command handlers for the postcard context.

use chronicle_core::entity::Entity;
use chronicle_core::error::DomainError;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;

use crate::domain::aggregates::Postcard;
use crate::domain::commands::{AddressPostcard, CreatePostcard, SendPostcard, WritePostcard};

/// Outcome of a postcard command: the stream and its version after the save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostcardCommandResult {
    /// The postcard's stream.
    pub postcard_id: StreamId,
    /// Version of the last saved event.
    pub version: i64,
}

impl From<&Postcard> for PostcardCommandResult {
    fn from(postcard: &Postcard) -> Self {
        Self {
            postcard_id: postcard.stream().id().clone(),
            version: postcard.stream().version(),
        }
    }
}

/// Handles the `CreatePostcard` command.
///
/// # Errors
///
/// Returns `DomainError::EmptyStreamId` for an empty id,
/// `DomainError::VersionConflict` if the postcard already exists, or any
/// store failure.
pub async fn handle_create_postcard(
    command: &CreatePostcard,
    store: &dyn EventStore<Postcard>,
) -> Result<PostcardCommandResult, DomainError> {
    let mut postcard = Postcard::create(command.postcard_id.clone())?;
    store.save(&mut postcard).await?;
    Ok(PostcardCommandResult::from(&postcard))
}

/// Handles the `AddressPostcard` command.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if the postcard does not exist,
/// or any store failure.
pub async fn handle_address_postcard(
    command: &AddressPostcard,
    store: &dyn EventStore<Postcard>,
) -> Result<PostcardCommandResult, DomainError> {
    let mut postcard = load(&command.postcard_id, store).await?;
    postcard.address(command.sender.clone(), command.addressee.clone())?;
    store.save(&mut postcard).await?;
    Ok(PostcardCommandResult::from(&postcard))
}

/// Handles the `WritePostcard` command.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if the postcard does not exist,
/// or any store failure.
pub async fn handle_write_postcard(
    command: &WritePostcard,
    store: &dyn EventStore<Postcard>,
) -> Result<PostcardCommandResult, DomainError> {
    let mut postcard = load(&command.postcard_id, store).await?;
    postcard.write(command.content.clone())?;
    store.save(&mut postcard).await?;
    Ok(PostcardCommandResult::from(&postcard))
}

/// Handles the `SendPostcard` command.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if the postcard does not exist,
/// `DomainError::Validation` if it was already sent, or any store failure.
pub async fn handle_send_postcard(
    command: &SendPostcard,
    store: &dyn EventStore<Postcard>,
) -> Result<PostcardCommandResult, DomainError> {
    let mut postcard = load(&command.postcard_id, store).await?;
    postcard.send()?;
    store.save(&mut postcard).await?;
    Ok(PostcardCommandResult::from(&postcard))
}

async fn load(postcard_id: &str, store: &dyn EventStore<Postcard>) -> Result<Postcard, DomainError> {
    let id = StreamId::new(postcard_id)?;
    store.load(&id).await
}

#[cfg(test)]
mod tests {
    use chronicle_core::event::{Event, VersionedEvent};
    use chronicle_test_support::{
        ConflictingEventStore, EmptyEventStore, FailingEventStore, RecordingEventStore,
    };

    use super::*;
    use crate::domain::aggregates::Address;
    use crate::domain::events::{Created, PostcardEvent, Sent};

    fn seeded_store(events: Vec<PostcardEvent>) -> RecordingEventStore<Postcard> {
        let history = events
            .into_iter()
            .zip(1..)
            .map(|(event, version)| VersionedEvent::new(event, version))
            .collect();
        RecordingEventStore::new().with_history(
            StreamId::new("postcard-1").unwrap(),
            Some(Postcard::STREAM_TYPE.to_owned()),
            history,
        )
    }

    fn created() -> PostcardEvent {
        PostcardEvent::Created(Created {
            id: "postcard-1".to_owned(),
        })
    }

    #[tokio::test]
    async fn test_handle_create_postcard_persists_created_event() {
        // Arrange
        let store = RecordingEventStore::<Postcard>::new();
        let command = CreatePostcard {
            postcard_id: "postcard-1".to_owned(),
        };

        // Act
        let result = handle_create_postcard(&command, &store).await.unwrap();

        // Assert
        assert_eq!(result.postcard_id.as_str(), "postcard-1");
        assert_eq!(result.version, 1);
        let saved = store.saved_batches();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1[0].event.name(), "Created_v1");
    }

    #[tokio::test]
    async fn test_handle_create_postcard_discarding_store_still_reports_version() {
        let command = CreatePostcard {
            postcard_id: "postcard-1".to_owned(),
        };

        let result = handle_create_postcard(&command, &EmptyEventStore).await.unwrap();

        assert_eq!(result.version, 1);
    }

    #[tokio::test]
    async fn test_handle_address_postcard_appends_after_history() {
        // Arrange
        let store = seeded_store(vec![created()]);
        let command = AddressPostcard {
            postcard_id: "postcard-1".to_owned(),
            sender: Address {
                name: "Alice".to_owned(),
                ..Address::default()
            },
            addressee: Address {
                name: "Bob".to_owned(),
                ..Address::default()
            },
        };

        // Act
        let result = handle_address_postcard(&command, &store).await.unwrap();

        // Assert
        assert_eq!(result.version, 2);
        let saved = store.saved_batches();
        assert_eq!(saved[0].1[0].stream_version, 2);
        assert_eq!(saved[0].1[0].event.name(), "Addressed_v1");
    }

    #[tokio::test]
    async fn test_handle_write_postcard_missing_postcard_returns_not_found() {
        let command = WritePostcard {
            postcard_id: "postcard-1".to_owned(),
            content: "hello".to_owned(),
        };

        let result = handle_write_postcard(&command, &EmptyEventStore).await;

        assert!(matches!(result, Err(DomainError::StreamNotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_send_postcard_already_sent_saves_nothing() {
        // Arrange
        let store = seeded_store(vec![created(), PostcardEvent::Sent(Sent)]);
        let command = SendPostcard {
            postcard_id: "postcard-1".to_owned(),
        };

        // Act
        let result = handle_send_postcard(&command, &store).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(store.saved_batches().is_empty());
    }

    #[tokio::test]
    async fn test_handle_create_postcard_conflict_is_returned() {
        let command = CreatePostcard {
            postcard_id: "postcard-1".to_owned(),
        };

        let result = handle_create_postcard(&command, &ConflictingEventStore).await;

        assert!(matches!(
            result,
            Err(DomainError::VersionConflict { version: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_send_postcard_store_failure_is_propagated() {
        let command = SendPostcard {
            postcard_id: "postcard-1".to_owned(),
        };

        let result = handle_send_postcard(&command, &FailingEventStore).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
