//! Command handlers for the counter context.
//!
//! Each handler loads the entity, executes the command, and saves the
//! resulting events. A `VersionConflict` from the store is returned to the
//! caller as is; retrying is the caller's decision.

use chronicle_core::entity::Entity;
use chronicle_core::error::DomainError;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;

use crate::domain::aggregates::Counter;
use crate::domain::commands::{CreateCounter, IncrementCounter};

/// Handles the `CreateCounter` command: creates the counter and persists its
/// `Created` event.
///
/// # Errors
///
/// Returns `DomainError::EmptyStreamId` for an empty id,
/// `DomainError::VersionConflict` if the counter already exists, or any
/// store failure.
pub async fn handle_create_counter(
    command: &CreateCounter,
    store: &dyn EventStore<Counter>,
) -> Result<StreamId, DomainError> {
    let mut counter = Counter::create(command.counter_id.clone())?;
    let id = counter.stream().id().clone();
    store.save(&mut counter).await?;
    Ok(id)
}

/// Handles the `IncrementCounter` command: loads the counter, increments it,
/// and persists the resulting event. Returns the new value.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if the counter does not exist,
/// `DomainError::Validation` on overflow, or any store failure.
pub async fn handle_increment_counter(
    command: &IncrementCounter,
    store: &dyn EventStore<Counter>,
) -> Result<i64, DomainError> {
    let id = StreamId::new(command.counter_id.clone())?;
    let mut counter = store.load(&id).await?;

    counter.increment_by(command.by)?;

    store.save(&mut counter).await?;
    Ok(counter.current_value())
}

#[cfg(test)]
mod tests {
    use chronicle_core::error::DomainError;
    use chronicle_core::event::Event;
    use chronicle_core::stream::StreamId;

    use crate::application::command_handlers::{handle_create_counter, handle_increment_counter};
    use crate::domain::aggregates::Counter;
    use crate::domain::commands::{CreateCounter, IncrementCounter};
    use chronicle_test_support::{
        ConflictingEventStore, EmptyEventStore, FailingEventStore, RecordingEventStore,
    };

    #[tokio::test]
    async fn test_handle_create_counter_persists_created_event() {
        // Arrange
        let store = RecordingEventStore::<Counter>::new();
        let command = CreateCounter {
            counter_id: "counter-1".to_owned(),
        };

        // Act
        let id = handle_create_counter(&command, &store).await.unwrap();

        // Assert
        assert_eq!(id.as_str(), "counter-1");
        let saved = store.saved_batches();
        assert_eq!(saved.len(), 1);
        let (stream_id, events) = &saved[0];
        assert_eq!(stream_id.as_str(), "counter-1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stream_version, 1);
        assert_eq!(events[0].event.name(), "Created_v1");
    }

    #[tokio::test]
    async fn test_handle_increment_counter_appends_after_history() {
        // Arrange
        let store = RecordingEventStore::<Counter>::new();
        handle_create_counter(
            &CreateCounter {
                counter_id: "counter-1".to_owned(),
            },
            &store,
        )
        .await
        .unwrap();

        // Act
        let value = handle_increment_counter(
            &IncrementCounter {
                counter_id: "counter-1".to_owned(),
                by: 3,
            },
            &store,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(value, 3);
        let saved = store.saved_batches();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].1[0].stream_version, 2);
        assert_eq!(saved[1].1[0].event.name(), "IncrementedBy_v1");
    }

    #[tokio::test]
    async fn test_handle_increment_counter_returns_not_found_for_unknown_counter() {
        let command = IncrementCounter {
            counter_id: "missing".to_owned(),
            by: 1,
        };

        let result = handle_increment_counter(&command, &EmptyEventStore).await;

        match result {
            Err(DomainError::StreamNotFound(id)) => {
                assert_eq!(id, StreamId::new("missing").unwrap());
            }
            other => panic!("expected StreamNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_create_counter_propagates_version_conflict() {
        let command = CreateCounter {
            counter_id: "counter-1".to_owned(),
        };

        let result = handle_create_counter(&command, &ConflictingEventStore).await;

        assert!(matches!(
            result,
            Err(DomainError::VersionConflict { version: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_create_counter_propagates_infrastructure_error() {
        let command = CreateCounter {
            counter_id: "counter-1".to_owned(),
        };

        let result = handle_create_counter(&command, &FailingEventStore).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_handle_create_counter_rejects_empty_id() {
        let command = CreateCounter {
            counter_id: String::new(),
        };

        let result = handle_create_counter(&command, &EmptyEventStore).await;

        assert!(matches!(result, Err(DomainError::EmptyStreamId)));
    }
}
