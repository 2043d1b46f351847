//! Query handlers for the counter context.
//!
//! This module contains query handlers that load entities from the store
//! and return read-only view DTOs.

use chronicle_core::entity::Entity;
use chronicle_core::error::DomainError;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;
use serde::Serialize;

use crate::domain::aggregates::Counter;

/// Read-only view of a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterView {
    /// The counter identifier.
    pub counter_id: String,
    /// Current value.
    pub current_value: i64,
    /// Version of the last stored event.
    pub version: i64,
}

impl From<&Counter> for CounterView {
    fn from(counter: &Counter) -> Self {
        Self {
            counter_id: counter.id().to_owned(),
            current_value: counter.current_value(),
            version: counter.stream().version(),
        }
    }
}

/// Retrieves a counter by its id.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if nothing is stored for the id,
/// or any store failure.
pub async fn get_counter_by_id(
    counter_id: &str,
    store: &dyn EventStore<Counter>,
) -> Result<CounterView, DomainError> {
    let id = StreamId::new(counter_id)?;
    let counter = store.load(&id).await?;
    Ok(CounterView::from(&counter))
}
