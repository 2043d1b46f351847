//! Entities for the counter context.

use chronicle_core::entity::{Entity, new_entity_with_type};
use chronicle_core::error::DomainError;
use chronicle_core::snapshot::SnapshotEntity;
use chronicle_core::stream::Stream;

use super::events::{CounterEvent, Created, IncrementedBy};
use super::snapshots::CounterSnapshot;

/// The entity for a counter.
#[derive(Debug)]
pub struct Counter {
    stream: Stream<CounterEvent>,
    /// Counter identifier, set by `Created`.
    pub(crate) id: String,
    /// Sum of all increments.
    pub(crate) current_value: i64,
}

impl Counter {
    /// Stream type recorded for every counter.
    pub const STREAM_TYPE: &'static str = "Counter";

    /// Creates a counter at zero, producing a `Created` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyStreamId` if `id` is empty.
    pub fn create(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let mut counter: Self = new_entity_with_type(id.clone(), Self::STREAM_TYPE)?;
        counter.record(CounterEvent::Created(Created { id }))?;
        Ok(counter)
    }

    /// Adds `value` to the counter, producing an `IncrementedBy` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the value would overflow.
    pub fn increment_by(&mut self, value: i64) -> Result<(), DomainError> {
        self.record(CounterEvent::IncrementedBy(IncrementedBy { value }))
    }

    /// Returns the counter identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current value.
    #[must_use]
    pub fn current_value(&self) -> i64 {
        self.current_value
    }
}

impl Entity for Counter {
    type Event = CounterEvent;

    fn stream(&self) -> &Stream<CounterEvent> {
        &self.stream
    }

    fn stream_mut(&mut self) -> &mut Stream<CounterEvent> {
        &mut self.stream
    }

    fn with_stream(stream: Stream<CounterEvent>) -> Self {
        Self {
            stream,
            id: String::new(),
            current_value: 0,
        }
    }
}

impl SnapshotEntity for Counter {
    type Snapshot = CounterSnapshot;

    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            id: self.id.clone(),
            current_value: self.current_value,
        }
    }
}
