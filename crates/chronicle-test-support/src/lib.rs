//! Shared test doubles for the Chronicle event-sourcing toolkit.

mod clock;
mod store;

pub use clock::{FixedClock, SteppingClock};
pub use store::{ConflictingEventStore, EmptyEventStore, FailingEventStore, RecordingEventStore};
