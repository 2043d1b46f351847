//! Snapshot of the counter state.

use chronicle_core::error::DomainError;
use chronicle_core::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

use super::aggregates::Counter;

/// Full counter state as of one stream version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// The counter identifier.
    pub id: String,
    /// Value at the time of the snapshot.
    pub current_value: i64,
}

impl Snapshot<Counter> for CounterSnapshot {
    fn name(&self) -> &'static str {
        "CounterSnapshot_v1"
    }

    fn apply_to(&self, counter: &mut Counter) -> Result<(), DomainError> {
        counter.id.clone_from(&self.id);
        counter.current_value = self.current_value;
        Ok(())
    }
}
