//! Domain events for the counter context.

use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use serde::{Deserialize, Serialize};

use super::aggregates::Counter;

/// Emitted once when a counter is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    /// The counter identifier.
    pub id: String,
}

/// Emitted every time the counter is incremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementedBy {
    /// Amount added to the current value.
    pub value: i64,
}

/// Event variants for the counter context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterEvent {
    /// The counter has been created.
    Created(Created),
    /// The counter has been incremented.
    IncrementedBy(IncrementedBy),
}

impl CounterEvent {
    /// Names of every counter event, as stored.
    pub const NAMES: [&'static str; 2] = ["Created_v1", "IncrementedBy_v1"];
}

impl Event<Counter> for CounterEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => Self::NAMES[0],
            Self::IncrementedBy(_) => Self::NAMES[1],
        }
    }

    fn apply_to(&self, counter: &mut Counter) -> Result<(), DomainError> {
        match self {
            Self::Created(payload) => {
                counter.id.clone_from(&payload.id);
            }
            Self::IncrementedBy(payload) => {
                counter.current_value = counter
                    .current_value
                    .checked_add(payload.value)
                    .ok_or_else(|| DomainError::Validation("counter overflow".to_owned()))?;
            }
        }
        Ok(())
    }
}
