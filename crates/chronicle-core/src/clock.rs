//! Clock abstraction for stamping stored records.
//!
//! Stores record when each event was written (`stored_at`). The timestamp is
//! informational only; ordering always comes from stream versions.

use std::fmt;

use chrono::{DateTime, Utc};

/// Abstraction over system time so stores can be tested deterministically.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
