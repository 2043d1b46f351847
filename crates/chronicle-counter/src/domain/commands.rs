//! Commands for the counter context.

/// Command to create a new counter.
#[derive(Debug, Clone)]
pub struct CreateCounter {
    /// The identifier of the counter to create.
    pub counter_id: String,
}

/// Command to increment an existing counter.
#[derive(Debug, Clone)]
pub struct IncrementCounter {
    /// The counter to increment.
    pub counter_id: String,
    /// Amount to add.
    pub by: i64,
}
