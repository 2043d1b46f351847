//! Domain layer for the counter context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod snapshots;
