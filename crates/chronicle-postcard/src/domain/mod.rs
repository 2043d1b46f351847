//! Domain layer for the postcard context.

pub mod aggregates;
pub mod commands;
pub mod events;
