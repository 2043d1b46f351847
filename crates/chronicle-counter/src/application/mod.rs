//! Application layer for the counter context.

pub mod command_handlers;
pub mod query_handlers;
