//! Application layer for the postcard context.

pub mod command_handlers;
pub mod query_handlers;
