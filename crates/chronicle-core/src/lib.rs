//! Chronicle Core — event sourcing building blocks.
//!
//! Entities record domain events into a [`stream::Stream`]; stores persist
//! the drained events and rebuild entities by replaying them, optionally
//! starting from a snapshot. This crate holds the contracts and the pure
//! reconstruction logic. It contains no infrastructure code.

pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod snapshot;
pub mod store;
pub mod stream;
pub mod transport;
