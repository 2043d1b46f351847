//! Chronicle demo.
//!
//! Wires configuration, a SQL store and the example contexts into one
//! end-to-end run.

pub mod config;
pub mod error;
pub mod lifecycle;
