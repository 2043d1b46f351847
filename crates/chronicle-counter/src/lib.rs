//! Chronicle — counter example context.
//!
//! A counter that is created once and incremented many times. It is the
//! smallest entity that benefits from snapshots: its whole state fits in a
//! single `CounterSnapshot_v1`.

pub mod application;
pub mod domain;
pub mod storage;
