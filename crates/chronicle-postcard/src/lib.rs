//! Chronicle — postcard example context.
//!
//! A postcard is created, addressed, written and sent. Addresses carry
//! personal data, which the mapping storage variants anonymize before it
//! reaches the database.

pub mod application;
pub mod domain;
pub mod storage;
