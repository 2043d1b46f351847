//! Chronicle Event Store — persistence backends for the `EventStore` trait.
//!
//! [`InMemoryStore`] keeps streams in process memory and suits tests.
//! [`SqlStore`] persists them through `sqlx::AnyPool` with a dialect chosen
//! by its [`SchemaAdapter`].

pub mod config;
pub mod in_memory_store;
pub mod schema;
pub mod sql_store;

pub use config::{SqlConfig, SqlSnapshotConfig};
pub use in_memory_store::{InMemoryStore, InMemoryStoreConfig};
pub use schema::{PostgresSchemaAdapter, SchemaAdapter, SqliteSchemaAdapter};
pub use sql_store::SqlStore;
