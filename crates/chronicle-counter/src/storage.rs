//! Store wiring for counters.
//!
//! Counter events carry no personal data, so they are stored as they are
//! through a `NoOpMapper`.

use chronicle_core::snapshot::SnapshotPolicy;
use chronicle_core::transport::{EventSerializer, JsonMarshaler, Marshaler, NoOpMapper};
use chronicle_event_store::{InMemoryStore, InMemoryStoreConfig, SqlConfig};

use crate::domain::aggregates::Counter;
use crate::domain::events::CounterEvent;

/// Serializer storing counter events in their own serde shape.
pub fn event_serializer(marshaler: impl Marshaler + 'static) -> EventSerializer<Counter> {
    EventSerializer::new(NoOpMapper::new(CounterEvent::NAMES), marshaler)
}

/// In-memory store snapshotting every `every_n_versions` versions.
#[must_use]
pub fn in_memory_store(every_n_versions: i64) -> InMemoryStore<Counter> {
    InMemoryStore::with_snapshots(InMemoryStoreConfig {
        snapshot_every_n_versions: every_n_versions,
    })
}

/// `PostgreSQL` configuration with JSON payloads.
#[must_use]
pub fn postgres_config(snapshots: SnapshotPolicy) -> SqlConfig<Counter> {
    with_policy(SqlConfig::postgres(event_serializer(JsonMarshaler)), snapshots)
}

/// `SQLite` configuration with JSON payloads.
#[must_use]
pub fn sqlite_config(snapshots: SnapshotPolicy) -> SqlConfig<Counter> {
    with_policy(SqlConfig::sqlite(event_serializer(JsonMarshaler)), snapshots)
}

fn with_policy(config: SqlConfig<Counter>, snapshots: SnapshotPolicy) -> SqlConfig<Counter> {
    if snapshots.is_enabled() {
        config.with_snapshots(snapshots)
    } else {
        config
    }
}
