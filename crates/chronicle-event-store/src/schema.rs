//! SQL dialect bindings for [`SqlStore`](crate::sql_store::SqlStore).
//!
//! A [`SchemaAdapter`] owns every SQL string the store runs: table DDL,
//! batch inserts and ordered selects. The store itself only binds arguments
//! and reads columns by name, so the same store runs on any dialect an
//! adapter exists for.
//!
//! Both tables carry a unique index on `(stream_id, stream_version)`; the
//! event index is what turns a concurrent write into a `VersionConflict`.

use std::fmt;

use chronicle_core::error::DomainError;
use chronicle_core::stream::StreamId;

/// Default name of the events table.
pub const DEFAULT_EVENTS_TABLE: &str = "events";

/// Default name of the snapshots table.
pub const DEFAULT_SNAPSHOTS_TABLE: &str = "snapshots";

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    /// A string column.
    Text(String),
    /// A 64-bit integer column.
    BigInt(i64),
    /// A binary column.
    Bytes(Vec<u8>),
}

/// SQL text plus its arguments in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// The SQL to execute.
    pub sql: String,
    /// Arguments for the placeholders in `sql`.
    pub args: Vec<SqlArg>,
}

/// One serialized event ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    /// Stream the event belongs to.
    pub stream_id: StreamId,
    /// Version of the event within its stream.
    pub stream_version: i64,
    /// Stream type label; empty when the stream has none.
    pub stream_type: String,
    /// Name of the event.
    pub event_name: String,
    /// Serialized event.
    pub event_payload: Vec<u8>,
}

/// One serialized snapshot ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    /// Stream the snapshot belongs to.
    pub stream_id: StreamId,
    /// Version of the last event folded into the snapshot.
    pub stream_version: i64,
    /// Stream type label; empty when the stream has none.
    pub stream_type: String,
    /// Name of the snapshot.
    pub snapshot_name: String,
    /// Serialized snapshot.
    pub snapshot_payload: Vec<u8>,
}

/// Produces the SQL for one database dialect.
///
/// Selects must return the columns named in [`EventRow`] and
/// [`SnapshotRow`] (minus `stream_id`) so the store can read them by name.
pub trait SchemaAdapter: Send + Sync + fmt::Debug {
    /// Checks the adapter's own settings, such as table names.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` describing the first problem.
    fn validate(&self) -> Result<(), DomainError>;

    /// Idempotent DDL statements creating the tables and indexes.
    fn initialize_schema(&self) -> Vec<String>;

    /// A single statement inserting every row of the batch.
    fn insert_events(&self, rows: &[EventRow]) -> Statement;

    /// Selects the events of `stream_id` newer than `after_version`, oldest
    /// first.
    fn select_events(&self, stream_id: &StreamId, after_version: i64) -> Statement;

    /// Inserts one snapshot.
    fn insert_snapshot(&self, row: &SnapshotRow) -> Statement;

    /// Selects the newest snapshot of `stream_id`, if any.
    fn select_latest_snapshot(&self, stream_id: &StreamId) -> Statement;

    /// Selects only the version of the newest snapshot of `stream_id`.
    fn select_latest_snapshot_version(&self, stream_id: &StreamId) -> Statement;
}

/// Table names shared by the bundled adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tables {
    events: String,
    snapshots: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            events: DEFAULT_EVENTS_TABLE.to_owned(),
            snapshots: DEFAULT_SNAPSHOTS_TABLE.to_owned(),
        }
    }
}

impl Tables {
    fn validate(&self) -> Result<(), DomainError> {
        for name in [&self.events, &self.snapshots] {
            if !is_identifier(name) {
                return Err(DomainError::Configuration(format!(
                    "invalid table name {name:?}: expected letters, digits and underscores"
                )));
            }
        }
        if self.events == self.snapshots {
            return Err(DomainError::Configuration(format!(
                "events and snapshots cannot share table {:?}",
                self.events
            )));
        }
        Ok(())
    }

    fn insert_events(&self, rows: &[EventRow], placeholder: fn(usize) -> String) -> Statement {
        let mut args = Vec::with_capacity(rows.len() * 5);
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let base = args.len();
            values.push(format!(
                "({}, {}, {}, {}, {})",
                placeholder(base + 1),
                placeholder(base + 2),
                placeholder(base + 3),
                placeholder(base + 4),
                placeholder(base + 5),
            ));
            args.extend([
                SqlArg::Text(row.stream_id.to_string()),
                SqlArg::BigInt(row.stream_version),
                SqlArg::Text(row.stream_type.clone()),
                SqlArg::Text(row.event_name.clone()),
                SqlArg::Bytes(row.event_payload.clone()),
            ]);
        }
        Statement {
            sql: format!(
                "INSERT INTO {} (stream_id, stream_version, stream_type, event_name, event_payload) VALUES {}",
                self.events,
                values.join(", ")
            ),
            args,
        }
    }

    fn select_events(
        &self,
        stream_id: &StreamId,
        after_version: i64,
        placeholder: fn(usize) -> String,
    ) -> Statement {
        Statement {
            sql: format!(
                "SELECT stream_version, stream_type, event_name, event_payload FROM {} \
                 WHERE stream_id = {} AND stream_version > {} ORDER BY stream_version ASC",
                self.events,
                placeholder(1),
                placeholder(2)
            ),
            args: vec![
                SqlArg::Text(stream_id.to_string()),
                SqlArg::BigInt(after_version),
            ],
        }
    }

    fn insert_snapshot(&self, row: &SnapshotRow, placeholder: fn(usize) -> String) -> Statement {
        Statement {
            sql: format!(
                "INSERT INTO {} (stream_id, stream_version, stream_type, snapshot_name, snapshot_payload) \
                 VALUES ({}, {}, {}, {}, {})",
                self.snapshots,
                placeholder(1),
                placeholder(2),
                placeholder(3),
                placeholder(4),
                placeholder(5)
            ),
            args: vec![
                SqlArg::Text(row.stream_id.to_string()),
                SqlArg::BigInt(row.stream_version),
                SqlArg::Text(row.stream_type.clone()),
                SqlArg::Text(row.snapshot_name.clone()),
                SqlArg::Bytes(row.snapshot_payload.clone()),
            ],
        }
    }

    fn select_latest_snapshot(
        &self,
        stream_id: &StreamId,
        columns: &str,
        placeholder: fn(usize) -> String,
    ) -> Statement {
        Statement {
            sql: format!(
                "SELECT {columns} FROM {} WHERE stream_id = {} ORDER BY stream_version DESC LIMIT 1",
                self.snapshots,
                placeholder(1)
            ),
            args: vec![SqlArg::Text(stream_id.to_string())],
        }
    }
}

const SNAPSHOT_COLUMNS: &str = "stream_version, stream_type, snapshot_name, snapshot_payload";

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn dollar_placeholder(n: usize) -> String {
    format!("${n}")
}

fn question_placeholder(_n: usize) -> String {
    "?".to_owned()
}

/// `PostgreSQL` dialect: `$n` placeholders, `BIGINT` versions, `BYTEA`
/// payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresSchemaAdapter {
    tables: Tables,
}

impl PostgresSchemaAdapter {
    /// Creates an adapter using custom table names.
    #[must_use]
    pub fn with_tables(events: impl Into<String>, snapshots: impl Into<String>) -> Self {
        Self {
            tables: Tables {
                events: events.into(),
                snapshots: snapshots.into(),
            },
        }
    }
}

impl SchemaAdapter for PostgresSchemaAdapter {
    fn validate(&self) -> Result<(), DomainError> {
        self.tables.validate()
    }

    fn initialize_schema(&self) -> Vec<String> {
        let Tables { events, snapshots } = &self.tables;
        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {events} (
    stream_id      VARCHAR(255) NOT NULL,
    stream_version BIGINT NOT NULL,
    stream_type    VARCHAR(255) NOT NULL DEFAULT '',
    event_name     VARCHAR(255) NOT NULL,
    event_payload  BYTEA NOT NULL,
    stored_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {events}_stream_id_stream_version_idx \
                 ON {events} (stream_id, stream_version)"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {snapshots} (
    stream_id        VARCHAR(255) NOT NULL,
    stream_version   BIGINT NOT NULL,
    stream_type      VARCHAR(255) NOT NULL DEFAULT '',
    snapshot_name    VARCHAR(255) NOT NULL,
    snapshot_payload BYTEA NOT NULL,
    stored_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {snapshots}_stream_id_stream_version_idx \
                 ON {snapshots} (stream_id, stream_version)"
            ),
        ]
    }

    fn insert_events(&self, rows: &[EventRow]) -> Statement {
        self.tables.insert_events(rows, dollar_placeholder)
    }

    fn select_events(&self, stream_id: &StreamId, after_version: i64) -> Statement {
        self.tables
            .select_events(stream_id, after_version, dollar_placeholder)
    }

    fn insert_snapshot(&self, row: &SnapshotRow) -> Statement {
        self.tables.insert_snapshot(row, dollar_placeholder)
    }

    fn select_latest_snapshot(&self, stream_id: &StreamId) -> Statement {
        self.tables
            .select_latest_snapshot(stream_id, SNAPSHOT_COLUMNS, dollar_placeholder)
    }

    fn select_latest_snapshot_version(&self, stream_id: &StreamId) -> Statement {
        self.tables
            .select_latest_snapshot(stream_id, "stream_version", dollar_placeholder)
    }
}

/// `SQLite` dialect: `?` placeholders, `INTEGER` versions, `BLOB` payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqliteSchemaAdapter {
    tables: Tables,
}

impl SqliteSchemaAdapter {
    /// Creates an adapter using custom table names.
    #[must_use]
    pub fn with_tables(events: impl Into<String>, snapshots: impl Into<String>) -> Self {
        Self {
            tables: Tables {
                events: events.into(),
                snapshots: snapshots.into(),
            },
        }
    }
}

impl SchemaAdapter for SqliteSchemaAdapter {
    fn validate(&self) -> Result<(), DomainError> {
        self.tables.validate()
    }

    fn initialize_schema(&self) -> Vec<String> {
        let Tables { events, snapshots } = &self.tables;
        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {events} (
    stream_id      TEXT NOT NULL,
    stream_version INTEGER NOT NULL,
    stream_type    TEXT NOT NULL DEFAULT '',
    event_name     TEXT NOT NULL,
    event_payload  BLOB NOT NULL,
    stored_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)"
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {events}_stream_id_stream_version_idx \
                 ON {events} (stream_id, stream_version)"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {snapshots} (
    stream_id        TEXT NOT NULL,
    stream_version   INTEGER NOT NULL,
    stream_type      TEXT NOT NULL DEFAULT '',
    snapshot_name    TEXT NOT NULL,
    snapshot_payload BLOB NOT NULL,
    stored_at        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)"
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {snapshots}_stream_id_stream_version_idx \
                 ON {snapshots} (stream_id, stream_version)"
            ),
        ]
    }

    fn insert_events(&self, rows: &[EventRow]) -> Statement {
        self.tables.insert_events(rows, question_placeholder)
    }

    fn select_events(&self, stream_id: &StreamId, after_version: i64) -> Statement {
        self.tables
            .select_events(stream_id, after_version, question_placeholder)
    }

    fn insert_snapshot(&self, row: &SnapshotRow) -> Statement {
        self.tables.insert_snapshot(row, question_placeholder)
    }

    fn select_latest_snapshot(&self, stream_id: &StreamId) -> Statement {
        self.tables
            .select_latest_snapshot(stream_id, SNAPSHOT_COLUMNS, question_placeholder)
    }

    fn select_latest_snapshot_version(&self, stream_id: &StreamId) -> Statement {
        self.tables
            .select_latest_snapshot(stream_id, "stream_version", question_placeholder)
    }
}
