//! SQL implementation of the `EventStore` trait.
//!
//! The store runs over `sqlx::AnyPool`, so `PostgreSQL` and `SQLite` share this
//! code; dialect differences live in the configured
//! [`SchemaAdapter`](crate::schema::SchemaAdapter).
//!
//! ## Error Mapping
//!
//! | Failure | `DomainError` |
//! |---------|---------------|
//! | Unique violation on `(stream_id, stream_version)` | `VersionConflict` |
//! | Inserted row count differs from the batch size | `Infrastructure` |
//! | Any other database error | `Infrastructure` |
//! | Payload cannot be encoded or decoded | `Serialization` / `UnsupportedEvent` |
//!
//! Snapshot writes happen after the events are committed and never fail a
//! save; a failed snapshot write is logged at `warn`.

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use tracing::{debug, instrument, warn};

use chronicle_core::entity::{Entity, reconstruct, reconstruct_from_snapshot};
use chronicle_core::error::DomainError;
use chronicle_core::event::{Event, VersionedEvent};
use chronicle_core::snapshot::{Snapshot, VersionedSnapshot};
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;

use crate::config::{SqlConfig, SqlSnapshotConfig};
use crate::schema::{EventRow, SnapshotRow, SqlArg, Statement};

/// Event store persisting streams in a SQL database.
#[derive(Debug)]
pub struct SqlStore<T: Entity> {
    pool: AnyPool,
    config: SqlConfig<T>,
}

struct LoadedSnapshot<T> {
    snapshot: VersionedSnapshot<Box<dyn Snapshot<T>>>,
    stream_type: String,
}

impl<T: Entity + 'static> SqlStore<T> {
    /// Validates `config` and creates the tables if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` for an invalid configuration and
    /// `DomainError::Schema` if the schema cannot be initialized.
    #[instrument(skip_all, err)]
    pub async fn new(pool: AnyPool, config: SqlConfig<T>) -> Result<Self, DomainError> {
        config.validate()?;
        for ddl in config.schema_adapter.initialize_schema() {
            sqlx::query(&ddl)
                .execute(&pool)
                .await
                .map_err(|e| DomainError::Schema(format!("schema initialization failed: {e}")))?;
        }
        debug!("schema initialized");
        Ok(Self { pool, config })
    }

    async fn load_snapshot(
        &self,
        id: &StreamId,
        snapshots: &SqlSnapshotConfig<T>,
    ) -> Result<Option<LoadedSnapshot<T>>, DomainError> {
        let statement = self.config.schema_adapter.select_latest_snapshot(id);
        let Some(row) = bind(&statement)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_snapshot", e))?
        else {
            return Ok(None);
        };

        let stream_version: i64 = column(&row, "stream_version")?;
        let stream_type: String = column(&row, "stream_type")?;
        let name: String = column(&row, "snapshot_name")?;
        let payload: Vec<u8> = column(&row, "snapshot_payload")?;

        let snapshot = snapshots.codec.decode(id, &name, &payload)?;
        debug!(snapshot_version = stream_version, snapshot = %name, "snapshot found");
        Ok(Some(LoadedSnapshot {
            snapshot: VersionedSnapshot::new(snapshot, stream_version),
            stream_type,
        }))
    }

    async fn write_snapshot(
        &self,
        entity: &T,
        snapshots: &SqlSnapshotConfig<T>,
    ) -> Result<(), DomainError> {
        let id = entity.stream().id();
        let version = entity.stream().version();

        let statement = self.config.schema_adapter.select_latest_snapshot_version(id);
        let last = match bind(&statement)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_snapshot_version", e))?
        {
            Some(row) => column::<i64>(&row, "stream_version")?,
            None => 0,
        };
        if !snapshots.policy.is_due(version, last) {
            return Ok(());
        }

        let (name, payload) = snapshots.codec.encode(id, entity)?;
        let row = SnapshotRow {
            stream_id: id.clone(),
            stream_version: version,
            stream_type: entity.stream().stream_type().unwrap_or_default().to_owned(),
            snapshot_name: name.to_owned(),
            snapshot_payload: payload,
        };
        let statement = self.config.schema_adapter.insert_snapshot(&row);
        bind(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_snapshot", e))?;
        debug!(version, snapshot = name, "snapshot taken");
        Ok(())
    }
}

#[async_trait]
impl<T: Entity + 'static> EventStore<T> for SqlStore<T> {
    #[instrument(skip(self, id), fields(stream_id = %id), err)]
    async fn load(&self, id: &StreamId) -> Result<T, DomainError> {
        let snapshot = match &self.config.snapshots {
            Some(snapshots) => self.load_snapshot(id, snapshots).await?,
            None => None,
        };
        let after_version = snapshot
            .as_ref()
            .map_or(0, |s| s.snapshot.stream_version);

        let statement = self.config.schema_adapter.select_events(id, after_version);
        let rows = bind(&statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_events", e))?;

        let mut stream_type = snapshot
            .as_ref()
            .map(|s| s.stream_type.clone())
            .filter(|t| !t.is_empty());
        let mut history = Vec::with_capacity(rows.len());
        for row in &rows {
            let stream_version: i64 = column(row, "stream_version")?;
            let row_type: String = column(row, "stream_type")?;
            let name: String = column(row, "event_name")?;
            let payload: Vec<u8> = column(row, "event_payload")?;

            if stream_type.is_none() && !row_type.is_empty() {
                stream_type = Some(row_type);
            }
            let event = self.config.serializer.from_bytes(id, &name, &payload)?;
            history.push(VersionedEvent::new(event, stream_version));
        }
        debug!(event_count = history.len(), "events loaded");

        match snapshot {
            Some(loaded) => reconstruct_from_snapshot(id.clone(), stream_type, loaded.snapshot, history),
            None => reconstruct(id.clone(), stream_type, history),
        }
    }

    #[instrument(skip(self, entity), fields(stream_id = %entity.stream().id()), err)]
    async fn save(&self, entity: &mut T) -> Result<(), DomainError> {
        let id = entity.stream().id().clone();
        let events = entity.stream_mut().drain();
        let Some(first_version) = events.first().map(|e| e.stream_version) else {
            return Err(DomainError::NoEventsToSave(id));
        };
        let stream_type = entity.stream().stream_type().unwrap_or_default().to_owned();

        let rows = events
            .iter()
            .map(|versioned| {
                Ok(EventRow {
                    stream_id: id.clone(),
                    stream_version: versioned.stream_version,
                    stream_type: stream_type.clone(),
                    event_name: versioned.event.name().to_owned(),
                    event_payload: self.config.serializer.to_bytes(&id, &versioned.event)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let statement = self.config.schema_adapter.insert_events(&rows);
        let result = bind(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::VersionConflict {
                        stream_id: id.clone(),
                        version: first_version,
                    }
                } else {
                    map_sqlx_error("insert_events", e)
                }
            })?;

        let expected = u64::try_from(rows.len()).unwrap_or(u64::MAX);
        if result.rows_affected() != expected {
            return Err(DomainError::Infrastructure(format!(
                "inserted {} rows for stream {id}, expected {expected}",
                result.rows_affected()
            )));
        }
        debug!(count = rows.len(), version = entity.stream().version(), "events committed");

        if let Some(snapshots) = &self.config.snapshots {
            if let Err(error) = self.write_snapshot(entity, snapshots).await {
                warn!(%error, "snapshot write failed; events are committed");
            }
        }
        Ok(())
    }
}

fn bind(statement: &Statement) -> Query<'_, Any, AnyArguments<'_>> {
    statement
        .args
        .iter()
        .fold(sqlx::query(&statement.sql), |query, arg| match arg {
            SqlArg::Text(value) => query.bind(value.clone()),
            SqlArg::BigInt(value) => query.bind(*value),
            SqlArg::Bytes(value) => query.bind(value.clone()),
        })
}

fn column<V>(row: &AnyRow, name: &str) -> Result<V, DomainError>
where
    V: for<'r> sqlx::Decode<'r, Any> + sqlx::Type<Any>,
{
    row.try_get(name)
        .map_err(|e| DomainError::Infrastructure(format!("failed to read column {name}: {e}")))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn map_sqlx_error(operation: &str, error: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{operation} failed: {error}"))
}
