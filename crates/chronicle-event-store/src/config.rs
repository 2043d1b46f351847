//! Configuration for [`SqlStore`](crate::sql_store::SqlStore).

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use chronicle_core::entity::Entity;
use chronicle_core::error::DomainError;
use chronicle_core::snapshot::{SnapshotEntity, SnapshotPolicy};
use chronicle_core::transport::{EventSerializer, SnapshotCodec, SnapshotSerializer};

use crate::schema::{PostgresSchemaAdapter, SchemaAdapter, SqliteSchemaAdapter};

/// Snapshot settings of a SQL store.
pub struct SqlSnapshotConfig<T> {
    /// When to take snapshots.
    pub policy: SnapshotPolicy,
    /// How snapshots are encoded.
    pub codec: Box<dyn SnapshotCodec<T>>,
}

impl<T> fmt::Debug for SqlSnapshotConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlSnapshotConfig")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Everything a SQL store needs besides the connection pool.
pub struct SqlConfig<T: Entity> {
    /// Dialect binding producing every statement.
    pub schema_adapter: Box<dyn SchemaAdapter>,
    /// Event payload encoding.
    pub serializer: EventSerializer<T>,
    /// Snapshot settings; `None` disables snapshots.
    pub snapshots: Option<SqlSnapshotConfig<T>>,
}

impl<T: Entity> SqlConfig<T> {
    /// Creates a configuration without snapshots.
    pub fn new(schema_adapter: impl SchemaAdapter + 'static, serializer: EventSerializer<T>) -> Self {
        Self {
            schema_adapter: Box::new(schema_adapter),
            serializer,
            snapshots: None,
        }
    }

    /// `PostgreSQL` with the default table names.
    #[must_use]
    pub fn postgres(serializer: EventSerializer<T>) -> Self {
        Self::new(PostgresSchemaAdapter::default(), serializer)
    }

    /// `SQLite` with the default table names.
    #[must_use]
    pub fn sqlite(serializer: EventSerializer<T>) -> Self {
        Self::new(SqliteSchemaAdapter::default(), serializer)
    }

    /// Enables snapshots encoded by `codec`.
    #[must_use]
    pub fn with_snapshot_codec(
        mut self,
        policy: SnapshotPolicy,
        codec: impl SnapshotCodec<T> + 'static,
    ) -> Self {
        self.snapshots = Some(SqlSnapshotConfig {
            policy,
            codec: Box::new(codec),
        });
        self
    }

    /// Enables JSON-encoded snapshots.
    #[must_use]
    pub fn with_snapshots(self, policy: SnapshotPolicy) -> Self
    where
        T: SnapshotEntity + 'static,
        T::Snapshot: Serialize + DeserializeOwned,
    {
        self.with_snapshot_codec(policy, SnapshotSerializer::<T>::default())
    }

    /// Checks the configuration before any statement runs.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if a table name is not a plain
    /// identifier or snapshots are configured with a disabled policy.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.schema_adapter.validate()?;
        match &self.snapshots {
            Some(snapshots) if !snapshots.policy.is_enabled() => {
                Err(DomainError::Configuration(format!(
                    "snapshots configured with non-positive interval {}",
                    snapshots.policy.every_n_versions
                )))
            }
            _ => Ok(()),
        }
    }
}

impl<T: Entity> fmt::Debug for SqlConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlConfig")
            .field("schema_adapter", &self.schema_adapter)
            .field("serializer", &self.serializer)
            .field("snapshots", &self.snapshots)
            .finish()
    }
}
