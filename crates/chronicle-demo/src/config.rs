//! Environment configuration of the demo binary.

use chronicle_core::snapshot::SnapshotPolicy;

use crate::error::AppError;

/// Default connection string: a private in-memory `SQLite` database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// SQL dialect selected from the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `postgres://` or `postgresql://` URLs.
    Postgres,
    /// `sqlite:` URLs.
    Sqlite,
}

/// Settings read from `DATABASE_URL` and `SNAPSHOT_EVERY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Connection string passed to the pool.
    pub database_url: String,
    /// Dialect derived from `database_url`.
    pub dialect: Dialect,
    /// Snapshot cadence for the counter store.
    pub snapshots: SnapshotPolicy,
}

impl DemoConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset variables fall back
    /// to their defaults; set but invalid ones are errors.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unsupported `DATABASE_URL` scheme
    /// or a `SNAPSHOT_EVERY` that is not a non-negative integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        let dialect = dialect_of(&database_url)?;

        let every_n_versions = match lookup("SNAPSHOT_EVERY") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "SNAPSHOT_EVERY must be a non-negative integer, got {raw:?}"
                    ))
                })?,
            None => 0,
        };

        Ok(Self {
            database_url,
            dialect,
            snapshots: SnapshotPolicy::every(every_n_versions),
        })
    }

    /// Pool size suited to the dialect. An in-memory `SQLite` database
    /// exists per connection, so it gets exactly one.
    #[must_use]
    pub fn max_connections(&self) -> u32 {
        match self.dialect {
            Dialect::Postgres => 10,
            Dialect::Sqlite => 1,
        }
    }
}

fn dialect_of(database_url: &str) -> Result<Dialect, AppError> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok(Dialect::Postgres)
    } else if database_url.starts_with("sqlite:") {
        Ok(Dialect::Sqlite)
    } else {
        Err(AppError::Config(format!(
            "DATABASE_URL must be a postgres or sqlite URL, got {database_url:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = DemoConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert!(!config.snapshots.is_enabled());
        assert_eq!(config.max_connections(), 1);
    }

    #[test]
    fn test_postgres_url_and_snapshot_interval() {
        // Arrange
        let vars = lookup(&[
            ("DATABASE_URL", "postgres://chronicle@localhost/chronicle"),
            ("SNAPSHOT_EVERY", "100"),
        ]);

        // Act
        let config = DemoConfig::from_lookup(vars).unwrap();

        // Assert
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.snapshots, SnapshotPolicy::every(100));
        assert_eq!(config.max_connections(), 10);
    }

    #[test]
    fn test_invalid_snapshot_interval_is_an_error() {
        for raw in ["often", "-5", ""] {
            let result = DemoConfig::from_lookup(lookup(&[("SNAPSHOT_EVERY", raw)]));

            assert!(matches!(result, Err(AppError::Config(_))), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_unknown_database_scheme_is_an_error() {
        let result = DemoConfig::from_lookup(lookup(&[("DATABASE_URL", "mysql://localhost/db")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
