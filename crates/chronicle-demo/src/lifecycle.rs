//! End-to-end lifecycles of the example contexts.

use std::sync::Arc;

use chronicle_core::stream::StreamId;
use chronicle_core::transport::{JsonMarshaler, MaskingAnonymizer};
use chronicle_counter::application::command_handlers::{
    handle_create_counter, handle_increment_counter,
};
use chronicle_counter::application::query_handlers::{CounterView, get_counter_by_id};
use chronicle_counter::domain::aggregates::Counter;
use chronicle_counter::domain::commands::{CreateCounter, IncrementCounter};
use chronicle_counter::storage as counter_storage;
use chronicle_event_store::{SqlConfig, SqlStore};
use chronicle_postcard::application::command_handlers::{
    handle_address_postcard, handle_create_postcard, handle_send_postcard, handle_write_postcard,
};
use chronicle_postcard::application::query_handlers::{PostcardView, get_postcard_by_id};
use chronicle_postcard::domain::aggregates::{Address, Postcard};
use chronicle_postcard::domain::commands::{
    AddressPostcard, CreatePostcard, SendPostcard, WritePostcard,
};
use chronicle_postcard::storage as postcard_storage;
use serde::Serialize;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::info;

use crate::config::{DemoConfig, Dialect};
use crate::error::AppError;

/// Outcome of a full demo run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoReport {
    /// Final state of the demo postcard.
    pub postcard: PostcardView,
    /// Final state of the demo counter.
    pub counter: CounterView,
}

/// Opens a pool for the configured database.
///
/// # Errors
///
/// Returns `AppError::Database` if the connection cannot be established.
pub async fn connect(config: &DemoConfig) -> Result<AnyPool, AppError> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections())
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Runs both lifecycles against `pool`.
///
/// # Errors
///
/// Returns the first store or domain failure.
pub async fn run(
    pool: &AnyPool,
    config: &DemoConfig,
    increments: i64,
) -> Result<DemoReport, AppError> {
    let postcard = run_postcard(pool, config.dialect).await?;
    let counter = run_counter(pool, config, increments).await?;
    Ok(DemoReport { postcard, counter })
}

/// Creates, addresses, writes and sends a postcard whose names are masked
/// in storage.
///
/// # Errors
///
/// Returns the first store or domain failure.
pub async fn run_postcard(pool: &AnyPool, dialect: Dialect) -> Result<PostcardView, AppError> {
    let serializer =
        postcard_storage::anonymizing_serializer(JsonMarshaler, Arc::new(MaskingAnonymizer));
    let config: SqlConfig<Postcard> = match dialect {
        Dialect::Postgres => postcard_storage::postgres_config(serializer),
        Dialect::Sqlite => postcard_storage::sqlite_config(serializer),
    };
    let store = SqlStore::new(pool.clone(), config).await?;

    let postcard_id = StreamId::generate().to_string();
    handle_create_postcard(
        &CreatePostcard {
            postcard_id: postcard_id.clone(),
        },
        &store,
    )
    .await?;
    handle_address_postcard(
        &AddressPostcard {
            postcard_id: postcard_id.clone(),
            sender: Address {
                name: "Alice".to_owned(),
                line1: "Ocean Drive 1".to_owned(),
                line2: "Seaside".to_owned(),
                line3: "Postland".to_owned(),
            },
            addressee: Address {
                name: "Bob".to_owned(),
                line1: "Hill Street 2".to_owned(),
                line2: "Hightown".to_owned(),
                line3: "Postland".to_owned(),
            },
        },
        &store,
    )
    .await?;
    handle_write_postcard(
        &WritePostcard {
            postcard_id: postcard_id.clone(),
            content: "Greetings from Seaside".to_owned(),
        },
        &store,
    )
    .await?;
    let sent = handle_send_postcard(
        &SendPostcard {
            postcard_id: postcard_id.clone(),
        },
        &store,
    )
    .await?;
    info!(postcard_id = %sent.postcard_id, version = sent.version, "postcard sent");

    Ok(get_postcard_by_id(&postcard_id, &store).await?)
}

/// Creates a counter and increments it `increments` times, snapshotting
/// according to the configured policy.
///
/// # Errors
///
/// Returns the first store or domain failure.
pub async fn run_counter(
    pool: &AnyPool,
    config: &DemoConfig,
    increments: i64,
) -> Result<CounterView, AppError> {
    let sql_config: SqlConfig<Counter> = match config.dialect {
        Dialect::Postgres => counter_storage::postgres_config(config.snapshots),
        Dialect::Sqlite => counter_storage::sqlite_config(config.snapshots),
    };
    let store = SqlStore::new(pool.clone(), sql_config).await?;

    let counter_id = StreamId::generate().to_string();
    handle_create_counter(
        &CreateCounter {
            counter_id: counter_id.clone(),
        },
        &store,
    )
    .await?;
    for _ in 0..increments {
        handle_increment_counter(
            &IncrementCounter {
                counter_id: counter_id.clone(),
                by: 1,
            },
            &store,
        )
        .await?;
    }
    info!(%counter_id, increments, "counter incremented");

    Ok(get_counter_by_id(&counter_id, &store).await?)
}
