//! Integration tests for counters persisted in the bundled stores.

use chronicle_core::entity::Entity;
use chronicle_core::error::DomainError;
use chronicle_core::snapshot::SnapshotPolicy;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;
use chronicle_counter::domain::aggregates::Counter;
use chronicle_counter::storage;
use chronicle_event_store::SqlStore;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};

const INCREMENTS: i64 = 300;

async fn sqlite_pool() -> AnyPool {
    sqlx::any::install_default_drivers();
    AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

async fn increment_many(store: &dyn EventStore<Counter>, id: &StreamId) {
    for _ in 0..INCREMENTS {
        let mut counter = store.load(id).await.unwrap();
        counter.increment_by(1).unwrap();
        store.save(&mut counter).await.unwrap();
    }
}

async fn exercise_store(store: &dyn EventStore<Counter>) -> StreamId {
    let id = StreamId::generate();
    let mut counter = Counter::create(id.as_str()).unwrap();
    assert_eq!(counter.current_value(), 0);

    let missing = store.load(&id).await;
    assert!(matches!(missing, Err(DomainError::StreamNotFound(_))));

    store.save(&mut counter).await.unwrap();
    let from_store = store.load(&id).await.unwrap();
    assert_eq!(from_store.id(), counter.id());
    assert_eq!(from_store.current_value(), 0);
    assert_eq!(from_store.stream().stream_type(), Some("Counter"));

    increment_many(store, &id).await;

    let from_store = store.load(&id).await.unwrap();
    assert_eq!(from_store.id(), id.as_str());
    assert_eq!(from_store.current_value(), INCREMENTS);
    assert_eq!(from_store.stream().version(), INCREMENTS + 1);
    assert!(!from_store.stream().has_pending());
    id
}

#[tokio::test]
async fn test_in_memory_store_snapshots_every_hundred_versions() {
    let store = storage::in_memory_store(100);

    let id = exercise_store(&store).await;

    assert_eq!(store.event_count(&id).unwrap(), 301);
    assert_eq!(store.snapshot_versions(&id).unwrap(), vec![100, 200, 300]);
}

#[tokio::test]
async fn test_in_memory_store_without_snapshots_replays_everything() {
    let store = storage::in_memory_store(0);

    let id = exercise_store(&store).await;

    assert!(store.snapshot_versions(&id).unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_store_snapshots_every_hundred_versions() {
    // Arrange
    let pool = sqlite_pool().await;
    let store = SqlStore::new(pool.clone(), storage::sqlite_config(SnapshotPolicy::every(100)))
        .await
        .unwrap();

    // Act
    let id = exercise_store(&store).await;

    // Assert
    let versions: Vec<i64> = sqlx::query(
        "SELECT stream_version FROM snapshots WHERE stream_id = ? ORDER BY stream_version",
    )
    .bind(id.to_string())
    .fetch_all(&pool)
    .await
    .unwrap()
    .iter()
    .map(|row| row.get::<i64, _>("stream_version"))
    .collect();
    assert_eq!(versions, vec![100, 200, 300]);

    let events: i64 = sqlx::query("SELECT COUNT(*) AS n FROM events WHERE stream_id = ?")
        .bind(id.to_string())
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(events, 301);
}

#[tokio::test]
async fn test_sqlite_store_without_snapshots() {
    let pool = sqlite_pool().await;
    let store = SqlStore::new(pool, storage::sqlite_config(SnapshotPolicy::disabled()))
        .await
        .unwrap();

    exercise_store(&store).await;
}

#[tokio::test]
async fn test_stale_counter_loses_race() {
    // Arrange
    let store = storage::in_memory_store(0);
    let mut counter = Counter::create("counter-race").unwrap();
    store.save(&mut counter).await.unwrap();
    let id = counter.stream().id().clone();
    let mut first = store.load(&id).await.unwrap();
    let mut second = store.load(&id).await.unwrap();

    // Act
    first.increment_by(1).unwrap();
    store.save(&mut first).await.unwrap();
    second.increment_by(10).unwrap();
    let result = store.save(&mut second).await;

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::VersionConflict { version: 2, .. })
    ));
    assert_eq!(store.load(&id).await.unwrap().current_value(), 1);
}

async fn save_batch_and_reload(store: &dyn EventStore<Counter>) {
    let mut counter = Counter::create("counter-batch").unwrap();
    counter.increment_by(10).unwrap();
    counter.increment_by(20).unwrap();
    counter.increment_by(10).unwrap();
    assert_eq!(counter.current_value(), 40);

    store.save(&mut counter).await.unwrap();
    assert!(!counter.stream().has_pending());

    let loaded = store.load(counter.stream().id()).await.unwrap();
    assert_eq!(loaded.current_value(), 40);
    assert_eq!(loaded.id(), "counter-batch");
    assert_eq!(loaded.stream().version(), 4);
    assert!(!loaded.stream().has_pending());
}

#[tokio::test]
async fn test_in_memory_store_saves_one_batch_of_increments() {
    let store = storage::in_memory_store(0);

    save_batch_and_reload(&store).await;
}

#[tokio::test]
async fn test_sqlite_store_saves_one_batch_of_increments() {
    let pool = sqlite_pool().await;
    let store = SqlStore::new(pool, storage::sqlite_config(SnapshotPolicy::disabled()))
        .await
        .unwrap();

    save_batch_and_reload(&store).await;
}
