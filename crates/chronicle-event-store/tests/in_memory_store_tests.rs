//! Integration tests for `InMemoryStore`.

mod common;

use std::sync::Arc;

use chrono::Duration;
use chronicle_core::entity::{Entity, reconstruct};
use chronicle_core::error::DomainError;
use chronicle_core::event::VersionedEvent;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;
use chronicle_event_store::{InMemoryStore, InMemoryStoreConfig};
use chronicle_test_support::{FixedClock, SteppingClock};

use common::{Account, AccountEvent};

fn id(value: &str) -> StreamId {
    StreamId::new(value).unwrap()
}

// --- load ---

#[tokio::test]
async fn test_load_returns_not_found_for_unknown_stream() {
    let store = InMemoryStore::<Account>::new();

    let result = store.load(&id("missing")).await;

    match result {
        Err(DomainError::StreamNotFound(stream_id)) => assert_eq!(stream_id, id("missing")),
        other => panic!("expected StreamNotFound, got {other:?}"),
    }
}

// --- save + load round-trip ---

#[tokio::test]
async fn test_save_and_load_round_trip() {
    // Arrange
    let store = InMemoryStore::<Account>::new();
    let mut account = Account::open("acc-1", "Alice");
    account.deposit(50);

    // Act
    store.save(&mut account).await.unwrap();
    let loaded = store.load(&id("acc-1")).await.unwrap();

    // Assert
    assert!(!account.stream().has_pending());
    assert_eq!(loaded.owner, "Alice");
    assert_eq!(loaded.balance, 50);
    assert_eq!(loaded.stream().version(), 2);
    assert_eq!(loaded.stream().stream_type(), Some("Account"));
    assert!(!loaded.stream().has_pending());
    assert_eq!(store.event_count(&id("acc-1")).unwrap(), 2);
}

#[tokio::test]
async fn test_save_without_pending_events_is_rejected() {
    let store = InMemoryStore::<Account>::new();
    let mut account = Account::open("acc-1", "Alice");
    store.save(&mut account).await.unwrap();

    let result = store.save(&mut account).await;

    assert!(matches!(result, Err(DomainError::NoEventsToSave(_))));
}

#[tokio::test]
async fn test_streams_are_isolated() {
    let store = InMemoryStore::<Account>::new();
    let mut a = Account::open("acc-a", "Alice");
    let mut b = Account::open("acc-b", "Bob");
    b.deposit(5);

    store.save(&mut a).await.unwrap();
    store.save(&mut b).await.unwrap();

    assert_eq!(store.load(&id("acc-a")).await.unwrap().owner, "Alice");
    assert_eq!(store.load(&id("acc-b")).await.unwrap().balance, 5);
    assert_eq!(store.event_count(&id("acc-a")).unwrap(), 1);
    assert_eq!(store.event_count(&id("acc-b")).unwrap(), 2);
}

// --- concurrency ---

#[tokio::test]
async fn test_stale_save_conflicts_and_leaves_stream_unchanged() {
    // Arrange
    let store = InMemoryStore::<Account>::new();
    let mut account = Account::open("acc-1", "Alice");
    store.save(&mut account).await.unwrap();
    let mut fresh = store.load(&id("acc-1")).await.unwrap();
    let mut stale = store.load(&id("acc-1")).await.unwrap();

    // Act
    fresh.deposit(10);
    store.save(&mut fresh).await.unwrap();
    stale.deposit(99);
    stale.deposit(1);
    let result = store.save(&mut stale).await;

    // Assert
    match result {
        Err(DomainError::VersionConflict { stream_id, version }) => {
            assert_eq!(stream_id, id("acc-1"));
            assert_eq!(version, 2);
        }
        other => panic!("expected VersionConflict, got {other:?}"),
    }
    assert_eq!(store.event_count(&id("acc-1")).unwrap(), 2);
    assert_eq!(store.load(&id("acc-1")).await.unwrap().balance, 10);
}

#[tokio::test]
async fn test_concurrent_saves_have_exactly_one_winner() {
    // Arrange
    let store = Arc::new(InMemoryStore::<Account>::new());
    let mut account = Account::open("acc-1", "Alice");
    store.save(&mut account).await.unwrap();

    // Act
    let mut handles = Vec::new();
    for amount in 1..=8 {
        let store = Arc::clone(&store);
        let mut copy = store.load(&id("acc-1")).await.unwrap();
        handles.push(tokio::spawn(async move {
            copy.deposit(amount);
            store.save(&mut copy).await
        }));
    }
    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => wins += 1,
            Err(DomainError::VersionConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    // Assert
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(store.event_count(&id("acc-1")).unwrap(), 2);
}

// --- stored_at ---

#[tokio::test]
async fn test_stored_at_comes_from_clock() {
    // Arrange
    let start = FixedClock::new_year_2024().0;
    let store = InMemoryStore::<Account>::new()
        .with_clock(Arc::new(SteppingClock::new(start, Duration::minutes(1))));
    let mut account = Account::open("acc-1", "Alice");
    account.deposit(1);

    // Act
    store.save(&mut account).await.unwrap();
    account.deposit(2);
    store.save(&mut account).await.unwrap();

    // Assert
    let stamps = store.stored_at(&id("acc-1")).unwrap();
    assert_eq!(stamps, vec![start, start, start + Duration::minutes(1)]);
}

#[tokio::test]
async fn test_save_with_version_gap_is_rejected_and_stores_nothing() {
    // Arrange
    let store = InMemoryStore::<Account>::new();
    let history = vec![
        VersionedEvent::new(
            AccountEvent::Opened {
                owner: "Alice".to_owned(),
            },
            1,
        ),
        VersionedEvent::new(AccountEvent::Deposited { amount: 5 }, 2),
    ];
    let mut account: Account =
        reconstruct(id("acc-1"), Some("Account".to_owned()), history).unwrap();
    account.deposit(1);

    // Act
    let result = store.save(&mut account).await;

    // Assert
    assert!(matches!(result, Err(DomainError::InvalidHistory { .. })));
    assert_eq!(store.stream_count().unwrap(), 0);
    assert!(matches!(
        store.load(&id("acc-1")).await,
        Err(DomainError::StreamNotFound(_))
    ));
}

// --- snapshots ---

#[tokio::test]
async fn test_snapshots_follow_policy() {
    // Arrange
    let store = InMemoryStore::<Account>::with_snapshots(InMemoryStoreConfig {
        snapshot_every_n_versions: 3,
    });
    let mut account = Account::open("acc-1", "Alice");
    store.save(&mut account).await.unwrap();

    // Act
    for amount in 1..=7 {
        let mut loaded = store.load(&id("acc-1")).await.unwrap();
        loaded.deposit(amount);
        store.save(&mut loaded).await.unwrap();
    }
    let loaded = store.load(&id("acc-1")).await.unwrap();

    // Assert
    assert_eq!(store.snapshot_versions(&id("acc-1")).unwrap(), vec![3, 6]);
    assert_eq!(loaded.balance, 28);
    assert_eq!(loaded.owner, "Alice");
    assert_eq!(loaded.stream().version(), 8);
}

#[tokio::test]
async fn test_load_starts_from_newest_snapshot() {
    // Arrange
    let store = InMemoryStore::<Account>::with_snapshots(InMemoryStoreConfig {
        snapshot_every_n_versions: 2,
    });
    let mut account = Account::open("acc-1", "Alice");
    store.save(&mut account).await.unwrap();
    for amount in [10, 20, 30, 40, 50] {
        let mut loaded = store.load(&id("acc-1")).await.unwrap();
        loaded.deposit(amount);
        store.save(&mut loaded).await.unwrap();
    }
    assert_eq!(store.snapshot_versions(&id("acc-1")).unwrap(), vec![2, 4, 6]);

    // Act
    let loaded = store.load(&id("acc-1")).await.unwrap();

    // Assert
    assert_eq!(loaded.restored_from, Some(6));
    assert_eq!(loaded.balance, 150);
    assert_eq!(loaded.stream().version(), 6);
}

#[tokio::test]
async fn test_load_without_snapshots_replays_from_first_event() {
    let store = InMemoryStore::<Account>::new();
    let mut account = Account::open("acc-1", "Alice");
    account.deposit(5);
    store.save(&mut account).await.unwrap();

    let loaded = store.load(&id("acc-1")).await.unwrap();

    assert_eq!(loaded.restored_from, None);
    assert_eq!(loaded.balance, 5);
}

#[tokio::test]
async fn test_batch_crossing_interval_snapshots_at_batch_end() {
    let store = InMemoryStore::<Account>::with_snapshots(InMemoryStoreConfig {
        snapshot_every_n_versions: 2,
    });
    let mut account = Account::open("acc-1", "Alice");
    account.deposit(1);
    account.deposit(1);
    account.deposit(1);
    account.deposit(1);

    store.save(&mut account).await.unwrap();

    assert_eq!(store.snapshot_versions(&id("acc-1")).unwrap(), vec![5]);
}

#[tokio::test]
async fn test_plain_store_never_snapshots() {
    let store = InMemoryStore::<Account>::new();
    let mut account = Account::open("acc-1", "Alice");
    for _ in 0..10 {
        account.deposit(1);
    }

    store.save(&mut account).await.unwrap();

    assert!(store.snapshot_versions(&id("acc-1")).unwrap().is_empty());
}
