//! A small account entity shared by the store integration tests.

#![allow(dead_code)]

use chronicle_core::entity::{Entity, new_entity_with_type};
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::snapshot::{Snapshot, SnapshotEntity};
use chronicle_core::stream::Stream;
use chronicle_core::transport::{DefaultMapper, NoOpMapper, TransportEvent};
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    Opened { owner: String },
    Deposited { amount: i64 },
    Withdrawn { amount: i64 },
}

impl AccountEvent {
    pub const NAMES: [&'static str; 3] = ["Opened_v1", "Deposited_v1", "Withdrawn_v1"];
}

impl Event<Account> for AccountEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Opened { .. } => Self::NAMES[0],
            Self::Deposited { .. } => Self::NAMES[1],
            Self::Withdrawn { .. } => Self::NAMES[2],
        }
    }

    fn apply_to(&self, account: &mut Account) -> Result<(), DomainError> {
        match self {
            Self::Opened { owner } => account.owner.clone_from(owner),
            Self::Deposited { amount } => account.balance += amount,
            Self::Withdrawn { amount } => {
                if *amount > account.balance {
                    return Err(DomainError::Validation("insufficient funds".to_owned()));
                }
                account.balance -= amount;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub owner: String,
    pub balance: i64,
    /// Stream version the snapshot was taken at.
    #[serde(default)]
    pub taken_at: i64,
}

impl Snapshot<Account> for AccountSnapshot {
    fn name(&self) -> &'static str {
        "AccountSnapshot_v1"
    }

    fn apply_to(&self, account: &mut Account) -> Result<(), DomainError> {
        account.owner.clone_from(&self.owner);
        account.balance = self.balance;
        account.restored_from = Some(self.taken_at);
        Ok(())
    }
}

#[derive(Debug)]
pub struct Account {
    stream: Stream<AccountEvent>,
    pub owner: String,
    pub balance: i64,
    /// Version of the snapshot the account was rebuilt from, if any.
    pub restored_from: Option<i64>,
}

impl Account {
    pub fn open(id: &str, owner: &str) -> Self {
        let mut account: Self = new_entity_with_type(id, "Account").unwrap();
        account
            .record(AccountEvent::Opened {
                owner: owner.to_owned(),
            })
            .unwrap();
        account
    }

    pub fn deposit(&mut self, amount: i64) {
        self.record(AccountEvent::Deposited { amount }).unwrap();
    }
}

impl Entity for Account {
    type Event = AccountEvent;

    fn stream(&self) -> &Stream<AccountEvent> {
        &self.stream
    }

    fn stream_mut(&mut self) -> &mut Stream<AccountEvent> {
        &mut self.stream
    }

    fn with_stream(stream: Stream<AccountEvent>) -> Self {
        Self {
            stream,
            owner: String::new(),
            balance: 0,
            restored_from: None,
        }
    }
}

impl SnapshotEntity for Account {
    type Snapshot = AccountSnapshot;

    fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            owner: self.owner.clone(),
            balance: self.balance,
            taken_at: self.stream().version(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenedV1 {
    pub owner: String,
}

impl TransportEvent<Account> for OpenedV1 {
    const NAME: &'static str = "Opened_v1";

    fn from_event(event: &AccountEvent) -> Option<Self> {
        match event {
            AccountEvent::Opened { owner } => Some(Self {
                owner: owner.clone(),
            }),
            _ => None,
        }
    }

    fn into_event(self) -> AccountEvent {
        AccountEvent::Opened { owner: self.owner }
    }

    fn visit_sensitive(
        &mut self,
        visit: &mut dyn FnMut(&mut String) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        visit(&mut self.owner)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositedV1 {
    pub amount: i64,
}

impl TransportEvent<Account> for DepositedV1 {
    const NAME: &'static str = "Deposited_v1";

    fn from_event(event: &AccountEvent) -> Option<Self> {
        match event {
            AccountEvent::Deposited { amount } => Some(Self { amount: *amount }),
            _ => None,
        }
    }

    fn into_event(self) -> AccountEvent {
        AccountEvent::Deposited {
            amount: self.amount,
        }
    }
}

pub fn noop_mapper() -> NoOpMapper<Account> {
    NoOpMapper::new(AccountEvent::NAMES)
}

pub fn default_mapper() -> DefaultMapper<Account> {
    DefaultMapper::new()
        .register::<OpenedV1>()
        .register::<DepositedV1>()
}

pub async fn sqlite_pool() -> AnyPool {
    sqlx::any::install_default_drivers();
    AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}
