//! Common test fixtures: a Wallet aggregate and I/O-counting store wrappers

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eventail::{
    Aggregate, DomainEvent, EventData, EventStoreError, EventStream, MemoryEventStream,
    MemorySnapshotStore, ReadDirection, Snapshot, SnapshotStore, StreamPage, StreamPosition,
};

pub use eventail::{AggregateRepository, RepositoryConfig};

/// Events of the Wallet test aggregate. `LegacyDeposited` is an older
/// schema shape kept only so historical payloads keep replaying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalletEvent {
    Deposited { amount: i64 },
    Withdrawn { amount: i64 },
    LegacyDeposited { amount: i64 },
}

impl DomainEvent for WalletEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WalletEvent::Deposited { .. } => "Deposited",
            WalletEvent::Withdrawn { .. } => "Withdrawn",
            WalletEvent::LegacyDeposited { .. } => "LegacyDeposited",
        }
    }

    fn resolve(
        event_type: &str,
        data: &serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        match event_type {
            "Deposited" | "Withdrawn" | "LegacyDeposited" => {
                serde_json::from_value(data.clone()).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn upgrade(self) -> Self {
        match self {
            WalletEvent::LegacyDeposited { amount } => WalletEvent::Deposited { amount },
            other => other,
        }
    }
}

/// Wallet test aggregate: a balance derived from deposit/withdraw events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    id: Uuid,
    balance: i64,
    version: u64,
    #[serde(skip)]
    history: Vec<WalletEvent>,
}

impl Wallet {
    pub fn deposit(self, amount: i64) -> Self {
        self.record(WalletEvent::Deposited { amount })
    }

    pub fn withdraw(self, amount: i64) -> Self {
        self.record(WalletEvent::Withdrawn { amount })
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }
}

impl Aggregate for Wallet {
    type Event = WalletEvent;

    const SCHEMA_VERSION: i32 = 1;

    fn aggregate_type() -> &'static str {
        "Wallet"
    }

    fn with_id(id: Uuid) -> Self {
        Self {
            id,
            balance: 0,
            version: 0,
            history: Vec::new(),
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(mut self, event: Self::Event) -> Self {
        match event {
            WalletEvent::Deposited { amount } => self.balance += amount,
            WalletEvent::Withdrawn { amount } => self.balance -= amount,
            WalletEvent::LegacyDeposited { amount } => self.balance += amount,
        }
        self.version += 1;
        self
    }

    fn record(mut self, event: Self::Event) -> Self {
        self.history.push(event.clone());
        self.apply(event)
    }

    fn history(&self) -> &[Self::Event] {
        &self.history
    }

    fn take_history(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.history)
    }
}

/// Stream wrapper that counts read and append calls
#[derive(Debug, Default)]
pub struct CountingStream {
    inner: MemoryEventStream,
    reads: AtomicU64,
    appends: AtomicU64,
}

impl CountingStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn appends(&self) -> u64 {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.appends.store(0, Ordering::SeqCst);
    }

    pub async fn stream_len(&self, stream: &str) -> u64 {
        self.inner.stream_len(stream).await
    }
}

#[async_trait::async_trait]
impl EventStream for CountingStream {
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<(), EventStoreError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.inner.append(stream, events).await
    }

    async fn read(
        &self,
        stream: &str,
        direction: ReadDirection,
        from: StreamPosition,
        max_count: u64,
    ) -> Result<StreamPage, EventStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(stream, direction, from, max_count).await
    }
}

/// Snapshot store wrapper that counts load and save calls
#[derive(Debug, Default)]
pub struct CountingSnapshotStore {
    inner: MemorySnapshotStore,
    loads: AtomicU64,
    saves: AtomicU64,
}

impl CountingSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for CountingSnapshotStore {
    async fn load(&self, aggregate_key: &str) -> Result<Option<Snapshot>, EventStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(aggregate_key).await
    }

    async fn save(&self, snapshot: Snapshot) -> Result<(), EventStoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(snapshot).await
    }
}

/// Repository over counting in-memory backends, with handles kept for
/// asserting on I/O counts
pub struct TestHarness {
    pub repository:
        AggregateRepository<Arc<CountingStream>, Arc<CountingSnapshotStore>>,
    pub stream: Arc<CountingStream>,
    pub snapshots: Arc<CountingSnapshotStore>,
}

/// Initialize tracing for test output; safe to call repeatedly
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventail=debug".into()),
        )
        .try_init();
}

impl TestHarness {
    pub fn new(events_max_count: u64, threshold: u64) -> Self {
        init_tracing();
        let stream = Arc::new(CountingStream::new());
        let snapshots = Arc::new(CountingSnapshotStore::new());
        let config = RepositoryConfig::new(events_max_count, threshold).unwrap();
        let repository = AggregateRepository::new(stream.clone(), snapshots.clone(), config);
        Self {
            repository,
            stream,
            snapshots,
        }
    }
}
