//! eventail - Event-Sourced Aggregate Repository
//!
//! Reconstructs aggregates from an append-only event stream, using
//! schema-versioned snapshots to avoid full replays. The repository core
//! talks to narrow storage traits; in-memory and PostgreSQL backends are
//! provided.

pub mod aggregate;
pub mod snapshot;
pub mod store;
pub mod stream;

mod config;
mod error;

pub use aggregate::{Aggregate, DomainEvent};
pub use config::{ConfigError, RepositoryConfig};
pub use error::EventStoreError;
pub use snapshot::{
    Checkpoint, CheckpointStore, MemoryCheckpointStore, MemorySnapshotStore, PgCheckpointStore,
    PgSnapshotStore, Snapshot, SnapshotStore,
};
pub use store::AggregateRepository;
pub use stream::{
    EventData, EventStream, MemoryEventStream, PgEventStream, ReadDirection, RecordedEvent,
    StreamPage, StreamPosition,
};
