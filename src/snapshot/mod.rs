//! Snapshot module
//!
//! Schema-versioned aggregate snapshots and subscription checkpoints.
//! At most one live snapshot exists per aggregate key; the save path
//! upserts, the load path never writes.

mod memory;
mod postgres;

pub use memory::{MemoryCheckpointStore, MemorySnapshotStore};
pub use postgres::{PgCheckpointStore, PgSnapshotStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventStoreError;

/// A cached, schema-versioned serialization of an aggregate's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregate key this snapshot belongs to
    pub aggregate_key: String,

    /// Schema version of the aggregate type when the snapshot was taken
    pub aggregate_schema_version: i32,

    /// Serialized aggregate state
    pub payload: Option<serde_json::Value>,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// The snapshot threshold configured when this snapshot was taken
    pub take_snapshot_after_events_count: u64,
}

impl Snapshot {
    /// A snapshot is usable for reconstruction only when its payload is
    /// present and both its schema version and its threshold match the
    /// current configuration. Any mismatch forces a stream replay instead.
    pub fn is_usable(&self, schema_version: i32, threshold: u64) -> bool {
        self.payload.is_some()
            && self.aggregate_schema_version == schema_version
            && self.take_snapshot_after_events_count == threshold
    }
}

/// Snapshot persistence, keyed by aggregate key (case-insensitive)
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot for an aggregate key. More than one match is a
    /// data-integrity fault and surfaces as an error.
    async fn load(&self, aggregate_key: &str) -> Result<Option<Snapshot>, EventStoreError>;

    /// Upsert the snapshot for its aggregate key: insert if absent,
    /// otherwise overwrite schema version, payload, timestamp, and
    /// threshold in place.
    async fn save(&self, snapshot: Snapshot) -> Result<(), EventStoreError>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    async fn load(&self, aggregate_key: &str) -> Result<Option<Snapshot>, EventStoreError> {
        self.as_ref().load(aggregate_key).await
    }

    async fn save(&self, snapshot: Snapshot) -> Result<(), EventStoreError> {
        self.as_ref().save(snapshot).await
    }
}

/// A consumer's last committed position in a stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub stream_name: String,
    pub group_name: String,
    pub committed_position: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(stream_name: &str, group_name: &str, committed_position: Option<u64>) -> Self {
        Self {
            stream_name: stream_name.to_string(),
            group_name: group_name.to_string(),
            committed_position,
            updated_at: Utc::now(),
        }
    }
}

/// Checkpoint persistence for subscription-style consumers
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(
        &self,
        stream_name: &str,
        group_name: &str,
    ) -> Result<Option<Checkpoint>, EventStoreError>;

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), EventStoreError>;
}
