//! In-memory snapshot and checkpoint stores

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::EventStoreError;

use super::{Checkpoint, CheckpointStore, Snapshot, SnapshotStore};

/// In-memory snapshot store. Lookups are case-insensitive; the map is
/// keyed by the lowercased aggregate key, so duplicates cannot arise here.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots currently stored
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, aggregate_key: &str) -> Result<Option<Snapshot>, EventStoreError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_key.to_lowercase()).cloned())
    }

    async fn save(&self, snapshot: Snapshot) -> Result<(), EventStoreError> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_key.to_lowercase(), snapshot);
        Ok(())
    }
}

/// In-memory checkpoint store, keyed by (stream, group)
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: RwLock<HashMap<(String, String), Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(
        &self,
        stream_name: &str,
        group_name: &str,
    ) -> Result<Option<Checkpoint>, EventStoreError> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints
            .get(&(stream_name.to_string(), group_name.to_string()))
            .cloned())
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), EventStoreError> {
        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.insert(
            (checkpoint.stream_name.clone(), checkpoint.group_name.clone()),
            checkpoint,
        );
        Ok(())
    }
}
