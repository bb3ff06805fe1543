//! PostgreSQL snapshot and checkpoint stores
//!
//! Backing tables:
//!
//! ```sql
//! CREATE TABLE aggregate_snapshots (
//!     aggregate_key  TEXT        NOT NULL,
//!     schema_version INT         NOT NULL,
//!     payload        JSONB,
//!     snapshot_after BIGINT      NOT NULL,
//!     created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE stream_checkpoints (
//!     stream_name        TEXT        NOT NULL,
//!     group_name         TEXT        NOT NULL,
//!     committed_position BIGINT,
//!     updated_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (stream_name, group_name)
//! );
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::EventStoreError;

use super::{Checkpoint, CheckpointStore, Snapshot, SnapshotStore};

/// PostgreSQL-backed snapshot store
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    /// Create a new snapshot store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load(&self, aggregate_key: &str) -> Result<Option<Snapshot>, EventStoreError> {
        let rows: Vec<(String, i32, Option<serde_json::Value>, i64, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT aggregate_key, schema_version, payload, snapshot_after, created_at
                FROM aggregate_snapshots
                WHERE LOWER(aggregate_key) = LOWER($1)
                "#,
            )
            .bind(aggregate_key)
            .fetch_all(&self.pool)
            .await?;

        if rows.len() > 1 {
            return Err(EventStoreError::DuplicateSnapshot {
                aggregate_key: aggregate_key.to_string(),
            });
        }

        Ok(rows.into_iter().next().map(
            |(aggregate_key, schema_version, payload, snapshot_after, created_at)| Snapshot {
                aggregate_key,
                aggregate_schema_version: schema_version,
                payload,
                timestamp: created_at,
                take_snapshot_after_events_count: snapshot_after as u64,
            },
        ))
    }

    async fn save(&self, snapshot: Snapshot) -> Result<(), EventStoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE aggregate_snapshots
            SET schema_version = $2, payload = $3, snapshot_after = $4, created_at = $5
            WHERE LOWER(aggregate_key) = LOWER($1)
            "#,
        )
        .bind(&snapshot.aggregate_key)
        .bind(snapshot.aggregate_schema_version)
        .bind(&snapshot.payload)
        .bind(snapshot.take_snapshot_after_events_count as i64)
        .bind(snapshot.timestamp)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO aggregate_snapshots
                    (aggregate_key, schema_version, payload, snapshot_after, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&snapshot.aggregate_key)
            .bind(snapshot.aggregate_schema_version)
            .bind(&snapshot.payload)
            .bind(snapshot.take_snapshot_after_events_count as i64)
            .bind(snapshot.timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

/// PostgreSQL-backed checkpoint store
#[derive(Debug, Clone)]
pub struct PgCheckpointStore {
    pool: PgPool,
}

impl PgCheckpointStore {
    /// Create a new checkpoint store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CheckpointStore for PgCheckpointStore {
    async fn load(
        &self,
        stream_name: &str,
        group_name: &str,
    ) -> Result<Option<Checkpoint>, EventStoreError> {
        let row: Option<(Option<i64>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT committed_position, updated_at
            FROM stream_checkpoints
            WHERE stream_name = $1 AND group_name = $2
            "#,
        )
        .bind(stream_name)
        .bind(group_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(committed_position, updated_at)| Checkpoint {
            stream_name: stream_name.to_string(),
            group_name: group_name.to_string(),
            committed_position: committed_position.map(|p| p as u64),
            updated_at,
        }))
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), EventStoreError> {
        sqlx::query(
            r#"
            INSERT INTO stream_checkpoints (stream_name, group_name, committed_position, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (stream_name, group_name)
            DO UPDATE SET committed_position = $3, updated_at = $4
            "#,
        )
        .bind(&checkpoint.stream_name)
        .bind(&checkpoint.group_name)
        .bind(checkpoint.committed_position.map(|p| p as i64))
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
