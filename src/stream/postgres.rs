//! PostgreSQL event stream
//!
//! Stores events in a `stream_events` table:
//!
//! ```sql
//! CREATE TABLE stream_events (
//!     stream_name TEXT        NOT NULL,
//!     position    BIGINT      NOT NULL,
//!     event_type  TEXT        NOT NULL,
//!     event_data  JSONB       NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (stream_name, position)
//! );
//! ```

use sqlx::PgPool;

use crate::error::EventStoreError;

use super::{EventData, EventStream, ReadDirection, RecordedEvent, StreamPage, StreamPosition};

/// PostgreSQL-backed event stream transport
#[derive(Debug, Clone)]
pub struct PgEventStream {
    pool: PgPool,
}

impl PgEventStream {
    /// Create a new stream transport with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventStream for PgEventStream {
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        // Next position for this stream; append-any semantics, so no
        // expected-version comparison happens here
        let next: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(position) + 1, 0)
            FROM stream_events
            WHERE stream_name = $1
            "#,
        )
        .bind(stream)
        .fetch_one(&mut *tx)
        .await?;

        for (offset, event) in events.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO stream_events (stream_name, position, event_type, event_data)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(stream)
            .bind(next + offset as i64)
            .bind(&event.event_type)
            .bind(&event.data)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn read(
        &self,
        stream: &str,
        direction: ReadDirection,
        from: StreamPosition,
        max_count: u64,
    ) -> Result<StreamPage, EventStoreError> {
        if max_count == 0 {
            return Ok(StreamPage::empty());
        }

        // Fetch one extra row to learn whether more data exists past the page
        let limit = (max_count + 1) as i64;

        let rows: Vec<(i64, String, serde_json::Value)> = match (direction, from) {
            (ReadDirection::Forward, from) => {
                let start = match from {
                    StreamPosition::Start => 0,
                    StreamPosition::At(p) => p as i64,
                    StreamPosition::End => i64::MAX,
                };
                sqlx::query_as(
                    r#"
                    SELECT position, event_type, event_data
                    FROM stream_events
                    WHERE stream_name = $1 AND position >= $2
                    ORDER BY position ASC
                    LIMIT $3
                    "#,
                )
                .bind(stream)
                .bind(start)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            (ReadDirection::Backward, from) => {
                let start = match from {
                    StreamPosition::End => i64::MAX,
                    StreamPosition::At(p) => p as i64,
                    StreamPosition::Start => 0,
                };
                sqlx::query_as(
                    r#"
                    SELECT position, event_type, event_data
                    FROM stream_events
                    WHERE stream_name = $1 AND position <= $2
                    ORDER BY position DESC
                    LIMIT $3
                    "#,
                )
                .bind(stream)
                .bind(start)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let has_more = rows.len() as u64 > max_count;
        let events = rows
            .into_iter()
            .take(max_count as usize)
            .map(|(position, event_type, data)| RecordedEvent {
                event_type,
                data,
                position: position as u64,
            })
            .collect();

        Ok(StreamPage { events, has_more })
    }
}
