//! Aggregate Repository
//!
//! Core implementation of the snapshot-assisted aggregate repository.
//! `save_aggregate` appends new events and opportunistically refreshes the
//! snapshot; `load_aggregate` reconstructs state from snapshot + tail,
//! falling back to a forward replay whenever the snapshot cannot be used.

use uuid::Uuid;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::config::RepositoryConfig;
use crate::error::EventStoreError;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::stream::{EventData, EventStream, ReadDirection, RecordedEvent, StreamPosition};

/// Repository for persisting and reconstructing event-sourced aggregates
#[derive(Debug, Clone)]
pub struct AggregateRepository<S, P> {
    stream: S,
    snapshots: P,
    config: RepositoryConfig,
}

impl<S, P> AggregateRepository<S, P>
where
    S: EventStream,
    P: SnapshotStore,
{
    /// Create a new repository over a stream transport and a snapshot store
    pub fn new(stream: S, snapshots: P, config: RepositoryConfig) -> Self {
        Self {
            stream,
            snapshots,
            config,
        }
    }

    /// Append an aggregate's pending events and refresh its snapshot when
    /// enough events have accumulated past the last snapshot boundary.
    ///
    /// Appends use append-any semantics: no expected-version check is made,
    /// so concurrent saves for the same aggregate may interleave. Resolving
    /// that conflict is an external-synchronization concern, not handled
    /// here.
    pub async fn save_aggregate<A: Aggregate>(
        &self,
        aggregate: &mut A,
    ) -> Result<(), EventStoreError> {
        let history = aggregate.take_history();
        if history.is_empty() {
            return Ok(());
        }

        let stream_key = A::stream_key(aggregate.id());

        let batch: Vec<EventData> = history
            .iter()
            .map(EventData::from_event)
            .collect::<Result<_, _>>()?;
        self.stream.append(&stream_key, batch).await?;

        // One-element backward read to learn the current tail number
        let tail = self
            .stream
            .read(&stream_key, ReadDirection::Backward, StreamPosition::End, 1)
            .await?;
        let Some(newest) = tail.events.first() else {
            // Empty stream right after a non-empty append; skip snapshot
            // maintenance for this call
            tracing::warn!(stream = %stream_key, "stream empty after append, skipping snapshot");
            return Ok(());
        };
        let last_event_number = newest.event_number();

        let threshold = self.config.take_snapshot_after_events_count;
        match self.snapshots.load(&stream_key).await? {
            Some(snap) if snap.is_usable(A::SCHEMA_VERSION, threshold) => {
                let hydrated: A = hydrate(&snap)?;
                if last_event_number.saturating_sub(hydrated.version()) >= threshold {
                    let boundary = snapshot_boundary(last_event_number, threshold);
                    let take_count = boundary.saturating_sub(hydrated.version());
                    let from = hydrated.version();
                    let refreshed = self
                        .replay_onto(hydrated, &stream_key, from, Some(take_count))
                        .await?;
                    self.write_snapshot(&stream_key, &refreshed).await?;
                }
            }
            _ => {
                if last_event_number > threshold {
                    let boundary = snapshot_boundary(last_event_number, threshold);
                    let fresh = A::with_id(aggregate.id());
                    let refreshed = self
                        .replay_onto(fresh, &stream_key, 0, Some(boundary))
                        .await?;
                    self.write_snapshot(&stream_key, &refreshed).await?;
                }
            }
        }

        Ok(())
    }

    /// Reconstruct an aggregate's current state.
    ///
    /// One backward page (up to `threshold` events) decides the strategy:
    /// the whole stream fits in the page and is applied directly, or a
    /// snapshot is consulted and either returned as-is, patched with the
    /// already-fetched tail, or topped up by a targeted forward replay.
    pub async fn load_aggregate<A: Aggregate>(&self, id: Uuid) -> Result<A, EventStoreError> {
        if id.is_nil() {
            return Err(EventStoreError::InvalidAggregateId);
        }

        let aggregate = A::with_id(id);
        let stream_key = A::stream_key(id);
        let threshold = self.config.take_snapshot_after_events_count;

        let page = self
            .stream
            .read(
                &stream_key,
                ReadDirection::Backward,
                StreamPosition::End,
                threshold,
            )
            .await?;

        // Stream has never been written to
        if page.is_empty() {
            return Ok(aggregate);
        }

        // Whole stream fits in one page: no snapshot boundary has ever been
        // crossed, apply everything chronologically
        if (page.len() as u64) < threshold {
            let mut events = page.events;
            events.reverse();
            return apply_all(aggregate, &events);
        }

        // Full page: the stream is at least `threshold` long, a snapshot
        // boundary may exist at or before this point
        let snap = match self.snapshots.load(&stream_key).await? {
            Some(s) if s.is_usable(A::SCHEMA_VERSION, threshold) => s,
            // Absent or unusable: full replay from the start of the stream
            _ => return self.replay_onto(aggregate, &stream_key, 0, None).await,
        };

        let hydrated: A = hydrate(&snap)?;
        let next_version = hydrated.version() + 1;
        let latest_event_number = page.events[0].event_number();
        let events_since_snapshot = latest_event_number % threshold;

        if events_since_snapshot == 0 {
            // Tail aligned on a boundary
            if hydrated.version() == latest_event_number {
                return Ok(hydrated);
            }
            let from = hydrated.version();
            let take_count = latest_event_number.saturating_sub(hydrated.version());
            return self
                .replay_onto(hydrated, &stream_key, from, Some(take_count))
                .await;
        }

        // Candidate unapplied tail, taken from the page already in hand
        let mut candidates: Vec<RecordedEvent> =
            page.events[..events_since_snapshot as usize].to_vec();
        candidates.reverse();

        if candidates[0].event_number() == next_version {
            // The page already holds exactly the unapplied tail; no second
            // round trip needed
            return apply_all(hydrated, &candidates);
        }

        // Gap between snapshot and the fetched page; replay it
        let from = hydrated.version();
        let take_count = latest_event_number.saturating_sub(hydrated.version());
        self.replay_onto(hydrated, &stream_key, from, Some(take_count))
            .await
    }

    /// Replay events forward onto an aggregate, one page at a time.
    ///
    /// `take_count` of `None` means "to the end of the stream". Stops when
    /// the cap is reached, the transport reports no further data, or a page
    /// comes back empty.
    async fn replay_onto<A: Aggregate>(
        &self,
        mut aggregate: A,
        stream_key: &str,
        mut position: u64,
        take_count: Option<u64>,
    ) -> Result<A, EventStoreError> {
        let mut remaining = take_count;

        loop {
            let page_size = match remaining {
                Some(0) => break,
                Some(n) => n.min(self.config.events_max_count),
                None => self.config.events_max_count,
            };

            let page = self
                .stream
                .read(
                    stream_key,
                    ReadDirection::Forward,
                    StreamPosition::At(position),
                    page_size,
                )
                .await?;
            if page.is_empty() {
                break;
            }

            let fetched = page.len() as u64;
            aggregate = apply_all(aggregate, &page.events)?;

            position += fetched;
            if let Some(n) = remaining {
                remaining = Some(n.saturating_sub(fetched));
            }
            if !page.has_more {
                break;
            }
        }

        Ok(aggregate)
    }

    /// Serialize an aggregate and upsert its snapshot
    async fn write_snapshot<A: Aggregate>(
        &self,
        stream_key: &str,
        aggregate: &A,
    ) -> Result<(), EventStoreError> {
        let payload = serde_json::to_value(aggregate)?;

        let snapshot = Snapshot {
            aggregate_key: stream_key.to_string(),
            aggregate_schema_version: A::SCHEMA_VERSION,
            payload: Some(payload),
            timestamp: chrono::Utc::now(),
            take_snapshot_after_events_count: self.config.take_snapshot_after_events_count,
        };
        self.snapshots.save(snapshot).await?;

        tracing::info!(
            "Snapshot saved for {} at version {}",
            stream_key,
            aggregate.version()
        );

        Ok(())
    }
}

/// Snapshots always land on a multiple of the threshold, so the load path
/// can locate the unapplied tail with plain modulo arithmetic
fn snapshot_boundary(last_event_number: u64, threshold: u64) -> u64 {
    last_event_number - last_event_number % threshold
}

/// Deserialize a snapshot payload into its aggregate type. Failure here is
/// fatal; no replay fallback is attempted for a corrupt payload.
fn hydrate<A: Aggregate>(snapshot: &Snapshot) -> Result<A, EventStoreError> {
    let payload = snapshot
        .payload
        .as_ref()
        .ok_or(EventStoreError::SnapshotDeserialization {
            aggregate_type: A::aggregate_type(),
        })?;

    serde_json::from_value(payload.clone()).map_err(|_| EventStoreError::SnapshotDeserialization {
        aggregate_type: A::aggregate_type(),
    })
}

/// Materialize and apply recorded events in order. Unresolvable event types
/// (retired from the codebase) are skipped without bumping the version.
fn apply_all<A: Aggregate>(
    mut aggregate: A,
    events: &[RecordedEvent],
) -> Result<A, EventStoreError> {
    for recorded in events {
        match A::Event::resolve(&recorded.event_type, &recorded.data)? {
            Some(event) => aggregate = aggregate.apply(event.upgrade()),
            None => {
                tracing::warn!(
                    "Skipping unresolvable event type '{}' at position {}",
                    recorded.event_type,
                    recorded.position
                );
            }
        }
    }
    Ok(aggregate)
}
