//! Aggregate module
//!
//! Aggregate Root pattern for Event Sourcing. State is derived from events,
//! never directly mutated; the repository reconstructs aggregates by applying
//! their event history in stream order.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A typed, immutable domain fact, identified by a type-tag string
pub trait DomainEvent: Sized + Clone + Send + Sync + Serialize {
    /// Get the event type tag as stored in the stream
    fn event_type(&self) -> &'static str;

    /// Resolve a stored event by its type tag.
    ///
    /// `Ok(None)` means the tag is unknown (a retired event type); the
    /// repository skips such events silently during replay. A payload that
    /// fails to decode for a known tag is an error and propagates.
    fn resolve(
        event_type: &str,
        data: &serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error>;

    /// Upgrade older schema shapes to the current one.
    ///
    /// Called on every resolved event before it is applied. The default is
    /// the identity; implement this when historical streams carry payloads
    /// the current `apply` cannot consume directly.
    fn upgrade(self) -> Self {
        self
    }
}

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Send + Serialize + DeserializeOwned {
    /// The type of events this aggregate handles
    type Event: DomainEvent;

    /// Schema version of the in-memory aggregate shape. Snapshots taken
    /// under a different schema version are unusable and force a replay.
    const SCHEMA_VERSION: i32;

    /// Get the aggregate type name (used to build the stream key)
    fn aggregate_type() -> &'static str;

    /// Create an empty aggregate (version 0) with the given id
    fn with_id(id: Uuid) -> Self;

    /// Get the aggregate ID
    fn id(&self) -> Uuid;

    /// Get the current version (number of events applied)
    fn version(&self) -> u64;

    /// Apply an event: update state and bump version by exactly 1.
    /// Used during replay; must not touch history.
    fn apply(self, event: Self::Event) -> Self;

    /// Record a new event: push it onto history, then apply it.
    /// Used by command code producing new facts.
    fn record(self, event: Self::Event) -> Self;

    /// Pending events produced since load, not yet persisted
    fn history(&self) -> &[Self::Event];

    /// Drain the pending events (called by the save path)
    fn take_history(&mut self) -> Vec<Self::Event>;

    /// Stream key for one aggregate instance
    fn stream_key(id: Uuid) -> String {
        format!("{}-{}", Self::aggregate_type(), id)
    }
}
