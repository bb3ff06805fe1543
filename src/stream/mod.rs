//! Stream transport module
//!
//! Narrow interface over a named append-only event log. Reading a stream
//! that does not exist yields an empty page, never an error.

mod memory;
mod postgres;

pub use memory::MemoryEventStream;
pub use postgres::PgEventStream;

use async_trait::async_trait;

use crate::aggregate::DomainEvent;
use crate::error::EventStoreError;

/// Direction of a stream read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDirection {
    Forward,
    Backward,
}

/// Where a read starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPosition {
    /// The oldest event in the stream
    Start,
    /// The newest event in the stream
    End,
    /// An explicit 0-based position
    At(u64),
}

/// An event prepared for appending
#[derive(Debug, Clone)]
pub struct EventData {
    pub event_type: String,
    pub data: serde_json::Value,
}

impl EventData {
    /// Serialize a domain event into its stored form
    pub fn from_event<E: DomainEvent>(event: &E) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: serde_json::to_value(event)?,
        })
    }
}

/// An event read back from a stream
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub event_type: String,
    pub data: serde_json::Value,

    /// 0-based position within the stream (transport convention)
    pub position: u64,
}

impl RecordedEvent {
    /// 1-based event number, the convention used everywhere above the
    /// transport layer
    pub fn event_number(&self) -> u64 {
        self.position + 1
    }
}

/// One page of a stream read
#[derive(Debug, Clone, Default)]
pub struct StreamPage {
    /// Events in read order (backward pages are newest-first)
    pub events: Vec<RecordedEvent>,

    /// Whether more events exist past this page in the read direction
    pub has_more: bool,
}

impl StreamPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Append-only event log transport
#[async_trait]
pub trait EventStream: Send + Sync {
    /// Append events to a stream in order, with append-any semantics:
    /// no expected-version check is performed at this layer.
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<(), EventStoreError>;

    /// Read up to `max_count` events from a stream.
    ///
    /// Forward reads return events oldest-first starting at `from`;
    /// backward reads return events newest-first. A nonexistent stream
    /// yields an empty page.
    async fn read(
        &self,
        stream: &str,
        direction: ReadDirection,
        from: StreamPosition,
        max_count: u64,
    ) -> Result<StreamPage, EventStoreError>;
}

#[async_trait]
impl<T: EventStream + ?Sized> EventStream for std::sync::Arc<T> {
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<(), EventStoreError> {
        self.as_ref().append(stream, events).await
    }

    async fn read(
        &self,
        stream: &str,
        direction: ReadDirection,
        from: StreamPosition,
        max_count: u64,
    ) -> Result<StreamPage, EventStoreError> {
        self.as_ref().read(stream, direction, from, max_count).await
    }
}
