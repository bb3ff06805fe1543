//! In-memory event stream
//!
//! The primary test backend. Streams are plain vectors; positions are
//! vector indices.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::EventStoreError;

use super::{EventData, EventStream, ReadDirection, RecordedEvent, StreamPage, StreamPosition};

/// In-memory event stream transport
#[derive(Debug, Default)]
pub struct MemoryEventStream {
    streams: RwLock<HashMap<String, Vec<EventData>>>,
}

impl MemoryEventStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events currently in a stream (0 if absent)
    pub async fn stream_len(&self, stream: &str) -> u64 {
        let streams = self.streams.read().await;
        streams.get(stream).map_or(0, |s| s.len() as u64)
    }
}

#[async_trait::async_trait]
impl EventStream for MemoryEventStream {
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<(), EventStoreError> {
        let mut streams = self.streams.write().await;
        streams.entry(stream.to_string()).or_default().extend(events);
        Ok(())
    }

    async fn read(
        &self,
        stream: &str,
        direction: ReadDirection,
        from: StreamPosition,
        max_count: u64,
    ) -> Result<StreamPage, EventStoreError> {
        let streams = self.streams.read().await;

        // A nonexistent stream reads as empty, not as an error
        let Some(events) = streams.get(stream) else {
            return Ok(StreamPage::empty());
        };

        let len = events.len() as u64;
        if len == 0 || max_count == 0 {
            return Ok(StreamPage::empty());
        }

        let recorded = |position: u64| {
            let event = &events[position as usize];
            RecordedEvent {
                event_type: event.event_type.clone(),
                data: event.data.clone(),
                position,
            }
        };

        let page = match direction {
            ReadDirection::Forward => {
                let start = match from {
                    StreamPosition::Start => 0,
                    StreamPosition::At(p) => p,
                    StreamPosition::End => len,
                };
                if start >= len {
                    return Ok(StreamPage::empty());
                }
                let taken = max_count.min(len - start);
                StreamPage {
                    events: (start..start + taken).map(recorded).collect(),
                    has_more: start + taken < len,
                }
            }
            ReadDirection::Backward => {
                let start = match from {
                    StreamPosition::End => len - 1,
                    StreamPosition::At(p) => p.min(len - 1),
                    StreamPosition::Start => 0,
                };
                let taken = max_count.min(start + 1);
                StreamPage {
                    events: (start + 1 - taken..=start).rev().map(recorded).collect(),
                    has_more: start + 1 > taken,
                }
            }
        };

        Ok(page)
    }
}
