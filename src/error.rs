//! Event Store Errors
//!
//! Error types shared by the repository and its storage backends.

/// Errors that can occur in the event store
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// Aggregate id was nil; rejected before any I/O
    #[error("Invalid aggregate id: must be non-nil")]
    InvalidAggregateId,

    /// A snapshot payload failed to deserialize into its aggregate type.
    /// Fatal: no replay fallback is attempted for this failure.
    #[error("Failed to deserialize snapshot payload for aggregate type '{aggregate_type}'")]
    SnapshotDeserialization { aggregate_type: &'static str },

    /// More than one snapshot record matched an aggregate key
    #[error("Multiple snapshots found for aggregate key '{aggregate_key}'")]
    DuplicateSnapshot { aggregate_key: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Check if this error indicates corrupt or inconsistent stored data
    /// (as opposed to a transient transport failure or a caller bug)
    pub fn is_data_fault(&self) -> bool {
        matches!(
            self,
            EventStoreError::SnapshotDeserialization { .. }
                | EventStoreError::DuplicateSnapshot { .. }
        )
    }

    /// Check if this error is a caller-side argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, EventStoreError::InvalidAggregateId)
    }
}
