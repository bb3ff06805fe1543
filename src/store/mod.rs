//! Aggregate store module
//!
//! Orchestration core: persists new aggregate events and reconstructs
//! aggregate state from the minimal combination of snapshot + trailing
//! events.

mod repository;

pub use repository::AggregateRepository;
