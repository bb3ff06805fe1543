//! Configuration module
//!
//! Repository tuning knobs, constructible directly or from environment
//! variables.

use std::env;

/// Repository configuration
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Maximum number of events fetched per read call (page size)
    pub events_max_count: u64,

    /// Number of events between snapshots
    pub take_snapshot_after_events_count: u64,
}

impl RepositoryConfig {
    /// Create a configuration; both values must be positive
    pub fn new(
        events_max_count: u64,
        take_snapshot_after_events_count: u64,
    ) -> Result<Self, ConfigError> {
        if events_max_count == 0 {
            return Err(ConfigError::InvalidValue("EVENTS_MAX_COUNT"));
        }
        if take_snapshot_after_events_count == 0 {
            return Err(ConfigError::InvalidValue("TAKE_SNAPSHOT_AFTER_EVENTS_COUNT"));
        }

        Ok(Self {
            events_max_count,
            take_snapshot_after_events_count,
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let events_max_count = env::var("EVENTS_MAX_COUNT")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("EVENTS_MAX_COUNT"))?;

        let take_snapshot_after_events_count = env::var("TAKE_SNAPSHOT_AFTER_EVENTS_COUNT")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TAKE_SNAPSHOT_AFTER_EVENTS_COUNT"))?;

        Self::new(events_max_count, take_snapshot_after_events_count)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for configuration variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = RepositoryConfig::new(100, 5).unwrap();
        assert_eq!(config.events_max_count, 100);
        assert_eq!(config.take_snapshot_after_events_count, 5);
    }

    #[test]
    fn test_config_rejects_zero_page_size() {
        let result = RepositoryConfig::new(0, 5);
        assert!(matches!(result, Err(ConfigError::InvalidValue("EVENTS_MAX_COUNT"))));
    }

    #[test]
    fn test_config_rejects_zero_threshold() {
        let result = RepositoryConfig::new(100, 0);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("TAKE_SNAPSHOT_AFTER_EVENTS_COUNT"))
        ));
    }
}
