//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library.
//! Everything that interprets records (device segmentation, pivoting, reports)
//! belongs to the application layer.

use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Optional: only emit records with these names (e.g. `["PTR", "PRR"]`)
    #[serde(default)]
    pub record_filter: Option<Vec<String>>,

    /// Optional: stop after emitting this many records
    #[serde(default)]
    pub max_records: Option<usize>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set record name filter
    pub fn with_record_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record_filter = Some(
            names
                .into_iter()
                .map(|n| n.into().to_ascii_uppercase())
                .collect(),
        );
        self
    }

    /// Builder method: cap the number of emitted records
    pub fn with_max_records(mut self, limit: usize) -> Self {
        self.max_records = Some(limit);
        self
    }

    /// Check if a record type should be emitted
    pub fn should_emit(&self, record_name: &str) -> bool {
        match &self.record_filter {
            Some(names) => names.iter().any(|n| n == record_name),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_record_filter(["ptr", "PRR"])
            .with_max_records(10);

        assert_eq!(
            config.record_filter,
            Some(vec!["PTR".to_string(), "PRR".to_string()])
        );
        assert_eq!(config.max_records, Some(10));
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new().with_record_filter(["PTR"]);

        assert!(config.should_emit("PTR"));
        assert!(!config.should_emit("MIR"));
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();
        assert!(config.should_emit("PTR"));
        assert!(config.should_emit("DTR"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: DecoderConfig = serde_json::from_str("{}").unwrap();
        assert!(config.record_filter.is_none());
        assert!(config.max_records.is_none());
    }
}
