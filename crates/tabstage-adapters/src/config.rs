//! In-memory configuration for the completion pipeline.
//!
//! Nothing is persisted; the host hands the record over at startup,
//! typically as a JSON blob embedded in the editor's settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tabstage_core::protocol::ProviderType;

pub const DEFAULT_PROXIMITY_THRESHOLD: i64 = 3;
pub const DEFAULT_CHAR_DIFF_MIN_COMMON: usize = 3;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

const MAX_PROXIMITY_THRESHOLD: i64 = 200;
const MAX_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Which completion backend serves requests.
    #[serde(default)]
    pub provider_type: ProviderType,
    /// Maximum gap (in lines) tolerated inside one change cluster.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: i64,
    /// Drop clusters entirely outside the editor viewport.
    #[serde(default)]
    pub viewport_filter: bool,
    /// Diff cache size in entries; 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Minimum shared prefix+suffix before a modification is refined into a
    /// char-level change.
    #[serde(default = "default_char_diff_min_common")]
    pub char_diff_min_common: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            viewport_filter: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            char_diff_min_common: DEFAULT_CHAR_DIFF_MIN_COMMON,
        }
    }
}

fn default_proximity_threshold() -> i64 {
    DEFAULT_PROXIMITY_THRESHOLD
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_char_diff_min_common() -> usize {
    DEFAULT_CHAR_DIFF_MIN_COMMON
}

impl Config {
    /// Clamp out-of-range values instead of rejecting the record.
    pub fn sanitize(&mut self) {
        self.proximity_threshold = self.proximity_threshold.clamp(0, MAX_PROXIMITY_THRESHOLD);
        self.cache_capacity = self.cache_capacity.min(MAX_CACHE_CAPACITY);
    }

    /// Parse a JSON settings blob; unrecognised options are ignored and
    /// missing ones filled with defaults.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut config: Config =
            serde_json::from_str(content).context("invalid configuration")?;
        config.sanitize();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.provider_type, ProviderType::Zeta);
        assert_eq!(config.proximity_threshold, 3);
        assert!(!config.viewport_filter);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.char_diff_min_common, 3);
    }

    #[test]
    fn test_config_fills_missing_options_with_defaults() {
        let config = Config::from_json_str(r#"{"provider_type":"sweep"}"#).unwrap();
        assert_eq!(config.provider_type, ProviderType::Sweep);
        assert_eq!(config.proximity_threshold, DEFAULT_PROXIMITY_THRESHOLD);
        assert_eq!(config.char_diff_min_common, DEFAULT_CHAR_DIFF_MIN_COMMON);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config {
            provider_type: ProviderType::AutoComplete,
            proximity_threshold: 5,
            viewport_filter: true,
            cache_capacity: 16,
            char_diff_min_common: 4,
        };
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded = Config::from_json_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_config_sanitize_clamps_out_of_range_values() {
        let mut config = Config {
            proximity_threshold: -2,
            cache_capacity: 1_000_000,
            ..Config::default()
        };
        config.sanitize();
        assert_eq!(config.proximity_threshold, 0);
        assert_eq!(config.cache_capacity, MAX_CACHE_CAPACITY);
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        assert!(Config::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_config_rejects_unknown_provider() {
        let err = Config::from_json_str(r#"{"provider_type":"copilot"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
