use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LegendCacheError, Result};

/// Main configuration structure for the legend cache
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// Tier retention and capacity configuration
    #[serde(default)]
    pub tiers: TierConfig,
    /// Per-character access window configuration
    #[serde(default)]
    pub access_window: AccessWindowConfig,
    /// Compression bounds for Warm legends
    #[serde(default)]
    pub compression: CompressionConfig,
    /// Overall memory budget across Hot and Warm
    #[serde(default)]
    pub memory_budget: MemoryBudgetConfig,
}

impl Config {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| LegendCacheError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate the configuration at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            LegendCacheError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the configuration from `path`, or from the first default location
    /// that exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Locations searched when no explicit config path is given
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::home_dir().map(|h| h.join(".legend-cache").join("config.toml")),
            dirs::config_dir().map(|c| c.join("legend-cache").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Reject settings the cache cannot operate under
    pub fn validate(&self) -> Result<()> {
        if self.access_window.size == 0 {
            return Err(LegendCacheError::Config(
                "access_window.size must be at least 1".to_string(),
            ));
        }
        if self.memory_budget.limit_bytes == 0 {
            return Err(LegendCacheError::Config(
                "memory_budget.limit_bytes must be greater than 0".to_string(),
            ));
        }
        if self.tiers.warm_retention_units < self.tiers.hot_retention_units {
            return Err(LegendCacheError::Config(format!(
                "tiers.warm_retention_units ({}) must not be below tiers.hot_retention_units ({})",
                self.tiers.warm_retention_units, self.tiers.hot_retention_units
            )));
        }
        if self.tiers.warm_promotion_hits == Some(0) {
            return Err(LegendCacheError::Config(
                "tiers.warm_promotion_hits must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional limits that default to a value are written as plain numbers,
/// with 0 switching the limit off.
mod limit {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.unwrap_or(0) as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        Ok((value > 0).then_some(value))
    }
}

/// Tier retention and capacity configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TierConfig {
    /// Units without a reference before a Hot legend is compressed to Warm
    #[serde(default = "default_hot_retention_units")]
    pub hot_retention_units: u64,
    /// Units without a reference before a Warm legend is evicted to Cold
    #[serde(default = "default_warm_retention_units")]
    pub warm_retention_units: u64,
    /// Maximum number of Hot entries (0 = no entry ceiling)
    #[serde(default = "default_hot_capacity_entries", with = "limit")]
    pub hot_capacity_entries: Option<usize>,
    /// Maximum bytes held by Hot entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_capacity_bytes: Option<usize>,
    /// Warm hits after which a Warm legend is promoted back to Hot without a
    /// hint (absent = only explicit hot requests promote)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warm_promotion_hits: Option<u32>,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            hot_retention_units: default_hot_retention_units(),
            warm_retention_units: default_warm_retention_units(),
            hot_capacity_entries: default_hot_capacity_entries(),
            hot_capacity_bytes: None,
            warm_promotion_hits: None,
        }
    }
}

fn default_hot_retention_units() -> u64 {
    20
}

fn default_warm_retention_units() -> u64 {
    80
}

fn default_hot_capacity_entries() -> Option<usize> {
    Some(64)
}

/// Per-character access window configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccessWindowConfig {
    /// Number of most recent unit indices remembered per character
    #[serde(default = "default_access_window_size")]
    pub size: usize,
}

impl Default for AccessWindowConfig {
    fn default() -> Self {
        Self {
            size: default_access_window_size(),
        }
    }
}

fn default_access_window_size() -> usize {
    16
}

/// Compression bounds applied to legends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CompressionConfig {
    /// Maximum voice length in characters, applied to every legend
    #[serde(default = "default_voice_max_length")]
    pub voice_max_length: usize,
    /// Maximum summary length in characters for compressed legends
    /// (0 = keep the whole summary)
    #[serde(default = "default_summary_max_length", with = "limit")]
    pub summary_max_length: Option<usize>,
    /// Number of strongest relationships kept in compressed legends
    /// (0 = keep them all)
    #[serde(default = "default_max_relationships", with = "limit")]
    pub max_relationships: Option<usize>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            voice_max_length: default_voice_max_length(),
            summary_max_length: default_summary_max_length(),
            max_relationships: default_max_relationships(),
        }
    }
}

fn default_voice_max_length() -> usize {
    120
}

fn default_summary_max_length() -> Option<usize> {
    Some(240)
}

fn default_max_relationships() -> Option<usize> {
    Some(3)
}

/// Overall memory budget
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MemoryBudgetConfig {
    /// Target ceiling for Hot + Warm bytes
    #[serde(default = "default_limit_bytes")]
    pub limit_bytes: usize,
}

impl Default for MemoryBudgetConfig {
    fn default() -> Self {
        Self {
            limit_bytes: default_limit_bytes(),
        }
    }
}

fn default_limit_bytes() -> usize {
    4 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.tiers.hot_retention_units, 20);
        assert_eq!(config.tiers.warm_retention_units, 80);
        assert_eq!(config.tiers.hot_capacity_entries, Some(64));
        assert_eq!(config.tiers.hot_capacity_bytes, None);
        assert_eq!(config.tiers.warm_promotion_hits, None);
        assert_eq!(config.access_window.size, 16);
        assert_eq!(config.compression.voice_max_length, 120);
        assert_eq!(config.compression.summary_max_length, Some(240));
        assert_eq!(config.compression.max_relationships, Some(3));
        assert_eq!(config.memory_budget.limit_bytes, 4 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [tiers]
            hot_retention_units = 5
            warm_retention_units = 30
            hot_capacity_entries = 8
            hot_capacity_bytes = 4096
            warm_promotion_hits = 2

            [access_window]
            size = 4

            [compression]
            voice_max_length = 40
            summary_max_length = 80
            max_relationships = 1

            [memory_budget]
            limit_bytes = 65536
        "#;

        let config = Config::from_toml_str(toml_str).expect("Failed to parse TOML");
        assert_eq!(config.tiers.hot_retention_units, 5);
        assert_eq!(config.tiers.warm_retention_units, 30);
        assert_eq!(config.tiers.hot_capacity_entries, Some(8));
        assert_eq!(config.tiers.hot_capacity_bytes, Some(4096));
        assert_eq!(config.tiers.warm_promotion_hits, Some(2));
        assert_eq!(config.access_window.size, 4);
        assert_eq!(config.compression.voice_max_length, 40);
        assert_eq!(config.compression.summary_max_length, Some(80));
        assert_eq!(config.compression.max_relationships, Some(1));
        assert_eq!(config.memory_budget.limit_bytes, 65536);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
            [tiers]
            hot_retention_units = 3
        "#;

        let config = Config::from_toml_str(toml_str).expect("Failed to parse partial TOML");
        assert_eq!(config.tiers.hot_retention_units, 3);
        assert_eq!(config.tiers.warm_retention_units, 80);
        assert_eq!(config.compression, CompressionConfig::default());
        assert_eq!(config.memory_budget, MemoryBudgetConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = Config::from_toml_str("[tiers\nhot_retention_units = ");
        assert!(matches!(result, Err(LegendCacheError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.access_window.size = 0;
        assert!(matches!(config.validate(), Err(LegendCacheError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.memory_budget.limit_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_retention() {
        let mut config = Config::default();
        config.tiers.hot_retention_units = 50;
        config.tiers.warm_retention_units = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("warm_retention_units"));
    }

    #[test]
    fn test_validate_rejects_zero_promotion_hits() {
        let mut config = Config::default();
        config.tiers.warm_promotion_hits = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[memory_budget]\nlimit_bytes = 1024\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.memory_budget.limit_bytes, 1024);
    }

    #[test]
    fn test_from_file_missing_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(LegendCacheError::Config(_))));
    }

    #[test]
    fn test_zero_turns_limits_off() {
        let toml_str = r#"
            [tiers]
            hot_capacity_entries = 0
            hot_capacity_bytes = 4096

            [compression]
            summary_max_length = 0
            max_relationships = 0
        "#;

        let config = Config::from_toml_str(toml_str).unwrap();
        assert_eq!(config.tiers.hot_capacity_entries, None);
        assert_eq!(config.tiers.hot_capacity_bytes, Some(4096));
        assert_eq!(config.compression.summary_max_length, None);
        assert_eq!(config.compression.max_relationships, None);
    }

    #[test]
    fn test_disabled_limits_survive_toml() {
        let mut config = Config::default();
        config.tiers.hot_capacity_entries = None;
        config.tiers.hot_capacity_bytes = Some(4096);
        config.compression.summary_max_length = None;
        config.compression.max_relationships = None;

        let text = toml::to_string(&config).unwrap();
        let reparsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let reparsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(reparsed, config);
    }
}
