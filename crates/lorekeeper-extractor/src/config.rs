//! Extraction settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How liberally the model is prompted to mine entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggressiveness {
    /// Only clearly important, repeatedly mentioned entities
    Conservative,
    /// Named entities that matter to the narrative
    Balanced,
    /// Every named thing, however incidental
    Obsessive,
}

impl Default for Aggressiveness {
    fn default() -> Self {
        Aggressiveness::Balanced
    }
}

/// Settings for one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Maximum chunk size (characters)
    pub chunk_size: usize,

    /// Which extraction prompt to use
    pub aggressiveness: Aggressiveness,

    /// Entities below this confidence are dropped
    pub confidence_threshold: f64,

    /// Whether relationships are extracted at all
    pub enable_relationships: bool,

    /// Cap on the number of chunks sent to the model (bounds latency/cost)
    pub max_chunks: usize,

    /// Chunk calls issued concurrently per batch
    pub parallel_batch_size: usize,

    /// Per-chunk model call timeout (seconds)
    pub chunk_timeout_secs: u64,

    /// Overall pipeline timeout (seconds); firing it abandons partial results
    pub pipeline_timeout_secs: u64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            chunk_size: 6000,
            aggressiveness: Aggressiveness::Balanced,
            confidence_threshold: 0.5,
            enable_relationships: true,
            max_chunks: 50,
            parallel_batch_size: 2,
            chunk_timeout_secs: 20,
            pipeline_timeout_secs: 45,
        }
    }
}

impl ExtractionSettings {
    /// Conservative preset: fewer, higher-confidence entities
    pub fn conservative() -> Self {
        Self {
            aggressiveness: Aggressiveness::Conservative,
            confidence_threshold: 0.7,
            ..Default::default()
        }
    }

    /// Obsessive preset: mine everything, filter little
    pub fn obsessive() -> Self {
        Self {
            aggressiveness: Aggressiveness::Obsessive,
            confidence_threshold: 0.3,
            ..Default::default()
        }
    }

    /// Get the per-chunk timeout as a Duration
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    /// Get the overall pipeline timeout as a Duration
    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.parallel_batch_size == 0 {
            return Err("parallel_batch_size must be greater than 0".to_string());
        }
        if self.max_chunks == 0 {
            return Err("max_chunks must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold {} out of range [0.0, 1.0]",
                self.confidence_threshold
            ));
        }
        if self.chunk_timeout_secs == 0 || self.pipeline_timeout_secs == 0 {
            return Err("timeouts must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Merge per-campaign overrides over these defaults
    ///
    /// Pure key-by-key merge: every override field is optional, and an unset
    /// field keeps the default. No shared mutable state is involved.
    pub fn resolve(defaults: &ExtractionSettings, overrides: &SettingsOverrides) -> Self {
        Self {
            chunk_size: overrides.chunk_size.unwrap_or(defaults.chunk_size),
            aggressiveness: overrides.aggressiveness.unwrap_or(defaults.aggressiveness),
            confidence_threshold: overrides
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            enable_relationships: overrides
                .enable_relationships
                .unwrap_or(defaults.enable_relationships),
            max_chunks: overrides.max_chunks.unwrap_or(defaults.max_chunks),
            parallel_batch_size: overrides
                .parallel_batch_size
                .unwrap_or(defaults.parallel_batch_size),
            chunk_timeout_secs: overrides
                .chunk_timeout_secs
                .unwrap_or(defaults.chunk_timeout_secs),
            pipeline_timeout_secs: overrides
                .pipeline_timeout_secs
                .unwrap_or(defaults.pipeline_timeout_secs),
        }
    }

    /// Load settings from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize settings to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Partial per-campaign settings overrides
///
/// Every field is optional; see [`ExtractionSettings::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsOverrides {
    /// Override for [`ExtractionSettings::chunk_size`]
    pub chunk_size: Option<usize>,
    /// Override for [`ExtractionSettings::aggressiveness`]
    pub aggressiveness: Option<Aggressiveness>,
    /// Override for [`ExtractionSettings::confidence_threshold`]
    pub confidence_threshold: Option<f64>,
    /// Override for [`ExtractionSettings::enable_relationships`]
    pub enable_relationships: Option<bool>,
    /// Override for [`ExtractionSettings::max_chunks`]
    pub max_chunks: Option<usize>,
    /// Override for [`ExtractionSettings::parallel_batch_size`]
    pub parallel_batch_size: Option<usize>,
    /// Override for [`ExtractionSettings::chunk_timeout_secs`]
    pub chunk_timeout_secs: Option<u64>,
    /// Override for [`ExtractionSettings::pipeline_timeout_secs`]
    pub pipeline_timeout_secs: Option<u64>,
}
