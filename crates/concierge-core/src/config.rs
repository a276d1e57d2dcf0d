use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConciergeError, Result};

/// Top-level configuration for the Concierge service.
///
/// Loaded from `~/.concierge/config.toml` by default. Each section corresponds
/// to one stage of the interpreter pipeline or to the serving surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl ConciergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConciergeConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConciergeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.memory.validate()?;
        if self.interpreter.max_input_chars == 0 {
            return Err(ConciergeError::Config(
                "interpreter.max_input_chars must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.interpreter.classifier_threshold) {
            return Err(ConciergeError::Config(format!(
                "interpreter.classifier_threshold must be within [0, 1], got {}",
                self.interpreter.classifier_threshold
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Port the HTTP/WebSocket server binds to.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.concierge/data".to_string(),
            log_level: "info".to_string(),
            port: 3040,
        }
    }
}

/// Interpreter pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Inputs are truncated to this many characters after normalization.
    pub max_input_chars: usize,
    /// Lifetime of an entry in the intent cache.
    pub intent_cache_ttl_secs: u64,
    /// Maximum entries in the intent cache before it is cleared.
    pub intent_cache_capacity: usize,
    /// Lifetime of an entry in the full-result cache.
    pub result_cache_ttl_secs: u64,
    /// Maximum entries in the full-result cache before it is cleared.
    pub result_cache_capacity: usize,
    /// Minimum classifier score for the top label to be accepted.
    pub classifier_threshold: f64,
    /// Interval of the scheduled expired-entry sweep.
    pub sweep_interval_secs: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 500,
            intent_cache_ttl_secs: 600,
            intent_cache_capacity: 1000,
            result_cache_ttl_secs: 30,
            result_cache_capacity: 500,
            classifier_threshold: 0.30,
            sweep_interval_secs: 60,
        }
    }
}

/// Memory pressure thresholds, expressed as fractions of the budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Resident memory budget the ratios are computed against.
    pub budget_mb: u64,
    pub normal_ratio: f64,
    pub high_ratio: f64,
    pub critical_ratio: f64,
}

impl MemoryConfig {
    pub fn budget_bytes(&self) -> u64 {
        self.budget_mb * 1024 * 1024
    }

    fn validate(&self) -> Result<()> {
        if self.budget_mb == 0 {
            return Err(ConciergeError::Config(
                "memory.budget_mb must be greater than zero".to_string(),
            ));
        }
        let ascending = 0.0 < self.normal_ratio
            && self.normal_ratio < self.high_ratio
            && self.high_ratio < self.critical_ratio
            && self.critical_ratio <= 1.0;
        if !ascending {
            return Err(ConciergeError::Config(format!(
                "memory thresholds must ascend within (0, 1]: normal={} high={} critical={}",
                self.normal_ratio, self.high_ratio, self.critical_ratio
            )));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            budget_mb: 512,
            normal_ratio: 0.50,
            high_ratio: 0.75,
            critical_ratio: 0.90,
        }
    }
}

/// Duplex channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Interval of the per-connection reservation poller.
    pub reservation_poll_secs: u64,
    /// Interval of the per-connection automation history poller.
    pub automation_poll_secs: u64,
    /// Number of history entries included in snapshots.
    pub history_limit: usize,
    /// Capacity of the per-connection outbound queue.
    pub outbound_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reservation_poll_secs: 30,
            automation_poll_secs: 60,
            history_limit: 20,
            outbound_buffer: 64,
        }
    }
}
