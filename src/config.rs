//! Mevharvest Configuration
//!
//! This module provides configuration structures for the mevharvest
//! harvesting replica.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main mevharvest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MevHarvestConfig {
    /// Node-specific configuration
    pub node: NodeConfig,

    /// Harvesting agent configuration
    pub agent: AgentConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Node-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique participant identifier, used as the payload sender
    pub id: String,
}

/// Harvesting agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory containing hourly transaction log files
    pub log_path: String,

    /// Base URL of the reporting endpoint
    pub base_url: String,

    /// Bearer token for the reporting endpoint
    pub api_key: String,

    /// Pacing sleep between harvest cycles, in seconds
    pub wait_time_secs: u64,

    /// Local guard on the agreement wait, in seconds
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_round_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MevHarvestConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: MevHarvestConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.node.id.is_empty() {
            return Err(crate::Error::Config("node.id cannot be empty".into()));
        }

        if self.agent.log_path.is_empty() {
            return Err(crate::Error::Config("agent.log_path cannot be empty".into()));
        }

        if self.agent.base_url.is_empty() {
            return Err(crate::Error::Config("agent.base_url cannot be empty".into()));
        }

        if self.agent.api_key.is_empty() {
            return Err(crate::Error::Config("agent.api_key cannot be empty".into()));
        }

        if self.agent.wait_time_secs == 0 {
            return Err(crate::Error::Config("agent.wait_time_secs cannot be zero".into()));
        }

        Ok(())
    }

    /// Get the log directory path
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.agent.log_path)
    }

    /// Get the pacing sleep as Duration
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.agent.wait_time_secs)
    }

    /// Get the agreement-wait guard as Duration
    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.round_timeout_secs)
    }
}
