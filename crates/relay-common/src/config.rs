//! Configuration types and utilities for Relay

use crate::constants::defaults;
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration, read from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub log_level: String,
    pub server: ServerConfig,
    pub stream: StreamConfig,
    pub render: RenderConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::LOG_LEVEL.to_string(),
            server: ServerConfig::default(),
            stream: StreamConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Streaming settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Frames buffered between the pipeline task and the response body
    pub channel_capacity: usize,
    /// Delay between chunks of the scripted runtime (ms)
    pub scripted_chunk_delay_ms: u64,
    /// Optional JSON file with extra scripted scenarios
    pub scenario_file: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::CHANNEL_CAPACITY,
            scripted_chunk_delay_ms: defaults::SCRIPTED_CHUNK_DELAY_MS,
            scenario_file: None,
        }
    }
}

/// Fragment renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render answer text as markdown; plain escaped text otherwise
    pub markdown: bool,
    /// Sender label shown in the message bubble
    pub agent_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            markdown: true,
            agent_name: defaults::AGENT_NAME.to_string(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from file, falling back to defaults if it doesn't exist
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)?;
        let config: RelayConfig = toml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.stream.channel_capacity == 0 {
            return Err(RelayError::Config(
                "stream.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig::load(dir.path().join("relay.toml")).unwrap();
        assert_eq!(config.server.port, defaults::PORT);
        assert_eq!(config.stream.channel_capacity, defaults::CHANNEL_CAPACITY);
        assert!(config.render.markdown);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\n[server]\nport = 8080\n[render]\nmarkdown = false").unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, defaults::HOST);
        assert!(!config.render.markdown);
        assert_eq!(config.render.agent_name, defaults::AGENT_NAME);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nchannel_capacity = 0").unwrap();

        let err = RelayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
