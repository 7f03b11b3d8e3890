//! Relay configuration.
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional TOML file, and command-line flags applied by the binary.
//!
//! ```toml
//! listen_addr = "0.0.0.0:7878"
//! max_members = 200
//! idle_timeout_secs = 900
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::registry::DEFAULT_MAX_MEMBERS;

/// Default address the relay listens on.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7878";

/// Default per-member outbound queue length.
const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Default maximum line size (64 KiB).
const DEFAULT_MAX_LINE_LENGTH: usize = 65_536;

/// Default write timeout (10 seconds).
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

/// Relay configuration, deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Socket address to bind.
    pub listen_addr: String,

    /// Registry capacity; joins beyond it are refused.
    pub max_members: usize,

    /// Lines queued per member before further lines to it are dropped.
    pub outbound_buffer: usize,

    /// Longest accepted input line in bytes; longer lines are discarded.
    pub max_line_length: usize,

    /// Seconds a single line write may take before the member's writer gives up.
    pub write_timeout_secs: u64,

    /// Seconds of client silence before the session is ended. `None` disables.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_members: DEFAULT_MAX_MEMBERS,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
            idle_timeout_secs: None,
        }
    }
}

impl RelayConfig {
    /// Loads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the relay can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::invalid("listen_addr", "must not be empty"));
        }
        if self.max_members == 0 {
            return Err(ConfigError::invalid("max_members", "must be at least 1"));
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::invalid("outbound_buffer", "must be at least 1"));
        }
        if self.max_line_length == 0 {
            return Err(ConfigError::invalid("max_line_length", "must be at least 1"));
        }
        if self.write_timeout_secs == 0 {
            return Err(ConfigError::invalid("write_timeout_secs", "must be at least 1"));
        }
        if self.idle_timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "idle_timeout_secs",
                "must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Per-session limits derived from this config.
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            outbound_buffer: self.outbound_buffer.max(1),
            max_line_length: self.max_line_length,
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Limits applied to every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLimits {
    /// Outbound queue length per member (at least 1)
    pub outbound_buffer: usize,

    /// Longest accepted input line in bytes
    pub max_line_length: usize,

    /// Per-line write deadline
    pub write_timeout: Duration,

    /// Read deadline between lines, if any
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        RelayConfig::default().session_limits()
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}
