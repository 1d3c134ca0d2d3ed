//! Gateway Configuration
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) yields a working configuration.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;
use crate::store::ReadPolicy;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration could not be loaded or is unusable
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding profile slots
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,

    /// Directory of static UI assets
    #[serde(default = "default_www_dir")]
    pub www_dir: PathBuf,

    /// File whose appearance starts the drain
    #[serde(default = "default_flash_marker")]
    pub flash_marker: PathBuf,

    /// File touched by `POST /filelist`
    #[serde(default = "default_refresh_marker")]
    pub refresh_marker: PathBuf,

    /// Flash marker polling interval (default: 10 ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on the drain (default: 5000 ms)
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,

    /// Schema file; the built-in profile schema is used when absent
    #[serde(default)]
    pub schema_path: Option<PathBuf>,

    #[serde(default)]
    pub read_policy: ReadPolicy,

    /// Largest accepted request body (default: 1 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("/usr/mmcdata/mmcblk2p8/profiles")
}

fn default_www_dir() -> PathBuf {
    PathBuf::from("/www")
}

fn default_flash_marker() -> PathBuf {
    PathBuf::from("/tmp/flash.txt")
}

fn default_refresh_marker() -> PathBuf {
    PathBuf::from("/tmp/refresh_file_list")
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_drain_timeout_ms() -> u64 {
    5_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            profile_dir: default_profile_dir(),
            www_dir: default_www_dir(),
            flash_marker: default_flash_marker(),
            refresh_marker: default_refresh_marker(),
            poll_interval_ms: default_poll_interval_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
            schema_path: None,
            read_policy: ReadPolicy::default(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Overrides host and port from a `host:port` string.
    pub fn set_listen(&mut self, listen: &str) -> ConfigResult<()> {
        let addr: SocketAddr = listen
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("listen address '{}' is not host:port", listen)))?;
        self.host = addr.ip().to_string();
        self.port = addr.port();
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Rejects configurations the gateway cannot run with.
    pub fn validate(&self) -> ConfigResult<SocketAddr> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.drain_timeout_ms == 0 {
            return Err(ConfigError::Invalid("drain_timeout_ms must be positive".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be positive".into()));
        }
        self.socket_addr().parse().map_err(|_| {
            ConfigError::Invalid(format!("'{}' is not a valid socket address", self.socket_addr()))
        })
    }
}
