// Configuration types module
// Defines the file/env settings and the immutable server configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::share::ShareSet;

/// Settings as loaded from file and environment
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub share: ShareSettings,
    pub logging: LoggingConfig,
}

/// Listening socket and throttling settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub search_free_port: bool,
    pub max_port_attempts: u16,
    /// Per-connection limit in KiB/s, 0 = unlimited
    pub rate_limit_kib: u64,
    pub workers: Option<usize>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds allowed for a client to send its request headers
    pub header_read_timeout: u64,
}

/// What to share
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ShareSettings {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (common, combined or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Immutable configuration handed to the server for the process lifetime
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// 0 = unlimited
    pub rate_limit_bytes_per_second: u64,
    pub search_free_port: bool,
    pub max_port_attempts: u16,
    pub header_read_timeout: Duration,
    pub share_set: ShareSet,
    pub logging: Arc<LoggingConfig>,
}
