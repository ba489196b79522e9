// Configuration module entry point
// Loads settings from file and environment and turns them into a ServerConfig

mod types;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// Re-export public types
pub use types::{
    LoggingConfig, PerformanceConfig, ServerConfig, ServerSettings, Settings, ShareSettings,
};

use crate::share::ShareSet;

/// Config file used when `FILESHARE_CONFIG` is not set (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "fileshare";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "FILESHARE_CONFIG";

impl Settings {
    /// Load from the default config file location
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Environment variables override the file, e.g.
    /// `FILESHARE_SERVER__PORT=9000` or `FILESHARE_SHARE__PATHS=a,b`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("FILESHARE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("share.paths")
                    .try_parsing(true),
            )
            .set_default("server.port", 8000)?
            .set_default("server.search_free_port", false)?
            .set_default("server.max_port_attempts", 100)?
            .set_default("server.rate_limit_kib", 0)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .build()?;

        settings.try_deserialize()
    }

    /// Absolute input paths: `args` when given, else the configured paths,
    /// else the current directory
    pub fn input_paths(&self, args: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
        let cwd = std::env::current_dir()?;
        let chosen: &[PathBuf] = if args.is_empty() {
            &self.share.paths
        } else {
            args
        };

        if chosen.is_empty() {
            return Ok(vec![cwd]);
        }
        Ok(chosen.iter().map(|p| absolutize(&cwd, p)).collect())
    }

    /// Freeze the settings into the configuration the server runs with
    pub fn into_server_config(self, share_set: ShareSet) -> ServerConfig {
        ServerConfig {
            port: self.server.port,
            rate_limit_bytes_per_second: self.server.rate_limit_kib.saturating_mul(1024),
            search_free_port: self.server.search_free_port,
            max_port_attempts: self.server.max_port_attempts.max(1),
            header_read_timeout: Duration::from_secs(self.performance.header_read_timeout),
            share_set,
            logging: Arc::new(self.logging),
        }
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load_from("/nonexistent/fileshare-test-config").unwrap();
        assert_eq!(settings.server.port, 8000);
        assert!(!settings.server.search_free_port);
        assert_eq!(settings.server.rate_limit_kib, 0);
        assert!(settings.logging.access_log);
        assert_eq!(settings.logging.access_log_format, "common");
        assert!(settings.share.paths.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("share.toml");
        std::fs::write(
            &file,
            "[server]\nport = 9100\nsearch_free_port = true\nrate_limit_kib = 64\n\n[share]\npaths = [\"/tmp/a\", \"b\"]\n",
        )
        .unwrap();

        let settings = Settings::load_from(file.to_str().unwrap()).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert!(settings.server.search_free_port);
        assert_eq!(settings.server.rate_limit_kib, 64);
        assert_eq!(settings.share.paths.len(), 2);
    }

    #[test]
    fn test_input_paths_prefer_args_and_absolutize() {
        let mut settings = Settings::load_from("/nonexistent/fileshare-test-config").unwrap();
        settings.share.paths = vec![PathBuf::from("/from/config")];
        let cwd = std::env::current_dir().unwrap();

        let from_config = settings.input_paths(&[]).unwrap();
        assert_eq!(from_config, vec![PathBuf::from("/from/config")]);

        let from_args = settings
            .input_paths(&[PathBuf::from("rel.txt"), PathBuf::from("/abs")])
            .unwrap();
        assert_eq!(from_args, vec![cwd.join("rel.txt"), PathBuf::from("/abs")]);

        settings.share.paths.clear();
        assert_eq!(settings.input_paths(&[]).unwrap(), vec![cwd]);
    }

    #[test]
    fn test_rate_is_converted_to_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load_from("/nonexistent/fileshare-test-config").unwrap();
        settings.server.rate_limit_kib = 100;

        let share = ShareSet::build(&[dir.path().to_path_buf()]).unwrap();
        let cfg = settings.into_server_config(share);
        assert_eq!(cfg.rate_limit_bytes_per_second, 102_400);
        assert_eq!(cfg.header_read_timeout, Duration::from_secs(30));
    }
}
