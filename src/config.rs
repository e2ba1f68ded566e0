//! Configuration management for proxy-core.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Process state persistence.
    pub state: StateSection,
    /// Logical session settings.
    pub session: SessionSection,
    /// Telemetry settings.
    pub telemetry: TelemetrySection,
    /// Metrics settings.
    pub metrics: MetricsSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

/// Process state section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSection {
    /// Directory holding `state.json`.
    pub dir: Option<PathBuf>,
    /// Whether state is written to disk at all.
    pub persist: bool,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            dir: None,
            persist: true,
        }
    }
}

/// Logical session section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Idle time in seconds after which a session expires.
    pub idle_timeout_secs: u64,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30 * 60,
            sweep_interval_secs: 60,
        }
    }
}

/// Telemetry section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    /// Explicit telemetry decision. When set, it cannot be changed at runtime.
    pub enabled: Option<bool>,
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    /// Export the instance UUID as a metric label.
    pub include_uuid: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { include_uuid: true }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("PROXY_CORE_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("PROXY_CORE_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(dir) = std::env::var("PROXY_CORE_STATE_DIR") {
            if !dir.is_empty() {
                self.state.dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(secs) = std::env::var("PROXY_CORE_SESSION_TIMEOUT") {
            if let Ok(secs) = secs.parse() {
                self.session.idle_timeout_secs = secs;
            }
        }

        if let Ok(value) = std::env::var("PROXY_CORE_TELEMETRY") {
            if let Some(enabled) = parse_telemetry(&value) {
                self.telemetry.enabled = Some(enabled);
            }
        }

        if let Ok(level) = std::env::var("PROXY_CORE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref dir) = args.state_dir {
            self.state.dir = Some(dir.clone());
        }

        if args.no_state {
            self.state.persist = false;
        }

        if let Some(secs) = args.session_timeout {
            self.session.idle_timeout_secs = secs;
        }

        if let Some(enabled) = args.telemetry {
            self.telemetry.enabled = Some(enabled);
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be represented by the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid("session.idle_timeout_secs must be positive"));
        }

        if self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("session.sweep_interval_secs must be positive"));
        }

        Ok(())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        Ok(ServerConfig::new(host.to_string(), self.server.port))
    }

    /// Location of the state file, or `None` when persistence is disabled.
    ///
    /// Defaults to `state.json` in the current directory.
    pub fn state_file(&self) -> Option<PathBuf> {
        if !self.state.persist {
            return None;
        }

        let dir = self.state.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        Some(dir.join(crate::state::STATE_FILE_NAME))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Parse a telemetry switch value.
pub fn parse_telemetry(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "enable" | "enabled" | "true" | "on" | "1" => Some(true),
        "disable" | "disabled" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Out-of-range value.
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8088);
        assert!(config.state.persist);
        assert_eq!(config.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert!(config.telemetry.enabled.is_none());
        assert!(config.metrics.include_uuid);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "server": {
                "host": "0.0.0.0",
                "port": 9090
            },
            "state": {
                "dir": "/var/lib/proxy-core"
            },
            "session": {
                "idle_timeout_secs": 600
            },
            "telemetry": {
                "enabled": false
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.state_file(),
            Some(PathBuf::from("/var/lib/proxy-core/state.json"))
        );
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60)); // Default
        assert_eq!(config.telemetry.enabled, Some(false));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "server": { "port": 9000 } }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1"); // Default
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            state_dir: Some(PathBuf::from("/tmp/state")),
            session_timeout: Some(120),
            telemetry: Some(true),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.state.dir, Some(PathBuf::from("/tmp/state")));
        assert_eq!(config.idle_timeout(), Duration::from_secs(120));
        assert_eq!(config.telemetry.enabled, Some(true));
    }

    #[test]
    fn test_apply_args_keeps_unset_values() {
        let mut config = Config::default();
        config.server.port = 7000;

        config.apply_args(&Args::default());
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_no_state() {
        let mut config = Config::default();
        config.apply_args(&Args {
            no_state: true,
            ..Args::default()
        });

        assert!(config.state_file().is_none());
    }

    #[test]
    fn test_default_state_file() {
        let config = Config::default();
        assert_eq!(config.state_file(), Some(PathBuf::from("./state.json")));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.session.idle_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 8088);
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();

        assert!(config.to_server_config().is_err());
    }

    #[test]
    fn test_parse_telemetry() {
        assert_eq!(parse_telemetry("enable"), Some(true));
        assert_eq!(parse_telemetry("OFF"), Some(false));
        assert_eq!(parse_telemetry("sometimes"), None);
    }
}
