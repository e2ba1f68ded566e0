//! Error types for proxy-core.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for proxy-core operations.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Writing the process state file failed.
    #[error("failed to persist state to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process state could not be serialized.
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// State directory was required but not configured.
    #[error("state directory is not set")]
    StateDirNotSet,

    /// Command document is malformed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Command name is not handled.
    #[error("no such command: '{0}'")]
    CommandNotFound(String),

    /// Telemetry state was fixed by configuration.
    #[error("telemetry state is locked by configuration")]
    TelemetryLocked,

    /// Metrics collector registration failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// Short machine-readable code used in API error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCommand(_) => "BAD_VALUE",
            Self::CommandNotFound(_) => "COMMAND_NOT_FOUND",
            Self::TelemetryLocked => "TELEMETRY_LOCKED",
            _ => "INTERNAL_ERROR",
        }
    }
}

/// Convenience Result type for proxy-core operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
