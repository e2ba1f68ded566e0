//! API request and response types.

use serde::Serialize;

use crate::error::ProxyError;
use crate::session::SessionRecord;

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "COMMAND_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Always 0, mirroring the `ok` field of command replies.
    pub ok: f64,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            ok: 0.0,
        }
    }
}

impl From<&ProxyError> for ErrorResponse {
    fn from(err: &ProxyError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Brief session summary for listing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub lsid: String,
    pub state: String,
    pub idle_seconds: f64,
    pub age_seconds: f64,
}

impl SessionSummary {
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            lsid: record.id.to_string(),
            state: format!("{:?}", record.state),
            idle_seconds: record.idle_duration().as_secs_f64(),
            age_seconds: record.created_at.elapsed().as_secs_f64(),
        }
    }
}

/// List sessions response.
#[derive(Debug, Clone, Serialize)]
pub struct ListSessionsResponse {
    /// Total number of sessions.
    pub count: usize,
    /// Configured idle timeout in seconds.
    pub idle_timeout_secs: u64,
    /// Session summaries.
    pub sessions: Vec<SessionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Lsid, SessionRegistry};

    #[test]
    fn test_error_response_serialization() {
        let err = ErrorResponse::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("TEST_ERROR"));
        assert!(json.contains("Test message"));
        assert!(json.contains("\"ok\":0.0"));
    }

    #[test]
    fn test_error_response_from_proxy_error() {
        let err = ProxyError::CommandNotFound("nope".into());
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "COMMAND_NOT_FOUND");
        assert!(resp.message.contains("nope"));
    }

    #[test]
    fn test_session_summary() {
        let registry = SessionRegistry::new();
        let (record, _) = registry.create_or_update(&Lsid::from("abc"));

        let summary = SessionSummary::from_record(&record);
        assert_eq!(summary.lsid, "abc");
        assert_eq!(summary.state, "Active");
        assert!(summary.idle_seconds >= 0.0);
    }
}
