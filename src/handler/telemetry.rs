//! Telemetry status commands.

use serde_json::{json, Value};
use tracing::warn;

use super::{CommandHandler, Request};
use crate::error::ProxyError;
use crate::Result;

impl CommandHandler {
    /// Implements `getFreeMonitoringStatus`.
    pub(super) fn msg_get_free_monitoring_status(&self, _req: &Request) -> Result<Value> {
        let state = self.state.get();

        let message = match state.telemetry {
            None => "telemetry is undecided",
            Some(true) => "telemetry is enabled",
            Some(false) => "telemetry is disabled",
        };

        Ok(json!({
            "state": state.telemetry_string(),
            "message": message,
            "ok": 1.0,
        }))
    }

    /// Implements `setFreeMonitoring`.
    pub(super) fn msg_set_free_monitoring(&self, req: &Request) -> Result<Value> {
        let enable = match req.get("action").and_then(Value::as_str) {
            Some("enable") => true,
            Some("disable") => false,
            Some(other) => {
                return Err(ProxyError::InvalidCommand(format!(
                    "unknown setFreeMonitoring action '{other}'"
                )))
            }
            None => {
                return Err(ProxyError::InvalidCommand(
                    "setFreeMonitoring requires a string 'action'".into(),
                ))
            }
        };

        let mut locked = false;
        let res = self.state.update(|s| {
            if s.telemetry_locked {
                locked = true;
            } else {
                s.telemetry = Some(enable);
            }
        });

        if locked {
            return Err(ProxyError::TelemetryLocked);
        }

        // The in-memory change stands even if it could not be written.
        if let Err(e) = res {
            warn!("Failed to persist telemetry state: {}", e);
        }

        Ok(json!({ "ok": 1.0 }))
    }
}
