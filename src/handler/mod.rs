//! Command handlers.
//!
//! The handler sits between the command-dispatch layer and the core: it
//! registers the session attached to each command, then runs the command
//! body against the session registry and the process state.
//!
//! ## Commands
//!
//! - `startSession`, `refreshSessions`, `endSessions`, `killSessions`,
//!   `killAllSessions` - session administration
//! - `hostInfo` - host and OS details
//! - `getFreeMonitoringStatus`, `setFreeMonitoring` - telemetry state

mod host_info;
mod request;
mod sessions;
mod telemetry;

use std::sync::Arc;

use serde_json::Value;

use crate::error::ProxyError;
use crate::session::{SessionRecord, SessionRegistry};
use crate::state::StateProvider;
use crate::Result;

pub use host_info::parse_os_release;
pub use request::Request;

/// Executes decoded commands.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    state: Arc<StateProvider>,
    sessions: Arc<SessionRegistry>,
}

impl CommandHandler {
    pub fn new(state: Arc<StateProvider>, sessions: Arc<SessionRegistry>) -> Self {
        Self { state, sessions }
    }

    pub fn state(&self) -> &Arc<StateProvider> {
        &self.state
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Run a command and return its reply document.
    pub fn handle(&self, req: &Request) -> Result<Value> {
        let name = req.command_name();

        // Terminating a session must not recreate it first.
        let terminates = matches!(name, "endSessions" | "killSessions" | "killAllSessions");
        if !terminates {
            self.create_or_update_by_lsid(req)?;
        }

        tracing::debug!(command = name, "Handling command");

        match name {
            "startSession" => self.msg_start_session(req),
            "refreshSessions" => self.msg_refresh_sessions(req),
            "endSessions" => self.msg_end_sessions(req),
            "killSessions" => self.msg_kill_sessions(req),
            "killAllSessions" => self.msg_kill_all_sessions(req),
            "hostInfo" => self.msg_host_info(req),
            "getFreeMonitoringStatus" => self.msg_get_free_monitoring_status(req),
            "setFreeMonitoring" => self.msg_set_free_monitoring(req),
            other => Err(ProxyError::CommandNotFound(other.to_string())),
        }
    }

    /// Create or refresh the session named by the command's `lsid`.
    ///
    /// Returns `None` if the command carries no session id.
    pub fn create_or_update_by_lsid(&self, req: &Request) -> Result<Option<(SessionRecord, bool)>> {
        Ok(req
            .lsid()?
            .map(|id| self.sessions.create_or_update(&id)))
    }
}
