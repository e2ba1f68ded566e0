//! Session administration commands.

use serde_json::{json, Value};

use super::{CommandHandler, Request};
use crate::error::ProxyError;
use crate::session::Lsid;
use crate::Result;

impl CommandHandler {
    /// Implements `startSession`.
    pub(super) fn msg_start_session(&self, _req: &Request) -> Result<Value> {
        let id = Lsid::generate();
        self.sessions.create_or_update(&id);

        Ok(json!({
            "id": id.to_value(),
            "timeoutMinutes": self.sessions.idle_timeout().as_secs().div_ceil(60),
            "ok": 1.0,
        }))
    }

    /// Implements `refreshSessions`.
    pub(super) fn msg_refresh_sessions(&self, req: &Request) -> Result<Value> {
        let ids = lsid_list(req)?;
        Ok(affected(self.sessions.refresh_many(&ids)))
    }

    /// Implements `endSessions`.
    pub(super) fn msg_end_sessions(&self, req: &Request) -> Result<Value> {
        let ids = lsid_list(req)?;
        Ok(affected(self.sessions.end(&ids)))
    }

    /// Implements `killSessions`.
    pub(super) fn msg_kill_sessions(&self, req: &Request) -> Result<Value> {
        let ids = lsid_list(req)?;
        Ok(affected(self.sessions.kill(&ids)))
    }

    /// Implements `killAllSessions`.
    ///
    /// User filters are not supported; every session is killed.
    pub(super) fn msg_kill_all_sessions(&self, req: &Request) -> Result<Value> {
        if !req.command_value().is_array() {
            return Err(ProxyError::InvalidCommand(
                "killAllSessions must be an array".into(),
            ));
        }

        Ok(affected(self.sessions.kill_all()))
    }
}

fn affected(n: usize) -> Value {
    json!({ "affected": n, "ok": 1.0 })
}

/// Parse the array of session documents stored under the command name.
fn lsid_list(req: &Request) -> Result<Vec<Lsid>> {
    let Value::Array(items) = req.command_value() else {
        return Err(ProxyError::InvalidCommand(format!(
            "{} must be an array",
            req.command_name()
        )));
    };

    items.iter().map(Lsid::from_value).collect()
}
