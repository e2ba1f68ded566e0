//! Decoded command requests.

use serde_json::{Map, Value};

use crate::error::ProxyError;
use crate::session::Lsid;
use crate::Result;

/// A decoded client command.
///
/// The document is an ordered map whose first key names the command.
#[derive(Debug, Clone)]
pub struct Request {
    document: Map<String, Value>,
}

impl Request {
    /// Wrap a command document. Fails unless it is a non-empty object.
    pub fn new(document: Value) -> Result<Self> {
        match document {
            Value::Object(document) if !document.is_empty() => Ok(Self { document }),
            Value::Object(_) => Err(ProxyError::InvalidCommand("empty command document".into())),
            _ => Err(ProxyError::InvalidCommand(
                "command document must be an object".into(),
            )),
        }
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Name of the command: the first key of the document.
    pub fn command_name(&self) -> &str {
        self.document.keys().next().map(String::as_str).unwrap_or_default()
    }

    /// Value stored under the command name.
    pub fn command_value(&self) -> &Value {
        self.document.values().next().unwrap_or(&Value::Null)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Session id attached to the command, if any.
    pub fn lsid(&self) -> Result<Option<Lsid>> {
        self.document.get("lsid").map(Lsid::from_value).transpose()
    }
}
