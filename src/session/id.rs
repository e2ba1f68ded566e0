//! Logical session identifier type.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::ProxyError;

/// Client-supplied logical session identifier (LSID).
///
/// The value is opaque: it is only hashed and compared. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lsid(Arc<str>);

impl Lsid {
    /// Wrap a raw identifier.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(raw.as_ref()))
    }

    /// Generate a fresh random identifier, as `startSession` does.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract an identifier from its document form.
    ///
    /// Accepts `{ "id": <value> }` or a bare value. String values are used
    /// verbatim; any other non-null value is keyed by its JSON text.
    pub fn from_value(value: &Value) -> Result<Self, ProxyError> {
        let id = match value {
            Value::Object(doc) => doc
                .get("id")
                .ok_or_else(|| ProxyError::InvalidCommand("lsid is missing field 'id'".into()))?,
            other => other,
        };

        match id {
            Value::String(s) if !s.is_empty() => Ok(Self::new(s)),
            Value::String(_) => Err(ProxyError::InvalidCommand("lsid must not be empty".into())),
            Value::Null => Err(ProxyError::InvalidCommand("lsid must not be null".into())),
            other => Ok(Self::new(other.to_string())),
        }
    }

    /// Document form: `{ "id": "<lsid>" }`.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "id": self.as_str() })
    }
}

impl fmt::Display for Lsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Lsid {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Lsid {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
