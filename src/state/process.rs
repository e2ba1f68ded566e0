//! Process state value type.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named runtime option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuntimeFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RuntimeFlag {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Identity and runtime flags of this server process.
///
/// Only `uuid`, `telemetry` and `flags` are written to the state file;
/// everything else is rebuilt on every start. Unknown fields in the file
/// are ignored and missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessState {
    /// Stable instance identifier, generated once.
    pub uuid: String,

    /// Telemetry decision: `None` while undecided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<bool>,

    /// Named runtime options.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, RuntimeFlag>,

    /// Telemetry was set explicitly by configuration and cannot be changed
    /// at runtime.
    #[serde(skip)]
    pub telemetry_locked: bool,

    /// Start time of the current process.
    #[serde(skip)]
    pub start: Option<DateTime<Utc>>,

    /// Version reported by the storage backend, if connected.
    #[serde(skip)]
    pub backend_version: String,

    /// Latest released version, if known.
    #[serde(skip)]
    pub latest_version: String,

    #[serde(skip)]
    pub update_info: String,

    #[serde(skip)]
    pub update_available: bool,
}

impl ProcessState {
    /// Populate required fields that are missing or invalid.
    ///
    /// Idempotent: a second call never changes anything.
    pub fn fill(&mut self) {
        if Uuid::parse_str(&self.uuid).is_err() {
            self.uuid = Uuid::new_v4().to_string();
        }

        if self.start.is_none() {
            self.start = Some(Utc::now());
        }
    }

    /// Return an independent copy of this state.
    ///
    /// Every field is an owned value, so the clone shares nothing mutable
    /// with the original.
    pub fn deep_copy(&self) -> Self {
        Self {
            uuid: self.uuid.clone(),
            telemetry: self.telemetry,
            flags: self.flags.clone(),
            telemetry_locked: self.telemetry_locked,
            start: self.start,
            backend_version: self.backend_version.clone(),
            latest_version: self.latest_version.clone(),
            update_info: self.update_info.clone(),
            update_available: self.update_available,
        }
    }

    /// Telemetry decision as text: `undecided`, `enabled` or `disabled`.
    pub fn telemetry_string(&self) -> &'static str {
        match self.telemetry {
            None => "undecided",
            Some(true) => "enabled",
            Some(false) => "disabled",
        }
    }

    /// Look up a runtime flag.
    pub fn flag(&self, name: &str) -> Option<&RuntimeFlag> {
        self.flags.get(name)
    }

    /// Set a runtime flag, returning the previous value.
    pub fn set_flag(&mut self, name: impl Into<String>, value: RuntimeFlag) -> Option<RuntimeFlag> {
        self.flags.insert(name.into(), value)
    }

    /// Render every field, persisted or not, for operational inspection.
    pub fn as_map(&self) -> serde_json::Map<String, serde_json::Value> {
        use serde_json::Value;

        let mut map = serde_json::Map::new();
        map.insert("uuid".into(), Value::from(self.uuid.clone()));
        map.insert("telemetry".into(), Value::from(self.telemetry_string()));
        map.insert("telemetry_locked".into(), Value::from(self.telemetry_locked));
        map.insert(
            "start".into(),
            self.start
                .map(|t| Value::from(t.to_rfc3339()))
                .unwrap_or(Value::Null),
        );
        map.insert("backend_version".into(), Value::from(self.backend_version.clone()));
        map.insert("latest_version".into(), Value::from(self.latest_version.clone()));
        map.insert("update_info".into(), Value::from(self.update_info.clone()));
        map.insert("update_available".into(), Value::from(self.update_available));

        let flags = self
            .flags
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
            .collect();
        map.insert("flags".into(), Value::Object(flags));

        map
    }
}
