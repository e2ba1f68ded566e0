//! `hostInfo` command and host introspection.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use super::{CommandHandler, Request};
use crate::Result;

/// Files probed for the Linux distribution name and version.
const OS_RELEASE_FILES: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

impl CommandHandler {
    /// Implements `hostInfo`.
    ///
    /// Host details are best-effort: anything that cannot be read is
    /// reported as an empty string.
    pub(super) fn msg_host_info(&self, _req: &Request) -> Result<Value> {
        let (os_name, os_version) = os_name_version();

        Ok(json!({
            "system": {
                "currentTime": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "hostname": sysinfo::System::host_name().unwrap_or_default(),
                "cpuAddrSize": usize::BITS,
                "numCores": std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
                "cpuArch": std::env::consts::ARCH,
            },
            "os": {
                "type": os_type(),
                "name": os_name,
                "version": os_version,
            },
            "extra": {},
            "ok": 1.0,
        }))
    }
}

fn os_type() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "unknown",
    }
}

/// OS name and version, or empty strings if unknown.
fn os_name_version() -> (String, String) {
    if cfg!(target_os = "linux") {
        for path in OS_RELEASE_FILES {
            if let Ok(file) = File::open(path) {
                match parse_os_release(file) {
                    Ok(found) => return found,
                    Err(e) => tracing::debug!(path, "failed to parse os-release: {}", e),
                }
            }
        }
    }

    (
        sysinfo::System::name().unwrap_or_default(),
        sysinfo::System::os_version().unwrap_or_default(),
    )
}

/// Parse `os-release` content, returning the `NAME` and `VERSION` values.
///
/// Lines without `=` are skipped; double-quoted values are unquoted.
pub fn parse_os_release<R: Read>(reader: R) -> io::Result<(String, String)> {
    let mut params = HashMap::new();

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        params.insert(key.to_string(), unquote(value));
    }

    Ok((
        params.remove("NAME").unwrap_or_default(),
        params.remove("VERSION").unwrap_or_default(),
    ))
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(|v| v.replace("\\\"", "\"").replace("\\\\", "\\"))
        .unwrap_or_else(|| value.to_string())
}
