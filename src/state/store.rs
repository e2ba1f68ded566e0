//! On-disk storage for the process state.

use std::fs;
use std::io::Write;
use std::path::Path;

use super::ProcessState;
use crate::error::ProxyError;
use crate::Result;

/// Permissions of the state file before umask.
#[cfg(unix)]
const STATE_FILE_MODE: u32 = 0o666;

/// Read the state file at `path`.
///
/// A missing, unreadable or corrupted file yields the zero-value state.
/// The result is not filled.
pub fn load(path: &Path) -> ProcessState {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), "state file not read: {}", e);
            return ProcessState::default();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::debug!(path = %path.display(), "state file not parsed: {}", e);
        ProcessState::default()
    })
}

/// Write `state` to `path` without modifying it.
///
/// Returns immediately if `path` is `None`. The parent directory is created
/// if needed; the file is written to a temporary sibling and renamed over
/// the target.
pub fn persist(state: &ProcessState, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let bytes = serde_json::to_vec(state)?;

    write_file(path, &bytes).map_err(|source| ProxyError::Persist {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(STATE_FILE_MODE);
    }

    let mut file = options.open(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let state = load(&dir.path().join("absent.json"));
        assert_eq!(state, ProcessState::default());
    }

    #[test]
    fn test_load_corrupted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").unwrap();

        assert_eq!(load(&path), ProcessState::default());
    }

    #[test]
    fn test_persist_none_is_noop() {
        let mut state = ProcessState::default();
        state.fill();
        assert!(persist(&state, None).is_ok());
    }

    #[test]
    fn test_persist_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");

        let mut state = ProcessState::default();
        state.fill();
        persist(&state, Some(&path)).unwrap();

        assert!(path.exists());
        let loaded = load(&path);
        assert_eq!(loaded.uuid, state.uuid);
    }

    #[test]
    fn test_persist_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut state = ProcessState::default();
        state.fill();
        persist(&state, Some(&path)).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
    }

    #[test]
    fn test_persist_into_file_as_directory_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let state = ProcessState::default();
        let err = persist(&state, Some(&blocker.join("state.json"))).unwrap_err();
        assert!(matches!(err, ProxyError::Persist { .. }));
    }
}
