use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::recovery::atomic_write;

const STATE_FILE: &str = "state.json";

/// Bookkeeping that outlives a single run (written to .hotlist/state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HotlistState {
    /// Epoch milliseconds of the last auto-clear; 0 = never cleared
    #[serde(default)]
    pub last_clear_ms: i64,
    /// Whether the inline legacy tag has already been migrated
    #[serde(default)]
    pub legacy_migrated: bool,
}

/// Read the state file. A missing or malformed file yields the default state.
pub fn read_state(data_dir: &Path) -> HotlistState {
    let path = data_dir.join(STATE_FILE);
    let Ok(content) = fs::read_to_string(&path) else {
        return HotlistState::default();
    };
    match serde_json::from_str(&content) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed state file");
            HotlistState::default()
        }
    }
}

/// Write the state file.
pub fn write_state(data_dir: &Path, state: &HotlistState) -> Result<(), std::io::Error> {
    fs::create_dir_all(data_dir)?;
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&data_dir.join(STATE_FILE), content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = HotlistState {
            last_clear_ms: 1_760_497_200_000,
            legacy_migrated: true,
        };
        write_state(dir.path(), &state).unwrap();
        assert_eq!(read_state(dir.path()), state);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_state(dir.path()), HotlistState::default());
    }

    #[test]
    fn malformed_file_is_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STATE_FILE), "not json {{{").unwrap();
        assert_eq!(read_state(dir.path()), HotlistState::default());
    }

    #[test]
    fn serde_defaults_on_empty_object() {
        let state: HotlistState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.last_clear_ms, 0);
        assert!(!state.legacy_migrated);
    }
}
