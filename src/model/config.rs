use serde::{Deserialize, Serialize};

/// Configuration from .hotlist/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotlistConfig {
    #[serde(default)]
    pub hotlist: HotlistSection,
    #[serde(default)]
    pub actions: ActionsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotlistSection {
    /// Local time of day ("HH:MM") after which the hotlist is cleared once
    /// per day. Empty disables auto-clear.
    #[serde(default = "default_auto_clear_time")]
    pub auto_clear_time: String,
    /// Markdown file that cleared items are archived into
    #[serde(default = "default_archive_file")]
    pub archive_file: String,
    /// Keep completed items (stamped with completion time) until the next
    /// local midnight instead of removing them at once
    #[serde(default)]
    pub retain_completed: bool,
    /// Append ` ✅ YYYY-MM-DD` to lines marked complete
    #[serde(default = "default_true")]
    pub completion_stamp: bool,
    /// Quiet period before a watched change triggers reconciliation
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for HotlistSection {
    fn default() -> Self {
        HotlistSection {
            auto_clear_time: default_auto_clear_time(),
            archive_file: default_archive_file(),
            retain_completed: false,
            completion_stamp: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsSection {
    /// Shared file for actions that belong to no project
    #[serde(default = "default_general_file")]
    pub general_file: String,
    /// Inline marker used before the hotlist existed; migrated away
    #[serde(default = "default_legacy_tag")]
    pub legacy_tag: String,
}

impl Default for ActionsSection {
    fn default() -> Self {
        ActionsSection {
            general_file: default_general_file(),
            legacy_tag: default_legacy_tag(),
        }
    }
}

impl HotlistConfig {
    /// Whether `path` is the shared general actions file
    pub fn is_general_file(&self, path: &str) -> bool {
        path == self.actions.general_file
    }
}

fn default_true() -> bool {
    true
}

fn default_auto_clear_time() -> String {
    "03:00".to_string()
}

fn default_archive_file() -> String {
    "Hotlist Archive.md".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_general_file() -> String {
    "Next Actions.md".to_string()
}

fn default_legacy_tag() -> String {
    "#flow-planned".to_string()
}
