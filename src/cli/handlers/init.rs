use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::CONFIG_FILE;
use crate::io::recovery::atomic_write;
use crate::io::store_io::DATA_DIR;

const CONFIG_TEMPLATE: &str = r##"[hotlist]
# Local time (HH:MM) after which the hotlist is archived and cleared,
# once per day. Set to "" (or run `hl config clear-time off`) to disable.
auto_clear_time = "03:00"

# Note that cleared items are archived into, newest entry first.
archive_file = "Hotlist Archive.md"

# Keep checked-off items (greyed out) until the next local midnight
# instead of dropping them at once.
retain_completed = false

# Append " ✅ YYYY-MM-DD" when an item is marked done.
completion_stamp = true

# Quiet period (ms) before `hl watch` reconciles after a change.
debounce_ms = 300

[actions]
# Shared note for actions that belong to no project.
general_file = "Next Actions.md"

# Inline marker used to flag planned actions before the hotlist existed.
# `hl migrate` moves marked lines onto the hotlist and strips the marker.
legacy_tag = "#flow-planned"
"##;

pub fn cmd_init(root: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = root.join(DATA_DIR);
    let config_path = data_dir.join(CONFIG_FILE);

    if config_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    fs::create_dir_all(&data_dir)?;
    atomic_write(&config_path, CONFIG_TEMPLATE.as_bytes())?;

    println!("Initialized hotlist in {}/", data_dir.display());
    Ok(())
}
