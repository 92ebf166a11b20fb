use std::collections::HashSet;

use crate::io::vault::{Vault, VaultError};
use crate::model::item::{ItemId, TrackedItem};
use crate::model::store::Store;
use crate::parse::checkbox::{display_text, has_tag, is_checkbox_line, sphere_of, strip_tag};

/// Settings for a legacy-marker migration pass
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Inline marker that used to flag planned actions, e.g. `#flow-planned`
    pub legacy_tag: String,
    pub general_file: String,
    /// Files never scanned (the store and the archive)
    pub skip_paths: Vec<String>,
    pub now_ms: i64,
}

/// Result of a migration pass
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Files whose lines had the marker stripped
    pub files_changed: Vec<String>,
    /// Number of items added to the store
    pub added: usize,
    /// Items that already tracked a marked line and now follow the cleaned one
    pub relinked: usize,
    /// Files that could not be read and were left as they were
    pub skipped: Vec<String>,
}

/// Move every checkbox line carrying the legacy marker onto the hotlist.
///
/// The marker is stripped from each line (the rest of the line is kept
/// as-is) and the cleaned line is tracked. Each changed file is written
/// once. Running again finds no markers and changes nothing. An item that
/// already tracks a marked line is moved onto the cleaned line instead of
/// being added twice, so the next reconcile still finds it.
pub fn migrate_legacy<V: Vault + ?Sized>(
    vault: &V,
    store: &mut Store,
    options: &MigrationOptions,
) -> Result<MigrationReport, VaultError> {
    let mut report = MigrationReport::default();
    let tag = options.legacy_tag.as_str();
    if tag.is_empty() {
        return Ok(report);
    }

    for path in vault.list_markdown()? {
        if options.skip_paths.iter().any(|p| p == &path) {
            continue;
        }
        let text = match vault.read(&path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "skipping file during migration");
                report.skipped.push(path);
                continue;
            }
        };
        if !text.contains(tag) {
            continue;
        }

        let mut changed = false;
        let mut out_lines: Vec<String> = Vec::new();
        let mut new_items = Vec::new();
        let mut relinks: Vec<(ItemId, usize, String)> = Vec::new();
        let mut relinked_ids = HashSet::new();
        for (idx, raw) in text.split('\n').enumerate() {
            // raw segments keep their \r so line endings survive the rewrite
            let (line, cr) = match raw.strip_suffix('\r') {
                Some(l) => (l, "\r"),
                None => (raw, ""),
            };
            let cleaned = if is_checkbox_line(line) && has_tag(line, tag) {
                strip_tag(line, tag)
            } else {
                None
            };
            let Some(cleaned) = cleaned else {
                out_lines.push(raw.to_string());
                continue;
            };

            changed = true;
            let line_number = idx + 1;
            if let Some(id) = tracked_item_for(store, &path, line_number, line, &relinked_ids) {
                relinked_ids.insert(id);
                relinks.push((id, line_number, cleaned.clone()));
            } else if !store.tracks_line(&path, line_number) {
                let mut item = TrackedItem::new(
                    path.clone(),
                    line_number,
                    cleaned.clone(),
                    display_text(&cleaned, &[]),
                    options.now_ms,
                );
                item.category = sphere_of(&cleaned).unwrap_or_else(|| "general".to_string());
                item.is_general_action = path == options.general_file;
                new_items.push(item);
            }
            out_lines.push(format!("{cleaned}{cr}"));
        }

        if !changed {
            continue;
        }
        vault.write(&path, &out_lines.join("\n"))?;
        tracing::info!(
            path = %path,
            added = new_items.len(),
            relinked = relinks.len(),
            "migrated legacy markers"
        );
        report.added += new_items.len();
        report.relinked += relinks.len();
        for (id, line_number, cleaned) in relinks {
            if let Some(item) = store.get_mut(id) {
                item.line_number = line_number;
                item.display_text = display_text(&cleaned, &[]);
                item.line_content = cleaned;
            }
        }
        for item in new_items {
            store.add(item);
        }
        report.files_changed.push(path);
    }

    Ok(report)
}

/// The item tracking this exact marked line, preferring one already at
/// `line_number`. Items relinked earlier in the same file are skipped so
/// identical lines each keep at most one item.
fn tracked_item_for(
    store: &Store,
    path: &str,
    line_number: usize,
    line: &str,
    taken: &HashSet<ItemId>,
) -> Option<ItemId> {
    let candidates = || {
        store
            .iter()
            .filter(|i| i.file_path == path && i.line_content == line && !taken.contains(&i.id))
    };
    candidates()
        .find(|i| i.line_number == line_number)
        .or_else(|| candidates().next())
        .map(|i| i.id)
}
