use serde::Serialize;

use crate::model::item::TrackedItem;
use crate::model::store::Store;
use crate::ops::migrate::MigrationReport;
use crate::ops::reconcile::{ReconcileReport, RemovalReason};
use crate::parse::checkbox::parse_checkbox;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemJson {
    pub id: String,
    pub short_id: String,
    pub file_path: String,
    pub line_number: usize,
    pub display_text: String,
    pub category: String,
    pub status: char,
    pub is_general_action: bool,
    pub is_pinned: bool,
    pub added_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

#[derive(Serialize)]
pub struct RemovedJson {
    pub id: String,
    pub file_path: String,
    pub line_number: usize,
    pub reason: &'static str,
}

#[derive(Serialize)]
pub struct ReconcileJson {
    pub kept: usize,
    pub moved: usize,
    pub removed: Vec<RemovedJson>,
    pub skipped: usize,
}

#[derive(Serialize)]
pub struct MigrateJson {
    pub added: usize,
    pub relinked: usize,
    pub files_changed: Vec<String>,
    pub skipped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn status_char(item: &TrackedItem) -> char {
    parse_checkbox(&item.line_content)
        .map(|cb| cb.status)
        .unwrap_or(' ')
}

pub fn item_to_json(item: &TrackedItem) -> ItemJson {
    ItemJson {
        id: item.id.to_string(),
        short_id: item.id.short(),
        file_path: item.file_path.clone(),
        line_number: item.line_number,
        display_text: item.display_text.clone(),
        category: item.category.clone(),
        status: status_char(item),
        is_general_action: item.is_general_action,
        is_pinned: item.is_pinned,
        added_at: item.added_at,
        completed_at: item.completed_at,
    }
}

fn reason_str(reason: RemovalReason) -> &'static str {
    match reason {
        RemovalReason::LineGone => "line-gone",
        RemovalReason::FileMissing => "file-missing",
        RemovalReason::Completed => "completed",
    }
}

pub fn reconcile_to_json(report: &ReconcileReport) -> ReconcileJson {
    ReconcileJson {
        kept: report.kept.len(),
        moved: report.moved.len(),
        removed: report
            .removed
            .iter()
            .map(|r| RemovedJson {
                id: r.item.id.to_string(),
                file_path: r.item.file_path.clone(),
                line_number: r.item.line_number,
                reason: reason_str(r.reason),
            })
            .collect(),
        skipped: report.skipped.len(),
    }
}

pub fn migration_to_json(report: &MigrationReport) -> MigrateJson {
    MigrateJson {
        added: report.added,
        relinked: report.relinked,
        files_changed: report.files_changed.clone(),
        skipped: report.skipped.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single item as a one-line summary
pub fn format_item_line(item: &TrackedItem) -> String {
    format!(
        "[{}] {}  {}  ({})  {}:{}",
        status_char(item),
        item.id.short(),
        item.display_text,
        item.category,
        item.file_path,
        item.line_number
    )
}

/// Format the whole hotlist, pinned section first
pub fn format_hotlist(store: &Store) -> Vec<String> {
    if store.is_empty() {
        return vec!["hotlist is empty".to_string()];
    }
    let mut lines = Vec::new();
    let pinned: Vec<&TrackedItem> = store.pinned().collect();
    if !pinned.is_empty() {
        lines.push("-- Pinned --".to_string());
        lines.extend(pinned.iter().map(|i| format_item_line(i)));
        lines.push(String::new());
    }
    lines.extend(store.unpinned().map(format_item_line));
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

pub fn format_reconcile_summary(report: &ReconcileReport) -> Vec<String> {
    let mut lines = vec![format!(
        "kept {}, moved {}, removed {}",
        report.kept.len(),
        report.moved.len(),
        report.removed.len()
    )];
    for r in &report.removed {
        lines.push(format!(
            "  removed {} ({}): {}",
            r.item.id.short(),
            reason_str(r.reason),
            r.item.display_text
        ));
    }
    if !report.skipped.is_empty() {
        lines.push(format!("  {} item(s) skipped: file unreadable", report.skipped.len()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(text: &str, status: char) -> TrackedItem {
        let mut i = TrackedItem::new(
            "Projects/Site.md",
            4,
            format!("- [{}] {}", status, text),
            text,
            1,
        );
        i.category = "work".into();
        i
    }

    #[test]
    fn item_line_shows_status_and_location() {
        let it = item("Draft copy", 'w');
        let line = format_item_line(&it);
        assert_eq!(
            line,
            format!("[w] {}  Draft copy  (work)  Projects/Site.md:4", it.id.short())
        );
    }

    #[test]
    fn hotlist_lists_pinned_section_first() {
        let mut store = Store::new();
        store.add(item("Loose", ' '));
        let mut pinned = item("Urgent", ' ');
        pinned.is_pinned = true;
        store.add(pinned);

        let lines = format_hotlist(&store);
        assert_eq!(lines[0], "-- Pinned --");
        assert!(lines[1].contains("Urgent"));
        assert_eq!(lines[2], "");
        assert!(lines[3].contains("Loose"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn only_pinned_has_no_trailing_blank() {
        let mut store = Store::new();
        let mut pinned = item("Urgent", ' ');
        pinned.is_pinned = true;
        store.add(pinned);
        assert_eq!(format_hotlist(&store).len(), 2);
    }

    #[test]
    fn empty_hotlist_message() {
        assert_eq!(format_hotlist(&Store::new()), vec!["hotlist is empty"]);
    }

    #[test]
    fn json_uses_camel_case() {
        let json = serde_json::to_value(item_to_json(&item("Draft copy", 'x'))).unwrap();
        assert_eq!(json["displayText"], "Draft copy");
        assert_eq!(json["status"], "x");
        assert!(json.get("completedAt").is_none());
    }
}
