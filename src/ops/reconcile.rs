use std::collections::HashMap;

use crate::io::vault::{Vault, VaultError};
use crate::model::item::{CheckboxStatus, ItemId, ItemRef, TrackedItem};
use crate::model::store::Store;
use crate::parse::checkbox::parse_checkbox;
use crate::parse::lines::line_at;
use crate::parse::locate::{Location, locate};

/// The current state of one source file, as read for a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSnapshot {
    Text(String),
    Missing,
    /// Read failed for a reason other than absence; items in it are left alone
    Unreadable(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Stamp completed lines instead of dropping their items
    pub retain_completed: bool,
    pub now_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// No line in the file equals the captured content any more
    LineGone,
    FileMissing,
    /// The tracked line is checked off
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedItem {
    pub item: TrackedItem,
    pub reason: RemovalReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMove {
    pub id: ItemId,
    pub from: usize,
    pub to: usize,
}

/// What a reconcile pass did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub kept: Vec<TrackedItem>,
    pub removed: Vec<RemovedItem>,
    pub moved: Vec<LineMove>,
    pub stamped_completed: Vec<ItemId>,
    /// Items whose file could not be read; unchanged until the next pass
    pub skipped: Vec<ItemId>,
}

impl ReconcileReport {
    /// Whether the store changed and must be saved
    pub fn changed(&self) -> bool {
        !self.removed.is_empty() || !self.moved.is_empty() || !self.stamped_completed.is_empty()
    }
}

/// Re-locate every tracked line and update the store.
///
/// Items whose line still exists verbatim get their line number refreshed.
/// Items whose line is gone (edited, deleted, or its file removed) are
/// removed. A checked-off line removes its item, or in a retaining store
/// stamps `completed_at` and keeps it. Files missing from `files` count as
/// missing. Unreadable files never abort the pass.
pub fn reconcile(
    store: &mut Store,
    files: &HashMap<String, FileSnapshot>,
    options: ReconcileOptions,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for id in store.ids() {
        let Some(item) = store.get(id) else {
            continue;
        };

        let text = match files.get(&item.file_path) {
            Some(FileSnapshot::Text(t)) => t,
            Some(FileSnapshot::Unreadable(reason)) => {
                tracing::warn!(path = %item.file_path, reason = %reason, "leaving item unchanged: file unreadable");
                report.skipped.push(id);
                report.kept.push(item.clone());
                continue;
            }
            Some(FileSnapshot::Missing) | None => {
                remove(store, id, RemovalReason::FileMissing, &mut report);
                continue;
            }
        };

        let location = locate(text, item.line_number, &item.line_content);
        let Some(line_number) = location.line_number() else {
            remove(store, id, RemovalReason::LineGone, &mut report);
            continue;
        };

        let status = line_at(text, line_number)
            .and_then(parse_checkbox)
            .map(|cb| cb.status());

        if status == Some(CheckboxStatus::Done) && !options.retain_completed {
            remove(store, id, RemovalReason::Completed, &mut report);
            continue;
        }

        let Some(item) = store.get_mut(id) else {
            continue;
        };
        if let Location::Moved(to) = location {
            report.moved.push(LineMove {
                id,
                from: item.line_number,
                to,
            });
            item.line_number = to;
        }
        if status == Some(CheckboxStatus::Done) && item.completed_at.is_none() {
            item.completed_at = Some(options.now_ms);
            report.stamped_completed.push(id);
        }
        report.kept.push(item.clone());
    }

    report
}

fn remove(store: &mut Store, id: ItemId, reason: RemovalReason, report: &mut ReconcileReport) {
    if let Some(item) = store.remove(&ItemRef::Id(id)) {
        tracing::debug!(path = %item.file_path, line = item.line_number, ?reason, "removing hotlist item");
        report.removed.push(RemovedItem { item, reason });
    }
}

/// Read every file the store references, once per path.
pub fn snapshot_files<V: Vault + ?Sized>(vault: &V, store: &Store) -> HashMap<String, FileSnapshot> {
    let mut files = HashMap::new();
    for item in store.iter() {
        if files.contains_key(&item.file_path) {
            continue;
        }
        let snapshot = match vault.read(&item.file_path) {
            Ok(text) => FileSnapshot::Text(text),
            Err(VaultError::NotFound(_)) => FileSnapshot::Missing,
            Err(e) => {
                tracing::warn!(path = %item.file_path, error = %e, "could not read file during reconcile");
                FileSnapshot::Unreadable(e.to_string())
            }
        };
        files.insert(item.file_path.clone(), snapshot);
    }
    files
}
