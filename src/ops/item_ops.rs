use chrono::NaiveDate;

use crate::io::vault::{Vault, VaultError};
use crate::model::config::HotlistConfig;
use crate::model::item::{CheckboxStatus, ItemId, ItemRef, TrackedItem};
use crate::model::store::Store;
use crate::parse::action_finder::{FindError, find_action_in_vault};
use crate::parse::archive_serializer::link_target;
use crate::parse::checkbox::{display_text, parse_checkbox, set_status, sphere_of};
use crate::parse::lines::{line_at, replace_line};
use crate::parse::locate::locate;

/// Error type for operations on single hotlist items
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("no such hotlist item")]
    NoSuchItem,
    #[error("{0}")]
    Find(#[from] FindError),
    #[error("the tracked line no longer exists in {0}")]
    LineNotFound(String),
    #[error("line {line} of {path} is not a checkbox")]
    NotACheckbox { path: String, line: usize },
    #[error("line {line} of {path} is already checked off")]
    AlreadyComplete { path: String, line: usize },
    #[error("line {line} of {path} is already on the hotlist")]
    AlreadyTracked { path: String, line: usize },
    #[error("could not update {path}: {source}")]
    Vault {
        path: String,
        #[source]
        source: VaultError,
    },
}

/// A request to put an action on the hotlist.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    pub file_path: String,
    pub action_text: String,
    /// Defaults to the line's sphere tag, then `general` for the shared
    /// actions file, then the project path
    pub category: Option<String>,
    /// Defaults to whether the file is the configured general actions file
    pub is_general_action: Option<bool>,
    pub pinned: bool,
}

/// Find the action in its file and track it from that line.
pub fn add_action<V: Vault + ?Sized>(
    vault: &V,
    store: &mut Store,
    request: AddRequest,
    config: &HotlistConfig,
    now_ms: i64,
) -> Result<ItemId, ItemError> {
    let legacy = config.actions.legacy_tag.as_str();
    let found = find_action_in_vault(vault, &request.file_path, &request.action_text, &[legacy])?;

    if store.tracks_line(&request.file_path, found.line_number) {
        return Err(ItemError::AlreadyTracked {
            path: request.file_path,
            line: found.line_number,
        });
    }

    let is_general = request
        .is_general_action
        .unwrap_or_else(|| config.is_general_file(&request.file_path));
    let category = request
        .category
        .or_else(|| sphere_of(&found.line_content))
        .unwrap_or_else(|| {
            if is_general {
                "general".to_string()
            } else {
                link_target(&request.file_path).to_string()
            }
        });

    let text = display_text(&found.line_content, &[legacy]);
    let mut item = TrackedItem::new(
        request.file_path,
        found.line_number,
        found.line_content,
        text,
        now_ms,
    );
    item.category = category;
    item.is_general_action = is_general;
    item.is_pinned = request.pinned;

    Ok(store.add(item))
}

/// Re-locate the item's line, rewrite its checkbox and persist the file.
/// Returns the rewritten line and its current line number; the store is
/// only touched by the caller. A line that is already checked off is left
/// alone.
fn rewrite_status<V: Vault + ?Sized>(
    vault: &V,
    item: &TrackedItem,
    status: CheckboxStatus,
    suffix: Option<&str>,
) -> Result<(usize, String), ItemError> {
    let path = item.file_path.as_str();
    let text = vault.read(path).map_err(|e| match e {
        VaultError::NotFound(_) => ItemError::LineNotFound(path.to_string()),
        source => ItemError::Vault {
            path: path.to_string(),
            source,
        },
    })?;

    let line_number = locate(&text, item.line_number, &item.line_content)
        .line_number()
        .ok_or_else(|| ItemError::LineNotFound(path.to_string()))?;
    let line = line_at(&text, line_number).ok_or_else(|| ItemError::LineNotFound(path.to_string()))?;

    let not_a_checkbox = || ItemError::NotACheckbox {
        path: path.to_string(),
        line: line_number,
    };
    let current = parse_checkbox(line).ok_or_else(not_a_checkbox)?;
    if current.status() == CheckboxStatus::Done {
        return Err(ItemError::AlreadyComplete {
            path: path.to_string(),
            line: line_number,
        });
    }
    let mut new_line = set_status(line, status).ok_or_else(not_a_checkbox)?;
    if let Some(suffix) = suffix {
        new_line.push_str(suffix);
    }

    let new_text = replace_line(&text, line_number, &new_line)
        .ok_or_else(|| ItemError::LineNotFound(path.to_string()))?;
    vault.write(path, &new_text).map_err(|source| ItemError::Vault {
        path: path.to_string(),
        source,
    })?;

    Ok((line_number, new_line))
}

/// Mark the item's line as waiting (`[w]`) and keep tracking it.
pub fn convert_to_waiting_for<V: Vault + ?Sized>(
    vault: &V,
    store: &mut Store,
    item_ref: &ItemRef,
    extra_tags: &[&str],
) -> Result<(), ItemError> {
    let id = store.resolve(item_ref).ok_or(ItemError::NoSuchItem)?;
    let item = store.get(id).ok_or(ItemError::NoSuchItem)?;
    let (line_number, new_line) = rewrite_status(vault, item, CheckboxStatus::Waiting, None)?;

    let item = store.get_mut(id).ok_or(ItemError::NoSuchItem)?;
    item.line_number = line_number;
    item.display_text = display_text(&new_line, extra_tags);
    item.line_content = new_line;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct CompleteOptions {
    /// Keep the item with `completed_at` set instead of removing it
    pub retain: bool,
    /// Date appended as ` ✅ YYYY-MM-DD`, if any
    pub stamp_date: Option<NaiveDate>,
    pub now_ms: i64,
}

/// Check off the item's line. Returns the removed item, or `None` when the
/// store retains completed items.
pub fn mark_complete<V: Vault + ?Sized>(
    vault: &V,
    store: &mut Store,
    item_ref: &ItemRef,
    options: CompleteOptions,
) -> Result<Option<TrackedItem>, ItemError> {
    let id = store.resolve(item_ref).ok_or(ItemError::NoSuchItem)?;
    let item = store.get(id).ok_or(ItemError::NoSuchItem)?;
    let suffix = options
        .stamp_date
        .map(|d| format!(" ✅ {}", d.format("%Y-%m-%d")));
    let (line_number, new_line) =
        rewrite_status(vault, item, CheckboxStatus::Done, suffix.as_deref())?;

    if options.retain {
        let item = store.get_mut(id).ok_or(ItemError::NoSuchItem)?;
        item.line_number = line_number;
        item.line_content = new_line;
        item.completed_at = Some(options.now_ms);
        return Ok(None);
    }
    Ok(store.remove(&ItemRef::Id(id)))
}
