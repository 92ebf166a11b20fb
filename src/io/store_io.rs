use std::path::Path;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::vault::{Vault, VaultError};
use crate::model::store::Store;
use crate::parse::store_codec::{DroppedRecord, StoreFormat, parse_store, serialize_store};

/// Directory (inside the vault) holding hotlist data
pub const DATA_DIR: &str = ".hotlist";

/// Vault-relative path of the persisted store
pub const STORE_PATH: &str = ".hotlist/hotlist.jsonl";

#[derive(Debug, thiserror::Error)]
pub enum StoreIoError {
    #[error("could not read hotlist store: {0}")]
    Read(#[source] VaultError),
    #[error("could not save hotlist store: {0}")]
    Write(#[source] VaultError),
}

/// A store as loaded from disk, plus what had to be repaired on the way.
#[derive(Debug)]
pub struct LoadedStore {
    pub store: Store,
    pub dropped: Vec<DroppedRecord>,
    /// The file was in an older layout and has been rewritten
    pub upgraded: bool,
}

/// Load the store from `store_path`. A missing file is an empty store.
///
/// Malformed lines are skipped with a warning and copied to the recovery
/// log in `data_dir`. Older layouts are rewritten in the current one.
pub fn load_store<V: Vault + ?Sized>(
    vault: &V,
    store_path: &str,
    data_dir: &Path,
) -> Result<LoadedStore, StoreIoError> {
    let text = match vault.read(store_path) {
        Ok(t) => t,
        Err(VaultError::NotFound(_)) => {
            return Ok(LoadedStore {
                store: Store::new(),
                dropped: Vec::new(),
                upgraded: false,
            });
        }
        Err(e) => return Err(StoreIoError::Read(e)),
    };

    let parsed = parse_store(&text);

    for record in &parsed.dropped {
        tracing::warn!(
            path = store_path,
            line = record.line_number,
            error = %record.error,
            "skipping malformed hotlist record"
        );
    }
    if !parsed.dropped.is_empty() {
        let body = parsed
            .dropped
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        log_recovery(
            data_dir,
            RecoveryEntry::new(RecoveryCategory::Parser, "dropped hotlist records")
                .field("Source", store_path)
                .field("Count", parsed.dropped.len().to_string())
                .body(body),
        );
    }

    let upgraded = parsed.needs_upgrade();
    let store = Store::from_items(parsed.items);

    if upgraded {
        if parsed.format == StoreFormat::LegacyBlob {
            tracing::info!(path = store_path, items = store.len(), "upgrading legacy hotlist file");
        }
        save_store(vault, store_path, data_dir, &store)?;
    }

    Ok(LoadedStore {
        store,
        dropped: parsed.dropped,
        upgraded,
    })
}

/// Persist the store. On failure the serialized content is kept in the
/// recovery log before the error is returned.
pub fn save_store<V: Vault + ?Sized>(
    vault: &V,
    store_path: &str,
    data_dir: &Path,
    store: &Store,
) -> Result<(), StoreIoError> {
    let content = serialize_store(store.iter());
    if let Err(e) = vault.write(store_path, &content) {
        log_recovery(
            data_dir,
            RecoveryEntry::new(RecoveryCategory::Write, "hotlist write failed")
                .field("Target", store_path)
                .field("Error", e.to_string())
                .body(content),
        );
        return Err(StoreIoError::Write(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::read_recovery_entries;
    use crate::io::vault::FsVault;
    use crate::model::item::TrackedItem;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsVault) {
        let tmp = TempDir::new().unwrap();
        let vault = FsVault::new(tmp.path());
        (tmp, vault)
    }

    fn sample_store() -> Store {
        let mut store = Store::new();
        let mut pinned = TrackedItem::new("Projects/A.md", 3, "- [ ] Pinned one", "Pinned one", 10);
        pinned.is_pinned = true;
        store.add(TrackedItem::new("Next Actions.md", 1, "- [ ] Loose", "Loose", 20));
        store.add(pinned);
        store
    }

    #[test]
    fn missing_store_is_empty() {
        let (tmp, vault) = setup();
        let loaded = load_store(&vault, STORE_PATH, &tmp.path().join(DATA_DIR)).unwrap();
        assert!(loaded.store.is_empty());
        assert!(!loaded.upgraded);
    }

    #[test]
    fn save_then_load_round_trip() {
        let (tmp, vault) = setup();
        let data_dir = tmp.path().join(DATA_DIR);
        let store = sample_store();
        save_store(&vault, STORE_PATH, &data_dir, &store).unwrap();

        let loaded = load_store(&vault, STORE_PATH, &data_dir).unwrap();
        assert_eq!(loaded.store.to_vec(), store.to_vec());
        assert!(loaded.dropped.is_empty());
    }

    #[test]
    fn save_empty_store_then_load() {
        let (tmp, vault) = setup();
        let data_dir = tmp.path().join(DATA_DIR);
        save_store(&vault, STORE_PATH, &data_dir, &Store::new()).unwrap();
        assert_eq!(vault.read(STORE_PATH).unwrap(), "");
        assert!(load_store(&vault, STORE_PATH, &data_dir).unwrap().store.is_empty());
    }

    #[test]
    fn corrupt_line_is_skipped_and_recorded() {
        let (tmp, vault) = setup();
        let data_dir = tmp.path().join(DATA_DIR);
        let items = sample_store().to_vec();
        let text = format!(
            "{}\nnot json at all\n{}\n",
            serde_json::to_string(&items[0]).unwrap(),
            serde_json::to_string(&items[1]).unwrap()
        );
        vault.write(STORE_PATH, &text).unwrap();

        let loaded = load_store(&vault, STORE_PATH, &data_dir).unwrap();
        assert_eq!(loaded.store.len(), 2);
        assert_eq!(loaded.dropped.len(), 1);

        let entries = read_recovery_entries(&data_dir, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, "not json at all");
    }

    #[test]
    fn legacy_blob_is_rewritten_as_lines() {
        let (tmp, vault) = setup();
        let data_dir = tmp.path().join(DATA_DIR);
        let items = sample_store().to_vec();
        vault
            .write(STORE_PATH, &serde_json::to_string_pretty(&items).unwrap())
            .unwrap();

        let loaded = load_store(&vault, STORE_PATH, &data_dir).unwrap();
        assert!(loaded.upgraded);
        assert_eq!(loaded.store.to_vec(), items);

        let rewritten = vault.read(STORE_PATH).unwrap();
        assert_eq!(rewritten.lines().count(), 2);
        let again = load_store(&vault, STORE_PATH, &data_dir).unwrap();
        assert!(!again.upgraded);
        assert_eq!(again.store.to_vec(), items);
    }

    #[test]
    fn legacy_blob_with_bad_element_keeps_the_rest() {
        let (tmp, vault) = setup();
        let data_dir = tmp.path().join(DATA_DIR);
        let items = sample_store().to_vec();
        let mut values: Vec<serde_json::Value> =
            items.iter().map(|i| serde_json::to_value(i).unwrap()).collect();
        values.insert(1, serde_json::json!({ "filePath": "Broken.md" }));
        vault
            .write(STORE_PATH, &serde_json::to_string_pretty(&values).unwrap())
            .unwrap();

        let loaded = load_store(&vault, STORE_PATH, &data_dir).unwrap();
        assert!(loaded.upgraded);
        assert_eq!(loaded.dropped.len(), 1);
        assert_eq!(loaded.store.to_vec(), items);

        let rewritten = vault.read(STORE_PATH).unwrap();
        assert_eq!(rewritten.lines().count(), 2);
        let entries = read_recovery_entries(&data_dir, None);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].body.contains("Broken.md"));
    }
}
