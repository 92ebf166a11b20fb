use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::state::{HotlistState, read_state, write_state};
use crate::io::store_io::{STORE_PATH, StoreIoError, load_store, save_store};
use crate::io::vault::{Vault, VaultError};
use crate::model::config::HotlistConfig;
use crate::model::item::{ItemId, ItemRef, TrackedItem};
use crate::model::store::Store;
use crate::ops::auto_clear::{archive, most_recent_midnight_ms, should_clear};
use crate::ops::debounce::InFlight;
use crate::ops::item_ops::{
    AddRequest, CompleteOptions, ItemError, add_action, convert_to_waiting_for, mark_complete,
};
use crate::ops::migrate::{MigrationOptions, MigrationReport, migrate_legacy};
use crate::ops::reconcile::{
    ReconcileOptions, ReconcileReport, RemovalReason, reconcile, snapshot_files,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreIoError),
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("could not save hotlist state: {0}")]
    State(#[source] std::io::Error),
}

/// Result of an auto-clear or forced clear
#[derive(Debug)]
pub struct ClearOutcome {
    pub archived: Vec<TrackedItem>,
    pub archive_file: String,
}

/// The hotlist for one vault: the store plus everything that keeps it in
/// step with the notes it points into.
pub struct HotlistService<V: Vault> {
    vault: V,
    data_dir: PathBuf,
    config: HotlistConfig,
    state: HotlistState,
    store: Store,
    in_flight: InFlight,
}

impl<V: Vault> HotlistService<V> {
    /// Load the store and state. Retained completed items from before
    /// today's local midnight are purged.
    pub fn open<Tz: TimeZone>(
        vault: V,
        data_dir: impl Into<PathBuf>,
        config: HotlistConfig,
        now: &DateTime<Tz>,
    ) -> Result<Self, ServiceError> {
        let mut service = HotlistService {
            vault,
            data_dir: data_dir.into(),
            config,
            state: HotlistState::default(),
            store: Store::new(),
            in_flight: InFlight::new(),
        };
        service.reload(now)?;
        Ok(service)
    }

    /// Re-read the store and state from disk, picking up writes made by
    /// other processes.
    pub fn reload<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<(), ServiceError> {
        self.store = load_store(&self.vault, STORE_PATH, &self.data_dir)?.store;
        self.state = read_state(&self.data_dir);
        if !self.purge_stale_completed(now).is_empty() {
            self.save()?;
        }
        Ok(())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &HotlistConfig {
        &self.config
    }

    pub fn state(&self) -> &HotlistState {
        &self.state
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn save(&self) -> Result<(), ServiceError> {
        save_store(&self.vault, STORE_PATH, &self.data_dir, &self.store)?;
        Ok(())
    }

    fn save_state(&self) -> Result<(), ServiceError> {
        write_state(&self.data_dir, &self.state).map_err(ServiceError::State)
    }

    fn purge_stale_completed<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<TrackedItem> {
        if !self.config.hotlist.retain_completed {
            return Vec::new();
        }
        let purged = self.store.purge_completed_before(most_recent_midnight_ms(now));
        if !purged.is_empty() {
            tracing::debug!(count = purged.len(), "purged completed items from previous days");
        }
        purged
    }

    /// Bring every item in line with its file. Returns `Ok(None)` when a
    /// pass is already running.
    pub fn reconcile<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
    ) -> Result<Option<ReconcileReport>, ServiceError> {
        let Some(_token) = self.in_flight.try_enter() else {
            tracing::debug!("reconcile already in flight, skipping");
            return Ok(None);
        };

        let files = snapshot_files(&self.vault, &self.store);
        let options = ReconcileOptions {
            retain_completed: self.config.hotlist.retain_completed,
            now_ms: now.timestamp_millis(),
        };
        let report = reconcile(&mut self.store, &files, options);
        let purged = self.purge_stale_completed(now);

        let lost: Vec<String> = report
            .removed
            .iter()
            .filter(|r| r.reason != RemovalReason::Completed)
            .map(|r| {
                format!(
                    "{}:{} {} ({:?})",
                    r.item.file_path, r.item.line_number, r.item.line_content, r.reason
                )
            })
            .collect();
        if !lost.is_empty() {
            tracing::info!(count = lost.len(), "dropped hotlist items whose lines are gone");
            log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryCategory::Reconcile, "untracked vanished lines")
                    .field("Count", lost.len().to_string())
                    .body(lost.join("\n")),
            );
        }

        if report.changed() || !purged.is_empty() {
            self.save()?;
        }
        Ok(Some(report))
    }

    pub fn add(&mut self, request: AddRequest, now_ms: i64) -> Result<ItemId, ServiceError> {
        let id = add_action(&self.vault, &mut self.store, request, &self.config, now_ms)?;
        self.save()?;
        Ok(id)
    }

    pub fn remove(&mut self, item_ref: &ItemRef) -> Result<TrackedItem, ServiceError> {
        let item = self.store.remove(item_ref).ok_or(ItemError::NoSuchItem)?;
        self.save()?;
        Ok(item)
    }

    pub fn pin(&mut self, item_ref: &ItemRef) -> Result<(), ServiceError> {
        if !self.store.pin(item_ref) {
            return Err(ItemError::NoSuchItem.into());
        }
        self.save()
    }

    pub fn unpin(&mut self, item_ref: &ItemRef) -> Result<(), ServiceError> {
        if !self.store.unpin(item_ref) {
            return Err(ItemError::NoSuchItem.into());
        }
        self.save()
    }

    /// Returns false (and saves nothing) unless both items are pinned.
    pub fn reorder_pinned(
        &mut self,
        dragged: &ItemRef,
        target: &ItemRef,
    ) -> Result<bool, ServiceError> {
        if !self.store.reorder_pinned(dragged, target) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn mark_waiting(&mut self, item_ref: &ItemRef) -> Result<(), ServiceError> {
        let legacy = self.config.actions.legacy_tag.clone();
        convert_to_waiting_for(&self.vault, &mut self.store, item_ref, &[legacy.as_str()])?;
        self.save()
    }

    /// Check the item off in its file. Returns the removed item unless
    /// completed items are retained.
    pub fn mark_complete<Tz: TimeZone>(
        &mut self,
        item_ref: &ItemRef,
        now: &DateTime<Tz>,
    ) -> Result<Option<TrackedItem>, ServiceError> {
        let options = CompleteOptions {
            retain: self.config.hotlist.retain_completed,
            stamp_date: self
                .config
                .hotlist
                .completion_stamp
                .then(|| now.date_naive()),
            now_ms: now.timestamp_millis(),
        };
        let removed = mark_complete(&self.vault, &mut self.store, item_ref, options)?;
        self.save()?;
        Ok(removed)
    }

    /// Archive and clear the hotlist if the daily clear is due.
    pub fn run_auto_clear<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
    ) -> Result<Option<ClearOutcome>, ServiceError>
    where
        Tz::Offset: std::fmt::Display,
    {
        if !should_clear(
            &self.config.hotlist.auto_clear_time,
            self.state.last_clear_ms,
            now,
        ) {
            return Ok(None);
        }
        self.force_clear(now).map(Some)
    }

    /// Archive every item, empty the store and record the clear time.
    /// Nothing is cleared if the archive cannot be written.
    pub fn force_clear<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<ClearOutcome, ServiceError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let archive_file = self.config.hotlist.archive_file.clone();
        let items = self.store.to_vec();
        archive(&self.vault, &items, &archive_file, now)?;

        let archived = self.store.clear();
        self.save()?;
        self.state.last_clear_ms = now.timestamp_millis();
        self.save_state()?;
        tracing::info!(count = archived.len(), archive = %archive_file, "cleared hotlist");

        Ok(ClearOutcome {
            archived,
            archive_file,
        })
    }

    /// Move inline legacy markers onto the hotlist and remember that the
    /// vault has been migrated.
    pub fn migrate(&mut self, now_ms: i64) -> Result<MigrationReport, ServiceError> {
        let options = MigrationOptions {
            legacy_tag: self.config.actions.legacy_tag.clone(),
            general_file: self.config.actions.general_file.clone(),
            skip_paths: vec![
                STORE_PATH.to_string(),
                self.config.hotlist.archive_file.clone(),
            ],
            now_ms,
        };
        let report = migrate_legacy(&self.vault, &mut self.store, &options)?;
        if report.added > 0 || report.relinked > 0 {
            self.save()?;
        }
        if !self.state.legacy_migrated {
            self.state.legacy_migrated = true;
            self.save_state()?;
        }
        Ok(report)
    }

    /// Run the migration unless it has already run for this vault.
    pub fn migrate_once(&mut self, now_ms: i64) -> Result<Option<MigrationReport>, ServiceError> {
        if self.state.legacy_migrated {
            return Ok(None);
        }
        self.migrate(now_ms).map(Some)
    }
}
