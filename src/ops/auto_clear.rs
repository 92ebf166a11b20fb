use chrono::{DateTime, NaiveTime, TimeZone};

use crate::io::vault::{Vault, VaultError};
use crate::model::item::TrackedItem;
use crate::parse::archive_serializer::{format_archive_entry, prepend_entry};

/// Parse a configured "HH:MM" time of day. Empty means disabled.
pub fn parse_clear_time(configured: &str) -> Option<NaiveTime> {
    let configured = configured.trim();
    if configured.is_empty() {
        return None;
    }
    match NaiveTime::parse_from_str(configured, "%H:%M") {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::warn!(value = configured, error = %e, "ignoring malformed auto-clear time");
            None
        }
    }
}

/// Decide whether the daily clear is due.
///
/// Due once `now` has passed today's configured time, unless a clear
/// already happened on `now`'s calendar day. `last_clear_ms == 0` means
/// never cleared. Calendar days are taken in `now`'s time zone.
pub fn should_clear<Tz: TimeZone>(configured: &str, last_clear_ms: i64, now: &DateTime<Tz>) -> bool {
    let Some(clear_time) = parse_clear_time(configured) else {
        return false;
    };

    let today = now.date_naive();
    if now.naive_local() < today.and_time(clear_time) {
        return false;
    }
    if last_clear_ms == 0 {
        return true;
    }

    match now.timezone().timestamp_millis_opt(last_clear_ms).single() {
        Some(last) => last.date_naive() != today,
        None => true,
    }
}

/// Epoch milliseconds of the most recent local midnight at or before `now`.
pub fn most_recent_midnight_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.timestamp_millis(),
        // Midnight skipped by a DST jump: fall back to the UTC reading
        None => midnight.and_utc().timestamp_millis(),
    }
}

/// Record `items` in the archive file, newest entry first.
///
/// Reads the existing archive, prepends the new entry and writes the whole
/// file back atomically, so a failed write leaves the old archive intact.
pub fn archive<V: Vault + ?Sized, Tz: TimeZone>(
    vault: &V,
    items: &[TrackedItem],
    archive_path: &str,
    cleared_at: &DateTime<Tz>,
) -> Result<(), VaultError>
where
    Tz::Offset: std::fmt::Display,
{
    let existing = match vault.read(archive_path) {
        Ok(text) => text,
        Err(VaultError::NotFound(_)) => String::new(),
        Err(e) => return Err(e),
    };

    if let Some((parent, _)) = archive_path.rsplit_once('/')
        && !parent.is_empty()
    {
        vault.create_folder(parent)?;
    }

    let entry = format_archive_entry(items, cleared_at);
    vault.write(archive_path, &prepend_entry(&entry, &existing))
}
