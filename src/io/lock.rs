use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".lock";

/// Exclusive advisory lock on the hotlist data directory.
///
/// Every process that rewrites the store holds one, so a running `hl watch`
/// and a one-shot `hl done` never interleave their writes. Released on drop.
/// The lock file itself is left in place: unlinking it would let a waiter
/// lock a stale inode while a newcomer locks a fresh one.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("gave up after {waited:?} waiting for {path}: another hl process is writing the hotlist")]
    Timeout { path: PathBuf, waited: Duration },
}

impl StoreLock {
    /// Take the lock if it is free right now.
    pub fn try_acquire(data_dir: &Path) -> Result<Option<Self>, LockError> {
        let file = open_lock_file(data_dir)?;
        Ok(flock_exclusive(&file).then_some(StoreLock { _file: file }))
    }

    /// Take the lock, polling with a growing pause until `timeout` elapses.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let file = open_lock_file(data_dir)?;
        let start = Instant::now();
        let mut pause = Duration::from_millis(5);
        while !flock_exclusive(&file) {
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: data_dir.join(LOCK_FILE),
                    waited,
                });
            }
            std::thread::sleep(pause.min(timeout - waited));
            pause = (pause * 2).min(Duration::from_millis(100));
        }
        Ok(StoreLock { _file: file })
    }

    /// `acquire` with a 5 second timeout
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, Duration::from_secs(5))
    }
}

fn open_lock_file(data_dir: &Path) -> Result<File, LockError> {
    let path = data_dir.join(LOCK_FILE);
    fs::create_dir_all(data_dir)
        .and_then(|_| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
        })
        .map_err(|source| LockError::Open { path, source })
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    // SAFETY: the descriptor is owned by `file` and stays open for the call
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn released_on_drop() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join(".hotlist");
        let lock = StoreLock::acquire_default(&data_dir).unwrap();
        drop(lock);
        assert!(StoreLock::try_acquire(&data_dir).unwrap().is_some());
        assert!(data_dir.join(LOCK_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn contention() {
        let tmp = TempDir::new().unwrap();
        let _held = StoreLock::acquire_default(tmp.path()).unwrap();

        assert!(StoreLock::try_acquire(tmp.path()).unwrap().is_none());
        let second = StoreLock::acquire(tmp.path(), Duration::from_millis(40));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }
}
