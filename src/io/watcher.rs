use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the watch loop.
#[derive(Debug, PartialEq, Eq)]
pub enum VaultEvent {
    /// One or more markdown notes changed on disk (vault-relative paths).
    Changed(Vec<String>),
}

/// A file system watcher for a vault directory.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<VaultEvent>,
}

impl VaultWatcher {
    /// Start watching `root` recursively.
    /// Call `poll()` on each tick of the watch loop.
    pub fn start(root: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let root_owned = root.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::debug!(error = %e, "watch error");
                        return;
                    }
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                let relevant = relevant_paths(&root_owned, &event.paths);
                if !relevant.is_empty() {
                    let _ = tx.send(VaultEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(VaultWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending events.
    pub fn poll(&self) -> Vec<VaultEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

/// Keep markdown files inside `root`, outside any hidden directory (which
/// covers the hotlist's own `.hotlist/` data), as vault-relative paths.
fn relevant_paths(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
        .filter_map(|p| {
            let rel = p.strip_prefix(root).ok()?;
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if parts.iter().any(|part| part.starts_with('.')) {
                return None;
            }
            Some(parts.join("/"))
        })
        .collect()
}
