use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;

/// Error type for vault file access
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("could not access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl VaultError {
    fn from_io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            VaultError::NotFound(path.to_string())
        } else {
            VaultError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// File access to a vault of markdown notes.
///
/// Paths are vault-relative and use `/` separators. Everything that reads
/// or writes notes goes through this trait.
pub trait Vault {
    fn read(&self, path: &str) -> Result<String, VaultError>;
    /// Replace the whole file. Implementations must never leave a partially
    /// written file behind.
    fn write(&self, path: &str, content: &str) -> Result<(), VaultError>;
    fn exists(&self, path: &str) -> bool;
    fn create_folder(&self, path: &str) -> Result<(), VaultError>;
    /// Every markdown file in the vault, sorted. Hidden directories are skipped.
    fn list_markdown(&self) -> Result<Vec<String>, VaultError>;
}

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsVault { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a vault-relative path
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Vault-relative path for an absolute path inside the vault
    pub fn relative(&self, abs: &Path) -> Option<String> {
        let rel = abs.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn collect_markdown(&self, dir: &Path, out: &mut Vec<String>) -> Result<(), VaultError> {
        let dir_display = dir.to_string_lossy().into_owned();
        let entries = fs::read_dir(dir).map_err(|e| VaultError::from_io(&dir_display, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| VaultError::from_io(&dir_display, e))?;
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }
            if path.is_dir() {
                self.collect_markdown(&path, out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("md")
                && let Some(rel) = self.relative(&path)
            {
                out.push(rel);
            }
        }
        Ok(())
    }
}

impl Vault for FsVault {
    fn read(&self, path: &str) -> Result<String, VaultError> {
        fs::read_to_string(self.resolve(path)).map_err(|e| VaultError::from_io(path, e))
    }

    fn write(&self, path: &str, content: &str) -> Result<(), VaultError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| VaultError::from_io(path, e))?;
        }
        atomic_write(&full, content.as_bytes()).map_err(|e| VaultError::from_io(path, e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn create_folder(&self, path: &str) -> Result<(), VaultError> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| VaultError::from_io(path, e))
    }

    fn list_markdown(&self) -> Result<Vec<String>, VaultError> {
        let mut out = Vec::new();
        self.collect_markdown(&self.root, &mut out)?;
        out.sort();
        Ok(out)
    }
}
