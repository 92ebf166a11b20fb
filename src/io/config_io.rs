use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::config::HotlistConfig;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
}

/// Load the config. A missing file yields the defaults.
pub fn load_config(data_dir: &Path) -> Result<HotlistConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(HotlistConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Read the config as an editable document that round-trips comments and
/// formatting. A missing file yields an empty document.
pub fn read_config_doc(data_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = if path.exists() {
        fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?
    } else {
        String::new()
    };
    Ok(text.parse()?)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config_doc(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let write_err = |source| ConfigError::WriteError {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(data_dir).map_err(write_err)?;
    atomic_write(&path, doc.to_string().as_bytes()).map_err(write_err)
}

/// Set `[hotlist] auto_clear_time`; an empty value disables auto-clear.
pub fn set_auto_clear_time(doc: &mut toml_edit::DocumentMut, value: &str) {
    if !doc.contains_key("hotlist") {
        doc["hotlist"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["hotlist"]["auto_clear_time"] = toml_edit::value(value);
}
