//! JSON persistence for settings and playlists.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::item::Item;
use crate::settings::Settings;

/// Loads settings from `path`, falling back to defaults when the file is missing.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file missing; using defaults");
            return Ok(Settings::default());
        }
        Err(source) => {
            return Err(EngineError::ConfigIo {
                context: "failed to read settings",
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let settings: Settings =
        serde_json::from_str(&json).map_err(|source| EngineError::ConfigSerialization {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(settings.normalized())
}

/// Writes `settings` to `path` as pretty-printed JSON, creating parent directories.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EngineError::ConfigIo {
            context: "failed to create settings directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json =
        serde_json::to_string_pretty(settings).map_err(|source| EngineError::ConfigSerialization {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, json).map_err(|source| EngineError::ConfigIo {
        context: "failed to write settings",
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "settings saved");
    Ok(())
}

/// Reads a playlist: a JSON array of items.
pub fn load_playlist(path: &Path) -> Result<Vec<Item>> {
    let json = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
        context: "failed to read playlist",
        path: path.to_path_buf(),
        source,
    })?;
    let items: Vec<Item> =
        serde_json::from_str(&json).map_err(|source| EngineError::ConfigSerialization {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), item_count = items.len(), "playlist loaded");
    Ok(items)
}
