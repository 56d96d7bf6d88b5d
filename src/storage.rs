//! Cached auth session persistence
//!
//! Saves the signed-in session as JSON under the user's config
//! directory so a relaunch restores it. This is the only state that
//! survives the process; conversation history and recordings do not.

use crate::auth::Session;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Get the session cache file path
fn session_cache_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Ascend").join("session.json"))
}

/// Load the cached session from disk
///
/// Returns `None` if no cache exists or it can't be read or parsed.
pub(crate) fn load_session() -> Option<Session> {
    load_session_from(&session_cache_path()?)
}

fn load_session_from(path: &Path) -> Option<Session> {
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                error!("Failed to parse cached session: {}", e);
                None
            }
        },
        Err(e) => {
            error!("Failed to read cached session: {}", e);
            None
        }
    }
}

/// Save the session to the cache file
pub(crate) fn save_session(session: &Session) -> Result<(), StorageError> {
    let path = session_cache_path().ok_or(StorageError::NoConfigDir)?;
    save_session_to(&path, session)
}

fn save_session_to(path: &Path, session: &Session) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json).map_err(|e| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Cached session to: {:?}", path);
    Ok(())
}

/// Remove the cached session, if any
pub(crate) fn clear_session() -> Result<(), StorageError> {
    let path = session_cache_path().ok_or(StorageError::NoConfigDir)?;
    if path.exists() {
        fs::remove_file(&path).map_err(|e| StorageError::WriteFile { path, source: e })?;
    }
    Ok(())
}

/// Storage errors with contextual information
#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
