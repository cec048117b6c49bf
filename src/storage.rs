use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{CareError, Result};
use crate::models::CareState;

const DB_FILE: &str = "banana-care.json";

/// Returns the path to the care document (`banana-care.json`).
///
/// The path is determined in the following order:
/// 1. `BANANA_CARE_DB` environment variable.
/// 2. `~/.local/share/bananacare/banana-care.json` (on Linux).
/// 3. `./banana-care.json` (fallback).
pub fn db_path() -> PathBuf {
    std::env::var("BANANA_CARE_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| match dirs::data_local_dir() {
            Some(mut p) => {
                p.push("bananacare");
                p.push(DB_FILE);
                p
            }
            None => PathBuf::from(DB_FILE),
        })
}

/// Loads the care document for display.
///
/// A missing, unreadable or corrupt file yields the default document.
pub fn load_state(path: &Path) -> CareState {
    try_load_state(path).unwrap_or_else(|e| {
        tracing::warn!(%e, "using default care data");
        CareState::default()
    })
}

/// Loads the care document, failing if an existing file cannot be read or parsed.
///
/// A missing file yields the default document.
pub fn try_load_state(path: &Path) -> Result<CareState> {
    let mut f = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CareState::default()),
        Err(e) => return Err(CareError::io(path, e)),
    };
    let mut s = String::new();
    f.read_to_string(&mut s).map_err(|e| CareError::io(path, e))?;
    serde_json::from_str(&s).map_err(|source| CareError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves the whole document, overwriting the existing file.
pub fn save_state(path: &Path, state: &CareState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CareError::io(parent, e))?;
        }
    }
    let s = serde_json::to_string_pretty(state)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| CareError::io(path, e))?;
    f.write_all(s.as_bytes()).map_err(|e| CareError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = s.len(), "care data saved");
    Ok(())
}

/// Loads the document, applies `change`, and saves it back.
///
/// Nothing is written when the existing file cannot be loaded.
pub fn update_state<T>(path: &Path, change: impl FnOnce(&mut CareState) -> Result<T>) -> Result<T> {
    let mut state = try_load_state(path)?;
    let out = change(&mut state)?;
    save_state(path, &state)?;
    Ok(out)
}

/// Deletes the care document.
pub fn delete_state(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CareError::io(path, e)),
    }
}
