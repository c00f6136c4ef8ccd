//! On-disk state for a managed API key.
//!
//! Stored as a JSON object:
//! ```json
//! {
//!   "id": "VuaCfGcBCdbkQm-e5aOx",
//!   "api_key": "ui2lp2axTNmsyakw9tvNnw",
//!   "encoded": "VnVhQ2ZHY0JDZGJrUW0tZTVhT3g6dWkybHAyYXhUTm1zeWFrdzl0dk5udw==",
//!   "name": "my-key",
//!   "role_descriptors": []
//! }
//! ```
//! The file holds a live credential; it is written with owner-only
//! permissions on Unix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::ApiKeyState;

pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored state. A missing file means nothing is managed yet.
    pub fn load(&self) -> Result<Option<ApiKeyState>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", e)),
        };
        let state = serde_json::from_str(&content).map_err(|e| {
            Error::input(format!("corrupt state file '{}': {e}", self.path.display()))
        })?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &ApiKeyState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| Error::input(format!("cannot encode state: {e}")))?;
        std::fs::write(&self.path, content).map_err(|e| self.io_error("write", e))?;
        restrict_permissions(&self.path).map_err(|e| self.io_error("chmod", e))?;
        debug!(path = %self.path.display(), id = %state.id, "State saved");
        Ok(())
    }

    /// Deletes the state file; a file that is already gone is fine.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }

    fn io_error(&self, op: &str, e: std::io::Error) -> Error {
        Error::input(format!("cannot {op} state file '{}': {e}", self.path.display()))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
