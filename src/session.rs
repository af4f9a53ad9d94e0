//! Process-wide session storage.
//!
//! ARCHITECTURE
//! ============
//! The auth form hands the token + user to a `SessionStore` after a
//! successful login and never reads it back. Stores are shared through
//! `Arc<dyn SessionStore>`, so implementations synchronize internally.
//!
//! Two stores ship: `MemorySessionStore` for the lifetime of the process and
//! `FileSessionStore`, a JSON file that is loaded on start-up and removed on
//! logout.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::net::types::{LoginResponse, User};

/// Credential kept after login.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub user: User,
}

impl From<LoginResponse> for SessionToken {
    fn from(resp: LoginResponse) -> Self {
        Self { access_token: resp.access_token, user: resp.user }
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"***")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait SessionStore: Send + Sync {
    /// Persist the session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, session: &SessionToken) -> Result<(), SessionError>;

    /// Current session, if one was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<SessionToken>, SessionError>;

    /// Forget the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be cleared.
    fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<SessionToken>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SessionToken>> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &SessionToken) -> Result<(), SessionError> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionToken>, SessionError> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON file store. Reads are served from an in-memory copy populated by
/// [`FileSessionStore::open`]; writes go through to disk first.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    cached: Mutex<Option<SessionToken>>,
}

impl FileSessionStore {
    /// Open the store at `path`, loading an existing session if present.
    ///
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let cached = read_session_file(&path)?;
        if cached.is_some() {
            tracing::debug!(path = %path.display(), "loaded stored session");
        }
        Ok(Self { path, cached: Mutex::new(cached) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SessionToken>> {
        self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io { path: self.path.clone(), source }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &SessionToken) -> Result<(), SessionError> {
        let mut slot = self.slot();
        let raw = serde_json::to_string_pretty(session)
            .map_err(|source| SessionError::Corrupt { path: self.path.clone(), source })?;

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        *slot = Some(session.clone());
        tracing::info!(path = %self.path.display(), user_id = session.user.id, "session saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionToken>, SessionError> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.slot();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }
        *slot = None;
        tracing::info!(path = %self.path.display(), "session cleared");
        Ok(())
    }
}

fn read_session_file(path: &Path) -> Result<Option<SessionToken>, SessionError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(SessionError::Io { path: path.to_path_buf(), source }),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| SessionError::Corrupt { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
