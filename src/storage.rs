//! Persisted client state.
//!
//! The session (credential + identity) is persisted under one namespaced
//! key so a new process restores where the last one left off, and logout
//! wipes the whole thing. Persistence is a collaborator of the session,
//! not part of it.

use crate::session::Session;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Namespaced key the session is stored under.
const STORE_KEY: &str = "mindwatch-auth";

/// File-backed store for the session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at the given data directory.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{STORE_KEY}.json")),
        }
    }

    /// Default platform location, e.g. `~/.local/share/mindwatch/`.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindwatch")
    }

    #[allow(dead_code)] // Utility accessor
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the persisted session, if any.
    ///
    /// A missing file is `Ok(None)`. An unreadable or corrupt file is
    /// treated the same way after a warning: a stale store must never
    /// block the client from starting fresh.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read session store: {}", e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Discarding corrupt session store: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist the current session.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session store: {}", self.path.display()))?;

        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    /// Wipe the persisted state entirely.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove session store: {}", self.path.display())
            })?;
            debug!("Session store cleared");
        }
        Ok(())
    }
}
