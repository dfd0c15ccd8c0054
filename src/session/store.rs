//! Session store implementations
//!
//! Provides an in-memory store and a file-based store with atomic writes.

use super::types::Session;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Durable key-value storage for the current session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the current session, if any
    async fn load(&self) -> Result<Option<Session>>;

    /// Overwrite the current session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove the current session
    async fn clear(&self) -> Result<()>;

    /// Current access token, if any
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.load().await?.map(|s| s.access_token))
    }
}

/// Session store kept in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }
}

/// Session store backed by a JSON file
///
/// A missing file means there is no session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes writers so a save never races a clear
    lock: RwLock<()>,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    /// Path to the session file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        let _guard = self.lock.read().await;

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::session(format!(
                    "Failed to read session file {}: {e}",
                    self.path.display()
                )))
            }
        };

        let session = serde_json::from_str(&contents).map_err(|e| {
            Error::session(format!(
                "Failed to parse session file {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let _guard = self.lock.write().await;

        let contents = serde_json::to_string_pretty(session)
            .map_err(|e| Error::session(format!("Failed to serialize session: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::session(format!("Failed to create session directory: {e}"))
                })?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::session(format!("Failed to write session file: {e}")))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::session(format!("Failed to rename session file: {e}")))?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.write().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::session(format!(
                "Failed to remove session file: {e}"
            ))),
        }
    }
}
