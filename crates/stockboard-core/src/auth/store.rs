use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// A single mutable slot holding the session token.
///
/// Writes replace the token wholesale, so concurrent writers resolve as
/// last-write-wins.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, StoreError>;

    fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;

    /// When the current token was written, if the backend tracks it.
    fn stored_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(None)
    }
}

/// In-process token store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<(String, DateTime<Utc>)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some((token.into(), Utc::now()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        Ok(slot.as_ref().map(|(token, _)| token.clone()))
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some((token.to_string(), Utc::now()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }

    fn stored_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        Ok(slot.as_ref().map(|(_, at)| *at))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    token: String,
    stored_at: DateTime<Utc>,
}

/// Token persisted as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<TokenFile>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(file) => Ok(Some(file)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable token file");
                Ok(None)
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.map(|f| f.token))
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&TokenFile {
            token: token.to_string(),
            stored_at: Utc::now(),
        })?;

        // Write then rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn stored_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.read()?.map(|f| f.stored_at))
    }
}
