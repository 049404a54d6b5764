//! Session Store
//!
//! Locally persisted session bookkeeping: the list of session names and the
//! currently selected one. Plain JSON key/value file, no schema versioning.
//! Mutations are written through to disk immediately.

use crate::error::{ChatError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One tracked session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Session name, also the server-side transcript key
    pub name: String,

    /// When the session was created locally
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    sessions: Vec<SessionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<String>,
}

/// Locally persisted list of sessions plus the current selection
pub struct SessionStore {
    path: PathBuf,
    inner: RwLock<StoreData>,
}

impl SessionStore {
    /// Default store location under the user config directory
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChatError::Store("no user config directory".to_string()))?;
        Ok(config_dir.join("yapper").join("sessions.json"))
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open a store file; a missing file is an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| ChatError::Store(format!("corrupt session store: {}", e)))?
        } else {
            StoreData::default()
        };

        Ok(Self {
            path,
            inner: RwLock::new(data),
        })
    }

    /// Session names, in creation order
    pub fn names(&self) -> Vec<String> {
        self.inner.read().sessions.iter().map(|s| s.name.clone()).collect()
    }

    /// All session entries
    pub fn entries(&self) -> Vec<SessionEntry> {
        self.inner.read().sessions.clone()
    }

    /// The currently selected session name, if any
    pub fn selected(&self) -> Option<String> {
        self.inner.read().selected.clone()
    }

    /// Create a new session and select it
    pub fn create(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::Store("session name is empty".to_string()));
        }

        {
            let mut data = self.inner.write();
            if data.sessions.iter().any(|s| s.name == name) {
                return Err(ChatError::Store(format!("session '{}' already exists", name)));
            }
            data.sessions.push(SessionEntry {
                name: name.to_string(),
                created_at: Utc::now(),
            });
            data.selected = Some(name.to_string());
        }

        self.persist()
    }

    /// Select an existing session
    pub fn select(&self, name: &str) -> Result<()> {
        {
            let mut data = self.inner.write();
            if !data.sessions.iter().any(|s| s.name == name) {
                return Err(ChatError::Store(format!("unknown session '{}'", name)));
            }
            data.selected = Some(name.to_string());
        }

        self.persist()
    }

    /// Remove a session; removing the selected one clears the selection
    pub fn remove(&self, name: &str) -> Result<()> {
        {
            let mut data = self.inner.write();
            let before = data.sessions.len();
            data.sessions.retain(|s| s.name != name);
            if data.sessions.len() == before {
                return Err(ChatError::Store(format!("unknown session '{}'", name)));
            }
            if data.selected.as_deref() == Some(name) {
                data.selected = None;
            }
        }

        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.inner.read())
            .map_err(|e| ChatError::Store(format!("serialize session store: {}", e)))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
