//! Script store - JSON persistence for recorded scripts
//!
//! One file per script under the platform data directory. This is the thin
//! reference implementation of the storage collaborator; sync, quotas, and
//! grouping UIs live elsewhere.

use std::fs;
use std::path::{Path, PathBuf};

use rand::distr::{Alphanumeric, SampleString};
use tracing::debug;

use crate::core::config::RefillConfig;
use crate::core::error::{RefillError, Result};
use crate::core::types::Script;

const ID_LENGTH: usize = 12;

/// File-backed store of named scripts
pub struct ScriptStore {
    dir: PathBuf,
}

impl ScriptStore {
    /// Open the store at the configured location, creating it if needed
    pub fn open(config: &RefillConfig) -> Result<Self> {
        let dir = match &config.storage.dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("refill")
                .join("scripts"),
        };
        Self::with_dir(dir)
    }

    /// Open a store rooted at an explicit directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .map_err(|e| RefillError::store(format!("Failed to create store dir: {}", e)))?;
        }
        Ok(Self { dir })
    }

    /// Directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a script, assigning an id on first save
    pub fn save(&self, script: &mut Script) -> Result<PathBuf> {
        if script.id.is_empty() {
            script.id = Alphanumeric.sample_string(&mut rand::rng(), ID_LENGTH);
        }
        let path = self.path_for(&script.id);
        let content = serde_json::to_string_pretty(script)?;
        fs::write(&path, content)
            .map_err(|e| RefillError::store(format!("Failed to write script: {}", e)))?;
        debug!(id = %script.id, path = %path.display(), "script saved");
        Ok(path)
    }

    /// Load a script by id
    pub fn load(&self, id: &str) -> Result<Script> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RefillError::ScriptNotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| RefillError::store(format!("Failed to read script: {}", e)))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All stored scripts, sorted by name
    pub fn list(&self) -> Result<Vec<Script>> {
        let mut scripts = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| RefillError::store(format!("Failed to read store dir: {}", e)))?;
        for entry in entries {
            let path = entry
                .map_err(|e| RefillError::store(format!("Failed to read store entry: {}", e)))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(RefillError::from)
                .and_then(|c| Ok(serde_json::from_str::<Script>(&c)?))
            {
                Ok(script) => scripts.push(script),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable script"),
            }
        }
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scripts)
    }

    /// Delete a script by id
    pub fn remove(&self, id: &str) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RefillError::ScriptNotFound(id.to_string()));
        }
        fs::remove_file(&path)
            .map_err(|e| RefillError::store(format!("Failed to delete script: {}", e)))
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}
