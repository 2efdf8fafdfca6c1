//! Agent directory: the JSON file that maps agent names to prompt fragments.
//!
//! ```json
//! {
//!   "nike.com": { "brand": "Bold, athletic...", "site": "Inspire..." }
//! }
//! ```
//!
//! The gateway reads the file fresh for every request, so edits take
//! effect without a restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use genweb_core::AgentConfig;

/// An immutable snapshot of the agent directory.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    agents: HashMap<String, AgentConfig>,
}

impl AgentDirectory {
    /// Read and parse the directory at `path`.
    pub async fn load(path: &Path) -> Result<Self, AgentDirectoryError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AgentDirectoryError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Self::from_json(&content).map_err(|e| AgentDirectoryError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse a directory from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let agents: HashMap<String, AgentConfig> = serde_json::from_str(json)?;
        Ok(Self { agents })
    }

    /// Look up an agent by exact name.
    pub fn lookup(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.get(name)
    }

    /// Agent names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Failures reading the agent directory file.
#[derive(Debug, thiserror::Error)]
pub enum AgentDirectoryError {
    #[error("Failed to read agent directory at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse agent directory at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}
