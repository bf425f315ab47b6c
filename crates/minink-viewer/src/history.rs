/*
[INPUT]:  Host list of the last started session
[OUTPUT]: hosts.json under the user data directory
[POS]:    Persistence layer - remembers hosts between runs
[UPDATE]: When changing the history file format or location
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryFile {
    hosts: Vec<String>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Last used host list
#[derive(Debug, Clone)]
pub struct HostHistory {
    path: PathBuf,
}

impl HostHistory {
    /// History at `<data dir>/minink/hosts.json`
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
            .join("minink");
        Ok(Self::at(data_dir.join("hosts.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved hosts; empty when nothing was saved yet
    pub async fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let file: HistoryFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(file.hosts)
    }

    pub async fn save(&self, hosts: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = HistoryFile {
            hosts: hosts.to_vec(),
            updated_at: chrono::Utc::now(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        // Write to a temp file then rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}
