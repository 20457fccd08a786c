//! JSON roster of the current population
//!
//! Only identity survives a restart: name, species, color and size. Positions,
//! states and personalities are sampled fresh when the roster is restored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::entity::agent::Agent;
use crate::entity::species::{ColorVariant, Species};

/// One saved agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub species: Species,
    pub color: ColorVariant,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    64
}

impl From<&Agent> for RosterEntry {
    fn from(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            species: agent.species,
            color: agent.color,
            size: agent.size,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RosterFile {
    agents: Vec<RosterEntry>,
}

/// Roster file on disk
#[derive(Debug, Clone)]
pub struct RosterStore {
    path: PathBuf,
}

impl RosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a roster from JSON text
    pub fn parse(json: &str) -> Result<Vec<RosterEntry>> {
        let file: RosterFile = serde_json::from_str(json)?;
        Ok(file.agents)
    }

    /// Load the roster, failing on a missing or unreadable file
    pub fn try_load(&self) -> Result<Vec<RosterEntry>> {
        let content = std::fs::read_to_string(&self.path)?;
        Self::parse(&content)
    }

    /// Load the roster; a missing or corrupt file is an empty roster
    pub fn load(&self) -> Vec<RosterEntry> {
        match self.try_load() {
            Ok(entries) => {
                tracing::info!(path = %self.path.display(), count = entries.len(), "loaded roster");
                entries
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "no usable roster, starting empty");
                Vec::new()
            }
        }
    }

    /// Write the roster next to its final path, then swap it in
    pub fn save(&self, entries: &[RosterEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = RosterFile {
            agents: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), count = entries.len(), "saved roster");
        Ok(())
    }
}
