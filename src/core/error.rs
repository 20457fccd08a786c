use thiserror::Error;

use crate::core::types::AgentId;
use crate::entity::species::{ColorVariant, Species};

#[derive(Error, Debug)]
pub enum CritterError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Population full: at most {0} agents")]
    PopulationFull(usize),

    #[error("Color {color:?} is not available for {species:?}")]
    InvalidColor { species: Species, color: ColorVariant },

    #[error("Agent size {size} is outside 1..={max}")]
    InvalidSize { size: u32, max: u32 },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Agent update failed: {0}")]
    AgentUpdate(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CritterError>;
