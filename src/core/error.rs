use thiserror::Error;

use crate::core::types::{ActorId, StructureId};

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Structure not found: {0:?}")]
    StructureNotFound(StructureId),

    #[error("Actor not found: {0:?}")]
    ActorNotFound(ActorId),

    #[error("Structure '{0}' already owns a resource store")]
    StorageAlreadyAssigned(String),

    #[error("Invalid store capacity: {0}")]
    InvalidCapacity(f32),

    #[error("Invalid {what} rate: {rate}")]
    InvalidRate { what: &'static str, rate: f32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SettlementError>;
