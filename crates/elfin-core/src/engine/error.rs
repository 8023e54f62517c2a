use thiserror::Error;

use super::config::ConfigError;
use super::decompose::TopologyError;
use crate::core::alignment::superposition::SuperpositionError;
use crate::core::database::xdb::DatabaseError;
use crate::core::design::DesignError;
use crate::core::io::format::StructureFileError;
use crate::core::metadata::MetadataError;
use crate::core::models::module::Terminus;
use crate::core::models::structure::StructureError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error(transparent)]
    StructureFile(#[from] StructureFileError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("Superposition failed: {0}")]
    Superposition(#[from] SuperpositionError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Invalid design: {0}")]
    Design(#[from] DesignError),

    #[error("Invalid design topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("Module '{name}' is invalid: {reason}")]
    InvalidModule { name: String, reason: String },

    #[error("Module '{0}' is not part of the library")]
    MissingModule(String),

    #[error("Missing {kind} reference structure '{path}'")]
    MissingReference { kind: &'static str, path: String },

    #[error(
        "Reference for {module} ({side} side) has {available} residues, {needed} are needed"
    )]
    InsufficientReference {
        module: String,
        side: Terminus,
        needed: usize,
        available: usize,
    },

    #[error("Cap '{cap}' overlaps module '{module}' by only {matched} residues")]
    CapAlignmentTooShort {
        cap: String,
        module: String,
        matched: usize,
    },

    #[error("Capping hub termini is not supported ({node}:{chain}, {term} terminus)")]
    UnsupportedHubCapping {
        node: String,
        chain: String,
        term: Terminus,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }
}
