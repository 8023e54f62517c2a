//! Metadata tables that accompany a module library.
//!
//! - [`hub_info`] - per-hub component table (source single, free termini)
//! - [`repeat_index`] - boundary residue numbers shared by capping modules and their singles

pub mod hub_info;
pub mod repeat_index;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Malformed record {record} in '{path}': {reason}")]
    Malformed {
        path: String,
        record: usize,
        reason: String,
    },
    #[error("No hub metadata for '{0}'")]
    MissingHubMetadata(String),
    #[error("No capping repeat indices for '{0}'")]
    MissingCapIndex(String),
}
