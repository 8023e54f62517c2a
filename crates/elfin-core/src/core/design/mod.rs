//! Design graphs: placed module instances joined N-to-C.
//!
//! A design file holds one or more named networks. Each network maps node names to
//! [`graph::DesignNode`]s whose linkages refer to other nodes of the same network.
//! [`validate`] checks a design before any structure is loaded.

pub mod graph;
pub mod validate;

use crate::core::models::module::Terminus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Design has no module networks")]
    NoNetworks,
    #[error("Design has {0} path guide networks; they must be resolved before assembly")]
    PathGuideNetworks(usize),
    #[error("Network '{network}' has no node '{node}'")]
    UnknownNode { network: String, node: String },
    #[error("Node '{node}' links to missing node '{target}'")]
    DanglingLinkage { node: String, target: String },
    #[error("Node '{node}' chain '{chain}' has more than one {term}-linkage")]
    MultipleLinkages {
        node: String,
        chain: String,
        term: Terminus,
    },
    #[error(
        "Linkage {node}:{chain} ({term}) -> {target}:{target_chain} is not reciprocated"
    )]
    Unreciprocated {
        node: String,
        chain: String,
        term: Terminus,
        target: String,
        target_chain: String,
    },
    #[error("Hub '{node}' links directly to hub '{target}'; hub-to-hub junctions are unsupported")]
    HubToHub { node: String, target: String },
}
