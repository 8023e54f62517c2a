use crate::core::alignment::transform::RigidTransform;
use crate::core::models::module::Terminus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of an entry in [`AlignmentDatabase::transforms`](super::xdb::AlignmentDatabase).
pub type TransformId = usize;

/// Neighbour module name → neighbour chain id → transform id.
pub type LinkMap = BTreeMap<String, BTreeMap<String, TransformId>>;

/// Coarse size descriptors of a centred module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Radii {
    /// Mean distance of every atom from the origin.
    pub average_all: f64,
    /// Largest CA distance from the origin.
    pub max_ca_dist: f64,
    /// Largest heavy-atom distance from the origin.
    pub max_heavy_dist: f64,
}

/// Connectivity of one chain of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub n_residues: usize,
    #[serde(default)]
    pub n: LinkMap,
    #[serde(default)]
    pub c: LinkMap,
}

impl ChainEntry {
    pub fn new(n_residues: usize) -> Self {
        Self {
            n_residues,
            ..Self::default()
        }
    }

    pub fn links(&self, term: Terminus) -> &LinkMap {
        match term {
            Terminus::N => &self.n,
            Terminus::C => &self.c,
        }
    }

    pub fn links_mut(&mut self, term: Terminus) -> &mut LinkMap {
        match term {
            Terminus::N => &mut self.n,
            Terminus::C => &mut self.c,
        }
    }

    /// Looks up the transform recorded between this chain's `term` and a neighbour chain.
    pub fn link(&self, term: Terminus, neighbour: &str, neighbour_chain: &str) -> Option<TransformId> {
        self.links(term)
            .get(neighbour)
            .and_then(|chains| chains.get(neighbour_chain))
            .copied()
    }

    pub fn has_links(&self, term: Terminus) -> bool {
        self.links(term).values().any(|chains| !chains.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleEntry {
    pub chains: BTreeMap<String, ChainEntry>,
    pub radii: Radii,
}

/// A hub component: its connectivity plus the hub-table metadata that drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubChainEntry {
    /// The single this component is derived from.
    pub single_name: String,
    pub n_free: bool,
    pub c_free: bool,
    #[serde(flatten)]
    pub links: ChainEntry,
}

impl HubChainEntry {
    pub fn is_free(&self, term: Terminus) -> bool {
        match term {
            Terminus::N => self.n_free,
            Terminus::C => self.c_free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEntry {
    pub oligomer_type: String,
    pub symmetric: bool,
    pub chains: BTreeMap<String, HubChainEntry>,
    pub radii: Radii,
}

/// A recorded junction transform between `mod_a:mod_a_chain` (N side) and
/// `mod_b:mod_b_chain` (C side).
///
/// The rotation is stored row-major and applied as `p' = rot · p + tran`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformEntry {
    pub mod_a: String,
    pub mod_a_chain: String,
    pub mod_b: String,
    pub mod_b_chain: String,
    pub rot: [[f64; 3]; 3],
    pub tran: [f64; 3],
}

impl TransformEntry {
    pub fn new(
        (mod_a, mod_a_chain): (&str, &str),
        (mod_b, mod_b_chain): (&str, &str),
        transform: &RigidTransform,
    ) -> Self {
        Self {
            mod_a: mod_a.to_string(),
            mod_a_chain: mod_a_chain.to_string(),
            mod_b: mod_b.to_string(),
            mod_b_chain: mod_b_chain.to_string(),
            rot: transform.rotation_rows(),
            tran: transform.translation_array(),
        }
    }

    pub fn transform(&self) -> RigidTransform {
        RigidTransform::from_rows(&self.rot, &self.tran)
    }

    /// Length of the translation component, in Angstroms.
    pub fn translation_length(&self) -> f64 {
        self.tran.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}
