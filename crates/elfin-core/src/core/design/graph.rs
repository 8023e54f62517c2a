use super::DesignError;
use crate::core::alignment::transform::RigidTransform;
use crate::core::models::module::{ModuleKind, Terminus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

const IDENTITY_ROWS: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn identity_rows() -> [[f64; 3]; 3] {
    IDENTITY_ROWS
}

/// A connection leaving one chain of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Linkage {
    pub source_chain_id: String,
    pub target_mod: String,
    pub target_chain_id: String,
}

/// A placed module instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignNode {
    pub module_type: ModuleKind,
    pub module_name: String,
    #[serde(default)]
    pub n_linkage: Vec<Linkage>,
    #[serde(default)]
    pub c_linkage: Vec<Linkage>,
    #[serde(default = "identity_rows")]
    pub rot: [[f64; 3]; 3],
    #[serde(default)]
    pub tran: [f64; 3],
}

impl DesignNode {
    pub fn new(module_type: ModuleKind, module_name: &str) -> Self {
        Self {
            module_type,
            module_name: module_name.to_string(),
            n_linkage: Vec::new(),
            c_linkage: Vec::new(),
            rot: IDENTITY_ROWS,
            tran: [0.0; 3],
        }
    }

    pub fn linkages(&self, term: Terminus) -> &[Linkage] {
        match term {
            Terminus::N => &self.n_linkage,
            Terminus::C => &self.c_linkage,
        }
    }

    pub fn linkages_mut(&mut self, term: Terminus) -> &mut Vec<Linkage> {
        match term {
            Terminus::N => &mut self.n_linkage,
            Terminus::C => &mut self.c_linkage,
        }
    }

    /// Linkages leaving `term` of one chain.
    pub fn chain_linkages<'a>(
        &'a self,
        term: Terminus,
        chain: &'a str,
    ) -> impl Iterator<Item = &'a Linkage> + 'a {
        self.linkages(term)
            .iter()
            .filter(move |l| l.source_chain_id == chain)
    }

    pub fn linkage(&self, term: Terminus, chain: &str) -> Option<&Linkage> {
        self.linkages(term)
            .iter()
            .find(|l| l.source_chain_id == chain)
    }

    /// The accumulated placement of this node.
    pub fn transform(&self) -> RigidTransform {
        RigidTransform::from_rows(&self.rot, &self.tran)
    }

    pub fn set_transform(&mut self, transform: &RigidTransform) {
        self.rot = transform.rotation_rows();
        self.tran = transform.translation_array();
    }

    /// Accumulates `t` on top of the current placement.
    pub fn apply_transform(&mut self, t: &RigidTransform) {
        let combined = self.transform().then(t);
        self.set_transform(&combined);
    }
}

/// One connected design: node name → node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Network {
    nodes: BTreeMap<String, DesignNode>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, node: DesignNode) {
        self.nodes.insert(name.to_string(), node);
    }

    pub fn node(&self, name: &str) -> Option<&DesignNode> {
        self.nodes.get(name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut DesignNode> {
        self.nodes.get_mut(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &DesignNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links `from:from_chain` (C side) to `to:to_chain` (N side) in both directions.
    ///
    /// Returns `false` if either node is missing.
    pub fn link(&mut self, (from, from_chain): (&str, &str), (to, to_chain): (&str, &str)) -> bool {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(from) {
            node.c_linkage.push(Linkage {
                source_chain_id: from_chain.to_string(),
                target_mod: to.to_string(),
                target_chain_id: to_chain.to_string(),
            });
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.n_linkage.push(Linkage {
                source_chain_id: to_chain.to_string(),
                target_mod: from.to_string(),
                target_chain_id: from_chain.to_string(),
            });
        }
        true
    }

    /// Applies `t` on top of every node's placement.
    pub fn transform(&mut self, t: &RigidTransform) {
        for node in self.nodes.values_mut() {
            node.apply_transform(t);
        }
    }
}

/// A design file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignSpec {
    #[serde(default)]
    pub networks: BTreeMap<String, Network>,
    #[serde(default)]
    pub pg_networks: BTreeMap<String, serde_json::Value>,
}

impl DesignSpec {
    pub fn load(path: &Path) -> Result<Self, DesignError> {
        let content = fs::read_to_string(path).map_err(|e| DesignError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| DesignError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DesignError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| DesignError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        fs::write(path, content).map_err(|e| DesignError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Number of path guide networks that still carry content.
    pub fn pending_path_guides(&self) -> usize {
        self.pg_networks
            .values()
            .filter(|value| match value {
                serde_json::Value::Null => false,
                serde_json::Value::Object(map) => !map.is_empty(),
                serde_json::Value::Array(items) => !items.is_empty(),
                _ => true,
            })
            .count()
    }
}

/// Identifies one terminus of one chain of a design node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminusId {
    pub node: String,
    pub chain: String,
    pub term: Terminus,
}

impl TerminusId {
    pub fn new(node: &str, chain: &str, term: Terminus) -> Self {
        Self {
            node: node.to_string(),
            chain: chain.to_string(),
            term,
        }
    }

    /// The other end of the same chain.
    pub fn opposite(&self) -> Self {
        Self {
            node: self.node.clone(),
            chain: self.chain.clone(),
            term: self.term.opposite(),
        }
    }

    pub fn same_chain_as(&self, other: &TerminusId) -> bool {
        self.node == other.node && self.chain == other.chain
    }
}

impl fmt::Display for TerminusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.node, self.chain, self.term)
    }
}
