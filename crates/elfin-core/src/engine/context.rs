use super::decompose::{ChainStep, TopologyError};
use crate::core::design::graph::{DesignNode, Network, TerminusId};
use crate::core::models::module::{ModuleKind, Terminus};
use crate::core::models::residue::DetachedResidue;

/// One chain of one design node, resolved against its network.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub name: &'a str,
    pub node: &'a DesignNode,
    pub chain: &'a str,
}

impl<'a> NodeRef<'a> {
    pub fn resolve(network: &'a Network, step: &'a ChainStep) -> Result<Self, TopologyError> {
        let node = network
            .node(&step.node)
            .ok_or_else(|| TopologyError::UnknownNode {
                node: step.node.clone(),
                target: step.node.clone(),
            })?;
        Ok(Self {
            name: &step.node,
            node,
            chain: &step.chain,
        })
    }

    pub fn kind(&self) -> ModuleKind {
        self.node.module_type
    }

    pub fn module(&self) -> &'a str {
        &self.node.module_name
    }

    pub fn terminus(&self, term: Terminus) -> TerminusId {
        TerminusId::new(self.name, self.chain, term)
    }
}

/// Working state for one node while its junctions are fused.
///
/// `main` holds the node's own residues in module coordinates; caps add `prefix` and
/// `suffix` residues around it.
#[derive(Debug, Clone)]
pub struct JunctionContext<'a> {
    pub current: NodeRef<'a>,
    pub previous: Option<NodeRef<'a>>,
    pub next: Option<NodeRef<'a>>,
    pub prefix: Vec<DetachedResidue>,
    pub main: Vec<DetachedResidue>,
    pub suffix: Vec<DetachedResidue>,
}

impl<'a> JunctionContext<'a> {
    pub fn new(
        current: NodeRef<'a>,
        previous: Option<NodeRef<'a>>,
        next: Option<NodeRef<'a>>,
        main: Vec<DetachedResidue>,
    ) -> Self {
        Self {
            current,
            previous,
            next,
            prefix: Vec::new(),
            main,
            suffix: Vec::new(),
        }
    }

    /// The node joined at `term`, if any.
    pub fn neighbour(&self, term: Terminus) -> Option<NodeRef<'a>> {
        match term {
            Terminus::N => self.previous,
            Terminus::C => self.next,
        }
    }

    /// Residues of the node after fusion, N to C.
    pub fn into_residues(self) -> Vec<DetachedResidue> {
        let mut residues = self.prefix;
        residues.extend(self.main);
        residues.extend(self.suffix);
        residues
    }
}
