use super::error::EngineError;
use crate::core::alignment::transform::RigidTransform;
use crate::core::database::xdb::AlignmentDatabase;
use crate::core::design::DesignError;
use crate::core::design::graph::Network;
use crate::core::models::module::{ModuleKind, Terminus};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// A module chain taking part in a junction.
#[derive(Debug, Clone, Copy)]
pub struct JunctionEnd<'a> {
    pub kind: ModuleKind,
    pub module: &'a str,
    pub chain: &'a str,
}

/// The only chain of a single and its residue count.
pub fn single_chain<'a>(
    db: &'a AlignmentDatabase,
    name: &str,
) -> Result<(&'a str, usize), EngineError> {
    let single = db.single(name)?;
    single
        .chains
        .iter()
        .next()
        .map(|(chain, entry)| (chain.as_str(), entry.n_residues))
        .ok_or_else(|| EngineError::InvalidModule {
            name: name.to_string(),
            reason: "single has no chains".into(),
        })
}

/// The rigid transform taking the frame of `a` (N side) into the frame of `b` (C side).
pub fn junction_transform(
    db: &AlignmentDatabase,
    a: JunctionEnd<'_>,
    b: JunctionEnd<'_>,
) -> Result<RigidTransform, EngineError> {
    match (a.kind, b.kind) {
        (ModuleKind::Single, ModuleKind::Single) => Ok(db
            .require_link(a.kind, a.module, a.chain, Terminus::C, b.module, b.chain)?
            .transform()),
        (ModuleKind::Hub, ModuleKind::Single) => {
            let hub_tx = db
                .require_link(a.kind, a.module, a.chain, Terminus::C, b.module, b.chain)?
                .transform();
            let component = db.effective_single_name(a.kind, a.module, a.chain)?;
            let (component_chain, _) = single_chain(db, component)?;
            let tx = db
                .require_link(
                    ModuleKind::Single,
                    component,
                    component_chain,
                    Terminus::C,
                    b.module,
                    b.chain,
                )?
                .transform();
            Ok(hub_tx.then(&tx))
        }
        (ModuleKind::Single, ModuleKind::Hub) => Ok(db
            .require_link(a.kind, a.module, a.chain, Terminus::C, b.module, b.chain)?
            .transform()
            .inverse()),
        (ModuleKind::Hub, ModuleKind::Hub) => Err(DesignError::HubToHub {
            node: a.module.to_string(),
            target: b.module.to_string(),
        }
        .into()),
    }
}

/// Recomputes every node's placement from the junction transforms, starting at `root`.
///
/// `root` keeps the identity placement. Nodes not connected to `root` keep their
/// placement and are reported with a warning. Returns the number of placed nodes.
pub fn place_network(
    network_name: &str,
    network: &mut Network,
    db: &AlignmentDatabase,
    root: &str,
) -> Result<usize, EngineError> {
    if network.node(root).is_none() {
        return Err(DesignError::UnknownNode {
            network: network_name.to_string(),
            node: root.to_string(),
        }
        .into());
    }

    let mut placed: HashMap<String, RigidTransform> = HashMap::new();
    placed.insert(root.to_string(), RigidTransform::identity());
    let mut queue = VecDeque::from([root.to_string()]);

    while let Some(name) = queue.pop_front() {
        let Some(node) = network.node(&name) else {
            continue;
        };
        let here = placed[&name];
        for term in [Terminus::N, Terminus::C] {
            for linkage in node.linkages(term) {
                if placed.contains_key(&linkage.target_mod) {
                    continue;
                }
                let target = network.node(&linkage.target_mod).ok_or_else(|| {
                    DesignError::DanglingLinkage {
                        node: name.clone(),
                        target: linkage.target_mod.clone(),
                    }
                })?;
                let this_end = JunctionEnd {
                    kind: node.module_type,
                    module: &node.module_name,
                    chain: &linkage.source_chain_id,
                };
                let other_end = JunctionEnd {
                    kind: target.module_type,
                    module: &target.module_name,
                    chain: &linkage.target_chain_id,
                };
                let neighbour = match term {
                    Terminus::C => junction_transform(db, this_end, other_end)?
                        .inverse()
                        .then(&here),
                    Terminus::N => junction_transform(db, other_end, this_end)?.then(&here),
                };
                debug!(from = %name, to = %linkage.target_mod, "Placed node.");
                placed.insert(linkage.target_mod.clone(), neighbour);
                queue.push_back(linkage.target_mod.clone());
            }
        }
    }

    let names: Vec<String> = network.nodes().map(|(name, _)| name.to_string()).collect();
    for name in names {
        match (placed.get(&name), network.node_mut(&name)) {
            (Some(transform), Some(node)) => node.set_transform(transform),
            _ => warn!(node = %name, root, "Node is not connected to the placement root."),
        }
    }
    Ok(placed.len())
}
