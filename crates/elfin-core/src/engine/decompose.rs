use crate::core::database::xdb::{AlignmentDatabase, ModuleRef};
use crate::core::design::graph::{DesignNode, Network, TerminusId};
use crate::core::models::module::{ModuleKind, Terminus};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Network has no free terminus to start from (is it cyclic?)")]
    NoLeaf,
    #[error("Terminus {0} was reached twice")]
    UnexpectedRevisit(TerminusId),
    #[error("Terminus {0} cannot be reached from any free terminus")]
    Unreached(TerminusId),
    #[error("Node '{node}' references module '{module}' which is not in the database")]
    UnknownModule { node: String, module: String },
    #[error("Node '{node}' has no chain '{chain}'")]
    UnknownChain { node: String, chain: String },
    #[error("Linkage from '{node}' targets missing node '{target}'")]
    UnknownNode { node: String, target: String },
    #[error("Terminus {0} carries more than one linkage")]
    MultipleLinkages(TerminusId),
}

/// One chain of one node along a decomposed chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainStep {
    pub node: String,
    pub chain: String,
}

impl ChainStep {
    fn of(terminus: &TerminusId) -> Self {
        Self {
            node: terminus.node.clone(),
            chain: terminus.chain.clone(),
        }
    }
}

impl fmt::Display for ChainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.chain)
    }
}

/// A maximal path through the network, oriented N to C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainIdentifier {
    /// The N terminus the chain starts at.
    pub src: TerminusId,
    /// The C terminus the chain ends at.
    pub dst: TerminusId,
    pub nodes: Vec<ChainStep>,
}

impl fmt::Display for ChainIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub chains: Vec<ChainIdentifier>,
    /// Unconnected hub components left out of the output.
    pub skipped: Vec<ChainStep>,
}

fn module_of<'a>(
    db: &'a AlignmentDatabase,
    name: &str,
    node: &DesignNode,
) -> Result<ModuleRef<'a>, TopologyError> {
    db.module(node.module_type, &node.module_name)
        .map_err(|_| TopologyError::UnknownModule {
            node: name.to_string(),
            module: node.module_name.clone(),
        })
}

fn node_of<'n>(network: &'n Network, from: &str, name: &str) -> Result<&'n DesignNode, TopologyError> {
    network.node(name).ok_or_else(|| TopologyError::UnknownNode {
        node: from.to_string(),
        target: name.to_string(),
    })
}

fn is_dormant(module: &ModuleRef<'_>, chain: &str, term: Terminus) -> bool {
    match module {
        ModuleRef::Hub(hub) => hub.chains.get(chain).is_some_and(|c| !c.is_free(term)),
        ModuleRef::Single(_) => false,
    }
}

fn is_unconnected(node: &DesignNode, chain: &str) -> bool {
    node.linkage(Terminus::N, chain).is_none() && node.linkage(Terminus::C, chain).is_none()
}

/// The partner terminus reached by following the linkage that leaves `from`, if any.
fn follow(network: &Network, from: &TerminusId) -> Result<Option<TerminusId>, TopologyError> {
    let node = node_of(network, &from.node, &from.node)?;
    let mut linkages = node.chain_linkages(from.term, &from.chain);
    let Some(linkage) = linkages.next() else {
        return Ok(None);
    };
    if linkages.next().is_some() {
        return Err(TopologyError::MultipleLinkages(from.clone()));
    }
    node_of(network, &from.node, &linkage.target_mod)?;
    Ok(Some(TerminusId::new(
        &linkage.target_mod,
        &linkage.target_chain_id,
        from.term.opposite(),
    )))
}

struct Walker<'a> {
    network: &'a Network,
    termini: BTreeSet<TerminusId>,
    hub_termini: Vec<(String, Vec<TerminusId>)>,
    visited: HashSet<TerminusId>,
    seen_hubs: HashSet<String>,
    queue: VecDeque<TerminusId>,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, terminus: &TerminusId) -> Result<(), TopologyError> {
        if !self.termini.contains(terminus) {
            return Err(TopologyError::UnknownChain {
                node: terminus.node.clone(),
                chain: terminus.chain.clone(),
            });
        }
        if !self.visited.insert(terminus.clone()) {
            return Err(TopologyError::UnexpectedRevisit(terminus.clone()));
        }
        Ok(())
    }

    /// On the first visit of a hub, queue its other termini as chain sources.
    fn enter(&mut self, node: &str) {
        if !self.seen_hubs.insert(node.to_string()) {
            return;
        }
        if let Some((_, termini)) = self.hub_termini.iter().find(|(name, _)| name == node) {
            for terminus in termini {
                if !self.visited.contains(terminus) {
                    self.queue.push_back(terminus.clone());
                }
            }
        }
    }

    fn walk(&mut self, src: TerminusId) -> Result<ChainIdentifier, TopologyError> {
        self.visit(&src)?;
        self.enter(&src.node);
        let mut nodes = vec![ChainStep::of(&src)];
        let mut current = src.clone();

        loop {
            let exit = current.opposite();
            self.visit(&exit)?;
            match follow(self.network, &exit)? {
                None => {
                    let (src, dst, nodes) = match src.term {
                        Terminus::N => (src, exit, nodes),
                        Terminus::C => (exit, src, nodes.into_iter().rev().collect()),
                    };
                    return Ok(ChainIdentifier { src, dst, nodes });
                }
                Some(next) => {
                    self.visit(&next)?;
                    self.enter(&next.node);
                    nodes.push(ChainStep::of(&next));
                    current = next;
                }
            }
        }
    }
}

/// Splits a validated network into maximal N-to-C chains.
///
/// Every chain slot of every node is covered exactly once, except hub components that are
/// dormant at both termini and, with `skip_unused`, unconnected components of linked hubs.
///
/// # Errors
///
/// Returns a [`TopologyError`] when modules or chains are unknown, when the network has a
/// cycle, or when linkages are ambiguous.
pub fn decompose(
    network: &Network,
    db: &AlignmentDatabase,
    skip_unused: bool,
) -> Result<Decomposition, TopologyError> {
    let mut termini = BTreeSet::new();
    let mut hub_termini = Vec::new();
    let mut unused = Vec::new();

    for (name, node) in network.nodes() {
        let module = module_of(db, name, node)?;
        for term in [Terminus::N, Terminus::C] {
            for linkage in node.linkages(term) {
                if module.chain(&linkage.source_chain_id).is_none() {
                    return Err(TopologyError::UnknownChain {
                        node: name.to_string(),
                        chain: linkage.source_chain_id.clone(),
                    });
                }
            }
        }

        let linked = !node.n_linkage.is_empty() || !node.c_linkage.is_empty();
        let mut own = Vec::new();
        for chain in module.chain_ids() {
            if is_dormant(&module, chain, Terminus::N) && is_dormant(&module, chain, Terminus::C) {
                continue;
            }
            if node.module_type == ModuleKind::Hub && linked && is_unconnected(node, chain) {
                unused.push(ChainStep {
                    node: name.to_string(),
                    chain: chain.to_string(),
                });
                continue;
            }
            for term in [Terminus::N, Terminus::C] {
                let terminus = TerminusId::new(name, chain, term);
                termini.insert(terminus.clone());
                own.push(terminus);
            }
        }
        if node.module_type == ModuleKind::Hub {
            hub_termini.push((name.to_string(), own));
        }
    }

    let mut leaves = Vec::new();
    for terminus in &termini {
        if follow(network, terminus)?.is_none() {
            leaves.push(terminus.clone());
        }
    }
    if leaves.is_empty() && !termini.is_empty() {
        return Err(TopologyError::NoLeaf);
    }

    let mut walker = Walker {
        network,
        termini,
        hub_termini,
        visited: HashSet::new(),
        seen_hubs: HashSet::new(),
        queue: leaves.into(),
    };

    let mut decomposition = Decomposition::default();
    while let Some(src) = walker.queue.pop_front() {
        if walker.visited.contains(&src) {
            continue;
        }
        let chain = walker.walk(src)?;
        debug!(chain = %chain, nodes = chain.nodes.len(), "Decomposed chain.");
        decomposition.chains.push(chain);
    }

    if let Some(missed) = walker
        .termini
        .iter()
        .find(|terminus| !walker.visited.contains(*terminus))
    {
        return Err(TopologyError::Unreached(missed.clone()));
    }

    for step in unused {
        if skip_unused {
            warn!(component = %step, "Skipping unused hub component.");
            decomposition.skipped.push(step);
        } else {
            decomposition.chains.push(ChainIdentifier {
                src: TerminusId::new(&step.node, &step.chain, Terminus::N),
                dst: TerminusId::new(&step.node, &step.chain, Terminus::C),
                nodes: vec![step],
            });
        }
    }

    Ok(decomposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::entries::{ChainEntry, HubChainEntry, HubEntry, Radii, SingleEntry};
    use crate::core::design::graph::Linkage;
    use std::collections::BTreeMap;

    fn database() -> AlignmentDatabase {
        let mut db = AlignmentDatabase::new();
        for name in ["D1", "D2", "D3"] {
            let mut single = SingleEntry::default();
            single.chains.insert("A".into(), ChainEntry::new(40));
            db.modules.singles.insert(name.into(), single);
        }
        let mut hub = HubEntry {
            oligomer_type: "C3".into(),
            symmetric: false,
            chains: BTreeMap::new(),
            radii: Radii::default(),
        };
        for (chain, n_free, c_free) in [
            ("A", true, true),
            ("B", false, true),
            ("C", false, false),
            ("D", true, false),
        ] {
            hub.chains.insert(
                chain.into(),
                HubChainEntry {
                    single_name: "D1".into(),
                    n_free,
                    c_free,
                    links: ChainEntry::new(40),
                },
            );
        }
        db.modules.hubs.insert("H".into(), hub);
        db
    }

    fn network(nodes: &[(&str, ModuleKind, &str)], links: &[(&str, &str, &str, &str)]) -> Network {
        let mut network = Network::new();
        for (name, kind, module) in nodes {
            network.insert(name, DesignNode::new(*kind, module));
        }
        for (from, from_chain, to, to_chain) in links {
            assert!(network.link((from, from_chain), (to, to_chain)));
        }
        network
    }

    fn path(chain: &ChainIdentifier) -> Vec<String> {
        chain.nodes.iter().map(ToString::to_string).collect()
    }

    /// Each covered chain slot appears in exactly one chain.
    fn assert_partition(decomposition: &Decomposition, expected: &[&str]) {
        let mut seen: Vec<String> = decomposition.chains.iter().flat_map(path).collect();
        seen.sort();
        let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn lone_single_is_one_degenerate_chain() {
        let net = network(&[("x", ModuleKind::Single, "D1")], &[]);
        let result = decompose(&net, &database(), false).unwrap();
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert_eq!(chain.src, TerminusId::new("x", "A", Terminus::N));
        assert_eq!(chain.dst, TerminusId::new("x", "A", Terminus::C));
        assert_eq!(path(chain), vec!["x:A"]);
    }

    #[test]
    fn linear_singles_form_one_chain_in_order() {
        let net = network(
            &[
                ("d2", ModuleKind::Single, "D2"),
                ("d1", ModuleKind::Single, "D1"),
                ("d3", ModuleKind::Single, "D3"),
            ],
            &[("d1", "A", "d2", "A"), ("d2", "A", "d3", "A")],
        );
        let result = decompose(&net, &database(), false).unwrap();
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert_eq!(chain.src, TerminusId::new("d1", "A", Terminus::N));
        assert_eq!(chain.dst, TerminusId::new("d3", "A", Terminus::C));
        assert_eq!(path(chain), vec!["d1:A", "d2:A", "d3:A"]);
    }

    #[test]
    fn two_separate_chains_are_both_emitted() {
        let net = network(
            &[
                ("a", ModuleKind::Single, "D1"),
                ("b", ModuleKind::Single, "D2"),
                ("c", ModuleKind::Single, "D3"),
            ],
            &[("b", "A", "a", "A")],
        );
        let result = decompose(&net, &database(), false).unwrap();
        assert_eq!(result.chains.len(), 2);
        assert_eq!(path(&result.chains[0]), vec!["b:A", "a:A"]);
        assert_eq!(path(&result.chains[1]), vec!["c:A"]);
        assert_partition(&result, &["a:A", "b:A", "c:A"]);
    }

    #[test]
    fn hub_fans_out_into_one_chain_per_arm() {
        let net = network(
            &[
                ("hub", ModuleKind::Hub, "H"),
                ("s1", ModuleKind::Single, "D1"),
                ("s2", ModuleKind::Single, "D2"),
                ("s3", ModuleKind::Single, "D3"),
            ],
            &[
                ("s1", "A", "hub", "A"),
                ("hub", "A", "s2", "A"),
                ("hub", "B", "s3", "A"),
            ],
        );
        let result = decompose(&net, &database(), false).unwrap();
        assert!(result.skipped.is_empty());

        let mut paths: Vec<Vec<String>> = result.chains.iter().map(path).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                vec!["hub:B".to_string(), "s3:A".to_string()],
                vec!["hub:D".to_string()],
                vec!["s1:A".to_string(), "hub:A".to_string(), "s2:A".to_string()],
            ]
        );
        for chain in &result.chains {
            assert_eq!(chain.src.term, Terminus::N);
            assert_eq!(chain.dst.term, Terminus::C);
            assert!(chain.nodes.iter().all(|step| step.chain != "C"));
        }
    }

    #[test]
    fn skip_unused_drops_unconnected_hub_components() {
        let net = network(
            &[("hub", ModuleKind::Hub, "H"), ("s", ModuleKind::Single, "D2")],
            &[("hub", "B", "s", "A")],
        );
        let result = decompose(&net, &database(), true).unwrap();
        assert_eq!(result.chains.len(), 1);
        assert_eq!(path(&result.chains[0]), vec!["hub:B", "s:A"]);
        assert_eq!(
            result.skipped,
            vec![
                ChainStep {
                    node: "hub".into(),
                    chain: "A".into()
                },
                ChainStep {
                    node: "hub".into(),
                    chain: "D".into()
                },
            ]
        );

        let kept = decompose(&net, &database(), false).unwrap();
        assert!(kept.skipped.is_empty());
        assert_partition(&kept, &["hub:A", "hub:B", "hub:D", "s:A"]);
    }

    #[test]
    fn hub_with_one_free_component_yields_one_chain() {
        let mut db = database();
        if let Some(hub) = db.modules.hubs.get_mut("H") {
            hub.chains.retain(|chain, _| chain == "B" || chain == "C");
        }
        let net = network(
            &[("hub", ModuleKind::Hub, "H"), ("s", ModuleKind::Single, "D2")],
            &[("hub", "B", "s", "A")],
        );
        let result = decompose(&net, &db, false).unwrap();
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert_eq!(chain.src, TerminusId::new("hub", "B", Terminus::N));
        assert_eq!(chain.dst, TerminusId::new("s", "A", Terminus::C));
    }

    #[test]
    fn cycle_without_entry_is_rejected() {
        let net = network(
            &[
                ("a", ModuleKind::Single, "D1"),
                ("b", ModuleKind::Single, "D2"),
            ],
            &[("a", "A", "b", "A"), ("b", "A", "a", "A")],
        );
        assert_eq!(decompose(&net, &database(), false), Err(TopologyError::NoLeaf));
    }

    #[test]
    fn cycle_beside_a_chain_is_unreached() {
        let net = network(
            &[
                ("a", ModuleKind::Single, "D1"),
                ("b", ModuleKind::Single, "D2"),
                ("c", ModuleKind::Single, "D3"),
            ],
            &[("a", "A", "b", "A"), ("b", "A", "a", "A")],
        );
        assert!(matches!(
            decompose(&net, &database(), false),
            Err(TopologyError::Unreached(_))
        ));
    }

    #[test]
    fn unknown_modules_and_chains_are_reported() {
        let net = network(&[("x", ModuleKind::Single, "D99")], &[]);
        assert!(matches!(
            decompose(&net, &database(), false),
            Err(TopologyError::UnknownModule { module, .. }) if module == "D99"
        ));

        let mut net = network(
            &[("x", ModuleKind::Single, "D1"), ("y", ModuleKind::Single, "D2")],
            &[],
        );
        assert!(net.link(("x", "B"), ("y", "A")));
        assert!(matches!(
            decompose(&net, &database(), false),
            Err(TopologyError::UnknownChain { chain, .. }) if chain == "B"
        ));
    }

    #[test]
    fn duplicate_linkages_are_rejected() {
        let mut net = network(
            &[
                ("x", ModuleKind::Single, "D1"),
                ("y", ModuleKind::Single, "D2"),
                ("z", ModuleKind::Single, "D3"),
            ],
            &[("x", "A", "y", "A")],
        );
        if let Some(node) = net.node_mut("x") {
            node.c_linkage.push(Linkage {
                source_chain_id: "A".into(),
                target_mod: "z".into(),
                target_chain_id: "A".into(),
            });
        }
        assert!(matches!(
            decompose(&net, &database(), false),
            Err(TopologyError::MultipleLinkages(_)) | Err(TopologyError::Unreached(_))
        ));
    }
}
