use super::DesignError;
use super::graph::{DesignSpec, Network};
use crate::core::models::module::{ModuleKind, Terminus};
use std::collections::HashMap;

/// Checks a whole design file.
///
/// # Errors
///
/// Fails when the design has no networks, carries unresolved path guide networks, or any
/// network fails [`validate_network`].
pub fn validate_design(spec: &DesignSpec) -> Result<(), DesignError> {
    if spec.networks.is_empty() {
        return Err(DesignError::NoNetworks);
    }
    let path_guides = spec.pending_path_guides();
    if path_guides > 0 {
        return Err(DesignError::PathGuideNetworks(path_guides));
    }
    for network in spec.networks.values() {
        validate_network(network)?;
    }
    Ok(())
}

/// Checks the linkage structure of one network.
///
/// Every linkage must target an existing node, each `(node, chain, terminus)` may carry at
/// most one linkage, every linkage must be mirrored by the target, and two hubs may not
/// be joined directly.
pub fn validate_network(network: &Network) -> Result<(), DesignError> {
    let mut counts: HashMap<(&str, &str, Terminus), usize> = HashMap::new();

    for (name, node) in network.nodes() {
        for term in [Terminus::N, Terminus::C] {
            for linkage in node.linkages(term) {
                let count = counts
                    .entry((name, linkage.source_chain_id.as_str(), term))
                    .or_default();
                *count += 1;
                if *count > 1 {
                    return Err(DesignError::MultipleLinkages {
                        node: name.to_string(),
                        chain: linkage.source_chain_id.clone(),
                        term,
                    });
                }

                let target = network.node(&linkage.target_mod).ok_or_else(|| {
                    DesignError::DanglingLinkage {
                        node: name.to_string(),
                        target: linkage.target_mod.clone(),
                    }
                })?;

                if node.module_type == ModuleKind::Hub && target.module_type == ModuleKind::Hub {
                    return Err(DesignError::HubToHub {
                        node: name.to_string(),
                        target: linkage.target_mod.clone(),
                    });
                }

                let mirrored = target
                    .chain_linkages(term.opposite(), &linkage.target_chain_id)
                    .any(|back| {
                        back.target_mod == name && back.target_chain_id == linkage.source_chain_id
                    });
                if !mirrored {
                    return Err(DesignError::Unreciprocated {
                        node: name.to_string(),
                        chain: linkage.source_chain_id.clone(),
                        term,
                        target: linkage.target_mod.clone(),
                        target_chain: linkage.target_chain_id.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
