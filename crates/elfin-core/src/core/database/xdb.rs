use super::entries::{ChainEntry, HubEntry, SingleEntry, TransformEntry, TransformId};
use crate::core::models::module::{ModuleKind, Terminus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
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
    #[error("Unknown {kind} module '{name}'")]
    UnknownModule { kind: ModuleKind, name: String },
    #[error("Module '{module}' has no chain '{chain}'")]
    UnknownChain { module: String, chain: String },
    #[error("Transform id {0} is not recorded")]
    UnknownTransform(TransformId),
    #[error("No transform recorded between {from}:{from_chain} and {to}:{to_chain}")]
    MissingLink {
        from: String,
        from_chain: String,
        to: String,
        to_chain: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modules {
    #[serde(default)]
    pub singles: BTreeMap<String, SingleEntry>,
    #[serde(default)]
    pub hubs: BTreeMap<String, HubEntry>,
}

/// A borrowed module entry of either kind.
#[derive(Debug, Clone, Copy)]
pub enum ModuleRef<'a> {
    Single(&'a SingleEntry),
    Hub(&'a HubEntry),
}

impl<'a> ModuleRef<'a> {
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleRef::Single(_) => ModuleKind::Single,
            ModuleRef::Hub(_) => ModuleKind::Hub,
        }
    }

    pub fn chain_ids(&self) -> Vec<&'a str> {
        match *self {
            ModuleRef::Single(single) => single.chains.keys().map(String::as_str).collect(),
            ModuleRef::Hub(hub) => hub.chains.keys().map(String::as_str).collect(),
        }
    }

    pub fn chain(&self, chain: &str) -> Option<&'a ChainEntry> {
        match *self {
            ModuleRef::Single(single) => single.chains.get(chain),
            ModuleRef::Hub(hub) => hub.chains.get(chain).map(|c| &c.links),
        }
    }
}

/// The persisted alignment database ("xdb").
///
/// Transform ids are positions in [`Self::n_to_c_tx`]; both endpoints of a junction
/// refer to the same id from their link maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentDatabase {
    pub modules: Modules,
    pub n_to_c_tx: Vec<TransformEntry>,
}

impl AlignmentDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        let content = fs::read_to_string(path).map_err(|e| DatabaseError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| DatabaseError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DatabaseError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| DatabaseError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }
        fs::write(path, content).map_err(|e| DatabaseError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn single(&self, name: &str) -> Result<&SingleEntry, DatabaseError> {
        self.modules
            .singles
            .get(name)
            .ok_or_else(|| DatabaseError::UnknownModule {
                kind: ModuleKind::Single,
                name: name.to_string(),
            })
    }

    pub fn hub(&self, name: &str) -> Result<&HubEntry, DatabaseError> {
        self.modules
            .hubs
            .get(name)
            .ok_or_else(|| DatabaseError::UnknownModule {
                kind: ModuleKind::Hub,
                name: name.to_string(),
            })
    }

    pub fn module(&self, kind: ModuleKind, name: &str) -> Result<ModuleRef<'_>, DatabaseError> {
        match kind {
            ModuleKind::Single => self.single(name).map(ModuleRef::Single),
            ModuleKind::Hub => self.hub(name).map(ModuleRef::Hub),
        }
    }

    pub fn chain(
        &self,
        kind: ModuleKind,
        name: &str,
        chain: &str,
    ) -> Result<&ChainEntry, DatabaseError> {
        self.module(kind, name)?
            .chain(chain)
            .ok_or_else(|| DatabaseError::UnknownChain {
                module: name.to_string(),
                chain: chain.to_string(),
            })
    }

    pub fn transform(&self, id: TransformId) -> Result<&TransformEntry, DatabaseError> {
        self.n_to_c_tx
            .get(id)
            .ok_or(DatabaseError::UnknownTransform(id))
    }

    /// The transform id recorded at `term` of `name:chain` toward `neighbour:neighbour_chain`.
    pub fn link(
        &self,
        kind: ModuleKind,
        name: &str,
        chain: &str,
        term: Terminus,
        neighbour: &str,
        neighbour_chain: &str,
    ) -> Option<TransformId> {
        self.chain(kind, name, chain)
            .ok()?
            .link(term, neighbour, neighbour_chain)
    }

    /// Like [`Self::link`], resolving the id to its entry and reporting a miss as an error.
    pub fn require_link(
        &self,
        kind: ModuleKind,
        name: &str,
        chain: &str,
        term: Terminus,
        neighbour: &str,
        neighbour_chain: &str,
    ) -> Result<&TransformEntry, DatabaseError> {
        let id = self
            .link(kind, name, chain, term, neighbour, neighbour_chain)
            .ok_or_else(|| DatabaseError::MissingLink {
                from: name.to_string(),
                from_chain: chain.to_string(),
                to: neighbour.to_string(),
                to_chain: neighbour_chain.to_string(),
            })?;
        self.transform(id)
    }

    /// The single a chain is made of: the module itself for singles, the component's
    /// source single for hubs.
    pub fn effective_single_name<'a>(
        &'a self,
        kind: ModuleKind,
        name: &'a str,
        chain: &str,
    ) -> Result<&'a str, DatabaseError> {
        match kind {
            ModuleKind::Single => self.single(name).map(|_| name),
            ModuleKind::Hub => self
                .hub(name)?
                .chains
                .get(chain)
                .map(|c| c.single_name.as_str())
                .ok_or_else(|| DatabaseError::UnknownChain {
                    module: name.to_string(),
                    chain: chain.to_string(),
                }),
        }
    }

    pub fn residue_count(
        &self,
        kind: ModuleKind,
        name: &str,
        chain: &str,
    ) -> Result<usize, DatabaseError> {
        self.chain(kind, name, chain).map(|c| c.n_residues)
    }

    /// Whether a terminus can never carry a linkage.
    ///
    /// Hub termini follow the hub metadata; single termini are dormant when no
    /// neighbour was ever recorded for them.
    pub fn is_dormant(
        &self,
        kind: ModuleKind,
        name: &str,
        chain: &str,
        term: Terminus,
    ) -> Result<bool, DatabaseError> {
        match kind {
            ModuleKind::Single => Ok(!self.chain(kind, name, chain)?.has_links(term)),
            ModuleKind::Hub => self
                .hub(name)?
                .chains
                .get(chain)
                .map(|c| !c.is_free(term))
                .ok_or_else(|| DatabaseError::UnknownChain {
                    module: name.to_string(),
                    chain: chain.to_string(),
                }),
        }
    }

    /// Appends a transform and returns its id.
    pub fn push_transform(&mut self, entry: TransformEntry) -> TransformId {
        self.n_to_c_tx.push(entry);
        self.n_to_c_tx.len() - 1
    }

    fn chain_mut(&mut self, kind: ModuleKind, name: &str, chain: &str) -> Option<&mut ChainEntry> {
        match kind {
            ModuleKind::Single => self.modules.singles.get_mut(name)?.chains.get_mut(chain),
            ModuleKind::Hub => self
                .modules
                .hubs
                .get_mut(name)?
                .chains
                .get_mut(chain)
                .map(|c| &mut c.links),
        }
    }

    /// Records transform `id` at `term` of `name:chain`, pointing at `neighbour:neighbour_chain`.
    pub fn add_link(
        &mut self,
        (kind, name, chain): (ModuleKind, &str, &str),
        term: Terminus,
        (neighbour, neighbour_chain): (&str, &str),
        id: TransformId,
    ) -> Result<(), DatabaseError> {
        let entry = self
            .chain_mut(kind, name, chain)
            .ok_or_else(|| DatabaseError::UnknownChain {
                module: name.to_string(),
                chain: chain.to_string(),
            })?;
        entry
            .links_mut(term)
            .entry(neighbour.to_string())
            .or_default()
            .insert(neighbour_chain.to_string(), id);
        Ok(())
    }

    /// Records a transform and links both of its endpoints.
    ///
    /// `a` is the N-side module (its C terminus is linked), `b` the C-side module.
    pub fn connect(
        &mut self,
        a: (ModuleKind, &str, &str),
        b: (ModuleKind, &str, &str),
        transform: TransformEntry,
    ) -> Result<TransformId, DatabaseError> {
        let id = self.push_transform(transform);
        self.add_link(a, Terminus::C, (b.1, b.2), id)?;
        self.add_link(b, Terminus::N, (a.1, a.2), id)?;
        Ok(id)
    }
}
