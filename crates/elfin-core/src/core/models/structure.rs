use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::{DetachedResidue, Residue};
use crate::core::alignment::transform::RigidTransform;
use nalgebra::{Point3, Vector3};
use slotmap::SlotMap;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Chain '{0}' not found")]
    ChainNotFound(String),
    #[error("Residue {residue} of chain '{chain}' has no '{atom}' atom")]
    MissingAtom {
        chain: String,
        residue: isize,
        atom: &'static str,
    },
}

/// Represents a complete module structure: chains of residues of atoms.
///
/// Storage uses slot maps so that atom, residue and chain keys stay valid while the
/// structure is edited. Chains remember their insertion order, which is also the order
/// in which they are written back to disk.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains.
    chains: SlotMap<ChainId, Chain>,
    /// Chains in insertion order.
    chain_order: Vec<ChainId>,
    /// Lookup map for finding chains by label.
    chain_label_map: HashMap<String, ChainId>,
    /// Lookup map for finding residues by chain ID and residue number.
    residue_number_map: HashMap<(ChainId, isize), ResidueId>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Returns an iterator over all atoms in the structure.
    ///
    /// The order follows slot-map storage, not chain order; use [`Self::chains`] and
    /// [`Residue::atoms`] when file order matters.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns the chains in insertion order.
    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    pub fn chain_count(&self) -> usize {
        self.chain_order.len()
    }

    pub fn chain_labels(&self) -> Vec<&str> {
        self.chains().map(|(_, chain)| chain.label.as_str()).collect()
    }

    pub fn first_chain(&self) -> Option<ChainId> {
        self.chain_order.first().copied()
    }

    /// Finds a chain by its label.
    pub fn find_chain(&self, label: &str) -> Option<ChainId> {
        self.chain_label_map.get(label).copied()
    }

    /// Like [`Self::find_chain`], but reports a missing chain as an error.
    pub fn require_chain(&self, label: &str) -> Result<ChainId, StructureError> {
        self.find_chain(label)
            .ok_or_else(|| StructureError::ChainNotFound(label.to_string()))
    }

    /// Adds a new chain or returns the existing one with the same label.
    pub fn add_chain(&mut self, label: &str) -> ChainId {
        if let Some(&id) = self.chain_label_map.get(label) {
            return id;
        }
        let id = self.chains.insert(Chain::new(label));
        self.chain_order.push(id);
        self.chain_label_map.insert(label.to_string(), id);
        id
    }

    /// Adds a new residue to a chain or returns the existing one with the same number.
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number);

        if let Some(&existing) = self.residue_number_map.get(&key) {
            return Some(existing);
        }

        let residue_id = self
            .residues
            .insert(Residue::new(residue_number, name, chain_id));
        self.residue_number_map.insert(key, residue_id);
        chain.residues.push(residue_id);
        Some(residue_id)
    }

    /// Adds an atom to a specific residue. Returns `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        let residue = self.residues.get_mut(residue_id)?;
        residue.add_atom(&name, atom_id);
        Some(atom_id)
    }

    pub fn residue_count(&self, chain_id: ChainId) -> usize {
        self.chains.get(chain_id).map_or(0, Chain::len)
    }

    /// Returns every atom of `residue_id` carrying the given name.
    pub fn atoms_named<'a>(
        &'a self,
        residue_id: ResidueId,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Atom> + 'a {
        self.residues
            .get(residue_id)
            .into_iter()
            .flat_map(|residue| residue.atoms.iter())
            .filter_map(|&atom_id| self.atoms.get(atom_id))
            .filter(move |atom| atom.name == name)
    }

    /// Returns independent copies of a chain's residues, in chain order.
    pub fn residues_of(&self, chain_id: ChainId) -> Vec<DetachedResidue> {
        let Some(chain) = self.chains.get(chain_id) else {
            return Vec::new();
        };
        chain
            .residues
            .iter()
            .filter_map(|&residue_id| self.residues.get(residue_id))
            .map(|residue| {
                let atoms = residue
                    .atoms
                    .iter()
                    .filter_map(|&atom_id| self.atoms.get(atom_id))
                    .cloned()
                    .collect();
                DetachedResidue::with_atoms(residue.number, &residue.name, atoms)
            })
            .collect()
    }

    /// Returns the CA position of every residue of a chain, in chain order.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::MissingAtom`] when any residue lacks a CA atom, since
    /// the positions are consumed as index-aligned alignment windows.
    pub fn ca_positions(&self, chain_id: ChainId) -> Result<Vec<Point3<f64>>, StructureError> {
        let chain = self
            .chains
            .get(chain_id)
            .ok_or_else(|| StructureError::ChainNotFound(format!("{:?}", chain_id)))?;
        chain
            .residues
            .iter()
            .filter_map(|&residue_id| self.residues.get(residue_id).map(|r| (residue_id, r)))
            .map(|(residue_id, residue)| {
                self.atoms_named(residue_id, "CA")
                    .next()
                    .map(|atom| atom.position)
                    .ok_or_else(|| StructureError::MissingAtom {
                        chain: chain.label.clone(),
                        residue: residue.number,
                        atom: "CA",
                    })
            })
            .collect()
    }

    /// Appends detached residues to the chain labelled `label`, creating it if needed.
    ///
    /// Residues whose number already exists in the chain are merged into the existing
    /// residue, so callers renumber before appending.
    pub fn append_residues(
        &mut self,
        label: &str,
        residues: impl IntoIterator<Item = DetachedResidue>,
    ) -> ChainId {
        let chain_id = self.add_chain(label);
        for residue in residues {
            let Some(residue_id) = self.add_residue(chain_id, residue.number, &residue.name)
            else {
                continue;
            };
            for atom in residue.atoms() {
                self.add_atom_to_residue(residue_id, atom.clone());
            }
        }
        chain_id
    }

    /// Applies a rigid transform to every atom in place.
    pub fn transform(&mut self, transform: &RigidTransform) {
        for (_, atom) in self.atoms.iter_mut() {
            atom.transform(transform);
        }
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for (_, atom) in self.atoms.iter_mut() {
            atom.position += offset;
        }
    }
}
