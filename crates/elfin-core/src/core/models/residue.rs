use super::atom::Atom;
use super::ids::{AtomId, ChainId};
use crate::core::alignment::transform::RigidTransform;
use nalgebra::Point3;
use std::collections::HashMap;

/// A residue as stored inside a [`Structure`](super::structure::Structure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,                      // Residue sequence number from source file
    pub name: String,                       // Name of the residue (e.g., "ALA", "GLY")
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms in file order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(number: isize, name: &str, chain_id: ChainId) -> Self {
        Self {
            number,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// Returns the first atom registered under `name`.
    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}

/// An independent copy of a residue, detached from any structure.
///
/// Detached residues are what the stitcher manipulates: they can be blended, transformed,
/// renumbered and finally appended to an output chain without touching the source module.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedResidue {
    pub number: isize,
    pub name: String,
    atoms: Vec<Atom>,
}

impl DetachedResidue {
    pub fn new(number: isize, name: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
            atoms: Vec::new(),
        }
    }

    pub fn with_atoms(number: isize, name: &str, atoms: Vec<Atom>) -> Self {
        Self {
            number,
            name: name.to_string(),
            atoms,
        }
    }

    pub fn push_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> impl Iterator<Item = &mut Atom> {
        self.atoms.iter_mut()
    }

    /// Returns every atom carrying the given name, in file order.
    pub fn atoms_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Atom> + 'a {
        self.atoms.iter().filter(move |atom| atom.name == name)
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }

    pub fn atom_mut(&mut self, name: &str) -> Option<&mut Atom> {
        self.atoms.iter_mut().find(|atom| atom.name == name)
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom(name).is_some()
    }

    pub fn ca_position(&self) -> Option<Point3<f64>> {
        self.atom("CA").map(|atom| atom.position)
    }

    /// Keeps only the atoms for which `keep` returns `true`.
    pub fn retain_atoms(&mut self, keep: impl FnMut(&Atom) -> bool) {
        self.atoms.retain(keep);
    }

    pub fn transform(&mut self, transform: &RigidTransform) {
        for atom in &mut self.atoms {
            atom.transform(transform);
        }
    }

    pub fn renumber(&mut self, number: isize) {
        self.number = number;
    }
}
