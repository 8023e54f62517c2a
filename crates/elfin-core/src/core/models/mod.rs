//! # Core Models Module
//!
//! Data structures used to represent module structures in memory.
//!
//! - [`atom`] - a single atom with its name, element and coordinates
//! - [`residue`] - residues stored inside a structure, and detached residue copies
//! - [`chain`] - ordered residue lists addressed by a chain label
//! - [`structure`] - a complete structure with slot-map storage and rigid-body operations
//! - [`ids`] - stable keys for atoms, residues and chains
//! - [`module`] - module kinds and chain termini
//!
//! ## Usage
//!
//! ```ignore
//! use elfin::core::models::{atom::Atom, structure::Structure};
//!
//! let mut structure = Structure::new();
//! let chain_id = structure.add_chain("A");
//! let residue_id = structure.add_residue(chain_id, 1, "ALA")?;
//! structure.add_atom_to_residue(residue_id, Atom::new("CA", Point3::origin()))?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod module;
pub mod residue;
pub mod structure;
