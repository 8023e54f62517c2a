//! Provides input/output functionality for molecular file formats.
//!
//! Module libraries are distributed as PDB files, while stitched designs are written as
//! mmCIF by default because their chain labels may exceed one character. Both formats sit
//! behind the [`traits::MolecularFile`] trait; [`format`] picks one from a file extension.

pub mod cif;
pub mod format;
pub mod pdb;
pub mod traits;
