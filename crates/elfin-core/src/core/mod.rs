//! # Core Module
//!
//! Fundamental building blocks shared by every stage of the assembly pipeline.
//!
//! - **Molecular Representation** ([`models`]) - atoms, residues, chains and whole structures
//! - **File I/O** ([`io`]) - PDB and mmCIF readers/writers behind a common trait
//! - **Rigid-Body Alignment** ([`alignment`]) - rigid transforms and least-squares superposition
//! - **Alignment Database** ([`database`]) - the persisted module/transform database
//! - **Design Graphs** ([`design`]) - module networks exported by the design front-end
//! - **Metadata Tables** ([`metadata`]) - hub connectivity and capping repeat indices
//! - **Utilities** ([`utils`]) - atom-name classification and small geometric helpers

pub mod alignment;
pub mod database;
pub mod design;
pub mod io;
pub mod metadata;
pub mod models;
pub mod utils;
