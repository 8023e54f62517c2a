//! # Engine Module
//!
//! This module implements the assembly engine: it derives junction geometry from a relaxed
//! module library and fuses design networks into continuous atomic chains.
//!
//! ## Overview
//!
//! Assembly runs in two stages. The [`builder`] centres every single, superimposes each
//! double onto its singles and records one rigid transform per junction in the alignment
//! database. The [`stitch`] stage then walks a design network chain by chain
//! ([`decompose`]), loads private residue copies of each module, displaces the residues
//! around every junction toward the relaxed double ([`blend`]) and caps free termini.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - build and stitch parameters with their builders
//! - **Database Builder** ([`builder`]) - centring, pairwise alignment and hub transforms
//! - **Decomposition** ([`decompose`]) - splitting a network into maximal N-to-C chains
//! - **Placement** ([`placement`]) - node placements recomputed from junction transforms
//! - **Stitching** ([`stitch`]) - displacement, capping and chain output
//! - **Progress Monitoring** ([`progress`]) - progress events for front-ends
//! - **Error Handling** ([`error`]) - engine-specific error types and error propagation

pub mod blend;
pub mod builder;
pub(crate) mod cache;
pub mod config;
pub(crate) mod context;
pub mod decompose;
pub mod error;
pub mod placement;
pub mod progress;
pub mod stitch;

#[cfg(test)]
pub(crate) mod fixtures;
