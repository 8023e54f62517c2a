//! The persisted alignment database.
//!
//! The database records every module's chains and residue counts, the junction
//! transforms between module chains, and the radii of each centred module. It is
//! written once by the builder and read by the decomposer, stitcher and placement.

pub mod entries;
pub mod xdb;
