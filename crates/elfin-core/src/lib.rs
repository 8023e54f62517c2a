//! # elfin Core Library
//!
//! Geometric assembly engine for modular protein design. Proteins are built from rigid
//! building blocks ("modules"); this crate derives the junction geometry between them and
//! turns an abstract design graph into continuous atomic chains.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, the alignment database,
//!   design graphs), the least-squares superposition primitive, metadata tables and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The database builder, the network decomposer and the
//!   stitcher, together with their configuration, error types, caches and progress reporting.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures (build a database from a module
//!   library, stitch a design, summarize a database) that wire the `engine` and `core` together.

pub mod core;
pub mod engine;
pub mod workflows;
