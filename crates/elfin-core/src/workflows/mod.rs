//! # Workflows Module
//!
//! High-level entry points that wire the [`engine`](crate::engine) and
//! [`core`](crate::core) layers into complete procedures.
//!
//! ## Overview
//!
//! Each workflow loads its inputs, drives the engine and reports progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter). Front-ends such as the
//! command-line tool only deal with configuration and presentation.
//!
//! ## Architecture
//!
//! - **Build Workflow** ([`build`]) - alignment database generation from a relaxed module
//!   library, plus conversion of the CSV hub table
//! - **Stitch Workflow** ([`stitch`]) - assembly of design files into atomic models,
//!   one output file per design
//! - **Statistics Workflow** ([`stats`]) - summaries and CSV export of an existing database

pub mod build;
pub mod stats;
pub mod stitch;
