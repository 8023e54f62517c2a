pub mod build;
pub mod data;
pub mod hubinfo;
pub mod stats;
pub mod stitch;
