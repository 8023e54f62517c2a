//! Rigid-body alignment primitives.
//!
//! [`transform::RigidTransform`] is the single representation of a placement used across
//! the crate (database entries, design-graph nodes, junction frames). All rotations are
//! applied as left multiplication, `p' = R·p + T`.
//!
//! [`superposition`] provides the least-squares fit between two ordered point sets and the
//! windowed [`superposition::AlignmentRequest`] used at module junctions.

pub mod superposition;
pub mod transform;
