//! Coordinate blending across module seams.
//!
//! A primary residue is pulled toward a reference residue by `(1 - w) * primary + w * reference`.
//! Weight vectors rise linearly toward the boundary being fused, so interior residues keep
//! their own geometry while boundary residues adopt the reference.

use crate::core::models::module::Terminus;
use crate::core::models::residue::DetachedResidue;
use crate::core::utils::identifiers::is_artifact_atom;

fn oriented(mut weights: Vec<f64>, side: Terminus) -> Vec<f64> {
    if side == Terminus::N {
        weights.reverse();
    }
    weights
}

/// Weights for displacing the `n` residues nearest a junction: `i/n` for `i` in `1..=n`.
///
/// On the C side the last weight (1.0) falls on the boundary residue; the N side is reversed.
pub fn displacement_weights(n: usize, side: Terminus) -> Vec<f64> {
    let weights = (1..=n).map(|i| i as f64 / n as f64).collect();
    oriented(weights, side)
}

/// Weights for blending a capped window of `n` residues: `i/n` for `i` in `0..n`.
pub fn cap_weights(n: usize, side: Terminus) -> Vec<f64> {
    let weights = (0..n).map(|i| i as f64 / n as f64).collect();
    oriented(weights, side)
}

/// Pulls one residue toward its reference.
///
/// Artifact atoms and atoms the reference lacks are dropped first. When both residues have
/// the same name every remaining atom is blended; otherwise only backbone atoms move and
/// side chains are left for later relaxation.
pub fn blend_residue(primary: &mut DetachedResidue, reference: &DetachedResidue, weight: f64) {
    primary.retain_atoms(|atom| !is_artifact_atom(&atom.name) && reference.has_atom(&atom.name));

    let same_residue = primary.name == reference.name;
    for atom in primary.atoms_mut() {
        if !same_residue && !atom.is_backbone() {
            continue;
        }
        if let Some(target) = reference.atom(&atom.name) {
            atom.position = atom.position + (target.position - atom.position) * weight;
        }
    }
}

/// Blends `primary[i]` toward `reference[i]` with `weights[i]`.
///
/// The three slices are walked in lockstep; callers size them identically.
pub fn blend_residues(primary: &mut [DetachedResidue], reference: &[DetachedResidue], weights: &[f64]) {
    debug_assert_eq!(primary.len(), reference.len());
    debug_assert_eq!(primary.len(), weights.len());
    for ((residue, target), &weight) in primary.iter_mut().zip(reference).zip(weights) {
        blend_residue(residue, target, weight);
    }
}
