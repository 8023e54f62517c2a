use super::transform::RigidTransform;
use crate::core::utils::geometry::centroid;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

/// Fewest paired points that determine a rigid-body fit.
pub const MIN_ALIGNMENT_POINTS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SuperpositionError {
    #[error("Superposition needs at least 3 paired points, found {found}")]
    InsufficientPoints { found: usize },
    #[error("Point sets differ in length (moving: {moving}, fixed: {fixed})")]
    LengthMismatch { moving: usize, fixed: usize },
    #[error(
        "Alignment window [{offset}, {offset}+{len}) exceeds the {available} points of the {side} set"
    )]
    WindowOutOfRange {
        side: &'static str,
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("Singular value decomposition did not converge")]
    Decomposition,
}

/// Residue count of the fusion window for a module of `residue_count` residues.
///
/// Junction fits use one eighth of the module, rounded up.
pub fn fusion_window(residue_count: usize) -> usize {
    residue_count.div_ceil(8)
}

/// Computes the rigid transform that best maps `moving` onto `fixed` in the least-squares sense.
///
/// Uses the Kabsch method: SVD of the cross-covariance of the centred point sets, with the
/// last singular direction flipped when needed so the result is a proper rotation.
///
/// # Errors
///
/// Returns [`SuperpositionError::LengthMismatch`] for unpaired inputs and
/// [`SuperpositionError::InsufficientPoints`] for fewer than three pairs.
pub fn superimpose(
    moving: &[Point3<f64>],
    fixed: &[Point3<f64>],
) -> Result<RigidTransform, SuperpositionError> {
    if moving.len() != fixed.len() {
        return Err(SuperpositionError::LengthMismatch {
            moving: moving.len(),
            fixed: fixed.len(),
        });
    }
    if moving.len() < MIN_ALIGNMENT_POINTS {
        return Err(SuperpositionError::InsufficientPoints {
            found: moving.len(),
        });
    }

    let empty = SuperpositionError::InsufficientPoints { found: 0 };
    let from_centroid = centroid(moving).ok_or_else(|| empty.clone())?;
    let to_centroid = centroid(fixed).ok_or(empty)?;

    let h = moving
        .iter()
        .zip(fixed.iter())
        .map(|(f, t)| (f - from_centroid, t - to_centroid))
        .fold(Matrix3::zeros(), |acc, (f, t)| acc + t * f.transpose());

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(SuperpositionError::Decomposition)?;
    let v_t = svd.v_t.ok_or(SuperpositionError::Decomposition)?;

    let d = (u * v_t).determinant();
    let mut correction = Matrix3::identity();
    if d < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = u * correction * v_t;
    let translation: Vector3<f64> = to_centroid.coords - rotation * from_centroid.coords;

    Ok(RigidTransform::new(rotation, translation))
}

/// A windowed superposition between two ordered point traces (usually CA atoms).
///
/// The windows `[moving_offset, moving_offset + window_len)` and
/// `[fixed_offset, fixed_offset + window_len)` are paired index by index.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRequest<'a> {
    pub moving: &'a [Point3<f64>],
    pub fixed: &'a [Point3<f64>],
    pub moving_offset: usize,
    pub fixed_offset: usize,
    pub window_len: usize,
}

impl AlignmentRequest<'_> {
    /// Solves for the transform mapping the moving window onto the fixed window.
    pub fn solve(&self) -> Result<RigidTransform, SuperpositionError> {
        let moving = window(self.moving, self.moving_offset, self.window_len, "moving")?;
        let fixed = window(self.fixed, self.fixed_offset, self.window_len, "fixed")?;
        superimpose(moving, fixed)
    }
}

fn window<'p>(
    points: &'p [Point3<f64>],
    offset: usize,
    len: usize,
    side: &'static str,
) -> Result<&'p [Point3<f64>], SuperpositionError> {
    points
        .get(offset..offset + len)
        .ok_or(SuperpositionError::WindowOutOfRange {
            side,
            offset,
            len,
            available: points.len(),
        })
}
