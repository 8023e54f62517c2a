use nalgebra::{Matrix3, Point3, Vector3};

/// A proper rigid-body motion `p' = R·p + T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(Matrix3::identity(), translation)
    }

    /// Builds a transform from row-major arrays, the layout used in persisted JSON.
    pub fn from_rows(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> Self {
        let rotation = Matrix3::from_fn(|r, c| rotation[r][c]);
        Self::new(rotation, Vector3::from_row_slice(translation))
    }

    pub fn rotation_rows(&self) -> [[f64; 3]; 3] {
        let mut rows = [[0.0; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.rotation[(r, c)];
            }
        }
        rows
    }

    pub fn translation_array(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }

    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Composes two transforms: the result applies `self` first, then `next`.
    pub fn then(&self, next: &RigidTransform) -> RigidTransform {
        RigidTransform::new(
            next.rotation * self.rotation,
            next.rotation * self.translation + next.translation,
        )
    }

    /// The inverse motion, `(Rᵀ, −Rᵀ·T)`.
    pub fn inverse(&self) -> RigidTransform {
        let rotation_t = self.rotation.transpose();
        RigidTransform::new(rotation_t, -(rotation_t * self.translation))
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        (self.rotation - Matrix3::identity()).abs().max() <= tolerance
            && self.translation.abs().max() <= tolerance
    }
}
