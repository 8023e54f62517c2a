use crate::core::alignment::transform::RigidTransform;
use crate::core::utils::identifiers::{is_backbone_atom, is_heavy_atom};
use nalgebra::Point3;

/// Represents an atom of a module structure.
///
/// Atoms carry only what the assembly pipeline needs: an identity (name and element),
/// a position and the two crystallographic columns that are preserved on output.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "1HB").
    pub name: String,
    /// The element symbol (e.g., "C", "N"). Inferred from the name when the source omits it.
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Occupancy as read from the source file.
    pub occupancy: f64,
    /// Isotropic temperature factor as read from the source file.
    pub b_factor: f64,
}

impl Atom {
    /// Creates a new `Atom` with an inferred element, full occupancy and a zero B-factor.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            element: infer_element(name),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
        }
    }

    /// Overrides the inferred element symbol. Blank symbols are ignored.
    pub fn with_element(mut self, element: &str) -> Self {
        let element = element.trim();
        if !element.is_empty() {
            self.element = element.to_ascii_uppercase();
        }
        self
    }

    pub fn is_backbone(&self) -> bool {
        is_backbone_atom(&self.name)
    }

    /// Returns `true` for any non-hydrogen atom, preferring the element symbol over the name.
    pub fn is_heavy(&self) -> bool {
        match self.element.as_str() {
            "" => is_heavy_atom(&self.name),
            "H" | "D" => false,
            _ => true,
        }
    }

    pub fn transform(&mut self, transform: &RigidTransform) {
        self.position = transform.apply(&self.position);
    }
}

fn infer_element(name: &str) -> String {
    name.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Vector3};

    #[test]
    fn new_atom_infers_element_from_name() {
        assert_eq!(Atom::new("CA", Point3::origin()).element, "C");
        assert_eq!(Atom::new("1HB", Point3::origin()).element, "H");
        assert_eq!(Atom::new(" OXT", Point3::origin()).element, "O");
    }

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new("N", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.name, "N");
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.b_factor, 0.0);
    }

    #[test]
    fn explicit_element_overrides_inference() {
        let atom = Atom::new("CA", Point3::origin()).with_element("ca");
        assert_eq!(atom.element, "CA");
        let unchanged = Atom::new("CA", Point3::origin()).with_element("  ");
        assert_eq!(unchanged.element, "C");
    }

    #[test]
    fn heavy_atom_classification_uses_element_when_present() {
        assert!(Atom::new("CB", Point3::origin()).is_heavy());
        assert!(!Atom::new("HA", Point3::origin()).is_heavy());
        assert!(!Atom::new("2HG1", Point3::origin()).is_heavy());
        let mut unnamed = Atom::new("X1", Point3::origin());
        unnamed.element.clear();
        assert!(unnamed.is_heavy());
    }

    #[test]
    fn transform_moves_position() {
        let mut atom = Atom::new("CA", Point3::new(1.0, 0.0, 0.0));
        let rotation = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        atom.transform(&RigidTransform::new(rotation, Vector3::new(0.0, 0.0, 5.0)));
        assert!((atom.position - Point3::new(0.0, 1.0, 5.0)).norm() < 1e-12);
    }
}
