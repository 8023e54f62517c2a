use nalgebra::{Point3, Vector3};

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Root-mean-square deviation between two index-aligned point sets.
///
/// Returns `None` when the sets are empty or differ in length.
pub fn calculate_rmsd(a: &[Point3<f64>], b: &[Point3<f64>]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let sum_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q).norm_squared())
        .sum();
    Some((sum_sq / a.len() as f64).sqrt())
}

pub fn mean_distance_from(origin: &Point3<f64>, points: &[Point3<f64>]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| (p - origin).norm()).sum::<f64>() / points.len() as f64
}

pub fn max_distance_from(origin: &Point3<f64>, points: &[Point3<f64>]) -> f64 {
    points
        .iter()
        .map(|p| (p - origin).norm())
        .fold(0.0, f64::max)
}
