/// Vector and quaternion helpers used by the pipeline
use nalgebra::{Quaternion, Vector3};

/// A 3D vector in model or camera space.
pub type Vec3 = Vector3<f64>;

/// Small value used to keep divisions and grid snapping away from float noise.
pub const EPSILON: f64 = 1e-6;

/// Normalize a vector, returning the zero vector when it has no length.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let norm = v.norm();
    if norm < f64::EPSILON {
        Vec3::zeros()
    } else {
        v / norm
    }
}

/// Hamilton product `a * b`.
///
/// Written out from the scalar/vector form:
/// `(w1 w2 - v1·v2, w1 v2 + w2 v1 + v1 × v2)`.
pub fn hamilton_product(a: &Quaternion<f64>, b: &Quaternion<f64>) -> Quaternion<f64> {
    let (w1, v1) = (a.scalar(), a.imag());
    let (w2, v2) = (b.scalar(), b.imag());

    let scalar = w1 * w2 - v1.dot(&v2);
    let vector = v2 * w1 + v1 * w2 + v1.cross(&v2);

    Quaternion::from_parts(scalar, vector)
}

/// Rotation quaternion `(cos(θ/2), sin(θ/2)·axis)` for a normalized axis.
pub fn rotation_quaternion(angle: f64, axis: &Vec3) -> Quaternion<f64> {
    let (sin, cos) = (angle / 2.0).sin_cos();
    Quaternion::from_parts(cos, axis * sin)
}

/// Rotate `v` by the sandwich product `q * v * q⁻¹`.
///
/// `q_inv` is passed in so callers rotating many points only build it once.
pub fn rotate_vector(q: &Quaternion<f64>, q_inv: &Quaternion<f64>, v: &Vec3) -> Vec3 {
    let point = Quaternion::from_parts(0.0, *v);
    hamilton_product(&hamilton_product(q, &point), q_inv).imag()
}

/// Arithmetic mean of a set of vectors, or zero when the set is empty.
pub fn mean<'a, I>(points: I) -> Vec3
where
    I: IntoIterator<Item = &'a Vec3>,
{
    let mut sum = Vec3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p;
        count += 1;
    }
    if count == 0 {
        sum
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_hamilton_product_matches_nalgebra() {
        let a = Quaternion::new(0.3, -1.0, 2.0, 0.5);
        let b = Quaternion::new(-0.7, 0.25, 1.5, -2.0);
        let ours = hamilton_product(&a, &b);
        let theirs = a * b;
        assert_relative_eq!(ours.coords, theirs.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_quaternion_is_unit() {
        let axis = normalize_or_zero(&Vec3::new(1.0, 2.0, -3.0));
        for step in 0..64 {
            let angle = step as f64 * 0.37;
            let q = rotation_quaternion(angle, &axis);
            assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_preserves_length() {
        let axis = normalize_or_zero(&Vec3::new(1.0, 1.0, 1.0));
        let v = normalize_or_zero(&Vec3::new(0.2, -0.9, 0.4));
        for step in 0..32 {
            let q = rotation_quaternion(step as f64 * 0.21, &axis);
            let rotated = rotate_vector(&q, &q.conjugate(), &v);
            assert_relative_eq!(rotated.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let q = rotation_quaternion(PI / 2.0, &Vec3::z());
        let rotated = rotate_vector(&q, &q.conjugate(), &Vec3::x());
        assert_relative_eq!(rotated, Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize_or_zero(&Vec3::zeros()), Vec3::zeros());
        assert_relative_eq!(normalize_or_zero(&Vec3::new(0.0, 3.0, 4.0)).norm(), 1.0);
    }

    #[test]
    fn test_mean() {
        let points = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, -6.0)];
        assert_relative_eq!(mean(&points), Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(mean(&Vec::<Vec3>::new()), Vec3::zeros());
    }
}
