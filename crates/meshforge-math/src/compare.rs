//! Threshold-based approximate comparisons.
//!
//! Vertex welding and overlap detection compare positions per-axis rather
//! than by Euclidean distance; the cheaper test is what determines the
//! pipeline's notion of "the same point".

use glam::{Vec2, Vec3};
use meshforge_types::constants::{THRESH_NORMALS_ARE_SAME, THRESH_UVS_ARE_SAME};

/// Returns true if the two points are within `threshold` on every axis.
///
/// A threshold of zero means exact match only.
#[inline]
pub fn points_equal(a: Vec3, b: Vec3, threshold: f32) -> bool {
    (a.x - b.x).abs() <= threshold && (a.y - b.y).abs() <= threshold && (a.z - b.z).abs() <= threshold
}

/// Returns true if two unit vectors are close enough to be the same normal.
#[inline]
pub fn normals_equal(a: Vec3, b: Vec3) -> bool {
    points_equal(a, b, THRESH_NORMALS_ARE_SAME)
}

/// Returns true if two texture coordinates are within 1/1024 on each axis.
#[inline]
pub fn uvs_equal(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() <= THRESH_UVS_ARE_SAME && (a.y - b.y).abs() <= THRESH_UVS_ARE_SAME
}

/// Scalar sort key that decorrelates the three axes while approximately
/// preserving spatial locality. Points whose keys differ by more than the
/// comparison threshold cannot be the same point.
#[inline]
pub fn position_sort_key(p: Vec3) -> f32 {
    0.30 * p.x + 0.33 * p.y + 0.37 * p.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threshold_is_exact() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert!(points_equal(a, a, 0.0));
        assert!(!points_equal(a, a + Vec3::splat(1.0e-6), 0.0));
    }

    #[test]
    fn per_axis_not_euclidean() {
        // Each axis within threshold, Euclidean distance above it.
        let t = 0.001;
        let a = Vec3::ZERO;
        let b = Vec3::splat(t * 0.9);
        assert!(b.length() > t);
        assert!(points_equal(a, b, t));
    }

    #[test]
    fn sort_key_orders_nearby_points_close() {
        let a = position_sort_key(Vec3::new(1.0, 1.0, 1.0));
        let b = position_sort_key(Vec3::new(1.0, 1.0, 1.0001));
        assert!((a - b).abs() < 0.001);
    }
}
