//! Orthonormal basis construction.

use glam::Vec3;
use meshforge_types::constants::SMALL_NUMBER;

/// Makes `(x, y, z)` an orthonormal basis by removing the projections of
/// `x` and `y` onto `z` and normalizing all three axes.
///
/// Degenerate axes (near-zero after projection) are rebuilt from cross
/// products of the remaining two.
pub fn create_orthonormal_basis(x: &mut Vec3, y: &mut Vec3, z: &mut Vec3) {
    // Project the X and Y axes onto the plane perpendicular to the Z axis.
    *x -= *z * (x.dot(*z) / z.dot(*z));
    *y -= *z * (y.dot(*z) / z.dot(*z));

    if x.length_squared() < SMALL_NUMBER {
        *x = y.cross(*z);
    }
    if y.length_squared() < SMALL_NUMBER {
        *y = x.cross(*z);
    }

    *x = x.normalize_or_zero();
    *y = y.normalize_or_zero();
    *z = z.normalize_or_zero();
}
