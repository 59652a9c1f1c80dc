//! Stratified sphere sample directions.
//!
//! The voxelizer classifies inside/outside by majority vote over a fixed
//! direction set, so the set must cover the sphere evenly. Directions are
//! stratified over two mirrored hemispheres with a deterministic seed, so
//! every build of the same mesh produces the same volume.

use meshforge_math::Vec3;
use meshforge_types::constants::NUM_VOXEL_DISTANCE_SAMPLES;

/// Fills `out` with one direction per (theta, phi) stratum of the upper
/// hemisphere, jittered uniformly within the stratum.
fn stratified_hemisphere(
    theta_steps: usize,
    phi_steps: usize,
    rng: &mut fastrand::Rng,
    out: &mut Vec<Vec3>,
) {
    for theta in 0..theta_steps {
        for phi in 0..phi_steps {
            let u1 = rng.f32();
            let u2 = rng.f32();
            // Uniform over the hemisphere: z is the stratified cosine.
            let fraction1 = (theta as f32 + u1) / theta_steps as f32;
            let fraction2 = (phi as f32 + u2) / phi_steps as f32;
            let r = (1.0 - fraction1 * fraction1).max(0.0).sqrt();
            let angle = 2.0 * std::f32::consts::PI * fraction2;
            out.push(Vec3::new(r * angle.cos(), r * angle.sin(), fraction1));
        }
    }
}

/// Builds the full sphere direction table.
pub fn sphere_sample_directions() -> Vec<Vec3> {
    let theta_steps =
        ((NUM_VOXEL_DISTANCE_SAMPLES as f32 / (2.0 * std::f32::consts::PI)).sqrt()) as usize;
    let phi_steps = (theta_steps as f32 * std::f32::consts::PI) as usize;

    let mut rng = fastrand::Rng::with_seed(0);
    let mut directions = Vec::with_capacity(theta_steps * phi_steps * 2);
    stratified_hemisphere(theta_steps, phi_steps, &mut rng, &mut directions);
    let upper = directions.len();
    stratified_hemisphere(theta_steps, phi_steps, &mut rng, &mut directions);
    for direction in &mut directions[upper..] {
        direction.z = -direction.z;
    }
    directions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_deterministic_and_mirrored() {
        let a = sphere_sample_directions();
        let b = sphere_sample_directions();
        assert_eq!(a, b);
        assert_eq!(a.len() % 2, 0);
        let down = a.iter().filter(|d| d.z < 0.0).count();
        assert_eq!(down, a.len() / 2);
    }

    #[test]
    fn directions_are_unit_length() {
        for direction in sphere_sample_directions() {
            assert!((direction.length() - 1.0).abs() < 1e-4, "{direction:?}");
        }
    }

    #[test]
    fn grid_matches_nominal_budget() {
        // floor(sqrt(1200 / 2π)) = 13 theta rows, floor(13π) = 40 phi
        // columns, mirrored.
        assert_eq!(sphere_sample_directions().len(), 13 * 40 * 2);
    }
}
