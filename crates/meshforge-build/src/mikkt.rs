//! MikkTSpace tangent generation.
//!
//! Normals still come from the smoothing-group floodfill; only the tangent
//! and bitangent are delegated to the reference MikkTSpace algorithm, which
//! guarantees identical results to other tools using the same library.

use meshforge_math::Vec3;
use meshforge_mesh::RawMesh;
use mikktspace::{generate_tangents, Geometry};

use crate::overlap::OverlapMap;
use crate::tangents::{fill_missing_normals, TangentOptions};

struct MikkGeometry<'a> {
    mesh: &'a mut RawMesh,
}

impl Geometry for MikkGeometry<'_> {
    fn num_faces(&self) -> usize {
        self.mesh.face_count()
    }

    fn num_vertices_of_face(&self, _face: usize) -> usize {
        3
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        self.mesh.wedge_position(face * 3 + vert).to_array()
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        self.mesh.wedge_tangent_z[face * 3 + vert].to_array()
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.mesh.wedge_uv(face * 3 + vert, 0).to_array()
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        let wedge = face * 3 + vert;
        let t = Vec3::new(tangent[0], tangent[1], tangent[2]);
        let sign = tangent[3];
        let normal = self.mesh.wedge_tangent_z[wedge];
        self.mesh.wedge_tangent_x[wedge] = t;
        // MikkTSpace's sign convention is the reverse of ours.
        self.mesh.wedge_tangent_y[wedge] = -(sign * normal.cross(t));
    }
}

/// Fills in wedge tangent bases using MikkTSpace.
///
/// Missing normals are synthesized by the floodfill blend first, since
/// MikkTSpace requires them as input. Existing normals are kept as-is.
pub fn compute_tangents_mikktspace(
    mesh: &mut RawMesh,
    overlaps: &OverlapMap,
    options: TangentOptions,
) {
    fill_missing_normals(mesh, overlaps, options);

    let num_wedges = mesh.wedge_count();
    if mesh.wedge_tangent_x.len() != num_wedges {
        mesh.wedge_tangent_x = vec![Vec3::ZERO; num_wedges];
    }
    if mesh.wedge_tangent_y.len() != num_wedges {
        mesh.wedge_tangent_y = vec![Vec3::ZERO; num_wedges];
    }

    let mut geometry = MikkGeometry { mesh };
    if !generate_tangents(&mut geometry) {
        tracing::warn!("mikktspace generation failed; tangents left as zero vectors");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::find_overlapping_wedges;
    use meshforge_mesh::generators;
    use meshforge_types::constants::THRESH_POINTS_ARE_SAME;

    #[test]
    fn quad_gets_orthonormal_bases() {
        let mut mesh = generators::quad(1.0);
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents_mikktspace(&mut mesh, &overlaps, TangentOptions::default());

        for w in 0..mesh.wedge_count() {
            let tx = mesh.wedge_tangent_x[w];
            let ty = mesh.wedge_tangent_y[w];
            let tz = mesh.wedge_tangent_z[w];
            assert!((tx.length() - 1.0).abs() < 1e-3);
            assert!((ty.length() - 1.0).abs() < 1e-3);
            assert!((tz.length() - 1.0).abs() < 1e-3);
            assert!(tx.dot(tz).abs() < 1e-3);
            assert!(ty.dot(tz).abs() < 1e-3);
        }
    }
}
