//! Per-corner tangent-basis synthesis.
//!
//! For each triangle corner lacking a tangent basis, gathers the fan of
//! faces sharing that corner's position, floodfills through the fan across
//! smoothing-group-compatible edges, and blends the reachable faces'
//! per-triangle bases. Corners that already carry a full basis are left
//! untouched but still act as blend sources for their neighbors.

use meshforge_math::basis::create_orthonormal_basis;
use meshforge_math::compare::{points_equal, uvs_equal};
use meshforge_math::Vec3;
use meshforge_mesh::RawMesh;
use meshforge_types::constants::{SMALL_NUMBER, THRESH_POINTS_ARE_SAME};

use crate::overlap::OverlapMap;

/// Policy switches for tangent synthesis.
#[derive(Debug, Clone, Copy)]
pub struct TangentOptions {
    /// Merge normals across overlapping-but-not-identical positions.
    /// When false, only wedges resolving to the same vertex index blend.
    pub blend_overlapping_normals: bool,
    /// Skip degenerate triangles using the standard point threshold.
    /// When false, only exactly-coincident corners count as degenerate.
    pub ignore_degenerate_triangles: bool,
}

impl Default for TangentOptions {
    fn default() -> Self {
        Self {
            blend_overlapping_normals: true,
            ignore_degenerate_triangles: true,
        }
    }
}

impl TangentOptions {
    /// Threshold for degenerate rejection and fan-position matching.
    pub fn comparison_threshold(&self) -> f32 {
        if self.ignore_degenerate_triangles {
            THRESH_POINTS_ARE_SAME
        } else {
            0.0
        }
    }
}

/// Normalizes `v`, returning zero when its squared length is at or below
/// `tolerance`.
#[inline]
fn safe_normal(v: Vec3, tolerance: f32) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq <= tolerance.max(0.0) {
        Vec3::ZERO
    } else {
        v / len_sq.sqrt()
    }
}

/// Computes raw per-triangle tangent bases from UV channel 0.
///
/// The tangent/bitangent pair comes from inverting the affine transform
/// that maps the triangle's UV-space basis vectors onto its local-space
/// edge vectors; the normal is the edge cross product. Triangles with a
/// singular UV mapping or a degenerate normal contribute zero vectors.
pub fn compute_triangle_tangents(
    mesh: &RawMesh,
    comparison_threshold: f32,
) -> (Vec<Vec3>, Vec<Vec3>, Vec<Vec3>) {
    let num_faces = mesh.face_count();
    let mut tangent_x = Vec::with_capacity(num_faces);
    let mut tangent_y = Vec::with_capacity(num_faces);
    let mut tangent_z = Vec::with_capacity(num_faces);

    for face in 0..num_faces {
        let p0 = mesh.wedge_position(face * 3);
        let p1 = mesh.wedge_position(face * 3 + 1);
        let p2 = mesh.wedge_position(face * 3 + 2);

        let normal = safe_normal((p1 - p2).cross(p0 - p2), comparison_threshold);

        let uv0 = mesh.wedge_uv(face * 3, 0);
        let uv1 = mesh.wedge_uv(face * 3 + 1, 0);
        let uv2 = mesh.wedge_uv(face * 3 + 2, 0);
        let duv1 = uv1 - uv0;
        let duv2 = uv2 - uv0;
        let det = duv1.x * duv2.y - duv1.y * duv2.x;

        if normal == Vec3::ZERO || det.abs() <= SMALL_NUMBER {
            tangent_x.push(Vec3::ZERO);
            tangent_y.push(Vec3::ZERO);
            tangent_z.push(normal);
            continue;
        }

        // Invert the UV-to-local transform and push the UV unit axes
        // through it.
        let dp1 = p1 - p0;
        let dp2 = p2 - p0;
        let inv_det = 1.0 / det;
        let mut tx = safe_normal((dp1 * duv2.y - dp2 * duv1.y) * inv_det, 0.0);
        let mut ty = safe_normal((dp2 * duv1.x - dp1 * duv2.x) * inv_det, 0.0);
        let mut tz = normal;
        create_orthonormal_basis(&mut tx, &mut ty, &mut tz);

        tangent_x.push(tx);
        tangent_y.push(ty);
        tangent_z.push(tz);
    }

    (tangent_x, tangent_y, tangent_z)
}

/// One face in the fan around a triangle corner.
#[derive(Debug, Clone, Copy)]
struct FanFace {
    face_index: usize,
    /// Reached by the smoothing floodfill.
    filled: bool,
    blend_tangents: bool,
    blend_normals: bool,
}

/// Fills in missing per-wedge tangents, bitangents and normals using the
/// adjacency-floodfill blend.
///
/// On return all three tangent arrays have exactly one entry per wedge and
/// carry a valid orthonormal basis for every non-degenerate corner.
pub fn compute_tangents(mesh: &mut RawMesh, overlaps: &OverlapMap, options: TangentOptions) {
    smooth_corner_bases(mesh, overlaps, options, true);
}

/// Fills in missing per-wedge normals only, using the same floodfill blend
/// restricted to normals. Used as the first step of the MikkTSpace path.
pub fn fill_missing_normals(mesh: &mut RawMesh, overlaps: &OverlapMap, options: TangentOptions) {
    smooth_corner_bases(mesh, overlaps, options, false);
}

fn smooth_corner_bases(
    mesh: &mut RawMesh,
    overlaps: &OverlapMap,
    options: TangentOptions,
    with_tangents: bool,
) {
    let comparison_threshold = options.comparison_threshold();
    let degenerate_threshold = if options.ignore_degenerate_triangles {
        SMALL_NUMBER
    } else {
        0.0
    };
    let (tri_tangent_x, tri_tangent_y, tri_tangent_z) =
        compute_triangle_tangents(mesh, degenerate_threshold);

    let num_wedges = mesh.wedge_count();
    let num_faces = num_wedges / 3;

    // Allocate storage for any basis axis that was not provided.
    if with_tangents {
        if mesh.wedge_tangent_x.len() != num_wedges {
            mesh.wedge_tangent_x = vec![Vec3::ZERO; num_wedges];
        }
        if mesh.wedge_tangent_y.len() != num_wedges {
            mesh.wedge_tangent_y = vec![Vec3::ZERO; num_wedges];
        }
    }
    if mesh.wedge_tangent_z.len() != num_wedges {
        mesh.wedge_tangent_z = vec![Vec3::ZERO; num_wedges];
    }

    // Declared out here to avoid reallocation per face.
    let mut fans: [Vec<FanFace>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut adjacent_faces: Vec<usize> = Vec::new();

    for face in 0..num_faces {
        let wedge_offset = face * 3;
        let corner_positions = [
            mesh.wedge_position(wedge_offset),
            mesh.wedge_position(wedge_offset + 1),
            mesh.wedge_position(wedge_offset + 2),
        ];
        for fan in &mut fans {
            fan.clear();
        }

        // Don't process degenerate triangles.
        if points_equal(corner_positions[0], corner_positions[1], comparison_threshold)
            || points_equal(corner_positions[0], corner_positions[2], comparison_threshold)
            || points_equal(corner_positions[1], corner_positions[2], comparison_threshold)
        {
            continue;
        }

        // Corners that already carry everything we'd compute are skipped.
        let mut corner_done = [false; 3];
        for corner in 0..3 {
            let w = wedge_offset + corner;
            corner_done[corner] = if with_tangents {
                mesh.wedge_tangent_x[w] != Vec3::ZERO
                    && mesh.wedge_tangent_y[w] != Vec3::ZERO
                    && mesh.wedge_tangent_z[w] != Vec3::ZERO
            } else {
                mesh.wedge_tangent_z[w] != Vec3::ZERO
            };
        }
        if corner_done.iter().all(|&done| done) {
            continue;
        }

        // Tangent blending across an edge requires agreeing winding.
        let determinant = tri_tangent_x[face].dot(tri_tangent_y[face].cross(tri_tangent_z[face]));

        // Gather every face that shares a corner position with this one.
        adjacent_faces.clear();
        for corner in 0..3 {
            let this_wedge = (wedge_offset + corner) as u32;
            adjacent_faces.push(face); // I am a "dup" of myself
            for &dup in overlaps.overlaps(this_wedge) {
                adjacent_faces.push(dup as usize / 3);
            }
        }
        // The equality criterion below is exact, so the fan must be visited
        // in the same order for all duplicates of a corner.
        adjacent_faces.sort_unstable();
        adjacent_faces.dedup();

        // Seed the fan lists. The face itself is the floodfill starter.
        for &other_face in &adjacent_faces {
            for (corner, fan) in fans.iter_mut().enumerate() {
                if corner_done[corner] {
                    continue;
                }
                let connected = other_face == face
                    || (0..3).any(|other_corner| {
                        points_equal(
                            corner_positions[corner],
                            mesh.wedge_position(other_face * 3 + other_corner),
                            comparison_threshold,
                        )
                    });
                if connected {
                    let is_self = other_face == face;
                    fan.push(FanFace {
                        face_index: other_face,
                        filled: is_self,
                        blend_tangents: is_self,
                        blend_normals: is_self,
                    });
                }
            }
        }

        // Floodfill outward through smoothing-group-compatible edges.
        for corner in 0..3 {
            if corner_done[corner] {
                continue;
            }
            loop {
                let mut new_connections = 0;
                for source in 0..fans[corner].len() {
                    if !fans[corner][source].filled {
                        continue;
                    }
                    let source_face = fans[corner][source].face_index;
                    let source_blend_tangents = fans[corner][source].blend_tangents;
                    for target in 0..fans[corner].len() {
                        if target == source || fans[corner][target].filled {
                            continue;
                        }
                        let target_face = fans[corner][target].face_index;
                        if mesh.face_smoothing_masks[target_face]
                            & mesh.face_smoothing_masks[source_face]
                            == 0
                        {
                            continue;
                        }

                        // Count vertices the two faces share; two or more
                        // means they touch along an edge, not just a point.
                        let mut common_vertices = 0;
                        let mut common_tangent_vertices = 0;
                        let mut common_normal_vertices = 0;
                        for sc in 0..3 {
                            for tc in 0..3 {
                                let source_vertex =
                                    mesh.wedge_indices[source_face * 3 + sc];
                                let target_vertex =
                                    mesh.wedge_indices[target_face * 3 + tc];
                                if points_equal(
                                    mesh.vertex_positions[target_vertex as usize],
                                    mesh.vertex_positions[source_vertex as usize],
                                    comparison_threshold,
                                ) {
                                    common_vertices += 1;
                                    if with_tangents
                                        && uvs_equal(
                                            mesh.wedge_uv(target_face * 3 + tc, 0),
                                            mesh.wedge_uv(source_face * 3 + sc, 0),
                                        )
                                    {
                                        common_tangent_vertices += 1;
                                    }
                                    if options.blend_overlapping_normals
                                        || source_vertex == target_vertex
                                    {
                                        common_normal_vertices += 1;
                                    }
                                }
                            }
                        }

                        if common_vertices > 1 {
                            let fan_face = &mut fans[corner][target];
                            fan_face.filled = true;
                            fan_face.blend_normals = common_normal_vertices > 1;
                            new_connections += 1;

                            // Only blend tangents when there is no UV seam
                            // along the shared edge and the windings agree.
                            if with_tangents
                                && source_blend_tangents
                                && common_tangent_vertices > 1
                            {
                                let other_determinant = tri_tangent_x[target_face]
                                    .dot(tri_tangent_y[target_face].cross(tri_tangent_z[target_face]));
                                if determinant * other_determinant > 0.0 {
                                    fans[corner][target].blend_tangents = true;
                                }
                            }
                        }
                    }
                }
                if new_connections == 0 {
                    break;
                }
            }
        }

        // Accumulate the reachable faces' bases per corner.
        let mut corner_tangent_x = [Vec3::ZERO; 3];
        let mut corner_tangent_y = [Vec3::ZERO; 3];
        let mut corner_tangent_z = [Vec3::ZERO; 3];
        for corner in 0..3 {
            let w = wedge_offset + corner;
            if corner_done[corner] {
                if with_tangents {
                    corner_tangent_x[corner] = mesh.wedge_tangent_x[w];
                    corner_tangent_y[corner] = mesh.wedge_tangent_y[w];
                }
                corner_tangent_z[corner] = mesh.wedge_tangent_z[w];
                continue;
            }
            for fan_face in &fans[corner] {
                if !fan_face.filled {
                    continue;
                }
                let other = fan_face.face_index;
                if with_tangents && fan_face.blend_tangents {
                    corner_tangent_x[corner] += tri_tangent_x[other];
                    corner_tangent_y[corner] += tri_tangent_y[other];
                }
                if fan_face.blend_normals {
                    corner_tangent_z[corner] += tri_tangent_z[other];
                }
            }
            // Any axis the author did supply wins over the blend.
            if with_tangents {
                if mesh.wedge_tangent_x[w] != Vec3::ZERO {
                    corner_tangent_x[corner] = mesh.wedge_tangent_x[w];
                }
                if mesh.wedge_tangent_y[w] != Vec3::ZERO {
                    corner_tangent_y[corner] = mesh.wedge_tangent_y[w];
                }
            }
            if mesh.wedge_tangent_z[w] != Vec3::ZERO {
                corner_tangent_z[corner] = mesh.wedge_tangent_z[w];
            }
        }

        for corner in 0..3 {
            let tz = safe_normal(corner_tangent_z[corner], 0.0);
            if with_tangents {
                let mut tx = safe_normal(corner_tangent_x[corner], 0.0);
                let mut ty = safe_normal(corner_tangent_y[corner], 0.0);

                // Gram-Schmidt orthogonalization.
                ty = safe_normal(ty - tx * tx.dot(ty), 0.0);
                tx = safe_normal(tx - tz * tz.dot(tx), 0.0);
                ty = safe_normal(ty - tz * tz.dot(ty), 0.0);

                mesh.wedge_tangent_x[wedge_offset + corner] = tx;
                mesh.wedge_tangent_y[wedge_offset + corner] = ty;
            }
            mesh.wedge_tangent_z[wedge_offset + corner] = tz;
        }
    }

    debug_assert_eq!(mesh.wedge_tangent_z.len(), num_wedges);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::find_overlapping_wedges;
    use meshforge_mesh::generators;

    #[test]
    fn triangle_tangents_follow_uv_axes() {
        let mesh = generators::quad(1.0);
        let (tx, ty, tz) = compute_triangle_tangents(&mesh, SMALL_NUMBER);
        assert_eq!(tx.len(), 2);
        // UVs equal XY positions, so the tangent frame is the world frame
        // up to the winding convention's normal direction.
        for face in 0..2 {
            assert!(tx[face].dot(Vec3::X).abs() > 0.99, "tangent {:?}", tx[face]);
            assert!(ty[face].dot(Vec3::Y).abs() > 0.99, "bitangent {:?}", ty[face]);
            assert!(tz[face].dot(Vec3::Z).abs() > 0.99, "normal {:?}", tz[face]);
        }
    }

    #[test]
    fn flat_quad_blends_to_parallel_bases() {
        let mut mesh = generators::quad(1.0);
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());

        let reference = mesh.wedge_tangent_z[0];
        for w in 0..mesh.wedge_count() {
            assert!((mesh.wedge_tangent_x[w].length() - 1.0).abs() < 1e-3);
            assert!((mesh.wedge_tangent_z[w].length() - 1.0).abs() < 1e-3);
            assert!(mesh.wedge_tangent_x[w].dot(mesh.wedge_tangent_z[w]).abs() < 1e-3);
            assert!(mesh.wedge_tangent_z[w].dot(reference) > 0.999);
        }
    }

    #[test]
    fn smoothing_group_split_produces_hard_edge() {
        let mut mesh = generators::quad(1.0);
        mesh.face_smoothing_masks = vec![1, 2];
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        fill_missing_normals(&mut mesh, &overlaps, TangentOptions::default());
        // The quad is planar so even hard-edged normals agree in direction,
        // but every wedge must still have a valid normal.
        for w in 0..mesh.wedge_count() {
            assert!((mesh.wedge_tangent_z[w].length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn authored_corners_left_untouched() {
        let mut mesh = generators::quad(1.0);
        let n = mesh.wedge_count();
        mesh.wedge_tangent_x = vec![Vec3::X; n];
        mesh.wedge_tangent_y = vec![Vec3::Y; n];
        mesh.wedge_tangent_z = vec![Vec3::Z; n];
        let authored = mesh.wedge_tangent_x.clone();
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        assert_eq!(mesh.wedge_tangent_x, authored);
    }
}
