//! Vertex welding.
//!
//! Collapses wedges whose full attribute sets are equal into shared render
//! vertices and emits per-material index streams. Triangles with coincident
//! corner positions are rejected before welding, and triangles that still
//! collapse to fewer than three distinct vertices afterwards are dropped.

use std::collections::HashMap;

use meshforge_math::compare::points_equal;
use meshforge_mesh::RawMesh;
use meshforge_types::constants::MAX_MATERIAL_INDEX;
use tracing::debug;

use crate::overlap::OverlapMap;
use crate::vertex::BuildVertex;

/// Result of welding one raw mesh.
#[derive(Debug, Clone, Default)]
pub struct WeldOutput {
    /// Deduplicated vertices, in order of first use.
    pub vertices: Vec<BuildVertex>,
    /// One index stream per material slot; empty slots stay empty.
    pub per_section_indices: Vec<Vec<u32>>,
    /// Maps each wedge to its render vertex, `None` for wedges of dropped
    /// degenerate triangles.
    pub wedge_map: Vec<Option<u32>>,
}

/// Welds `mesh` into unique vertices and per-section index streams.
///
/// Two wedges share a vertex only when they spatially overlap and every
/// attribute matches within its tolerance. Candidate matches are restricted
/// to strictly earlier wedges so the earliest occurrence always becomes the
/// canonical representative, independent of face order downstream.
pub fn weld_vertices(
    mesh: &RawMesh,
    overlaps: &OverlapMap,
    comparison_threshold: f32,
) -> WeldOutput {
    let num_wedges = mesh.wedge_count();
    let num_faces = mesh.face_count();

    let mut output = WeldOutput {
        vertices: Vec::new(),
        per_section_indices: vec![Vec::new(); MAX_MATERIAL_INDEX as usize],
        wedge_map: vec![None; num_wedges],
    };
    // Wedge index -> final vertex index, for already-welded wedges.
    let mut wedge_to_vertex: HashMap<u32, u32> = HashMap::new();
    let mut dropped_faces = 0usize;

    for face in 0..num_faces {
        // Positionally degenerate faces are rejected up front, even when an
        // upstream pass already filtered them, so their wedges never append
        // vertices. Attribute differences at a collapsed corner must not
        // keep a sliver alive.
        let p0 = mesh.wedge_position(face * 3);
        let p1 = mesh.wedge_position(face * 3 + 1);
        let p2 = mesh.wedge_position(face * 3 + 2);
        if points_equal(p0, p1, comparison_threshold)
            || points_equal(p0, p2, comparison_threshold)
            || points_equal(p1, p2, comparison_threshold)
        {
            dropped_faces += 1;
            continue;
        }

        let material = mesh.face_material_indices[face].clamp(0, MAX_MATERIAL_INDEX - 1) as usize;

        let mut corner_vertices = [0u32; 3];
        for corner in 0..3 {
            let wedge = (face * 3 + corner) as u32;
            let vertex = BuildVertex::from_wedge(mesh, wedge as usize);

            // Reuse an earlier wedge's vertex if all attributes match.
            // Scanning only strictly earlier wedges keeps the choice of
            // representative deterministic.
            let mut index = None;
            for &dup in overlaps.overlaps(wedge) {
                if dup >= wedge {
                    break; // sorted ascending
                }
                if let Some(&existing) = wedge_to_vertex.get(&dup) {
                    if output.vertices[existing as usize].equals(&vertex, comparison_threshold) {
                        index = Some(existing);
                        break;
                    }
                }
            }

            let index = index.unwrap_or_else(|| {
                let new_index = output.vertices.len() as u32;
                output.vertices.push(vertex);
                new_index
            });
            wedge_to_vertex.insert(wedge, index);
            corner_vertices[corner] = index;
        }

        // Reject faces that welded down to an edge or a point.
        if corner_vertices[0] == corner_vertices[1]
            || corner_vertices[0] == corner_vertices[2]
            || corner_vertices[1] == corner_vertices[2]
        {
            dropped_faces += 1;
            continue;
        }

        for corner in 0..3 {
            output.wedge_map[face * 3 + corner] = Some(corner_vertices[corner]);
            output.per_section_indices[material].push(corner_vertices[corner]);
        }
    }

    if dropped_faces > 0 {
        debug!(dropped_faces, "dropped degenerate triangles during welding");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::find_overlapping_wedges;
    use crate::tangents::{compute_tangents, TangentOptions};
    use meshforge_mesh::generators;
    use meshforge_types::constants::THRESH_POINTS_ARE_SAME;

    fn welded_quad() -> WeldOutput {
        let mut mesh = generators::quad(1.0);
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME)
    }

    #[test]
    fn quad_welds_to_four_vertices() {
        let output = welded_quad();
        assert_eq!(output.vertices.len(), 4);
        assert_eq!(output.per_section_indices[0].len(), 6);
        assert!(output.per_section_indices[1..].iter().all(Vec::is_empty));
    }

    #[test]
    fn wedge_map_covers_all_wedges() {
        let output = welded_quad();
        assert_eq!(output.wedge_map.len(), 6);
        assert!(output.wedge_map.iter().all(Option::is_some));
    }

    #[test]
    fn welding_is_idempotent() {
        let a = welded_quad();
        let b = welded_quad();
        assert_eq!(a.vertices.len(), b.vertices.len());
        assert_eq!(a.per_section_indices, b.per_section_indices);
    }

    #[test]
    fn degenerate_face_is_dropped() {
        let mut mesh = generators::quad(1.0);
        // Collapse the second triangle onto a single position.
        let collapse = mesh.wedge_indices[3];
        mesh.wedge_indices[4] = collapse;
        mesh.wedge_indices[5] = collapse;
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        let output = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);
        assert_eq!(output.per_section_indices[0].len(), 3);
        assert!(output.wedge_map[4].is_none());
    }

    #[test]
    fn coincident_corners_with_distinct_uvs_are_dropped() {
        let mut mesh = generators::quad(1.0);
        // Corners 1 and 2 of the second face share a position but keep
        // their original UVs. The attribute mismatch would weld them to
        // distinct vertices, so the positional check alone must reject the
        // face and none of its wedges may emit a vertex.
        mesh.wedge_indices[5] = mesh.wedge_indices[4];
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        let output = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);
        assert_eq!(output.per_section_indices[0].len(), 3);
        assert!(output.wedge_map[3..].iter().all(Option::is_none));
        assert_eq!(output.vertices.len(), 3);
    }

    #[test]
    fn hard_edges_split_vertices() {
        let mut mesh = generators::quad(1.0);
        mesh.face_smoothing_masks = vec![1, 2];
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        compute_tangents(&mut mesh, &overlaps, TangentOptions::default());
        // Give the shared-edge wedges of face 1 a conflicting normal so the
        // weld has to keep them apart.
        for w in 3..6 {
            mesh.wedge_tangent_z[w] = meshforge_math::Vec3::X;
        }
        let output = weld_vertices(&mesh, &overlaps, THRESH_POINTS_ARE_SAME);
        assert!(output.vertices.len() > 4);
    }
}
