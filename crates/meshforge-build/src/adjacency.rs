//! PN-AEN adjacency index buffer for hardware tessellation.
//!
//! Emits twelve indices per triangle: the three corners, the neighboring
//! triangle's vertex pair for each edge (so the hull shader can average
//! crack-free edge control points across UV seams), and the dominant
//! position-duplicate for each corner.

use std::collections::HashMap;

use meshforge_math::compare::{points_equal, position_sort_key};
use meshforge_types::constants::THRESH_POINTS_ARE_SAME;

use crate::vertex::BuildVertex;

/// Lowest-index representative per position-duplicate group.
fn position_representatives(vertices: &[BuildVertex]) -> Vec<u32> {
    let key_window = THRESH_POINTS_ARE_SAME * 4.01;
    let mut vertex_and_key: Vec<(f32, u32)> = vertices
        .iter()
        .enumerate()
        .map(|(i, v)| (position_sort_key(v.position), i as u32))
        .collect();
    vertex_and_key.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut representative: Vec<u32> = (0..vertices.len() as u32).collect();
    for i in 0..vertex_and_key.len() {
        let (key_i, vertex_i) = vertex_and_key[i];
        for &(key_j, vertex_j) in &vertex_and_key[i + 1..] {
            if key_j - key_i > key_window {
                break;
            }
            if points_equal(
                vertices[vertex_i as usize].position,
                vertices[vertex_j as usize].position,
                THRESH_POINTS_ARE_SAME,
            ) {
                let (low, high) = if vertex_i < vertex_j {
                    (vertex_i, vertex_j)
                } else {
                    (vertex_j, vertex_i)
                };
                let target = &mut representative[high as usize];
                *target = (*target).min(low);
            }
        }
    }
    for i in 0..representative.len() {
        let mut root = representative[i];
        while representative[root as usize] != root {
            root = representative[root as usize];
        }
        representative[i] = root;
    }
    representative
}

/// Builds the 12-indices-per-triangle PN-AEN stream for `indices`.
pub fn build_adjacency_indices(vertices: &[BuildVertex], indices: &[u32]) -> Vec<u32> {
    let representative = position_representatives(vertices);
    let rep = |v: u32| representative[v as usize];

    // First triangle to own each directed position-space edge, keyed by
    // representatives but remembering the actual endpoint indices.
    let mut edge_owners: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
    for triple in indices.chunks_exact(3) {
        for corner in 0..3 {
            let a = triple[corner];
            let b = triple[(corner + 1) % 3];
            edge_owners.entry((rep(a), rep(b))).or_insert((a, b));
        }
    }

    let mut adjacency = Vec::with_capacity(indices.len() * 4);
    for triple in indices.chunks_exact(3) {
        adjacency.extend_from_slice(triple);
        for corner in 0..3 {
            let a = triple[corner];
            let b = triple[(corner + 1) % 3];
            // The neighbor traverses this edge in the opposite direction;
            // emit its endpoints reordered to match ours.
            match edge_owners.get(&(rep(b), rep(a))) {
                Some(&(nb, na)) => {
                    adjacency.push(na);
                    adjacency.push(nb);
                }
                None => {
                    adjacency.push(a);
                    adjacency.push(b);
                }
            }
        }
        for corner in 0..3 {
            adjacency.push(rep(triple[corner]));
        }
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_math::{Vec2, Vec3};
    use meshforge_types::constants::MAX_TEXCOORDS;

    fn vertex(position: Vec3) -> BuildVertex {
        BuildVertex {
            position,
            tangent_x: Vec3::X,
            tangent_y: Vec3::Y,
            tangent_z: Vec3::Z,
            uvs: [Vec2::ZERO; MAX_TEXCOORDS],
            color: [255; 4],
        }
    }

    #[test]
    fn twelve_indices_per_triangle() {
        let vertices = vec![
            vertex(Vec3::ZERO),
            vertex(Vec3::X),
            vertex(Vec3::Y),
            vertex(Vec3::new(1.0, 1.0, 0.0)),
        ];
        let indices = vec![0, 1, 2, 1, 3, 2];
        let adjacency = build_adjacency_indices(&vertices, &indices);
        assert_eq!(adjacency.len(), 24);
        // Triangle 0's edge (1,2) is shared with triangle 1's edge (2,1).
        assert_eq!(&adjacency[0..3], &[0, 1, 2]);
        assert_eq!(&adjacency[5..7], &[1, 2]);
        // Boundary edges point back at themselves.
        assert_eq!(&adjacency[3..5], &[0, 1]);
    }

    #[test]
    fn uv_split_corners_share_a_dominant_vertex() {
        // Vertices 1 and 3 occupy the same position (a UV seam split).
        let vertices = vec![
            vertex(Vec3::ZERO),
            vertex(Vec3::X),
            vertex(Vec3::Y),
            vertex(Vec3::X),
            vertex(Vec3::new(2.0, 0.0, 0.0)),
        ];
        let indices = vec![0, 1, 2, 3, 4, 2];
        let adjacency = build_adjacency_indices(&vertices, &indices);
        // Second triangle's dominant corner set maps vertex 3 back to 1.
        assert_eq!(&adjacency[21..24], &[1, 4, 2]);
    }
}
