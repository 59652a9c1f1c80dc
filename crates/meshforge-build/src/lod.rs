//! Renderable LOD assembly.
//!
//! Takes welded, cache-optimized per-section index streams and produces the
//! final immutable LOD: one shared vertex buffer, one combined index buffer
//! partitioned into sections, and the optional auxiliary index buffers.

use meshforge_math::compare::{points_equal, position_sort_key};
use meshforge_math::BoxSphereBounds;
use meshforge_types::constants::THRESH_POINTS_ARE_SAME;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cacheopt::{optimize_triangle_order, TriangleOrderStrategy};
use crate::vertex::BuildVertex;

/// A contiguous run of the shared index buffer drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub material_index: i32,
    pub first_index: u32,
    pub num_triangles: u32,
    pub min_vertex_index: u32,
    pub max_vertex_index: u32,
}

/// Index storage, 16-bit when every index fits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Packs `indices`, choosing the narrowest width that can hold
    /// `max_vertex_index`.
    pub fn pack(indices: &[u32], max_vertex_index: u32) -> Self {
        if max_vertex_index <= u32::from(u16::MAX) {
            IndexBuffer::U16(indices.iter().map(|&i| i as u16).collect())
        } else {
            IndexBuffer::U32(indices.to_vec())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens the buffer back to 32-bit indices.
    pub fn to_u32_vec(&self) -> Vec<u32> {
        match self {
            IndexBuffer::U16(v) => v.iter().map(|&i| u32::from(i)).collect(),
            IndexBuffer::U32(v) => v.clone(),
        }
    }
}

/// One built LOD. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderableLod {
    pub vertices: Vec<BuildVertex>,
    pub sections: Vec<Section>,
    pub indices: IndexBuffer,
    /// Position-only collapsed indices for depth prepass and shadows.
    pub depth_only_indices: IndexBuffer,
    /// Winding-flipped copy of `indices` for back-face passes.
    pub reversed_indices: Option<IndexBuffer>,
    /// PN-AEN adjacency stream for hardware tessellation.
    pub adjacency_indices: Option<IndexBuffer>,
    /// Surface deviation introduced by reduction, zero for authored LODs.
    pub max_deviation: f32,
}

/// The orchestrator's final product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderData {
    pub lods: Vec<RenderableLod>,
    pub bounds: BoxSphereBounds,
    /// LOD0 wedge-to-final-vertex map, present only when LOD0 was not
    /// produced by reduction. Used to bake per-wedge source data.
    pub wedge_map: Vec<Option<u32>>,
}

/// Concatenates non-empty per-section streams into one combined buffer and
/// records the section table.
pub fn assemble_sections(per_section_indices: &[Vec<u32>]) -> (Vec<u32>, Vec<Section>) {
    let mut combined = Vec::new();
    let mut sections = Vec::new();
    for (material_index, indices) in per_section_indices.iter().enumerate() {
        if indices.is_empty() {
            continue;
        }
        let min = indices.iter().copied().min().unwrap_or(0);
        let max = indices.iter().copied().max().unwrap_or(0);
        sections.push(Section {
            material_index: material_index as i32,
            first_index: combined.len() as u32,
            num_triangles: (indices.len() / 3) as u32,
            min_vertex_index: min,
            max_vertex_index: max,
        });
        combined.extend_from_slice(indices);
    }
    (combined, sections)
}

/// Collapses the combined index buffer onto position-representative
/// vertices for depth-only rendering.
///
/// Every vertex maps to the lowest-numbered vertex sharing its position;
/// the sorted-projection scan uses a widened key window so near-equal keys
/// on either side of the threshold are still compared.
pub fn build_depth_only_indices(
    vertices: &[BuildVertex],
    combined_indices: &[u32],
    strategy: TriangleOrderStrategy,
) -> Vec<u32> {
    let key_window = THRESH_POINTS_ARE_SAME * 4.01;

    let mut vertex_and_key: Vec<(f32, u32)> = vertices
        .iter()
        .enumerate()
        .map(|(i, v)| (position_sort_key(v.position), i as u32))
        .collect();
    vertex_and_key.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    // Representative = lowest vertex index among position duplicates.
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

    // Mappings always point downward, so chase chains to their root in
    // case near-threshold duplicates formed a chain instead of a clique.
    for i in 0..representative.len() {
        let mut root = representative[i];
        while representative[root as usize] != root {
            root = representative[root as usize];
        }
        representative[i] = root;
    }

    let mut depth_indices: Vec<u32> = combined_indices
        .iter()
        .map(|&i| representative[i as usize])
        .collect();
    optimize_triangle_order(depth_indices.as_mut_slice(), strategy);
    depth_indices
}

/// Winding-flipped copy of an index stream.
pub fn build_reversed_indices(indices: &[u32]) -> Vec<u32> {
    let mut reversed = indices.to_vec();
    for triple in reversed.chunks_exact_mut(3) {
        triple.swap(0, 2);
    }
    reversed
}

/// Assembles a [`RenderableLod`] from already-optimized section streams.
pub fn assemble_lod(
    vertices: Vec<BuildVertex>,
    per_section_indices: &[Vec<u32>],
    strategy: TriangleOrderStrategy,
    build_reversed: bool,
    adjacency: Option<Vec<u32>>,
    max_deviation: f32,
) -> RenderableLod {
    let (combined, sections) = assemble_sections(per_section_indices);
    let max_vertex_index = vertices.len().saturating_sub(1) as u32;

    let depth_only = build_depth_only_indices(&vertices, &combined, strategy);
    let reversed = build_reversed.then(|| {
        IndexBuffer::pack(&build_reversed_indices(&combined), max_vertex_index)
    });
    debug!(
        vertices = vertices.len(),
        triangles = combined.len() / 3,
        sections = sections.len(),
        "assembled renderable lod"
    );

    RenderableLod {
        indices: IndexBuffer::pack(&combined, max_vertex_index),
        depth_only_indices: IndexBuffer::pack(&depth_only, max_vertex_index),
        reversed_indices: reversed,
        adjacency_indices: adjacency.map(|a| IndexBuffer::pack(&a, max_vertex_index)),
        vertices,
        sections,
        max_deviation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_math::{Vec2, Vec3};
    use meshforge_types::constants::MAX_TEXCOORDS;

    fn vertex(position: Vec3, normal: Vec3) -> BuildVertex {
        BuildVertex {
            position,
            tangent_x: Vec3::X,
            tangent_y: Vec3::Y,
            tangent_z: normal,
            uvs: [Vec2::ZERO; MAX_TEXCOORDS],
            color: [255; 4],
        }
    }

    #[test]
    fn sections_skip_empty_slots() {
        let mut per_section = vec![Vec::new(); 4];
        per_section[1] = vec![0, 1, 2];
        per_section[3] = vec![2, 1, 3, 3, 1, 0];
        let (combined, sections) = assemble_sections(&per_section);
        assert_eq!(combined.len(), 9);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].material_index, 1);
        assert_eq!(sections[1].material_index, 3);
        assert_eq!(sections[1].first_index, 3);
        assert_eq!(sections[1].num_triangles, 2);
        assert_eq!(sections[1].min_vertex_index, 0);
        assert_eq!(sections[1].max_vertex_index, 3);
    }

    #[test]
    fn depth_only_collapses_position_duplicates() {
        // Vertices 0 and 2 share a position but differ in normal.
        let vertices = vec![
            vertex(Vec3::ZERO, Vec3::Z),
            vertex(Vec3::X, Vec3::Z),
            vertex(Vec3::ZERO, Vec3::X),
            vertex(Vec3::Y, Vec3::Z),
        ];
        let combined = vec![0, 1, 3, 2, 3, 1];
        let depth =
            build_depth_only_indices(&vertices, &combined, TriangleOrderStrategy::Preserve);
        assert_eq!(depth, vec![0, 1, 3, 0, 3, 1]);
    }

    #[test]
    fn reversed_swaps_winding() {
        assert_eq!(build_reversed_indices(&[0, 1, 2, 3, 4, 5]), vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn index_width_follows_max_vertex() {
        assert!(matches!(IndexBuffer::pack(&[0, 1, 2], 2), IndexBuffer::U16(_)));
        assert!(matches!(
            IndexBuffer::pack(&[0, 1, 70_000], 70_000),
            IndexBuffer::U32(_)
        ));
    }
}
