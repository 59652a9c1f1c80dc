//! Vertex-cache optimization.
//!
//! Reorders triangle index lists so vertices are revisited while still hot
//! in the GPU's post-transform cache, then renumbers vertices in first-use
//! order for pre-transform fetch locality. Only triangle order changes;
//! the triangle multiset and winding are preserved.

use std::collections::HashMap;

use meshforge_types::constants::VERTEX_CACHE_SIZE;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::vertex::BuildVertex;

/// How triangle indices are ordered before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangleOrderStrategy {
    /// Greedy strip walker, emitted as a plain triangle list.
    StripList,
    /// Greedy per-vertex cache scoring with a simulated FIFO cache.
    #[default]
    CacheAwareScore,
    /// Leave the input order untouched.
    Preserve,
}

/// Index widths the optimizer accepts.
pub trait IndexType: Copy + Eq + std::hash::Hash {
    fn from_u32(value: u32) -> Self;
    fn as_u32(self) -> u32;
}

impl IndexType for u16 {
    fn from_u32(value: u32) -> Self {
        value as u16
    }
    fn as_u32(self) -> u32 {
        u32::from(self)
    }
}

impl IndexType for u32 {
    fn from_u32(value: u32) -> Self {
        value
    }
    fn as_u32(self) -> u32 {
        self
    }
}

/// Reorders the triangles of `indices` in place per `strategy`.
pub fn optimize_triangle_order<I: IndexType>(indices: &mut [I], strategy: TriangleOrderStrategy) {
    if indices.len() < 3 {
        return;
    }
    match strategy {
        TriangleOrderStrategy::StripList => strip_order(indices),
        TriangleOrderStrategy::CacheAwareScore => forsyth_order(indices),
        TriangleOrderStrategy::Preserve => {}
    }
}

// Scoring constants from Forsyth's linear-speed optimizer.
const CACHE_DECAY_POWER: f32 = 1.5;
const LAST_TRI_SCORE: f32 = 0.75;
const VALENCE_BOOST_SCALE: f32 = 2.0;
const VALENCE_BOOST_POWER: f32 = 0.5;

#[derive(Clone, Copy, Default)]
struct VertexState {
    cache_position: i32,
    score: f32,
    /// Triangles not yet emitted that still reference this vertex.
    active_triangles: u32,
    list_offset: u32,
}

fn vertex_score(state: &VertexState) -> f32 {
    if state.active_triangles == 0 {
        return -1.0;
    }
    let mut score = match state.cache_position {
        p if p < 0 => 0.0,
        // The three most recent entries came from the same triangle, so
        // they share a fixed score to avoid re-emitting thin fans.
        p if p < 3 => LAST_TRI_SCORE,
        p => {
            let scaler = 1.0 / (VERTEX_CACHE_SIZE as f32 - 3.0);
            let fade = 1.0 - (p as f32 - 3.0) * scaler;
            fade.max(0.0).powf(CACHE_DECAY_POWER)
        }
    };
    // Favor lone vertices so they get retired early.
    score += VALENCE_BOOST_SCALE * (state.active_triangles as f32).powf(-VALENCE_BOOST_POWER);
    score
}

/// Tom Forsyth's greedy cache-aware triangle ordering.
fn forsyth_order<I: IndexType>(indices: &mut [I]) {
    let num_triangles = indices.len() / 3;
    let num_vertices = indices
        .iter()
        .map(|i| i.as_u32() as usize + 1)
        .max()
        .unwrap_or(0);

    let mut vertices = vec![VertexState::default(); num_vertices];
    for index in indices.iter() {
        vertices[index.as_u32() as usize].active_triangles += 1;
    }

    // Flattened per-vertex triangle adjacency lists.
    let mut offset = 0u32;
    for vertex in &mut vertices {
        vertex.list_offset = offset;
        offset += vertex.active_triangles;
        vertex.active_triangles = 0;
        vertex.cache_position = -1;
    }
    let mut triangle_lists = vec![0u32; offset as usize];
    for (tri, triple) in indices.chunks_exact(3).enumerate() {
        for index in triple {
            let vertex = &mut vertices[index.as_u32() as usize];
            triangle_lists[(vertex.list_offset + vertex.active_triangles) as usize] = tri as u32;
            vertex.active_triangles += 1;
        }
    }
    for vertex in &mut vertices {
        vertex.score = vertex_score(vertex);
    }

    let mut triangle_score = vec![0.0f32; num_triangles];
    let mut triangle_emitted = vec![false; num_triangles];
    for tri in 0..num_triangles {
        triangle_score[tri] = (0..3)
            .map(|c| vertices[indices[tri * 3 + c].as_u32() as usize].score)
            .sum();
    }

    // LRU cache with three slack entries for the incoming triangle.
    let mut cache: Vec<u32> = Vec::with_capacity(VERTEX_CACHE_SIZE + 3);
    let mut output = Vec::with_capacity(indices.len());
    let mut scan_cursor = 0usize;

    for _ in 0..num_triangles {
        // Best candidate among triangles touching cached vertices, with a
        // full-scan fallback for disconnected components.
        let mut best_triangle = None;
        let mut best_score = f32::MIN;
        for &cached in &cache {
            let vertex = &vertices[cached as usize];
            let start = vertex.list_offset as usize;
            for &tri in &triangle_lists[start..start + vertex.active_triangles as usize] {
                let tri = tri as usize;
                if !triangle_emitted[tri] && triangle_score[tri] > best_score {
                    best_score = triangle_score[tri];
                    best_triangle = Some(tri);
                }
            }
        }
        let best_triangle = best_triangle.unwrap_or_else(|| {
            while triangle_emitted[scan_cursor] {
                scan_cursor += 1;
            }
            scan_cursor
        });

        triangle_emitted[best_triangle] = true;
        let corners = [
            indices[best_triangle * 3].as_u32(),
            indices[best_triangle * 3 + 1].as_u32(),
            indices[best_triangle * 3 + 2].as_u32(),
        ];
        for &corner in &corners {
            output.push(I::from_u32(corner));
            let vertex = &mut vertices[corner as usize];
            // Remove the emitted triangle from the adjacency list.
            let start = vertex.list_offset as usize;
            let len = vertex.active_triangles as usize;
            if let Some(pos) = triangle_lists[start..start + len]
                .iter()
                .position(|&t| t as usize == best_triangle)
            {
                triangle_lists.swap(start + pos, start + len - 1);
                vertex.active_triangles -= 1;
            }
            // Move to the front of the cache.
            cache.retain(|&v| v != corner);
            cache.insert(0, corner);
        }

        // Evict overflow and rescore everything whose position changed.
        while cache.len() > VERTEX_CACHE_SIZE {
            let evicted = cache.pop().unwrap_or_default();
            vertices[evicted as usize].cache_position = -1;
        }
        for (position, &cached) in cache.iter().enumerate() {
            vertices[cached as usize].cache_position = position as i32;
        }
        let mut rescore: Vec<u32> = cache.clone();
        rescore.extend_from_slice(&corners);
        rescore.sort_unstable();
        rescore.dedup();
        for &vertex_index in &rescore {
            let vertex = &mut vertices[vertex_index as usize];
            let old_score = vertex.score;
            vertex.score = vertex_score(vertex);
            let delta = vertex.score - old_score;
            let start = vertex.list_offset as usize;
            let len = vertex.active_triangles as usize;
            for &tri in &triangle_lists[start..start + len] {
                triangle_score[tri as usize] += delta;
            }
        }
    }

    indices.copy_from_slice(&output);
}

/// Greedy edge-adjacency walk emitted as a plain triangle list.
///
/// Produces the triangle order a strip generator would visit, without the
/// degenerate stitching an actual strip primitive needs.
fn strip_order<I: IndexType>(indices: &mut [I]) {
    let num_triangles = indices.len() / 3;
    let mut edge_to_triangles: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
    for (tri, triple) in indices.chunks_exact(3).enumerate() {
        for corner in 0..3 {
            let a = triple[corner].as_u32();
            let b = triple[(corner + 1) % 3].as_u32();
            let edge = (a.min(b), a.max(b));
            edge_to_triangles.entry(edge).or_default().push(tri as u32);
        }
    }

    let mut emitted = vec![false; num_triangles];
    let mut order = Vec::with_capacity(num_triangles);
    let mut scan_cursor = 0usize;
    while order.len() < num_triangles {
        while emitted[scan_cursor] {
            scan_cursor += 1;
        }
        let mut current = scan_cursor;
        emitted[current] = true;
        order.push(current);

        // Follow shared edges for as long as an unvisited neighbor exists.
        'walk: loop {
            for corner in 0..3 {
                let a = indices[current * 3 + corner].as_u32();
                let b = indices[current * 3 + (corner + 1) % 3].as_u32();
                let edge = (a.min(b), a.max(b));
                if let Some(neighbors) = edge_to_triangles.get(&edge) {
                    for &neighbor in neighbors {
                        let neighbor = neighbor as usize;
                        if !emitted[neighbor] {
                            emitted[neighbor] = true;
                            order.push(neighbor);
                            current = neighbor;
                            continue 'walk;
                        }
                    }
                }
            }
            break;
        }
    }

    let source: Vec<I> = indices.to_vec();
    for (slot, &tri) in order.iter().enumerate() {
        for corner in 0..3 {
            indices[slot * 3 + corner] = source[tri * 3 + corner];
        }
    }
}

/// Cache-optimizes every section and renumbers vertices in first-use order.
///
/// Sections are visited in slot order, so the final vertex buffer is laid
/// out in the same order the combined index buffer first touches each
/// vertex. `wedge_map` entries are rewritten to the new numbering.
pub fn cache_optimize_vertex_and_index_buffer(
    vertices: &mut Vec<BuildVertex>,
    per_section_indices: &mut [Vec<u32>],
    wedge_map: &mut [Option<u32>],
    strategy: TriangleOrderStrategy,
) {
    if vertices.is_empty() {
        return;
    }
    for indices in per_section_indices.iter_mut() {
        optimize_triangle_order(indices.as_mut_slice(), strategy);
    }

    // First-use renumbering across sections.
    let mut old_to_new: Vec<Option<u32>> = vec![None; vertices.len()];
    let mut next = 0u32;
    for indices in per_section_indices.iter_mut() {
        for index in indices.iter_mut() {
            let slot = &mut old_to_new[*index as usize];
            let new_index = *slot.get_or_insert_with(|| {
                let assigned = next;
                next += 1;
                assigned
            });
            *index = new_index;
        }
    }

    // Physically reorder the vertex buffer to match.
    let mut reordered = vec![vertices[0]; next as usize];
    for (old, mapping) in old_to_new.iter().enumerate() {
        if let Some(new) = mapping {
            reordered[*new as usize] = vertices[old];
        }
    }
    trace!(
        vertices_before = vertices.len(),
        vertices_after = reordered.len(),
        "coherent re-index"
    );
    *vertices = reordered;

    for entry in wedge_map.iter_mut() {
        if let Some(old) = *entry {
            *entry = old_to_new[old as usize];
        }
    }
}
