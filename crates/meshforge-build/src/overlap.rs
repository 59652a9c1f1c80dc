//! Spatial overlap index over wedge positions.
//!
//! Maps every wedge to the set of other wedges whose resolved positions
//! coincide within a tolerance. Built once per mesh and reused by both
//! tangent synthesis and vertex welding.

use std::collections::HashMap;

use meshforge_math::compare::{points_equal, position_sort_key};
use meshforge_mesh::RawMesh;

/// A symmetric multimap from wedge index to overlapping wedge indices.
///
/// An index is never connected to itself; callers that need "I count as my
/// own duplicate" semantics add the self edge explicitly.
#[derive(Debug, Clone, Default)]
pub struct OverlapMap {
    map: HashMap<u32, Vec<u32>>,
}

impl OverlapMap {
    /// Adds the bidirectional edge `(a, b)`.
    fn add_symmetric(&mut self, a: u32, b: u32) {
        self.map.entry(a).or_default().push(b);
        self.map.entry(b).or_default().push(a);
    }

    /// Sorts every neighbor list ascending. Deterministic iteration order
    /// matters: the welder's canonical-representative choice depends on it.
    fn finalize(&mut self) {
        for neighbors in self.map.values_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
    }

    /// Returns the wedges overlapping `wedge`, sorted ascending.
    pub fn overlaps(&self, wedge: u32) -> &[u32] {
        self.map.get(&wedge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of wedges that have at least one overlap.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Builds the overlap map for all wedges of `mesh`.
///
/// Every wedge position is projected to a scalar sort key; after sorting,
/// only a forward window whose keys lie within `threshold` needs to be
/// scanned. The true acceptance test is per-axis absolute difference, not
/// Euclidean distance. A `threshold` of zero means exact matches only.
pub fn find_overlapping_wedges(mesh: &RawMesh, threshold: f32) -> OverlapMap {
    let num_wedges = mesh.wedge_count();

    // Sort wedges by projected key so duplicates end up adjacent.
    let mut wedge_and_key: Vec<(f32, u32)> = (0..num_wedges)
        .map(|w| (position_sort_key(mesh.wedge_position(w)), w as u32))
        .collect();
    wedge_and_key.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut overlaps = OverlapMap::default();
    for i in 0..wedge_and_key.len() {
        let (key_i, wedge_i) = wedge_and_key[i];
        // Only search forward; edges are added both ways.
        for &(key_j, wedge_j) in &wedge_and_key[i + 1..] {
            if key_j - key_i > threshold {
                break; // can't be any more duplicates
            }
            let a = mesh.wedge_position(wedge_i as usize);
            let b = mesh.wedge_position(wedge_j as usize);
            if points_equal(a, b, threshold) {
                overlaps.add_symmetric(wedge_i, wedge_j);
            }
        }
    }
    overlaps.finalize();
    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_mesh::generators;
    use meshforge_types::constants::THRESH_POINTS_ARE_SAME;

    #[test]
    fn quad_shared_corners_overlap() {
        let mesh = generators::quad(1.0);
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        // The diagonal's two vertices each appear in both triangles.
        for (a, b) in [(0u32, 3u32), (1, 5)] {
            assert_eq!(
                mesh.wedge_position(a as usize),
                mesh.wedge_position(b as usize)
            );
            assert!(overlaps.overlaps(a).contains(&b));
            assert!(overlaps.overlaps(b).contains(&a));
        }
    }

    #[test]
    fn zero_threshold_still_matches_identical_positions() {
        let mesh = generators::quad(1.0);
        let overlaps = find_overlapping_wedges(&mesh, 0.0);
        assert!(overlaps.overlaps(0).contains(&3));
    }

    #[test]
    fn no_self_edges() {
        let mesh = generators::grid(2, 2, 1.0);
        let overlaps = find_overlapping_wedges(&mesh, THRESH_POINTS_ARE_SAME);
        for w in 0..mesh.wedge_count() as u32 {
            assert!(!overlaps.overlaps(w).contains(&w));
        }
    }
}
