//! Bounding-volume hierarchy for segment/triangle queries.

use meshforge_math::{Aabb, Vec3};
use meshforge_types::constants::SMALL_NUMBER;

/// One occluding triangle with its precomputed geometric normal.
#[derive(Debug, Clone, Copy)]
pub struct BvhTriangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub normal: Vec3,
}

impl BvhTriangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self {
            v0,
            v1,
            v2,
            normal: (v1 - v2).cross(v0 - v2),
        }
    }

    fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    fn aabb(&self) -> Aabb {
        Aabb::from_points([self.v0, self.v1, self.v2])
    }

    /// Möller–Trumbore segment/triangle intersection; returns the segment
    /// parameter in `[0, 1]` on hit.
    fn intersect_segment(&self, start: Vec3, dir: Vec3) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let p = dir.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < SMALL_NUMBER {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = start - self.v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (0.0..=1.0).contains(&t).then_some(t)
    }
}

/// The closest intersection along a segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentHit {
    /// Segment parameter of the closest hit, in `[0, 1]`.
    pub t: f32,
    /// The hit triangle faced away from the segment origin.
    pub back_face: bool,
}

#[derive(Debug, Clone)]
enum BvhNode {
    /// Children are stored immediately after this node; `right` is the
    /// index of the second child.
    Internal { aabb: Aabb, right: u32 },
    Leaf { aabb: Aabb, start: u32, count: u32 },
}

const LEAF_SIZE: usize = 4;

/// A binary BVH over triangles, median-split on the widest centroid axis.
///
/// Read-only after construction, so it can be shared freely across worker
/// threads during voxelization.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<BvhTriangle>,
}

impl TriangleBvh {
    pub fn build(mut triangles: Vec<BvhTriangle>) -> Self {
        let mut nodes = Vec::new();
        if !triangles.is_empty() {
            let count = triangles.len();
            build_node(&mut nodes, &mut triangles, 0, count);
        }
        Self { nodes, triangles }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Finds the closest triangle intersection along `start + t * dir`,
    /// `t` in `[0, 1]`.
    pub fn intersect_segment(&self, start: Vec3, dir: Vec3) -> Option<SegmentHit> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut closest: Option<SegmentHit> = None;
        let mut stack = vec![0usize];
        while let Some(node_index) = stack.pop() {
            match &self.nodes[node_index] {
                BvhNode::Internal { aabb, right } => {
                    if aabb.intersects_segment(start, dir) {
                        stack.push(node_index + 1);
                        stack.push(*right as usize);
                    }
                }
                BvhNode::Leaf { aabb, start: first, count } => {
                    if !aabb.intersects_segment(start, dir) {
                        continue;
                    }
                    let range = *first as usize..(*first + *count) as usize;
                    for triangle in &self.triangles[range] {
                        if let Some(t) = triangle.intersect_segment(start, dir) {
                            if closest.map_or(true, |hit| t < hit.t) {
                                closest = Some(SegmentHit {
                                    t,
                                    back_face: dir.dot(triangle.normal) > 0.0,
                                });
                            }
                        }
                    }
                }
            }
        }
        closest
    }
}

/// Recursively builds the subtree for `triangles[start..start + count]`,
/// returning its node index.
fn build_node(
    nodes: &mut Vec<BvhNode>,
    triangles: &mut [BvhTriangle],
    start: usize,
    count: usize,
) -> usize {
    let slice = &triangles[start..start + count];
    let mut aabb = Aabb::EMPTY;
    for triangle in slice {
        aabb.union(&triangle.aabb());
    }

    let node_index = nodes.len();
    if count <= LEAF_SIZE {
        nodes.push(BvhNode::Leaf {
            aabb,
            start: start as u32,
            count: count as u32,
        });
        return node_index;
    }

    // Split at the centroid median of the widest axis.
    let centroid_bounds = Aabb::from_points(slice.iter().map(|t| t.centroid()));
    let size = centroid_bounds.size();
    let axis = if size.x >= size.y && size.x >= size.z {
        0
    } else if size.y >= size.z {
        1
    } else {
        2
    };
    let mid = count / 2;
    triangles[start..start + count]
        .select_nth_unstable_by(mid, |a, b| a.centroid()[axis].total_cmp(&b.centroid()[axis]));

    nodes.push(BvhNode::Internal { aabb, right: 0 });
    build_node(nodes, triangles, start, mid);
    let right = build_node(nodes, triangles, start + mid, count - mid);
    if let BvhNode::Internal { right: slot, .. } = &mut nodes[node_index] {
        *slot = right as u32;
    }
    node_index
}
