//! Axis-aligned bounding boxes and box/sphere bounds.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// An empty box that grows to fit the first point added.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Builds the tightest box containing all `points`.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.add(p);
        }
        aabb
    }

    /// Grows the box to contain `p`.
    #[inline]
    pub fn add(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grows the box to contain another box.
    #[inline]
    pub fn union(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size on each axis.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Clipped segment/box intersection test.
    ///
    /// Returns true if the segment `start + t * dir`, `t` in `[0, 1]`,
    /// passes through the box.
    pub fn intersects_segment(&self, start: Vec3, dir: Vec3) -> bool {
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;
        for axis in 0..3 {
            let d = dir[axis];
            let s = start[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < f32::EPSILON {
                if s < lo || s > hi {
                    return false;
                }
            } else {
                let inv = 1.0 / d;
                let mut t0 = (lo - s) * inv;
                let mut t1 = (hi - s) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return false;
                }
            }
        }
        true
    }
}

/// A bounding box paired with a bounding sphere centered on the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSphereBounds {
    /// Center of the box and sphere.
    pub origin: Vec3,
    /// Half-size of the box on each axis.
    pub box_extent: Vec3,
    /// Radius of the sphere.
    pub sphere_radius: f32,
}

impl BoxSphereBounds {
    /// Computes bounds from a point set. The sphere is centered on the box
    /// center, radius the max distance to any point.
    pub fn from_points(points: &[Vec3]) -> Self {
        let aabb = Aabb::from_points(points.iter().copied());
        if aabb.is_empty() {
            return Self {
                origin: Vec3::ZERO,
                box_extent: Vec3::ZERO,
                sphere_radius: 0.0,
            };
        }
        let origin = aabb.center();
        let mut radius = 0.0f32;
        for &p in points {
            radius = radius.max((p - origin).length());
        }
        Self {
            origin,
            box_extent: aabb.extent(),
            sphere_radius: radius,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.origin - self.box_extent, self.origin + self.box_extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_grows_to_fit() {
        let aabb = Aabb::from_points([Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 0.0)]);
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn default_box_is_empty() {
        let aabb = Aabb::default();
        assert!(aabb.is_empty());
        let mut grown = aabb;
        grown.add(Vec3::ONE);
        assert_eq!(grown.min, Vec3::ONE);
        assert_eq!(grown.max, Vec3::ONE);
    }

    #[test]
    fn segment_hits_box() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let start = Vec3::new(-5.0, 0.0, 0.0);
        let dir = Vec3::new(10.0, 0.0, 0.0);
        assert!(aabb.intersects_segment(start, dir));
        let miss_start = Vec3::new(-5.0, 10.0, 0.0);
        assert!(!aabb.intersects_segment(miss_start, dir));
    }

    #[test]
    fn sphere_contains_all_points() {
        let points = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0)];
        let bounds = BoxSphereBounds::from_points(&points);
        for p in points {
            assert!((p - bounds.origin).length() <= bounds.sphere_radius + 1e-5);
        }
    }
}
