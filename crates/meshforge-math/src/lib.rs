//! # meshforge-math
//!
//! Linear algebra primitives for the meshforge build pipeline.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec2`, `Vec3`, etc.)
//! - Threshold-based approximate comparisons for positions, normals and UVs
//! - Orthonormal basis construction (Gram-Schmidt)
//! - Axis-aligned bounding box and box/sphere bounds

pub mod basis;
pub mod bounds;
pub mod compare;

pub use bounds::{Aabb, BoxSphereBounds};

// Re-export glam types as the canonical math types for meshforge.
pub use glam::{IVec3, Mat3, Mat4, Vec2, Vec3, Vec4};
