//! # meshforge-distfield
//!
//! Builds a signed distance field volume around a renderable mesh by
//! casting a fixed stratified set of rays from every voxel center against a
//! bounding-volume hierarchy over the mesh's occluding triangles. Voxels
//! whose rays mostly hit triangle back faces are classified as inside.

pub mod bvh;
pub mod samples;
pub mod voxelize;

pub use bvh::TriangleBvh;
pub use voxelize::{
    generate_distance_field_volume, DistanceFieldSettings, DistanceFieldVolume,
};
