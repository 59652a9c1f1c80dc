//! Numeric thresholds and pipeline defaults.

/// Two positions within this distance on every axis are the same point.
pub const THRESH_POINTS_ARE_SAME: f32 = 0.00002;

/// Two unit vectors within this distance on every axis are the same normal.
pub const THRESH_NORMALS_ARE_SAME: f32 = 0.00002;

/// Two texture coordinates within this distance on each axis are equal.
pub const THRESH_UVS_ARE_SAME: f32 = 1.0 / 1024.0;

/// Generic tiny epsilon for singularity checks.
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// Looser epsilon for geometric classification (plane detection, etc.).
pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Maximum number of texture coordinate channels carried per wedge.
pub const MAX_TEXCOORDS: usize = 8;

/// Highest material index a face may reference.
pub const MAX_MATERIAL_INDEX: i32 = 64;

/// Simulated post-transform cache size for the cache-aware triangle order.
pub const VERTEX_CACHE_SIZE: usize = 32;

/// Target number of distance-field sample rays per voxel.
pub const NUM_VOXEL_DISTANCE_SAMPLES: usize = 1200;

/// Distance-field voxel density per local-space unit at resolution scale 1.
pub const VOXELS_PER_LOCAL_SPACE_UNIT: f32 = 0.1;

/// Minimum distance-field voxel count on one axis.
pub const MIN_VOXELS_ONE_DIM: usize = 8;

/// Maximum voxel count on one axis for default-resolution meshes.
pub const MAX_VOXELS_ONE_DIM_DEFAULT: usize = 64;

/// Maximum voxel count on one axis when an explicit scale above 1 is set.
pub const MAX_VOXELS_ONE_DIM_SCALED: usize = 128;
