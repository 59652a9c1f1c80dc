//! The signed-distance voxelizer.

use std::time::Instant;

use half::f16;
use meshforge_build::lod::RenderableLod;
use meshforge_math::{Aabb, BoxSphereBounds, IVec3, Vec3};
use meshforge_types::constants::{
    KINDA_SMALL_NUMBER, MAX_VOXELS_ONE_DIM_DEFAULT, MAX_VOXELS_ONE_DIM_SCALED,
    MIN_VOXELS_ONE_DIM, VOXELS_PER_LOCAL_SPACE_UNIT,
};
use meshforge_types::BlendMode;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bvh::{BvhTriangle, TriangleBvh};
use crate::samples::sphere_sample_directions;

/// Generation parameters for one distance field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceFieldSettings {
    /// Scales voxel density; `<= 0` disables generation entirely.
    pub resolution_scale: f32,
    /// Treat every triangle as two-sided: no voxel is ever classified as
    /// inside, the field stays positive.
    pub treat_as_two_sided: bool,
}

impl Default for DistanceFieldSettings {
    fn default() -> Self {
        Self {
            resolution_scale: 1.0,
            treat_as_two_sided: false,
        }
    }
}

/// A signed distance field over an expanded bounding box of the mesh.
/// Distances are normalized by the box's maximum half-extent and stored in
/// half precision, scanline order x, then y, then z.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistanceFieldVolume {
    pub dimensions: IVec3,
    pub local_bounds: Aabb,
    pub distances: Vec<f16>,
    /// False when a border voxel came out negative, which means rays leaked
    /// through open geometry and the volume was discarded.
    pub mesh_was_closed: bool,
    /// The mesh was detected as a flat plane and flattened to `z == 0`.
    pub mesh_was_plane: bool,
    pub built_as_if_two_sided: bool,
}

impl DistanceFieldVolume {
    fn empty() -> Self {
        Self {
            local_bounds: Aabb::EMPTY,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// The stored distance at a voxel coordinate.
    pub fn distance_at(&self, x: i32, y: i32, z: i32) -> f32 {
        let index = ((z * self.dimensions.y + y) * self.dimensions.x + x) as usize;
        self.distances[index].to_f32()
    }
}

/// Collects the occluding triangles: sections whose material is opaque or
/// masked. Translucent sections never contribute occlusion.
fn gather_occluder_triangles(
    lod: &RenderableLod,
    material_blend_modes: &[BlendMode],
    flatten_z: bool,
) -> Vec<BvhTriangle> {
    let indices = lod.indices.to_u32_vec();
    let mut triangles = Vec::new();
    for section in &lod.sections {
        let blend = material_blend_modes
            .get(section.material_index as usize)
            .copied()
            .unwrap_or(BlendMode::Opaque);
        if blend.is_translucent() {
            continue;
        }
        let first = section.first_index as usize;
        let last = first + section.num_triangles as usize * 3;
        for triple in indices[first..last].chunks_exact(3) {
            let corner = |i: usize| {
                let mut p = lod.vertices[triple[i] as usize].position;
                if flatten_z {
                    p.z = 0.0;
                }
                p
            };
            triangles.push(BvhTriangle::new(corner(0), corner(1), corner(2)));
        }
    }
    triangles
}

/// Voxelizes `lod` into a signed distance field.
///
/// Every voxel center casts the fixed stratified direction set against the
/// BVH; a voxel is inside when more than half of its hitting rays struck a
/// back face (or more than 95% when the surface passes through the voxel).
/// A negative distance on the volume border means the mesh leaks, and the
/// whole volume is discarded.
pub fn generate_distance_field_volume(
    lod: &RenderableLod,
    material_blend_modes: &[BlendMode],
    bounds: &BoxSphereBounds,
    settings: &DistanceFieldSettings,
) -> DistanceFieldVolume {
    if settings.resolution_scale <= 0.0 {
        return DistanceFieldVolume::empty();
    }
    let started = Instant::now();

    // A mesh that is essentially a z=0 plane gets flattened exactly, so
    // runtime non-uniform z scaling cannot introduce artifacts.
    let mesh_bounds = bounds.aabb();
    let size = mesh_bounds.size();
    let mesh_was_plane = size.z * 100.0 < size.x.max(size.y)
        && mesh_bounds.center().z.abs() < size.z + KINDA_SMALL_NUMBER;

    let triangles = gather_occluder_triangles(lod, material_blend_modes, mesh_was_plane);
    if triangles.is_empty() {
        return DistanceFieldVolume::empty();
    }
    let bvh = TriangleBvh::build(triangles);
    let directions = sphere_sample_directions();

    // Pad the box so the field has usable gradient at the surface.
    let mut volume_bounds = mesh_bounds;
    if mesh_was_plane {
        volume_bounds.min.z = 0.0;
        volume_bounds.max.z = 0.0;
    }
    let margin = volume_bounds.extent().max_element() * 0.2;
    volume_bounds.min -= Vec3::splat(margin);
    volume_bounds.max += Vec3::splat(margin);

    let max_per_axis = if settings.resolution_scale > 1.0 {
        MAX_VOXELS_ONE_DIM_SCALED
    } else {
        MAX_VOXELS_ONE_DIM_DEFAULT
    } as i32;
    let min_per_axis = MIN_VOXELS_ONE_DIM as i32;
    let voxels_per_unit = VOXELS_PER_LOCAL_SPACE_UNIT * settings.resolution_scale;
    let volume_size = volume_bounds.size();
    let dimensions = IVec3::new(
        ((volume_size.x * voxels_per_unit).round() as i32).clamp(min_per_axis, max_per_axis),
        ((volume_size.y * voxels_per_unit).round() as i32).clamp(min_per_axis, max_per_axis),
        ((volume_size.z * voxels_per_unit).round() as i32).clamp(min_per_axis, max_per_axis),
    );
    let voxel_size = volume_size / dimensions.as_vec3();
    let voxel_diameter_sq = voxel_size.length_squared();
    let ray_extent = volume_size.length();
    let distance_scale = 1.0 / volume_bounds.extent().max_element();
    let two_sided = settings.treat_as_two_sided;

    let slice_len = (dimensions.x * dimensions.y) as usize;
    let mut distances = vec![f16::ZERO; slice_len * dimensions.z as usize];

    // The BVH and direction table are read-only shared state; each worker
    // owns one disjoint z slice of the output.
    distances
        .par_chunks_mut(slice_len)
        .enumerate()
        .for_each(|(z, slice)| {
            for y in 0..dimensions.y {
                for x in 0..dimensions.x {
                    let voxel = Vec3::new(x as f32, y as f32, z as f32);
                    let position = volume_bounds.min + (voxel + Vec3::splat(0.5)) * voxel_size;

                    let mut hits = 0usize;
                    let mut back_hits = 0usize;
                    let mut min_distance = ray_extent;
                    for direction in &directions {
                        if let Some(hit) = bvh.intersect_segment(position, *direction * ray_extent)
                        {
                            hits += 1;
                            if hit.back_face && !two_sided {
                                back_hits += 1;
                            }
                            min_distance = min_distance.min(hit.t * ray_extent);
                        }
                    }

                    let inside = hits > 0
                        && (back_hits as f32 > hits as f32 * 0.5
                            || (min_distance * min_distance < voxel_diameter_sq
                                && back_hits as f32 > hits as f32 * 0.95));
                    let signed = if inside { -min_distance } else { min_distance };
                    slice[(y * dimensions.x + x) as usize] =
                        f16::from_f32(signed * distance_scale);
                }
            }
        });

    // A negative border voxel means inside-ness leaked out of the mesh.
    let border_negative = (0..dimensions.z).any(|z| {
        (0..dimensions.y).any(|y| {
            (0..dimensions.x).any(|x| {
                let on_border = x == 0
                    || y == 0
                    || z == 0
                    || x == dimensions.x - 1
                    || y == dimensions.y - 1
                    || z == dimensions.z - 1;
                on_border
                    && distances[((z * dimensions.y + y) * dimensions.x + x) as usize].to_f32()
                        < 0.0
            })
        })
    });
    if border_negative {
        debug!("negative distance at volume border; discarding leaky volume");
        return DistanceFieldVolume {
            local_bounds: volume_bounds,
            mesh_was_plane,
            built_as_if_two_sided: two_sided,
            ..DistanceFieldVolume::empty()
        };
    }

    info!(
        dims = ?dimensions.to_array(),
        triangles = bvh.triangle_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "built distance field volume"
    );
    DistanceFieldVolume {
        dimensions,
        local_bounds: volume_bounds,
        distances,
        mesh_was_closed: true,
        mesh_was_plane,
        built_as_if_two_sided: two_sided,
    }
}
