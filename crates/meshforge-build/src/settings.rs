//! Build configuration.

use meshforge_types::constants::THRESH_POINTS_ARE_SAME;
use serde::{Deserialize, Serialize};

use crate::cacheopt::TriangleOrderStrategy;
use crate::tangents::TangentOptions;

/// Per-LOD build settings.
///
/// Passed explicitly into the orchestrator; there is no process-global
/// policy state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Use MikkTSpace for tangents instead of the floodfill blend.
    pub use_mikk_t_space: bool,
    /// Discard authored normals and recompute all of them.
    pub recompute_normals: bool,
    /// Discard authored tangents and recompute all of them.
    pub recompute_tangents: bool,
    /// Weld and reject near-coincident corners using the standard point
    /// threshold. When false only exact duplicates merge.
    pub remove_degenerates: bool,
    /// Blend normals across overlapping-but-distinct positions.
    pub blend_overlapping_normals: bool,
    /// Emit a PN-AEN adjacency index buffer for tessellation.
    pub build_adjacency_buffer: bool,
    /// Emit a reversed-winding copy of the primary index buffer.
    pub build_reversed_index_buffer: bool,
    /// Generate a non-overlapping lightmap UV channel via the packer
    /// collaborator.
    pub generate_lightmap_uvs: bool,
    pub min_lightmap_resolution: u32,
    pub src_lightmap_index: usize,
    pub dst_lightmap_index: usize,
    pub triangle_order: TriangleOrderStrategy,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            use_mikk_t_space: false,
            recompute_normals: false,
            recompute_tangents: false,
            remove_degenerates: true,
            blend_overlapping_normals: true,
            build_adjacency_buffer: false,
            build_reversed_index_buffer: false,
            generate_lightmap_uvs: false,
            min_lightmap_resolution: 64,
            src_lightmap_index: 0,
            dst_lightmap_index: 1,
            triangle_order: TriangleOrderStrategy::default(),
        }
    }
}

impl BuildSettings {
    /// Position tolerance used for overlap detection and welding.
    pub fn comparison_threshold(&self) -> f32 {
        if self.remove_degenerates {
            THRESH_POINTS_ARE_SAME
        } else {
            0.0
        }
    }

    pub fn tangent_options(&self) -> TangentOptions {
        TangentOptions {
            blend_overlapping_normals: self.blend_overlapping_normals,
            ignore_degenerate_triangles: self.remove_degenerates,
        }
    }
}

/// Simplification targets handed to the reduction collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionSettings {
    /// Fraction of source triangles to keep, `1.0` disables reduction.
    pub percent_triangles: f32,
    /// Maximum allowed deviation from the source surface, `0.0` disables.
    pub max_deviation: f32,
}

impl Default for ReductionSettings {
    fn default() -> Self {
        Self {
            percent_triangles: 1.0,
            max_deviation: 0.0,
        }
    }
}

impl ReductionSettings {
    /// Whether these settings request any simplification at all.
    pub fn is_active(&self) -> bool {
        self.percent_triangles < 1.0 || self.max_deviation > 0.0
    }
}
