//! The wedge-based raw mesh type.
//!
//! A *wedge* is one per-triangle-corner attribute record; three consecutive
//! wedges form a triangle. Multiple wedges may share a vertex position —
//! welding them into unique renderable vertices is the build pipeline's job.

use meshforge_math::{Vec2, Vec3};
use meshforge_types::constants::MAX_TEXCOORDS;
use meshforge_types::{MeshForgeError, MeshForgeResult};
use serde::{Deserialize, Serialize};

/// An artist-authored triangle mesh in wedge form.
///
/// All `wedge_*` arrays are positionally aligned to `wedge_indices` and are
/// either empty ("not yet computed") or exactly `3 × face_count` long. The
/// `face_*` arrays have one entry per triangle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMesh {
    /// Unique vertex positions, referenced indirectly through `wedge_indices`.
    pub vertex_positions: Vec<Vec3>,

    /// One vertex index per wedge; length is `3 × face_count`.
    pub wedge_indices: Vec<u32>,

    /// Per-wedge tangent (U direction). Empty or zero means "compute me".
    pub wedge_tangent_x: Vec<Vec3>,
    /// Per-wedge bitangent (V direction).
    pub wedge_tangent_y: Vec<Vec3>,
    /// Per-wedge normal.
    pub wedge_tangent_z: Vec<Vec3>,

    /// Up to eight UV channels; each is empty or one entry per wedge.
    pub wedge_tex_coords: [Vec<Vec2>; MAX_TEXCOORDS],

    /// Optional per-wedge vertex colors (RGBA).
    pub wedge_colors: Vec<[u8; 4]>,

    /// Material index per triangle.
    pub face_material_indices: Vec<i32>,

    /// Smoothing-group bitmask per triangle. Two adjacent faces blend
    /// normals across their shared edge only if their masks share a set bit.
    pub face_smoothing_masks: Vec<u32>,
}

impl RawMesh {
    /// Returns the number of wedges (3 × triangle count).
    #[inline]
    pub fn wedge_count(&self) -> usize {
        self.wedge_indices.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.wedge_indices.len() / 3
    }

    /// Returns true if the mesh carries no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.wedge_indices.is_empty()
    }

    /// Resolves a wedge to its vertex position.
    #[inline]
    pub fn wedge_position(&self, wedge: usize) -> Vec3 {
        self.vertex_positions[self.wedge_indices[wedge] as usize]
    }

    /// Returns the UV for a wedge in `channel`, or zero if the channel is
    /// not populated.
    #[inline]
    pub fn wedge_uv(&self, wedge: usize, channel: usize) -> Vec2 {
        self.wedge_tex_coords[channel]
            .get(wedge)
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    /// Counts the leading run of fully-populated UV channels, capped at
    /// `max_channels`.
    pub fn num_tex_coords(&self, max_channels: usize) -> usize {
        let wedges = self.wedge_count();
        let mut count = 0;
        for channel in &self.wedge_tex_coords {
            if channel.len() != wedges {
                break;
            }
            count += 1;
        }
        count.min(max_channels)
    }

    /// Returns true if all three tangent-basis arrays are fully populated
    /// and nowhere near-zero.
    pub fn has_full_tangent_basis(&self) -> bool {
        let wedges = self.wedge_count();
        self.wedge_tangent_x.len() == wedges
            && self.wedge_tangent_y.len() == wedges
            && self.wedge_tangent_z.len() == wedges
            && (0..wedges).all(|w| {
                self.wedge_tangent_x[w] != Vec3::ZERO
                    && self.wedge_tangent_y[w] != Vec3::ZERO
                    && self.wedge_tangent_z[w] != Vec3::ZERO
            })
    }

    /// Checks the structural invariants of the wedge representation.
    ///
    /// `mesh` and `lod` only provide error context. Checks:
    /// - wedge count divisible by 3
    /// - every non-empty per-wedge array has exactly one entry per wedge
    /// - per-face arrays have exactly one entry per triangle
    /// - wedge indices are within the position array
    pub fn validate(&self, mesh: &str, lod: usize) -> MeshForgeResult<()> {
        let malformed = |detail: String| MeshForgeError::MalformedInput {
            mesh: mesh.to_string(),
            lod,
            detail,
        };

        let wedges = self.wedge_count();
        if wedges % 3 != 0 {
            return Err(malformed(format!(
                "wedge count {wedges} is not divisible by 3"
            )));
        }
        let faces = wedges / 3;

        for (name, array) in [
            ("wedge_tangent_x", &self.wedge_tangent_x),
            ("wedge_tangent_y", &self.wedge_tangent_y),
            ("wedge_tangent_z", &self.wedge_tangent_z),
        ] {
            if !array.is_empty() && array.len() != wedges {
                return Err(malformed(format!(
                    "{name} has {} entries, expected 0 or {wedges}",
                    array.len()
                )));
            }
        }
        for (i, channel) in self.wedge_tex_coords.iter().enumerate() {
            if !channel.is_empty() && channel.len() != wedges {
                return Err(malformed(format!(
                    "UV channel {i} has {} entries, expected 0 or {wedges}",
                    channel.len()
                )));
            }
        }
        if !self.wedge_colors.is_empty() && self.wedge_colors.len() != wedges {
            return Err(malformed(format!(
                "wedge_colors has {} entries, expected 0 or {wedges}",
                self.wedge_colors.len()
            )));
        }
        if self.face_material_indices.len() != faces {
            return Err(malformed(format!(
                "face_material_indices has {} entries, expected {faces}",
                self.face_material_indices.len()
            )));
        }
        if self.face_smoothing_masks.len() != faces {
            return Err(malformed(format!(
                "face_smoothing_masks has {} entries, expected {faces}",
                self.face_smoothing_masks.len()
            )));
        }

        let num_positions = self.vertex_positions.len();
        for (w, &index) in self.wedge_indices.iter().enumerate() {
            if index as usize >= num_positions {
                return Err(malformed(format!(
                    "wedge {w} references vertex {index}, out of range ({num_positions} positions)"
                )));
            }
        }

        Ok(())
    }
}
