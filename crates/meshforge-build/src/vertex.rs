//! The canonical renderable vertex.

use meshforge_math::compare::{normals_equal, points_equal, uvs_equal};
use meshforge_math::{Vec2, Vec3};
use meshforge_mesh::RawMesh;
use meshforge_types::constants::MAX_TEXCOORDS;
use serde::{Deserialize, Serialize};

/// A welded, renderer-ready vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildVertex {
    pub position: Vec3,
    /// Tangent (U direction).
    pub tangent_x: Vec3,
    /// Bitangent (V direction).
    pub tangent_y: Vec3,
    /// Normal.
    pub tangent_z: Vec3,
    pub uvs: [Vec2; MAX_TEXCOORDS],
    /// Packed RGBA color.
    pub color: [u8; 4],
}

impl BuildVertex {
    /// Assembles the vertex for one wedge from the raw mesh's attributes.
    ///
    /// Missing tangent arrays and unpopulated UV channels produce zero
    /// vectors; a missing color array produces opaque white.
    pub fn from_wedge(mesh: &RawMesh, wedge: usize) -> Self {
        let tangent = |array: &[Vec3]| array.get(wedge).copied().unwrap_or(Vec3::ZERO);
        let mut uvs = [Vec2::ZERO; MAX_TEXCOORDS];
        for (channel, uv) in uvs.iter_mut().enumerate() {
            *uv = mesh.wedge_uv(wedge, channel);
        }
        Self {
            position: mesh.wedge_position(wedge),
            tangent_x: tangent(&mesh.wedge_tangent_x),
            tangent_y: tangent(&mesh.wedge_tangent_y),
            tangent_z: tangent(&mesh.wedge_tangent_z),
            uvs,
            color: mesh
                .wedge_colors
                .get(wedge)
                .copied()
                .unwrap_or([255, 255, 255, 255]),
        }
    }

    /// Attribute equality for welding: positions within `threshold`, the
    /// tangent basis within the fixed normal tolerance, color exact, every
    /// UV channel within 1/1024 per axis.
    pub fn equals(&self, other: &BuildVertex, threshold: f32) -> bool {
        if !points_equal(self.position, other.position, threshold)
            || !normals_equal(self.tangent_x, other.tangent_x)
            || !normals_equal(self.tangent_y, other.tangent_y)
            || !normals_equal(self.tangent_z, other.tangent_z)
            || self.color != other.color
        {
            return false;
        }
        self.uvs
            .iter()
            .zip(other.uvs.iter())
            .all(|(a, b)| uvs_equal(*a, *b))
    }
}
