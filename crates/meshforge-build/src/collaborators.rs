//! External collaborator seams.
//!
//! Mesh simplification and lightmap UV packing are consumed as black boxes.
//! The orchestrator only depends on these traits; real implementations live
//! outside this workspace.

use meshforge_mesh::RawMesh;
use meshforge_types::MeshForgeResult;

use crate::settings::ReductionSettings;

/// Mesh simplification service.
pub trait MeshReducer {
    /// Produces a simplified copy of `mesh` honoring `settings`, returning
    /// the reduced mesh and the maximum deviation from the source surface.
    ///
    /// The returned mesh must be either empty or structurally valid.
    fn reduce(
        &self,
        mesh: &RawMesh,
        settings: &ReductionSettings,
    ) -> MeshForgeResult<(RawMesh, f32)>;
}

/// Lightmap UV packing service.
pub trait UvPacker {
    /// Generates a non-overlapping UV layout in `target_channel` from the
    /// parameterization in `source_channel`.
    fn pack(
        &self,
        mesh: &mut RawMesh,
        source_channel: usize,
        target_channel: usize,
        min_resolution: u32,
    ) -> MeshForgeResult<()>;
}

/// Reducer that keeps every LOD untouched. Used when no simplification
/// backend is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReducer;

impl MeshReducer for NoopReducer {
    fn reduce(
        &self,
        mesh: &RawMesh,
        _settings: &ReductionSettings,
    ) -> MeshForgeResult<(RawMesh, f32)> {
        Ok((mesh.clone(), 0.0))
    }
}
