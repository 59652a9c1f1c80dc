//! The build orchestrator.
//!
//! Sequences Gather → Reduce → GenerateRendering → ReplaceRaw for one mesh
//! asset. Transitions are strictly forward; invoking a stage out of order
//! is an error rather than a silent re-run.

use std::time::Instant;

use meshforge_math::BoxSphereBounds;
use meshforge_mesh::RawMesh;
use meshforge_types::{MeshForgeError, MeshForgeResult};
use tracing::{debug, info, warn};

use crate::adjacency::build_adjacency_indices;
use crate::cacheopt::cache_optimize_vertex_and_index_buffer;
use crate::collaborators::{MeshReducer, UvPacker};
use crate::lod::{assemble_lod, RenderData, RenderableLod};
use crate::mikkt::compute_tangents_mikktspace;
use crate::overlap::{find_overlapping_wedges, OverlapMap};
use crate::settings::{BuildSettings, ReductionSettings};
use crate::tangents::compute_tangents;
use crate::weld::weld_vertices;

/// One requested LOD level: the authored mesh (absent levels inherit from
/// the previous one) plus its build and reduction settings.
#[derive(Debug, Clone, Default)]
pub struct SourceModel {
    pub raw_mesh: Option<RawMesh>,
    pub build_settings: BuildSettings,
    pub reduction_settings: ReductionSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildStage {
    Uninit,
    Gathered,
    Reduced,
    RenderingGenerated,
    RawReplaced,
}

impl BuildStage {
    fn name(self) -> &'static str {
        match self {
            BuildStage::Uninit => "Uninit",
            BuildStage::Gathered => "Gathered",
            BuildStage::Reduced => "Reduced",
            BuildStage::RenderingGenerated => "RenderingGenerated",
            BuildStage::RawReplaced => "RawReplaced",
        }
    }
}

/// Per-LOD working state between stages.
struct LodBuild {
    mesh: RawMesh,
    overlaps: OverlapMap,
    settings: BuildSettings,
    reduction: ReductionSettings,
    /// Index into the caller's source model array, for ReplaceRaw.
    source_index: usize,
    produced_by_reduction: bool,
    max_deviation: f32,
}

/// Drives one static mesh through the build pipeline.
pub struct StaticMeshBuilder<'a> {
    mesh_name: String,
    stage: BuildStage,
    lods: Vec<LodBuild>,
    reducer: Option<&'a dyn MeshReducer>,
    uv_packer: Option<&'a dyn UvPacker>,
}

impl<'a> StaticMeshBuilder<'a> {
    pub fn new(
        mesh_name: impl Into<String>,
        reducer: Option<&'a dyn MeshReducer>,
        uv_packer: Option<&'a dyn UvPacker>,
    ) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            stage: BuildStage::Uninit,
            lods: Vec::new(),
            reducer,
            uv_packer,
        }
    }

    fn expect_stage(&self, expected: BuildStage, requested: &'static str) -> MeshForgeResult<()> {
        if self.stage != expected {
            return Err(MeshForgeError::InvalidBuildStage {
                current: self.stage.name(),
                requested,
            });
        }
        Ok(())
    }

    /// Loads or inherits a raw mesh for every requested LOD, synthesizes
    /// missing tangent bases, and builds the overlap index.
    pub fn gather(&mut self, source_models: &[SourceModel]) -> MeshForgeResult<()> {
        self.expect_stage(BuildStage::Uninit, "Gather")?;
        if source_models.is_empty() {
            return Err(MeshForgeError::NoValidLods {
                mesh: self.mesh_name.clone(),
            });
        }

        for (lod, model) in source_models.iter().enumerate() {
            let (mut mesh, settings, reduction) = match &model.raw_mesh {
                Some(mesh) => (
                    mesh.clone(),
                    model.build_settings.clone(),
                    model.reduction_settings,
                ),
                // Absent levels start from the previous LOD's data and are
                // expected to be produced by reduction.
                None => match self.lods.last() {
                    Some(previous) => (
                        previous.mesh.clone(),
                        previous.settings.clone(),
                        model.reduction_settings,
                    ),
                    None => {
                        return Err(MeshForgeError::MalformedInput {
                            mesh: self.mesh_name.clone(),
                            lod,
                            detail: "first LOD has no raw mesh to build from".into(),
                        })
                    }
                },
            };
            mesh.validate(&self.mesh_name, lod)?;

            if settings.generate_lightmap_uvs {
                if let Some(packer) = self.uv_packer {
                    let source = if mesh.wedge_tex_coords[settings.src_lightmap_index].is_empty() {
                        0
                    } else {
                        settings.src_lightmap_index
                    };
                    packer.pack(
                        &mut mesh,
                        source,
                        settings.dst_lightmap_index,
                        settings.min_lightmap_resolution,
                    )?;
                }
            }

            if settings.recompute_normals {
                mesh.wedge_tangent_z.clear();
            }
            if settings.recompute_tangents {
                mesh.wedge_tangent_x.clear();
                mesh.wedge_tangent_y.clear();
            }

            let overlaps = find_overlapping_wedges(&mesh, settings.comparison_threshold());
            if !mesh.has_full_tangent_basis() {
                let started = Instant::now();
                if settings.use_mikk_t_space {
                    compute_tangents_mikktspace(&mut mesh, &overlaps, settings.tangent_options());
                } else {
                    compute_tangents(&mut mesh, &overlaps, settings.tangent_options());
                }
                debug!(
                    mesh = %self.mesh_name,
                    lod,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    mikktspace = settings.use_mikk_t_space,
                    "synthesized tangent bases"
                );
            }

            self.lods.push(LodBuild {
                mesh,
                overlaps,
                settings,
                reduction,
                source_index: lod,
                produced_by_reduction: false,
                max_deviation: 0.0,
            });
        }

        self.stage = BuildStage::Gathered;
        Ok(())
    }

    /// Runs the reduction collaborator for every LOD past the first whose
    /// settings request simplification.
    ///
    /// A structurally invalid reduction result is recoverable: the LOD
    /// keeps its pre-reduction mesh. LODs that end up empty are dropped.
    pub fn reduce(&mut self) -> MeshForgeResult<()> {
        self.expect_stage(BuildStage::Gathered, "Reduce")?;

        let mesh_name = self.mesh_name.clone();
        if let Some(reducer) = self.reducer {
            for (lod, build) in self.lods.iter_mut().enumerate().skip(1) {
                if !build.reduction.is_active() {
                    continue;
                }
                let reduced = reducer
                    .reduce(&build.mesh, &build.reduction)
                    .and_then(|(mesh, deviation)| {
                        if !mesh.is_empty() && mesh.validate(&mesh_name, lod).is_err() {
                            return Err(MeshForgeError::ReductionFailure {
                                mesh: mesh_name.clone(),
                                lod,
                            });
                        }
                        Ok((mesh, deviation))
                    });
                match reduced {
                    Ok((mut mesh, deviation)) => {
                        // Reduction invalidates the overlap index and may
                        // drop tangent data.
                        let overlaps =
                            find_overlapping_wedges(&mesh, build.settings.comparison_threshold());
                        if !mesh.has_full_tangent_basis() {
                            if build.settings.use_mikk_t_space {
                                compute_tangents_mikktspace(
                                    &mut mesh,
                                    &overlaps,
                                    build.settings.tangent_options(),
                                );
                            } else {
                                compute_tangents(
                                    &mut mesh,
                                    &overlaps,
                                    build.settings.tangent_options(),
                                );
                            }
                        }
                        build.mesh = mesh;
                        build.overlaps = overlaps;
                        build.produced_by_reduction = true;
                        build.max_deviation = deviation;
                    }
                    Err(error) => {
                        warn!(
                            mesh = %mesh_name,
                            lod,
                            %error,
                            "reduction failed; keeping unreduced mesh"
                        );
                    }
                }
            }
        }

        let before = self.lods.len();
        self.lods.retain(|build| !build.mesh.is_empty());
        if self.lods.len() < before {
            info!(
                mesh = %self.mesh_name,
                dropped = before - self.lods.len(),
                "dropped empty LODs after reduction"
            );
        }
        if self.lods.is_empty() {
            return Err(MeshForgeError::NoValidLods {
                mesh: self.mesh_name.clone(),
            });
        }

        self.stage = BuildStage::Reduced;
        Ok(())
    }

    /// Welds, cache-optimizes and assembles every surviving LOD into the
    /// final render data.
    pub fn generate_rendering(&mut self) -> MeshForgeResult<RenderData> {
        self.expect_stage(BuildStage::Reduced, "GenerateRendering")?;

        let mut lods: Vec<RenderableLod> = Vec::with_capacity(self.lods.len());
        let mut lod0_wedge_map = Vec::new();

        for (lod, build) in self.lods.iter().enumerate() {
            let started = Instant::now();
            let mut welded = weld_vertices(
                &build.mesh,
                &build.overlaps,
                build.settings.comparison_threshold(),
            );
            if welded.vertices.is_empty() {
                return Err(MeshForgeError::DegenerateGeometry {
                    mesh: self.mesh_name.clone(),
                    lod,
                });
            }
            cache_optimize_vertex_and_index_buffer(
                &mut welded.vertices,
                &mut welded.per_section_indices,
                &mut welded.wedge_map,
                build.settings.triangle_order,
            );

            let adjacency = build.settings.build_adjacency_buffer.then(|| {
                let (combined, _) = crate::lod::assemble_sections(&welded.per_section_indices);
                build_adjacency_indices(&welded.vertices, &combined)
            });
            if lod == 0 && !build.produced_by_reduction {
                lod0_wedge_map = welded.wedge_map.clone();
            }
            debug!(
                mesh = %self.mesh_name,
                lod,
                vertices = welded.vertices.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "generated renderable lod"
            );
            lods.push(assemble_lod(
                welded.vertices,
                &welded.per_section_indices,
                build.settings.triangle_order,
                build.settings.build_reversed_index_buffer,
                adjacency,
                build.max_deviation,
            ));
        }

        let lod0_positions: Vec<_> = lods[0].vertices.iter().map(|v| v.position).collect();
        let bounds = BoxSphereBounds::from_points(&lod0_positions);
        self.stage = BuildStage::RenderingGenerated;
        Ok(RenderData {
            lods,
            bounds,
            wedge_map: lod0_wedge_map,
        })
    }

    /// Persists reduction-produced raw meshes back into the source models
    /// so later rebuilds start from the reduced geometry.
    pub fn replace_raw_meshes(&mut self, source_models: &mut [SourceModel]) -> MeshForgeResult<()> {
        self.expect_stage(BuildStage::RenderingGenerated, "ReplaceRaw")?;
        for build in &self.lods {
            if build.produced_by_reduction {
                if let Some(model) = source_models.get_mut(build.source_index) {
                    model.raw_mesh = Some(build.mesh.clone());
                }
            }
        }
        self.stage = BuildStage::RawReplaced;
        Ok(())
    }

    /// Runs Gather, Reduce and GenerateRendering in sequence.
    pub fn build(&mut self, source_models: &[SourceModel]) -> MeshForgeResult<RenderData> {
        self.gather(source_models)?;
        self.reduce()?;
        self.generate_rendering()
    }
}
