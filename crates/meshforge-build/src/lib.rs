//! # meshforge-build
//!
//! Converts an artist-authored, wedge-based [`RawMesh`](meshforge_mesh::RawMesh)
//! into a renderer-ready, deduplicated vertex/index representation.
//!
//! ## Pipeline
//!
//! ```text
//! RawMesh → overlap index → tangent synthesis → (external reduction)
//!         → vertex welding → cache optimization → RenderableLod
//! ```
//!
//! ## Key Types
//!
//! - [`OverlapMap`] — Symmetric wedge-overlap index built once per mesh.
//! - [`BuildVertex`] — The canonical renderable vertex.
//! - [`RenderableLod`] / [`RenderData`] — Final per-LOD buffers and sections.
//! - [`StaticMeshBuilder`] — The Gather → Reduce → GenerateRendering state
//!   machine.

pub mod adjacency;
pub mod cacheopt;
pub mod collaborators;
pub mod lod;
pub mod mikkt;
pub mod orchestrator;
pub mod overlap;
pub mod settings;
pub mod tangents;
pub mod vertex;
pub mod weld;

pub use cacheopt::TriangleOrderStrategy;
pub use lod::{IndexBuffer, RenderData, RenderableLod, Section};
pub use orchestrator::{SourceModel, StaticMeshBuilder};
pub use overlap::OverlapMap;
pub use settings::{BuildSettings, ReductionSettings};
pub use vertex::BuildVertex;
