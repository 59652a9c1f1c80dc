//! Error types for the meshforge pipeline.
//!
//! All crates return `MeshForgeResult<T>` from fallible operations. Each
//! variant carries enough context (mesh name, LOD index, stage) for the
//! caller to log or surface to a human.

use thiserror::Error;

/// Unified error type for the mesh build pipeline.
#[derive(Debug, Error)]
pub enum MeshForgeError {
    /// Per-wedge or per-face array lengths violate the raw mesh invariants.
    /// Fails fast; no partial output is produced.
    #[error("Malformed raw mesh '{mesh}' (LOD {lod}): {detail}")]
    MalformedInput {
        mesh: String,
        lod: usize,
        detail: String,
    },

    /// Welding a LOD produced zero vertices. The build for that LOD fails;
    /// sibling LODs are unaffected.
    #[error("Mesh '{mesh}' LOD {lod} is entirely degenerate; welding produced no vertices")]
    DegenerateGeometry { mesh: String, lod: usize },

    /// The reduction collaborator returned a structurally invalid mesh.
    /// Recoverable: the orchestrator keeps the pre-reduction mesh.
    #[error("Mesh reduction produced a corrupt mesh for '{mesh}' LOD {lod}")]
    ReductionFailure { mesh: String, lod: usize },

    /// No LOD survived gathering and reduction.
    #[error("Mesh '{mesh}' has no valid LODs to build")]
    NoValidLods { mesh: String },

    /// A stage was invoked out of order on the build orchestrator.
    #[error("Build stage '{requested}' invoked while in state '{current}'")]
    InvalidBuildStage {
        current: &'static str,
        requested: &'static str,
    },

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, MeshForgeError>`.
pub type MeshForgeResult<T> = Result<T, MeshForgeError>;
