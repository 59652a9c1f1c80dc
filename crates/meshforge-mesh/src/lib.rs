//! # meshforge-mesh
//!
//! The artist-authored, wedge-based triangle mesh representation that the
//! build pipeline consumes, plus deterministic procedural generators used
//! by tests and the CLI.
//!
//! ## Key Types
//!
//! - [`RawMesh`] — Wedge-indexed positions, tangent bases, UV channels,
//!   colors, and per-face material/smoothing tags.
//! - Procedural generators for test meshes (quads, grids, closed boxes).

pub mod generators;
pub mod raw;

pub use raw::RawMesh;
