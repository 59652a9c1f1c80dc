//! # meshforge-types
//!
//! Shared types, error taxonomy, and numeric constants for the meshforge
//! mesh-build pipeline.
//!
//! This crate has zero domain logic — it defines the vocabulary that all
//! other meshforge crates share.

pub mod blend;
pub mod constants;
pub mod error;

pub use blend::BlendMode;
pub use error::{MeshForgeError, MeshForgeResult};
