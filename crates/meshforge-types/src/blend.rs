//! Material blend-mode vocabulary.
//!
//! The build pipeline never evaluates materials; it only needs to know
//! whether a section's material occludes light when voxelizing.

use serde::{Deserialize, Serialize};

/// How a material combines with the scene behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    Opaque,
    Masked,
    Translucent,
    Additive,
    Modulate,
}

impl BlendMode {
    /// Translucent materials contribute no occluding geometry to the
    /// distance field.
    #[inline]
    pub fn is_translucent(self) -> bool {
        matches!(
            self,
            BlendMode::Translucent | BlendMode::Additive | BlendMode::Modulate
        )
    }
}
