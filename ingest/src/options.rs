//! Ingestion options.
//!
//! Options can be built in code or loaded from a TOML file:
//!
//! ```toml
//! scale_factor = 0.01
//! convert_handedness = true
//! flip_uvs = true
//! import_tangents = false
//! ```
//!
//! Missing keys keep their defaults. Unknown keys are rejected so that typos
//! do not silently fall back to a default.

use std::path::Path;

use serde::Deserialize;

use crate::error::IngestError;

/// Options controlling how decoded data is converted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestOptions {
    /// Uniform scale applied to positions, translations, and morph offsets.
    pub scale_factor: f32,
    /// Mirror the X axis to convert from right- to left-handed data.
    pub convert_handedness: bool,
    /// Flip texture coordinates vertically (`v = 1 - v`).
    pub flip_uvs: bool,
    /// Clamp decoded components to the accessor's declared `min`/`max`.
    ///
    /// Off by default: exporters are known to write bounds that the data
    /// itself violates.
    pub clamp_to_bounds: bool,
    /// Decode `NORMAL` attributes.
    pub import_normals: bool,
    /// Decode `TANGENT` attributes.
    pub import_tangents: bool,
    /// Decode `COLOR_0` attributes.
    pub import_colors: bool,
    /// Decode morph targets.
    pub import_blend_shapes: bool,
    /// Number of decoded elements between cancellation checks.
    pub cancellation_check_interval: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            convert_handedness: true,
            flip_uvs: true,
            clamp_to_bounds: false,
            import_normals: true,
            import_tangents: true,
            import_colors: true,
            import_blend_shapes: true,
            cancellation_check_interval: 1024,
        }
    }
}

impl IngestOptions {
    /// Options that leave decoded data untouched: no handedness change, no
    /// UV flip, unit scale.
    pub fn raw() -> Self {
        Self {
            convert_handedness: false,
            flip_uvs: false,
            ..Self::default()
        }
    }

    /// Parses options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, IngestError> {
        toml::from_str(text).map_err(|e| IngestError::Config(e.to_string()))
    }
}

/// Loads options from a TOML file.
pub fn load_options(path: &Path) -> Result<IngestOptions, IngestError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| IngestError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| IngestError::Config(format!("failed to parse {}: {e}", path.display())))
}
