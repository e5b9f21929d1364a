//! Hook for `KHR_draco_mesh_compression`.
//!
//! Draco decompression is not implemented here. A load that meets a
//! compressed primitive hands the compressed bytes to the configured
//! [`DracoDecoder`] and converts whatever it returns like any other
//! primitive.
//!
//! # Example
//!
//! ```ignore
//! let loader = Loader::new().with_draco_decoder(|bytes: &[u8]| {
//!     let mesh = my_draco_binding::decode(bytes).ok()?;
//!     Some(DecompressedGeometry {
//!         positions: mesh.positions,
//!         indices: mesh.indices,
//!         ..Default::default()
//!     })
//! });
//! ```

use crate::json::JsonValue;
use crate::math::{Color, Vec2, Vec3};

/// Extension name of Draco-compressed primitives.
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Geometry returned by a Draco decoder, still in glTF conventions.
///
/// Empty attribute vectors mean "not present".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecompressedGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Color>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

/// Decompresses Draco-encoded primitives.
pub trait DracoDecoder: Send + Sync {
    /// Decodes `compressed`. Returns `None` on failure.
    fn decode(&self, compressed: &[u8]) -> Option<DecompressedGeometry>;
}

impl<F> DracoDecoder for F
where
    F: Fn(&[u8]) -> Option<DecompressedGeometry> + Send + Sync,
{
    fn decode(&self, compressed: &[u8]) -> Option<DecompressedGeometry> {
        self(compressed)
    }
}

/// The compressed buffer view of a primitive, if it uses Draco.
pub fn draco_buffer_view(primitive: JsonValue<'_>) -> Option<usize> {
    primitive
        .get("extensions")?
        .get(DRACO_EXTENSION)?
        .child_index("bufferView")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonDocument;
    use crate::window::StreamWindow;

    #[test]
    fn test_closure_decoder() {
        let decoder = |bytes: &[u8]| {
            (!bytes.is_empty()).then(|| DecompressedGeometry {
                indices: vec![0, 1, 2],
                ..Default::default()
            })
        };
        assert_eq!(decoder.decode(&[1]).unwrap().indices, vec![0, 1, 2]);
        assert!(DracoDecoder::decode(&decoder, &[]).is_none());
    }

    #[test]
    fn test_draco_buffer_view() {
        let text = r#"{"primitives": [
            {"attributes": {"POSITION": 0}},
            {"attributes": {}, "extensions": {"KHR_draco_mesh_compression": {"bufferView": 4, "attributes": {"POSITION": 0}}}}
        ]}"#;
        let doc = JsonDocument::parse(StreamWindow::new(text.as_bytes().to_vec())).unwrap();
        let primitives = doc.root().get("primitives").unwrap();
        assert_eq!(draco_buffer_view(primitives.at(0).unwrap()), None);
        assert_eq!(draco_buffer_view(primitives.at(1).unwrap()), Some(4));
    }
}
