//! # RedLilium Ingest
//!
//! glTF 2.0 and GLB ingestion for RedLilium Engine.
//!
//! The crate reads a binary GLB container or a bare JSON document, builds a
//! lightweight value tree over the JSON without materializing strings,
//! resolves buffers (BIN chunk, base64 data URIs, external files) and decodes
//! accessors into typed arrays converted to the engine's coordinate system.
//!
//! Start with [`Loader`]:
//!
//! ```ignore
//! let asset = redlilium_ingest::Loader::new().load_file("scene.glb")?;
//! let meshes = asset.decode_meshes()?;
//! let skins = asset.decode_skins()?;
//! let animations = asset.decode_animations()?;
//! ```

pub mod accessor;
pub mod animation;
pub mod base64;
pub mod buffers;
pub mod cancellation;
pub mod container;
pub mod document;
pub mod draco;
pub mod error;
pub mod geometry;
pub mod images;
pub mod json;
pub mod loader;
pub mod math;
pub mod options;
pub mod resolve;
pub mod skin;
pub mod window;

#[cfg(test)]
mod tests;

pub use accessor::AccessorReader;
pub use animation::{AnimationChannel, AnimationPath, DecodedAnimation, Interpolation};
pub use cancellation::{CancellationToken, Cancelled};
pub use container::ContainerKind;
pub use draco::{DecompressedGeometry, DracoDecoder};
pub use error::IngestError;
pub use geometry::{DecodedMesh, DecodedPrimitive, MorphTarget, PrimitiveMode};
#[cfg(feature = "image")]
pub use images::DecodedImage;
pub use images::ImageSource;
pub use loader::{GltfAsset, Loader};
pub use options::{IngestOptions, load_options};
pub use resolve::{ExternalResolver, FileSystemResolver, MemoryResolver, ResolveError};
pub use skin::DecodedSkin;
pub use window::{ByteSpan, StreamWindow};

/// Ingest library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the library version.
pub fn init() {
    log::info!("RedLilium Ingest v{} initialized", VERSION);
}
