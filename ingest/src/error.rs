//! Error types for glTF ingestion.

use crate::cancellation::Cancelled;

/// Errors that can occur while reading a glTF/GLB asset.
///
/// Structural violations (container header, JSON grammar) are fatal and carry
/// the byte position where they were detected. Numeric leaf conversions never
/// produce an error; they fall back to a caller-supplied default instead.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The GLB header has a bad magic, version, or total length.
    #[error("malformed GLB container: {0}")]
    MalformedContainer(String),

    /// A required chunk is absent from the GLB container.
    #[error("GLB chunk {kind} not found")]
    ContainerChunkNotFound {
        /// Four character name of the chunk that was searched for.
        kind: &'static str,
    },

    /// The JSON document does not start with an object.
    #[error("expected '{{' at the start of the JSON document (byte {position})")]
    ExpectedRootObject {
        /// Byte position of the offending token.
        position: usize,
    },

    /// An object key was not followed by `:`.
    #[error("expected ':' after object key (byte {position})")]
    ExpectedColon {
        /// Byte position of the offending token.
        position: usize,
    },

    /// An array value was not followed by `,` or `]`.
    #[error("expected ',' or ']' in array (byte {position})")]
    ExpectedArrayClose {
        /// Byte position of the offending token.
        position: usize,
    },

    /// An object member was not followed by `,` or `}`.
    #[error("expected ',' or '}}' in object (byte {position})")]
    ExpectedObjectClose {
        /// Byte position of the offending token.
        position: usize,
    },

    /// Arrays and objects are nested deeper than the parser allows.
    #[error("JSON nesting deeper than {limit} levels (byte {position})")]
    NestingTooDeep {
        /// Byte position of the opening bracket that crossed the limit.
        position: usize,
        /// Maximum nesting depth.
        limit: usize,
    },

    /// A base64 payload contains a byte outside the alphabet.
    #[error("invalid base64 byte 0x{byte:02x}")]
    InvalidEncoding {
        /// The rejected input byte.
        byte: u8,
    },

    /// An accessor references buffer bytes that could not be resolved.
    #[error("buffer {buffer} required by buffer view {buffer_view} is not available")]
    MissingBufferDependency {
        /// Buffer view index.
        buffer_view: usize,
        /// Buffer index the view points at.
        buffer: usize,
    },

    /// Accessor metadata addresses bytes beyond the end of its buffer.
    #[error("accessor {accessor} needs {needed} bytes but only {available} are available")]
    BufferOverrun {
        /// Accessor index (or the parent accessor for sparse data).
        accessor: usize,
        /// Bytes required by count, stride and offset.
        needed: usize,
        /// Bytes present in the buffer view window.
        available: usize,
    },

    /// An index into a top-level array (accessors, bufferViews, meshes,
    /// skins, images, ...) does not exist.
    #[error("{kind} {index} does not exist")]
    MissingEntry {
        /// Name of the top-level array (`accessors`, `bufferViews`, ...).
        kind: &'static str,
        /// Requested index.
        index: usize,
    },

    /// Accessor metadata names an unknown component type or element type.
    #[error("accessor {accessor} is invalid: {reason}")]
    InvalidAccessor {
        /// Accessor index.
        accessor: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A primitive uses a topology other than triangles, strips, or fans.
    #[error("mesh {mesh} primitive {primitive} uses unsupported mode {mode}")]
    UnsupportedPrimitiveTopology {
        /// Mesh index.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// glTF primitive mode value.
        mode: i32,
    },

    /// A primitive is Draco-compressed but no decoder was configured.
    #[error("mesh {mesh} uses KHR_draco_mesh_compression but no Draco decoder is set")]
    DracoCallbackMissing {
        /// Mesh index.
        mesh: usize,
    },

    /// The configured Draco decoder could not decompress a primitive.
    #[error("Draco decoder failed on mesh {mesh} primitive {primitive}")]
    DracoDecodeFailed {
        /// Mesh index.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
    },

    /// The load was cancelled through its cancellation token.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// An external file could not be resolved.
    #[error("failed to resolve '{uri}': {source}")]
    Resolve {
        /// The URI as written in the document.
        uri: String,
        /// Underlying resolver error.
        #[source]
        source: crate::resolve::ResolveError,
    },

    /// An IO error occurred while writing decoded data.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The ingestion options could not be parsed.
    #[error("invalid ingest options: {0}")]
    Config(String),

    /// An embedded image could not be decoded.
    #[error("image decode error: {0}")]
    ImageDecode(String),
}
