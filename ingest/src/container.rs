//! Binary glTF (GLB) container envelope.
//!
//! A GLB file is a 12-byte header (`magic`, `version`, `totalLength`) followed
//! by `(length: u32, kind: u32, payload)` chunks. The first chunk is JSON; an
//! optional BIN chunk holds the embedded buffer.

use crate::error::IngestError;
use crate::window::{ByteSpan, StreamWindow};

/// `"glTF"` in little-endian.
pub const GLB_MAGIC: u32 = 0x4654_6C67;

/// The only supported container version.
pub const GLB_VERSION: u32 = 2;

/// Size of the file header in bytes.
pub const GLB_HEADER_LEN: usize = 12;

/// Size of a chunk header in bytes.
pub const CHUNK_HEADER_LEN: usize = 8;

/// Kind of a GLB chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// `"JSON"`: the glTF document.
    Json,
    /// `"BIN\0"`: the embedded binary buffer.
    Bin,
}

impl ChunkKind {
    /// Chunk type tag as stored in the file.
    pub const fn tag(self) -> u32 {
        match self {
            ChunkKind::Json => 0x4E4F_534A,
            ChunkKind::Bin => 0x004E_4942,
        }
    }

    /// Printable four character name.
    pub const fn name(self) -> &'static str {
        match self {
            ChunkKind::Json => "JSON",
            ChunkKind::Bin => "BIN",
        }
    }
}

/// Parsed GLB file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlbHeader {
    /// Always [`GLB_MAGIC`] once validated.
    pub magic: u32,
    /// Always [`GLB_VERSION`] once validated.
    pub version: u32,
    /// Declared length of the whole file.
    pub total_length: u32,
}

/// A located chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk kind.
    pub kind: ChunkKind,
    /// Declared payload length.
    pub byte_length: u32,
    /// Payload range relative to the start of the file.
    pub payload: ByteSpan,
}

/// What a byte stream contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    /// Binary glTF.
    Glb,
    /// A bare UTF-8 JSON document.
    Json,
}

/// Peeks the first four bytes to tell GLB and bare JSON apart.
///
/// Works on the window's bytes directly, so the window's own read cursor is
/// left exactly where it was.
pub fn detect_container_kind(stream: &StreamWindow) -> ContainerKind {
    match stream.read_u32_le_at(0) {
        Some(GLB_MAGIC) => ContainerKind::Glb,
        _ => ContainerKind::Json,
    }
}

/// Reads and validates the 12-byte GLB header.
///
/// Fails with [`IngestError::MalformedContainer`] when the magic or version is
/// wrong, or when the declared total length differs from the stream length.
pub fn read_header(stream: &StreamWindow) -> Result<GlbHeader, IngestError> {
    let (Some(magic), Some(version), Some(total_length)) = (
        stream.read_u32_le_at(0),
        stream.read_u32_le_at(4),
        stream.read_u32_le_at(8),
    ) else {
        return Err(IngestError::MalformedContainer(format!(
            "file is {} bytes, shorter than the {GLB_HEADER_LEN}-byte header",
            stream.available()
        )));
    };

    if magic != GLB_MAGIC {
        return Err(IngestError::MalformedContainer(format!(
            "bad magic 0x{magic:08x}"
        )));
    }
    if version != GLB_VERSION {
        return Err(IngestError::MalformedContainer(format!(
            "unsupported version {version}"
        )));
    }
    if total_length as usize != stream.available() {
        return Err(IngestError::MalformedContainer(format!(
            "header declares {total_length} bytes but the stream has {}",
            stream.available()
        )));
    }

    Ok(GlbHeader {
        magic,
        version,
        total_length,
    })
}

/// Scans chunk headers from `start` until one of kind `wanted` is found.
///
/// Chunks of other kinds are skipped by their declared length. Running out of
/// bytes before a match is [`IngestError::ContainerChunkNotFound`].
pub fn scan_for_chunk(
    stream: &StreamWindow,
    start: usize,
    wanted: ChunkKind,
) -> Result<Chunk, IngestError> {
    let mut cursor = start;
    loop {
        let (Some(length), Some(tag)) = (
            stream.read_u32_le_at(cursor),
            stream.read_u32_le_at(cursor + 4),
        ) else {
            return Err(IngestError::ContainerChunkNotFound {
                kind: wanted.name(),
            });
        };
        let payload_start = cursor + CHUNK_HEADER_LEN;
        if tag == wanted.tag() {
            log::trace!(
                "Found {} chunk at byte {payload_start} ({length} bytes)",
                wanted.name()
            );
            return Ok(Chunk {
                kind: wanted,
                byte_length: length,
                payload: ByteSpan::new(payload_start, length as usize),
            });
        }
        log::trace!("Skipping chunk 0x{tag:08x} at byte {cursor} ({length} bytes)");
        cursor = payload_start + length as usize;
    }
}

/// Located chunks of a validated GLB file.
#[derive(Clone, Debug)]
pub struct GlbContainer {
    /// Validated header.
    pub header: GlbHeader,
    /// The JSON chunk (always present).
    pub json: Chunk,
    /// The BIN chunk, if the file has one.
    pub bin: Option<Chunk>,
}

impl GlbContainer {
    /// Validates the header and locates the JSON and BIN chunks.
    pub fn read(stream: &StreamWindow) -> Result<Self, IngestError> {
        let header = read_header(stream)?;
        let json = scan_for_chunk(stream, GLB_HEADER_LEN, ChunkKind::Json)?;
        let bin = match scan_for_chunk(stream, json.payload.end(), ChunkKind::Bin) {
            Ok(chunk) => Some(chunk),
            Err(IngestError::ContainerChunkNotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        log::debug!(
            "GLB v{}: JSON {} bytes, BIN {}",
            header.version,
            json.byte_length,
            bin.map_or_else(|| "absent".to_string(), |c| format!("{} bytes", c.byte_length))
        );
        Ok(Self { header, json, bin })
    }
}
