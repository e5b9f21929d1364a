//! Resolution of `buffers` entries into byte windows.
//!
//! A buffer is either the GLB BIN chunk (no `uri`), a base64 data URI, or an
//! external file fetched through an [`ExternalResolver`]. Every buffer ends up
//! as a [`StreamWindow`]; buffer views are windows over those.

use crate::base64::Base64Decoder;
use crate::document::BufferViewInfo;
use crate::error::IngestError;
use crate::json::JsonValue;
use crate::resolve::{ExternalResolver, ResolveError, resolve_uri};
use crate::window::StreamWindow;

/// Prefix shared by every data URI.
pub const DATA_URI_PREFIX: &str = "data:";

/// Marker separating the media type from a base64 payload.
pub const BASE64_MARKER: &str = ";base64,";

/// Data URI prefixes glTF exporters write for buffers and images.
pub const KNOWN_DATA_URI_PREFIXES: [&str; 4] = [
    "data:application/gltf-buffer;base64,",
    "data:application/octet-stream;base64,",
    "data:image/png;base64,",
    "data:image/jpeg;base64,",
];

/// Splits a base64 data URI into its media type and payload.
///
/// Returns `None` for anything that is not a base64 data URI.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    for prefix in KNOWN_DATA_URI_PREFIXES {
        if let Some(payload) = uri.strip_prefix(prefix) {
            let mime = &prefix[DATA_URI_PREFIX.len()..prefix.len() - BASE64_MARKER.len()];
            return Some((mime, payload));
        }
    }
    let rest = uri.strip_prefix(DATA_URI_PREFIX)?;
    let marker = rest.find(BASE64_MARKER)?;
    Some((&rest[..marker], &rest[marker + BASE64_MARKER.len()..]))
}

/// Where a buffer's bytes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferSource {
    /// The GLB BIN chunk.
    Binary,
    /// An embedded base64 data URI.
    DataUri,
    /// An external file.
    External,
}

/// One resolved (or unresolvable) buffer.
#[derive(Clone, Debug)]
pub struct BufferEntry {
    /// Declared `byteLength`.
    pub byte_length: usize,
    pub source: BufferSource,
    /// The bytes, or `None` if they could not be resolved.
    pub data: Option<StreamWindow>,
}

/// Context needed to resolve buffer and image URIs.
pub(crate) struct UriContext<'a> {
    pub bin: Option<&'a StreamWindow>,
    pub resolver: Option<&'a dyn ExternalResolver>,
    pub base_path: &'a str,
}

impl UriContext<'_> {
    /// Reads an external file through the resolver.
    pub fn read_external(&self, uri: &str) -> Result<Vec<u8>, IngestError> {
        let wrap = |source: ResolveError| IngestError::Resolve {
            uri: uri.to_string(),
            source,
        };
        let resolver = self.resolver.ok_or_else(|| wrap(ResolveError::NoResolver))?;
        let path = resolve_uri(self.base_path, uri).map_err(wrap)?;
        resolver.read(&path).map_err(wrap)
    }
}

/// All buffers of a document, indexed like `buffers`.
#[derive(Clone, Debug, Default)]
pub struct BufferSet {
    entries: Vec<BufferEntry>,
}

impl BufferSet {
    /// Creates a set from already-resolved entries.
    pub fn from_entries(entries: Vec<BufferEntry>) -> Self {
        Self { entries }
    }

    /// Resolves every entry of the `buffers` array.
    ///
    /// Data URIs with invalid base64 fail the whole load. A buffer whose bytes
    /// cannot be found is logged and left unresolved; only accessors that read
    /// from it will fail.
    pub(crate) fn resolve(root: JsonValue<'_>, ctx: &UriContext<'_>) -> Result<Self, IngestError> {
        let mut entries = Vec::new();
        let Some(buffers) = root.get("buffers") else {
            return Ok(Self { entries });
        };

        for (index, buffer) in buffers.iter().enumerate() {
            let byte_length = buffer.child_index("byteLength").unwrap_or(0);
            let entry = match buffer.child_str("uri") {
                None => {
                    if ctx.bin.is_none() {
                        log::warn!("Buffer {index} has no uri and the file has no BIN chunk");
                    }
                    BufferEntry {
                        byte_length,
                        source: BufferSource::Binary,
                        data: ctx.bin.cloned(),
                    }
                }
                Some(uri) => match split_data_uri(&uri) {
                    Some((_, payload)) => {
                        let mut bytes = Vec::with_capacity(payload.len() / 4 * 3);
                        Base64Decoder::new().decode_into(payload.as_bytes(), &mut bytes)?;
                        BufferEntry {
                            byte_length,
                            source: BufferSource::DataUri,
                            data: Some(StreamWindow::new(bytes)),
                        }
                    }
                    None => {
                        let data = match ctx.read_external(&uri) {
                            Ok(bytes) => Some(StreamWindow::new(bytes)),
                            Err(e) => {
                                log::warn!("Buffer {index} could not be resolved: {e}");
                                None
                            }
                        };
                        BufferEntry {
                            byte_length,
                            source: BufferSource::External,
                            data,
                        }
                    }
                },
            };

            if let Some(data) = &entry.data {
                if data.len() < byte_length {
                    log::warn!(
                        "Buffer {index} declares {byte_length} bytes but only {} are present",
                        data.len()
                    );
                }
                log::debug!(
                    "Buffer {index}: {:?}, {} bytes",
                    entry.source,
                    data.len()
                );
            }
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document declares no buffers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry `index`.
    pub fn get(&self, index: usize) -> Option<&BufferEntry> {
        self.entries.get(index)
    }

    /// Iterates all entries.
    pub fn iter(&self) -> std::slice::Iter<'_, BufferEntry> {
        self.entries.iter()
    }

    /// Window over buffer view `view_index`.
    ///
    /// Fails with [`IngestError::MissingEntry`] when the view does not
    /// exist and [`IngestError::MissingBufferDependency`] when its buffer has
    /// no bytes.
    pub fn view_window(
        &self,
        views: &[BufferViewInfo],
        view_index: usize,
    ) -> Result<StreamWindow, IngestError> {
        let view = views.get(view_index).ok_or(IngestError::MissingEntry {
            kind: "bufferViews",
            index: view_index,
        })?;
        let missing = IngestError::MissingBufferDependency {
            buffer_view: view_index,
            buffer: view.buffer,
        };
        let data = self
            .entries
            .get(view.buffer)
            .and_then(|entry| entry.data.as_ref())
            .ok_or(missing)?;
        Ok(data.window(view.byte_offset, view.byte_length as i64))
    }
}
