//! Load entry point and the per-load session.
//!
//! A [`Loader`] collects the options and collaborators of a load. Calling
//! [`Loader::load`] validates the container, parses the JSON tree, reads the
//! accessor and buffer view metadata, and resolves every buffer. The result is
//! a [`GltfAsset`] whose `decode_*` methods produce typed data on demand.
//!
//! # Example
//!
//! ```ignore
//! use redlilium_ingest::{IngestOptions, Loader};
//!
//! let asset = Loader::new()
//!     .with_options(IngestOptions { scale_factor: 0.01, ..Default::default() })
//!     .load_file("models/duck.glb")?;
//!
//! for mesh in asset.decode_meshes()? {
//!     for primitive in &mesh.primitives {
//!         println!("{} vertices", primitive.positions.len());
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::accessor::AccessorReader;
use crate::buffers::{BufferSet, UriContext};
use crate::cancellation::{CancellationToken, Checkpoint};
use crate::container::{ContainerKind, GlbContainer, detect_container_kind};
use crate::document::{AccessorInfo, BufferViewInfo, parse_accessors, parse_buffer_views};
use crate::draco::DracoDecoder;
use crate::error::IngestError;
use crate::json::{JsonDocument, JsonValue};
use crate::options::IngestOptions;
use crate::resolve::{ExternalResolver, FileSystemResolver};
use crate::window::StreamWindow;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Builder for a glTF/GLB load.
#[derive(Clone, Default)]
pub struct Loader {
    options: IngestOptions,
    resolver: Option<Arc<dyn ExternalResolver>>,
    base_path: String,
    draco: Option<Arc<dyn DracoDecoder>>,
    cancellation: Option<CancellationToken>,
}

impl Loader {
    /// Creates a loader with default options and no collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the conversion options.
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the resolver used for external `uri` references.
    pub fn with_resolver(mut self, resolver: impl ExternalResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the directory of the document inside the resolver's namespace.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the decoder for `KHR_draco_mesh_compression` primitives.
    pub fn with_draco_decoder(mut self, decoder: impl DracoDecoder + 'static) -> Self {
        self.draco = Some(Arc::new(decoder));
        self
    }

    /// Sets the token checked by long-running decode loops.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The configured options.
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Loads a GLB file or a bare JSON glTF document from memory.
    pub fn load(&self, bytes: impl Into<Arc<[u8]>>) -> Result<GltfAsset, IngestError> {
        self.load_with(bytes.into(), self.resolver.clone(), self.base_path.clone())
    }

    /// Loads a file from disk.
    ///
    /// Without an explicit resolver, external references are read from the
    /// file's directory.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<GltfAsset, IngestError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        log::debug!("Loading {} ({} bytes)", path.display(), bytes.len());

        match &self.resolver {
            Some(resolver) => {
                self.load_with(bytes.into(), Some(resolver.clone()), self.base_path.clone())
            }
            None => {
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                let resolver: Arc<dyn ExternalResolver> = Arc::new(FileSystemResolver::new(dir));
                self.load_with(bytes.into(), Some(resolver), String::new())
            }
        }
    }

    fn load_with(
        &self,
        bytes: Arc<[u8]>,
        resolver: Option<Arc<dyn ExternalResolver>>,
        base_path: String,
    ) -> Result<GltfAsset, IngestError> {
        let source = StreamWindow::new(bytes);
        let kind = detect_container_kind(&source);

        let (glb, json_window, bin) = match kind {
            ContainerKind::Glb => {
                let container = GlbContainer::read(&source)?;
                let json = source.window_span(container.json.payload);
                let bin = container.bin.map(|chunk| source.window_span(chunk.payload));
                (Some(container), json, bin)
            }
            ContainerKind::Json => {
                let skip = if source.as_slice().starts_with(&UTF8_BOM) {
                    UTF8_BOM.len()
                } else {
                    0
                };
                (None, source.window(skip, -1), None)
            }
        };

        if let Some(token) = &self.cancellation
            && token.is_cancelled()
        {
            return Err(crate::cancellation::Cancelled.into());
        }

        let json = JsonDocument::parse(json_window)?;
        let root = json.root();
        let buffer_views = parse_buffer_views(root);
        let accessors = parse_accessors(root)?;
        let ctx = UriContext {
            bin: bin.as_ref(),
            resolver: resolver.as_deref(),
            base_path: &base_path,
        };
        let buffers = BufferSet::resolve(root, &ctx)?;

        log::info!(
            "Loaded {:?} document: {} JSON bytes, {} values, {} buffers, {} views, {} accessors",
            kind,
            json.source().len(),
            json.node_count(),
            buffers.len(),
            buffer_views.len(),
            accessors.len()
        );

        Ok(GltfAsset {
            kind,
            source,
            glb,
            json,
            buffer_views,
            accessors,
            buffers,
            options: self.options.clone(),
            resolver,
            base_path,
            draco: self.draco.clone(),
            cancellation: self.cancellation.clone(),
        })
    }
}

/// A parsed document with resolved buffers.
///
/// Read-only after loading; decode methods take `&self` and may run from
/// several threads.
pub struct GltfAsset {
    pub(crate) kind: ContainerKind,
    pub(crate) source: StreamWindow,
    pub(crate) glb: Option<GlbContainer>,
    pub(crate) json: JsonDocument,
    pub(crate) buffer_views: Vec<BufferViewInfo>,
    pub(crate) accessors: Vec<AccessorInfo>,
    pub(crate) buffers: BufferSet,
    pub(crate) options: IngestOptions,
    pub(crate) resolver: Option<Arc<dyn ExternalResolver>>,
    pub(crate) base_path: String,
    pub(crate) draco: Option<Arc<dyn DracoDecoder>>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for GltfAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GltfAsset")
            .field("kind", &self.kind)
            .field("bytes", &self.source.len())
            .field("accessors", &self.accessors.len())
            .field("buffer_views", &self.buffer_views.len())
            .field("buffers", &self.buffers.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GltfAsset {
    /// Whether the source was GLB or bare JSON.
    pub fn container_kind(&self) -> ContainerKind {
        self.kind
    }

    /// Chunk layout, for GLB sources.
    pub fn glb(&self) -> Option<&GlbContainer> {
        self.glb.as_ref()
    }

    /// The whole source file.
    pub fn source(&self) -> &StreamWindow {
        &self.source
    }

    /// The parsed JSON tree.
    pub fn json(&self) -> &JsonDocument {
        &self.json
    }

    /// Root object of the JSON tree.
    pub fn root(&self) -> JsonValue<'_> {
        self.json.root()
    }

    /// Accessor metadata.
    pub fn accessors(&self) -> &[AccessorInfo] {
        &self.accessors
    }

    /// Buffer view metadata.
    pub fn buffer_views(&self) -> &[BufferViewInfo] {
        &self.buffer_views
    }

    /// Resolved buffers.
    pub fn buffers(&self) -> &BufferSet {
        &self.buffers
    }

    /// Options the asset was loaded with.
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Length of the top-level array `name` (`meshes`, `nodes`, ...).
    pub fn count(&self, name: &str) -> usize {
        self.root().get(name).map_or(0, |v| v.len())
    }

    /// Entry `index` of the top-level array `kind`.
    pub(crate) fn entry(
        &self,
        kind: &'static str,
        index: usize,
    ) -> Result<JsonValue<'_>, IngestError> {
        self.root()
            .get(kind)
            .and_then(|array| array.at(index))
            .ok_or(IngestError::MissingEntry { kind, index })
    }

    /// A fresh cancellation checkpoint for one decode loop.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.cancellation.clone(),
            self.options.cancellation_check_interval,
        )
    }

    /// An accessor reader honoring the asset's options and cancellation.
    pub fn reader(&self) -> AccessorReader<'_> {
        AccessorReader::new(&self.accessors, &self.buffer_views, &self.buffers)
            .with_clamp_to_bounds(self.options.clamp_to_bounds)
            .with_checkpoint(self.checkpoint())
    }

    /// URI context for references made after loading (images).
    pub(crate) fn uri_context(&self) -> UriContext<'_> {
        UriContext {
            bin: None,
            resolver: self.resolver.as_deref(),
            base_path: &self.base_path,
        }
    }
}
