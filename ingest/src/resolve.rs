//! Resolution of external files referenced by `uri`.
//!
//! Relative URIs are percent-decoded, joined with the document's base path,
//! and normalized before they reach a resolver. Resolvers therefore only see
//! clean forward-slash paths that never climb above their root.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors produced while resolving an external file.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No file exists at the path.
    #[error("not found: {0}")]
    NotFound(String),
    /// The path is empty or climbs above the resolver root.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// No resolver was configured for the load.
    #[error("no external resolver configured")]
    NoResolver,
    /// An IO error occurred while reading the file.
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ResolveError::NotFound(err.to_string())
        } else {
            ResolveError::Io(err)
        }
    }
}

/// Supplies the bytes of files referenced by a document.
///
/// Implementations receive normalized paths (see [`resolve_uri`]). Reads are
/// blocking; the loader calls them once per referenced buffer or image.
pub trait ExternalResolver: Send + Sync {
    /// Reads the whole file at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, ResolveError>;
}

/// In-memory resolver for tests and embedded assets.
///
/// # Example
///
/// ```ignore
/// let mut files = MemoryResolver::new();
/// files.insert("models/duck0.bin", bin_bytes);
/// let asset = Loader::new()
///     .with_base_path("models")
///     .with_resolver(files)
///     .load(gltf_bytes)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryResolver {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file. The path is normalized before it is stored.
    ///
    /// Paths that fail normalization are ignored with a warning.
    pub fn insert(&mut self, path: &str, data: impl Into<Arc<[u8]>>) {
        match normalize(path) {
            Ok(path) => {
                self.files.insert(path, data.into());
            }
            Err(e) => log::warn!("MemoryResolver: ignoring '{path}': {e}"),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(mut self, path: &str, data: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ExternalResolver for MemoryResolver {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        self.files
            .get(path)
            .map(|data| data.to_vec())
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }
}

/// Resolver reading from a directory on disk.
///
/// The root is joined with the normalized path, so reads stay inside it.
#[derive(Clone, Debug)]
pub struct FileSystemResolver {
    root: PathBuf,
}

impl FileSystemResolver {
    /// Creates a resolver rooted at `root`.
    ///
    /// The directory does not need to exist yet; it is checked at read time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ExternalResolver for FileSystemResolver {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        let full_path = self.root.join(path);
        log::debug!("Reading external file {}", full_path.display());
        Ok(std::fs::read(full_path)?)
    }
}

/// Normalizes a resolver path.
///
/// - Replaces backslashes with forward slashes
/// - Collapses redundant separators and drops `.` segments
/// - Resolves `..` against the preceding segment
/// - Strips leading and trailing slashes
///
/// Fails when the result is empty or a `..` would climb above the root.
pub fn normalize(path: &str) -> Result<String, ResolveError> {
    let replaced = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in replaced.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::InvalidPath(format!(
                        "'{path}' escapes the resolver root"
                    )));
                }
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return Err(ResolveError::InvalidPath("empty path".into()));
    }
    Ok(segments.join("/"))
}

/// Decodes `%XX` escapes. Malformed escapes are kept verbatim.
pub fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = bytes.get(i + 1..i + 3)
            && let (Some(hi), Some(lo)) = (hex_value(hex[0]), hex_value(hex[1]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|v| v as u8)
}

/// Turns a document-relative `uri` into a normalized resolver path.
///
/// `base` is the directory of the document inside the resolver's namespace
/// (empty for the root).
pub fn resolve_uri(base: &str, uri: &str) -> Result<String, ResolveError> {
    let decoded = percent_decode(uri);
    if base.is_empty() {
        normalize(&decoded)
    } else {
        normalize(&format!("{base}/{decoded}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("textures/brick.png").unwrap(), "textures/brick.png");
        assert_eq!(normalize("/a//b/./c/").unwrap(), "a/b/c");
        assert_eq!(normalize("a\\b.bin").unwrap(), "a/b.bin");
        assert_eq!(normalize("models/../textures/x.png").unwrap(), "textures/x.png");
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(matches!(
            normalize("../secret.bin"),
            Err(ResolveError::InvalidPath(_))
        ));
        assert!(normalize("a/../../b").is_err());
        assert!(normalize("").is_err());
        assert!(normalize("./.").is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("my%20model.bin"), "my model.bin");
        assert_eq!(percent_decode("caf%C3%A9.png"), "caf\u{e9}.png");
        assert_eq!(percent_decode("bad%zzescape%4"), "bad%zzescape%4");
    }

    #[test]
    fn test_resolve_uri() {
        assert_eq!(resolve_uri("", "duck0.bin").unwrap(), "duck0.bin");
        assert_eq!(resolve_uri("models/duck", "duck%200.bin").unwrap(), "models/duck/duck 0.bin");
        assert_eq!(resolve_uri("models/duck", "../shared/tex.png").unwrap(), "models/shared/tex.png");
        assert!(resolve_uri("models", "../../x.bin").is_err());
    }

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryResolver::new().with_file("/models/a.bin", vec![1u8, 2, 3]);
        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.read("models/a.bin").unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            resolver.read("models/b.bin"),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_filesystem_resolver_missing_file() {
        let resolver = FileSystemResolver::new("/nonexistent-redlilium-root");
        assert!(matches!(
            resolver.read("a.bin"),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_filesystem_resolver_reads_file() {
        let dir = std::env::temp_dir().join("redlilium-ingest-resolve-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("data.bin"), [7u8, 8, 9]).unwrap();

        let resolver = FileSystemResolver::new(&dir);
        assert_eq!(resolver.read("data.bin").unwrap(), vec![7, 8, 9]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
