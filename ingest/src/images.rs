//! Embedded and external image access.
//!
//! Images are returned still encoded. [`GltfAsset::write_image`] streams a
//! data-URI image through the base64 decoder straight into a writer, which is
//! how textures get extracted to disk without holding the decoded copy.

use std::io::Write;

use crate::base64::Base64Decoder;
use crate::buffers::split_data_uri;
use crate::error::IngestError;
use crate::loader::GltfAsset;

/// Where the bytes of an image live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// A buffer view, usually inside the GLB BIN chunk.
    BufferView { view: usize, mime: Option<String> },
    /// A base64 data URI.
    DataUri { mime: String },
    /// A file resolved relative to the document.
    External { uri: String },
}

impl ImageSource {
    /// Declared media type, if known.
    pub fn mime(&self) -> Option<&str> {
        match self {
            ImageSource::BufferView { mime, .. } => mime.as_deref(),
            ImageSource::DataUri { mime } => Some(mime),
            ImageSource::External { .. } => None,
        }
    }
}

/// An image decoded to tightly packed RGBA8.
#[cfg(feature = "image")]
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GltfAsset {
    /// Describes where image `index` is stored.
    pub fn image_source(&self, index: usize) -> Result<ImageSource, IngestError> {
        let image = self.entry("images", index)?;
        if let Some(view) = image.child_index("bufferView") {
            return Ok(ImageSource::BufferView {
                view,
                mime: image.child_str("mimeType").map(|s| s.into_owned()),
            });
        }
        let uri = image.child_str("uri").unwrap_or_default();
        Ok(match split_data_uri(&uri) {
            Some((mime, _)) => ImageSource::DataUri {
                mime: mime.to_string(),
            },
            None => ImageSource::External {
                uri: uri.into_owned(),
            },
        })
    }

    /// Encoded bytes of image `index`.
    pub fn image_bytes(&self, index: usize) -> Result<Vec<u8>, IngestError> {
        let mut out = Vec::new();
        self.write_image(index, &mut out)?;
        Ok(out)
    }

    /// Writes the encoded bytes of image `index` to `writer`.
    ///
    /// Returns the number of bytes written.
    pub fn write_image<W: Write + ?Sized>(
        &self,
        index: usize,
        writer: &mut W,
    ) -> Result<usize, IngestError> {
        let image = self.entry("images", index)?;

        if let Some(view) = image.child_index("bufferView") {
            let window = self.buffers.view_window(&self.buffer_views, view)?;
            writer.write_all(window.as_slice())?;
            return Ok(window.len());
        }

        let uri = image.child_str("uri").unwrap_or_default();
        if let Some((mime, payload)) = split_data_uri(&uri) {
            let written =
                Base64Decoder::new().decode_to_writer(payload.as_bytes(), writer)?;
            log::debug!("Image {index}: {written} bytes of {mime} from data URI");
            return Ok(written);
        }

        let bytes = self.uri_context().read_external(&uri)?;
        writer.write_all(&bytes)?;
        log::debug!("Image {index}: {} bytes from '{uri}'", bytes.len());
        Ok(bytes.len())
    }

    /// Decodes image `index` (PNG or JPEG) to RGBA8.
    #[cfg(feature = "image")]
    pub fn decode_image_rgba8(&self, index: usize) -> Result<DecodedImage, IngestError> {
        let bytes = self.image_bytes(index)?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| IngestError::ImageDecode(format!("image {index}: {e}")))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(DecodedImage {
            data: rgba.into_raw(),
            width,
            height,
        })
    }
}
