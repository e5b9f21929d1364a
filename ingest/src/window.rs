//! Zero-copy byte-range windows over an immutable shared buffer.
//!
//! A [`StreamWindow`] addresses a range of an `Arc<[u8]>` by absolute offset.
//! Creating a window from another window adds the offsets together and points
//! at the same shared buffer, so a view nested any number of levels deep still
//! reads through a single slice operation.
//!
//! Every window owns its own read cursor. Reads never mutate the shared buffer
//! or any other window, so windows can be cloned and read from several threads.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Half-open byte range `[position, position + length)` into a byte source.
///
/// Never owns data. A span is valid when its length is non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteSpan {
    /// Offset of the first byte.
    pub position: usize,
    /// Number of bytes covered.
    pub length: usize,
}

impl ByteSpan {
    /// Creates a span starting at `position` covering `length` bytes.
    pub const fn new(position: usize, length: usize) -> Self {
        Self { position, length }
    }

    /// One past the last byte.
    pub const fn end(&self) -> usize {
        self.position + self.length
    }

    /// Whether the span covers at least one byte.
    pub const fn is_valid(&self) -> bool {
        self.length > 0
    }
}

/// Read-only, independently seekable view of a byte range.
#[derive(Clone, Debug, Default)]
pub struct StreamWindow {
    base: Option<Arc<[u8]>>,
    offset: usize,
    length: usize,
    position: usize,
}

impl StreamWindow {
    /// Creates a window covering all of `bytes`.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let base: Arc<[u8]> = bytes.into();
        let length = base.len();
        Self {
            base: Some(base),
            offset: 0,
            length,
            position: 0,
        }
    }

    /// Creates a window with no base. Every byte read from it is zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a window of `length` bytes starting `relative_offset` bytes
    /// into this one.
    ///
    /// A negative `length` means "the rest of this window". The child never
    /// extends past its parent: both offset and length are clamped to the
    /// parent's bounds. The result refers to the same shared buffer with the
    /// offsets already summed, so the nesting depth never costs anything at
    /// read time.
    pub fn window(&self, relative_offset: usize, length: i64) -> Self {
        let relative_offset = relative_offset.min(self.length);
        let remaining = self.length - relative_offset;
        let length = usize::try_from(length).map_or(remaining, |l| l.min(remaining));
        Self {
            base: self.base.clone(),
            offset: self.offset + relative_offset,
            length,
            position: 0,
        }
    }

    /// Creates a window covering `span` of this one.
    pub fn window_span(&self, span: ByteSpan) -> Self {
        self.window(span.position, span.length as i64)
    }

    /// Offset of this window's first byte in the underlying buffer.
    pub fn absolute_offset(&self) -> usize {
        self.offset
    }

    /// Declared length of the window.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the window declares zero bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether the window has an underlying buffer.
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Current read cursor, relative to the window start.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of declared bytes actually backed by the underlying buffer.
    ///
    /// Zero for a window with no base.
    pub fn available(&self) -> usize {
        match &self.base {
            Some(base) => base.len().saturating_sub(self.offset).min(self.length),
            None => 0,
        }
    }

    /// Returns the byte at `index` (relative to the window start).
    ///
    /// Returns 0 when the window has no base or the index lies outside the
    /// underlying buffer. Bounds against the declared length are not checked;
    /// the metadata that produced the window is responsible for them.
    pub fn read_byte_at(&self, index: usize) -> u8 {
        match &self.base {
            Some(base) => base.get(self.offset + index).copied().unwrap_or(0),
            None => 0,
        }
    }

    /// Borrow the backed part of the window as a slice.
    pub fn as_slice(&self) -> &[u8] {
        match &self.base {
            Some(base) => {
                let start = self.offset.min(base.len());
                &base[start..start + self.available()]
            }
            None => &[],
        }
    }

    /// Copies the window contents into an owned buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Borrow `len` bytes starting at `start`, or `None` if they are not all
    /// backed by the buffer.
    pub fn slice(&self, start: usize, len: usize) -> Option<&[u8]> {
        self.as_slice().get(start..start.checked_add(len)?)
    }

    /// Reads a little-endian `u32` at `index`, or `None` past the end.
    pub fn read_u32_le_at(&self, index: usize) -> Option<u32> {
        let bytes = self.slice(index, 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl Read for StreamWindow {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.as_slice();
        let start = self.position.min(data.len());
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        self.position += count;
        Ok(count)
    }
}

impl Seek for StreamWindow {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p as i64),
            SeekFrom::End(delta) => (self.length as i64).checked_add(delta),
            SeekFrom::Current(delta) => (self.position as i64).checked_add(delta),
        };
        match target {
            Some(p) if p >= 0 => {
                self.position = p as usize;
                Ok(p as u64)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the window",
            )),
        }
    }
}
