//! Streaming base64 decoder for embedded data URIs.
//!
//! Input is consumed one byte at a time and never buffered, so a multi-megabyte
//! embedded buffer decodes straight into its destination (a growing `Vec<u8>`
//! for buffers, any [`Write`] for images).

use std::io::Write;

use crate::error::IngestError;

/// Table value for bytes outside the base64 alphabet.
const INVALID: u8 = 255;

/// 256-entry reverse lookup for the standard alphabet.
const DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Bytes that are skipped without touching the decoder state.
#[inline]
fn is_ignored(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | b'=' | b' ' | b'\t')
}

/// Incremental base64 decoder.
///
/// Four 6-bit input values produce three output bytes. The decoder only keeps
/// the partially assembled output byte and the position in the 4-symbol cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Base64Decoder {
    pending: u8,
    shift: u8,
}

impl Base64Decoder {
    /// Creates a decoder at the start of a 4-symbol cycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one input byte and returns a decoded byte when one completes.
    ///
    /// Whitespace, CR/LF, and `=` padding are skipped. Any other byte outside
    /// the alphabet fails with [`IngestError::InvalidEncoding`].
    #[inline]
    pub fn decode_byte(&mut self, input: u8) -> Result<Option<u8>, IngestError> {
        if is_ignored(input) {
            return Ok(None);
        }
        let sextet = DECODE_TABLE[input as usize];
        if sextet == INVALID {
            return Err(IngestError::InvalidEncoding { byte: input });
        }
        let output = match self.shift {
            0 => {
                self.pending = sextet << 2;
                self.shift = 1;
                None
            }
            1 => {
                let byte = self.pending.wrapping_add(sextet >> 4);
                self.pending = sextet << 4;
                self.shift = 2;
                Some(byte)
            }
            2 => {
                let byte = self.pending.wrapping_add(sextet >> 2);
                self.pending = sextet << 6;
                self.shift = 3;
                Some(byte)
            }
            _ => {
                let byte = self.pending.wrapping_add(sextet);
                self.pending = 0;
                self.shift = 0;
                Some(byte)
            }
        };
        Ok(output)
    }

    /// Feeds a whole slice, pushing decoded bytes into `out`.
    pub fn decode_into(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), IngestError> {
        for &byte in input {
            if let Some(decoded) = self.decode_byte(byte)? {
                out.push(decoded);
            }
        }
        Ok(())
    }

    /// Feeds a whole slice, writing decoded bytes to `writer`.
    ///
    /// Output is staged in a small stack buffer so the writer sees a few large
    /// writes rather than one call per byte. Returns the number of bytes
    /// written.
    pub fn decode_to_writer<W: Write + ?Sized>(
        &mut self,
        input: &[u8],
        writer: &mut W,
    ) -> Result<usize, IngestError> {
        let mut staging = [0u8; 1024];
        let mut staged = 0;
        let mut written = 0;
        for &byte in input {
            if let Some(decoded) = self.decode_byte(byte)? {
                staging[staged] = decoded;
                staged += 1;
                if staged == staging.len() {
                    writer.write_all(&staging)?;
                    written += staged;
                    staged = 0;
                }
            }
        }
        if staged > 0 {
            writer.write_all(&staging[..staged])?;
            written += staged;
        }
        Ok(written)
    }
}

/// Decodes a complete base64 payload into a new buffer.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, IngestError> {
    let mut out = Vec::with_capacity(input.len() / 4 * 3);
    Base64Decoder::new().decode_into(input, &mut out)?;
    Ok(out)
}
