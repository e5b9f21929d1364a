//! Shared fixtures and whole-load tests.


use crate::container::{ChunkKind, GLB_MAGIC, GLB_VERSION};

use super::*;

#[test]
fn test_version() {
    assert!(!VERSION.is_empty());
}

/// Assembles a GLB file from a JSON chunk and an optional BIN chunk.
///
/// The JSON chunk is padded with spaces and the BIN chunk with zeros.
pub(crate) fn build_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    fn push_chunk(out: &mut Vec<u8>, kind: ChunkKind, payload: &[u8], pad: u8) {
        let padded = payload.len().next_multiple_of(4);
        out.extend_from_slice(&(padded as u32).to_le_bytes());
        out.extend_from_slice(&kind.tag().to_le_bytes());
        out.extend_from_slice(payload);
        out.resize(out.len() + padded - payload.len(), pad);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    push_chunk(&mut out, ChunkKind::Json, json, b' ');
    if let Some(bin) = bin {
        push_chunk(&mut out, ChunkKind::Bin, bin, 0);
    }
    let total = out.len() as u32;
    out[8..12].copy_from_slice(&total.to_le_bytes());
    out
}

/// Minimal base64 encoder used only to produce fixtures.
pub(crate) fn encode_base64(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in data.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32;
        out.push(ALPHABET[(n >> 18) as usize & 63] as char);
        out.push(ALPHABET[(n >> 12) as usize & 63] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(n >> 6) as usize & 63] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[n as usize & 63] as char
        } else {
            '='
        });
    }
    out
}

/// Builds a single-buffer document one accessor at a time.
///
/// Every accessor gets its own tightly packed buffer view, aligned to four
/// bytes inside the buffer.
#[derive(Default)]
pub(crate) struct Fixture {
    pub bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_view(&mut self, bytes: &[u8]) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.bin.resize(self.bin.len().next_multiple_of(4), 0);
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{offset},"byteLength":{}}}"#,
            bytes.len()
        ));
        self.views.len() - 1
    }

    fn push_accessor(&mut self, view: usize, component_type: u32, count: usize, ty: &str) -> usize {
        self.accessors.push(format!(
            r#"{{"bufferView":{view},"componentType":{component_type},"count":{count},"type":"{ty}"}}"#
        ));
        self.accessors.len() - 1
    }

    /// Adds a float accessor of type `ty` and returns its index.
    pub fn floats(&mut self, data: &[f32], ty: &str) -> usize {
        let components = match ty {
            "SCALAR" => 1,
            "VEC2" => 2,
            "VEC3" => 3,
            "VEC4" => 4,
            "MAT4" => 16,
            _ => panic!("unsupported fixture type {ty}"),
        };
        let view = self.push_view(bytemuck::cast_slice(data));
        self.push_accessor(view, 5126, data.len() / components, ty)
    }

    /// Adds a u16 SCALAR accessor and returns its index.
    pub fn indices(&mut self, data: &[u16]) -> usize {
        let view = self.push_view(bytemuck::cast_slice(data));
        self.push_accessor(view, 5123, data.len(), "SCALAR")
    }

    /// Adds raw bytes as a buffer view and returns the view index.
    pub fn raw_view(&mut self, bytes: &[u8]) -> usize {
        self.push_view(bytes)
    }

    /// The document JSON with `buffer` as the only buffer entry and `extra`
    /// spliced in as additional top-level members.
    pub fn json_with_buffer(&self, buffer: &str, extra: &str) -> String {
        let mut json = format!(
            r#"{{"asset":{{"version":"2.0"}},"buffers":[{buffer}],"bufferViews":[{}],"accessors":[{}]"#,
            self.views.join(","),
            self.accessors.join(",")
        );
        if !extra.is_empty() {
            json.push(',');
            json.push_str(extra);
        }
        json.push('}');
        json
    }

    /// The document as a GLB file with the buffer in the BIN chunk.
    pub fn glb(&self, extra: &str) -> Vec<u8> {
        let buffer = format!(r#"{{"byteLength":{}}}"#, self.bin.len());
        build_glb(self.json_with_buffer(&buffer, extra).as_bytes(), Some(&self.bin))
    }

    /// The document as bare JSON with the buffer embedded as a data URI.
    pub fn embedded_json(&self, extra: &str) -> Vec<u8> {
        let buffer = format!(
            r#"{{"byteLength":{},"uri":"data:application/octet-stream;base64,{}"}}"#,
            self.bin.len(),
            encode_base64(&self.bin)
        );
        self.json_with_buffer(&buffer, extra).into_bytes()
    }

    /// The document as bare JSON referencing the buffer through `uri`.
    pub fn external_json(&self, uri: &str, extra: &str) -> Vec<u8> {
        let buffer = format!(r#"{{"byteLength":{},"uri":"{uri}"}}"#, self.bin.len());
        self.json_with_buffer(&buffer, extra).into_bytes()
    }
}
