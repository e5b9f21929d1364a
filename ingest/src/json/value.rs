use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::IngestError;
use crate::window::{ByteSpan, StreamWindow};

use super::key_hash;
use super::text::{parse_f64, parse_i64, unescape};

/// Kind of a JSON value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
    /// Any token starting with a digit, `.`, `+`, or `-`.
    Number,
    /// A quoted string.
    String,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// A bareword that is none of the above.
    Unknown,
}

/// One parsed value. Stored in the document's node arena.
#[derive(Clone, Debug)]
pub(super) struct Node {
    pub(super) kind: JsonKind,
    pub(super) span: ByteSpan,
    pub(super) children: Vec<usize>,
    /// Key range of each child, parallel to `children` (objects only).
    pub(super) key_spans: Vec<ByteSpan>,
    /// Key hash → position in `children` (objects only).
    pub(super) keys: HashMap<i64, usize>,
}

impl Node {
    pub(super) fn new(kind: JsonKind, span: ByteSpan) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
            key_spans: Vec::new(),
            keys: HashMap::new(),
        }
    }
}

/// A parsed JSON document.
///
/// Holds the source window and a flat arena of nodes; node 0 is the root
/// object. Read-only once parsed.
#[derive(Clone, Debug)]
pub struct JsonDocument {
    pub(super) source: StreamWindow,
    pub(super) nodes: Vec<Node>,
}

impl JsonDocument {
    /// Parses a document. The root must be an object.
    pub fn parse(source: StreamWindow) -> Result<Self, IngestError> {
        super::parser::parse_document(source)
    }

    /// The root object.
    pub fn root(&self) -> JsonValue<'_> {
        JsonValue { doc: self, id: 0 }
    }

    /// Number of values in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The window the document was parsed from.
    pub fn source(&self) -> &StreamWindow {
        &self.source
    }

    fn bytes(&self, span: ByteSpan) -> &[u8] {
        self.source.slice(span.position, span.length).unwrap_or(&[])
    }
}

/// Handle to one value in a [`JsonDocument`].
#[derive(Clone, Copy)]
pub struct JsonValue<'a> {
    doc: &'a JsonDocument,
    id: usize,
}

impl std::fmt::Debug for JsonValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonValue")
            .field("kind", &self.kind())
            .field("span", &self.span())
            .field("children", &self.len())
            .finish()
    }
}

impl<'a> JsonValue<'a> {
    fn node(&self) -> &'a Node {
        &self.doc.nodes[self.id]
    }

    fn child(&self, id: usize) -> JsonValue<'a> {
        JsonValue { doc: self.doc, id }
    }

    /// Value kind.
    pub fn kind(&self) -> JsonKind {
        self.node().kind
    }

    /// Bytes the value occupies in the source (string content excludes quotes).
    pub fn span(&self) -> ByteSpan {
        self.node().span
    }

    /// Whether the value covers at least one byte.
    pub fn is_valid(&self) -> bool {
        self.node().span.is_valid()
    }

    /// Raw source bytes of the value.
    pub fn raw_bytes(&self) -> &'a [u8] {
        self.doc.bytes(self.node().span)
    }

    /// Number of children (array elements or object members).
    pub fn len(&self) -> usize {
        self.node().children.len()
    }

    /// Whether the value has no children.
    pub fn is_empty(&self) -> bool {
        self.node().children.is_empty()
    }

    /// Child at `index` in document order.
    pub fn at(&self, index: usize) -> Option<JsonValue<'a>> {
        self.node().children.get(index).map(|&id| self.child(id))
    }

    /// Iterates children in document order.
    pub fn iter(self) -> impl Iterator<Item = JsonValue<'a>> + 'a {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |&id| JsonValue { doc, id })
    }

    /// Iterates object members as `(key, value)` in document order.
    pub fn entries(self) -> impl Iterator<Item = (Cow<'a, str>, JsonValue<'a>)> + 'a {
        let doc = self.doc;
        let node = self.node();
        node.key_spans
            .iter()
            .zip(node.children.iter())
            .map(move |(&key, &id)| (unescape(doc.bytes(key)), JsonValue { doc, id }))
    }

    /// Looks up a member by a precomputed key hash.
    ///
    /// Only the first member registered under a hash is reachable.
    pub fn get_hashed(&self, hash: i64) -> Option<JsonValue<'a>> {
        let node = self.node();
        node.keys.get(&hash).map(|&i| self.child(node.children[i]))
    }

    /// Looks up a member by key.
    pub fn get(&self, key: &str) -> Option<JsonValue<'a>> {
        let node = self.node();
        let index = *node.keys.get(&key_hash(key))?;
        #[cfg(debug_assertions)]
        {
            let found = self.doc.bytes(node.key_spans[index]);
            if found != key.as_bytes() {
                log::error!(
                    "JSON key hash collision: '{key}' vs '{}'",
                    String::from_utf8_lossy(found)
                );
                return node
                    .key_spans
                    .iter()
                    .position(|&span| self.doc.bytes(span) == key.as_bytes())
                    .map(|i| self.child(node.children[i]));
            }
        }
        Some(self.child(node.children[index]))
    }

    /// Whether a member with `key` exists.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String content with escapes resolved, or `None` for non-strings.
    pub fn as_str(&self) -> Option<Cow<'a, str>> {
        (self.kind() == JsonKind::String).then(|| unescape(self.raw_bytes()))
    }

    /// Text of the value: unescaped content for strings, source text otherwise.
    pub fn to_text(&self) -> Cow<'a, str> {
        match self.kind() {
            JsonKind::String => unescape(self.raw_bytes()),
            _ => String::from_utf8_lossy(self.raw_bytes()),
        }
    }

    /// Whether a string value starts with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.kind() == JsonKind::String && self.raw_bytes().starts_with(prefix.as_bytes())
    }

    /// Parses the value as an integer.
    ///
    /// Returns `None` when the text is not an integer or does not fit `i64`.
    pub fn try_i64(&self) -> Option<i64> {
        match self.kind() {
            JsonKind::Number | JsonKind::String => parse_i64(self.raw_bytes()),
            _ => None,
        }
    }

    /// Parses the value as an `i32`, falling back to `default`.
    pub fn as_i32_or(&self, default: i32) -> i32 {
        match self.try_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(v) => v,
            None => {
                self.log_soft_failure("integer");
                default
            }
        }
    }

    /// Parses the value as a floating point number.
    pub fn try_f64(&self) -> Option<f64> {
        match self.kind() {
            JsonKind::Number | JsonKind::String => parse_f64(self.raw_bytes()),
            _ => None,
        }
    }

    /// Parses the value as an `f32`, falling back to `default`.
    pub fn as_f32_or(&self, default: f32) -> f32 {
        match self.try_f64() {
            Some(v) => v as f32,
            None => {
                self.log_soft_failure("number");
                default
            }
        }
    }

    /// Reads `true`/`false`, falling back to `default` for anything else.
    pub fn as_bool_or(&self, default: bool) -> bool {
        match self.kind() {
            JsonKind::True => true,
            JsonKind::False => false,
            _ => default,
        }
    }

    /// Collects every element of an array as `f32` (non-numbers become 0).
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.iter().map(|v| v.as_f32_or(0.0)).collect()
    }

    /// Member `key` as a string.
    pub fn child_str(&self, key: &str) -> Option<Cow<'a, str>> {
        self.get(key)?.as_str()
    }

    /// Member `key` as an `i32`, or `default` when absent or not a number.
    pub fn child_i32_or(&self, key: &str, default: i32) -> i32 {
        self.get(key).map_or(default, |v| v.as_i32_or(default))
    }

    /// Member `key` as an `i32`, or `None` when absent or not a number.
    pub fn try_child_i32(&self, key: &str) -> Option<i32> {
        self.get(key)?.try_i64().and_then(|v| i32::try_from(v).ok())
    }

    /// Member `key` as a non-negative index.
    pub fn child_index(&self, key: &str) -> Option<usize> {
        self.get(key)?
            .try_i64()
            .and_then(|v| usize::try_from(v).ok())
    }

    /// Member `key` as an `f32`, or `default` when absent or not a number.
    pub fn child_f32_or(&self, key: &str, default: f32) -> f32 {
        self.get(key).map_or(default, |v| v.as_f32_or(default))
    }

    /// Member `key` as a bool, or `default` when absent or not a literal.
    pub fn child_bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, |v| v.as_bool_or(default))
    }

    fn log_soft_failure(&self, expected: &str) {
        log::warn!(
            "JSON value '{}' at byte {} is not a valid {expected}, using default",
            String::from_utf8_lossy(self.raw_bytes()),
            self.span().position
        );
    }
}
