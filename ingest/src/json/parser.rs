//! Recursive descent over the token stream, building the node arena.

use crate::error::IngestError;
use crate::window::{ByteSpan, StreamWindow};

use super::token::{Token, Tokenizer};
use super::value::{JsonDocument, JsonKind, Node};
use super::{FALSE_HASH, NULL_HASH, TRUE_HASH};

/// Deepest allowed nesting of arrays and objects, the root included.
const MAX_DEPTH: usize = 512;

pub(super) fn parse_document(source: StreamWindow) -> Result<JsonDocument, IngestError> {
    let nodes = {
        let mut parser = Parser {
            tokenizer: Tokenizer::new(source.as_slice()),
            nodes: Vec::new(),
            depth: 0,
        };
        parser.parse_root()?;
        parser.nodes
    };
    log::debug!(
        "Parsed JSON document: {} bytes, {} values",
        source.len(),
        nodes.len()
    );
    Ok(JsonDocument { source, nodes })
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    nodes: Vec<Node>,
    depth: usize,
}

impl Parser<'_> {
    fn push(&mut self, kind: JsonKind, span: ByteSpan) -> usize {
        self.nodes.push(Node::new(kind, span));
        self.nodes.len() - 1
    }

    fn enter(&mut self, position: usize) -> Result<(), IngestError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(IngestError::NestingTooDeep {
                position,
                limit: MAX_DEPTH,
            });
        }
        Ok(())
    }

    fn parse_root(&mut self) -> Result<(), IngestError> {
        let token = self.tokenizer.next_token();
        if !token.is(b'{') {
            return Err(IngestError::ExpectedRootObject {
                position: token.position,
            });
        }
        self.enter(token.position)?;
        let root = self.push(JsonKind::Object, ByteSpan::new(token.position, 0));
        let end = self.parse_keys_and_values(root)?;
        self.nodes[root].span.length = end - token.position;
        self.depth -= 1;
        Ok(())
    }

    /// Parses members up to and including the closing `}`.
    ///
    /// Returns the offset one past the closing brace.
    fn parse_keys_and_values(&mut self, object: usize) -> Result<usize, IngestError> {
        loop {
            let key = self.tokenizer.next_token();
            if key.is(b'}') {
                return Ok(key.position + 1);
            }
            if key.is_eof() || !key.is_string {
                return Err(IngestError::ExpectedObjectClose {
                    position: key.position,
                });
            }

            let colon = self.tokenizer.next_token();
            if !colon.is(b':') {
                return Err(IngestError::ExpectedColon {
                    position: colon.position,
                });
            }

            let value_token = self.tokenizer.next_token();
            if value_token.is_eof() || value_token.is_punctuation() {
                return Err(IngestError::ExpectedObjectClose {
                    position: value_token.position,
                });
            }
            let child = self.parse_value(value_token)?;

            let node = &mut self.nodes[object];
            let slot = node.children.len();
            node.children.push(child);
            node.key_spans
                .push(ByteSpan::new(key.position, key.length));
            node.keys.entry(key.hash).or_insert(slot);

            let separator = self.tokenizer.next_token();
            if separator.is(b',') {
                continue;
            }
            if separator.is(b'}') {
                return Ok(separator.position + 1);
            }
            return Err(IngestError::ExpectedObjectClose {
                position: separator.position,
            });
        }
    }

    /// Parses elements up to and including the closing `]`.
    ///
    /// Returns the offset one past the closing bracket.
    fn parse_values(&mut self, array: usize) -> Result<usize, IngestError> {
        loop {
            let token = self.tokenizer.next_token();
            if token.is(b']') {
                return Ok(token.position + 1);
            }
            if token.is_eof() || token.is_punctuation() {
                return Err(IngestError::ExpectedArrayClose {
                    position: token.position,
                });
            }
            let child = self.parse_value(token)?;
            self.nodes[array].children.push(child);

            let separator = self.tokenizer.next_token();
            if separator.is(b',') {
                continue;
            }
            if separator.is(b']') {
                return Ok(separator.position + 1);
            }
            return Err(IngestError::ExpectedArrayClose {
                position: separator.position,
            });
        }
    }

    /// Classifies `token` and parses the value it starts.
    fn parse_value(&mut self, token: Token) -> Result<usize, IngestError> {
        if token.is(b'{') {
            self.enter(token.position)?;
            let id = self.push(JsonKind::Object, ByteSpan::new(token.position, 0));
            let end = self.parse_keys_and_values(id)?;
            self.nodes[id].span.length = end - token.position;
            self.depth -= 1;
            return Ok(id);
        }
        if token.is(b'[') {
            self.enter(token.position)?;
            let id = self.push(JsonKind::Array, ByteSpan::new(token.position, 0));
            let end = self.parse_values(id)?;
            self.nodes[id].span.length = end - token.position;
            self.depth -= 1;
            return Ok(id);
        }

        let kind = if token.is_string {
            JsonKind::String
        } else if matches!(token.first, b'0'..=b'9' | b'.' | b'-' | b'+') {
            JsonKind::Number
        } else if token.hash == TRUE_HASH {
            JsonKind::True
        } else if token.hash == FALSE_HASH {
            JsonKind::False
        } else if token.hash == NULL_HASH {
            JsonKind::Null
        } else {
            log::trace!("Unknown JSON token at byte {}", token.position);
            JsonKind::Unknown
        };
        Ok(self.push(kind, ByteSpan::new(token.position, token.length)))
    }
}
