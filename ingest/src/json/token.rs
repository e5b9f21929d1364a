use super::{HASH_SEED, hash_step};

/// One lexical token.
///
/// For strings, `position` and `length` cover the text between the quotes.
/// For every other token they cover the token itself. `first` is the first
/// byte of the raw token (the opening quote for strings) and 0 at end of
/// input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    /// Byte offset of the token content.
    pub position: usize,
    /// Content length in bytes.
    pub length: usize,
    /// Rolling hash of the content bytes.
    pub hash: i64,
    /// Whether the token was a quoted string.
    pub is_string: bool,
    /// First raw byte, or 0 at end of input.
    pub first: u8,
}

impl Token {
    /// Whether this token marks the end of input.
    pub fn is_eof(&self) -> bool {
        self.first == 0 && self.length == 0 && !self.is_string
    }

    /// Whether this is the single-character token `c`.
    pub fn is(&self, c: u8) -> bool {
        !self.is_string && self.first == c
    }

    /// Whether this token is `:`, `,`, `]` or `}`, none of which can start
    /// a value.
    pub fn is_punctuation(&self) -> bool {
        !self.is_string && matches!(self.first, b':' | b',' | b']' | b'}')
    }
}

#[inline]
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

#[inline]
fn is_structural(byte: u8) -> bool {
    matches!(byte, b'{' | b'}' | b'[' | b']' | b':' | b',')
}

/// Splits a JSON byte slice into tokens with an explicit cursor.
pub struct Tokenizer<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Current byte offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Token {
        while self.cursor < self.data.len() && is_whitespace(self.data[self.cursor]) {
            self.cursor += 1;
        }

        let Some(&first) = self.data.get(self.cursor) else {
            return Token {
                position: self.data.len(),
                length: 0,
                hash: HASH_SEED,
                is_string: false,
                first: 0,
            };
        };

        if is_structural(first) {
            let position = self.cursor;
            self.cursor += 1;
            return Token {
                position,
                length: 1,
                hash: hash_step(HASH_SEED, first),
                is_string: false,
                first,
            };
        }

        if first == b'"' {
            return self.read_string();
        }

        let position = self.cursor;
        let mut hash = HASH_SEED;
        while let Some(&byte) = self.data.get(self.cursor) {
            if is_structural(byte) || is_whitespace(byte) || byte == b'"' {
                break;
            }
            hash = hash_step(hash, byte);
            self.cursor += 1;
        }
        Token {
            position,
            length: self.cursor - position,
            hash,
            is_string: false,
            first,
        }
    }

    /// Scans a quoted string. The cursor sits on the opening quote.
    fn read_string(&mut self) -> Token {
        let position = self.cursor + 1;
        let mut hash = HASH_SEED;
        let mut escaped = false;
        let mut end = position;
        while let Some(&byte) = self.data.get(end) {
            if byte == b'"' && !escaped {
                break;
            }
            escaped = byte == b'\\' && !escaped;
            hash = hash_step(hash, byte);
            end += 1;
        }
        // Skip the closing quote if there is one
        self.cursor = (end + 1).min(self.data.len());
        Token {
            position,
            length: end - position,
            hash,
            is_string: true,
            first: b'"',
        }
    }
}
