//! Chunk-fed character buffer.
//!
//! Bytes arrive in arbitrary slices, with no alignment to character
//! boundaries. The buffer decodes them incrementally, carrying an
//! incomplete trailing UTF-8 sequence until a later chunk completes it,
//! and normalizes line endings (`\r\n` and bare `\r` become `\n`) while
//! pushing so the lexer only ever sees `\n`.

use alloc::{collections::VecDeque, vec::Vec};
use core::str;

/// The input contained a byte sequence that is not UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InvalidUtf8;

/// Decoded characters waiting to be consumed by the lexer.
#[derive(Debug, Default)]
pub(crate) struct Buffer {
    chars: VecDeque<char>,
    /// Incomplete trailing sequence from the previous chunk, at most three
    /// bytes.
    pending: Vec<u8>,
    /// The last pushed character was a carriage return; drop an
    /// immediately following line feed.
    skip_lf: bool,
}

impl Buffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk` into the buffer.
    ///
    /// A chunk may end in the middle of a multi-byte sequence; the tail is
    /// held back and completed by the next chunk. Every character decoded
    /// before an invalid sequence is kept, so the lexer can report a
    /// position at the end of the valid prefix.
    pub(crate) fn push_bytes(&mut self, chunk: &[u8]) -> Result<(), InvalidUtf8> {
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(self.pending.len() < 4, "carried sequence exceeds UTF-8 maximum");

        let mut bytes = chunk;
        while !self.pending.is_empty() && !bytes.is_empty() {
            self.pending.push(bytes[0]);
            bytes = &bytes[1..];
            match str::from_utf8(&self.pending) {
                Ok(s) => {
                    // A just-completed carried sequence is exactly one
                    // scalar; bind it so the borrow of `pending` ends
                    // before pushing.
                    if let Some(c) = s.chars().next() {
                        self.push_char(c);
                    }
                    self.pending.clear();
                }
                // Still a prefix of a valid sequence; keep collecting.
                Err(e) if e.error_len().is_none() => {}
                Err(_) => return Err(InvalidUtf8),
            }
        }
        match str::from_utf8(bytes) {
            Ok(s) => {
                for c in s.chars() {
                    self.push_char(c);
                }
                Ok(())
            }
            Err(e) => {
                let (valid, tail) = bytes.split_at(e.valid_up_to());
                if let Ok(s) = str::from_utf8(valid) {
                    for c in s.chars() {
                        self.push_char(c);
                    }
                }
                if e.error_len().is_none() {
                    self.pending.extend_from_slice(tail);
                    Ok(())
                } else {
                    Err(InvalidUtf8)
                }
            }
        }
    }

    fn push_char(&mut self, c: char) {
        if core::mem::take(&mut self.skip_lf) && c == '\n' {
            return;
        }
        if c == '\r' {
            self.skip_lf = true;
            self.chars.push_back('\n');
        } else {
            self.chars.push_back(c);
        }
    }

    /// The next unconsumed character, if one is buffered.
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.front().copied()
    }

    /// True when an incomplete UTF-8 sequence is still waiting for bytes.
    pub(crate) fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Iterator for Buffer {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        self.chars.pop_front()
    }
}
