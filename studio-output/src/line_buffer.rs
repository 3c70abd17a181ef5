// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reassembly of complete lines from incrementally delivered chunks.
//!
//! Process output is delivered in chunks that can end anywhere: in the middle
//! of a line, of an escape sequence, or of a multi-byte UTF-8 character. The
//! classifier and the test event parser operate on complete lines, so chunks
//! are buffered here until a line terminator arrives.

use bstr::ByteSlice;
use bytes::BytesMut;

/// The initial capacity of the pending buffer.
const INITIAL_CAPACITY: usize = 4 * 1024;

/// Buffers chunks of output and yields complete lines.
///
/// Lines are terminated by `\n`; a `\r` immediately before the terminator is
/// removed as well. Bytes that are not valid UTF-8 are replaced with
/// `U+FFFD REPLACEMENT CHARACTER`.
#[derive(Debug)]
pub struct LineBuffer {
    pending: BytesMut,
}

impl LineBuffer {
    /// Creates a new, empty line buffer.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            pending: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Appends a chunk of raw bytes, returning the lines completed by it.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find_byte(b'\n') {
            let line = self.pending.split_to(pos + 1);
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Appends a chunk of text, returning the lines completed by it.
    #[inline]
    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Returns true if there is a partial line waiting for its terminator.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Consumes the buffer, returning the final unterminated line, if any.
    ///
    /// This is called once the stream has ended, for example on process exit.
    pub fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| decode_line(&self.pending))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    bytes.to_str_lossy().into_owned()
}
