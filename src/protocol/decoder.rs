// src/protocol/decoder.rs

//! Reassembly of newline-delimited text from arbitrary byte chunks.
//!
//! Pipes hand us whatever the OS had buffered, so a single logical line can
//! arrive split over several reads (or several lines in one read). The
//! decoder keeps the unterminated tail between calls and only yields a line
//! once its `\n` has been seen, or when the stream ends.

use thiserror::Error;

use crate::types::StreamSource;

/// Longest line, terminator included, the decoder will buffer. Anything
/// longer is reported once and dropped up to its next `\n`.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// A line that could not be turned into text.
///
/// The offending bytes are dropped; decoding continues with the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamDecodeError {
    #[error("{stream} line of {len} bytes is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        stream: StreamSource,
        len: usize,
        valid_up_to: usize,
    },

    #[error("{stream} line longer than {limit} bytes; dropped")]
    LineTooLong { stream: StreamSource, limit: usize },
}

impl StreamDecodeError {
    pub fn stream(&self) -> StreamSource {
        match self {
            StreamDecodeError::InvalidUtf8 { stream, .. }
            | StreamDecodeError::LineTooLong { stream, .. } => *stream,
        }
    }
}

pub type DecodedLine = Result<String, StreamDecodeError>;

/// Incremental line decoder for one output stream.
#[derive(Debug)]
pub struct LineDecoder {
    stream: StreamSource,
    pending: Vec<u8>,
    max_line: usize,
    /// Inside an overlong line that was already reported.
    discarding: bool,
}

impl LineDecoder {
    pub fn new(stream: StreamSource) -> Self {
        Self::with_max_line(stream, MAX_LINE_BYTES)
    }

    pub fn with_max_line(stream: StreamSource, max_line: usize) -> Self {
        Self {
            stream,
            pending: Vec::new(),
            max_line,
            discarding: false,
        }
    }

    /// Feed the next chunk and return every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DecodedLine> {
        let mut lines = Vec::new();

        let mut chunk = chunk;
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    chunk = &chunk[pos + 1..];
                }
                None => return lines,
            }
        }

        // Only the new bytes can contain a terminator we haven't seen yet.
        let mut search = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(pos) = self.pending[search..].iter().position(|b| *b == b'\n') {
            let end = search + pos;
            let line = &self.pending[start..end];
            lines.push(if line.len() > self.max_line {
                Err(self.too_long())
            } else {
                decode_line(self.stream, line)
            });
            start = end + 1;
            search = start;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line {
            lines.push(Err(self.too_long()));
            self.pending.clear();
            self.discarding = true;
        }
        lines
    }

    /// Flush the unterminated tail at end of stream, if any.
    pub fn finish(&mut self) -> Option<DecodedLine> {
        self.discarding = false;
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(decode_line(self.stream, &tail))
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn too_long(&self) -> StreamDecodeError {
        StreamDecodeError::LineTooLong {
            stream: self.stream,
            limit: self.max_line,
        }
    }
}

fn decode_line(stream: StreamSource, bytes: &[u8]) -> DecodedLine {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| StreamDecodeError::InvalidUtf8 {
            stream,
            len: bytes.len(),
            valid_up_to: e.valid_up_to(),
        })
}
