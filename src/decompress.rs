use std::string::FromUtf8Error;

use log::{debug, trace};
use thiserror::Error;

use crate::util::*;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecompressError {
    /// A pointer reached further back than the decoded history.
    ///
    /// `decoded` holds the output this call produced before the bad token.
    #[error("invalid backreference: distance {distance} with {available} bytes of history")]
    MalformedToken {
        distance: usize,
        available: usize,
        decoded: Vec<u8>,
    },
    #[error("input ended in the middle of a pointer")]
    TruncatedInput,
    #[error("decompressed block is not valid UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Lead byte of either a multi-byte codepoint or a pointer
fn is_lead(value: u8) -> bool {
    value >> 6 == 0b11
}

/// Lead byte of a 3 byte pointer (or of a 3/4 byte codepoint)
fn is_long_lead(value: u8) -> bool {
    value >> 5 == 0b111
}

/// Streaming LZ-UTF8 decompressor
///
/// Blocks may be split anywhere, including in the middle of a token. Output
/// never ends with an incomplete UTF-8 codepoint: those bytes are held back
/// and returned at the start of the next call.
pub struct Decompressor {
    window: Window,
    input_remainder: Option<Vec<u8>>,
    output_remainder: Option<Vec<u8>>,
}
impl Decompressor {
    /// Create a decompressor for a new stream
    pub fn new() -> Self {
        Self {
            window: Window::new(0),
            input_remainder: None,
            output_remainder: None,
        }
    }

    /// Total number of bytes returned so far
    pub fn output_position(&self) -> usize {
        self.window.end()
    }

    /// Decompress the next block of the stream
    ///
    /// Returns only the bytes produced by this block.
    pub fn decompress_block(&mut self, block: impl AsRef<[u8]>) -> Result<Vec<u8>, DecompressError> {
        let block = block.as_ref();

        let joined;
        let inp: &[u8] = match self.input_remainder.take() {
            Some(mut remainder) => {
                remainder.extend_from_slice(block);
                joined = remainder;
                &joined
            }
            None => block,
        };

        let output_start = self.window.crop();
        if let Some(remainder) = self.output_remainder.take() {
            self.window.extend(&remainder);
        }

        let mut pos = 0;
        while pos < inp.len() {
            let value = inp[pos];

            // plain ASCII or a continuation byte
            if !is_lead(value) {
                self.put_lit(value);
                pos += 1;
                continue;
            }

            // not enough left to tell a codepoint from a pointer, or to read the pointer
            if pos == inp.len() - 1 || (pos == inp.len() - 2 && is_long_lead(value)) {
                self.input_remainder = Some(inp[pos..].to_vec());
                break;
            }

            // followed by a continuation byte, so it's a literal codepoint
            if inp[pos + 1] >> 7 == 1 {
                self.put_lit(value);
                pos += 1;
                continue;
            }

            let len = (value & 0b000_11111) as usize;
            let distance = if is_long_lead(value) {
                let distance = ((inp[pos + 1] as usize) << 8) | inp[pos + 2] as usize;
                pos += 3;
                distance
            } else {
                let distance = inp[pos + 1] as usize;
                pos += 2;
                distance
            };

            if let Err(err) = self.window.put_backref(distance, len) {
                debug!(
                    "rejecting pointer (distance {}, length {}) with only {} bytes of history",
                    err.distance, len, err.available
                );
                return Err(DecompressError::MalformedToken {
                    distance: err.distance,
                    available: err.available,
                    decoded: self.window.as_slice()[output_start..].to_vec(),
                });
            }
        }

        self.hold_back_truncated_codepoint(output_start);

        let produced = self.window.as_slice()[output_start..].to_vec();
        trace!(
            "decompressed {} byte block into {} bytes",
            block.len(),
            produced.len()
        );
        Ok(produced)
    }

    /// Decompress the next block of the stream as text
    pub fn decompress_block_to_string(
        &mut self,
        block: impl AsRef<[u8]>,
    ) -> Result<String, DecompressError> {
        let bytes = self.decompress_block(block)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Flush anything still held back at the end of the stream
    ///
    /// A well-formed UTF-8 stream never leaves anything behind, so this
    /// only returns bytes when the uncompressed data wasn't valid UTF-8.
    /// The decompressor can keep going afterwards.
    pub fn finish(&mut self) -> Result<Vec<u8>, DecompressError> {
        // two byte pointers are always decoded, so only a cut off long one is left here
        if let Some(&[value, next]) = self.input_remainder.as_deref() {
            if next >> 7 == 0 {
                debug_assert!(is_long_lead(value));
                return Err(DecompressError::TruncatedInput);
            }
        }

        let output_start = self.window.crop();
        if let Some(remainder) = self.output_remainder.take() {
            self.window.extend(&remainder);
        }

        // a pointer is at least 2 bytes, so a lone lead byte is a literal
        if let Some(inp) = self.input_remainder.take() {
            self.window.extend(&inp);
        }

        Ok(self.window.as_slice()[output_start..].to_vec())
    }

    fn put_lit(&mut self, value: u8) {
        self.window.extend(&[value]);
    }

    /// Move an incomplete codepoint at the end of the output into the output remainder
    fn hold_back_truncated_codepoint(&mut self, output_start: usize) {
        let produced = &self.window.as_slice()[output_start..];

        for offset in 1..=usize::min(4, produced.len()) {
            let value = produced[produced.len() - offset];
            if (offset < 4 && value >> 3 == 0b11110)
                || (offset < 3 && value >> 4 == 0b1110)
                || (offset < 2 && value >> 5 == 0b110)
            {
                debug!("holding back {} bytes of an incomplete codepoint", offset);
                self.output_remainder = Some(self.window.split_off_tail(offset));
                return;
            }
        }
    }
}
impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}
