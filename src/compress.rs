use log::trace;
use thiserror::Error;

use crate::hashtable::{bucket_index, PrefixIndex, PrefixTable};
use crate::util::*;

/// Compression errors
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompressError {
    /// An empty block was passed in
    #[error("input block was empty")]
    InvalidInput,
    /// A pointer did not fit in the token format.
    ///
    /// The match finder never produces these, so seeing one is a bug.
    #[error("pointer (distance {distance}, length {length}) does not fit the token format")]
    EncodingOverflow { distance: usize, length: usize },
}

/// Writes literal bytes and pointer tokens
struct TokenOutput {
    vec: Vec<u8>,
}
impl TokenOutput {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            vec: Vec::with_capacity(capacity),
        }
    }
}
impl OutputSink<CompressError> for TokenOutput {
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), CompressError> {
        // literals are never escaped
        self.vec.extend_from_slice(lits);
        Ok(())
    }

    fn put_backref(&mut self, distance: usize, len: usize) -> Result<(), CompressError> {
        debug_assert!((MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&len));
        debug_assert!((1..=MAX_MATCH_DISTANCE).contains(&distance));

        if len > MAX_SEQUENCE_LENGTH || distance == 0 || distance > MAX_MATCH_DISTANCE {
            return Err(CompressError::EncodingOverflow {
                distance,
                length: len,
            });
        }

        if distance < SHORT_DISTANCE_LIMIT {
            // 2 bytes: 110lllll 0ddddddd
            self.vec.push(0b110_00000 | len as u8);
            self.vec.push(distance as u8);
        } else {
            // 3 bytes: 111lllll 0ddddddd dddddddd
            self.vec.push(0b111_00000 | len as u8);
            self.vec.push((distance >> 8) as u8);
            self.vec.push(distance as u8);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MatchLocator {
    distance: usize,
    length: usize,
}

/// Longest earlier occurrence of the sequence at `pos`, if one is worth a pointer
///
/// `input` is the retained window and `start` its stream offset.
fn find_longest_match(
    index: &impl PrefixTable,
    input: &[u8],
    start: usize,
    pos: usize,
    bucket: usize,
) -> Option<MatchLocator> {
    let mut longest: Option<MatchLocator> = None;

    // newest candidates first, so the nearest ones get a chance before we run out of distance
    for &candidate in index.bucket(bucket).iter().rev() {
        let distance = start + pos - candidate;

        let len_to_surpass = match longest {
            None => MIN_SEQUENCE_LENGTH - 1,
            // a far pointer costs a byte more, so it has to be quite a bit longer to win
            Some(m) if m.distance < SHORT_DISTANCE_LIMIT && distance >= SHORT_DISTANCE_LIMIT => {
                m.length + (m.length >> 1)
            }
            Some(m) => m.length,
        };

        if distance > MAX_MATCH_DISTANCE
            || len_to_surpass >= MAX_SEQUENCE_LENGTH
            || pos + len_to_surpass >= input.len()
        {
            break;
        }

        // distance is in range, so this is inside the window
        let tested = candidate - start;

        // a candidate can't win unless it also matches at the byte that would make it longer
        if input[tested + len_to_surpass] != input[pos + len_to_surpass] {
            continue;
        }

        let mut offset = 0;
        loop {
            if pos + offset == input.len() || input[tested + offset] != input[pos + offset] {
                if offset > len_to_surpass {
                    longest = Some(MatchLocator {
                        distance,
                        length: offset,
                    });
                }
                break;
            } else if offset == MAX_SEQUENCE_LENGTH {
                // can't do any better than this
                return Some(MatchLocator {
                    distance,
                    length: MAX_SEQUENCE_LENGTH,
                });
            }
            offset += 1;
        }
    }

    longest
}

/// Streaming LZ-UTF8 compressor
///
/// Each call to [compress_block](Compressor::compress_block) may reference data
/// from up to [MAX_MATCH_DISTANCE] bytes of earlier blocks, so the output of all
/// calls must be decompressed in order by a single [Decompressor](crate::Decompressor).
///
/// Candidate positions live in a [PrefixTable], by default a [PrefixIndex].
pub struct Compressor<T = PrefixIndex> {
    window: Window,
    index: T,
}
impl Compressor {
    /// Create a compressor for a new stream
    pub fn new() -> Self {
        Self::with_prefix_table(PrefixIndex::new())
    }
}
impl<T: PrefixTable> Compressor<T> {
    /// Create a compressor for a new stream that records candidates in `table`
    ///
    /// `table` should be empty.
    pub fn with_prefix_table(table: T) -> Self {
        Self {
            // stream positions start at 1 so the index never holds a 0
            window: Window::new(1),
            index: table,
        }
    }

    /// The prefix table built up so far
    pub fn prefix_index(&self) -> &T {
        &self.index
    }

    /// Compress the next block of the stream
    ///
    /// Returns only the tokens for this block. Empty blocks are rejected with
    /// [CompressError::InvalidInput].
    pub fn compress_block(&mut self, block: impl AsRef<[u8]>) -> Result<Vec<u8>, CompressError> {
        let block = block.as_ref();
        if block.is_empty() {
            return Err(CompressError::InvalidInput);
        }

        let read_start = self.window.crop();
        self.window.extend(block);

        let Self { window, index } = self;
        let input = window.as_slice();
        let start = window.start();
        let mut outp = TokenOutput::with_capacity(block.len());

        let mut match_end = 0;
        for pos in read_start..input.len() {
            let mut within_match = pos < match_end;

            // the last 3 bytes can't start a sequence
            if pos + MIN_SEQUENCE_LENGTH > input.len() {
                if !within_match {
                    outp.put_lits(&input[pos..pos + 1])?;
                }
                continue;
            }

            let bucket = bucket_index([input[pos], input[pos + 1], input[pos + 2], input[pos + 3]]);

            if !within_match {
                if let Some(m) = find_longest_match(&*index, input, start, pos, bucket) {
                    outp.put_backref(m.distance, m.length)?;
                    match_end = pos + m.length;
                    within_match = true;
                }
            }

            if !within_match {
                outp.put_lits(&input[pos..pos + 1])?;
            }

            // positions inside a match are indexed too, later sequences may point into them
            index.add_position(bucket, start + pos);
        }

        trace!(
            "compressed {} byte block into {} bytes ({} positions in {} buckets)",
            block.len(),
            outp.vec.len(),
            index.total_element_count(),
            index.used_bucket_count(),
        );

        Ok(outp.vec)
    }
}
impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}
