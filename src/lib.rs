//! Streaming compression for UTF-8 text in the LZ-UTF8 format
//!
//! The format is a plain byte stream of literals and back-reference pointers,
//! with no header or checksum. Literal bytes are copied through unchanged, so
//! compressed ASCII text stays readable.

mod compress;
mod decompress;
mod hashtable;
mod util;

pub use compress::{CompressError, Compressor};
pub use decompress::{DecompressError, Decompressor};
pub use hashtable::{bucket_index, PrefixIndex, PrefixTable, PREFIX_HASH_TABLE_SIZE};
pub use util::{MAX_MATCH_DISTANCE, MAX_SEQUENCE_LENGTH, MIN_SEQUENCE_LENGTH};

/// Compress a whole input in one go
///
/// Returns [CompressError::InvalidInput] for empty input.
pub fn compress(inp: &[u8]) -> Result<Vec<u8>, CompressError> {
    Compressor::new().compress_block(inp)
}

/// Decompress a whole input in one go
pub fn decompress(inp: &[u8]) -> Result<Vec<u8>, DecompressError> {
    let mut state = Decompressor::new();
    let mut ret = state.decompress_block(inp)?;
    ret.extend(state.finish()?);
    Ok(ret)
}
