/// Number of prefix buckets
///
/// This is prime so that the polynomial hash doesn't degenerate on the
/// low bits of ASCII-heavy input.
pub const PREFIX_HASH_TABLE_SIZE: usize = 65537;

/// Bucket index for the 4-byte prefix starting a candidate sequence
pub fn bucket_index(prefix: [u8; 4]) -> usize {
    let [b0, b1, b2, b3] = prefix.map(usize::from);
    (b0 * 7880599 + b1 * 39601 + b2 * 199 + b3) % PREFIX_HASH_TABLE_SIZE
}

/// Storage for the positions the match finder searches
///
/// Positions are 1-based stream offsets, added in increasing order.
/// `bucket` must return them oldest first.
pub trait PrefixTable {
    /// Record that the sequence at stream `position` hashes to `bucket`
    fn add_position(&mut self, bucket: usize, position: usize);
    /// Positions recorded for `bucket`, oldest first
    fn bucket(&self, bucket: usize) -> &[usize];
    fn used_bucket_count(&self) -> usize;
    fn total_element_count(&self) -> usize;
}

/// Maps a 4-byte prefix hash to every stream position that started with it
///
/// Nothing is ever removed; positions too far back to be referenced are skipped
/// by the match finder instead. Bucket keys are taken modulo
/// [PREFIX_HASH_TABLE_SIZE].
pub struct PrefixIndex {
    buckets: Box<[Vec<usize>]>,
}
impl PrefixIndex {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); PREFIX_HASH_TABLE_SIZE].into_boxed_slice(),
        }
    }
}
impl PrefixTable for PrefixIndex {
    fn add_position(&mut self, bucket: usize, position: usize) {
        debug_assert!(position != 0);
        self.buckets[bucket % PREFIX_HASH_TABLE_SIZE].push(position);
    }

    fn bucket(&self, bucket: usize) -> &[usize] {
        &self.buckets[bucket % PREFIX_HASH_TABLE_SIZE]
    }

    fn used_bucket_count(&self) -> usize {
        self.buckets.iter().filter(|b| !b.is_empty()).count()
    }

    fn total_element_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}
impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}
