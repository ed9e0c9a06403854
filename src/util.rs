/// Shortest back-reference the format will emit
pub const MIN_SEQUENCE_LENGTH: usize = 4;
/// Longest back-reference, limited by the 5 length bits of a pointer lead byte
pub const MAX_SEQUENCE_LENGTH: usize = 31;
/// Furthest back-reference, limited by the 15 distance bits of a long pointer
pub const MAX_MATCH_DISTANCE: usize = 32767;

/// Distances below this fit in a single byte after the lead byte
pub(crate) const SHORT_DISTANCE_LIMIT: usize = 128;

/// Internal abstraction for the two token consumers (token writer vs output window)
pub(crate) trait OutputSink<ErrTy> {
    /// Add the given literal run to the output
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), ErrTy>;
    /// Add a backreference to the output
    ///
    /// A `distance` of 1 means the byte just before the current position.
    ///
    /// Copy `len` bytes, which as usual for LZ77 may exceed `distance`.
    fn put_backref(&mut self, distance: usize, len: usize) -> Result<(), ErrTy>;
}

/// A backreference pointed before the start of the retained history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutOfWindow {
    pub distance: usize,
    pub available: usize,
}

/// Bounded tail of a byte stream
///
/// `start` is the stream position of `buf[0]`, so `start + i` is always the
/// true stream position of `buf[i]`.
#[derive(Debug, Clone)]
pub(crate) struct Window {
    buf: Vec<u8>,
    start: usize,
}
impl Window {
    pub fn new(start: usize) -> Self {
        Self {
            buf: Vec::new(),
            start,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Stream position one past the last retained byte
    pub fn end(&self) -> usize {
        self.start + self.buf.len()
    }

    /// Drop everything except the trailing [MAX_MATCH_DISTANCE] bytes
    ///
    /// Returns the number of bytes retained.
    pub fn crop(&mut self) -> usize {
        let keep = usize::min(self.buf.len(), MAX_MATCH_DISTANCE);
        let dropped = self.buf.len() - keep;
        if dropped > 0 {
            self.buf.drain(..dropped);
            self.start += dropped;
        }
        keep
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Remove the last `n` bytes and hand them back
    pub fn split_off_tail(&mut self, n: usize) -> Vec<u8> {
        debug_assert!(n <= self.buf.len());
        self.buf.split_off(self.buf.len() - n)
    }
}

impl OutputSink<OutOfWindow> for Window {
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), OutOfWindow> {
        self.buf.extend_from_slice(lits);
        Ok(())
    }

    fn put_backref(&mut self, distance: usize, len: usize) -> Result<(), OutOfWindow> {
        let pos = self.buf.len();
        if distance == 0 || distance > pos {
            return Err(OutOfWindow {
                distance,
                available: pos,
            });
        }

        // byte at a time, source and destination may overlap
        self.buf.reserve(len);
        for i in 0..len {
            let b = self.buf[pos - distance + i];
            self.buf.push(b);
        }

        Ok(())
    }
}
