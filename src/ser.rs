//! Byte-level helpers shared by every wire codec: big-endian integer
//! encodings, buffer concatenation and a bounds-checked reader.

use crate::errors::PstError;

#[inline]
#[must_use]
pub const fn be16(x: u16) -> [u8; 2] {
    x.to_be_bytes()
}

#[inline]
#[must_use]
pub const fn be32(x: u32) -> [u8; 4] {
    x.to_be_bytes()
}

/// Concatenate byte ranges into one contiguous buffer.
#[must_use]
pub fn join_all(parts: &[&[u8]]) -> Vec<u8> {
    let mut v = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for p in parts {
        v.extend_from_slice(p);
    }
    v
}

/// Sequential reader over a received buffer. Every read is bounds-checked
/// and names the field it was decoding when it runs out of bytes.
pub struct Reader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.off
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `n` bytes.
    ///
    /// # Errors
    /// `PstError::TruncatedBuffer` when fewer than `n` bytes remain.
    pub fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], PstError> {
        if self.remaining() < n {
            return Err(PstError::TruncatedBuffer { field, needed: n, got: self.remaining() });
        }
        let out = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(out)
    }

    /// Read a big-endian `u16`.
    ///
    /// # Errors
    /// `PstError::TruncatedBuffer` when fewer than 2 bytes remain.
    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, PstError> {
        let b = self.take(field, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian `u32`.
    ///
    /// # Errors
    /// `PstError::TruncatedBuffer` when fewer than 4 bytes remain.
    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, PstError> {
        let b = self.take(field, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Look at the next two bytes as a big-endian `u16` without consuming them.
    #[must_use]
    pub fn peek_u16(&self) -> Option<u16> {
        let b = self.buf.get(self.off..self.off + 2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Consume everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.off..];
        self.off = self.buf.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_all_concatenates_in_order() {
        assert_eq!(join_all(&[&[1, 2], &[], &[3], &[4, 5, 6]]), vec![1, 2, 3, 4, 5, 6]);
        assert!(join_all(&[]).is_empty());
    }

    #[test]
    fn reader_is_big_endian_and_bounds_checked() {
        let buf = [0x01, 0x02, 0x00, 0x00, 0x00, 0x2a, 0xff];
        let mut r = Reader::new(&buf);
        assert_eq!(r.peek_u16(), Some(0x0102));
        assert_eq!(r.read_u16("a").unwrap(), 0x0102);
        assert_eq!(r.read_u32("b").unwrap(), 42);
        assert_eq!(r.remaining(), 1);
        assert!(matches!(
            r.read_u16("c"),
            Err(PstError::TruncatedBuffer { field: "c", needed: 2, got: 1 })
        ));
        assert_eq!(r.rest(), &[0xff]);
        assert!(r.is_empty());
        assert_eq!(r.peek_u16(), None);
    }
}
