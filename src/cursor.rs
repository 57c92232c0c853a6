use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::error::PayloadOverrun;

/// A forward-only reader over one record payload.
///
/// It never reads past the slice it was given; a read that would is a
/// [`PayloadOverrun`] and leaves the position unchanged.
#[derive(Debug)]
pub(crate) struct PayloadCursor<'a, T: ByteOrder> {
    data: &'a [u8],
    pos: usize,
    _endian: PhantomData<T>,
}

impl<'a, T: ByteOrder> PayloadCursor<'a, T> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            _endian: PhantomData,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PayloadOverrun> {
        let overrun = PayloadOverrun {
            needed: self.pos.saturating_add(len),
            available: self.data.len(),
        };
        if len > self.remaining() {
            return Err(overrun);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Everything left in the payload.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    pub fn read_u32(&mut self) -> Result<u32, PayloadOverrun> {
        Ok(T::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, PayloadOverrun> {
        Ok(T::read_u64(self.read_bytes(8)?))
    }

    /// Reads a u64 if `present`, for fields gated by a format bit.
    pub fn read_u64_if(&mut self, present: bool) -> Result<Option<u64>, PayloadOverrun> {
        if present {
            self.read_u64().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads `count` u64 values. The length is checked before anything is
    /// allocated, so a garbage count cannot cause a huge allocation.
    pub fn read_u64_array(&mut self, count: u64) -> Result<Vec<u64>, PayloadOverrun> {
        let byte_len = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(8))
            .unwrap_or(usize::MAX);
        let bytes = self.read_bytes(byte_len)?;
        Ok(bytes.chunks_exact(8).map(T::read_u64).collect())
    }

    /// Reads a byte blob whose length came from the payload itself.
    pub fn read_blob(&mut self, len: u64) -> Result<&'a [u8], PayloadOverrun> {
        self.read_bytes(usize::try_from(len).unwrap_or(usize::MAX))
    }
}
