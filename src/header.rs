use byteorder::ByteOrder;

use crate::error::DecodeError;
use crate::types::{RecordKind, RecordMisc};

/// `perf_event_header`: the 8 bytes in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: RecordKind,
    pub misc: RecordMisc,
    /// Total size of the record in bytes, including this header.
    pub size: u16,
}

impl RecordHeader {
    pub const SIZE: usize = 8;

    /// Parses a header from the start of `data`.
    ///
    /// Offsets in the returned error are relative to `data`.
    pub fn parse<T: ByteOrder>(data: &[u8]) -> Result<Self, DecodeError> {
        let bytes = data
            .get(..Self::SIZE)
            .ok_or(DecodeError::TruncatedInput {
                offset: 0,
                needed: Self::SIZE as u64,
                available: data.len() as u64,
            })?;
        Ok(Self {
            kind: RecordKind::from_u32(T::read_u32(&bytes[0..4])),
            misc: RecordMisc(T::read_u16(&bytes[4..6])),
            size: T::read_u16(&bytes[6..8]),
        })
    }

    /// The number of bytes following the header, or `None` if the declared
    /// size cannot even hold the header.
    pub fn payload_len(&self) -> Option<usize> {
        usize::from(self.size).checked_sub(Self::SIZE)
    }
}
