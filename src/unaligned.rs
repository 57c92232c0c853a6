use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// The byte order of a perf.data file, as announced by its magic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    #[default]
    LittleEndian,
    BigEndian,
}

/// An unaligned `u64` value with runtime endian.
#[derive(
    Unaligned,
    FromBytes,
    Immutable,
    KnownLayout,
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[repr(transparent)]
pub struct U64(pub [u8; 8]);

impl U64 {
    pub fn get(&self, endian: Endianness) -> u64 {
        match endian {
            Endianness::LittleEndian => u64::from_le_bytes(self.0),
            Endianness::BigEndian => u64::from_be_bytes(self.0),
        }
    }
}

/// An unaligned `u32` value with runtime endian.
#[derive(
    Unaligned,
    FromBytes,
    Immutable,
    KnownLayout,
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[repr(transparent)]
pub struct U32(pub [u8; 4]);

impl U32 {
    pub fn get(&self, endian: Endianness) -> u32 {
        match endian {
            Endianness::LittleEndian => u32::from_le_bytes(self.0),
            Endianness::BigEndian => u32::from_be_bytes(self.0),
        }
    }
}

/// An unaligned `u16` value with runtime endian.
#[derive(
    Unaligned,
    FromBytes,
    Immutable,
    KnownLayout,
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[repr(transparent)]
pub struct U16(pub [u8; 2]);

impl U16 {
    pub fn get(&self, endian: Endianness) -> u16 {
        match endian {
            Endianness::LittleEndian => u16::from_le_bytes(self.0),
            Endianness::BigEndian => u16::from_be_bytes(self.0),
        }
    }
}
