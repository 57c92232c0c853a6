use std::fmt;

pub struct HexValue(pub u64);
impl fmt::Debug for HexValue {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(fmt, "0x{:016X}", self.0)
    }
}

pub struct HexSlice<'a>(pub &'a [u64]);
impl<'a> fmt::Debug for HexSlice<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fmt.debug_list()
            .entries(self.0.iter().map(|&value| HexValue(value)))
            .finish()
    }
}

/// Prints a byte blob as its length only.
pub struct ByteLen<'a>(pub &'a [u8]);
impl<'a> fmt::Debug for ByteLen<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(fmt, "[u8; {}]", self.0.len())
    }
}

/// Returns the part of `bytes` before the first NUL byte.
pub fn trim_at_nul(bytes: &[u8]) -> &[u8] {
    let len = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    &bytes[..len]
}
