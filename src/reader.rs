use zerocopy::FromBytes;

/// Reads fixed-layout structs out of a file image.
pub trait Reader {
    fn read_at<T: FromBytes>(&self, offset: u64) -> Option<T>;
    fn read_slice_at(&self, offset: u64, len: usize) -> Option<&[u8]>;
}

impl Reader for [u8] {
    fn read_at<T: FromBytes>(&self, offset: u64) -> Option<T> {
        let offset: usize = offset.try_into().ok()?;
        let (value, _rest) = T::read_from_prefix(self.get(offset..)?).ok()?;
        Some(value)
    }

    fn read_slice_at(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let offset: usize = offset.try_into().ok()?;
        let end: usize = offset.checked_add(len)?;
        self.get(offset..end)
    }
}
