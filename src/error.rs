use crate::record_stream::DecodedRecordSet;
use crate::types::RecordKind;

/// The error type of a decode pass.
///
/// Every variant is fatal to the pass: nothing after a failed record can be
/// trusted to start at a record boundary.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The input ended inside a record. `offset` is where the record (or the
    /// header being read) starts, relative to the start of the record stream.
    #[error("Input ended inside the record at offset {offset}: needed {needed} bytes, only {available} remained")]
    TruncatedInput {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// Decoding a record would have consumed more bytes than its header
    /// declared, or the header declared a size smaller than itself.
    #[error("Record of kind {kind:?} at offset {offset} declares {size} bytes but its fields need {needed}")]
    InconsistentLength {
        offset: u64,
        kind: RecordKind,
        size: u16,
        needed: u64,
    },

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

/// A field read ran past the end of a record payload.
///
/// This is what the per-kind decoders return; the stream turns it into
/// [`DecodeError::InconsistentLength`] once it knows where the record is.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Record payload has {available} bytes but its fields need {needed}")]
pub struct PayloadOverrun {
    /// Payload bytes the failed read needed, counted from the payload start.
    pub needed: usize,
    /// Payload bytes there are.
    pub available: usize,
}

/// A decode pass that stopped early, together with everything it decoded
/// before the failing record.
#[derive(thiserror::Error, Debug)]
#[error("Decoding stopped after {} records: {error}", .records.len())]
pub struct PartialDecode {
    pub records: DecodedRecordSet,
    #[source]
    pub error: DecodeError,
}
