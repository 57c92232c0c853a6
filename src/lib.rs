//! A decoder for the event-record stream of Linux `perf.data` captures.
//!
//! The record section of a capture is a sequence of self-describing records.
//! Their layout depends on bitmasks taken from the capture's attributes, which
//! are resolved once into a [`DecodeConfig`] and then handed to a
//! [`RecordStream`]:
//!
//! ```
//! use perf_records::{DecodeConfig, RecordStream, SampleFormat};
//!
//! // A PERF_RECORD_LOST record: id 5, 3 records lost.
//! let mut data = vec![2, 0, 0, 0, 0, 0, 24, 0];
//! data.extend_from_slice(&5u64.to_le_bytes());
//! data.extend_from_slice(&3u64.to_le_bytes());
//!
//! let config = DecodeConfig::new(SampleFormat::TID | SampleFormat::TIME);
//! let records = RecordStream::new(&data[..], config).decode_all().unwrap();
//! assert_eq!(records.lost_records()[0].count, 3);
//! ```
//!
//! Mmap, Comm, Lost and Sample records are decoded field by field. Every
//! other kind is skipped by its declared size and counted.
//!
//! [`PerfFile`] reads the file header of a whole capture, for callers that
//! have the file in memory.

mod config;
mod cursor;
mod error;
mod header;
mod perf_event;
pub mod perf_event_raw;
mod perf_file;
mod reader;
mod record_stream;
mod sample;
mod sample_id;
mod types;
mod unaligned;
mod utils;

pub use config::DecodeConfig;
pub use error::{DecodeError, PartialDecode, PayloadOverrun};
pub use header::RecordHeader;
pub use perf_event::{CommRecord, LostRecord, MmapRecord};
pub use perf_file::{Error, PerfFile, PerfFileSection, PerfHeader, ReadError};
pub use record_stream::{DecodedRecordSet, Record, RecordStream};
pub use sample::{
    sample_sections, BranchEntry, BranchStack, ReadValue, ReadValues, Regs, SampleRecord,
    SampleSection, UserStack, SAMPLE_SECTIONS,
};
pub use sample_id::SampleId;
pub use types::{BranchSampleFormat, CpuMode, ReadFormat, RecordKind, RecordMisc, SampleFormat};
pub use unaligned::{Endianness, U16, U32, U64};
