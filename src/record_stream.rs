use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::collections::BTreeMap;
use std::io::{self, Read};

use crate::config::DecodeConfig;
use crate::error::{DecodeError, PartialDecode, PayloadOverrun};
use crate::header::RecordHeader;
use crate::perf_event::{CommRecord, LostRecord, MmapRecord};
use crate::sample::SampleRecord;
use crate::types::RecordKind;
use crate::unaligned::Endianness;

/// One record pulled from a [`RecordStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Mmap(MmapRecord),
    Comm(CommRecord),
    Lost(LostRecord),
    Sample(SampleRecord),
    /// A kind without a field-level decoder. Its payload was skipped.
    Unmodeled { header: RecordHeader },
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Mmap(_) => RecordKind::Mmap,
            Record::Comm(_) => RecordKind::Comm,
            Record::Lost(_) => RecordKind::Lost,
            Record::Sample(_) => RecordKind::Sample,
            Record::Unmodeled { header } => header.kind,
        }
    }
}

/// Decodes records one at a time from a reader positioned at the start of a
/// record section.
///
/// Each record's payload is read into an internal buffer of exactly
/// `header.size - 8` bytes before it is decoded, so the stream stays in sync
/// whatever the decoder does with those bytes. After the first error the
/// stream is finished and yields nothing more.
pub struct RecordStream<R: Read> {
    reader: R,
    config: DecodeConfig,
    offset: u64,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: Read> RecordStream<R> {
    pub fn new(reader: R, config: DecodeConfig) -> Self {
        Self {
            reader,
            config,
            offset: 0,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Bytes consumed from the reader so far.
    pub fn position(&self) -> u64 {
        self.offset
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads and decodes the next record.
    ///
    /// Returns `Ok(None)` at the end of the input. Fewer than 8 bytes left
    /// over at the end are not enough for a header and also end the stream.
    pub fn next_record(&mut self) -> Result<Option<Record>, DecodeError> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_record();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn read_record(&mut self) -> Result<Option<Record>, DecodeError> {
        let record_start = self.offset;
        let mut header_bytes = [0; RecordHeader::SIZE];
        let got = read_fully(&mut self.reader, &mut header_bytes)?;
        self.offset += got as u64;
        if got < RecordHeader::SIZE {
            if got != 0 {
                log::debug!(
                    "Ignoring {} bytes at offset {}, too few for a record header",
                    got,
                    record_start
                );
            }
            return Ok(None);
        }

        let header = match self.config.endian() {
            Endianness::LittleEndian => RecordHeader::parse::<LittleEndian>(&header_bytes)?,
            Endianness::BigEndian => RecordHeader::parse::<BigEndian>(&header_bytes)?,
        };
        let inconsistent = |needed: u64| DecodeError::InconsistentLength {
            offset: record_start,
            kind: header.kind,
            size: header.size,
            needed,
        };
        let payload_len = header
            .payload_len()
            .ok_or_else(|| inconsistent(RecordHeader::SIZE as u64))?;

        self.buffer.clear();
        self.buffer.resize(payload_len, 0);
        let got = read_fully(&mut self.reader, &mut self.buffer)?;
        self.offset += got as u64;
        if got < payload_len {
            return Err(DecodeError::TruncatedInput {
                offset: record_start,
                needed: u64::from(header.size),
                available: (RecordHeader::SIZE + got) as u64,
            });
        }

        let record = match self.config.endian() {
            Endianness::LittleEndian => self.decode_payload::<LittleEndian>(header),
            Endianness::BigEndian => self.decode_payload::<BigEndian>(header),
        }
        .map_err(|overrun| {
            // A garbage count inside the payload saturates `needed`.
            inconsistent((RecordHeader::SIZE as u64).saturating_add(overrun.needed as u64))
        })?;

        if let Record::Unmodeled { header } = &record {
            log::debug!(
                "Skipped {:?} record of {} bytes at offset {}",
                header.kind,
                header.size,
                record_start
            );
        }
        Ok(Some(record))
    }

    fn decode_payload<T: ByteOrder>(&self, header: RecordHeader) -> Result<Record, PayloadOverrun> {
        let payload = &self.buffer[..];
        let config = &self.config;
        let record = match header.kind {
            RecordKind::Mmap => Record::Mmap(MmapRecord::parse::<T>(payload, header.misc, config)?),
            RecordKind::Comm => Record::Comm(CommRecord::parse::<T>(payload, header.misc, config)?),
            RecordKind::Lost => Record::Lost(LostRecord::parse::<T>(payload, config)?),
            RecordKind::Sample => {
                Record::Sample(SampleRecord::parse::<T>(payload, header.misc, config)?)
            }
            _ => Record::Unmodeled { header },
        };
        Ok(record)
    }

    /// Decodes every remaining record into `records`.
    ///
    /// On error, `records` keeps everything decoded before the failing
    /// record.
    pub fn decode_into(&mut self, records: &mut DecodedRecordSet) -> Result<(), DecodeError> {
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(())
    }

    /// Decodes the whole stream.
    pub fn decode_all(mut self) -> Result<DecodedRecordSet, PartialDecode> {
        let mut records = DecodedRecordSet::default();
        match self.decode_into(&mut records) {
            Ok(()) => Ok(records),
            Err(error) => Err(PartialDecode { records, error }),
        }
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Fills `buf` from `reader`, stopping early only at the end of the input.
/// Returns the number of bytes read.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// The output of a decode pass: modeled records by kind, each in stream
/// order, and a count of the skipped records of every unmodeled kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRecordSet {
    mmap: Vec<MmapRecord>,
    comm: Vec<CommRecord>,
    lost: Vec<LostRecord>,
    sample: Vec<SampleRecord>,
    skipped: BTreeMap<RecordKind, u64>,
}

impl DecodedRecordSet {
    pub fn mmap_records(&self) -> &[MmapRecord] {
        &self.mmap
    }

    pub fn comm_records(&self) -> &[CommRecord] {
        &self.comm
    }

    pub fn lost_records(&self) -> &[LostRecord] {
        &self.lost
    }

    pub fn sample_records(&self) -> &[SampleRecord] {
        &self.sample
    }

    /// How many records of each unmodeled kind were skipped.
    pub fn skipped(&self) -> &BTreeMap<RecordKind, u64> {
        &self.skipped
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// The number of decoded records, not counting skipped ones.
    pub fn len(&self) -> usize {
        self.mmap.len() + self.comm.len() + self.lost.len() + self.sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds one record: modeled ones to their collection, unmodeled ones to
    /// the skip count of their kind.
    pub fn push(&mut self, record: Record) {
        match record {
            Record::Mmap(r) => self.mmap.push(r),
            Record::Comm(r) => self.comm.push(r),
            Record::Lost(r) => self.lost.push(r),
            Record::Sample(r) => self.sample.push(r),
            Record::Unmodeled { header } => *self.skipped.entry(header.kind).or_default() += 1,
        }
    }
}
