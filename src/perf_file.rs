use crate::config::DecodeConfig;
use crate::perf_event_raw::{PerfEventAttr, PERF_ATTR_SIZE_VER0};
use crate::reader::Reader;
use crate::record_stream::RecordStream;
use crate::unaligned::{Endianness, U32, U64};
use zerocopy::FromBytes;

/// The parts of a perf.data file a decode pass needs: the attributes and the
/// record section.
pub struct PerfFile<'a> {
    /// The record section.
    record_data: &'a [u8],

    /// The `perf_event_attr` of every event in the capture, in file order.
    perf_event_attrs: Vec<PerfEventAttr>,

    endian: Endianness,
}

impl<'a> PerfFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        let header = PerfHeader::parse(data)?;
        if &header.magic != b"PERFILE2" && &header.magic != b"2ELIFREP" {
            return Err(Error::UnrecognizedMagicValue(header.magic));
        }
        let endian = if header.magic[0] == b'P' {
            Endianness::LittleEndian
        } else {
            Endianness::BigEndian
        };

        let attrs_offset = header.attrs.offset.get(endian);
        let attrs_size = header.attrs.size.get(endian);
        let attrs_size = usize::try_from(attrs_size).map_err(|_| Error::SectionSizeTooBig)?;
        let attrs_section_data = data
            .read_slice_at(attrs_offset, attrs_size)
            .ok_or(ReadError::AttrsSection)?;
        let attr_size = header.attr_size.get(endian);
        if attr_size < u64::from(PERF_ATTR_SIZE_VER0) {
            return Err(Error::AttrSizeTooSmall(attr_size));
        }
        let attr_size = usize::try_from(attr_size).map_err(|_| Error::SectionSizeTooBig)?;
        if attrs_size % attr_size != 0 {
            return Err(Error::PartialAttrEntry {
                attrs_size: attrs_size as u64,
                attr_size: attr_size as u64,
            });
        }

        // Each entry is a perf_event_attr of the writer's version followed
        // by the section of its sample ids.
        let perf_event_attrs = attrs_section_data
            .chunks_exact(attr_size)
            .map(|entry| parse_attr(entry, endian))
            .collect::<Result<Vec<_>, _>>()?;
        if perf_event_attrs.is_empty() {
            return Err(Error::NoAttributes);
        }
        log::debug!("Got {} perf_event_attrs", perf_event_attrs.len());

        let data_offset = header.data.offset.get(endian);
        let data_size = header.data.size.get(endian);
        let data_size = usize::try_from(data_size).map_err(|_| Error::SectionSizeTooBig)?;
        let record_data = data
            .read_slice_at(data_offset, data_size)
            .ok_or(ReadError::DataSection)?;

        Ok(Self {
            record_data,
            perf_event_attrs,
            endian,
        })
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn attrs(&self) -> &[PerfEventAttr] {
        &self.perf_event_attrs
    }

    /// The decode configuration of the record section. The first attribute
    /// determines the layout of every record.
    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig::from_attr(&self.perf_event_attrs[0], self.endian)
    }

    pub fn record_data(&self) -> &'a [u8] {
        self.record_data
    }

    pub fn records(&self) -> RecordStream<&'a [u8]> {
        RecordStream::new(self.record_data, self.decode_config())
    }
}

/// Reads one attribute entry. Older writers have smaller attributes; the
/// fields they do not know about stay zero.
fn parse_attr(entry: &[u8], endian: Endianness) -> Result<PerfEventAttr, Error> {
    let declared = entry
        .read_at::<U32>(4)
        .ok_or(ReadError::PerfEventAttr)?
        .get(endian);
    let declared = if declared == 0 {
        PERF_ATTR_SIZE_VER0
    } else {
        declared
    };
    let len = (declared as usize)
        .min(entry.len())
        .min(std::mem::size_of::<PerfEventAttr>());
    let mut bytes = [0; std::mem::size_of::<PerfEventAttr>()];
    bytes[..len].copy_from_slice(&entry[..len]);
    let attr = bytes[..]
        .read_at::<PerfEventAttr>(0)
        .ok_or(ReadError::PerfEventAttr)?;
    Ok(attr)
}

/// `perf_header`
///
/// The magic number identifies the perf file and the version. Current perf versions
/// use PERFILE2. Old perf versions generated a version 1 format (PERFFILE). Version 1
/// is not described here. The magic number also identifies the endian. When the
/// magic value is 64bit byte swapped compared the file is in non-native
/// endian.
#[derive(FromBytes, Debug, Clone, Copy)]
#[repr(C)]
pub struct PerfHeader {
    /// b"PERFILE2" for little-endian, b"2ELIFREP" for big-endian
    pub magic: [u8; 8],
    /// size of the header
    pub size: U64,
    /// size of an attribute in attrs
    pub attr_size: U64,
    pub attrs: PerfFileSection,
    pub data: PerfFileSection,
    /// Ignored
    pub event_types: PerfFileSection,
    /// Room for 4 * 64 = 256 header flag bits
    pub flags: [U64; 4],
}

impl PerfHeader {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn parse(data: &[u8]) -> Result<Self, ReadError> {
        data.read_at::<PerfHeader>(0).ok_or(ReadError::PerfHeader)
    }
}

/// `perf_file_section`
///
/// A pointer to another section of the perf file.
#[derive(FromBytes, Debug, Clone, Copy)]
#[repr(C)]
pub struct PerfFileSection {
    /// offset from start of file
    pub offset: U64,
    /// size of the section
    pub size: U64,
}

/// The error type for reading a perf.data file header.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The data slice was not big enough to read the struct, or we
    /// were trying to follow an invalid offset to somewhere outside
    /// of the data bounds.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Did not recognize magic value {0:?}")]
    UnrecognizedMagicValue([u8; 8]),

    #[error("Section size did not fit into usize")]
    SectionSizeTooBig,

    #[error("Attribute entries of {0} bytes cannot hold a perf_event_attr")]
    AttrSizeTooSmall(u64),

    #[error("The attrs section of {attrs_size} bytes does not hold a whole number of {attr_size}-byte entries")]
    PartialAttrEntry { attrs_size: u64, attr_size: u64 },

    #[error("The file has no perf_event_attrs")]
    NoAttributes,
}

/// This error indicates that the data slice was not large enough to
/// read the respective item.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    #[error("Could not read PerfHeader")]
    PerfHeader,

    #[error("Could not read AttrsSection")]
    AttrsSection,

    #[error("Could not read PerfEventAttr")]
    PerfEventAttr,

    #[error("Could not read DataSection")]
    DataSection,
}
