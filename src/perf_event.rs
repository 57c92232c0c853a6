use byteorder::ByteOrder;
use std::fmt;

use crate::config::DecodeConfig;
use crate::error::PayloadOverrun;
use crate::sample_id::SampleId;
use crate::types::{CpuMode, RecordMisc};
use crate::utils::{trim_at_nul, HexValue};

/// `PERF_RECORD_MMAP`: an executable mapping was created.
///
/// ```c
/// struct {
///     struct perf_event_header header;
///     u32 pid, tid;
///     u64 addr;
///     u64 len;
///     u64 pgoff;
///     char filename[];
///     struct sample_id sample_id;
/// };
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct MmapRecord {
    pub pid: u32,
    pub tid: u32,
    pub address: u64,
    pub length: u64,
    pub page_offset: u64,
    pub filename: Vec<u8>,
    pub cpu_mode: CpuMode,
    /// Set for non-executable (data) mappings.
    pub is_data: bool,
    pub sample_id: Option<SampleId>,
}

/// `PERF_RECORD_COMM`: a thread changed its name, or exec'd.
///
/// ```c
/// struct {
///     struct perf_event_header header;
///     u32 pid, tid;
///     char comm[];
///     struct sample_id sample_id;
/// };
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CommRecord {
    pub pid: u32,
    pub tid: u32,
    pub name: Vec<u8>,
    pub is_exec: bool,
    pub sample_id: Option<SampleId>,
}

/// `PERF_RECORD_LOST`: the kernel dropped `count` records for event `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LostRecord {
    pub id: u64,
    pub count: u64,
    pub sample_id: Option<SampleId>,
}

impl MmapRecord {
    const FIXED_LEN: usize = 32;

    pub fn parse<T: ByteOrder>(
        payload: &[u8],
        misc: RecordMisc,
        config: &DecodeConfig,
    ) -> Result<Self, PayloadOverrun> {
        let (mut cur, sample_id) = SampleId::split_trailer::<T>(payload, Self::FIXED_LEN, config)?;
        let pid = cur.read_u32()?;
        let tid = cur.read_u32()?;
        let address = cur.read_u64()?;
        let length = cur.read_u64()?;
        let page_offset = cur.read_u64()?;
        let filename = trim_at_nul(cur.read_rest()).to_owned();
        Ok(Self {
            pid,
            tid,
            address,
            length,
            page_offset,
            filename,
            cpu_mode: misc.cpu_mode(),
            is_data: misc.is_mmap_data(),
            sample_id,
        })
    }
}

impl CommRecord {
    const FIXED_LEN: usize = 8;

    pub fn parse<T: ByteOrder>(
        payload: &[u8],
        misc: RecordMisc,
        config: &DecodeConfig,
    ) -> Result<Self, PayloadOverrun> {
        let (mut cur, sample_id) = SampleId::split_trailer::<T>(payload, Self::FIXED_LEN, config)?;
        let pid = cur.read_u32()?;
        let tid = cur.read_u32()?;
        let name = trim_at_nul(cur.read_rest()).to_owned();
        Ok(Self {
            pid,
            tid,
            name,
            is_exec: misc.is_comm_exec(),
            sample_id,
        })
    }
}

impl LostRecord {
    const FIXED_LEN: usize = 16;

    pub fn parse<T: ByteOrder>(payload: &[u8], config: &DecodeConfig) -> Result<Self, PayloadOverrun> {
        let (mut cur, sample_id) = SampleId::split_trailer::<T>(payload, Self::FIXED_LEN, config)?;
        let id = cur.read_u64()?;
        let count = cur.read_u64()?;
        Ok(Self {
            id,
            count,
            sample_id,
        })
    }
}

impl fmt::Debug for MmapRecord {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fmt.debug_map()
            .entry(&"pid", &self.pid)
            .entry(&"tid", &self.tid)
            .entry(&"address", &HexValue(self.address))
            .entry(&"length", &HexValue(self.length))
            .entry(&"page_offset", &HexValue(self.page_offset))
            .entry(&"filename", &&*String::from_utf8_lossy(&self.filename))
            .entry(&"cpu_mode", &self.cpu_mode)
            .entry(&"is_data", &self.is_data)
            .entry(&"sample_id", &self.sample_id)
            .finish()
    }
}

impl fmt::Debug for CommRecord {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use std::str;

        let mut map = fmt.debug_map();
        map.entry(&"pid", &self.pid).entry(&"tid", &self.tid);

        if let Ok(string) = str::from_utf8(&self.name) {
            map.entry(&"name", &string);
        } else {
            map.entry(&"name", &self.name);
        }

        map.entry(&"is_exec", &self.is_exec)
            .entry(&"sample_id", &self.sample_id)
            .finish()
    }
}
