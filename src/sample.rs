use byteorder::ByteOrder;
use std::fmt;

use crate::config::DecodeConfig;
use crate::cursor::PayloadCursor;
use crate::error::PayloadOverrun;
use crate::perf_event_raw::PERF_SAMPLE_REGS_ABI_NONE;
use crate::types::{BranchSampleFormat, CpuMode, ReadFormat, RecordMisc, SampleFormat};
use crate::utils::{ByteLen, HexSlice, HexValue};

/// One optional section of a `PERF_RECORD_SAMPLE` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleSection {
    Identifier,
    Ip,
    Tid,
    Time,
    Addr,
    Id,
    StreamId,
    Cpu,
    Period,
    Read,
    Callchain,
    Raw,
    BranchStack,
    UserRegs,
    UserStack,
    Weight,
    DataSrc,
    Transaction,
    IntrRegs,
    PhysAddr,
    Cgroup,
    DataPageSize,
    CodePageSize,
    Aux,
}

/// The sample layout, in the order the kernel writes it. A section is present
/// if any of its bits is set in the sample format.
///
/// ```c
/// { u64 id;                 } && PERF_SAMPLE_IDENTIFIER
/// { u64 ip;                 } && PERF_SAMPLE_IP
/// { u32 pid, tid;           } && PERF_SAMPLE_TID
/// { u64 time;               } && PERF_SAMPLE_TIME
/// { u64 addr;               } && PERF_SAMPLE_ADDR
/// { u64 id;                 } && PERF_SAMPLE_ID
/// { u64 stream_id;          } && PERF_SAMPLE_STREAM_ID
/// { u32 cpu, res;           } && PERF_SAMPLE_CPU
/// { u64 period;             } && PERF_SAMPLE_PERIOD
/// { struct read_format values; } && PERF_SAMPLE_READ
/// { u64 nr, ips[nr];        } && PERF_SAMPLE_CALLCHAIN
/// { u32 size; char data[size]; } && PERF_SAMPLE_RAW
/// { u64 nr; { u64 hw_idx; } && PERF_SAMPLE_BRANCH_HW_INDEX
///   { u64 from, to, flags } lbr[nr]; } && PERF_SAMPLE_BRANCH_STACK
/// { u64 abi; u64 regs[weight(mask)]; } && PERF_SAMPLE_REGS_USER
/// { u64 size; char data[size]; u64 dyn_size; } && PERF_SAMPLE_STACK_USER
/// { u64 weight;             } && PERF_SAMPLE_WEIGHT (or WEIGHT_STRUCT)
/// { u64 data_src;           } && PERF_SAMPLE_DATA_SRC
/// { u64 transaction;        } && PERF_SAMPLE_TRANSACTION
/// { u64 abi; u64 regs[weight(mask)]; } && PERF_SAMPLE_REGS_INTR
/// { u64 phys_addr;          } && PERF_SAMPLE_PHYS_ADDR
/// { u64 cgroup;             } && PERF_SAMPLE_CGROUP
/// { u64 data_page_size;     } && PERF_SAMPLE_DATA_PAGE_SIZE
/// { u64 code_page_size;     } && PERF_SAMPLE_CODE_PAGE_SIZE
/// { u64 size; char data[size]; } && PERF_SAMPLE_AUX
/// ```
///
/// The uapi header lists AUX before the page sizes, but the kernel (and
/// perf) put it last.
pub const SAMPLE_SECTIONS: &[(SampleFormat, SampleSection)] = &[
    (SampleFormat::IDENTIFIER, SampleSection::Identifier),
    (SampleFormat::IP, SampleSection::Ip),
    (SampleFormat::TID, SampleSection::Tid),
    (SampleFormat::TIME, SampleSection::Time),
    (SampleFormat::ADDR, SampleSection::Addr),
    (SampleFormat::ID, SampleSection::Id),
    (SampleFormat::STREAM_ID, SampleSection::StreamId),
    (SampleFormat::CPU, SampleSection::Cpu),
    (SampleFormat::PERIOD, SampleSection::Period),
    (SampleFormat::READ, SampleSection::Read),
    (SampleFormat::CALLCHAIN, SampleSection::Callchain),
    (SampleFormat::RAW, SampleSection::Raw),
    (SampleFormat::BRANCH_STACK, SampleSection::BranchStack),
    (SampleFormat::REGS_USER, SampleSection::UserRegs),
    (SampleFormat::STACK_USER, SampleSection::UserStack),
    (
        SampleFormat::WEIGHT.union(SampleFormat::WEIGHT_STRUCT),
        SampleSection::Weight,
    ),
    (SampleFormat::DATA_SRC, SampleSection::DataSrc),
    (SampleFormat::TRANSACTION, SampleSection::Transaction),
    (SampleFormat::REGS_INTR, SampleSection::IntrRegs),
    (SampleFormat::PHYS_ADDR, SampleSection::PhysAddr),
    (SampleFormat::CGROUP, SampleSection::Cgroup),
    (SampleFormat::DATA_PAGE_SIZE, SampleSection::DataPageSize),
    (SampleFormat::CODE_PAGE_SIZE, SampleSection::CodePageSize),
    (SampleFormat::AUX, SampleSection::Aux),
];

/// The sections present under `config`, in payload order.
pub fn sample_sections(config: &DecodeConfig) -> impl Iterator<Item = SampleSection> {
    let format = config.layout_format();
    SAMPLE_SECTIONS
        .iter()
        .filter(move |(bits, _)| format.intersects(*bits))
        .map(|&(_, section)| section)
}

/// One counter value of a `PERF_SAMPLE_READ` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadValue {
    pub value: u64,
    /// Present if `PERF_FORMAT_ID` is set.
    pub id: Option<u64>,
    /// Present if `PERF_FORMAT_LOST` is set.
    pub lost: Option<u64>,
}

/// The `struct read_format` of a sample.
///
/// Without `PERF_FORMAT_GROUP`, `values` has exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadValues {
    pub is_group: bool,
    pub time_enabled: Option<u64>,
    pub time_running: Option<u64>,
    pub values: Vec<ReadValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchEntry {
    pub from: u64,
    pub to: u64,
    pub flags: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStack {
    /// Present if the attribute's `branch_sample_type` has `HW_INDEX`.
    pub hw_idx: Option<u64>,
    pub entries: Vec<BranchEntry>,
}

/// A register dump. `values` holds one entry per bit set in `mask`, in bit
/// order, unless `abi` is `PERF_SAMPLE_REGS_ABI_NONE`, in which case the
/// kernel wrote no values at all.
#[derive(Clone, PartialEq, Eq)]
pub struct Regs {
    pub abi: u64,
    pub mask: u64,
    pub values: Vec<u64>,
}

impl Regs {
    /// The value of register number `register`, if it was dumped.
    pub fn get(&self, register: u64) -> Option<u64> {
        if register >= 64 || self.mask & (1 << register) == 0 {
            return None;
        }
        let index = (self.mask & ((1 << register) - 1)).count_ones() as usize;
        self.values.get(index).copied()
    }
}

impl fmt::Debug for Regs {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fmt.debug_map()
            .entry(&"abi", &self.abi)
            .entry(&"mask", &HexValue(self.mask))
            .entry(&"values", &HexSlice(&self.values))
            .finish()
    }
}

/// A `PERF_SAMPLE_STACK_USER` dump.
#[derive(Clone, PartialEq, Eq)]
pub struct UserStack {
    /// The captured bytes, starting at the stack pointer.
    pub data: Vec<u8>,
    /// How much of `data` was live stack. Absent when nothing was captured.
    pub dyn_size: Option<u64>,
}

impl UserStack {
    /// The part of the capture that held live stack.
    pub fn live_bytes(&self) -> &[u8] {
        match self.dyn_size {
            Some(dyn_size) => {
                let len = usize::try_from(dyn_size)
                    .map_or(self.data.len(), |len| len.min(self.data.len()));
                &self.data[..len]
            }
            None => &[],
        }
    }
}

impl fmt::Debug for UserStack {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fmt.debug_map()
            .entry(&"data", &ByteLen(&self.data))
            .entry(&"dyn_size", &self.dyn_size)
            .finish()
    }
}

/// `PERF_RECORD_SAMPLE`. Every field is `None` unless its section is present.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SampleRecord {
    pub cpu_mode: Option<CpuMode>,
    pub is_exact_ip: bool,
    pub identifier: Option<u64>,
    pub ip: Option<u64>,
    pub pid: Option<u32>,
    pub tid: Option<u32>,
    pub time: Option<u64>,
    pub addr: Option<u64>,
    pub id: Option<u64>,
    pub stream_id: Option<u64>,
    pub cpu: Option<u32>,
    pub period: Option<u64>,
    pub read: Option<ReadValues>,
    pub callchain: Option<Vec<u64>>,
    pub raw: Option<Vec<u8>>,
    pub branch_stack: Option<BranchStack>,
    pub user_regs: Option<Regs>,
    pub user_stack: Option<UserStack>,
    pub weight: Option<u64>,
    pub data_src: Option<u64>,
    pub transaction: Option<u64>,
    pub intr_regs: Option<Regs>,
    pub phys_addr: Option<u64>,
    pub cgroup: Option<u64>,
    pub aux: Option<Vec<u8>>,
    pub data_page_size: Option<u64>,
    pub code_page_size: Option<u64>,
}

impl SampleRecord {
    pub fn parse<T: ByteOrder>(
        payload: &[u8],
        misc: RecordMisc,
        config: &DecodeConfig,
    ) -> Result<Self, PayloadOverrun> {
        let mut cur = PayloadCursor::<T>::new(payload);
        let mut sample = SampleRecord {
            cpu_mode: Some(misc.cpu_mode()),
            is_exact_ip: misc.is_exact_ip(),
            ..Default::default()
        };
        for section in sample_sections(config) {
            sample.parse_section(section, &mut cur, config)?;
        }
        if cur.remaining() != 0 {
            log::trace!(
                "Sample left {} of {} payload bytes unread",
                cur.remaining(),
                payload.len()
            );
        }
        Ok(sample)
    }

    fn parse_section<T: ByteOrder>(
        &mut self,
        section: SampleSection,
        cur: &mut PayloadCursor<T>,
        config: &DecodeConfig,
    ) -> Result<(), PayloadOverrun> {
        match section {
            SampleSection::Identifier => self.identifier = Some(cur.read_u64()?),
            SampleSection::Ip => self.ip = Some(cur.read_u64()?),
            SampleSection::Tid => {
                self.pid = Some(cur.read_u32()?);
                self.tid = Some(cur.read_u32()?);
            }
            SampleSection::Time => self.time = Some(cur.read_u64()?),
            SampleSection::Addr => self.addr = Some(cur.read_u64()?),
            SampleSection::Id => self.id = Some(cur.read_u64()?),
            SampleSection::StreamId => self.stream_id = Some(cur.read_u64()?),
            SampleSection::Cpu => {
                self.cpu = Some(cur.read_u32()?);
                let _reserved = cur.read_u32()?;
            }
            SampleSection::Period => self.period = Some(cur.read_u64()?),
            SampleSection::Read => self.read = Some(parse_read_values(cur, config.read_format())?),
            SampleSection::Callchain => {
                let nr = cur.read_u64()?;
                self.callchain = Some(cur.read_u64_array(nr)?);
            }
            SampleSection::Raw => {
                let size = cur.read_u32()?;
                self.raw = Some(cur.read_blob(u64::from(size))?.to_owned());
            }
            SampleSection::BranchStack => {
                self.branch_stack = Some(parse_branch_stack(cur, config.branch_sample_format())?)
            }
            SampleSection::UserRegs => {
                self.user_regs = Some(parse_regs(
                    cur,
                    config.sample_regs_user(),
                    config.user_regs_count(),
                )?)
            }
            SampleSection::UserStack => {
                let size = cur.read_u64()?;
                let data = cur.read_blob(size)?.to_owned();
                let dyn_size = cur.read_u64_if(size != 0)?;
                self.user_stack = Some(UserStack { data, dyn_size });
            }
            SampleSection::Weight => self.weight = Some(cur.read_u64()?),
            SampleSection::DataSrc => self.data_src = Some(cur.read_u64()?),
            SampleSection::Transaction => self.transaction = Some(cur.read_u64()?),
            SampleSection::IntrRegs => {
                self.intr_regs = Some(parse_regs(
                    cur,
                    config.sample_regs_intr(),
                    config.intr_regs_count(),
                )?)
            }
            SampleSection::PhysAddr => self.phys_addr = Some(cur.read_u64()?),
            SampleSection::Cgroup => self.cgroup = Some(cur.read_u64()?),
            SampleSection::Aux => {
                let size = cur.read_u64()?;
                self.aux = Some(cur.read_blob(size)?.to_owned());
            }
            SampleSection::DataPageSize => self.data_page_size = Some(cur.read_u64()?),
            SampleSection::CodePageSize => self.code_page_size = Some(cur.read_u64()?),
        }
        Ok(())
    }
}

/// ```c
/// struct read_format {
///     { u64 value;
///       { u64 time_enabled; } && PERF_FORMAT_TOTAL_TIME_ENABLED
///       { u64 time_running; } && PERF_FORMAT_TOTAL_TIME_RUNNING
///       { u64 id;           } && PERF_FORMAT_ID
///       { u64 lost;         } && PERF_FORMAT_LOST
///     } && !PERF_FORMAT_GROUP
///
///     { u64 nr;
///       { u64 time_enabled; } && PERF_FORMAT_TOTAL_TIME_ENABLED
///       { u64 time_running; } && PERF_FORMAT_TOTAL_TIME_RUNNING
///       { u64 value;
///         { u64 id;           } && PERF_FORMAT_ID
///         { u64 lost;         } && PERF_FORMAT_LOST
///       } cntr[nr];
///     } && PERF_FORMAT_GROUP
/// };
/// ```
fn parse_read_values<T: ByteOrder>(
    cur: &mut PayloadCursor<T>,
    read_format: ReadFormat,
) -> Result<ReadValues, PayloadOverrun> {
    let has_id = read_format.contains(ReadFormat::ID);
    let has_lost = read_format.contains(ReadFormat::LOST);
    let has_time_enabled = read_format.contains(ReadFormat::TOTAL_TIME_ENABLED);
    let has_time_running = read_format.contains(ReadFormat::TOTAL_TIME_RUNNING);

    if !read_format.contains(ReadFormat::GROUP) {
        let value = cur.read_u64()?;
        let time_enabled = cur.read_u64_if(has_time_enabled)?;
        let time_running = cur.read_u64_if(has_time_running)?;
        let id = cur.read_u64_if(has_id)?;
        let lost = cur.read_u64_if(has_lost)?;
        return Ok(ReadValues {
            is_group: false,
            time_enabled,
            time_running,
            values: vec![ReadValue { value, id, lost }],
        });
    }

    let nr = cur.read_u64()?;
    let time_enabled = cur.read_u64_if(has_time_enabled)?;
    let time_running = cur.read_u64_if(has_time_running)?;
    let words_per_value = 1 + u64::from(has_id) + u64::from(has_lost);
    let words = cur.read_u64_array(nr.checked_mul(words_per_value).unwrap_or(u64::MAX))?;
    let values = words
        .chunks_exact(words_per_value as usize)
        .map(|words| {
            let mut words = words.iter().copied();
            ReadValue {
                value: words.next().unwrap_or_default(),
                id: if has_id { words.next() } else { None },
                lost: if has_lost { words.next() } else { None },
            }
        })
        .collect();
    Ok(ReadValues {
        is_group: true,
        time_enabled,
        time_running,
        values,
    })
}

fn parse_branch_stack<T: ByteOrder>(
    cur: &mut PayloadCursor<T>,
    branch_sample_format: BranchSampleFormat,
) -> Result<BranchStack, PayloadOverrun> {
    let nr = cur.read_u64()?;
    let hw_idx = cur.read_u64_if(branch_sample_format.contains(BranchSampleFormat::HW_INDEX))?;
    let flat = cur.read_u64_array(nr.checked_mul(3).unwrap_or(u64::MAX))?;
    let entries = flat
        .chunks_exact(3)
        .map(|entry| BranchEntry {
            from: entry[0],
            to: entry[1],
            flags: entry[2],
        })
        .collect();
    Ok(BranchStack { hw_idx, entries })
}

fn parse_regs<T: ByteOrder>(
    cur: &mut PayloadCursor<T>,
    mask: u64,
    count: usize,
) -> Result<Regs, PayloadOverrun> {
    let abi = cur.read_u64()?;
    let values = if abi == PERF_SAMPLE_REGS_ABI_NONE {
        Vec::new()
    } else {
        cur.read_u64_array(count as u64)?
    };
    Ok(Regs { abi, mask, values })
}

impl fmt::Debug for SampleRecord {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut map = fmt.debug_map();
        map.entry(&"cpu_mode", &self.cpu_mode)
            .entry(&"ip", &self.ip.map(HexValue))
            .entry(&"pid", &self.pid)
            .entry(&"tid", &self.tid)
            .entry(&"time", &self.time)
            .entry(&"id", &self.id.or(self.identifier))
            .entry(&"cpu", &self.cpu)
            .entry(&"period", &self.period);
        if let Some(addr) = self.addr {
            map.entry(&"addr", &HexValue(addr));
        }
        if let Some(read) = &self.read {
            map.entry(&"read", read);
        }
        if let Some(callchain) = &self.callchain {
            map.entry(&"callchain", &HexSlice(callchain));
        }
        if let Some(raw) = &self.raw {
            map.entry(&"raw", &ByteLen(raw));
        }
        if let Some(branch_stack) = &self.branch_stack {
            map.entry(&"branch_stack", branch_stack);
        }
        if let Some(user_regs) = &self.user_regs {
            map.entry(&"user_regs", user_regs);
        }
        if let Some(user_stack) = &self.user_stack {
            map.entry(&"user_stack", user_stack);
        }
        if let Some(intr_regs) = &self.intr_regs {
            map.entry(&"intr_regs", intr_regs);
        }
        if let Some(aux) = &self.aux {
            map.entry(&"aux", &ByteLen(aux));
        }
        map.finish()
    }
}
