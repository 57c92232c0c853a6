//! Constants and structs from the kernel's `perf_event.h` that the record
//! decoder depends on.

use crate::unaligned::{U16, U32, U64};
use zerocopy::FromBytes;

/// `perf_event_attr`, up to and including `sample_max_stack`
/// (`PERF_ATTR_SIZE_VER5`).
///
/// Attributes written by older kernels are shorter; missing trailing fields
/// read as zero.
#[derive(FromBytes, Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct PerfEventAttr {
    /// Major type: hardware/software/tracepoint/etc.
    pub type_: U32,
    /// Size of the attr structure, for fwd/bwd compat.
    pub size: U32,
    /// Type-specific configuration information.
    pub config: U64,
    /// Sample period or frequency, depending on `ATTR_FLAG_BIT_FREQ`.
    pub sampling_period_or_frequency: U64,
    /// Specifies values included in sample, see the `PERF_SAMPLE_*` bits.
    pub sample_type: U64,
    /// Specifies the layout of read values, see the `PERF_FORMAT_*` bits.
    pub read_format: U64,
    /// Bitset of `ATTR_FLAG_BIT_*` flags.
    pub flags: U64,
    pub wakeup_events_or_watermark: U32,
    pub bp_type: U32,
    pub bp_addr_or_config1: U64,
    pub bp_len_or_config2: U64,
    /// Uses the `PERF_SAMPLE_BRANCH_*` bits.
    pub branch_sample_type: U64,
    /// Defines set of user regs to dump on samples.
    pub sample_regs_user: U64,
    /// Defines size of the user stack to dump on samples.
    pub sample_stack_user: U32,
    pub clockid: U32,
    /// Defines set of regs to dump for each sample at interrupt time.
    pub sample_regs_intr: U64,
    /// Wakeup watermark for AUX area.
    pub aux_watermark: U32,
    pub sample_max_stack: U16,
    pub __reserved_2: U16,
}

/// Size of `perf_event_attr` as written by the first kernels that had it.
pub const PERF_ATTR_SIZE_VER0: u32 = 64;

/// sample_type all events
pub const ATTR_FLAG_BIT_SAMPLE_ID_ALL: u64 = 1 << 18;

pub const PERF_RECORD_MMAP: u32 = 1;
pub const PERF_RECORD_LOST: u32 = 2;
pub const PERF_RECORD_COMM: u32 = 3;
pub const PERF_RECORD_EXIT: u32 = 4;
pub const PERF_RECORD_THROTTLE: u32 = 5;
pub const PERF_RECORD_UNTHROTTLE: u32 = 6;
pub const PERF_RECORD_FORK: u32 = 7;
pub const PERF_RECORD_READ: u32 = 8;
pub const PERF_RECORD_SAMPLE: u32 = 9;
pub const PERF_RECORD_MMAP2: u32 = 10;

pub const PERF_SAMPLE_IP: u64 = 1 << 0;
pub const PERF_SAMPLE_TID: u64 = 1 << 1;
pub const PERF_SAMPLE_TIME: u64 = 1 << 2;
pub const PERF_SAMPLE_ADDR: u64 = 1 << 3;
pub const PERF_SAMPLE_READ: u64 = 1 << 4;
pub const PERF_SAMPLE_CALLCHAIN: u64 = 1 << 5;
pub const PERF_SAMPLE_ID: u64 = 1 << 6;
pub const PERF_SAMPLE_CPU: u64 = 1 << 7;
pub const PERF_SAMPLE_PERIOD: u64 = 1 << 8;
pub const PERF_SAMPLE_STREAM_ID: u64 = 1 << 9;
pub const PERF_SAMPLE_RAW: u64 = 1 << 10;
pub const PERF_SAMPLE_BRANCH_STACK: u64 = 1 << 11;
pub const PERF_SAMPLE_REGS_USER: u64 = 1 << 12;
pub const PERF_SAMPLE_STACK_USER: u64 = 1 << 13;
pub const PERF_SAMPLE_WEIGHT: u64 = 1 << 14;
pub const PERF_SAMPLE_DATA_SRC: u64 = 1 << 15;
pub const PERF_SAMPLE_IDENTIFIER: u64 = 1 << 16;
pub const PERF_SAMPLE_TRANSACTION: u64 = 1 << 17;
pub const PERF_SAMPLE_REGS_INTR: u64 = 1 << 18;
pub const PERF_SAMPLE_PHYS_ADDR: u64 = 1 << 19;
pub const PERF_SAMPLE_AUX: u64 = 1 << 20;
pub const PERF_SAMPLE_CGROUP: u64 = 1 << 21;
pub const PERF_SAMPLE_DATA_PAGE_SIZE: u64 = 1 << 22;
pub const PERF_SAMPLE_CODE_PAGE_SIZE: u64 = 1 << 23;
pub const PERF_SAMPLE_WEIGHT_STRUCT: u64 = 1 << 24;

pub const PERF_FORMAT_TOTAL_TIME_ENABLED: u64 = 1 << 0;
pub const PERF_FORMAT_TOTAL_TIME_RUNNING: u64 = 1 << 1;
pub const PERF_FORMAT_ID: u64 = 1 << 2;
pub const PERF_FORMAT_GROUP: u64 = 1 << 3;
pub const PERF_FORMAT_LOST: u64 = 1 << 4;

/// The branch stack carries a `hw_idx` value before its entries.
pub const PERF_SAMPLE_BRANCH_HW_INDEX: u64 = 1 << 17;

/// No registers follow the abi word.
pub const PERF_SAMPLE_REGS_ABI_NONE: u64 = 0;
pub const PERF_SAMPLE_REGS_ABI_32: u64 = 1;
pub const PERF_SAMPLE_REGS_ABI_64: u64 = 2;

pub const PERF_RECORD_MISC_CPUMODE_MASK: u16 = 0b111;
pub const PERF_RECORD_MISC_CPUMODE_UNKNOWN: u16 = 0;
pub const PERF_RECORD_MISC_KERNEL: u16 = 1;
pub const PERF_RECORD_MISC_USER: u16 = 2;
pub const PERF_RECORD_MISC_HYPERVISOR: u16 = 3;
pub const PERF_RECORD_MISC_GUEST_KERNEL: u16 = 4;
pub const PERF_RECORD_MISC_GUEST_USER: u16 = 5;
/// Meaning of bit 13 depends on the record kind: `MMAP_DATA` on Mmap records,
/// `COMM_EXEC` on Comm records.
pub const PERF_RECORD_MISC_MMAP_DATA: u16 = 1 << 13;
pub const PERF_RECORD_MISC_COMM_EXEC: u16 = 1 << 13;
/// Sample ip is exact.
pub const PERF_RECORD_MISC_EXACT_IP: u16 = 1 << 14;
