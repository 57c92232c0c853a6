use bitflags::bitflags;

use crate::perf_event_raw::*;

bitflags! {
    /// The `sample_type` of an event attribute: which optional fields are
    /// present in sample records and in the identity trailer of other
    /// records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SampleFormat: u64 {
        const IP = PERF_SAMPLE_IP;
        const TID = PERF_SAMPLE_TID;
        const TIME = PERF_SAMPLE_TIME;
        const ADDR = PERF_SAMPLE_ADDR;
        const READ = PERF_SAMPLE_READ;
        const CALLCHAIN = PERF_SAMPLE_CALLCHAIN;
        const ID = PERF_SAMPLE_ID;
        const CPU = PERF_SAMPLE_CPU;
        const PERIOD = PERF_SAMPLE_PERIOD;
        const STREAM_ID = PERF_SAMPLE_STREAM_ID;
        const RAW = PERF_SAMPLE_RAW;
        const BRANCH_STACK = PERF_SAMPLE_BRANCH_STACK;
        const REGS_USER = PERF_SAMPLE_REGS_USER;
        const STACK_USER = PERF_SAMPLE_STACK_USER;
        const WEIGHT = PERF_SAMPLE_WEIGHT;
        const DATA_SRC = PERF_SAMPLE_DATA_SRC;
        const IDENTIFIER = PERF_SAMPLE_IDENTIFIER;
        const TRANSACTION = PERF_SAMPLE_TRANSACTION;
        const REGS_INTR = PERF_SAMPLE_REGS_INTR;
        const PHYS_ADDR = PERF_SAMPLE_PHYS_ADDR;
        const AUX = PERF_SAMPLE_AUX;
        const CGROUP = PERF_SAMPLE_CGROUP;
        const DATA_PAGE_SIZE = PERF_SAMPLE_DATA_PAGE_SIZE;
        const CODE_PAGE_SIZE = PERF_SAMPLE_CODE_PAGE_SIZE;
        const WEIGHT_STRUCT = PERF_SAMPLE_WEIGHT_STRUCT;

        // Bits from newer kernels are kept as-is.
        const _ = !0;
    }

    /// The `read_format` of an event attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReadFormat: u64 {
        const TOTAL_TIME_ENABLED = PERF_FORMAT_TOTAL_TIME_ENABLED;
        const TOTAL_TIME_RUNNING = PERF_FORMAT_TOTAL_TIME_RUNNING;
        const ID = PERF_FORMAT_ID;
        const GROUP = PERF_FORMAT_GROUP;
        const LOST = PERF_FORMAT_LOST;

        const _ = !0;
    }

    /// The `branch_sample_type` of an event attribute. Only the bit that
    /// changes the branch stack layout is named.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BranchSampleFormat: u64 {
        const HW_INDEX = PERF_SAMPLE_BRANCH_HW_INDEX;

        const _ = !0;
    }
}

/// The `type` of a record header.
///
/// Every kind the kernel ABI defines up to `PERF_RECORD_MMAP2` is named;
/// anything else lands in `Other`. Only `Mmap`, `Lost`, `Comm` and `Sample`
/// are decoded field by field, the rest are skipped by size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Mmap,
    Lost,
    Comm,
    Exit,
    Throttle,
    Unthrottle,
    Fork,
    Read,
    Sample,
    Mmap2,
    Other(u32),
}

impl RecordKind {
    pub fn from_u32(kind: u32) -> Self {
        match kind {
            PERF_RECORD_MMAP => Self::Mmap,
            PERF_RECORD_LOST => Self::Lost,
            PERF_RECORD_COMM => Self::Comm,
            PERF_RECORD_EXIT => Self::Exit,
            PERF_RECORD_THROTTLE => Self::Throttle,
            PERF_RECORD_UNTHROTTLE => Self::Unthrottle,
            PERF_RECORD_FORK => Self::Fork,
            PERF_RECORD_READ => Self::Read,
            PERF_RECORD_SAMPLE => Self::Sample,
            PERF_RECORD_MMAP2 => Self::Mmap2,
            other => Self::Other(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Mmap => PERF_RECORD_MMAP,
            Self::Lost => PERF_RECORD_LOST,
            Self::Comm => PERF_RECORD_COMM,
            Self::Exit => PERF_RECORD_EXIT,
            Self::Throttle => PERF_RECORD_THROTTLE,
            Self::Unthrottle => PERF_RECORD_UNTHROTTLE,
            Self::Fork => PERF_RECORD_FORK,
            Self::Read => PERF_RECORD_READ,
            Self::Sample => PERF_RECORD_SAMPLE,
            Self::Mmap2 => PERF_RECORD_MMAP2,
            Self::Other(other) => other,
        }
    }

    /// Whether records of this kind are decoded rather than skipped.
    pub fn is_modeled(self) -> bool {
        matches!(self, Self::Mmap | Self::Lost | Self::Comm | Self::Sample)
    }
}

/// The execution context a record was generated in, from the low bits of
/// the header's `misc` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuMode {
    Unknown,
    Kernel,
    User,
    Hypervisor,
    GuestKernel,
    GuestUser,
    Other(u16),
}

/// The `misc` field of a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordMisc(pub u16);

impl RecordMisc {
    pub fn cpu_mode(self) -> CpuMode {
        match self.0 & PERF_RECORD_MISC_CPUMODE_MASK {
            PERF_RECORD_MISC_CPUMODE_UNKNOWN => CpuMode::Unknown,
            PERF_RECORD_MISC_KERNEL => CpuMode::Kernel,
            PERF_RECORD_MISC_USER => CpuMode::User,
            PERF_RECORD_MISC_HYPERVISOR => CpuMode::Hypervisor,
            PERF_RECORD_MISC_GUEST_KERNEL => CpuMode::GuestKernel,
            PERF_RECORD_MISC_GUEST_USER => CpuMode::GuestUser,
            other => CpuMode::Other(other),
        }
    }

    /// Only meaningful on Comm records.
    pub fn is_comm_exec(self) -> bool {
        self.0 & PERF_RECORD_MISC_COMM_EXEC != 0
    }

    /// Only meaningful on Mmap records.
    pub fn is_mmap_data(self) -> bool {
        self.0 & PERF_RECORD_MISC_MMAP_DATA != 0
    }

    /// Only meaningful on Sample records.
    pub fn is_exact_ip(self) -> bool {
        self.0 & PERF_RECORD_MISC_EXACT_IP != 0
    }
}
