use crate::perf_event_raw::{PerfEventAttr, ATTR_FLAG_BIT_SAMPLE_ID_ALL};
use crate::types::{BranchSampleFormat, ReadFormat, SampleFormat};
use crate::unaligned::Endianness;

/// Everything a decode pass needs to know about the layout of its records.
///
/// This is resolved once, before the pass, from the capture's attributes and
/// passed by value into each [`RecordStream`](crate::RecordStream). It never
/// changes during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeConfig {
    endian: Endianness,
    sample_format: SampleFormat,
    read_format: ReadFormat,
    branch_sample_format: BranchSampleFormat,
    sample_regs_user: u64,
    sample_regs_intr: u64,
    user_regs_count: usize,
    intr_regs_count: usize,
    sample_id_all: bool,
    identifier: bool,
}

impl DecodeConfig {
    /// A little-endian configuration with the given sample format and
    /// everything else empty.
    ///
    /// The identifier flag follows `sample_format`; use
    /// [`with_identifier`](Self::with_identifier) when it comes from a
    /// different attribute.
    pub fn new(sample_format: SampleFormat) -> Self {
        Self {
            sample_format,
            identifier: sample_format.contains(SampleFormat::IDENTIFIER),
            ..Default::default()
        }
    }

    /// Resolves the configuration from the capture's first attribute.
    ///
    /// Captures with several attributes lay out the identifier duplicate by
    /// the first attribute's `sample_type`, so that is the one that counts.
    pub fn from_attrs(attrs: &[PerfEventAttr], endian: Endianness) -> Option<Self> {
        attrs.first().map(|attr| Self::from_attr(attr, endian))
    }

    pub fn from_attr(attr: &PerfEventAttr, endian: Endianness) -> Self {
        let sample_format = SampleFormat::from_bits_retain(attr.sample_type.get(endian));
        Self::new(sample_format)
            .with_endian(endian)
            .with_read_format(ReadFormat::from_bits_retain(attr.read_format.get(endian)))
            .with_branch_sample_format(BranchSampleFormat::from_bits_retain(
                attr.branch_sample_type.get(endian),
            ))
            .with_sample_regs_user(attr.sample_regs_user.get(endian))
            .with_sample_regs_intr(attr.sample_regs_intr.get(endian))
            .with_sample_id_all(attr.flags.get(endian) & ATTR_FLAG_BIT_SAMPLE_ID_ALL != 0)
    }

    pub fn with_endian(mut self, endian: Endianness) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_read_format(mut self, read_format: ReadFormat) -> Self {
        self.read_format = read_format;
        self
    }

    pub fn with_branch_sample_format(mut self, branch_sample_format: BranchSampleFormat) -> Self {
        self.branch_sample_format = branch_sample_format;
        self
    }

    pub fn with_sample_regs_user(mut self, mask: u64) -> Self {
        self.sample_regs_user = mask;
        self.user_regs_count = mask.count_ones() as usize;
        self
    }

    pub fn with_sample_regs_intr(mut self, mask: u64) -> Self {
        self.sample_regs_intr = mask;
        self.intr_regs_count = mask.count_ones() as usize;
        self
    }

    pub fn with_sample_id_all(mut self, sample_id_all: bool) -> Self {
        self.sample_id_all = sample_id_all;
        self
    }

    /// Sets whether the capture carries the fixed-position identifier.
    pub fn with_identifier(mut self, identifier: bool) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    pub fn read_format(&self) -> ReadFormat {
        self.read_format
    }

    pub fn branch_sample_format(&self) -> BranchSampleFormat {
        self.branch_sample_format
    }

    pub fn sample_regs_user(&self) -> u64 {
        self.sample_regs_user
    }

    pub fn sample_regs_intr(&self) -> u64 {
        self.sample_regs_intr
    }

    /// Number of values in a user register dump.
    pub fn user_regs_count(&self) -> usize {
        self.user_regs_count
    }

    /// Number of values in an interrupt register dump.
    pub fn intr_regs_count(&self) -> usize {
        self.intr_regs_count
    }

    /// Whether non-sample records carry an identity trailer.
    pub fn sample_id_all(&self) -> bool {
        self.sample_id_all
    }

    pub fn identifier(&self) -> bool {
        self.identifier
    }

    /// The sample format that governs record layout: `sample_format` with the
    /// `IDENTIFIER` bit replaced by the capture-wide identifier flag.
    pub(crate) fn layout_format(&self) -> SampleFormat {
        let mut format = self.sample_format;
        format.set(SampleFormat::IDENTIFIER, self.identifier);
        format
    }
}
