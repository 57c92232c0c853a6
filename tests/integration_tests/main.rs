use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use perf_records::perf_event_raw::{
    ATTR_FLAG_BIT_SAMPLE_ID_ALL, PERF_RECORD_COMM, PERF_RECORD_EXIT, PERF_RECORD_LOST,
    PERF_RECORD_MISC_COMM_EXEC, PERF_RECORD_MISC_USER, PERF_RECORD_MMAP, PERF_RECORD_SAMPLE,
    PERF_SAMPLE_REGS_ABI_64,
};
use perf_records::{
    BranchEntry, BranchStack, CpuMode, DecodeConfig, DecodeError, Endianness, PerfFile, ReadFormat,
    ReadValue, ReadValues, Record, RecordKind, RecordStream, Regs, SampleFormat, SampleId,
    SampleRecord, SampleSection, UserStack, SAMPLE_SECTIONS,
};

use std::marker::PhantomData;

/// Builds record payloads and record streams in the byte order `T`.
struct Writer<T: ByteOrder> {
    data: Vec<u8>,
    _endian: PhantomData<T>,
}

impl<T: ByteOrder> Writer<T> {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            _endian: PhantomData,
        }
    }

    fn u32(mut self, value: u32) -> Self {
        self.data.write_u32::<T>(value).unwrap();
        self
    }

    fn u64(mut self, value: u64) -> Self {
        self.data.write_u64::<T>(value).unwrap();
        self
    }

    fn u64s(self, values: &[u64]) -> Self {
        values.iter().fold(self, |w, &v| w.u64(v))
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Appends a full record with a header sized to fit `payload`.
    fn record(mut self, kind: u32, misc: u16, payload: Writer<T>) -> Self {
        self.data.write_u32::<T>(kind).unwrap();
        self.data.write_u16::<T>(misc).unwrap();
        self.data
            .write_u16::<T>((payload.data.len() + 8) as u16)
            .unwrap();
        self.data.extend(payload.data);
        self
    }

    fn finish(self) -> Vec<u8> {
        self.data
    }
}

type Le = Writer<LittleEndian>;

fn lost(id: u64, count: u64) -> Le {
    Le::new().u64(id).u64(count)
}

fn decode(data: &[u8], config: DecodeConfig) -> perf_records::DecodedRecordSet {
    RecordStream::new(data, config).decode_all().unwrap()
}

#[test]
fn lost_then_comm_without_trailers() {
    let data = Le::new()
        .record(PERF_RECORD_LOST, 0, lost(5, 3))
        .record(
            PERF_RECORD_COMM,
            0,
            Le::new().u32(100).u32(100).bytes(b"worker\0\0"),
        )
        .finish();
    let mut stream = RecordStream::new(&data[..], DecodeConfig::new(SampleFormat::empty()));
    let mut records = Default::default();
    stream.decode_into(&mut records).unwrap();

    assert_eq!(stream.position(), data.len() as u64);
    assert_eq!(records.lost_records().len(), 1);
    assert_eq!(records.lost_records()[0].id, 5);
    assert_eq!(records.lost_records()[0].count, 3);
    assert_eq!(records.comm_records().len(), 1);
    let comm = &records.comm_records()[0];
    assert_eq!((comm.pid, comm.tid), (100, 100));
    assert_eq!(comm.name, b"worker");
    assert!(records.mmap_records().is_empty());
    assert!(records.sample_records().is_empty());
}

#[test]
fn unknown_kind_is_skipped_by_size() {
    let data = Le::new()
        .record(99, 0, Le::new().bytes(&[0xaa; 32]))
        .record(PERF_RECORD_LOST, 0, lost(1, 2))
        .finish();
    assert_eq!(data.len(), 40 + 24);
    let records = decode(&data, DecodeConfig::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records.lost_records()[0].count, 2);
    assert_eq!(records.skipped().get(&RecordKind::Other(99)), Some(&1));
}

#[test]
fn modeled_and_unmodeled_kinds_interleave() {
    let data = Le::new()
        .record(PERF_RECORD_EXIT, 0, Le::new().u32(1).u32(1).u32(1).u32(1).u64(0))
        .record(PERF_RECORD_LOST, 0, lost(1, 1))
        .record(PERF_RECORD_EXIT, 0, Le::new().u32(2).u32(2).u32(2).u32(2).u64(0))
        .finish();
    let kinds: Vec<_> = RecordStream::new(&data[..], DecodeConfig::default())
        .map(|record| record.unwrap().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![RecordKind::Exit, RecordKind::Lost, RecordKind::Exit]
    );
}

#[test]
fn truncated_record_keeps_earlier_records() {
    let mut data = Le::new().record(PERF_RECORD_LOST, 0, lost(5, 3)).finish();
    // A header declaring 64 bytes, followed by only 22 payload bytes.
    let mut truncated = Le::new()
        .record(PERF_RECORD_LOST, 0, Le::new().bytes(&[0; 56]))
        .finish();
    truncated.truncate(30);
    data.extend(truncated);

    let err = RecordStream::new(&data[..], DecodeConfig::default())
        .decode_all()
        .unwrap_err();
    assert_eq!(err.records.lost_records().len(), 1);
    match err.error {
        DecodeError::TruncatedInput {
            offset,
            needed,
            available,
        } => assert_eq!((offset, needed, available), (24, 64, 30)),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn identity_trailer_width_follows_mask() {
    let widths = [
        (SampleFormat::empty(), 0),
        (SampleFormat::TID, 8),
        (SampleFormat::TID | SampleFormat::TIME, 16),
        (SampleFormat::TIME | SampleFormat::ID | SampleFormat::STREAM_ID, 24),
        (SampleFormat::CPU | SampleFormat::IDENTIFIER, 16),
        // Sample-only sections don't widen the trailer.
        (SampleFormat::IP | SampleFormat::CALLCHAIN | SampleFormat::TIME, 8),
    ];
    for (format, width) in widths {
        assert_eq!(
            SampleId::encoded_len(&DecodeConfig::new(format)),
            width,
            "{:?}",
            format
        );
    }
}

#[test]
fn trailers_on_mmap_comm_and_lost() {
    let format = SampleFormat::TID | SampleFormat::TIME | SampleFormat::CPU;
    let config = DecodeConfig::new(format).with_sample_id_all(true);
    let trailer = |time: u64| Le::new().u32(10).u32(11).u64(time).u32(2).u32(0);
    let data = Le::new()
        .record(
            PERF_RECORD_MMAP,
            PERF_RECORD_MISC_USER,
            Le::new()
                .u32(10)
                .u32(11)
                .u64s(&[0x4000_0000, 0x1000, 0])
                .bytes(b"/bin/true\0\0\0\0\0\0\0")
                .bytes(&trailer(100).finish()),
        )
        .record(
            PERF_RECORD_COMM,
            PERF_RECORD_MISC_COMM_EXEC,
            Le::new()
                .u32(10)
                .u32(11)
                .bytes(b"true\0\0\0\0")
                .bytes(&trailer(200).finish()),
        )
        .record(
            PERF_RECORD_LOST,
            0,
            lost(4, 1).bytes(&trailer(300).finish()),
        )
        .finish();
    let records = decode(&data, config);

    let mmap = &records.mmap_records()[0];
    assert_eq!(mmap.filename, b"/bin/true");
    assert_eq!(mmap.cpu_mode, CpuMode::User);
    let sample_id = mmap.sample_id.unwrap();
    assert_eq!(sample_id.pid, Some(10));
    assert_eq!(sample_id.tid, Some(11));
    assert_eq!(sample_id.time, Some(100));
    assert_eq!(sample_id.cpu, Some(2));

    let comm = &records.comm_records()[0];
    assert_eq!(comm.name, b"true");
    assert!(comm.is_exec);
    assert_eq!(comm.sample_id.unwrap().time, Some(200));

    assert_eq!(records.lost_records()[0].sample_id.unwrap().time, Some(300));
}

#[test]
fn sample_sections_in_order() {
    let format = SampleFormat::IDENTIFIER
        | SampleFormat::IP
        | SampleFormat::TID
        | SampleFormat::TIME
        | SampleFormat::CPU
        | SampleFormat::PERIOD
        | SampleFormat::CALLCHAIN
        | SampleFormat::RAW;
    let payload = Le::new()
        .u64(77)
        .u64(0xffff_0000_1234)
        .u32(20)
        .u32(21)
        .u64(5000)
        .u32(3)
        .u32(0)
        .u64(100_000)
        .u64s(&[3, 0xa, 0xb, 0xc])
        .u32(4)
        .bytes(&[1, 2, 3, 4]);
    let data = Le::new()
        .record(PERF_RECORD_SAMPLE, PERF_RECORD_MISC_USER, payload)
        .finish();
    let records = decode(&data, DecodeConfig::new(format));
    let sample = &records.sample_records()[0];
    assert_eq!(sample.identifier, Some(77));
    assert_eq!(sample.ip, Some(0xffff_0000_1234));
    assert_eq!((sample.pid, sample.tid), (Some(20), Some(21)));
    assert_eq!(sample.time, Some(5000));
    assert_eq!(sample.cpu, Some(3));
    assert_eq!(sample.period, Some(100_000));
    assert_eq!(sample.callchain.as_deref(), Some(&[0xa, 0xb, 0xc][..]));
    assert_eq!(sample.raw.as_deref(), Some(&[1, 2, 3, 4][..]));
    assert_eq!(sample.cpu_mode, Some(CpuMode::User));
    assert_eq!(sample.addr, None);
}

#[test]
fn user_regs_sized_by_popcount() {
    let config = DecodeConfig::new(SampleFormat::REGS_USER).with_sample_regs_user(0b1011);
    let data = Le::new()
        .record(
            PERF_RECORD_SAMPLE,
            0,
            Le::new().u64(PERF_SAMPLE_REGS_ABI_64).u64s(&[100, 101, 103]),
        )
        .record(PERF_RECORD_LOST, 0, lost(1, 1))
        .finish();
    let records = decode(&data, config);
    let regs = records.sample_records()[0].user_regs.as_ref().unwrap();
    assert_eq!(regs.values.len(), 3);
    assert_eq!(regs.get(0), Some(100));
    assert_eq!(regs.get(2), None);
    assert_eq!(regs.get(3), Some(103));
    // The following record is still in sync.
    assert_eq!(records.lost_records().len(), 1);
}

#[test]
fn user_stack_dyn_size_presence() {
    // WEIGHT follows STACK_USER, so it is read right after dyn_size.
    let config = DecodeConfig::new(SampleFormat::STACK_USER | SampleFormat::WEIGHT);
    let data = Le::new()
        .record(PERF_RECORD_SAMPLE, 0, Le::new().u64(0).u64(1))
        .record(
            PERF_RECORD_SAMPLE,
            0,
            Le::new().u64(16).bytes(&[7; 16]).u64(8).u64(2),
        )
        .finish();
    let records = decode(&data, config);
    let samples = records.sample_records();

    let empty = samples[0].user_stack.as_ref().unwrap();
    assert!(empty.data.is_empty());
    assert_eq!(empty.dyn_size, None);
    assert_eq!(samples[0].weight, Some(1));

    let stack = samples[1].user_stack.as_ref().unwrap();
    assert_eq!(stack.data.len(), 16);
    assert_eq!(stack.dyn_size, Some(8));
    assert_eq!(stack.live_bytes(), &[7; 8]);
    assert_eq!(samples[1].weight, Some(2));
}

#[test]
fn sample_never_reads_past_its_size() {
    let config = DecodeConfig::new(SampleFormat::CALLCHAIN);
    // The callchain claims 1000 entries but the record holds two.
    let data = Le::new()
        .record(PERF_RECORD_SAMPLE, 0, Le::new().u64s(&[1000, 1, 2]))
        .record(PERF_RECORD_LOST, 0, lost(1, 1))
        .finish();
    let err = RecordStream::new(&data[..], config)
        .decode_all()
        .unwrap_err();
    assert!(err.records.is_empty());
    assert!(matches!(
        err.error,
        DecodeError::InconsistentLength {
            offset: 0,
            kind: RecordKind::Sample,
            size: 32,
            ..
        }
    ));
}

#[test]
fn big_endian_stream() {
    let data = Writer::<BigEndian>::new()
        .record(
            PERF_RECORD_COMM,
            0,
            Writer::<BigEndian>::new()
                .u32(0x0102)
                .u32(0x0304)
                .bytes(b"be\0\0\0\0\0\0"),
        )
        .finish();
    let config = DecodeConfig::default().with_endian(Endianness::BigEndian);
    let records = decode(&data, config);
    let comm = &records.comm_records()[0];
    assert_eq!((comm.pid, comm.tid), (0x0102, 0x0304));
    assert_eq!(comm.name, b"be");
}

#[test]
fn independent_passes_over_the_same_bytes() {
    let data = Le::new().record(PERF_RECORD_LOST, 0, lost(9, 9)).finish();
    let config = DecodeConfig::default();
    let first = decode(&data, config);
    let second = decode(&data, config);
    assert_eq!(first, second);
}

/// A little-endian perf.data image with one attribute.
fn perf_data(sample_type: u64, flags: u64, records: &[u8]) -> Vec<u8> {
    const HEADER_SIZE: u64 = 104;
    const ATTR_SIZE: u64 = 112;
    let entry_size = ATTR_SIZE + 16;
    let mut attr = vec![0; ATTR_SIZE as usize];
    LittleEndian::write_u32(&mut attr[4..8], ATTR_SIZE as u32);
    LittleEndian::write_u64(&mut attr[24..32], sample_type);
    LittleEndian::write_u64(&mut attr[40..48], flags);
    Le::new()
        .bytes(b"PERFILE2")
        .u64s(&[HEADER_SIZE, entry_size])
        .u64s(&[HEADER_SIZE, entry_size])
        .u64s(&[HEADER_SIZE + entry_size, records.len() as u64])
        .u64s(&[0; 6])
        .bytes(&attr)
        .u64s(&[0, 0])
        .bytes(records)
        .finish()
}

#[test]
fn perf_file_round() {
    let format = SampleFormat::IP | SampleFormat::TID | SampleFormat::TIME;
    let records = Le::new()
        .record(
            PERF_RECORD_COMM,
            0,
            Le::new()
                .u32(1)
                .u32(1)
                .bytes(b"init\0\0\0\0")
                .u32(1)
                .u32(1)
                .u64(10),
        )
        .record(
            PERF_RECORD_SAMPLE,
            PERF_RECORD_MISC_USER,
            Le::new().u64(0x1000).u32(1).u32(1).u64(20),
        )
        .record(PERF_RECORD_EXIT, 0, Le::new().u32(1).u32(0).u32(1).u32(0).u64(30))
        .finish();
    let data = perf_data(format.bits(), ATTR_FLAG_BIT_SAMPLE_ID_ALL, &records);

    let file = PerfFile::parse(&data).unwrap();
    assert_eq!(file.endian(), Endianness::LittleEndian);
    assert_eq!(file.decode_config().sample_format(), format);

    let mut stream = file.records();
    let mut kinds = Vec::new();
    while let Some(record) = stream.next_record().unwrap() {
        if let Record::Comm(comm) = &record {
            assert_eq!(comm.name, b"init");
            assert_eq!(comm.sample_id.unwrap().time, Some(10));
        }
        kinds.push(record.kind());
    }
    assert_eq!(
        kinds,
        vec![RecordKind::Comm, RecordKind::Sample, RecordKind::Exit]
    );
    assert_eq!(stream.position(), file.record_data().len() as u64);

    let decoded = file.records().decode_all().unwrap();
    assert_eq!(decoded.sample_records()[0].time, Some(20));
    assert_eq!(decoded.skipped_count(), 1);
}

/// Writes `section` with values derived from `seed`, and records them in
/// `expected`.
fn write_section(w: Le, expected: &mut SampleRecord, section: SampleSection, seed: u64) -> Le {
    match section {
        SampleSection::Identifier => {
            expected.identifier = Some(seed);
            w.u64(seed)
        }
        SampleSection::Ip => {
            expected.ip = Some(seed);
            w.u64(seed)
        }
        SampleSection::Tid => {
            expected.pid = Some(seed as u32);
            expected.tid = Some(seed as u32 + 1);
            w.u32(seed as u32).u32(seed as u32 + 1)
        }
        SampleSection::Time => {
            expected.time = Some(seed);
            w.u64(seed)
        }
        SampleSection::Addr => {
            expected.addr = Some(seed);
            w.u64(seed)
        }
        SampleSection::Id => {
            expected.id = Some(seed);
            w.u64(seed)
        }
        SampleSection::StreamId => {
            expected.stream_id = Some(seed);
            w.u64(seed)
        }
        SampleSection::Cpu => {
            expected.cpu = Some(seed as u32);
            w.u32(seed as u32).u32(0)
        }
        SampleSection::Period => {
            expected.period = Some(seed);
            w.u64(seed)
        }
        SampleSection::Read => {
            expected.read = Some(ReadValues {
                is_group: false,
                time_enabled: None,
                time_running: None,
                values: vec![ReadValue {
                    value: seed,
                    id: Some(seed + 1),
                    lost: None,
                }],
            });
            w.u64s(&[seed, seed + 1])
        }
        SampleSection::Callchain => {
            expected.callchain = Some(vec![seed, seed + 1]);
            w.u64s(&[2, seed, seed + 1])
        }
        SampleSection::Raw => {
            let raw = (seed as u32).to_le_bytes();
            expected.raw = Some(raw.to_vec());
            w.u32(4).bytes(&raw)
        }
        SampleSection::BranchStack => {
            expected.branch_stack = Some(BranchStack {
                hw_idx: None,
                entries: vec![BranchEntry {
                    from: seed,
                    to: seed + 1,
                    flags: seed + 2,
                }],
            });
            w.u64s(&[1, seed, seed + 1, seed + 2])
        }
        SampleSection::UserRegs => {
            expected.user_regs = Some(Regs {
                abi: PERF_SAMPLE_REGS_ABI_64,
                mask: 0b11,
                values: vec![seed, seed + 1],
            });
            w.u64s(&[PERF_SAMPLE_REGS_ABI_64, seed, seed + 1])
        }
        SampleSection::UserStack => {
            expected.user_stack = Some(UserStack {
                data: seed.to_le_bytes().to_vec(),
                dyn_size: Some(4),
            });
            w.u64(8).u64(seed).u64(4)
        }
        SampleSection::Weight => {
            expected.weight = Some(seed);
            w.u64(seed)
        }
        SampleSection::DataSrc => {
            expected.data_src = Some(seed);
            w.u64(seed)
        }
        SampleSection::Transaction => {
            expected.transaction = Some(seed);
            w.u64(seed)
        }
        other => panic!("{:?} is not one of the base sections", other),
    }
}

#[test]
fn every_combination_of_base_sections() {
    // IDENTIFIER through TRANSACTION.
    let base = &SAMPLE_SECTIONS[..18];
    assert_eq!(base[17].1, SampleSection::Transaction);
    for combo in 0u32..(1 << base.len()) {
        let mut format = SampleFormat::empty();
        let mut expected = SampleRecord {
            cpu_mode: Some(CpuMode::Unknown),
            ..Default::default()
        };
        let mut payload = Le::new();
        for (i, &(bits, section)) in base.iter().enumerate() {
            if combo & (1 << i) != 0 {
                format |= bits;
                payload = write_section(payload, &mut expected, section, 0x1000 * (i as u64 + 1));
            }
        }
        let config = DecodeConfig::new(format)
            .with_read_format(ReadFormat::ID)
            .with_sample_regs_user(0b11);
        let data = Le::new()
            .record(PERF_RECORD_SAMPLE, 0, payload)
            .record(PERF_RECORD_LOST, 0, lost(1, 1))
            .finish();

        let mut stream = RecordStream::new(&data[..], config);
        match stream.next_record() {
            Ok(Some(Record::Sample(sample))) => assert_eq!(sample, expected, "{:?}", format),
            other => panic!("{:?}: unexpected {:?}", format, other),
        }
        assert!(matches!(stream.next_record(), Ok(Some(Record::Lost(_)))));
        assert_eq!(stream.position(), data.len() as u64);
    }
}
