use clap::Parser;
use perf_records::{DecodedRecordSet, PerfFile, Record};

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "perf-records",
    version,
    about = r#"
perf-records decodes the record section of a perf.data file and prints what
it found. Set RUST_LOG=debug to see every skipped record.

EXAMPLES:
    # Per-kind totals:
    perf-records perf.data

    # Every decoded record, up to the first 20:
    perf-records --records --limit 20 perf.data
"#
)]
struct Opt {
    /// Path to the perf.data file.
    file: PathBuf,

    /// Print every decoded record.
    #[arg(short, long)]
    records: bool,

    /// Stop after this many records.
    #[arg(short, long)]
    limit: Option<usize>,
}

fn main() {
    env_logger::init();
    let opt = Opt::parse();

    let mut data = Vec::new();
    let read_result = File::open(&opt.file).and_then(|mut file| file.read_to_end(&mut data));
    if let Err(err) = read_result {
        eprintln!("Could not read file {:?}: {}", opt.file, err);
        std::process::exit(1)
    }
    let file = match PerfFile::parse(&data) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Could not parse {:?} as a perf.data file: {}", opt.file, err);
            std::process::exit(1)
        }
    };
    eprintln!(
        "{} attributes, {:?}, {} bytes of records",
        file.attrs().len(),
        file.endian(),
        file.record_data().len()
    );

    let mut records = DecodedRecordSet::default();
    let mut stream = file.records();
    let mut error = None;
    let mut count = 0;
    while opt.limit.map_or(true, |limit| count < limit) {
        let offset = stream.position();
        match stream.next_record() {
            Ok(Some(record)) => {
                if opt.records {
                    print_record(offset, &record);
                }
                records.push(record);
                count += 1;
            }
            Ok(None) => break,
            Err(err) => {
                error = Some(err);
                break;
            }
        }
    }

    println!("mmap: {}", records.mmap_records().len());
    println!("comm: {}", records.comm_records().len());
    println!("lost: {}", records.lost_records().len());
    println!("sample: {}", records.sample_records().len());
    for (kind, count) in records.skipped() {
        println!("skipped {:?}: {}", kind, count);
    }

    if let Some(err) = error {
        log::warn!(
            "Decoding stopped after {} bytes of {}",
            stream.position(),
            file.record_data().len()
        );
        eprintln!("Error: {}", err);
        std::process::exit(1)
    }
}

fn print_record(offset: u64, record: &Record) {
    match record {
        Record::Unmodeled { header } => {
            println!("{:#x}: {:?} ({} bytes, skipped)", offset, header.kind, header.size)
        }
        record => println!("{:#x}: {:#?}", offset, record),
    }
}
