use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rask_log_bus::codec::WireFormat;
use rask_log_bus::domain::{Level, LogEntry};
use rask_log_bus::port::{Decoder, Encoder};

fn sample_entry() -> LogEntry {
    LogEntry::new(Level::Info, "GET /api/users 200 1024 12ms")
        .with_field("service", "rask-log-bus")
        .with_field("hostname", "worker-3")
        .with_field("pid", "4242")
        .with_field("user", "alice")
        .with_field("status", 200_i64)
}

fn benchmark_encode(c: &mut Criterion) {
    let entry = sample_entry();
    let mut group = c.benchmark_group("encode");

    for (name, format) in [("protobuf", WireFormat::Protobuf), ("json", WireFormat::Json)] {
        let encoder = format.encoder();
        group.bench_function(name, |b| {
            b.iter(|| encoder.encode(std::hint::black_box(&entry)))
        });
    }

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let entry = sample_entry();
    let mut group = c.benchmark_group("decode");

    for (name, format) in [("protobuf", WireFormat::Protobuf), ("json", WireFormat::Json)] {
        let body = match format.encoder().encode(&entry) {
            Ok(body) => body,
            Err(e) => panic!("sample entry must encode: {e}"),
        };
        let decoder = format.decoder();

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut decoded = LogEntry::default();
                decoder.decode(std::hint::black_box(&body), &mut decoded)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_encode, benchmark_decode);
criterion_main!(benches);
