//! Benchmark: compare walk (validate only) vs decode vs decode+encode on a batch of
//! synthetic test-suite messages. Each suite carries repeated nested test cases and a
//! packed enum run, so the batch exercises every wire type the codec writes.

#[cfg(feature = "decode_profile")]
use protowire::{get_decode_profile, reset_decode_profile};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protowire::{Codec, FieldDescriptor as F, MessageSchema, Record, SchemaRegistry, Value, ValueKind};

const SUITE: &str = "TestSuite";
const SUITES: usize = 256;

fn registry() -> SchemaRegistry {
    SchemaRegistry::resolve(vec![
        MessageSchema::new(SUITE)
            .field(F::scalar("name", 1, ValueKind::String))
            .field(F::scalar("mode", 2, ValueKind::Enum))
            .field(F::repeated_message("test_cases", 3, "TestCase"))
            .field(F::packed("relevant_protocols", 4, ValueKind::Enum))
            .field(F::scalar("relies_on_tls", 9, ValueKind::Bool))
            .field(F::scalar("relies_on_tls_client_certs", 10, ValueKind::Bool)),
        MessageSchema::new("TestCase")
            .field(F::scalar("request", 1, ValueKind::Bytes))
            .field(F::repeated_message("expand_requests", 2, "ExpandedSize"))
            .field(F::scalar("timeout_ms", 3, ValueKind::UInt64))
            .field(F::scalar("weight", 4, ValueKind::Double)),
        MessageSchema::new("ExpandedSize")
            .field(F::optional("size_relative_to_limit", 1, ValueKind::Int32)),
    ])
    .expect("resolve")
}

fn suite(i: usize) -> Record {
    let mut r = Record::new()
        .with(1, format!("suite-{}", i).as_str())
        .with(2, Value::Enum((i % 3) as i32))
        .with(9, i % 2 == 0);
    for p in 0..(i % 5) {
        r.push(4, Value::Enum(p as i32 + 1));
    }
    for c in 0..8 {
        let mut case = Record::new()
            .with(1, Value::Bytes(vec![c as u8; 32 + i % 64]))
            .with(3, Value::U64((i * 1000 + c) as u64))
            .with(4, Value::F64(c as f64 * 0.5));
        for s in -1..2 {
            case.push(2, Value::Message(Record::new().with(1, Value::I32(s))));
        }
        r.push(3, Value::Message(case));
    }
    r
}

fn bench_codec(c: &mut Criterion) {
    let codec = Codec::with_defaults(registry());
    let records: Vec<Record> = (0..SUITES).map(suite).collect();
    let encoded: Vec<Vec<u8>> = records
        .iter()
        .map(|r| codec.serialize(SUITE, r).expect("encode"))
        .collect();
    let total_bytes: usize = encoded.iter().map(Vec::len).sum();
    eprintln!("codec_bench: {} suites, {} bytes", encoded.len(), total_bytes);

    c.bench_function("encode_suites", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for r in &records {
                bytes += codec.serialize(SUITE, black_box(r)).map(|v| v.len()).unwrap_or(0);
            }
            black_box(bytes)
        });
    });
    c.bench_function("walk_validate_suites", |b| {
        b.iter(|| {
            let mut ok = 0usize;
            for body in &encoded {
                if codec.validate(SUITE, black_box(body)).is_ok() {
                    ok += 1;
                }
            }
            black_box(ok)
        });
    });
    c.bench_function("decode_suites", |b| {
        b.iter(|| {
            let mut fields = 0usize;
            for body in &encoded {
                if let Ok(r) = codec.deserialize(SUITE, black_box(body)) {
                    fields += r.len();
                }
            }
            black_box(fields)
        });
    });
    c.bench_function("decode_encode_suites", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for body in &encoded {
                if let Ok(r) = codec.deserialize(SUITE, black_box(body)) {
                    bytes += codec.serialize(SUITE, &r).map(|v| v.len()).unwrap_or(0);
                }
            }
            black_box(bytes)
        });
    });

    // Manual sustained-rate summary alongside criterion's numbers.
    const ITERS: u32 = 50;
    let rate = |label: &str, run: &dyn Fn()| {
        let start = std::time::Instant::now();
        for _ in 0..ITERS {
            run();
        }
        let ns = start.elapsed().as_nanos() / u128::from(ITERS);
        let mb_per_sec = (total_bytes as f64) / (ns as f64 / 1e9) / 1e6;
        let msgs_per_sec = (SUITES as f64) / (ns as f64 / 1e9);
        eprintln!(
            "  {:18} | {:>10.2} us | ~{:.2} K msg/s | {:>7.2} MB/s",
            label,
            ns as f64 / 1000.0,
            msgs_per_sec / 1e3,
            mb_per_sec
        );
    };
    eprintln!();
    eprintln!("--- Sustainable data rate ({} suites, {} bytes) ---", SUITES, total_bytes);
    rate("walk (validate)", &|| {
        for body in &encoded {
            let _ = codec.validate(SUITE, body);
        }
    });
    rate("decode", &|| {
        for body in &encoded {
            let _ = codec.deserialize(SUITE, body);
        }
    });
    rate("decode+encode", &|| {
        for body in &encoded {
            if let Ok(r) = codec.deserialize(SUITE, body) {
                let _ = codec.serialize(SUITE, &r);
            }
        }
    });
    eprintln!("---");

    // With decode_profile feature: one decode pass and print hotspot breakdown
    #[cfg(feature = "decode_profile")]
    {
        reset_decode_profile();
        for body in &encoded {
            let _ = codec.deserialize(SUITE, body);
        }
        let profile = get_decode_profile();
        let total_ns: u64 = profile.values().sum();
        eprintln!();
        eprintln!("decode hotspot (one pass, decode_profile feature):");
        let mut by_label: Vec<_> = profile.into_iter().collect();
        by_label.sort_by(|a, b| b.1.cmp(&a.1));
        for (label, ns) in &by_label {
            let pct = if total_ns > 0 { *ns as f64 / total_ns as f64 * 100.0 } else { 0.0 };
            eprintln!("  {:20} {:>12} ns  {:5.1}%", label, ns, pct);
        }
        eprintln!("  {:20} {:>12} ns  100.0%", "TOTAL", total_ns);
    }
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
