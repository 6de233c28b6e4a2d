//! Benchmarks for append, fetch, and scan throughput

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use flashring::{FlashSim, MemFlash, Ring};

const VERSION: u32 = 0x42;
const OBJECT_SIZE: u32 = 16;

/// Benchmark sustained append throughput, evictions included
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_16b");

    group.bench_function("mem", |b| {
        let flash = MemFlash::new(4096, 16);
        let mut ring = Ring::format(flash, VERSION, OBJECT_SIZE).unwrap();
        let payload = [0xA5u8; 16];
        b.iter(|| ring.append(black_box(&payload)).unwrap());
    });

    group.bench_function("file", |b| {
        let dir = tempfile::tempdir().unwrap();
        let sim = FlashSim::create(dir.path().join("bench.img"), 4096, 16).unwrap();
        let mut ring = Ring::format(sim, VERSION, OBJECT_SIZE).unwrap();
        let payload = [0xA5u8; 16];
        b.iter(|| ring.append(black_box(&payload)).unwrap());
    });

    group.finish();
}

/// Benchmark fetch, rewinding whenever the iterator runs dry
fn bench_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_16b");

    group.bench_function("mem", |b| {
        let flash = MemFlash::new(4096, 16);
        let mut ring = Ring::format(flash, VERSION, OBJECT_SIZE).unwrap();
        let payload = [0xA5u8; 16];
        for _ in 0..ring.capacity() {
            ring.append(&payload).unwrap();
        }
        let mut buf = [0u8; 16];
        b.iter(|| {
            if ring.fetch(black_box(&mut buf)).is_err() {
                ring.rewind();
            }
        });
    });

    group.finish();
}

/// Benchmark steady-state journal churn: appends with interleaved fetches
/// and discards in a random mix
fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("append_fetch_discard", |b| {
        let flash = MemFlash::new(4096, 16);
        let mut ring = Ring::format(flash, VERSION, OBJECT_SIZE).unwrap();
        let payload = [0xA5u8; 16];
        let mut buf = [0u8; 16];
        b.iter(|| match rand::random::<u8>() % 4 {
            0 | 1 => ring.append(black_box(&payload)).unwrap(),
            2 => {
                if ring.fetch(black_box(&mut buf)).is_err() {
                    ring.rewind();
                }
            }
            _ => {
                let _ = ring.discard();
            }
        });
    });

    group.finish();
}

/// Benchmark recovery over a saturated ring (every sector in use)
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    let flash = MemFlash::new(4096, 16);
    let mut ring = Ring::format(flash, VERSION, OBJECT_SIZE).unwrap();
    let payload = [0xA5u8; 16];
    for _ in 0..2 * ring.capacity() {
        ring.append(&payload).unwrap();
    }
    let saturated = ring.into_flash();

    group.bench_function("saturated_16_sectors", |b| {
        b.iter_batched(
            || saturated.clone(),
            |flash| Ring::scan(black_box(flash), VERSION, OBJECT_SIZE).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_append, bench_fetch, bench_mixed_workload, bench_scan);
criterion_main!(benches);
