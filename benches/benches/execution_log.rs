use coffer_executor::ExecutionLog;
use coffer_types::Address;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn filled_log(entries: u64) -> ExecutionLog {
    let mut log = ExecutionLog::new();
    for id in 1..=entries {
        log.append(id, Address::from_bytes([5u8; 20]), u128::from(id), id, Address::ZERO);
    }
    log
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution_log");
    group.throughput(Throughput::Elements(1));
    group.bench_function("append", |b| {
        let mut log = ExecutionLog::new();
        let mut id = 0u64;
        b.iter(|| {
            id += 1;
                black_box(log.append(id, Address::from_bytes([5u8; 20]), 1, id, Address::ZERO))
        })
    });
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution_log");
    let log = filled_log(1_000);
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("verify_chain_1k", |b| b.iter(|| black_box(log.verify_chain())));
    group.finish();
}

criterion_group!(benches, bench_append, bench_verify);
criterion_main!(benches);
