use coffer_core::{AccessControl, EventJournal, ManualClock, MemberDirectory};
use coffer_ledger::share::mul_div_floor;
use coffer_ledger::{RecordingTransfer, TreasuryLedger};
use coffer_types::Address;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

fn member(n: u32) -> Address {
    Address::derive(&n.to_le_bytes())
}

fn admin() -> Address {
    Address::from_bytes([0xAA; 20])
}

fn ledger_with(depositors: u32) -> TreasuryLedger {
    let journal = Arc::new(EventJournal::new(Arc::new(ManualClock::new(0))));
    let access = Arc::new(AccessControl::new([admin()], journal.clone()).expect("admin set"));
    let directory = Arc::new(MemberDirectory::with_members((0..depositors).map(member)));
    let ledger = TreasuryLedger::new(
        access,
        directory,
        Arc::new(RecordingTransfer::new()),
        journal,
    );
    for n in 0..depositors {
        ledger
            .deposit(member(n), 1_000 + u128::from(n))
            .expect("deposit");
    }
    ledger
}

fn bench_share_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("share");
    group.bench_function("mul_div_narrow", |b| {
        b.iter(|| black_box(mul_div_floor(black_box(123_456_789), 10_000, 987_654_321)))
    });
    group.bench_function("mul_div_wide", |b| {
        b.iter(|| black_box(mul_div_floor(black_box(u128::MAX / 3), u128::MAX / 5, u128::MAX / 7)))
    });
    group.finish();
}

fn bench_deposit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");
    group.throughput(Throughput::Elements(1));
    group.bench_function("deposit", |b| {
        let ledger = ledger_with(64);
        let mut n = 0u32;
        b.iter(|| {
            n = (n + 1) % 64;
            ledger.deposit(member(n), 1).expect("deposit");
        })
    });
    group.finish();
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    for depositors in [10u32, 100, 1_000] {
        group.throughput(Throughput::Elements(u64::from(depositors)));
        group.bench_with_input(BenchmarkId::from_parameter(depositors), &depositors, |b, &n| {
            b.iter_batched(
                || ledger_with(n),
                |ledger| {
                    ledger
                        .allocate(Address::from_bytes([0xBB; 20]), 777, admin())
                        .expect("allocate");
                    black_box(ledger.total_tracked())
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_share_math, bench_deposit, bench_allocate);
criterion_main!(benches);
