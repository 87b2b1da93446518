use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use starjar::core::services::{InvestmentService, NewInvestment};
use starjar::ledger::{default_banks, ActivityCategory, ActivityLog, Child, Ledger};
use starjar::storage::{JsonStore, StateStore};
use tempfile::tempdir;

fn build_sample_ledger(entry_count: usize) -> Ledger {
    let mut ledger = Ledger::new();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let ids: Vec<_> = ["Alice", "Ben", "Chloe", "Dev"]
        .iter()
        .map(|name| {
            let child = Child::new(*name);
            let id = child.id;
            ledger.children.push(child);
            id
        })
        .collect();

    for idx in 0..entry_count {
        let child_id = ids[idx % ids.len()];
        let points = if idx % 5 == 0 { -2 } else { 3 };
        let category = if points < 0 {
            ActivityCategory::Redemption
        } else {
            ActivityCategory::Chore
        };
        let entry = ActivityLog::new(child_id, format!("Task {}", idx % 40), points, category)
            .at(start + Duration::hours(idx as i64));
        ledger.post_entry(entry);
    }
    ledger
}

fn with_deposits(mut ledger: Ledger, per_child: usize) -> Ledger {
    let banks = default_banks();
    let opened = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let children: Vec<_> = ledger.children.iter().map(|child| child.id).collect();
    for child_id in children {
        for idx in 0..per_child {
            let request = NewInvestment {
                child_id,
                bank_id: banks[idx % banks.len()].id.clone(),
                amount: 5,
                months: 1,
            };
            InvestmentService::create(&mut ledger, &banks, &request, opened).expect("deposit");
        }
    }
    ledger
}

fn bench_ledger_io(c: &mut Criterion) {
    let ledger = build_sample_ledger(black_box(10_000));
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf(), Some(2)).expect("store");

    c.bench_function("ledger_commit_10k", |b| {
        b.iter(|| {
            store.commit(&ledger).expect("commit ledger");
        })
    });

    store.commit(&ledger).expect("seed");

    c.bench_function("ledger_load_10k", |b| {
        b.iter(|| {
            let loaded = store.load_ledger().expect("load ledger");
            black_box(loaded);
        })
    });
}

fn bench_ledger_rules(c: &mut Criterion) {
    let ledger = with_deposits(build_sample_ledger(black_box(10_000)), 50);
    let banks = default_banks();
    let later = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

    c.bench_function("ledger_warnings_10k", |b| {
        b.iter(|| {
            black_box(ledger.warnings());
        })
    });

    c.bench_function("settle_matured_200", |b| {
        b.iter_batched(
            || ledger.clone(),
            |mut ledger| {
                let settled = InvestmentService::settle_matured(&mut ledger, &banks, later);
                black_box(settled);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_ledger_io, bench_ledger_rules);
criterion_main!(benches);
