use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use submission_throttle::{
    FixedLimits, RateDefinition, RateLimiter, ScopeUsage, ShardedStorage, StaticFlagSet,
    SubmissionRatePolicy, SystemClock, TracingMetricsSink, UsageKey,
};

type Store = Arc<ShardedStorage<UsageKey, ScopeUsage>>;

fn wide_open() -> RateDefinition {
    RateDefinition {
        per_week: Some(1e12),
        per_day: Some(1e12),
        per_hour: Some(1e12),
        per_minute: Some(1e12),
        per_second: Some(1e12),
    }
}

fn limiter(definition: RateDefinition) -> RateLimiter<Store> {
    RateLimiter::new(
        "submissions",
        Arc::new(FixedLimits::new(definition)),
        Arc::new(ShardedStorage::new()),
        Arc::new(SystemClock::new()),
    )
}

/// Benchmark single-threaded check and report throughput
fn bench_single_threaded_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");
    group.throughput(Throughput::Elements(1000));

    for windows in ["one_window", "five_windows"].iter() {
        let definition = match *windows {
            "one_window" => RateDefinition {
                per_day: Some(1e12),
                ..Default::default()
            },
            "five_windows" => wide_open(),
            _ => unreachable!(),
        };

        group.bench_with_input(
            BenchmarkId::new("allow_usage", windows),
            &definition,
            |b, definition| {
                let limiter = limiter(*definition);
                limiter.report_usage("tenant-a");

                b.iter(|| {
                    for _ in 0..1000 {
                        black_box(limiter.allow_usage(black_box("tenant-a")));
                    }
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("report_usage", windows),
            &definition,
            |b, definition| {
                let limiter = limiter(*definition);

                b.iter(|| {
                    for _ in 0..1000 {
                        limiter.report_usage(black_box("tenant-a"));
                    }
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the full submission decision path
fn bench_policy_decision(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("rate_limit_submission", |b| {
        let storage: Store = Arc::new(ShardedStorage::new());
        let clock = Arc::new(SystemClock::new());
        let global = RateLimiter::new(
            "global_submissions",
            Arc::new(FixedLimits::new(wide_open())),
            storage.clone(),
            clock.clone(),
        );
        let per_tenant = RateLimiter::new(
            "submissions",
            Arc::new(FixedLimits::new(wide_open())),
            storage,
            clock.clone(),
        );
        let policy = SubmissionRatePolicy::new(
            global,
            per_tenant,
            Arc::new(StaticFlagSet::new()),
            Arc::new(TracingMetricsSink::new()),
            clock,
        );

        b.iter(|| {
            for _ in 0..1000 {
                black_box(policy.rate_limit_submission(black_box("tenant-a")));
            }
        })
    });

    group.finish();
}

/// Benchmark multi-threaded concurrent throughput
fn bench_concurrent_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let limiter = Arc::new(limiter(wide_open()));

                    let mut handles = vec![];
                    for i in 0..num_threads {
                        let limiter = Arc::clone(&limiter);
                        let handle = std::thread::spawn(move || {
                            // Each thread uses its own tenant to avoid contention
                            let tenant = format!("tenant-{}", i);
                            for _ in 0..1000 {
                                if black_box(limiter.allow_usage(black_box(&tenant))) {
                                    limiter.report_usage(&tenant);
                                }
                            }
                        });
                        handles.push(handle);
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

/// Benchmark scope diversity in the backing storage
fn bench_scope_diversity(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope_diversity");
    group.throughput(Throughput::Elements(1000));

    for num_tenants in [1, 10, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("tenants", num_tenants),
            num_tenants,
            |b, &num_tenants| {
                let limiter = limiter(wide_open());
                let tenants: Vec<String> =
                    (0..num_tenants).map(|i| format!("tenant-{}", i)).collect();

                b.iter(|| {
                    for i in 0..1000 {
                        let tenant = &tenants[i % num_tenants];
                        black_box(limiter.allow_usage(black_box(tenant)));
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_threaded_throughput,
    bench_policy_decision,
    bench_concurrent_throughput,
    bench_scope_diversity
);
criterion_main!(benches);
