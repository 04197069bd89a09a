use autothrottle::Throttler;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn benchmark_allow(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let _guard = rt.enter();

    let mut group = c.benchmark_group("allow");
    group.throughput(Throughput::Elements(1));

    // Fast path: delay is zero, admission is a single atomic load
    group.bench_function("unthrottled", |b| {
        let throttler = Throttler::new(Duration::from_secs(1)).unwrap();
        b.iter(|| black_box(throttler.allow()));
    });

    group.bench_function("unthrottled_contended", |b| {
        let throttler = Arc::new(Throttler::new(Duration::from_secs(1)).unwrap());
        let stop = Arc::new(AtomicBool::new(false));
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let throttler = Arc::clone(&throttler);
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        black_box(throttler.allow());
                    }
                })
            })
            .collect();

        b.iter(|| black_box(throttler.allow()));

        stop.store(true, Ordering::Relaxed);
        for worker in workers {
            worker.join().unwrap();
        }
    });

    // Worst case: throttled and no permit available
    group.bench_function("throttled", |b| {
        let throttler = Throttler::new(Duration::from_secs(1)).unwrap();
        throttler.down();
        assert!(throttler.current_delay() > Duration::ZERO);
        b.iter(|| black_box(throttler.allow()));
    });

    group.bench_function("throttled_contended", |b| {
        let throttler = Arc::new(Throttler::new(Duration::from_secs(1)).unwrap());
        throttler.down();
        let stop = Arc::new(AtomicBool::new(false));
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let throttler = Arc::clone(&throttler);
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        black_box(throttler.allow());
                    }
                })
            })
            .collect();

        b.iter(|| black_box(throttler.allow()));

        stop.store(true, Ordering::Relaxed);
        for worker in workers {
            worker.join().unwrap();
        }
    });

    group.finish();
}

fn benchmark_adjust(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let _guard = rt.enter();

    let mut group = c.benchmark_group("adjust");
    group.throughput(Throughput::Elements(1));

    group.bench_function("up_down_cycle", |b| {
        let throttler = Throttler::new(Duration::from_secs(1)).unwrap();
        b.iter(|| {
            throttler.down();
            throttler.up();
        });
    });

    group.bench_function("down_at_ceiling", |b| {
        let throttler = Throttler::new(Duration::from_millis(1)).unwrap();
        throttler.down();
        b.iter(|| throttler.down());
    });

    group.finish();
}

criterion_group!(benches, benchmark_allow, benchmark_adjust);
criterion_main!(benches);
