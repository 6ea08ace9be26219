//! Poke and dispatch cost
//!
//! Run with: cargo bench -p nhub --bench poke

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nhub::{ChannelKind, HubConfig, NotificationHub, PumpExit};
use std::hint::black_box;

fn hub(kind: ChannelKind) -> NotificationHub {
    NotificationHub::with_config(HubConfig::new().blocking(false).channel(kind))
        .expect("hub")
}

// Already queued: one failed compare-exchange, no syscall
fn bench_poke_coalesced(c: &mut Criterion) {
    let hub = hub(ChannelKind::Auto);
    let n = hub.add_notify(|| {}).expect("notifier");
    n.poke().expect("poke");

    c.bench_function("poke/coalesced", |b| b.iter(|| black_box(n.poke())));
}

// Idle → queued → dispatched: one send, one recv, one callback
fn bench_poke_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("poke/dispatch");
    group.throughput(Throughput::Elements(1));

    for kind in [ChannelKind::SocketPair, ChannelKind::Loopback] {
        let hub = hub(kind);
        let n = hub.add_notify(|| {}).expect("notifier");
        group.bench_with_input(BenchmarkId::from_parameter(kind), &(), |b, _| {
            b.iter(|| {
                n.poke().expect("poke");
                // Loopback may need a moment before the key is readable
                while n.is_queued() {
                    assert_ne!(hub.handle().expect("handle"), PumpExit::Closed);
                }
            })
        });
    }

    group.finish();
}

// Many notifiers poked, drained by one handle() call
fn bench_batch_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("poke/batch");

    for count in [16usize, 128, 1024] {
        let hub = hub(ChannelKind::SocketPair);
        let notifiers: Vec<_> = (0..count)
            .map(|_| hub.add_notify(|| {}).expect("notifier"))
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &notifiers, |b, ns| {
            b.iter(|| {
                for n in ns {
                    n.poke().expect("poke");
                }
                black_box(hub.handle().expect("handle"));
            })
        });
    }

    group.finish();
}

fn bench_ffi_poke(c: &mut Criterion) {
    let hub = hub(ChannelKind::Auto);
    let n = hub.add_notify(|| {}).expect("notifier");
    n.poke().expect("poke");
    let raw = n.as_raw();

    c.bench_function("poke/ffi_coalesced", |b| {
        b.iter(|| black_box(unsafe { nhub::ffi::nhub_notifier_poke(raw) }))
    });
}

criterion_group!(
    benches,
    bench_poke_coalesced,
    bench_poke_dispatch,
    bench_batch_drain,
    bench_ffi_poke,
);
criterion_main!(benches);
