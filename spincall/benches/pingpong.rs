//! Benchmark for call slot round-trip latency.
//!
//! Compares the spin-polling call path against a `std::sync::mpsc`
//! rendezvous performing the same increment workload.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use spincall::{CallSlot, CallTable, Responder};

fn pin_to_core(core_id: usize) {
    core_affinity::set_for_current(core_affinity::CoreId { id: core_id });
}

fn bench_call_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("spincall_call");
    group.throughput(Throughput::Elements(1));

    group.bench_function("slot_u64", |b| {
        let slot = Arc::new(CallSlot::<u64>::new());
        let mut table = CallTable::with_capacity(1);
        table.register(0, |v: &mut u64| *v += 1);

        let responder_slot = Arc::clone(&slot);
        let responder = thread::spawn(move || {
            pin_to_core(1);
            Responder::new(responder_slot, table).run();
        });

        pin_to_core(0);
        let mut data = 0u64;
        for _ in 0..1000 {
            slot.call(0, &mut data).unwrap();
        }
        b.iter(|| {
            slot.call(0, black_box(&mut data)).unwrap();
        });

        slot.stop();
        responder.join().unwrap();
    });

    group.bench_function("mpsc_u64", |b| {
        let (req_tx, req_rx) = mpsc::channel::<u64>();
        let (resp_tx, resp_rx) = mpsc::channel::<u64>();
        let responder = thread::spawn(move || {
            pin_to_core(1);
            while let Ok(v) = req_rx.recv() {
                resp_tx.send(v + 1).unwrap();
            }
        });

        pin_to_core(0);
        let mut data = 0u64;
        for _ in 0..1000 {
            req_tx.send(data).unwrap();
            data = resp_rx.recv().unwrap();
        }
        b.iter(|| {
            req_tx.send(black_box(data)).unwrap();
            data = resp_rx.recv().unwrap();
        });

        drop(req_tx);
        responder.join().unwrap();
    });

    group.finish();
}

criterion_group!(benches, bench_call_latency);
criterion_main!(benches);
