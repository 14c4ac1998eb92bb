//! Per-call latency measurement for the spin-polling call slot.
//!
//! Issues a fixed number of increment calls through the slot protocol,
//! timestamps each round trip, and persists one parquet row per call. The
//! same workload over a `std::sync::mpsc` rendezvous serves as the
//! conventional-primitive baseline.

mod affinity;
mod parquet_out;

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use clap::{Parser, ValueEnum};
use minstant::Instant;
use spincall::{CallSlot, CallTable, Responder};

use parquet_out::LatencyRow;

#[derive(Parser, Debug)]
#[command(name = "spincall_bench")]
#[command(about = "Per-call latency measurement for the spin-polling call slot")]
struct Cli {
    /// Measured calls per run
    #[arg(short = 'n', long, default_value = "10000")]
    repeats: u64,

    /// Warmup calls before measuring
    #[arg(short, long, default_value = "1000")]
    warmup: u64,

    /// Number of runs per system
    #[arg(short, long, default_value = "3")]
    runs: u32,

    /// Output parquet file path
    #[arg(short, long, default_value = "spincall_bench.parquet")]
    output: String,

    /// Core to pin the requester thread to
    #[arg(long)]
    requester_core: Option<usize>,

    /// Core to pin the responder thread to
    #[arg(long)]
    responder_core: Option<usize>,

    /// Systems to measure
    #[arg(long, value_enum, value_delimiter = ',', default_value = "slot,channel")]
    systems: Vec<System>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum System {
    /// Spin-polling call slot
    Slot,
    /// std::sync::mpsc round trip baseline
    Channel,
}

fn run_slot(cli: &Cli, run_index: u32) -> Vec<LatencyRow> {
    let slot = Arc::new(CallSlot::<u64>::new());
    let mut table = CallTable::with_capacity(1);
    table.register(0, |v: &mut u64| *v += 1);

    let responder_slot = Arc::clone(&slot);
    let responder_core = cli.responder_core;
    let responder = thread::spawn(move || {
        affinity::pin_if_configured(responder_core, "responder");
        Responder::new(responder_slot, table).run();
    });

    affinity::pin_if_configured(cli.requester_core, "requester");

    let mut counter = 0u64;
    for _ in 0..cli.warmup {
        slot.call(0, &mut counter).expect("warmup call failed");
    }

    let mut rows = Vec::with_capacity(cli.repeats as usize);
    for i in 0..cli.repeats {
        let start = Instant::now();
        slot.call(0, &mut counter).expect("measured call failed");
        let latency_ns = start.elapsed().as_nanos() as u64;

        let expected = cli.warmup + i + 1;
        if counter != expected {
            eprintln!("error: counter is {} but {} calls completed", counter, expected);
        }

        rows.push(LatencyRow {
            system: "slot".to_string(),
            run_index,
            call_index: i,
            latency_ns,
        });
    }

    slot.stop();
    responder.join().unwrap();
    rows
}

fn run_channel(cli: &Cli, run_index: u32) -> Vec<LatencyRow> {
    let (req_tx, req_rx) = mpsc::channel::<u64>();
    let (resp_tx, resp_rx) = mpsc::channel::<u64>();

    let responder_core = cli.responder_core;
    let responder = thread::spawn(move || {
        affinity::pin_if_configured(responder_core, "responder");
        while let Ok(v) = req_rx.recv() {
            resp_tx.send(v + 1).unwrap();
        }
    });

    affinity::pin_if_configured(cli.requester_core, "requester");

    let mut counter = 0u64;
    for _ in 0..cli.warmup {
        req_tx.send(counter).expect("warmup send failed");
        counter = resp_rx.recv().expect("warmup recv failed");
    }

    let mut rows = Vec::with_capacity(cli.repeats as usize);
    for i in 0..cli.repeats {
        let start = Instant::now();
        req_tx.send(counter).expect("measured send failed");
        counter = resp_rx.recv().expect("measured recv failed");
        let latency_ns = start.elapsed().as_nanos() as u64;

        let expected = cli.warmup + i + 1;
        if counter != expected {
            eprintln!("error: counter is {} but {} calls completed", counter, expected);
        }

        rows.push(LatencyRow {
            system: "channel".to_string(),
            run_index,
            call_index: i,
            latency_ns,
        });
    }

    drop(req_tx);
    responder.join().unwrap();
    rows
}

fn print_summary(system: System, run_index: u32, rows: &[LatencyRow]) {
    let mut lat: Vec<u64> = rows.iter().map(|r| r.latency_ns).collect();
    lat.sort_unstable();
    let pct = |q: f64| lat[((lat.len() - 1) as f64 * q) as usize];
    println!(
        "{:?} run {}: n={} min={}ns p50={}ns p99={}ns max={}ns",
        system,
        run_index,
        lat.len(),
        lat[0],
        pct(0.5),
        pct(0.99),
        lat[lat.len() - 1],
    );
}

fn main() {
    let cli = Cli::parse();

    let mut rows = Vec::new();
    for run_index in 0..cli.runs {
        for &system in &cli.systems {
            let run_rows = match system {
                System::Slot => run_slot(&cli, run_index),
                System::Channel => run_channel(&cli, run_index),
            };
            print_summary(system, run_index, &run_rows);
            rows.extend(run_rows);
        }
    }

    parquet_out::write_parquet(&cli.output, &rows).expect("failed to write parquet output");
    println!("wrote {} rows to {}", rows.len(), cli.output);
}
