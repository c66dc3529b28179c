//! Performance-evaluation harness for the indicator variants.
//!
//! Spawns `T` pinned workers per `(K, H)` configuration, each looping
//! `arrive(tid); depart(tid); query()` until a wall-clock deadline, and
//! writes a tab-separated results file: row `i` starts with the thread
//! count, followed by one column per configuration giving the average
//! per-thread visits/ms.
//!
//! Run with:
//! ```bash
//! cargo run --release -- announced        # or: plain | adaptive
//! SNZI_BENCH_SECS=10 cargo run --release -- adaptive
//! ```

#![allow(clippy::cast_precision_loss)]

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use snzi::{AdaptiveSnzi, AnnouncedSnzi, ContentionStatus, PlainSnzi};

/// Reference configurations from the evaluation this harness reproduces.
const CONFIGS: [(usize, usize); 4] = [(2, 0), (2, 1), (2, 2), (4, 1)];

const THREAD_COUNTS: [usize; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

const DEFAULT_DURATION_SECS: u64 = 180;

fn main() {
    let variant = env::args().nth(1).unwrap_or_else(|| "announced".to_string());

    let duration = Duration::from_secs(
        env::var("SNZI_BENCH_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_DURATION_SECS),
    );

    let result = match variant.as_str() {
        "plain" => run_all::<PlainSnzi>(&variant, duration),
        "announced" => run_all::<AnnouncedSnzi>(&variant, duration),
        "adaptive" => run_all::<AdaptiveSnzi>(&variant, duration),
        other => {
            eprintln!("unknown variant '{other}'; expected plain | announced | adaptive");
            process::exit(2);
        }
    };

    if let Err(error) = result {
        eprintln!("failed to write results: {error}");
        process::exit(1);
    }
}

// =============================================================================
// Workload dispatch
// =============================================================================

/// One visit per iteration of the measured loop, generic over the variant.
trait Workload: Send + Sync + Sized + 'static {
    /// Caller-local state threaded through each visit.
    type Ctx: Default + Send;

    fn build(arity: usize, height: usize, threads: usize) -> Self;

    fn visit(&self, tid: usize, ctx: &mut Self::Ctx);
}

impl Workload for PlainSnzi {
    type Ctx = ();

    fn build(arity: usize, height: usize, threads: usize) -> Self {
        Self::new(arity, height, threads).expect("valid benchmark configuration")
    }

    fn visit(&self, tid: usize, _ctx: &mut ()) {
        self.arrive(tid);
        self.depart(tid);
        std::hint::black_box(self.query());
    }
}

impl Workload for AnnouncedSnzi {
    type Ctx = ();

    fn build(arity: usize, height: usize, threads: usize) -> Self {
        Self::new(arity, height, threads).expect("valid benchmark configuration")
    }

    fn visit(&self, tid: usize, _ctx: &mut ()) {
        self.arrive(tid);
        self.depart(tid);
        std::hint::black_box(self.query());
    }
}

impl Workload for AdaptiveSnzi {
    type Ctx = ContentionStatus;

    fn build(arity: usize, height: usize, threads: usize) -> Self {
        Self::new(arity, height, threads).expect("valid benchmark configuration")
    }

    fn visit(&self, tid: usize, status: &mut ContentionStatus) {
        self.arrive(tid, status);
        self.depart(tid, status);
        std::hint::black_box(self.query());
    }
}

// =============================================================================
// Experiment loop
// =============================================================================

fn run_all<W: Workload>(label: &str, duration: Duration) -> io::Result<()> {
    println!("running the {label} variant for {}s per cell", duration.as_secs());

    let mut data = Vec::with_capacity(CONFIGS.len());
    for (arity, height) in CONFIGS {
        data.push(run_config::<W>(arity, height, duration));
    }

    write_results(label, &data)
}

/// Measure one `(K, H)` configuration across all thread counts.
///
/// Returns the average per-thread visits/ms for each thread count.
fn run_config<W: Workload>(arity: usize, height: usize, duration: Duration) -> Vec<f64> {
    println!("configuration (K,H) = ({arity},{height})");

    THREAD_COUNTS
        .iter()
        .map(|&threads| {
            wipe_caches();

            let snzi = Arc::new(W::build(arity, height, threads));
            let start_flag = Arc::new(AtomicBool::new(false));
            let cores = thread::available_parallelism().map_or(1, usize::from);

            let workers: Vec<_> = (0..threads)
                .map(|tid| {
                    let snzi = Arc::clone(&snzi);
                    let start_flag = Arc::clone(&start_flag);
                    thread::spawn(move || {
                        if let Err(error) = pin_current_thread(tid % cores) {
                            eprintln!("could not pin worker {tid}: {error}");
                        }

                        let mut ctx = W::Ctx::default();

                        while !start_flag.load(Ordering::Acquire) {
                            std::hint::spin_loop();
                        }

                        let deadline = Instant::now() + duration;
                        let mut visits = 0u64;
                        while Instant::now() < deadline {
                            snzi.visit(tid, &mut ctx);
                            visits += 1;
                        }
                        visits
                    })
                })
                .collect();

            start_flag.store(true, Ordering::Release);

            let per_thread_rates: Vec<f64> = workers
                .into_iter()
                .map(|worker| {
                    let visits = worker.join().expect("worker panicked");
                    visits as f64 / duration.as_millis() as f64
                })
                .collect();

            let average = per_thread_rates.iter().sum::<f64>() / threads as f64;
            println!("  {threads} threads: {average:.2} visits/ms per thread");
            average
        })
        .collect()
}

fn write_results(label: &str, data: &[Vec<f64>]) -> io::Result<()> {
    let path = format!("snzi-{label}.dat");
    let mut out = BufWriter::new(File::create(&path)?);

    writeln!(out, "# Performance evaluation of the {label} indicator")?;
    write!(out, "# num_threads")?;
    for (arity, height) in CONFIGS {
        write!(out, "\t(K,H)=({arity},{height})")?;
    }
    writeln!(out)?;

    for (row, &threads) in THREAD_COUNTS.iter().enumerate() {
        write!(out, "{threads}")?;
        for column in data {
            write!(out, "\t{}", column[row])?;
        }
        writeln!(out)?;
    }

    println!("wrote {path}");
    Ok(())
}

// =============================================================================
// Machine preparation
// =============================================================================

/// Pin the calling thread to `core`. Errors surface to the harness; the
/// indicator itself never depends on placement.
#[cfg(target_os = "linux")]
fn pin_current_thread(core: usize) -> io::Result<()> {
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core, &mut set);

        if libc::pthread_setaffinity_np(
            libc::pthread_self(),
            std::mem::size_of::<libc::cpu_set_t>(),
            &set,
        ) != 0
        {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn pin_current_thread(_core: usize) -> io::Result<()> {
    Ok(())
}

/// Force a cold start: every hardware context reads a working set larger
/// than the last-level cache.
fn wipe_caches() {
    const WORDS: usize = 8 * 1024 * 1024;

    let contexts = thread::available_parallelism().map_or(1, usize::from);

    let wipers: Vec<_> = (0..contexts)
        .map(|core| {
            thread::spawn(move || {
                let _ = pin_current_thread(core);

                let junk = vec![1usize; WORDS];
                let mut sink = 0usize;
                for &word in &junk {
                    sink = sink.wrapping_add(word);
                }
                std::hint::black_box(sink);
            })
        })
        .collect();

    for wiper in wipers {
        wiper.join().expect("cache wiper panicked");
    }
}
