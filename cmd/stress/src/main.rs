//! Stress test - many notifiers, many producers
//!
//! Producers poke random notifiers as fast as they can while a pump
//! thread dispatches. Half the notifiers are dropped midway so stale keys
//! are exercised. Checks that no queued poke was lost and none ran its
//! callback twice.
//!
//! ```text
//! stress [NOTIFIERS] [PRODUCERS] [POKES_PER_PRODUCER]
//! ```

use nhub::{HubConfig, NotificationHub, Notifier, PumpExit};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NHUB_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let num_notifiers: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(10_000).max(1);
    let num_producers: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(8);
    let pokes: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(100_000);

    println!("=== nhub Stress Test ===\n");
    println!(
        "{} notifiers, {} producers x {} pokes",
        num_notifiers, num_producers, pokes
    );

    let hub = Arc::new(NotificationHub::with_config(
        HubConfig::from_env().blocking(true),
    )?);
    let callbacks = Arc::new(AtomicU64::new(0));

    let start = Instant::now();
    let mut notifiers: Vec<Notifier> = (0..num_notifiers)
        .map(|_| {
            let c = callbacks.clone();
            hub.add_notify(move || {
                c.fetch_add(1, Ordering::Relaxed);
            })
        })
        .collect::<Result<_, _>>()?;
    println!("Register time: {:?}", start.elapsed());

    let pump = {
        let hub = hub.clone();
        thread::spawn(move || loop {
            match hub.handle() {
                Ok(PumpExit::WouldBlock) => continue,
                Ok(exit) => return Ok(exit),
                Err(e) => return Err(e),
            }
        })
    };

    let run_start = Instant::now();
    let producers: Vec<_> = (0..num_producers)
        .map(|id| {
            let notifiers = notifiers.clone();
            thread::spawn(move || {
                let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ (id as u64 + 1));
                let (mut queued, mut coalesced, mut failed) = (0u64, 0u64, 0u64);
                for i in 0..pokes {
                    let n = &notifiers[rng.next() as usize % notifiers.len()];
                    match n.poke() {
                        Ok(true) => queued += 1,
                        Ok(false) => coalesced += 1,
                        Err(_) => failed += 1,
                    }
                    if i % 4096 == 0 {
                        thread::yield_now();
                    }
                }
                (queued, coalesced, failed)
            })
        })
        .collect();

    // Drop half our handles; producers still hold clones until they finish
    drop(notifiers.split_off(num_notifiers / 2));

    let (mut queued, mut coalesced, mut failed) = (0u64, 0u64, 0u64);
    for p in producers {
        let (q, c, f) = p.join().map_err(|_| "producer panicked")?;
        queued += q;
        coalesced += c;
        failed += f;
    }
    let produce_time = run_start.elapsed();

    hub.interrupt()?;
    let exit = pump.join().map_err(|_| "pump panicked")??;
    let total_time = run_start.elapsed();
    let stats = hub.stats();

    println!("\n=== Results ===");
    println!("Pump exit:       {:?}", exit);
    println!("Pokes queued:    {}", queued);
    println!("Pokes coalesced: {}", coalesced);
    println!("Pokes failed:    {}", failed);
    println!("Callbacks run:   {}", callbacks.load(Ordering::Relaxed));
    println!("Produce time:    {:?}", produce_time);
    println!("Total time:      {:?}", total_time);
    println!(
        "Poke rate:       {:.0} pokes/sec",
        (num_producers * pokes) as f64 / produce_time.as_secs_f64()
    );
    println!("Live notifiers:  {} (+1 interrupt)", notifiers.len());
    println!("Registered:      {}", hub.len());
    println!("Stats:           {}", stats);

    // Keys that met a full channel may arrive twice; the second copy is
    // either skipped as spurious or found stale, never run.
    let ran = callbacks.load(Ordering::Relaxed);
    if ran > queued || ran + stats.stale_keys < queued {
        println!(
            "\nMISMATCH: queued {} ran {} stale {}",
            queued, ran, stats.stale_keys
        );
        std::process::exit(1);
    }
    println!("\nOK");
    Ok(())
}
