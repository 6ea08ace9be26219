//! Pump demo
//!
//! A few producer threads poke their notifiers; the main thread pumps
//! callbacks until the last producer interrupts it.
//!
//! # Usage
//!
//! ```text
//! pump [PRODUCERS] [POKES_PER_PRODUCER]
//! ```
//!
//! # Environment Variables
//!
//! - `NHUB_LOG=debug` - Log filter (error, warn, info, debug, trace)
//! - `NHUB_CHANNEL=loopback` - Force the loopback TCP channel
//! - see `HubConfig::from_env()` for the rest

use nhub::{HubConfig, NotificationHub, PumpExit};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// NHUB_LOG=debug cargo run -p nhub-pump -- 4 1000
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NHUB_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let producers: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(4);
    let pokes: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(1000);

    println!("=== nhub pump demo ===\n");

    let config = HubConfig::from_env().blocking(true);
    let hub = Arc::new(NotificationHub::with_config(config)?);
    println!("Channel: {} (fd {})", hub.channel_name(), hub.fileno());

    let callbacks = Arc::new(AtomicU64::new(0));
    let remaining = Arc::new(AtomicUsize::new(producers));
    let start = Instant::now();

    let mut workers = Vec::with_capacity(producers);
    for id in 0..producers {
        let c = callbacks.clone();
        let notifier = hub.add_notify(move || {
            c.fetch_add(1, Ordering::Relaxed);
        })?;
        tracing::info!(producer = id, key = %notifier.key(), "producer registered");

        let hub = hub.clone();
        let remaining = remaining.clone();
        workers.push(thread::spawn(move || {
            let mut queued = 0u64;
            for i in 0..pokes {
                match notifier.poke() {
                    Ok(true) => queued += 1,
                    Ok(false) => {}
                    Err(e) => tracing::warn!(producer = id, error = %e, "poke failed"),
                }
                if i % 64 == 0 {
                    thread::sleep(Duration::from_micros(50));
                }
            }
            // Last one out stops the pump
            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                if let Err(e) = hub.interrupt() {
                    tracing::error!(error = %e, "interrupt failed");
                }
            }
            queued
        }));
    }

    loop {
        match hub.handle()? {
            PumpExit::Interrupted => break,
            PumpExit::Closed => {
                tracing::warn!("channel closed");
                break;
            }
            PumpExit::WouldBlock => {}
        }
    }

    let queued: u64 = workers
        .into_iter()
        .map(|w| w.join().unwrap_or(0))
        .sum();
    let elapsed = start.elapsed();
    let stats = hub.stats();

    println!("\n=== Results ===");
    println!("Producers:       {}", producers);
    println!("Pokes issued:    {}", producers * pokes);
    println!("Pokes queued:    {}", queued);
    println!("Callbacks run:   {}", callbacks.load(Ordering::Relaxed));
    println!("Elapsed:         {:?}", elapsed);
    println!("Stats:           {}", stats);

    Ok(())
}
