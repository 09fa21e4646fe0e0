//! trunner: drive a shared work queue from a handful of producers and poll-loop drivers.

mod driver;
mod error;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use rand::Rng;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use trunner_core::{ParkingLock, QueueError, Step, WorkItem, WorkQueue};

use crate::driver::DriverGroup;
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "trunner", about = "Cooperative work queue demo")]
struct Cli {
    /// Number of concurrent producers
    #[arg(long, env = "TRUNNER_PRODUCERS", default_value_t = 4)]
    producers: usize,

    /// Items each producer submits
    #[arg(long, env = "TRUNNER_ITEMS", default_value_t = 25)]
    items: usize,

    /// Upper bound on the drive passes a single item needs
    #[arg(long, env = "TRUNNER_MAX_STEPS", default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    max_steps: u32,

    /// Number of drivers polling the queue
    #[arg(
        long,
        env = "TRUNNER_DRIVERS",
        default_value_t = 2,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    drivers: usize,

    /// Milliseconds between passes of a single driver
    #[arg(long, env = "TRUNNER_INTERVAL_MS", default_value_t = 10)]
    interval_ms: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "TRUNNER_LOG", default_value = "info")]
    log_level: String,
}

/// Payload: a countdown that finishes after `remaining` passes.
#[derive(Debug)]
struct Countdown {
    label: String,
    remaining: u32,
    passes: u32,
}

impl Countdown {
    fn step(&mut self) -> Step {
        self.passes += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 { Step::Done } else { Step::Pending }
    }
}

/// Counts completions and wakes the main task once all of them are in.
struct Completion {
    done: AtomicUsize,
    expected: usize,
    notify: Notify,
}

impl Completion {
    fn record(&self, countdown: &Countdown) {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        info!(label = %countdown.label, passes = countdown.passes, done, "countdown finished");
        if done == self.expected {
            self.notify.notify_one();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let started = Instant::now();
    let queue = Arc::new(WorkQueue::new(ParkingLock::new()));
    let completion = Arc::new(Completion {
        done: AtomicUsize::new(0),
        expected: cli.producers * cli.items,
        notify: Notify::new(),
    });

    let drivers = DriverGroup::spawn(
        cli.drivers,
        Arc::clone(&queue),
        Duration::from_millis(cli.interval_ms),
    );

    let mut producers = Vec::with_capacity(cli.producers);
    for producer in 0..cli.producers {
        let queue = Arc::clone(&queue);
        let completion = Arc::clone(&completion);
        let (items, max_steps) = (cli.items, cli.max_steps);
        producers.push(tokio::spawn(async move {
            for index in 0..items {
                let steps = rand::thread_rng().gen_range(1..=max_steps);
                let countdown = Countdown {
                    label: format!("p{producer}-{index}"),
                    remaining: steps,
                    passes: 0,
                };
                let completion = Arc::clone(&completion);
                let item = WorkItem::new(countdown, Countdown::step)
                    .on_complete(move |countdown| completion.record(countdown));
                queue.submit(item)?;
                tokio::task::yield_now().await;
            }
            Ok::<_, QueueError>(())
        }));
    }

    // A failed producer means the expected count is never reached.
    if let Err(e) = join_producers(producers).await {
        drivers.shutdown_and_join().await;
        return Err(e);
    }
    info!(submitted = completion.expected, "all items submitted");

    if completion.expected > 0 {
        let notified = completion.notify.notified();
        if completion.done.load(Ordering::Acquire) < completion.expected {
            notified.await;
        }
    }

    let passes = drivers.shutdown_and_join().await;
    let stats = queue.stats();
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "failed to serialize stats"),
    }

    match Arc::try_unwrap(queue) {
        Ok(queue) => {
            let drained = queue.teardown();
            info!(
                drained,
                driver_passes = passes,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "queue torn down"
            );
        }
        Err(_) => warn!("queue still shared at exit; dropping it instead"),
    }

    Ok(())
}

async fn join_producers(
    producers: Vec<JoinHandle<Result<(), QueueError>>>,
) -> Result<(), CliError> {
    for p in producers {
        p.await??;
    }
    Ok(())
}
