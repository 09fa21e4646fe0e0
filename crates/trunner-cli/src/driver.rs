use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use trunner_core::{RawLock, WorkQueue};

/// Driver group handle.
/// - each driver calls `drive_once` on every interval tick
/// - `request_shutdown` stops all drivers after their current pass
/// - `shutdown_and_join` waits for them to exit
pub struct DriverGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<u64>>,
}

impl DriverGroup {
    /// Spawn `n` drivers polling `queue` every `interval`.
    pub fn spawn<P, L>(n: usize, queue: Arc<WorkQueue<P, L>>, interval: Duration) -> Self
    where
        P: Send + 'static,
        L: RawLock + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for driver_id in 0..n {
            let q = Arc::clone(&queue);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move { driver_loop(driver_id, q, interval, &mut rx).await });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all drivers. Returns the number of non-idle passes they ran.
    pub async fn shutdown_and_join(self) -> u64 {
        self.request_shutdown();
        let mut passes = 0;
        for j in self.joins {
            passes += j.await.unwrap_or(0);
        }
        passes
    }
}

async fn driver_loop<P, L>(
    driver_id: usize,
    queue: Arc<WorkQueue<P, L>>,
    interval: Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> u64
where
    L: RawLock,
{
    let mut ticker = tokio::time::interval(interval);
    let mut passes = 0;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender dropped: the group is gone
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        // The pass is synchronous and holds the queue lock for its whole duration.
        if queue.drive_once() {
            passes += 1;
        } else {
            debug!(driver_id, "queue empty");
        }
    }

    info!(driver_id, passes, "driver stopped");
    passes
}
