//! Recurring background sweep of the state store.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::StateStore;
use crate::error::Result;

/// Owns the sweep task. `stop` ends it deterministically; dropping the
/// sweeper closes the shutdown channel, which also ends the task.
#[derive(Debug)]
pub struct Sweeper {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop. The first sweep happens one full `period` after start.
    pub fn start(store: Arc<StateStore>, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            info!("Sweeper started with {}s interval", period.as_secs());
            let mut sweep_timer = time::interval_at(time::Instant::now() + period, period);
            sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sweep_round = 0u64;

            loop {
                tokio::select! {
                    _ = sweep_timer.tick() => {
                        sweep_round += 1;
                        let report = store.sweep();
                        debug!(
                            round = sweep_round,
                            evicted = report.total(),
                            "Sweep finished"
                        );
                    }
                    // Fires on an explicit stop or when the sender is dropped
                    _ = shutdown_rx.recv() => {
                        info!("Sweeper stopping after {} rounds", sweep_round);
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the loop and wait for it to exit
    pub async fn stop(self) -> Result<()> {
        // A full channel or a finished task both mean shutdown is already underway
        let _ = self.shutdown_tx.try_send(());
        self.handle.await?;
        Ok(())
    }
}
