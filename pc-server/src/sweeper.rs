use pc_core::Supervisor;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Background task driving `Supervisor::sweep` on a fixed interval.
///
/// A sweep that overruns the interval delays the next tick instead of
/// bunching up catch-up sweeps.
pub struct Sweeper {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Sweeper {
    pub fn spawn(
        supervisor: Arc<Supervisor>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Sweeping nodes every {:?}", interval);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!("Sweep");
                        supervisor.sweep().await;
                    }
                }
            }

            debug!("Sweeper stopped");
        });

        Self { handle, cancel }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel and wait for the in-flight sweep, if any, to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!("Sweeper task failed: {e}");
        }
    }
}
