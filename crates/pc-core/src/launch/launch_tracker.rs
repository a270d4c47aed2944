use super::output_collector::OutputCollector;
use crate::{
    Node, NodeApiHandle, NodeProcess, OutputStream, ProcessLayer, ProcessOutput, SpawnedProcess,
    StartStatus, SupervisorConfig, SupervisorResult,
};

use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Owns a node process from spawn until it is known to be up or dead.
///
/// Two collectors buffer the child's stdout and stderr so a failed start
/// can be diagnosed. They are stopped as soon as the start resolves.
pub struct LaunchTracker {
    node_name: String,
    process: Option<Box<dyn NodeProcess>>,
    pid: Option<u32>,
    started: Instant,
    min_start_time: Duration,
    join_grace: Duration,
    cancel: CancellationToken,
    stdout: Option<OutputCollector>,
    stderr: Option<OutputCollector>,
    outcome: Option<ProcessOutput>,
}

impl LaunchTracker {
    /// Spawn `node` and start tracking it.
    pub async fn launch(
        node: &Node,
        processes: &dyn ProcessLayer,
        config: &SupervisorConfig,
    ) -> SupervisorResult<Self> {
        let spawned = processes.spawn(node).await?;
        Ok(Self::track(&node.name, spawned, config))
    }

    /// Track an already spawned process.
    pub fn track(node_name: &str, spawned: SpawnedProcess, config: &SupervisorConfig) -> Self {
        let cancel = CancellationToken::new();
        let collector = |stream: OutputStream, suffix: &str| {
            OutputCollector::start(
                format!("{node_name}/{suffix}"),
                stream,
                config.output_buffer_bytes,
                cancel.child_token(),
            )
        };

        let stdout = spawned.stdout.map(|stream| collector(stream, "stdout"));
        let stderr = spawned.stderr.map(|stream| collector(stream, "stderr"));

        Self {
            node_name: node_name.to_string(),
            pid: spawned.process.id(),
            process: Some(spawned.process),
            started: Instant::now(),
            min_start_time: config.min_start_time,
            join_grace: config.collector_join_grace,
            cancel,
            stdout,
            stderr,
            outcome: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and(self.pid)
    }

    pub fn has_process(&self) -> bool {
        self.process.is_some()
    }

    /// Start status judged from the process first, then from a ping.
    ///
    /// Nothing is checked before the minimum start time has passed.
    pub async fn start_status_of_subprocess(&mut self, api: &NodeApiHandle) -> StartStatus {
        if self.elapsed() < self.min_start_time {
            return StartStatus::StillStarting;
        }

        if let Some(outcome) = &self.outcome {
            return StartStatus::Died(outcome.clone());
        }

        let exit_code = self.process.as_mut().and_then(|process| process.exit_code());
        if let Some(exit_code) = exit_code {
            let (stdout, stderr) = self.collect_output(false).await;
            let output = ProcessOutput {
                exit_code,
                stdout,
                stderr,
            };
            self.outcome = Some(output.clone());
            return StartStatus::Died(output);
        }

        self.start_status_using_ping(api).await
    }

    /// Start status judged from a fast ping alone.
    pub async fn start_status_using_ping(&mut self, api: &NodeApiHandle) -> StartStatus {
        let client = match api.fast() {
            Ok(client) => client,
            Err(e) => {
                debug!("No admin client for {} yet: {}", self.node_name, e.safe_message());
                return StartStatus::StillStarting;
            }
        };

        match client.ping().await {
            Ok(()) => {
                self.collect_output(true).await;
                StartStatus::Started
            }
            Err(e) if e.is_admin_disabled() => {
                info!("Node {} is up with its admin API disabled", self.node_name);
                self.collect_output(true).await;
                StartStatus::Started
            }
            Err(e) if e.is_not_configured() => {
                warn!(
                    "Node {} is not configured for administration",
                    self.node_name
                );
                let (stdout, stderr) = self.collect_output(true).await;
                StartStatus::Died(ProcessOutput {
                    exit_code: -1,
                    stdout,
                    stderr,
                })
            }
            Err(e) if e.is_connection_refused() => {
                debug!("Node {} not listening yet", self.node_name);
                StartStatus::StillStarting
            }
            Err(e) if e.is_network() => {
                info!("Node {} not reachable yet: {}", self.node_name, e.safe_message());
                StartStatus::StillStarting
            }
            Err(e) => {
                warn!("Ping of starting node {} failed: {e:?}", self.node_name);
                StartStatus::StillStarting
            }
        }
    }

    /// Forget the spawned process, e.g. when it exited because another
    /// instance already runs. Later checks rely on ping alone.
    pub fn discard_process(&mut self) {
        self.process = None;
        self.outcome = None;
    }

    /// Stop output collection and hand over the process, if still owned.
    pub async fn finish(mut self) -> Option<Box<dyn NodeProcess>> {
        self.collect_output(true).await;
        self.process.take()
    }

    async fn collect_output(&mut self, cancel: bool) -> (String, String) {
        if cancel {
            self.cancel.cancel();
        }
        let stdout = match self.stdout.take() {
            Some(collector) => collector.join(self.join_grace).await,
            None => String::new(),
        };
        let stderr = match self.stderr.take() {
            Some(collector) => collector.join(self.join_grace).await,
            None => String::new(),
        };
        (stdout, stderr)
    }
}

impl Drop for LaunchTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LaunchTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchTracker")
            .field("node", &self.node_name)
            .field("pid", &self.pid())
            .field("elapsed", &self.elapsed())
            .field("outcome", &self.outcome)
            .finish()
    }
}
