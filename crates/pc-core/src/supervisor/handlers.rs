//! Per-state handlers applied by the sweep.
//!
//! Each handler takes the current state by value and returns the state to
//! store: either the same value (possibly with a refreshed observation
//! time) or exactly one successor.

use super::Supervisor;
use crate::{
    LaunchTracker, Node, NodeApiHandle, NodeState, NodeStateType, ProcessOutput, RpcError,
    RpcResult, StartStatus, StateData, SupervisorResult, TimeoutProfile,
};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

impl Supervisor {
    pub(super) async fn advance(&self, state: NodeState) -> NodeState {
        match state.state_type() {
            NodeStateType::Unknown => self.on_unknown(state).await,
            NodeStateType::Starting => self.on_starting(state).await,
            NodeStateType::Running => self.on_running(state).await,
            NodeStateType::Stopping => self.on_stopping(state).await,
            NodeStateType::Stopped => self.on_stopped(state).await,
            NodeStateType::Crashed => state.transition(StateData::Unknown),
            NodeStateType::WontStart => self.on_wont_start(state),
            NodeStateType::NotManaged => self.on_not_managed(state).await,
        }
    }

    async fn on_unknown(&self, state: NodeState) -> NodeState {
        let node = Arc::clone(state.node());

        match self.ping(state.api()).await {
            Ok(()) => self.found_running(state, &node).await,
            Err(e) if e.is_not_configured() => {
                info!("Node {} refuses to be managed", node.name);
                state.transition(StateData::NotManaged)
            }
            // Admin-disabled is read from the port file alone, which a
            // crashed node leaves behind, so it is no sign of life here
            Err(e) => {
                self.log_rpc_failure(&node.name, "ping", &e);
                self.kill(&node).await;
                if node.enabled {
                    let (node, api, _) = state.into_parts();
                    self.launch(node, api).await
                } else {
                    state.transition(StateData::Stopped)
                }
            }
        }
    }

    async fn found_running(&self, state: NodeState, node: &Node) -> NodeState {
        if self.config.daemon && !node.enabled {
            info!("Node {} is running but disabled, shutting it down", node.name);
            return self
                .request_shutdown(state, TimeoutProfile::Fast, self.config.stop_timeout)
                .await;
        }
        info!("Adopting running node {}", node.name);
        state.transition(StateData::Running { process: None })
    }

    async fn on_starting(&self, mut state: NodeState) -> NodeState {
        let node = Arc::clone(state.node());
        let api = Arc::clone(state.api());
        let Some(launch) = state.launch_mut() else {
            return state;
        };

        match launch.start_status_of_subprocess(&api).await {
            StartStatus::StillStarting => {}
            StartStatus::Started => return self.started(state).await,
            StartStatus::Died(output) if output.exit_code == self.config.already_running_exit_code => {
                info!(
                    "Node {} reports another instance already running, pinging it",
                    node.name
                );
                launch.discard_process();
                match launch.start_status_using_ping(&api).await {
                    StartStatus::StillStarting => {}
                    StartStatus::Started => return self.started(state).await,
                    StartStatus::Died(output) => return self.wont_start(state, Some(output)).await,
                }
            }
            StartStatus::Died(output) => return self.wont_start(state, Some(output)).await,
        }

        if state.age() <= self.config.max_start_time {
            return state;
        }

        if api.is_obtainable() {
            warn!(
                "Node {} did not start within {:?}, killing it",
                node.name, self.config.max_start_time
            );
            self.kill(&node).await;
            self.wont_start(state, None).await
        } else {
            info!(
                "Node {} has no usable admin API after {:?}, assuming it is up",
                node.name, self.config.max_start_time
            );
            self.started(state).await
        }
    }

    async fn started(&self, state: NodeState) -> NodeState {
        let (node, api, data) = state.into_parts();
        let process = data.into_process().await;
        NodeState::new(node, api, StateData::Running { process })
    }

    async fn wont_start(&self, state: NodeState, output: Option<ProcessOutput>) -> NodeState {
        let (node, api, data) = state.into_parts();
        drop(data.into_process().await);

        if let Some(output) = &output {
            warn!(
                "Node {} exited with code {} during startup\n--- stdout ---\n{}\n--- stderr ---\n{}",
                node.name,
                output.exit_code,
                output.stdout.trim_end(),
                output.stderr.trim_end()
            );
        }
        NodeState::new(node, api, StateData::WontStart { output })
    }

    async fn on_running(&self, mut state: NodeState) -> NodeState {
        if let Some(exit_code) = state.process_mut().and_then(|process| process.exit_code()) {
            warn!("Node {} exited with code {exit_code}", state.node().name);
            return state.transition(StateData::Crashed);
        }

        match self.ping(state.api()).await {
            Ok(()) => {
                state.touch();
                state
            }
            Err(e) if e.is_admin_disabled() => {
                state.touch();
                state
            }
            Err(e) => {
                let node = Arc::clone(state.node());
                self.log_rpc_failure(&node.name, "ping", &e);

                let silent = state.since_last_observation();
                if silent <= self.config.crash_detection {
                    return state;
                }
                if self.config.kill_running_nodes {
                    warn!("Node {} unresponsive for {silent:?}, killing it", node.name);
                    self.kill(&node).await;
                    return state.transition(StateData::Crashed);
                }
                warn!(
                    "Node {} unresponsive for {silent:?}, leaving it running",
                    node.name
                );
                state
            }
        }
    }

    async fn on_stopping(&self, mut state: NodeState) -> NodeState {
        let node = Arc::clone(state.node());
        let timeout = state.stop_timeout().unwrap_or(self.config.stop_timeout);

        match state.process_mut() {
            Some(process) => {
                if let Some(exit_code) = process.exit_code() {
                    info!("Node {} stopped with code {exit_code}", node.name);
                    return state.transition(StateData::Stopped);
                }
            }
            None => match self.ping(state.api()).await {
                Err(e) if e.is_connection_refused() => {
                    info!("Node {} stopped", node.name);
                    return state.transition(StateData::Stopped);
                }
                Err(e) => debug!("Node {} still stopping: {}", node.name, e.safe_message()),
                Ok(()) => {}
            },
        }

        if state.since_last_observation() > timeout {
            warn!("Node {} did not stop within {timeout:?}, killing it", node.name);
            self.kill(&node).await;
            return state.transition(StateData::Stopped);
        }
        state
    }

    async fn on_stopped(&self, state: NodeState) -> NodeState {
        if state.since_last_observation() <= self.config.stopped_timeout {
            return state;
        }
        match self.ping(state.api()).await {
            Ok(()) => {
                info!("Node {} was started externally", state.node().name);
                state.transition(StateData::Running { process: None })
            }
            Err(_) => state,
        }
    }

    fn on_wont_start(&self, state: NodeState) -> NodeState {
        if state.since_last_observation() > self.config.wont_start_retry {
            info!("Retrying node {}", state.node().name);
            return state.transition(StateData::Unknown);
        }
        state
    }

    async fn on_not_managed(&self, state: NodeState) -> NodeState {
        match self.ping(state.api()).await {
            Err(e) if e.is_not_configured() => state,
            _ => state.transition(StateData::Unknown),
        }
    }

    /// Ask the node to shut down; kill it if the request cannot be made.
    ///
    /// Sweeps ask with the fast profile so the store is not held for a
    /// slow round trip.
    pub(super) async fn request_shutdown(
        &self,
        state: NodeState,
        profile: TimeoutProfile,
        timeout: Duration,
    ) -> NodeState {
        let (node, api, data) = state.into_parts();
        let process = data.into_process().await;

        let result = match api.client(profile) {
            Ok(client) => client.shutdown().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("Requested shutdown of node {}", node.name);
                NodeState::new(node, api, StateData::Stopping { process, timeout })
            }
            Err(e) => {
                self.log_rpc_failure(&node.name, "shutdown", &e);
                self.kill(&node).await;
                NodeState::new(node, api, StateData::Stopped)
            }
        }
    }

    pub(super) async fn try_launch(&self, node: &Node) -> SupervisorResult<LaunchTracker> {
        let launch = LaunchTracker::launch(node, self.processes.as_ref(), &self.config).await?;
        self.metrics.node_spawned();
        Ok(launch)
    }

    async fn launch(&self, node: Arc<Node>, api: Arc<NodeApiHandle>) -> NodeState {
        match self.try_launch(&node).await {
            Ok(launch) => NodeState::new(node, api, StateData::Starting { launch }),
            Err(e) => {
                error!("Failed to start node {}: {e}", node.name);
                NodeState::new(node, api, StateData::WontStart { output: None })
            }
        }
    }

    async fn ping(&self, api: &NodeApiHandle) -> RpcResult<()> {
        api.fast()?.ping().await
    }

    pub(super) async fn kill(&self, node: &Node) {
        self.metrics.node_killed();
        self.processes.kill(node).await;
    }

    fn log_rpc_failure(&self, name: &str, operation: &str, e: &RpcError) {
        match e {
            RpcError::ConnectionRefused { .. } => {
                debug!("{operation} of node {name}: {}", e.safe_message());
            }
            RpcError::Network { .. }
            | RpcError::AdminDisabled { .. }
            | RpcError::NotConfigured { .. }
            | RpcError::Unavailable { .. } => {
                info!("{operation} of node {name} failed: {}", e.safe_message());
            }
            RpcError::Fault { .. } | RpcError::Unexpected { .. } => {
                warn!("{operation} of node {name} failed: {e:?}");
            }
        }
    }
}
