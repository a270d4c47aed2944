use super::state_store::{StateStore, StatusSnapshot};
use crate::{
    Metrics, NodeApi, NodeApiCache, NodeApiFactory, NodeRegistry, NodeState, NodeStateType,
    NodeStatus, ProcessLayer, StateData, SupervisorConfig, SupervisorError, SupervisorResult,
    TimeoutProfile,
};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Owns the lifecycle of every configured node.
///
/// `sweep` reconciles each node once; the public operations change state
/// directly. All of them serialize on one lock around the state store, so
/// each transition reads, decides, and writes as a unit. Status reads go
/// to a separately published snapshot and never wait for that lock.
///
/// State-changing operations take `self: &Arc<Self>` and run their
/// transition on a task of its own: a caller that gives up waiting does
/// not abort a transition halfway, with the node's state taken out of the
/// store.
pub struct Supervisor {
    pub(super) config: SupervisorConfig,
    registry: Arc<dyn NodeRegistry>,
    pub(super) processes: Arc<dyn ProcessLayer>,
    apis: NodeApiCache,
    store: Mutex<StateStore>,
    snapshot: StatusSnapshot,
    shutting_down: AtomicBool,
    /// Deleted nodes the registry still lists; sweeps leave them alone
    deleted: StdMutex<HashSet<String>>,
    pub(super) metrics: Metrics,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        registry: Arc<dyn NodeRegistry>,
        processes: Arc<dyn ProcessLayer>,
        api_factory: Arc<dyn NodeApiFactory>,
    ) -> Self {
        let snapshot: StatusSnapshot = Arc::new(RwLock::new(HashMap::new()));
        Self {
            config,
            registry,
            processes,
            apis: NodeApiCache::new(api_factory),
            store: Mutex::new(StateStore::new(Arc::clone(&snapshot))),
            snapshot,
            shutting_down: AtomicBool::new(false),
            deleted: StdMutex::new(HashSet::new()),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// One reconciliation pass over every configured node.
    ///
    /// A node seen for the first time enters as `Unknown` and is handled in
    /// the same pass. Each node gets at most one transition. Once shutdown
    /// has begun only `Stopping` nodes are advanced.
    pub async fn sweep(self: &Arc<Self>) {
        self.detached(|this| async move { this.sweep_pass().await })
            .await;
    }

    async fn sweep_pass(&self) {
        let nodes = self.registry.list_nodes();
        let shutting_down = self.is_shutting_down();
        let mut store = self.store.lock().await;

        for node in nodes {
            if self.is_deleted(&node.name) {
                continue;
            }
            let state = match store.take(&node.name) {
                Some(state) => state,
                None if shutting_down => continue,
                None => {
                    debug!("Tracking node {}", node.name);
                    let api = self.apis.handle_for(&node);
                    NodeState::new(node, api, StateData::Unknown)
                }
            };

            let from = state.state_type();
            if shutting_down && from != NodeStateType::Stopping {
                store.put(state);
                continue;
            }

            let next = self.advance(state).await;
            self.commit(&mut store, from, next);
        }

        self.metrics.tracked_nodes(store.len());
    }

    /// Spawn `name` afresh, replacing whatever state it was in.
    ///
    /// With `synchronous`, keep sweeping until the node has left
    /// `Starting`.
    pub async fn start_node(
        self: &Arc<Self>,
        name: &str,
        synchronous: bool,
    ) -> SupervisorResult<NodeStatus> {
        let owned = name.to_string();
        self.detached(|this| async move { this.launch_fresh(&owned).await })
            .await
            .unwrap_or_else(|| Err(self.interrupted(name)))?;

        if synchronous {
            while self.node_status(name).state == NodeStateType::Starting
                && !self.is_shutting_down()
            {
                tokio::time::sleep(self.config.poll_interval).await;
                self.sweep().await;
            }
        }

        Ok(self.node_status(name))
    }

    async fn launch_fresh(&self, name: &str) -> SupervisorResult<()> {
        let node = self
            .registry
            .find_node(name)
            .ok_or_else(|| SupervisorError::unknown_node(name))?;

        let mut store = self.store.lock().await;
        self.undelete(name);
        let api = self.apis.handle_for(&node);
        let from = match store.take(name) {
            Some(previous) => {
                let from = previous.state_type();
                let (_, _, data) = previous.into_parts();
                drop(data.into_process().await);
                from
            }
            None => NodeStateType::Unknown,
        };

        match self.try_launch(&node).await {
            Ok(launch) => {
                let next = NodeState::new(node, api, StateData::Starting { launch });
                self.commit(&mut store, from, next);
                Ok(())
            }
            Err(e) => {
                let next = NodeState::new(node, api, StateData::WontStart { output: None });
                self.commit(&mut store, from, next);
                Err(e)
            }
        }
    }

    /// Ask `name` to shut down within `timeout`, killing it if it cannot be
    /// asked. Leaves the node `Stopping` or `Stopped`.
    pub async fn stop_node(
        self: &Arc<Self>,
        name: &str,
        timeout: Duration,
    ) -> SupervisorResult<NodeStatus> {
        let owned = name.to_string();
        self.detached(move |this| async move { this.request_stop(&owned, timeout).await })
            .await
            .unwrap_or_else(|| Err(self.interrupted(name)))
    }

    async fn request_stop(&self, name: &str, timeout: Duration) -> SupervisorResult<NodeStatus> {
        let mut store = self.store.lock().await;

        let state = match store.take(name) {
            Some(state) if state.state_type() == NodeStateType::Stopped => {
                let status = state.status();
                store.put(state);
                return Ok(status);
            }
            Some(state) => state,
            None => {
                let node = self
                    .registry
                    .find_node(name)
                    .ok_or_else(|| SupervisorError::unknown_node(name))?;
                let api = self.apis.handle_for(&node);
                NodeState::new(node, api, StateData::Unknown)
            }
        };

        let from = state.state_type();
        let next = self
            .request_shutdown(state, TimeoutProfile::Slow, timeout)
            .await;
        let status = next.status();
        self.commit(&mut store, from, next);
        Ok(status)
    }

    /// Stop `name` and forget it once it is in a terminal state.
    ///
    /// Blocks the caller, polling the published status, while sweeps move
    /// the node along. A deleted node the registry still lists is skipped
    /// by later sweeps until `start_node` brings it back.
    pub async fn delete_node(self: &Arc<Self>, name: &str, timeout: Duration) -> SupervisorResult<()> {
        if !self.is_tracked(name) {
            if self.registry.find_node(name).is_none() {
                return Err(SupervisorError::unknown_node(name));
            }
            self.mark_deleted(name);
            self.apis.evict(name);
            return Ok(());
        }

        if !self.node_status(name).state.is_terminal() {
            self.stop_node(name, timeout).await?;
        }

        loop {
            if self.node_status(name).state.is_terminal() {
                let mut store = self.store.lock().await;
                let settled = store
                    .get(name)
                    .is_none_or(|state| state.state_type().is_terminal());
                if settled {
                    self.mark_deleted(name);
                    self.apis.evict(name);
                    if let Some(state) = store.remove(name) {
                        let (_, _, data) = state.into_parts();
                        drop(data.into_process().await);
                    }
                    info!("Deleted node {name}");
                    return Ok(());
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Last published status of `name`, or `Unknown` as of now.
    pub fn node_status(&self, name: &str) -> NodeStatus {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .unwrap_or_else(|| NodeStatus::unknown(name))
    }

    /// Status of every configured or tracked node, ordered by name.
    pub fn list_nodes(&self) -> Vec<NodeStatus> {
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        let names: BTreeSet<String> = self
            .registry
            .list_nodes()
            .iter()
            .map(|node| node.name.clone())
            .filter(|name| !self.is_deleted(name))
            .chain(snapshot.keys().cloned())
            .collect();

        names
            .into_iter()
            .map(|name| {
                snapshot
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| NodeStatus::unknown(name))
            })
            .collect()
    }

    /// Run `operation` against a node's fast health client.
    ///
    /// With no name, any tracked node is used. The store lock is not held
    /// while the operation runs.
    pub async fn call_node_api<T, F, Fut>(
        &self,
        name: Option<&str>,
        operation: F,
    ) -> SupervisorResult<T>
    where
        F: FnOnce(Arc<dyn NodeApi>) -> Fut,
        Fut: Future<Output = T>,
    {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.any_tracked_node().ok_or_else(|| {
                SupervisorError::temporarily_unavailable("<any>", NodeStateType::Unknown)
            })?,
        };
        let last_known = self.node_status(&name).state;

        let handle = match self.apis.get(&name) {
            Some(handle) => handle,
            None => {
                let node = self
                    .registry
                    .find_node(&name)
                    .ok_or_else(|| SupervisorError::unknown_node(&name))?;
                self.apis.handle_for(&node)
            }
        };

        let client = handle.fast().map_err(|e| {
            debug!("No admin client for node {name}: {}", e.safe_message());
            SupervisorError::temporarily_unavailable(&name, last_known)
        })?;

        Ok(operation(client).await)
    }

    /// Stop every node that is not already down and wait for all of them.
    ///
    /// Spawning stops for good once this is called. Returns whether every
    /// node reached `Stopped`, `Crashed`, or `WontStart` before the
    /// overall timeout.
    pub async fn stop_all(self: &Arc<Self>, per_node_timeout: Duration) -> bool {
        self.shutting_down.store(true, Ordering::SeqCst);
        info!("Stopping all nodes");

        for status in self.tracked_statuses() {
            if status.state.is_down() {
                continue;
            }
            if let Err(e) = self.stop_node(&status.name, per_node_timeout).await {
                warn!("Failed to stop node {}: {e}", status.name);
            }
        }

        let deadline = Instant::now() + self.config.stop_all_timeout;
        loop {
            self.sweep().await;

            let remaining: Vec<String> = self
                .tracked_statuses()
                .into_iter()
                .filter(|status| !status.state.is_down())
                .map(|status| status.name)
                .collect();

            if remaining.is_empty() {
                info!("All nodes stopped");
                return true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "Gave up waiting for nodes to stop after {:?}: {}",
                    self.config.stop_all_timeout,
                    remaining.join(", ")
                );
                return false;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Run `transition` on its own task and wait for it.
    ///
    /// `None` only if the runtime is shutting down under it.
    async fn detached<T, F, Fut>(self: &Arc<Self>, transition: F) -> Option<T>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::spawn(transition(Arc::clone(self))).await {
            Ok(value) => Some(value),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!("Supervisor transition did not complete: {e}");
                None
            }
        }
    }

    fn interrupted(&self, name: &str) -> SupervisorError {
        SupervisorError::temporarily_unavailable(name, self.node_status(name).state)
    }

    fn is_deleted(&self, name: &str) -> bool {
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }

    fn mark_deleted(&self, name: &str) {
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());
    }

    fn undelete(&self, name: &str) {
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
    }

    fn commit(&self, store: &mut StateStore, from: NodeStateType, next: NodeState) {
        let to = next.state_type();
        if from != to {
            info!("Node {}: {from} -> {to}", next.node().name);
            self.metrics.transition(from, to);
        }
        store.put(next);
    }

    fn is_tracked(&self, name: &str) -> bool {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    fn any_tracked_node(&self) -> Option<String> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .min()
            .cloned()
    }

    fn tracked_statuses(&self) -> Vec<NodeStatus> {
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        let mut statuses: Vec<NodeStatus> = snapshot.values().cloned().collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}
