use crate::{Node, NodeApi, NodeApiFactory, RpcResult, TimeoutProfile};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Per-node pair of lazily built health RPC clients.
///
/// A client that was built once is kept for the life of the handle. A
/// failed build is not remembered, so the next call tries again; a failed
/// RPC never invalidates the client.
pub struct NodeApiHandle {
    node: Arc<Node>,
    factory: Arc<dyn NodeApiFactory>,
    fast: OnceLock<Arc<dyn NodeApi>>,
    slow: OnceLock<Arc<dyn NodeApi>>,
}

impl NodeApiHandle {
    fn new(node: Arc<Node>, factory: Arc<dyn NodeApiFactory>) -> Self {
        Self {
            node,
            factory,
            fast: OnceLock::new(),
            slow: OnceLock::new(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node.name
    }

    /// Client for liveness checks.
    pub fn fast(&self) -> RpcResult<Arc<dyn NodeApi>> {
        self.client(TimeoutProfile::Fast)
    }

    /// Client for administrative calls.
    pub fn slow(&self) -> RpcResult<Arc<dyn NodeApi>> {
        self.client(TimeoutProfile::Slow)
    }

    /// Whether a fast client exists or can be built right now.
    pub fn is_obtainable(&self) -> bool {
        self.fast().is_ok()
    }

    /// Client for `profile`, built on first use.
    pub fn client(&self, profile: TimeoutProfile) -> RpcResult<Arc<dyn NodeApi>> {
        let slot = match profile {
            TimeoutProfile::Fast => &self.fast,
            TimeoutProfile::Slow => &self.slow,
        };
        if let Some(client) = slot.get() {
            return Ok(Arc::clone(client));
        }

        let client = self.factory.create(&self.node, profile)?;
        // Another caller may have won the race; keep whichever landed first
        Ok(Arc::clone(slot.get_or_init(|| client)))
    }
}

impl std::fmt::Debug for NodeApiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeApiHandle")
            .field("node", &self.node.name)
            .field("fast", &self.fast.get().is_some())
            .field("slow", &self.slow.get().is_some())
            .finish()
    }
}

/// One `NodeApiHandle` per node name, created on first use.
pub struct NodeApiCache {
    factory: Arc<dyn NodeApiFactory>,
    handles: Mutex<HashMap<String, Arc<NodeApiHandle>>>,
}

impl NodeApiCache {
    pub fn new(factory: Arc<dyn NodeApiFactory>) -> Self {
        Self {
            factory,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Existing handle for `node`, or a new one.
    pub fn handle_for(&self, node: &Arc<Node>) -> Arc<NodeApiHandle> {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(handles.entry(node.name.clone()).or_insert_with(|| {
            Arc::new(NodeApiHandle::new(
                Arc::clone(node),
                Arc::clone(&self.factory),
            ))
        }))
    }

    /// Handle for `name` if one has been created.
    pub fn get(&self, name: &str) -> Option<Arc<NodeApiHandle>> {
        let handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.get(name).cloned()
    }

    pub fn evict(&self, name: &str) -> Option<Arc<NodeApiHandle>> {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.remove(name)
    }
}
