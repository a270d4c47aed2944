use crate::{NodeState, NodeStatus};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Published statuses, readable without taking the store lock.
pub(crate) type StatusSnapshot = Arc<RwLock<HashMap<String, NodeStatus>>>;

/// Current state per node name.
///
/// Every write republishes the node's status to the snapshot so readers
/// never wait behind a sweep.
pub(crate) struct StateStore {
    states: HashMap<String, NodeState>,
    snapshot: StatusSnapshot,
}

impl StateStore {
    pub(crate) fn new(snapshot: StatusSnapshot) -> Self {
        Self {
            states: HashMap::new(),
            snapshot,
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&NodeState> {
        self.states.get(name)
    }

    /// Take the state out for a transition. It must be put back.
    pub(crate) fn take(&mut self, name: &str) -> Option<NodeState> {
        self.states.remove(name)
    }

    pub(crate) fn put(&mut self, state: NodeState) {
        let status = state.status();
        self.snapshot
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(status.name.clone(), status);
        self.states.insert(state.node().name.clone(), state);
    }

    /// Drop the node entirely, including its published status.
    pub(crate) fn remove(&mut self, name: &str) -> Option<NodeState> {
        self.snapshot
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        self.states.remove(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }
}
