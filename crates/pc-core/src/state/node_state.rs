use crate::{
    LaunchTracker, Node, NodeApiHandle, NodeProcess, NodeStateType, NodeStatus, ProcessOutput,
};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

/// Data carried by each state.
pub enum StateData {
    Unknown,
    Starting {
        launch: LaunchTracker,
    },
    Running {
        /// `None` when the node was adopted rather than spawned
        process: Option<Box<dyn NodeProcess>>,
    },
    Stopping {
        process: Option<Box<dyn NodeProcess>>,
        timeout: Duration,
    },
    Stopped,
    Crashed,
    WontStart {
        output: Option<ProcessOutput>,
    },
    NotManaged,
}

impl StateData {
    pub fn state_type(&self) -> NodeStateType {
        match self {
            Self::Unknown => NodeStateType::Unknown,
            Self::Starting { .. } => NodeStateType::Starting,
            Self::Running { .. } => NodeStateType::Running,
            Self::Stopping { .. } => NodeStateType::Stopping,
            Self::Stopped => NodeStateType::Stopped,
            Self::Crashed => NodeStateType::Crashed,
            Self::WontStart { .. } => NodeStateType::WontStart,
            Self::NotManaged => NodeStateType::NotManaged,
        }
    }

    /// Release whatever the state owns, keeping the process if it is
    /// still held.
    pub async fn into_process(self) -> Option<Box<dyn NodeProcess>> {
        match self {
            Self::Starting { launch } => launch.finish().await,
            Self::Running { process } | Self::Stopping { process, .. } => process,
            _ => None,
        }
    }
}

/// Lifecycle state of one node.
///
/// A transition builds a new `NodeState` from the old one's node and API
/// handle; nothing else carries over. `since_when` moves forward on every
/// relevant observation and never precedes `start_time`.
pub struct NodeState {
    node: Arc<Node>,
    api: Arc<NodeApiHandle>,
    data: StateData,
    start_time: Instant,
    since_when: Instant,
}

impl NodeState {
    pub fn new(node: Arc<Node>, api: Arc<NodeApiHandle>, data: StateData) -> Self {
        let now = Instant::now();
        Self {
            node,
            api,
            data,
            start_time: now,
            since_when: now,
        }
    }

    /// Replace this state with one holding `data`.
    pub fn transition(self, data: StateData) -> Self {
        Self::new(self.node, self.api, data)
    }

    pub fn into_parts(self) -> (Arc<Node>, Arc<NodeApiHandle>, StateData) {
        (self.node, self.api, self.data)
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn api(&self) -> &Arc<NodeApiHandle> {
        &self.api
    }

    pub fn data(&self) -> &StateData {
        &self.data
    }

    pub fn state_type(&self) -> NodeStateType {
        self.data.state_type()
    }

    /// Record a fresh observation.
    pub fn touch(&mut self) {
        self.since_when = Instant::now().max(self.start_time);
    }

    /// Time since this state was entered.
    pub fn age(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Time since the last relevant observation.
    pub fn since_last_observation(&self) -> Duration {
        self.since_when.elapsed()
    }

    pub fn launch_mut(&mut self) -> Option<&mut LaunchTracker> {
        match &mut self.data {
            StateData::Starting { launch } => Some(launch),
            _ => None,
        }
    }

    pub fn process_mut(&mut self) -> Option<&mut Box<dyn NodeProcess>> {
        match &mut self.data {
            StateData::Running { process } | StateData::Stopping { process, .. } => {
                process.as_mut()
            }
            _ => None,
        }
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        match &self.data {
            StateData::Stopping { timeout, .. } => Some(*timeout),
            _ => None,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match &self.data {
            StateData::Starting { launch } => launch.pid(),
            StateData::Running { process } | StateData::Stopping { process, .. } => {
                process.as_ref().and_then(|process| process.id())
            }
            _ => None,
        }
    }

    pub fn status(&self) -> NodeStatus {
        let now = Utc::now();
        let wall = |elapsed: Duration| {
            now - chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::zero())
        };
        NodeStatus {
            name: self.node.name.clone(),
            state: self.state_type(),
            start_time: wall(self.age()),
            since_when: wall(self.since_last_observation()),
            pid: self.pid(),
        }
    }
}

impl std::fmt::Debug for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeState")
            .field("node", &self.node.name)
            .field("state", &self.state_type())
            .field("age", &self.age())
            .field("pid", &self.pid())
            .finish()
    }
}
