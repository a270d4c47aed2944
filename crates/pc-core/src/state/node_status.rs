use crate::NodeStateType;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time view of a node's state, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub state: NodeStateType,
    pub start_time: DateTime<Utc>,
    pub since_when: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl NodeStatus {
    /// Status for a node the supervisor holds no state for.
    pub fn unknown(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            state: NodeStateType::Unknown,
            start_time: now,
            since_when: now,
            pid: None,
        }
    }
}
