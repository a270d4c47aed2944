use crate::NodeStateType;

use metrics::{counter, gauge};

/// Metrics collector for supervisor activity
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "pc_core" }
    }

    /// Record a state transition
    pub fn transition(&self, from: NodeStateType, to: NodeStateType) {
        counter!(format!("{}.transitions", self.prefix)).increment(1);
        counter!(format!("{}.transitions.{}.{}", self.prefix, from, to)).increment(1);
    }

    pub fn node_spawned(&self) {
        counter!(format!("{}.nodes.spawned", self.prefix)).increment(1);
    }

    pub fn node_killed(&self) {
        counter!(format!("{}.nodes.killed", self.prefix)).increment(1);
    }

    /// Record number of tracked nodes after a sweep
    pub fn tracked_nodes(&self, count: usize) {
        gauge!(format!("{}.nodes.tracked", self.prefix)).set(count as f64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
