mod error;
mod launch;
mod node;
mod process;
mod registry;
mod rpc;
mod state;
mod supervisor;
mod supervisor_config;

#[cfg(test)]
mod tests;

pub use error::{Result as SupervisorResult, SupervisorError};
pub use launch::{LaunchTracker, OutputBuffer, ProcessOutput, StartStatus};
pub use node::Node;
pub use process::{
    NodeProcess, OsProcessLayer, OutputStream, ProcessLayer, SpawnedProcess, build_command_line,
};
pub use registry::{NodeRegistry, StaticNodeRegistry};
pub use rpc::{
    ADMIN_DISABLED_FAULT, HttpNodeApi, HttpNodeApiFactory, NOT_CONFIGURED_FAULT, NodeApi,
    NodeApiCache, NodeApiFactory, NodeApiHandle, RpcError, RpcResult, TimeoutProfile,
};
pub use state::{NodeState, NodeStateType, NodeStatus, StateData};
pub use supervisor::{Metrics, Supervisor};
pub use supervisor_config::SupervisorConfig;
