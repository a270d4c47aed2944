use crate::{Node, RpcResult, TimeoutProfile};

use std::sync::Arc;

use async_trait::async_trait;

/// Health RPC exposed by a running node.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Fails on any transport or protocol error.
    async fn ping(&self) -> RpcResult<()>;

    /// Ask the node to shut down gracefully. Repeating the call is harmless.
    async fn shutdown(&self) -> RpcResult<()>;
}

/// Builds `NodeApi` clients for a node in a given timeout profile.
pub trait NodeApiFactory: Send + Sync {
    fn create(&self, node: &Node, profile: TimeoutProfile) -> RpcResult<Arc<dyn NodeApi>>;
}
