mod http_node_api;
mod node_api;
mod node_api_cache;
mod rpc_error;
mod timeout_profile;

pub use http_node_api::{HttpNodeApi, HttpNodeApiFactory};
pub use node_api::{NodeApi, NodeApiFactory};
pub use node_api_cache::{NodeApiCache, NodeApiHandle};
pub use rpc_error::{ADMIN_DISABLED_FAULT, NOT_CONFIGURED_FAULT, Result as RpcResult, RpcError};
pub use timeout_profile::TimeoutProfile;
