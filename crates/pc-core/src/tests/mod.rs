mod node_api_cache;
mod rpc_error;
mod supervisor_operations;
