use pc_config::{HostConfig, NodeConfig, TlsConfig};

use std::path::PathBuf;

/// A supervised node as seen by the supervisor.
///
/// Built from configuration and never mutated afterwards; the supervisor
/// shares it between states as `Arc<Node>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub enabled: bool,
    pub home: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    pub extra_args: Vec<String>,
    /// Admin port discovery file, relative to `home`
    pub port_file: String,
    /// Endpoint used when the node has not published a port file
    pub fallback_endpoint: String,
}

impl Node {
    pub fn from_config(config: &NodeConfig, tls: &TlsConfig) -> Self {
        Self {
            name: config.name.clone(),
            enabled: config.enabled,
            home: config.home.clone(),
            program: config.program.clone(),
            args: config.args.clone(),
            extra_args: config.extra_args.clone(),
            port_file: config.port_file.clone(),
            fallback_endpoint: config.fallback_endpoint(tls.scheme()),
        }
    }

    /// Extra arguments applied to every node on this host, then the node's own.
    pub fn combined_extra_args<'a>(&'a self, host: &'a HostConfig) -> impl Iterator<Item = &'a String> {
        host.extra_args.iter().chain(self.extra_args.iter())
    }
}
