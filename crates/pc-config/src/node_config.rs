use crate::{ConfigError, ConfigErrorResult};

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_PORT_FILE: &str = "var/admin.port";
pub const DEFAULT_API_PORT: u16 = 2124;
pub const DEFAULT_API_PATH: &str = "/ssg/services/nodeapi";

/// One supervised worker process as declared in `[[nodes]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Working directory of the node process
    pub home: PathBuf,
    /// Executable to launch
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-node feature flags appended after the host-wide ones
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Admin port discovery file, relative to `home`
    #[serde(default = "default_port_file")]
    pub port_file: String,
    /// Admin endpoint used when no port file exists; built from the TLS
    /// scheme and the well-known port when unset
    #[serde(default)]
    pub default_endpoint: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_port_file() -> String {
    String::from(DEFAULT_PORT_FILE)
}

impl NodeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::node("nodes.name cannot be empty"));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(ConfigError::node(format!(
                "nodes.name '{}' may only contain letters, digits, '_', '-' and '.'",
                self.name
            )));
        }

        if self.home.as_os_str().is_empty() {
            return Err(ConfigError::node(format!(
                "node '{}': home cannot be empty",
                self.name
            )));
        }

        if self.program.trim().is_empty() {
            return Err(ConfigError::node(format!(
                "node '{}': program cannot be empty",
                self.name
            )));
        }

        let port_file = std::path::Path::new(&self.port_file);
        if self.port_file.is_empty() || port_file.is_absolute() || self.port_file.contains("..") {
            return Err(ConfigError::node(format!(
                "node '{}': port_file must be relative to home and cannot contain '..'",
                self.name
            )));
        }

        Ok(())
    }

    /// Endpoint used when the node has not published an admin port.
    pub fn fallback_endpoint(&self, scheme: &str) -> String {
        match &self.default_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("{scheme}://127.0.0.1:{DEFAULT_API_PORT}{DEFAULT_API_PATH}"),
        }
    }
}
