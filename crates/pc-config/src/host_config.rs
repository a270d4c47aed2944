use crate::{ConfigError, ConfigErrorResult, HostOs};

use serde::Deserialize;

pub const DEFAULT_CONTROLLER_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_CONTROLLER_PORT: u16 = 8765;
pub const DEFAULT_CONTROL_SCRIPT: &str = "/opt/SecureSpan/Gateway/runtime/bin/gateway.sh";

const MIN_PORT: u16 = 1024;

/// Settings shared by every node on this host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Operating system family, used to pick how scripts are invoked
    pub os: HostOs,
    /// Address nodes use to reach this controller
    pub controller_address: String,
    /// Port nodes use to reach this controller
    pub controller_port: u16,
    /// Control script used to force-stop a node
    pub control_script: String,
    /// Feature flags appended to every node's command line
    pub extra_args: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            os: HostOs::default(),
            controller_address: String::from(DEFAULT_CONTROLLER_ADDRESS),
            controller_port: DEFAULT_CONTROLLER_PORT,
            control_script: String::from(DEFAULT_CONTROL_SCRIPT),
            extra_args: Vec::new(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.controller_address.trim().is_empty() {
            return Err(ConfigError::host("host.controller_address cannot be empty"));
        }

        if self.controller_port < MIN_PORT {
            return Err(ConfigError::host(format!(
                "host.controller_port must be >= {MIN_PORT} (unprivileged), got {}",
                self.controller_port
            )));
        }

        if self.control_script.trim().is_empty() {
            return Err(ConfigError::host("host.control_script cannot be empty"));
        }

        Ok(())
    }
}
