mod config;
mod controller_config;
mod error;
mod host_config;
mod host_os;
mod log_level;
mod logging_config;
mod node_config;
mod port_file;
mod tls_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use controller_config::ControllerConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use host_config::HostConfig;
pub use host_os::HostOs;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use node_config::{DEFAULT_API_PATH, DEFAULT_API_PORT, DEFAULT_PORT_FILE, NodeConfig};
pub use port_file::{AdminPort, AdminPortFile};
pub use tls_config::TlsConfig;

const CONFIG_FILENAME: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "PC_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".pc";
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
