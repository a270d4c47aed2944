use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, ControllerConfig,
    DEFAULT_CONFIG_DIR, HostConfig, LoggingConfig, NodeConfig, TlsConfig,
};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub host: HostConfig,
    pub tls: TlsConfig,
    pub logging: LoggingConfig,
    pub nodes: Vec<NodeConfig>,
}

impl Config {
    /// Load config from the default config directory.
    ///
    /// Loading order:
    /// 1. Check for PC_CONFIG_DIR env var, else use ./.pc/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply PC_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load config from an explicit directory. Same rules as `load()`.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &PathBuf) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: PC_CONFIG_DIR env var > ./.pc/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.controller.validate()?;
        self.host.validate()?;
        self.tls.validate()?;

        let mut seen = HashSet::new();
        for node in &self.nodes {
            node.validate()?;
            if !seen.insert(node.name.as_str()) {
                return Err(ConfigError::node(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }

        let log_dir = Path::new(&self.logging.dir);
        if log_dir.is_absolute() || self.logging.dir.contains("..") {
            return Err(ConfigError::config(
                "logging.dir must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  controller: sweep={}ms, start={}..{}ms, crash={}ms, stop={}ms, daemon={}, kill_running={}",
            self.controller.sweep_interval_ms,
            self.controller.min_start_time_ms,
            self.controller.max_start_time_ms,
            self.controller.crash_detection_ms,
            self.controller.stop_timeout_ms,
            self.controller.daemon,
            self.controller.kill_running_nodes
        );
        info!(
            "  host: {} ({}:{}), control script {}",
            self.host.os,
            self.host.controller_address,
            self.host.controller_port,
            self.host.control_script
        );
        info!(
            "  tls: {} (trust any server certificate: {})",
            if self.tls.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.tls.trust_any_server_certificate
        );
        info!(
            "  logging: {} (colored: {})",
            self.logging.level, self.logging.colored
        );

        let enabled = self.nodes.iter().filter(|n| n.enabled).count();
        info!("  nodes: {} configured, {} enabled", self.nodes.len(), enabled);
        for node in &self.nodes {
            info!(
                "    {} [{}] {}",
                node.name,
                if node.enabled { "enabled" } else { "disabled" },
                node.home.display()
            );
        }
    }

    fn apply_env_overrides(&mut self) {
        // Controller
        let c = &mut self.controller;
        Self::apply_env_parse("PC_CONTROLLER_SWEEP_INTERVAL_MS", &mut c.sweep_interval_ms);
        Self::apply_env_parse("PC_CONTROLLER_MIN_START_TIME_MS", &mut c.min_start_time_ms);
        Self::apply_env_parse("PC_CONTROLLER_MAX_START_TIME_MS", &mut c.max_start_time_ms);
        Self::apply_env_parse(
            "PC_CONTROLLER_CRASH_DETECTION_MS",
            &mut c.crash_detection_ms,
        );
        Self::apply_env_parse(
            "PC_CONTROLLER_STOPPED_TIMEOUT_MS",
            &mut c.stopped_timeout_ms,
        );
        Self::apply_env_parse(
            "PC_CONTROLLER_WONT_START_RETRY_MS",
            &mut c.wont_start_retry_ms,
        );
        Self::apply_env_parse("PC_CONTROLLER_STOP_TIMEOUT_MS", &mut c.stop_timeout_ms);
        Self::apply_env_parse(
            "PC_CONTROLLER_STOP_ALL_TIMEOUT_MS",
            &mut c.stop_all_timeout_ms,
        );
        Self::apply_env_parse("PC_CONTROLLER_KILL_TIMEOUT_MS", &mut c.kill_timeout_ms);
        Self::apply_env_parse(
            "PC_CONTROLLER_OUTPUT_BUFFER_BYTES",
            &mut c.output_buffer_bytes,
        );
        Self::apply_env_parse(
            "PC_CONTROLLER_COLLECTOR_JOIN_GRACE_MS",
            &mut c.collector_join_grace_ms,
        );
        Self::apply_env_bool(
            "PC_CONTROLLER_KILL_RUNNING_NODES",
            &mut c.kill_running_nodes,
        );
        Self::apply_env_bool("PC_CONTROLLER_DAEMON", &mut c.daemon);

        // Host
        Self::apply_env_string(
            "PC_HOST_CONTROLLER_ADDRESS",
            &mut self.host.controller_address,
        );
        Self::apply_env_parse("PC_HOST_CONTROLLER_PORT", &mut self.host.controller_port);
        Self::apply_env_string("PC_HOST_CONTROL_SCRIPT", &mut self.host.control_script);

        // TLS
        Self::apply_env_bool("PC_TLS_ENABLED", &mut self.tls.enabled);
        Self::apply_env_string("PC_TLS_CERTIFICATE_PATH", &mut self.tls.certificate_path);
        Self::apply_env_string("PC_TLS_KEY_PATH", &mut self.tls.key_path);

        // Logging
        Self::apply_env_parse("PC_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("PC_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("PC_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
