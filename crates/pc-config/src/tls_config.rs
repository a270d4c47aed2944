use crate::{ConfigError, ConfigErrorResult};

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_CERTIFICATE_PATH: &str = "controller.crt";
pub const DEFAULT_KEY_PATH: &str = "controller.key";

/// Client identity presented to node admin APIs.
///
/// Certificate and key are PEM files managed outside this process;
/// relative paths are resolved against the config directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Talk `https` to nodes (otherwise plain `http`)
    pub enabled: bool,
    pub certificate_path: String,
    pub key_path: String,
    /// Accept any server certificate presented by a node
    pub trust_any_server_certificate: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            certificate_path: String::from(DEFAULT_CERTIFICATE_PATH),
            key_path: String::from(DEFAULT_KEY_PATH),
            trust_any_server_certificate: true,
        }
    }
}

impl TlsConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.enabled && self.certificate_path.trim().is_empty() {
            return Err(ConfigError::tls(
                "tls.certificate_path is required when tls.enabled = true",
            ));
        }

        if self.enabled && self.key_path.trim().is_empty() {
            return Err(ConfigError::tls(
                "tls.key_path is required when tls.enabled = true",
            ));
        }

        Ok(())
    }

    /// URL scheme for node admin endpoints.
    pub fn scheme(&self) -> &'static str {
        if self.enabled { "https" } else { "http" }
    }

    pub fn certificate_file(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.certificate_path)
    }

    pub fn key_file(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.key_path)
    }
}
