use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{category} error: {message} {location}")]
    Generic {
        category: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Create a config error
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Config",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a controller tunables error
    #[track_caller]
    pub fn controller<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Controller",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a host settings error
    #[track_caller]
    pub fn host<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Host",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a node definition error
    #[track_caller]
    pub fn node<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Node",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a TLS settings error
    #[track_caller]
    pub fn tls<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Tls",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create an admin port file error
    #[track_caller]
    pub fn port_file<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "PortFile",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
