use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] pc_config::ConfigError),

    #[error("Supervisor error: {0}")]
    Supervisor(#[from] pc_core::SupervisorError),

    #[error("Lock error: {message} {location}")]
    Lock {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logger error: {message}")]
    Logger { message: String },
}

impl ServerError {
    #[track_caller]
    pub fn lock<S: Into<String>>(message: S) -> Self {
        Self::Lock {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
