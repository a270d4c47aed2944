use crate::NodeStateType;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Node '{name}' is not configured {location}")]
    UnknownNode {
        name: String,
        location: ErrorLocation,
    },

    #[error("Node '{name}' admin API is temporarily unavailable (last known state: {last_known}) {location}")]
    TemporarilyUnavailable {
        name: String,
        last_known: NodeStateType,
        location: ErrorLocation,
    },

    #[error("Failed to spawn node '{node}': {source} {location}")]
    Spawn {
        node: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Config error: {0}")]
    Config(#[from] pc_config::ConfigError),
}

impl SupervisorError {
    #[track_caller]
    pub fn unknown_node(name: impl Into<String>) -> Self {
        Self::UnknownNode {
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn temporarily_unavailable(name: impl Into<String>, last_known: NodeStateType) -> Self {
        Self::TemporarilyUnavailable {
            name: name.into(),
            last_known,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn spawn(node: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            node: node.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the caller may reasonably retry the same request later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TemporarilyUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
