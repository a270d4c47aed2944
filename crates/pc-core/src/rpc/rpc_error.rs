use std::error::Error as _;
use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Fault text a node returns when its admin API has been switched off.
pub const ADMIN_DISABLED_FAULT: &str = "Node management API is disabled";

/// Fault text a node returns when it refuses to be managed by a controller.
pub const NOT_CONFIGURED_FAULT: &str = "Node is not configured for process controller administration";

/// Failure of a health RPC call against a node.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connection refused by {endpoint} {location}")]
    ConnectionRefused {
        endpoint: String,
        location: ErrorLocation,
    },

    #[error("Node at {endpoint} unreachable: {message} {location}")]
    Network {
        endpoint: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Node admin API is disabled {location}")]
    AdminDisabled { location: ErrorLocation },

    #[error("Node is not configured for administration {location}")]
    NotConfigured { location: ErrorLocation },

    #[error("Node API fault: {message} {location}")]
    Fault {
        message: String,
        location: ErrorLocation,
    },

    #[error("Node API client unavailable: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unexpected node API failure: {message} {location}")]
    Unexpected {
        message: String,
        location: ErrorLocation,
    },
}

impl RpcError {
    #[track_caller]
    pub fn connection_refused(endpoint: impl Into<String>) -> Self {
        Self::ConnectionRefused {
            endpoint: endpoint.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn admin_disabled() -> Self {
        Self::AdminDisabled {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_configured() -> Self {
        Self::NotConfigured {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Classify a fault message returned by a node.
    ///
    /// The two sentinel faults map to their own variants; anything else is
    /// kept as a plain `Fault`.
    #[track_caller]
    pub fn fault(message: impl Into<String>) -> Self {
        let message = message.into();
        let location = ErrorLocation::from(Location::caller());
        if message.contains(ADMIN_DISABLED_FAULT) {
            Self::AdminDisabled { location }
        } else if message.contains(NOT_CONFIGURED_FAULT) {
            Self::NotConfigured { location }
        } else {
            Self::Fault { message, location }
        }
    }

    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Convert a transport error, separating "nothing listening" from other
    /// network trouble.
    #[track_caller]
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::network(endpoint, "timed out");
        }
        if err.is_connect() {
            if is_refused(&err) {
                return Self::connection_refused(endpoint);
            }
            return Self::network(endpoint, describe_source(&err));
        }
        if err.is_request() || err.is_body() {
            return Self::network(endpoint, describe_source(&err));
        }
        Self::unexpected(err.to_string())
    }

    /// Connection refused, unreachable host, or timed out.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. } | Self::Network { .. })
    }

    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. })
    }

    pub fn is_admin_disabled(&self) -> bool {
        matches!(self, Self::AdminDisabled { .. })
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    /// Short description without endpoint or source location, for quiet logs.
    pub fn safe_message(&self) -> String {
        match self {
            Self::ConnectionRefused { .. } => "connection refused".to_string(),
            Self::Network { message, .. } => message.clone(),
            Self::AdminDisabled { .. } => "admin API disabled".to_string(),
            Self::NotConfigured { .. } => "not configured for administration".to_string(),
            Self::Fault { message, .. }
            | Self::Unavailable { message, .. }
            | Self::Unexpected { message, .. } => message.clone(),
        }
    }
}

fn is_refused(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        source = cause.source();
    }
    format!("{err:?}").contains("ConnectionRefused")
}

/// Innermost cause of a transport error, which is usually the useful part.
fn describe_source(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message = cause.to_string();
        source = cause.source();
    }
    message
}

pub type Result<T> = std::result::Result<T, RpcError>;
