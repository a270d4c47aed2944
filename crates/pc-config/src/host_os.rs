use std::fmt;

use serde::Deserialize;

/// Operating system family of the appliance host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Linux,
    Windows,
    Other,
}

impl HostOs {
    /// The family this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            HostOs::Linux
        } else if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Other
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, HostOs::Windows)
    }
}

impl Default for HostOs {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Linux => write!(f, "linux"),
            HostOs::Windows => write!(f, "windows"),
            HostOs::Other => write!(f, "other"),
        }
    }
}
