use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStateType {
    Unknown,
    Starting,
    Running,
    Stopping,
    Stopped,
    Crashed,
    WontStart,
    NotManaged,
}

impl NodeStateType {
    /// States a node may be deleted from.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Crashed | Self::WontStart | Self::NotManaged
        )
    }

    /// States `stop_all` waits for.
    pub fn is_down(self) -> bool {
        matches!(self, Self::Stopped | Self::Crashed | Self::WontStart)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Crashed => "crashed",
            Self::WontStart => "wont_start",
            Self::NotManaged => "not_managed",
        }
    }
}

impl std::fmt::Display for NodeStateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
