use std::time::Duration;

/// Latency budget for a health RPC client.
///
/// `Fast` is used for liveness checks inside a sweep, `Slow` for
/// administrative calls such as shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutProfile {
    Fast,
    Slow,
}

impl TimeoutProfile {
    pub fn connect_timeout(self) -> Duration {
        match self {
            Self::Fast => Duration::from_millis(2000),
            Self::Slow => Duration::from_millis(30000),
        }
    }

    pub fn receive_timeout(self) -> Duration {
        match self {
            Self::Fast => Duration::from_millis(2000),
            Self::Slow => Duration::from_millis(60000),
        }
    }
}

impl std::fmt::Display for TimeoutProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Slow => write!(f, "slow"),
        }
    }
}
