use crate::{Node, SupervisorResult};

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Readable end of a child's stdout or stderr pipe.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Handle to a node process spawned by the supervisor.
pub trait NodeProcess: Send + Sync {
    /// Exit code if the process has exited, without blocking.
    ///
    /// A process killed by a signal reports `-1`.
    fn exit_code(&mut self) -> Option<i32>;

    fn id(&self) -> Option<u32>;
}

/// A freshly spawned node with its output pipes.
pub struct SpawnedProcess {
    pub process: Box<dyn NodeProcess>,
    pub stdout: Option<OutputStream>,
    pub stderr: Option<OutputStream>,
}

/// Spawns and force-stops node processes.
#[async_trait]
pub trait ProcessLayer: Send + Sync {
    async fn spawn(&self, node: &Node) -> SupervisorResult<SpawnedProcess>;

    /// Best-effort forced stop. Failures are logged, never returned.
    async fn kill(&self, node: &Node);
}
