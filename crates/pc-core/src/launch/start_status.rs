/// Final output of a node process that exited during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Answer to "has the node started yet?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartStatus {
    StillStarting,
    Started,
    Died(ProcessOutput),
}
