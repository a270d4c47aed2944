use crate::{
    Node, NodeProcess, OutputStream, ProcessLayer, SpawnedProcess, SupervisorError,
    SupervisorResult, build_command_line,
};

use pc_config::HostConfig;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::{Child, Command};

/// `NodeProcess` backed by a `tokio::process::Child`.
struct ChildProcess {
    child: Child,
    exit_code: Option<i32>,
}

impl NodeProcess for ChildProcess {
    fn exit_code(&mut self) -> Option<i32> {
        if self.exit_code.is_some() {
            return self.exit_code;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_code = Some(status.code().unwrap_or(-1));
                self.exit_code
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to query exit status of pid {:?}: {e}", self.child.id());
                None
            }
        }
    }

    fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Spawns nodes as child processes and stops them through the host's
/// control script.
pub struct OsProcessLayer {
    host: HostConfig,
    certificate: PathBuf,
    kill_timeout: Duration,
}

impl OsProcessLayer {
    pub fn new(host: HostConfig, certificate: PathBuf, kill_timeout: Duration) -> Self {
        Self {
            host,
            certificate,
            kill_timeout,
        }
    }

    fn kill_command(&self, node: &Node) -> Command {
        let mut cmd = if self.host.os.is_windows() {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.host.control_script);
            cmd
        } else {
            Command::new(&self.host.control_script)
        };
        cmd.args(["pc", "stop", "-force"])
            .current_dir(&node.home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ProcessLayer for OsProcessLayer {
    async fn spawn(&self, node: &Node) -> SupervisorResult<SpawnedProcess> {
        let argv = build_command_line(node, &self.host, &self.certificate);
        debug!("Launching node {}: {}", node.name, argv.join(" "));

        let Some((program, args)) = argv.split_first() else {
            return Err(SupervisorError::spawn(
                &node.name,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
            ));
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&node.home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so the node outlives a controller restart and
        // can be adopted again
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| SupervisorError::spawn(&node.name, e))?;

        info!("Spawned node {} with pid {:?}", node.name, child.id());

        let stdout = child.stdout.take().map(|s| Box::new(s) as OutputStream);
        let stderr = child.stderr.take().map(|s| Box::new(s) as OutputStream);

        Ok(SpawnedProcess {
            process: Box::new(ChildProcess {
                child,
                exit_code: None,
            }),
            stdout,
            stderr,
        })
    }

    async fn kill(&self, node: &Node) {
        info!("Force-stopping node {}", node.name);

        match tokio::time::timeout(self.kill_timeout, self.kill_command(node).output()).await {
            Ok(Ok(output)) if output.status.success() => {
                debug!("Control script stopped node {}", node.name);
            }
            Ok(Ok(output)) => {
                warn!(
                    "Control script failed to stop node {} ({}): {}",
                    node.name,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Ok(Err(e)) => {
                warn!(
                    "Failed to run control script {} for node {}: {e}",
                    self.host.control_script, node.name
                );
            }
            Err(_) => {
                warn!(
                    "Control script for node {} did not finish within {:?}",
                    node.name, self.kill_timeout
                );
            }
        }
    }
}
