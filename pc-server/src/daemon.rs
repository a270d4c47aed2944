use crate::error::Result as ServerResult;
use crate::lock::LockFile;
use crate::sweeper::Sweeper;

use pc_config::Config;
use pc_core::{
    HttpNodeApiFactory, NodeStatus, OsProcessLayer, StaticNodeRegistry, Supervisor,
    SupervisorConfig,
};

use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

/// A configured supervisor plus the single-instance lock it runs under.
pub struct Daemon {
    supervisor: Arc<Supervisor>,
    lock: LockFile,
}

impl Daemon {
    /// Acquire the controller lock in `config_dir` and wire the supervisor
    /// to the configured nodes.
    pub fn build(config: &Config, config_dir: &Path) -> ServerResult<Self> {
        let lock = LockFile::acquire(config_dir, config.host.controller_port)?;
        let supervisor = Arc::new(build_supervisor(config, config_dir));

        Ok(Self { supervisor, lock })
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn lock(&self) -> &LockFile {
        &self.lock
    }

    /// Sweep until `shutdown` fires, then stop every node and release the
    /// lock. Returns whether all nodes went down in time.
    pub async fn run(mut self, shutdown: CancellationToken) -> bool {
        let config = self.supervisor.config();
        let sweeper = Sweeper::spawn(
            Arc::clone(&self.supervisor),
            config.sweep_interval,
            shutdown.child_token(),
        );

        shutdown.cancelled().await;
        info!("Shutdown requested");
        sweeper.stop().await;

        let clean = self.supervisor.stop_all(config.stop_timeout).await;
        self.lock.release();
        clean
    }

    /// One sweep, a status snapshot, then a full stop.
    pub async fn run_once(mut self) -> (Vec<NodeStatus>, bool) {
        self.supervisor.sweep().await;
        let statuses = self.supervisor.list_nodes();

        let clean = self
            .supervisor
            .stop_all(self.supervisor.config().stop_timeout)
            .await;
        self.lock.release();
        (statuses, clean)
    }
}

pub fn build_supervisor(config: &Config, config_dir: &Path) -> Supervisor {
    let supervisor_config = SupervisorConfig::from(&config.controller);
    let registry = Arc::new(StaticNodeRegistry::from_config(config));
    let processes = Arc::new(OsProcessLayer::new(
        config.host.clone(),
        config.tls.certificate_file(config_dir),
        supervisor_config.kill_timeout,
    ));
    let api_factory = Arc::new(HttpNodeApiFactory::from_config(config, config_dir));

    Supervisor::new(supervisor_config, registry, processes, api_factory)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
///
/// A listener that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut terminate) => {
                    terminate.recv().await;
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                Err(e) => {
                    warn!("Failed to listen for SIGTERM: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c() => {}
            _ = terminate => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        Err(e) => {
            error!("Failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    }
}
