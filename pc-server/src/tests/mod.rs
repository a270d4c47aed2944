mod cli;

use pc_config::{AdminPortFile, Config, DEFAULT_PORT_FILE};

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

const POLL_ATTEMPTS: u32 = 200;
const POLL_STEP: Duration = Duration::from_millis(25);

/// Config dir holding one disabled node whose port file is empty, so every
/// ping reports administration disabled without touching the network and
/// the first sweep settles the node as `Stopped`.
pub(crate) struct Fixture {
    pub(crate) config_dir: TempDir,
    pub(crate) _home: TempDir,
    pub(crate) config: Config,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let config_dir = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        AdminPortFile::write_in(home.path(), DEFAULT_PORT_FILE, None).unwrap();

        let toml = format!(
            r#"
[controller]
sweep_interval_ms = 100
stop_all_timeout_ms = 5000

[host]
control_script = "/nonexistent/pc-control"

[tls]
enabled = false

[[nodes]]
name = "alpha"
enabled = false
home = "{}"
program = "/nonexistent/gateway"
"#,
            home.path().display().to_string().replace('\\', "\\\\")
        );
        std::fs::write(config_dir.path().join("config.toml"), toml).unwrap();

        let config = Config::load_from(config_dir.path()).unwrap();
        config.validate().unwrap();

        Self {
            config_dir,
            _home: home,
            config,
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        self.config_dir.path()
    }
}

/// Poll `check` until it holds or the attempts run out.
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..POLL_ATTEMPTS {
        if check() {
            return true;
        }
        tokio::time::sleep(POLL_STEP).await;
    }
    check()
}
