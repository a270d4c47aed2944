use crate::error::Result as ServerResult;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "pc-server")]
#[command(about = "Host-local process controller for gateway nodes")]
#[command(version)]
pub struct Cli {
    /// Config directory (defaults to $PC_CONFIG_DIR, then ./.pc)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Run a single sweep, print node statuses as JSON, stop all nodes and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    pub fn config_dir(&self) -> ServerResult<PathBuf> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(pc_config::Config::config_dir()?),
        }
    }
}
