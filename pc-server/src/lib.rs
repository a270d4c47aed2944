pub mod cli;
pub mod daemon;
pub mod error;
pub mod lock;
pub mod logger;
pub mod sweeper;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use daemon::{Daemon, build_supervisor, shutdown_signal};
pub use error::{Result as ServerResult, ServerError};
pub use lock::{LOCK_FILENAME, LockFile, LockInfo};
pub use logger::LogTarget;
pub use sweeper::Sweeper;
