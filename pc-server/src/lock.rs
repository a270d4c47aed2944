//! Single-instance lock file for the controller daemon.

use crate::error::{Result as ServerResult, ServerError};

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

pub const LOCK_FILENAME: &str = "controller.lock";
#[cfg(unix)]
const LOCK_FILE_MODE: u32 = 0o600;

/// Lock file holding the owning controller's PID, admin port, and start
/// time. A lock whose PID is no longer alive is stale and gets replaced.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    file: Option<File>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub port: u16,
    pub started_at: String,
}

impl LockFile {
    /// Acquire `controller.lock` in `dir`.
    ///
    /// Fails with `ServerError::Lock` when a live controller holds it.
    #[track_caller]
    pub fn acquire(dir: &Path, port: u16) -> ServerResult<Self> {
        let path = dir.join(LOCK_FILENAME);

        if path.exists()
            && let Ok(existing) = Self::read_info(&path)
        {
            if existing.pid != std::process::id() && is_process_running(existing.pid) {
                return Err(ServerError::lock(format!(
                    "controller already running (PID {}, lock {})",
                    existing.pid,
                    path.display()
                )));
            }
            info!(
                "Removing stale lock file (PID {} not running)",
                existing.pid
            );
            std::fs::remove_file(&path).ok();
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(LOCK_FILE_MODE);

        let file = options
            .open(&path)
            .map_err(|e| ServerError::io(&path, e))?;

        let mut lock = Self {
            path,
            file: Some(file),
        };
        lock.write_info(port)?;

        info!("Lock acquired: {}", lock.path.display());
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the lock info currently on disk.
    pub fn read_info(path: &Path) -> ServerResult<LockInfo> {
        let content = std::fs::read_to_string(path).map_err(|e| ServerError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            ServerError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    fn write_info(&mut self, port: u16) -> ServerResult<()> {
        let info = LockInfo {
            pid: std::process::id(),
            port,
            started_at: chrono::Utc::now().to_rfc3339(),
        };

        let content = serde_json::to_string_pretty(&info).map_err(|e| {
            ServerError::io(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        if let Some(ref mut file) = self.file {
            file.write_all(content.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| ServerError::io(&self.path, e))?;
        }

        Ok(())
    }

    /// Release the lock. Also runs on drop.
    pub fn release(&mut self) {
        if self.file.take().is_some() {
            std::fs::remove_file(&self.path).ok();
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // kill(pid, 0) checks for existence without signalling; EPERM means
    // the process exists under another user
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::{CloseHandle, STILL_ACTIVE};
    use windows_sys::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle.is_null() {
            return false;
        }

        let mut exit_code: u32 = 0;
        let result = GetExitCodeProcess(handle, &mut exit_code);
        CloseHandle(handle);

        result != 0 && exit_code == STILL_ACTIVE as u32
    }
}
