//! Admin port discovery file for supervised nodes.
//!
//! A node writes this file under its home directory once its admin API
//! listener is bound to an ephemeral port. The controller reads it to
//! find the node's admin endpoint.
//!
//! ## Contents
//!
//! - decimal port number: the admin API is listening on that port
//! - empty: the admin API is intentionally disabled on that node
//!
//! A missing file means the node never published a port; callers fall
//! back to the node's well-known default endpoint.

use crate::{ConfigError, ConfigErrorResult};

use std::path::{Path, PathBuf};

/// What a node's admin port file says about its admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPort {
    /// No file: use the default endpoint
    Missing,
    /// Empty file: the API is switched off for this node
    Disabled,
    /// The API listens on this port
    Port(u16),
}

pub struct AdminPortFile;

impl AdminPortFile {
    /// Full path of the port file for a node.
    pub fn path_in(home: &Path, relative: &str) -> PathBuf {
        home.join(relative)
    }

    /// Read and interpret the port file.
    ///
    /// Returns `Err` only when the file exists but cannot be read or
    /// does not contain a port number.
    pub fn read_in(home: &Path, relative: &str) -> ConfigErrorResult<AdminPort> {
        let path = Self::path_in(home, relative);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AdminPort::Missing),
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(AdminPort::Disabled);
        }

        trimmed.parse::<u16>().map(AdminPort::Port).map_err(|e| {
            ConfigError::port_file(format!(
                "Invalid admin port file {}: {e} (content: {trimmed:?})",
                path.display()
            ))
        })
    }

    /// Write the port file, creating parent directories.
    ///
    /// `None` writes an empty file, marking the admin API as disabled.
    pub fn write_in(home: &Path, relative: &str, port: Option<u16>) -> ConfigErrorResult<PathBuf> {
        let path = Self::path_in(home, relative);

        if let Some(dir) = path.parent()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let content = port.map(|p| p.to_string()).unwrap_or_default();
        std::fs::write(&path, content).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Delete the port file. Silently succeeds if it does not exist.
    pub fn remove_in(home: &Path, relative: &str) -> ConfigErrorResult<()> {
        let path = Self::path_in(home, relative);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}
