// SPDX-License-Identifier: MIT

//! Daemon lifecycle: pid-file locking and startup errors

use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire {path}: daemon already running?")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive pid-file lock held for the daemon's lifetime
///
/// The flock is released automatically when the process exits, so a crashed
/// daemon never leaves a stale lock behind; only the pid file itself may
/// linger, and the next startup simply re-locks it.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    // NOTE(lifetime): held to maintain the exclusive flock; released on drop
    #[allow(dead_code)]
    file: File,
}

impl PidLock {
    /// Acquire the lock and record our pid in the file
    pub fn acquire(path: &Path) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.try_lock_exclusive()
            .map_err(|source| LifecycleError::LockFailed {
                path: path.to_path_buf(),
                source,
            })?;

        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Remove the pid file on graceful shutdown
    pub fn release(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove pid file");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
