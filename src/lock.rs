// src/lock.rs

//! Process-wide lock for the mutating command path
//!
//! Install, uninstall, update, and upgrade all mutate the shared data
//! directory (package roots plus the exported bin/share/opt trees), so a
//! single advisory lock serialises them across processes. Reads (list,
//! search) never take the lock.
//!
//! The lock is `flock(LOCK_EX)` on `<data_dir>/mason.lock`, held for the
//! life of the [`ProcessLock`] value and released on drop.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Exclusive lock over the mason data directory
pub struct ProcessLock {
    /// Kept open to hold the lock
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Acquire the lock, blocking until it is available
    ///
    /// When another mason process holds the lock, a notice is printed and
    /// the call blocks until that process finishes.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                println!("Waiting for another mason process to finish...");
                file.lock_exclusive().map_err(|e| {
                    Error::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to acquire lock at {}: {e}", path.display()),
                    ))
                })?;
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Acquired lock at {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        // flock is released when the descriptor closes
        debug!("Released lock at {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mason.lock");

        let lock = ProcessLock::acquire(&path).unwrap();
        assert!(path.exists());
        drop(lock);

        // Re-acquirable after release
        let _lock = ProcessLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep/nested/mason.lock");
        let _lock = ProcessLock::acquire(&path).unwrap();
        assert!(path.exists());
    }
}
