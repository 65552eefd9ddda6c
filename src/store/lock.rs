//! Lock file guarding against overlapping runs.
//!
//! The persister has no protection against concurrent writers. If the external
//! scheduler fires a new run while the previous one is still fetching, the
//! second run must not start.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::errors::AppError;
use crate::store::StoreError;

/// Held for the duration of a run; the lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// `<snapshot path>.lock`
    pub fn path_for(snapshot_path: &Path) -> PathBuf {
        let mut name = snapshot_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Creates the lock file exclusively. A lock older than `stale_after` is
    /// assumed to belong to a crashed run and is replaced.
    pub fn acquire(path: impl Into<PathBuf>, stale_after: Duration) -> Result<Self, AppError> {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| io_error(&path, e))?;
        }

        match Self::try_create(&path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !Self::is_stale(&path, stale_after) {
                    return Err(AppError::AlreadyRunning(path));
                }

                warn!("Removing stale lock file {}", path.display());
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(io_error(&path, e)),
                }

                Self::try_create(&path).map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => AppError::AlreadyRunning(path.clone()),
                    _ => io_error(&path, e),
                })
            }
            Err(e) => Err(io_error(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_create(path: &Path) -> io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(
            file,
            "pid={} acquired={}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        )?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map(|age| age >= stale_after)
            // vanished between the failed create and now
            .unwrap_or(true)
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Released lock {}", self.path.display()),
            Err(e) => warn!("Failed to remove lock {}: {}", self.path.display(), e),
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> AppError {
    AppError::Storage(StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
