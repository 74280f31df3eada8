//! Exclusive run lock for a working copy.
//!
//! Every branch checkout repoints the same local clone, so two runs must
//! never overlap on it. Inside one process the worker queue already
//! serializes runs; this lock extends the guarantee to separate processes
//! (a manual `confgen run` while `confgen serve` is working, say).
//!
//! The lock file sits next to the clone, not inside it, because the clone
//! directory is deleted at the end of every run:
//!
//! - `<workdir>/<clone-name>` - the working copy
//! - `<workdir>/.<clone-name>.lock` - lock file with an OS-level exclusive lock
//!
//! Acquisition is non-blocking and the lock is released on drop.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::debug;

use crate::error::{Error, Result};

/// An exclusive lock on one working copy, held for the duration of a run.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    /// Some while the lock is held.
    file: Option<File>,
}

impl RunLock {
    /// Lock the working copy at `clone_path`.
    ///
    /// Returns `Error::RunLocked` immediately if another holder exists.
    pub fn acquire(clone_path: &Path) -> Result<Self> {
        let path = lock_path(clone_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired run lock {}", path.display());
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(Error::RunLocked { path }),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release early. Safe to call more than once.
    pub fn release(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.unlock()?;
            debug!("Released run lock {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

/// `<parent>/.<name>.lock` for a clone at `<parent>/<name>`.
pub fn lock_path(clone_path: &Path) -> PathBuf {
    let name = clone_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "confgen".to_string());
    let parent = clone_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(".{}.lock", name))
}
