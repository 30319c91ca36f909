//! Single-instance lock.
//! Only one migration may run at a time; a second copy of the tool started
//! while the first is mid-copy would race it to delete the source.
//!
//! Design:
//! - We hold an exclusive `fs2` lock on a sidecar file for the whole run.
//! - The lock is released when the guard is dropped (or the process dies).

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// RAII guard held while the instance lock is active.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.path);
    }
}

/// Try to take the lock without blocking.
/// Returns Ok(None) if another process (or guard) already holds it.
pub fn try_acquire_instance_lock(path: &Path) -> io::Result<Option<InstanceLock>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            trace!(path = %path.display(), "instance lock acquired");
            Ok(Some(InstanceLock {
                file,
                path: path.to_path_buf(),
            }))
        }
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            trace!(path = %path.display(), "instance lock busy");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
