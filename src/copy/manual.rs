//! Built-in mirror copy (fallback when robocopy is unavailable).
//!
//! Steps:
//! 1) Scan the source (root junction followed, inner links skipped).
//! 2) Purge target entries that have no source counterpart or differ in kind.
//! 3) Create every directory, empty ones included.
//! 4) Copy files whose size or mtime differ, in parallel. Each file goes to a
//!    temp sibling first and is renamed into place, so a crash never leaves a
//!    truncated file under the real name.

use filetime::FileTime;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::MigrateError;
use crate::fs_ops::{copy_streaming, describe_io_error, remove_link, replace_file, unique_temp_path};
use crate::shutdown;

use super::{CopyResult, CopyStrategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct ManualCopier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Dir,
    File { len: u64, mtime: FileTime },
}

fn io_fail<'a>(op: &'a str, path: &'a Path) -> impl FnOnce(std::io::Error) -> MigrateError + 'a {
    move |e| MigrateError::copy_failed(describe_io_error(op, path, &e))
}

fn walk_fail(e: walkdir::Error) -> MigrateError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
    match e.io_error() {
        Some(io) => MigrateError::copy_failed(describe_io_error("read", &path, io)),
        None => MigrateError::copy_failed(format!("walk failed at '{}': {e}", path.display())),
    }
}

/// Relative path -> kind for everything the mirror must reproduce.
fn scan_source(source: &Path) -> Result<Vec<(PathBuf, Kind)>, MigrateError> {
    let mut out = Vec::new();
    for entry in WalkDir::new(source)
        .follow_links(false)
        .follow_root_links(true)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(walk_fail)?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| MigrateError::copy_failed(e.to_string()))?
            .to_path_buf();
        let ft = entry.file_type();
        if ft.is_dir() {
            out.push((rel, Kind::Dir));
        } else if ft.is_file() {
            let md = entry.metadata().map_err(walk_fail)?;
            out.push((
                rel,
                Kind::File {
                    len: md.len(),
                    mtime: FileTime::from_last_modification_time(&md),
                },
            ));
        } else {
            warn!(path = %entry.path().display(), "skipping link inside source tree");
        }
    }
    Ok(out)
}

/// Remove target entries the source does not have (or has with another kind).
fn purge_target(target: &Path, wanted: &HashMap<&Path, Kind>) -> Result<u64, MigrateError> {
    let mut removed = 0u64;
    for entry in WalkDir::new(target)
        .follow_links(false)
        .min_depth(1)
        .contents_first(true)
    {
        let entry = entry.map_err(walk_fail)?;
        let path = entry.path();
        let rel = path
            .strip_prefix(target)
            .map_err(|e| MigrateError::copy_failed(e.to_string()))?;
        let ft = entry.file_type();
        let keep = match wanted.get(rel) {
            Some(Kind::Dir) => ft.is_dir(),
            Some(Kind::File { .. }) => ft.is_file(),
            None => false,
        };
        if keep {
            continue;
        }
        debug!(path = %path.display(), "removing stale target entry");
        if ft.is_symlink() {
            remove_link(path).map_err(io_fail("remove stale link", path))?;
        } else if ft.is_dir() {
            fs::remove_dir(path).map_err(io_fail("remove stale directory", path))?;
        } else {
            clear_readonly(path);
            fs::remove_file(path).map_err(io_fail("remove stale file", path))?;
        }
        removed += 1;
    }
    Ok(removed)
}

#[cfg(windows)]
fn clear_readonly(path: &Path) {
    if let Ok(md) = fs::metadata(path) {
        let mut perms = md.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            let _ = fs::set_permissions(path, perms);
        }
    }
}

#[cfg(not(windows))]
fn clear_readonly(_path: &Path) {}

fn is_up_to_date(dst: &Path, len: u64, mtime: FileTime) -> bool {
    fs::metadata(dst)
        .map(|md| md.is_file() && md.len() == len && FileTime::from_last_modification_time(&md) == mtime)
        .unwrap_or(false)
}

fn copy_one(src: &Path, dst: &Path, mtime: FileTime) -> Result<(), MigrateError> {
    let parent = dst
        .parent()
        .ok_or_else(|| MigrateError::invalid(dst, "destination has no parent"))?;
    let tmp = unique_temp_path(parent);
    let result = copy_streaming(src, &tmp)
        .map_err(io_fail("copy file", src))
        .and_then(|_| {
            filetime::set_file_mtime(&tmp, mtime).map_err(io_fail("set modification time", &tmp))
        })
        .and_then(|_| {
            clear_readonly(dst);
            replace_file(&tmp, dst).map_err(io_fail("replace file", dst))
        });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Mirror `source` onto `target`. Totals describe the whole source tree.
fn mirror(source: &Path, target: &Path) -> Result<CopyResult, MigrateError> {
    let entries = scan_source(source)?;
    fs::create_dir_all(target).map_err(io_fail("create target directory", target))?;

    let wanted: HashMap<&Path, Kind> = entries.iter().map(|(p, k)| (p.as_path(), *k)).collect();
    let purged = purge_target(target, &wanted)?;

    for (rel, kind) in &entries {
        if *kind == Kind::Dir {
            let dir = target.join(rel);
            fs::create_dir_all(&dir).map_err(io_fail("create directory", &dir))?;
        }
    }

    let files: Vec<(&PathBuf, u64, FileTime)> = entries
        .iter()
        .filter_map(|(rel, kind)| match kind {
            Kind::File { len, mtime } => Some((rel, *len, *mtime)),
            Kind::Dir => None,
        })
        .collect();

    let copied = AtomicU64::new(0);
    files.par_iter().try_for_each(|(rel, len, mtime)| {
        if shutdown::is_requested() {
            return Err(MigrateError::Interrupted);
        }
        let src = source.join(rel);
        let dst = target.join(rel);
        if is_up_to_date(&dst, *len, *mtime) {
            return Ok(());
        }
        copy_one(&src, &dst, *mtime)?;
        copied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    })?;

    let result = CopyResult {
        files_copied: files.len() as u64,
        bytes_copied: files.iter().map(|(_, len, _)| *len).sum(),
    };
    info!(
        files = result.files_copied,
        bytes = result.bytes_copied,
        transferred = copied.load(Ordering::Relaxed),
        purged,
        "mirror copy complete"
    );
    Ok(result)
}

impl CopyStrategy for ManualCopier {
    fn name(&self) -> &'static str {
        "built-in mirror"
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<CopyResult, MigrateError> {
        info!(src = %source.display(), dst = %target.display(), "running built-in mirror copy");
        mirror(source, target)
    }
}
