//! Directory prober.
//!
//! Walks a tree once and sums file sizes, counting files and directories. A
//! junction at the root is followed, so probing a migrated source reports the
//! target's numbers; links *inside* the tree are never followed, which keeps a
//! tree that already contains reparse points from being double-counted or
//! looping forever.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::MigrateError;
use crate::platform;

/// Aggregate size of a directory tree at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    pub total_bytes: u64,
    pub file_count: u64,
    pub dir_count: u64,
}

impl DirectoryStats {
    /// True when `self` holds at least as many files and bytes as `baseline`.
    pub fn covers(&self, baseline: &DirectoryStats) -> bool {
        self.file_count >= baseline.file_count && self.total_bytes >= baseline.total_bytes
    }
}

/// Compute stats for `path`. Unreadable entries are skipped, never fatal.
pub fn probe(path: &Path) -> Result<DirectoryStats, MigrateError> {
    if !path.exists() {
        return Err(MigrateError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(MigrateError::invalid(path, "not a directory"));
    }

    let mut stats = DirectoryStats::default();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .follow_root_links(true)
        .min_depth(1)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry while probing");
                continue;
            }
        };
        let ft = entry.file_type();
        if ft.is_dir() {
            stats.dir_count += 1;
        } else if ft.is_file() {
            match entry.metadata() {
                Ok(m) => {
                    stats.file_count += 1;
                    stats.total_bytes += m.len();
                }
                Err(e) => debug!(path = %entry.path().display(), error = %e, "cannot stat file"),
            }
        } else {
            debug!(path = %entry.path().display(), "not following link inside tree");
        }
    }
    Ok(stats)
}

/// Everything the prompts show about a candidate source or target.
#[derive(Debug, Clone)]
pub struct DirInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub is_dir: bool,
    pub is_junction: bool,
    pub stats: DirectoryStats,
}

impl DirInfo {
    pub fn is_empty(&self) -> bool {
        self.stats.file_count == 0 && self.stats.dir_count == 0
    }

    /// Multi-line summary for terminal display.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Path:   {}", self.path.display());
        if !self.exists {
            let _ = writeln!(out, "Status: does not exist");
            return out;
        }
        let kind = match (self.is_junction, self.is_dir) {
            (true, _) => match platform::junction_target(&self.path) {
                Ok(t) => format!("junction -> {}", t.display()),
                Err(_) => "junction".to_string(),
            },
            (false, true) => "directory".to_string(),
            (false, false) => "not a directory (check this path)".to_string(),
        };
        let _ = writeln!(out, "Type:   {kind}");
        if self.is_dir {
            let _ = writeln!(
                out,
                "Files:  {} | Subdirectories: {}",
                self.stats.file_count, self.stats.dir_count
            );
            let _ = writeln!(out, "Size:   {}", format_bytes(self.stats.total_bytes));
            let _ = writeln!(out, "Empty:  {}", if self.is_empty() { "yes" } else { "no" });
        }
        out
    }
}

/// Never fails: a missing path comes back with `exists == false`.
pub fn dir_info(path: &Path) -> DirInfo {
    let is_junction = platform::is_junction(path);
    let exists = path.exists() || is_junction;
    let is_dir = path.is_dir();
    let stats = if is_dir {
        probe(path).unwrap_or_default()
    } else {
        DirectoryStats::default()
    };
    DirInfo {
        path: path.to_path_buf(),
        exists,
        is_dir,
        is_junction,
        stats,
    }
}

/// Human readable size with two decimals (1024-based).
pub fn format_bytes(num_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut amount = num_bytes as f64;
    for unit in UNITS {
        if amount < 1024.0 {
            return format!("{amount:.2} {unit}");
        }
        amount /= 1024.0;
    }
    format!("{amount:.2} PB")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn counts_files_bytes_and_dirs() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("a.bin").write_binary(&[0u8; 100]).unwrap();
        tree.child("models/b.gguf").write_binary(&[1u8; 250]).unwrap();
        tree.child("models/deep/c.json").write_str("{}").unwrap();
        tree.child("empty").create_dir_all().unwrap();

        let stats = probe(tree.path()).unwrap();
        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.total_bytes, 352);
        assert_eq!(stats.dir_count, 3);
        assert_eq!(probe(tree.path()).unwrap(), stats, "probe must be stable");
    }

    #[test]
    fn empty_directory_is_zero() {
        let tree = assert_fs::TempDir::new().unwrap();
        assert_eq!(probe(tree.path()).unwrap(), DirectoryStats::default());
    }

    #[test]
    fn missing_path_is_not_found() {
        let tree = assert_fs::TempDir::new().unwrap();
        let err = probe(&tree.path().join("gone")).unwrap_err();
        assert!(matches!(err, MigrateError::PathNotFound(_)));
    }

    #[test]
    fn inner_links_are_not_followed_but_root_link_is() {
        let tree = assert_fs::TempDir::new().unwrap();
        let data = tree.child("data");
        data.child("m.bin").write_binary(&[7u8; 10]).unwrap();
        let holder = tree.child("holder");
        holder.create_dir_all().unwrap();
        platform::create_junction(&holder.path().join("inner"), data.path()).unwrap();

        let inner = probe(holder.path()).unwrap();
        assert_eq!(inner.file_count, 0);
        assert_eq!(inner.total_bytes, 0);

        let root_link = tree.path().join("root_link");
        platform::create_junction(&root_link, data.path()).unwrap();
        assert_eq!(probe(&root_link).unwrap(), probe(data.path()).unwrap());
    }

    #[test]
    fn covers_is_non_decreasing_check() {
        let base = DirectoryStats { total_bytes: 10, file_count: 2, dir_count: 0 };
        let more = DirectoryStats { total_bytes: 12, file_count: 2, dir_count: 5 };
        let fewer = DirectoryStats { total_bytes: 12, file_count: 1, dir_count: 5 };
        assert!(more.covers(&base));
        assert!(!fewer.covers(&base));
    }

    #[test]
    fn dir_info_for_missing_path() {
        let tree = assert_fs::TempDir::new().unwrap();
        let info = dir_info(&tree.path().join("nope"));
        assert!(!info.exists);
        assert!(info.render().contains("does not exist"));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(500 * 1024 * 1024), "500.00 MB");
        assert_eq!(format_bytes(3 * 1024u64.pow(5)), "3.00 PB");
    }
}
