use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Prefix of in-flight copies; the mirror purge removes leftovers from a killed run.
pub(crate) const TEMP_PREFIX: &str = ".lms_move.";

/// Unique temp path inside `dst_dir` (safe to call from rayon workers).
pub(crate) fn unique_temp_path(dst_dir: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    dst_dir.join(format!("{TEMP_PREFIX}{pid}.{nanos}.{seq}.tmp"))
}

/// Remove a symlink or junction itself, never what it points to.
/// Directory links are directories to `remove_dir` on Windows.
pub(crate) fn remove_link(path: &Path) -> std::io::Result<()> {
    std::fs::remove_file(path).or_else(|_| std::fs::remove_dir(path))
}

/// Closest ancestor of `path` (inclusive) that exists on disk.
pub(crate) fn nearest_existing_ancestor(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|a| !a.as_os_str().is_empty() && a.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn temp_paths_are_unique() {
        let dir = Path::new("dest");
        let set: HashSet<_> = (0..64).map(|_| unique_temp_path(dir)).collect();
        assert_eq!(set.len(), 64);
    }

    #[test]
    fn nearest_ancestor_skips_missing_segments() {
        let td = tempfile::tempdir().unwrap();
        let deep = td.path().join("a").join("b").join("c");
        assert_eq!(nearest_existing_ancestor(&deep), Some(td.path()));
    }
}
