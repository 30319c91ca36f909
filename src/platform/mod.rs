//! Platform-specific helpers.
//! This module hides OS differences behind a uniform API so the rest of the
//! codebase can stay platform-agnostic.
//!
//! The product targets Windows; the Unix side exists so the pipeline builds and
//! can be exercised on development hosts, with a directory symlink standing in
//! for the NTFS junction.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{
    create_junction, decode_console_output, is_elevated, is_junction, junction_target,
    open_log_file_secure_append, write_config_secure_new,
};

#[cfg(windows)]
pub use windows::{
    create_junction, decode_console_output, is_elevated, is_junction, junction_target,
    open_log_file_secure_append, write_config_secure_new,
};

/// True when the migration primitives are the real thing (NTFS junctions).
pub const fn is_supported_host() -> bool {
    cfg!(windows)
}

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Unique hidden sibling name for atomic config writes.
/// Pattern: .lms_move.config.tmp.<pid>.<nanos>.<seq>
fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let name = format!(".lms_move.config.tmp.{pid}.{nanos}.{seq}");
    target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name)
}
