//! I/O error helpers.
//!
//! Enrich io::Error with the operation, the path and an actionable hint. The
//! text ends up verbatim in CopyFailed / SourceStillPresent / JunctionCreate
//! causes, so it has to make sense to someone staring at a failed migration.
//!
//! Usage:
//!   fs::remove_dir_all(p).map_err(|e| describe_io_error("remove source", p, &e))?;

use std::io;
use std::path::Path;

/// Format a human-friendly message with op/path plus platform-aware hints.
pub fn describe_io_error(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str("; permission denied, check ownership and write permissions");
                }
                libc::EBUSY | libc::ETXTBSY => {
                    msg.push_str("; resource busy, make sure no program is using these files");
                }
                libc::ENOENT => msg.push_str("; path not found"),
                libc::EEXIST => msg.push_str("; already exists"),
                libc::ENOSPC => msg.push_str("; insufficient space on device"),
                libc::EROFS => msg.push_str("; read-only filesystem"),
                libc::ENAMETOOLONG => {
                    msg.push_str("; filename or path too long, shorten path segments");
                }
                libc::ENOTEMPTY => msg.push_str("; directory not empty"),
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str("; access denied, run as administrator and close LM Studio"), // ERROR_ACCESS_DENIED
                32 | 33 => msg.push_str("; file is in use, close LM Studio and retry"), // SHARING / LOCK VIOLATION
                2 | 3 => msg.push_str("; path not found"), // FILE / PATH NOT FOUND
                80 | 183 => msg.push_str("; already exists"), // FILE_EXISTS / ALREADY_EXISTS
                39 | 112 => msg.push_str("; insufficient disk space"), // HANDLE_DISK_FULL / DISK_FULL
                19 => msg.push_str("; write protected media"), // ERROR_WRITE_PROTECT
                145 => msg.push_str("; directory not empty"), // ERROR_DIR_NOT_EMPTY
                206 => msg.push_str("; path too long (MAX_PATH exceeded)"), // ERROR_FILENAME_EXCED_RANGE
                1314 => {
                    msg.push_str("; privilege not held, run as administrator or enable Developer Mode")
                } // ERROR_PRIVILEGE_NOT_HELD
                1 | 50 => msg.push_str("; operation not supported here, junctions need an NTFS volume"), // INVALID_FUNCTION / NOT_SUPPORTED
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => msg.push_str("; permission denied"),
            io::ErrorKind::NotFound => msg.push_str("; path not found"),
            io::ErrorKind::AlreadyExists => msg.push_str("; already exists"),
            _ => {}
        }
    }

    msg
}

/// Whether the error means "someone else has the file open / we lack rights",
/// which for this tool almost always means LM Studio is still running.
pub fn is_access_problem(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    match e.raw_os_error() {
        #[cfg(windows)]
        Some(5 | 32 | 33) => true,
        #[cfg(unix)]
        Some(libc::EBUSY) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notfound_fallback_hint_includes_path() {
        let p = Path::new("/nonexistent/path/for/test");
        let msg = describe_io_error("open", p, &io::Error::from(io::ErrorKind::NotFound));
        assert!(msg.contains("open"));
        assert!(msg.contains(p.to_string_lossy().as_ref()));
        assert!(msg.contains("path not found"));
    }

    #[cfg(unix)]
    #[test]
    fn enospc_hint_and_code_present() {
        let msg = describe_io_error(
            "write",
            Path::new("/tmp"),
            &io::Error::from_raw_os_error(libc::ENOSPC),
        );
        assert!(msg.contains("insufficient space"), "msg was: {msg}");
        assert!(msg.contains("os code"));
    }

    #[cfg(windows)]
    #[test]
    fn sharing_violation_points_at_lm_studio() {
        let msg = describe_io_error("remove", Path::new("C:\\x"), &io::Error::from_raw_os_error(32));
        assert!(msg.contains("close LM Studio"), "msg was: {msg}");
    }

    #[test]
    fn access_problem_detection() {
        assert!(is_access_problem(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_access_problem(&io::Error::from(io::ErrorKind::NotFound)));
    }
}
