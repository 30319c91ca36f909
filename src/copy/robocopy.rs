//! robocopy-backed mirror.
//!
//! robocopy's exit code is a bit field: 1 = files copied, 2 = extra files or
//! dirs in the destination (removed by /MIR), 4 = mismatched entries. Any
//! value of 8 or more means at least one copy failed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::errors::MigrateError;
use crate::platform;
use crate::probe;
use crate::shutdown;

use super::{CopyResult, CopyStrategy};

#[derive(Debug, Clone)]
pub struct RobocopyCopier {
    program: PathBuf,
    retries: u32,
    wait_secs: u32,
}

impl RobocopyCopier {
    pub fn new(program: impl Into<PathBuf>, retries: u32, wait_secs: u32) -> Self {
        Self {
            program: program.into(),
            retries,
            wait_secs,
        }
    }
}

/// Arguments for a metadata-preserving mirror that never descends into junctions.
pub fn robocopy_args(source: &Path, target: &Path, retries: u32, wait_secs: u32) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![source.into(), target.into()];
    args.extend(
        [
            "/MIR".to_string(),
            "/COPY:DAT".to_string(),
            "/DCOPY:DAT".to_string(),
            "/XJ".to_string(),
            format!("/R:{retries}"),
            format!("/W:{wait_secs}"),
            "/NP".to_string(),
            "/NFL".to_string(),
            "/NDL".to_string(),
        ]
        .map(OsString::from),
    );
    args
}

pub fn exit_is_success(code: i32) -> bool {
    (0..8).contains(&code)
}

/// One-line meaning of a robocopy exit code.
pub fn describe_exit(code: i32) -> String {
    if code < 0 {
        return format!("robocopy exit code {code} (abnormal termination)");
    }
    if code == 0 {
        return "robocopy exit code 0 (nothing to copy, already in sync)".to_string();
    }
    let mut parts = Vec::new();
    if code & 16 != 0 {
        parts.push("fatal error, no files copied");
    }
    if code & 8 != 0 {
        parts.push("some files or directories could not be copied");
    }
    if code & 4 != 0 {
        parts.push("mismatched files or directories detected");
    }
    if code & 2 != 0 {
        parts.push("extra files removed from target");
    }
    if code & 1 != 0 {
        parts.push("files copied");
    }
    format!("robocopy exit code {code} ({})", parts.join("; "))
}

/// Last non-empty lines of robocopy's output, for error messages.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    lines[lines.len().saturating_sub(n)..].join(" | ")
}

impl CopyStrategy for RobocopyCopier {
    fn name(&self) -> &'static str {
        "robocopy"
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<CopyResult, MigrateError> {
        let args = robocopy_args(source, target, self.retries, self.wait_secs);
        info!(
            program = %self.program.display(),
            src = %source.display(),
            dst = %target.display(),
            "running robocopy mirror"
        );
        let output = Command::new(&self.program).args(&args).output().map_err(|e| {
            MigrateError::copy_failed(crate::fs_ops::describe_io_error(
                "start robocopy",
                &self.program,
                &e,
            ))
        })?;

        let stdout = platform::decode_console_output(&output.stdout);
        let stderr = platform::decode_console_output(&output.stderr);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!(target: "robocopy", "{}", line.trim_end());
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!(target: "robocopy", "{}", line.trim_end());
        }

        if shutdown::is_requested() {
            return Err(MigrateError::Interrupted);
        }

        let Some(code) = output.status.code() else {
            return Err(MigrateError::copy_failed(
                "robocopy was terminated without an exit code",
            ));
        };
        if !exit_is_success(code) {
            let detail = tail_lines(&stdout, 6);
            return Err(MigrateError::copy_failed(if detail.is_empty() {
                describe_exit(code)
            } else {
                format!("{}: {detail}", describe_exit(code))
            }));
        }
        info!("{}", describe_exit(code));

        let stats = probe::probe(target).map_err(|e| {
            MigrateError::copy_failed(format!("robocopy finished but target cannot be read: {e}"))
        })?;
        Ok(CopyResult {
            files_copied: stats.file_count,
            bytes_copied: stats.total_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_below_eight_succeed() {
        for code in 0..8 {
            assert!(exit_is_success(code), "code {code}");
        }
        for code in [8, 9, 15, 16, 24] {
            assert!(!exit_is_success(code), "code {code}");
        }
        assert!(!exit_is_success(-1));
    }

    #[test]
    fn describe_names_every_bit() {
        let d = describe_exit(3);
        assert!(d.contains("files copied") && d.contains("extra files"));
        assert!(describe_exit(16).contains("fatal"));
        assert!(describe_exit(0).contains("already in sync"));
    }

    #[test]
    fn args_mirror_without_following_junctions() {
        let args = robocopy_args(Path::new("C:\\src"), Path::new("D:\\dst"), 2, 5);
        let strs: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(strs[0], "C:\\src");
        assert_eq!(strs[1], "D:\\dst");
        for flag in ["/MIR", "/COPY:DAT", "/DCOPY:DAT", "/XJ", "/R:2", "/W:5", "/NP"] {
            assert!(strs.iter().any(|s| s == flag), "missing {flag}");
        }
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail_lines("a\n\nb\nc\n", 2), "b | c");
        assert_eq!(tail_lines("", 3), "");
    }

    #[cfg(windows)]
    #[test]
    fn robocopy_mirror_matches_probe() {
        use assert_fs::prelude::*;
        let Ok(program) = which::which("robocopy") else {
            return;
        };
        let td = assert_fs::TempDir::new().unwrap();
        td.child("src/a.bin").write_binary(&[1u8; 64]).unwrap();
        td.child("src/sub/b.bin").write_binary(&[2u8; 32]).unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        let res = RobocopyCopier::new(program, 0, 0).copy(&src, &dst).unwrap();
        let want = probe::probe(&src).unwrap();
        assert_eq!(res.files_copied, want.file_count);
        assert_eq!(res.bytes_copied, want.total_bytes);
    }
}
