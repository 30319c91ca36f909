//! Windows implementations of platform helpers.
//!
//! Notes:
//! - Junctions are created through the `junction` crate (FSCTL_SET_REPARSE_POINT),
//!   not by shelling out to `mklink /J`.
//! - We do not manage ACLs; config writes are temp + rename to be atomic.

use anyhow::{Result, bail};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use windows_sys::Win32::Globalization::{GetOEMCP, MultiByteToWideChar};
use windows_sys::Win32::UI::Shell::IsUserAnAdmin;

use super::tmp_sibling_name;

/// Open log file for appending (best-effort; no symlink defense available via std on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write a new config file atomically using a temp file + rename.
/// Fails if the target already exists.
pub fn write_config_secure_new(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = tmp_sibling_name(path);
    let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Whether the process token belongs to the Administrators group (elevated).
pub fn is_elevated() -> bool {
    // SAFETY: IsUserAnAdmin takes no arguments and only inspects the current token.
    unsafe { IsUserAnAdmin() != 0 }
}

/// Create an NTFS junction at `link` pointing to `target`.
/// `link` must not exist; `target` should be an existing directory.
pub fn create_junction(link: &Path, target: &Path) -> io::Result<()> {
    junction::create(target, link)
}

/// True if `path` itself is a junction (the reparse point is not followed).
pub fn is_junction(path: &Path) -> bool {
    junction::exists(path).unwrap_or(false)
}

/// Directory a junction points to.
pub fn junction_target(path: &Path) -> io::Result<PathBuf> {
    junction::get_target(path)
}

/// Decode output of console tools such as robocopy, which write in the OEM
/// code page when redirected (CP 437/850/936/...), not UTF-8.
pub fn decode_console_output(bytes: &[u8]) -> String {
    let lossy = || String::from_utf8_lossy(bytes).into_owned();
    if bytes.is_empty() {
        return String::new();
    }
    let Ok(len) = i32::try_from(bytes.len()) else {
        return lossy();
    };
    // SAFETY: GetOEMCP has no preconditions. The first call only measures; the
    // pointer/length pair describes `bytes` exactly.
    let (cp, wide_len) = unsafe {
        let cp = GetOEMCP();
        (cp, MultiByteToWideChar(cp, 0, bytes.as_ptr(), len, std::ptr::null_mut(), 0))
    };
    if wide_len <= 0 {
        return lossy();
    }
    let mut wide = vec![0u16; wide_len as usize];
    // SAFETY: `wide` has room for exactly `wide_len` UTF-16 units.
    let written =
        unsafe { MultiByteToWideChar(cp, 0, bytes.as_ptr(), len, wide.as_mut_ptr(), wide_len) };
    if written <= 0 {
        return lossy();
    }
    wide.truncate(written as usize);
    String::from_utf16_lossy(&wide)
}
