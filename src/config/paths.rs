//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log/lock paths and detects symlinked ancestors for safety.

use anyhow::{Result, anyhow};
use dirs::{config_dir, data_local_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// Config file location: `$LMS_MOVE_CONFIG` if set, else `<config_dir>/lms_move/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        let p = PathBuf::from(p);
        if p.as_os_str().is_empty() {
            return Err(anyhow!("{CONFIG_ENV} is set but empty"));
        }
        return Ok(p);
    }
    let base = config_dir().ok_or_else(|| anyhow!("could not determine a config directory"))?;
    Ok(base.join("lms_move").join("config.xml"))
}

/// Default log file: `<local data dir>/lms_move/lms_move.log`.
pub fn default_log_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("lms_move.log"))
}

/// Lock file guarding against two migrations running at once.
pub fn default_lock_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("lms_move.lock"))
}

fn app_data_dir() -> Result<PathBuf> {
    let base =
        data_local_dir().ok_or_else(|| anyhow!("could not determine a local data directory"))?;
    Ok(base.join("lms_move"))
}

/// Return true if any existing ancestor of `path` is a symlink (or junction).
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.as_os_str().is_empty() {
            break;
        }
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_override_wins() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("custom.xml");
        unsafe { env::set_var(CONFIG_ENV, &p) };
        let got = default_config_path().unwrap();
        unsafe { env::remove_var(CONFIG_ENV) };
        assert_eq!(got, p);
    }

    #[test]
    #[serial]
    fn default_path_ends_with_app_dir() {
        unsafe { env::remove_var(CONFIG_ENV) };
        if let Ok(p) = default_config_path() {
            assert!(p.ends_with(Path::new("lms_move").join("config.xml")));
        }
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let real = base.join("real");
        fs::create_dir_all(&real).unwrap();
        let link = base.join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("x.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("x.log")).unwrap());
    }
}
