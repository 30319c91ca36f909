//! Atomic replace of a mirrored file.
//! - On Windows, removes an existing destination first (MoveFile doesn't overwrite).
//! - On Unix, best-effort fsync of the destination directory after rename.

use std::fs;
use std::io;
use std::path::Path;

pub(crate) fn replace_file(tmp: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if let Err(e) = fs::remove_file(dst) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e);
            }
        }
    }

    fs::rename(tmp, dst)?;

    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // A failed dir fsync does not undo a successful rename.
        let _ = fs::File::open(parent).and_then(|d| d.sync_all());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replaces_existing_destination() {
        let td = tempdir().unwrap();
        let tmp = td.path().join(".tmp");
        let dst = td.path().join("model.gguf");
        fs::write(&tmp, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        replace_file(&tmp, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");
        assert!(!tmp.exists());
    }
}
