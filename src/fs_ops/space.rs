//! Free-space check ahead of a copy.

use std::path::Path;

use crate::errors::MigrateError;
use crate::probe::format_bytes;

use super::util::nearest_existing_ancestor;

/// Headroom kept free on the target volume beyond the data itself.
const CUSHION: u64 = 64 * 1024 * 1024;

/// Fail with CopyFailed when the volume holding `target` cannot take `required` bytes.
/// `target` itself may not exist yet; the nearest existing ancestor is measured.
pub(crate) fn ensure_space_for_copy(target: &Path, required: u64) -> Result<(), MigrateError> {
    let Some(probe_at) = nearest_existing_ancestor(target) else {
        return Err(MigrateError::invalid(
            target,
            "no existing ancestor to measure free space on",
        ));
    };
    let free = fs2::available_space(probe_at).map_err(|e| {
        MigrateError::copy_failed(crate::fs_ops::describe_io_error(
            "query free space",
            probe_at,
            &e,
        ))
    })?;
    if free < required.saturating_add(CUSHION) {
        return Err(MigrateError::copy_failed(format!(
            "not enough free space at '{}': need ~{}, free {}",
            probe_at.display(),
            format_bytes(required),
            format_bytes(free)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_copy_fits() {
        let td = tempfile::tempdir().unwrap();
        ensure_space_for_copy(&td.path().join("not").join("yet"), 1024).unwrap();
    }

    #[test]
    fn absurd_copy_is_rejected() {
        let td = tempfile::tempdir().unwrap();
        let err = ensure_space_for_copy(td.path(), u64::MAX - 1).unwrap_err();
        assert_eq!(err.code(), "copy_failed");
        assert!(err.to_string().contains("not enough free space"));
    }
}
