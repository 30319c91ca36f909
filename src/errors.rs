//! Typed error definitions for lms_move.
//! One variant per failure stage so the caller can name the stage that broke.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Target already exists: {0} (choose overwrite or link-only)")]
    TargetExists(PathBuf),

    #[error("Copy failed: {cause}")]
    CopyFailed { cause: String },

    #[error("Could not remove source {path}: {cause}")]
    SourceStillPresent { path: PathBuf, cause: String },

    #[error("Could not create junction {link} -> {target}: {cause}")]
    JunctionCreate {
        link: PathBuf,
        target: PathBuf,
        cause: String,
    },

    #[error("Permission denied on {path}: {cause}")]
    PermissionDenied { path: PathBuf, cause: String },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl MigrateError {
    /// Stable machine-readable code used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            MigrateError::InvalidPath { .. } => "invalid_path",
            MigrateError::PathNotFound(_) => "path_not_found",
            MigrateError::TargetExists(_) => "target_exists",
            MigrateError::CopyFailed { .. } => "copy_failed",
            MigrateError::SourceStillPresent { .. } => "source_still_present",
            MigrateError::JunctionCreate { .. } => "junction_create",
            MigrateError::PermissionDenied { .. } => "permission_denied",
            MigrateError::Interrupted => "interrupted",
        }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MigrateError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn copy_failed(cause: impl Into<String>) -> Self {
        MigrateError::CopyFailed {
            cause: cause.into(),
        }
    }
}
