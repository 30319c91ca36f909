//! Core library for `lms_move`.
//!
//! Moves a large directory (LM Studio's model cache by default) to another
//! location and leaves an NTFS junction at the old path, so programs that
//! still look there keep working.
//!
//! Pipeline: `resolve` -> `probe` -> `copy` -> verify -> remove source -> junction.
//! The destructive half lives in [`migrate::Migrator`]; everything before it
//! is read-only.

pub mod cli;
pub mod config;
pub mod copy;
pub mod errors;
pub mod fs_ops;
pub mod migrate;
pub mod output;
pub mod platform;
pub mod preflight;
pub mod probe;
pub mod resolve;
pub mod shutdown;

pub use config::{
    Config, LogLevel, default_config_path, default_lock_path, default_log_path,
    path_has_symlink_ancestor,
};
pub use copy::{CopyResult, CopyStrategy, ManualCopier, RobocopyCopier, select_strategy};
pub use errors::MigrateError;
pub use migrate::{JunctionBackend, LinkBackend, MigrationAborted, MigrationReport, Migrator, Stage};
pub use probe::{DirInfo, DirectoryStats, dir_info, format_bytes, probe};
pub use resolve::{
    MigrationMode, MigrationRequest, TargetAction, TargetState, expand_placeholders, resolve,
    target_state,
};
