//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - With neither `--source` nor `--target` (or with `--cli`) the interactive flow runs.
//! - `--debug` is a shorthand for `--log-level debug`.
//! - `--link-only` wins over `--overwrite` when both are given.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::resolve::MigrationMode;

/// Relocate the LM Studio model cache and leave a junction behind.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Move the LM Studio model cache to another drive and link it back (Windows)"
)]
pub struct Args {
    /// Run the interactive prompt flow (default when no paths are given).
    #[arg(long, help = "Run the interactive prompt flow")]
    pub cli: bool,

    /// Accepted for compatibility with the windowed launcher; this build has no GUI.
    #[arg(long, hide = true)]
    pub gui: bool,

    /// Directory to relocate.
    #[arg(
        long,
        short = 's',
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        help = "Directory to relocate (default: %USERPROFILE%\\.lmstudio)"
    )]
    pub source: Option<PathBuf>,

    /// New home of the data.
    #[arg(
        long,
        short = 't',
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        help = "Where the data should live (default: D:\\LMstudio_AIModels)"
    )]
    pub target: Option<PathBuf>,

    #[arg(long, help = "If the target exists, empty it and copy again")]
    pub overwrite: bool,

    #[arg(
        long,
        help = "If the target exists, keep its contents and only create the junction"
    )]
    pub link_only: bool,

    /// Skip the confirmation prompt in non-interactive runs.
    #[arg(long, short = 'y', help = "Do not ask for confirmation")]
    pub yes: bool,

    /// Dry-run: log the planned stages but do not modify the filesystem.
    #[arg(
        long,
        help = "Show what would be done, but do not modify files/directories"
    )]
    pub dry_run: bool,

    #[arg(long, help = "Use the built-in mirror copy even if robocopy is available")]
    pub force_manual_copy: bool,

    /// Print source/target details and exit.
    #[arg(long, help = "Show details of the source and target directories and exit")]
    pub info: bool,

    #[arg(
        long,
        help = "Print the config file location used by lms_move and exit"
    )]
    pub print_config: bool,

    #[arg(long, help = "Write a commented template config file and exit")]
    pub init_config: bool,

    /// Explicit config file (overrides LMS_MOVE_CONFIG).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// True when the prompt flow should run.
    pub fn interactive(&self) -> bool {
        self.cli || (self.source.is_none() && self.target.is_none() && !self.info)
    }

    pub fn mode(&self) -> MigrationMode {
        MigrationMode::from_flags(self.overwrite, self.link_only)
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(s) = &self.source {
            cfg.source = s.clone();
        }
        if let Some(t) = &self.target {
            cfg.target = t.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.force_manual_copy {
            cfg.force_manual_copy = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_is_interactive() {
        let a = Args::parse_from(["lms_move"]);
        assert!(a.interactive());
        assert_eq!(a.mode(), MigrationMode::Copy);
    }

    #[test]
    fn info_alone_is_not_interactive() {
        assert!(!Args::parse_from(["lms_move", "--info"]).interactive());
    }

    #[test]
    fn gui_flag_parses() {
        let a = Args::parse_from(["lms_move", "--gui"]);
        assert!(a.gui);
    }

    #[test]
    fn debug_beats_log_level() {
        let a = Args::parse_from(["lms_move", "--log-level", "quiet", "-d"]);
        assert_eq!(a.effective_log_level(), Some(LogLevel::Debug));
    }
}
