//! Core configuration types.
//! - Config holds runtime settings with sensible defaults and is passed
//!   explicitly to the resolver and migrator.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{
    PROCESS_PATTERNS_DEFAULT, ROBOCOPY_RETRIES_DEFAULT, ROBOCOPY_WAIT_SECS_DEFAULT, SOURCE_DEFAULT,
    TARGET_DEFAULT,
};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one migration run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory to relocate; may contain `%VAR%` or `~` placeholders (`$VAR` too, off Windows)
    pub source: PathBuf,
    /// Where the data should live afterwards
    pub target: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Lowercase substrings matched against running process names
    pub process_patterns: Vec<String>,
    /// robocopy /R: value
    pub robocopy_retries: u32,
    /// robocopy /W: value (seconds)
    pub robocopy_wait_secs: u32,
    /// Skip the robocopy probe and always use the built-in mirror copy
    pub force_manual_copy: bool,
    /// Compare free space at the target against the source size before copying
    pub check_space: bool,
    /// If true, log the planned stages but do not modify the filesystem
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from(SOURCE_DEFAULT),
            target: PathBuf::from(TARGET_DEFAULT),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
            process_patterns: PROCESS_PATTERNS_DEFAULT
                .iter()
                .map(|s| s.to_string())
                .collect(),
            robocopy_retries: ROBOCOPY_RETRIES_DEFAULT,
            robocopy_wait_secs: ROBOCOPY_WAIT_SECS_DEFAULT,
            force_manual_copy: false,
            check_space: true,
            dry_run: false,
        }
    }
}

impl Config {
    /// Construct a Config with explicit paths; other fields use defaults.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }
}
