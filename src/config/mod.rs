//! Config module.
//! Provides configuration types, default paths and XML loading.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{default_config_path, default_lock_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LMS_MOVE_CONFIG";

/// Where LM Studio keeps its cache unless told otherwise.
pub const SOURCE_DEFAULT: &str = "%USERPROFILE%\\.lmstudio";
pub const TARGET_DEFAULT: &str = "D:\\LMstudio_AIModels";

/// Substrings (lowercase) that identify a running LM Studio process.
pub const PROCESS_PATTERNS_DEFAULT: &[&str] = &["lmstudio", "lm studio"];

pub const ROBOCOPY_RETRIES_DEFAULT: u32 = 1;
pub const ROBOCOPY_WAIT_SECS_DEFAULT: u32 = 1;
