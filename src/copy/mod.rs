//! Copy engine.
//!
//! A `CopyStrategy` mirrors one directory tree onto another so that afterwards
//! the target holds exactly the source's contents. Two implementations:
//! - `RobocopyCopier` shells out to `robocopy /MIR` (Windows, preferred).
//! - `ManualCopier` walks the tree itself (walkdir + rayon).
//!
//! The strategy is picked once per run by `select_strategy`.

mod manual;
mod robocopy;

pub use manual::ManualCopier;
pub use robocopy::{RobocopyCopier, describe_exit, exit_is_success, robocopy_args};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::MigrateError;

/// Totals of what the target holds after a successful mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyResult {
    pub files_copied: u64,
    pub bytes_copied: u64,
}

/// A way of mirroring `source` onto `target`.
///
/// Implementations must be idempotent: running twice against the same pair
/// yields the same end state. Every failure is reported as
/// `MigrateError::CopyFailed` (or `Interrupted` on Ctrl-C).
pub trait CopyStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn copy(&self, source: &Path, target: &Path) -> Result<CopyResult, MigrateError>;
}

/// Program name probed on PATH.
pub const ROBOCOPY: &str = "robocopy";

/// Pick robocopy when it is on PATH, else the built-in mirror.
pub fn select_strategy(config: &Config) -> Box<dyn CopyStrategy> {
    select_strategy_with(|name| which::which(name).ok(), config)
}

/// Same as `select_strategy` with an injected PATH lookup.
pub fn select_strategy_with<F>(lookup: F, config: &Config) -> Box<dyn CopyStrategy>
where
    F: FnOnce(&str) -> Option<PathBuf>,
{
    if config.force_manual_copy {
        info!("manual copy forced by configuration");
        return Box::new(ManualCopier);
    }
    match lookup(ROBOCOPY) {
        Some(program) => {
            debug!(program = %program.display(), "robocopy found");
            Box::new(RobocopyCopier::new(
                program,
                config.robocopy_retries,
                config.robocopy_wait_secs,
            ))
        }
        None => {
            info!("robocopy not available; using built-in mirror copy");
            Box::new(ManualCopier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_robocopy_when_found() {
        let cfg = Config::default();
        let s = select_strategy_with(|_| Some(PathBuf::from("C:\\Windows\\System32\\robocopy.exe")), &cfg);
        assert_eq!(s.name(), "robocopy");
    }

    #[test]
    fn falls_back_when_missing() {
        let cfg = Config::default();
        let s = select_strategy_with(|_| None, &cfg);
        assert_eq!(s.name(), ManualCopier.name());
    }

    #[test]
    fn force_manual_skips_the_probe() {
        let cfg = Config {
            force_manual_copy: true,
            ..Config::default()
        };
        let s = select_strategy_with(|_| panic!("lookup must not run"), &cfg);
        assert_eq!(s.name(), ManualCopier.name());
    }
}
