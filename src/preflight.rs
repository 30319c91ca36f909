//! Checks shown to the user before anything is touched.
//! None of them block a run by themselves; the caller decides.

use std::ffi::OsStr;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use crate::config::Config;
use crate::fs_ops::nearest_existing_ancestor;
use crate::platform;
use crate::probe::{DirectoryStats, format_bytes};
use crate::resolve::MigrationRequest;

#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub elevated: bool,
    /// Names of running processes that look like LM Studio.
    pub running: Vec<String>,
    /// Free bytes on the target volume, when it could be measured.
    pub free_space: Option<u64>,
    /// Bytes the copy will need (source size), when a copy is planned.
    pub required: Option<u64>,
}

impl PreflightReport {
    pub fn space_ok(&self) -> bool {
        match (self.free_space, self.required) {
            (Some(free), Some(need)) => free >= need,
            _ => true,
        }
    }

    /// Human readable warnings, empty when everything looks fine.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.elevated {
            out.push(
                "Not running as administrator. Creating the junction may fail; \
                 if it does you will be given the command to finish by hand."
                    .to_string(),
            );
        }
        if !self.running.is_empty() {
            out.push(format!(
                "LM Studio appears to be running ({}). Close it first, open files cannot be moved.",
                self.running.join(", ")
            ));
        }
        if !self.space_ok()
            && let (Some(free), Some(need)) = (self.free_space, self.required)
        {
            out.push(format!(
                "Target volume has {} free but the source needs {}.",
                format_bytes(free),
                format_bytes(need)
            ));
        }
        out
    }
}

/// Process names containing any of `patterns` (case-insensitive). Sorted, deduplicated.
pub fn matching_processes<'a, I>(names: I, patterns: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a OsStr>,
{
    let mut hits: Vec<String> = names
        .into_iter()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|name| {
            let lower = name.to_lowercase();
            patterns
                .iter()
                .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
        })
        .collect();
    hits.sort();
    hits.dedup();
    hits
}

/// Scan the process table for LM Studio.
pub fn find_running_processes(patterns: &[String]) -> Vec<String> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing(),
    );
    let hits = matching_processes(system.processes().values().map(|p| p.name()), patterns);
    debug!(count = hits.len(), "process scan done");
    hits
}

/// Gather the preflight report. `baseline` is the probed source when a copy is planned.
pub fn run(
    config: &Config,
    req: &MigrationRequest,
    baseline: Option<&DirectoryStats>,
) -> PreflightReport {
    let free_space = nearest_existing_ancestor(req.target()).and_then(|p| fs2::available_space(p).ok());
    PreflightReport {
        elevated: platform::is_elevated(),
        running: find_running_processes(&config.process_patterns),
        free_space,
        required: baseline.map(|b| b.total_bytes),
    }
}
