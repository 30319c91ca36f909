//! Link operation: copy, verify, delete, link.
//!
//! State machine:
//! ```text
//! Init -> ClearTarget -> Copy -> RemoveSource -> CreateJunction -> Done
//!      \-> Copy ------/
//!      \-> (link-only) ----------> RemoveSource
//! ```
//! Any failure stops the run where it is. Nothing is rolled back: the source
//! is only deleted after a verified copy, and the junction is only created
//! once the source is gone. The one state that needs a human is a failed
//! junction after a successful delete; the abort says so and prints the
//! `mklink` command that finishes the job.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::copy::{CopyResult, CopyStrategy};
use crate::errors::MigrateError;
use crate::fs_ops::{describe_io_error, ensure_space_for_copy, is_access_problem, remove_link};
use crate::platform;
use crate::probe::{self, DirectoryStats};
use crate::resolve::{MigrationMode, MigrationRequest, ensure_link_target_outside, target_state};
use crate::shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    ClearTarget,
    Copy,
    RemoveSource,
    CreateJunction,
    Done,
}

impl Stage {
    /// Process exit code for a run that aborted in this stage.
    pub fn exit_code(self) -> u8 {
        match self {
            Stage::Init => 2,
            Stage::ClearTarget => 3,
            Stage::Copy => 4,
            Stage::RemoveSource => 5,
            Stage::CreateJunction => 6,
            Stage::Done => 1,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Init => "init",
            Stage::ClearTarget => "clear target",
            Stage::Copy => "copy",
            Stage::RemoveSource => "remove source",
            Stage::CreateJunction => "create junction",
            Stage::Done => "done",
        })
    }
}

/// Filesystem primitives the migrator needs for the destructive steps.
pub trait LinkBackend: Send + Sync {
    /// Remove a directory tree. A link at `path` is removed, not followed.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
    /// Create a junction at `link` pointing to `target`.
    fn create_junction(&self, link: &Path, target: &Path) -> io::Result<()>;
    fn is_junction(&self, path: &Path) -> bool;
}

/// The real thing: NTFS junctions (directory symlinks on dev hosts).
#[derive(Debug, Clone, Copy, Default)]
pub struct JunctionBackend;

impl LinkBackend for JunctionBackend {
    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        if platform::is_junction(path) {
            return remove_link(path);
        }
        match fs::remove_dir_all(path) {
            Err(e) if cfg!(windows) && e.kind() == io::ErrorKind::PermissionDenied => {
                // Read-only files block deletion on Windows.
                clear_readonly_tree(path);
                fs::remove_dir_all(path)
            }
            other => other,
        }
    }

    fn create_junction(&self, link: &Path, target: &Path) -> io::Result<()> {
        platform::create_junction(link, target)
    }

    fn is_junction(&self, path: &Path) -> bool {
        platform::is_junction(path)
    }
}

#[cfg(windows)]
fn clear_readonly_tree(root: &Path) {
    for entry in walkdir::WalkDir::new(root).follow_links(false).into_iter().flatten() {
        if let Ok(md) = entry.metadata() {
            let mut perms = md.permissions();
            if perms.readonly() {
                perms.set_readonly(false);
                let _ = fs::set_permissions(entry.path(), perms);
            }
        }
    }
}

#[cfg(not(windows))]
fn clear_readonly_tree(_root: &Path) {}

/// Outcome of a finished (or dry) run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub mode: MigrationMode,
    /// Stages completed, or planned when `dry_run` is set.
    pub stages: Vec<Stage>,
    /// Source size measured before the copy (None for link-only).
    pub baseline: Option<DirectoryStats>,
    pub copy: Option<CopyResult>,
    pub copier: Option<&'static str>,
    pub dry_run: bool,
}

/// A run that stopped before `Done`.
#[derive(Debug, Error)]
#[error("migration aborted during {stage}: {error}")]
pub struct MigrationAborted {
    pub stage: Stage,
    pub completed: Vec<Stage>,
    pub error: MigrateError,
}

impl MigrationAborted {
    /// True when the source is gone but no junction replaced it.
    pub fn needs_manual_completion(&self) -> bool {
        self.stage == Stage::CreateJunction
    }

    /// Command that finishes the job by hand, when one is needed.
    pub fn manual_fix(&self) -> Option<String> {
        match &self.error {
            MigrateError::JunctionCreate { link, target, .. } if self.needs_manual_completion() => {
                Some(format!(
                    "mklink /J \"{}\" \"{}\"",
                    link.display(),
                    target.display()
                ))
            }
            _ => None,
        }
    }

    pub fn exit_code(&self) -> u8 {
        if matches!(self.error, MigrateError::Interrupted) {
            130
        } else {
            self.stage.exit_code()
        }
    }
}

type StageObserver = Box<dyn Fn(Stage) + Send + Sync>;

pub struct Migrator {
    copier: Box<dyn CopyStrategy>,
    backend: Box<dyn LinkBackend>,
    check_space: bool,
    dry_run: bool,
    observer: Option<StageObserver>,
}

impl Migrator {
    pub fn new(copier: Box<dyn CopyStrategy>, backend: Box<dyn LinkBackend>) -> Self {
        Self {
            copier,
            backend,
            check_space: false,
            dry_run: false,
            observer: None,
        }
    }

    /// Compare free space on the target volume against the source size before copying.
    pub fn check_space(mut self, on: bool) -> Self {
        self.check_space = on;
        self
    }

    pub fn dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    /// Called as each stage starts (used for progress lines).
    pub fn on_stage(mut self, f: impl Fn(Stage) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    pub fn copier_name(&self) -> &'static str {
        self.copier.name()
    }

    /// Stages a run would go through, after the read-only Init checks.
    pub fn plan(&self, req: &MigrationRequest) -> Result<Vec<Stage>, MigrateError> {
        let source = req.source();
        if self.backend.is_junction(source) {
            return Err(MigrateError::invalid(source, "source is already a junction"));
        }
        if !source.is_dir() {
            return Err(MigrateError::invalid(source, "source is no longer a directory"));
        }

        // The target may have become a link into the source since `resolve`.
        ensure_link_target_outside(source, req.target())?;

        let target_exists = target_state(req.target()).exists();
        let mut stages = vec![Stage::Init];
        match (req.mode(), target_exists) {
            (MigrationMode::Copy, true) => {
                return Err(MigrateError::TargetExists(req.target().to_path_buf()));
            }
            (MigrationMode::LinkOnly, false) => {
                return Err(MigrateError::invalid(
                    req.target(),
                    "link-only needs an existing target directory",
                ));
            }
            (MigrationMode::Overwrite, true) => stages.extend([Stage::ClearTarget, Stage::Copy]),
            (MigrationMode::LinkOnly, true) => ensure_target_holds_source(source, req.target())?,
            (_, false) => stages.push(Stage::Copy),
        }
        stages.extend([Stage::RemoveSource, Stage::CreateJunction, Stage::Done]);
        Ok(stages)
    }

    /// Run the whole pipeline for `req`.
    pub fn linkify(&self, req: &MigrationRequest) -> Result<MigrationReport, MigrationAborted> {
        let mut completed: Vec<Stage> = Vec::new();
        let abort = |stage: Stage, completed: &[Stage], error: MigrateError| {
            error!(stage = %stage, code = error.code(), error = %error, "migration aborted");
            MigrationAborted {
                stage,
                completed: completed.to_vec(),
                error,
            }
        };
        let source = req.source();
        let target = req.target();

        self.enter(Stage::Init);
        let plan = self.plan(req).map_err(|e| abort(Stage::Init, &completed, e))?;
        let mut report = MigrationReport {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            mode: req.mode(),
            stages: Vec::new(),
            baseline: None,
            copy: None,
            copier: None,
            dry_run: self.dry_run,
        };

        if self.dry_run {
            for stage in &plan {
                info!(stage = %stage, "dry-run: would run stage");
            }
            report.stages = plan;
            return Ok(report);
        }
        if shutdown::is_requested() {
            return Err(abort(Stage::Init, &completed, MigrateError::Interrupted));
        }
        completed.push(Stage::Init);

        if plan.contains(&Stage::ClearTarget) {
            self.enter(Stage::ClearTarget);
            self.backend.remove_dir(target).map_err(|e| {
                abort(Stage::ClearTarget, &completed, io_to_error("clear target", target, &e))
            })?;
            completed.push(Stage::ClearTarget);
        }

        if plan.contains(&Stage::Copy) {
            self.enter(Stage::Copy);
            let (baseline, result) = self
                .copy_verified(source, target)
                .map_err(|e| abort(Stage::Copy, &completed, e))?;
            report.baseline = Some(baseline);
            report.copy = Some(result);
            report.copier = Some(self.copier.name());
            completed.push(Stage::Copy);
        } else {
            info!(target = %target.display(), "link-only: keeping existing target contents");
        }

        if shutdown::is_requested() {
            return Err(abort(Stage::RemoveSource, &completed, MigrateError::Interrupted));
        }

        self.enter(Stage::RemoveSource);
        self.remove_source(source)
            .map_err(|e| abort(Stage::RemoveSource, &completed, e))?;
        completed.push(Stage::RemoveSource);

        self.enter(Stage::CreateJunction);
        self.link(source, target)
            .map_err(|e| abort(Stage::CreateJunction, &completed, e))?;
        completed.push(Stage::CreateJunction);

        self.enter(Stage::Done);
        completed.push(Stage::Done);
        info!(
            link = %source.display(),
            target = %target.display(),
            "migration complete"
        );
        report.stages = completed;
        Ok(report)
    }

    fn enter(&self, stage: Stage) {
        info!(stage = %stage, "entering stage");
        if let Some(f) = &self.observer {
            f(stage);
        }
    }

    fn copy_verified(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<(DirectoryStats, CopyResult), MigrateError> {
        let baseline = probe::probe(source)?;
        info!(
            files = baseline.file_count,
            dirs = baseline.dir_count,
            size = %probe::format_bytes(baseline.total_bytes),
            "source measured"
        );
        if self.check_space {
            ensure_space_for_copy(target, baseline.total_bytes)?;
        }

        let result = self.copier.copy(source, target)?;
        let copied = DirectoryStats {
            total_bytes: result.bytes_copied,
            file_count: result.files_copied,
            dir_count: 0,
        };
        if !copied.covers(&baseline) {
            return Err(MigrateError::copy_failed(format!(
                "verification failed: target has {} files / {}, source had {} files / {}",
                result.files_copied,
                probe::format_bytes(result.bytes_copied),
                baseline.file_count,
                probe::format_bytes(baseline.total_bytes)
            )));
        }
        Ok((baseline, result))
    }

    fn remove_source(&self, source: &Path) -> Result<(), MigrateError> {
        self.backend
            .remove_dir(source)
            .map_err(|e| MigrateError::SourceStillPresent {
                path: source.to_path_buf(),
                cause: describe_io_error("remove source", source, &e),
            })?;
        if fs::symlink_metadata(source).is_ok() {
            return Err(MigrateError::SourceStillPresent {
                path: source.to_path_buf(),
                cause: "path still exists after removal".to_string(),
            });
        }
        Ok(())
    }

    fn link(&self, source: &Path, target: &Path) -> Result<(), MigrateError> {
        let junction_err = |cause: String| MigrateError::JunctionCreate {
            link: source.to_path_buf(),
            target: target.to_path_buf(),
            cause,
        };
        if let Err(e) = self.backend.create_junction(source, target) {
            warn!(
                "source was removed but the junction could not be created; run: mklink /J \"{}\" \"{}\"",
                source.display(),
                target.display()
            );
            return Err(junction_err(describe_io_error("create junction", source, &e)));
        }
        if !self.backend.is_junction(source) {
            return Err(junction_err("no junction present after creation".to_string()));
        }
        if !source.is_dir() {
            return Err(junction_err("junction does not resolve to a directory".to_string()));
        }
        Ok(())
    }
}

/// Link-only deletes the source without copying, so the target must already
/// hold at least as much as the source does.
fn ensure_target_holds_source(source: &Path, target: &Path) -> Result<(), MigrateError> {
    let have = probe::probe(target)?;
    if have.file_count == 0 && have.dir_count == 0 {
        return Err(MigrateError::invalid(
            target,
            "link-only target is empty; copy the data first or choose overwrite",
        ));
    }
    let need = probe::probe(source)?;
    if !have.covers(&need) {
        return Err(MigrateError::invalid(
            target,
            format!(
                "link-only target holds {} files / {} but the source has {} files / {}; \
                 copy the data first or choose overwrite",
                have.file_count,
                probe::format_bytes(have.total_bytes),
                need.file_count,
                probe::format_bytes(need.total_bytes)
            ),
        ));
    }
    Ok(())
}

fn io_to_error(op: &str, path: &Path, e: &io::Error) -> MigrateError {
    let cause = describe_io_error(op, path, e);
    if is_access_problem(e) {
        MigrateError::PermissionDenied {
            path: path.to_path_buf(),
            cause,
        }
    } else {
        MigrateError::copy_failed(cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::copy::ManualCopier;
    use crate::resolve::resolve;
    use assert_fs::prelude::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct CountingCopier {
        calls: Arc<AtomicUsize>,
        fail: bool,
        shrink: bool,
    }

    impl CopyStrategy for CountingCopier {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn copy(&self, source: &Path, target: &Path) -> Result<CopyResult, MigrateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MigrateError::copy_failed("simulated sharing violation"));
            }
            let mut res = ManualCopier.copy(source, target)?;
            if self.shrink {
                res.files_copied -= 1;
            }
            Ok(res)
        }
    }

    #[derive(Default, Clone)]
    struct ScriptedBackend {
        fail_remove: bool,
        fail_junction: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl LinkBackend for ScriptedBackend {
        fn remove_dir(&self, path: &Path) -> io::Result<()> {
            self.log.lock().unwrap().push("remove");
            if self.fail_remove {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "file in use"));
            }
            JunctionBackend.remove_dir(path)
        }
        fn create_junction(&self, link: &Path, target: &Path) -> io::Result<()> {
            self.log.lock().unwrap().push("junction");
            if self.fail_junction {
                return Err(io::Error::other("privilege not held"));
            }
            JunctionBackend.create_junction(link, target)
        }
        fn is_junction(&self, path: &Path) -> bool {
            JunctionBackend.is_junction(path)
        }
    }

    fn cache_tree() -> assert_fs::TempDir {
        let td = assert_fs::TempDir::new().unwrap();
        td.child("cache/models/qwen/q.gguf").write_binary(&[5u8; 2048]).unwrap();
        td.child("cache/settings.json").write_str("{}").unwrap();
        td.child("cache/empty").create_dir_all().unwrap();
        td
    }

    fn request(td: &assert_fs::TempDir, overwrite: bool, link_only: bool) -> MigrationRequest {
        let cfg = Config::new(td.path().join("cache"), td.path().join("moved"));
        resolve(&cfg, None, None, overwrite, link_only).unwrap()
    }

    fn migrator(copier: CountingCopier, backend: ScriptedBackend) -> Migrator {
        Migrator::new(Box::new(copier), Box::new(backend))
    }

    #[test]
    #[serial]
    fn full_run_leaves_junction_with_same_contents() {
        let td = cache_tree();
        let req = request(&td, false, false);
        let before = probe::probe(req.source()).unwrap();

        let report = Migrator::new(Box::new(ManualCopier), Box::new(JunctionBackend))
            .check_space(true)
            .linkify(&req)
            .unwrap();

        assert_eq!(
            report.stages,
            vec![Stage::Init, Stage::Copy, Stage::RemoveSource, Stage::CreateJunction, Stage::Done]
        );
        assert!(platform::is_junction(req.source()));
        assert_eq!(probe::probe(req.target()).unwrap(), before);
        assert_eq!(probe::probe(req.source()).unwrap(), before);
        assert_eq!(report.baseline, Some(before));
    }

    #[test]
    #[serial]
    fn existing_target_without_mode_aborts_at_init() {
        let td = cache_tree();
        td.child("moved/keep.txt").write_str("mine").unwrap();
        let copier = CountingCopier::default();
        let calls = copier.calls.clone();
        let err = migrator(copier, ScriptedBackend::default())
            .linkify(&request(&td, false, false))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Init);
        assert!(matches!(err.error, MigrateError::TargetExists(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(td.path().join("moved/keep.txt").is_file());
    }

    #[test]
    #[serial]
    fn link_only_without_target_aborts_at_init() {
        let td = cache_tree();
        let err = migrator(CountingCopier::default(), ScriptedBackend::default())
            .linkify(&request(&td, false, true))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Init);
        assert_eq!(err.error.code(), "invalid_path");
        assert!(td.path().join("cache").is_dir());
    }

    #[test]
    #[serial]
    fn overwrite_clears_stray_target_files() {
        let td = cache_tree();
        td.child("moved/stray.bin").write_str("junk").unwrap();
        let req = request(&td, true, false);
        let report = migrator(CountingCopier::default(), ScriptedBackend::default())
            .linkify(&req)
            .unwrap();
        assert!(report.stages.contains(&Stage::ClearTarget));
        assert!(!req.target().join("stray.bin").exists());
        assert!(req.target().join("settings.json").is_file());
    }

    #[test]
    #[serial]
    fn link_only_skips_copy() {
        let td = cache_tree();
        ManualCopier
            .copy(&td.path().join("cache"), &td.path().join("moved"))
            .unwrap();
        td.child("moved/already.gguf").write_str("present").unwrap();
        let copier = CountingCopier::default();
        let calls = copier.calls.clone();
        let req = request(&td, true, true);
        let report = migrator(copier, ScriptedBackend::default()).linkify(&req).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(report.copy.is_none());
        assert!(!report.stages.contains(&Stage::Copy));
        assert!(req.source().join("already.gguf").is_file());
    }

    #[test]
    #[serial]
    fn link_only_into_empty_target_aborts_at_init() {
        let td = cache_tree();
        td.child("moved").create_dir_all().unwrap();
        let backend = ScriptedBackend::default();
        let log = backend.log.clone();
        let err = migrator(CountingCopier::default(), backend)
            .linkify(&request(&td, false, true))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Init);
        assert!(err.error.to_string().contains("empty"), "got: {}", err.error);
        assert!(log.lock().unwrap().is_empty());
        assert!(td.path().join("cache/models/qwen/q.gguf").is_file());
    }

    #[test]
    #[serial]
    fn link_only_with_partial_target_aborts_at_init() {
        let td = cache_tree();
        td.child("moved/settings.json").write_str("{}").unwrap();
        let err = migrator(CountingCopier::default(), ScriptedBackend::default())
            .linkify(&request(&td, false, true))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Init);
        assert_eq!(err.error.code(), "invalid_path");
        assert!(td.path().join("cache/models/qwen/q.gguf").is_file());
    }

    #[test]
    #[serial]
    fn target_relinked_to_source_after_resolve_aborts_at_init() {
        let td = cache_tree();
        let req = request(&td, false, true);
        platform::create_junction(req.target(), req.source()).unwrap();
        let backend = ScriptedBackend::default();
        let log = backend.log.clone();
        let err = migrator(CountingCopier::default(), backend)
            .linkify(&req)
            .unwrap_err();
        assert_eq!(err.stage, Stage::Init);
        assert!(err.error.to_string().contains("overlaps the source"));
        assert!(log.lock().unwrap().is_empty());
        assert!(td.path().join("cache/models/qwen/q.gguf").is_file());
    }

    #[test]
    #[serial]
    fn failed_removal_never_creates_junction() {
        let td = cache_tree();
        let backend = ScriptedBackend {
            fail_remove: true,
            ..Default::default()
        };
        let log = backend.log.clone();
        let err = migrator(CountingCopier::default(), backend)
            .linkify(&request(&td, false, false))
            .unwrap_err();
        assert_eq!(err.stage, Stage::RemoveSource);
        assert!(matches!(err.error, MigrateError::SourceStillPresent { .. }));
        assert_eq!(err.exit_code(), 5);
        assert!(!err.needs_manual_completion());
        assert_eq!(*log.lock().unwrap(), vec!["remove"]);
        assert!(td.path().join("cache/settings.json").is_file());
    }

    #[test]
    #[serial]
    fn junction_failure_reports_manual_completion() {
        let td = cache_tree();
        let backend = ScriptedBackend {
            fail_junction: true,
            ..Default::default()
        };
        let req = request(&td, false, false);
        let err = migrator(CountingCopier::default(), backend).linkify(&req).unwrap_err();
        assert_eq!(err.stage, Stage::CreateJunction);
        assert!(err.needs_manual_completion());
        assert_eq!(err.exit_code(), 6);
        assert_eq!(
            err.completed,
            vec![Stage::Init, Stage::Copy, Stage::RemoveSource]
        );
        let fix = err.manual_fix().unwrap();
        assert!(fix.starts_with("mklink /J"));
        assert!(fix.contains(&req.target().display().to_string()));
        assert!(req.target().join("settings.json").is_file());
    }

    #[test]
    #[serial]
    fn copy_failure_keeps_source() {
        let td = cache_tree();
        let copier = CountingCopier {
            fail: true,
            ..Default::default()
        };
        let err = migrator(copier, ScriptedBackend::default())
            .linkify(&request(&td, false, false))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Copy);
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("sharing violation"));
        assert!(td.path().join("cache/models/qwen/q.gguf").is_file());
    }

    #[test]
    #[serial]
    fn short_copy_fails_verification() {
        let td = cache_tree();
        let copier = CountingCopier {
            shrink: true,
            ..Default::default()
        };
        let err = migrator(copier, ScriptedBackend::default())
            .linkify(&request(&td, false, false))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Copy);
        assert!(err.error.to_string().contains("verification failed"));
        assert!(!platform::is_junction(&td.path().join("cache")));
    }

    #[test]
    #[serial]
    fn dry_run_changes_nothing() {
        let td = cache_tree();
        let backend = ScriptedBackend::default();
        let log = backend.log.clone();
        let req = request(&td, false, false);
        let report = migrator(CountingCopier::default(), backend)
            .dry_run(true)
            .linkify(&req)
            .unwrap();
        assert!(report.dry_run);
        assert!(report.stages.contains(&Stage::Copy));
        assert!(log.lock().unwrap().is_empty());
        assert!(!req.target().exists());
        assert!(!platform::is_junction(req.source()));
    }

    #[test]
    #[serial]
    fn interrupted_before_removal_exits_130() {
        let td = cache_tree();
        shutdown::request();
        let err = migrator(CountingCopier::default(), ScriptedBackend::default())
            .linkify(&request(&td, false, false))
            .unwrap_err();
        shutdown::reset();
        assert_eq!(err.exit_code(), 130);
        assert!(td.path().join("cache/settings.json").is_file());
    }

    #[test]
    fn observer_sees_stages_in_order() {
        let td = cache_tree();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let req = request(&td, false, false);
        migrator(CountingCopier::default(), ScriptedBackend::default())
            .dry_run(true)
            .on_stage(move |s| sink.lock().unwrap().push(s))
            .linkify(&req)
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Stage::Init]);
    }

    #[test]
    fn stage_exit_codes_are_distinct() {
        let codes: Vec<u8> = [
            Stage::Init,
            Stage::ClearTarget,
            Stage::Copy,
            Stage::RemoveSource,
            Stage::CreateJunction,
        ]
        .iter()
        .map(|s| s.exit_code())
        .collect();
        assert_eq!(codes, vec![2, 3, 4, 5, 6]);
    }
}
