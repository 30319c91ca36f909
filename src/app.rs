//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler, takes the
//! single-instance lock and dispatches to the info, interactive or direct flow.

use anyhow::{Context, Result};
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use std::process::ExitCode;
use tracing::{debug, error, info};

use lms_move::cli::Args;
use lms_move::config::{CONFIG_ENV, create_template_config, load_config};
use lms_move::fs_ops::try_acquire_instance_lock;
use lms_move::output as out;
use lms_move::preflight::{self, PreflightReport};
use lms_move::resolve::resolve_input;
use lms_move::{
    Config, JunctionBackend, MigrationAborted, MigrationMode, MigrationReport, MigrationRequest,
    Migrator, Stage, default_config_path, default_lock_path, dir_info, format_bytes, platform,
    probe, resolve, select_strategy, shutdown,
};

use crate::interactive;
use crate::logging::init_tracing;

/// Exit code when the user declines at a prompt.
pub(crate) const EXIT_CANCELLED: u8 = 1;

/// Run the CLI application.
pub fn run(args: Args) -> ExitCode {
    match run_inner(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "lms_move failed");
            out::print_error(&format!("{e:#}"));
            ExitCode::from(EXIT_CANCELLED)
        }
    }
}

fn run_inner(args: Args) -> Result<u8> {
    if args.gui {
        out::print_error(
            "This build of lms_move has no graphical front-end. \
             Run it without --gui for the interactive terminal flow.",
        );
        return Ok(Stage::Init.exit_code());
    }

    // Config commands run before logging init
    if args.print_config {
        print_config(&args);
        return Ok(0);
    }
    if args.init_config {
        let path = match &args.config {
            Some(p) => p.clone(),
            None => default_config_path()?,
        };
        create_template_config(&path)?;
        out::print_success(&format!("A template config was written to: {}", path.display()));
        out::print_info("Edit `source` and `target` there, then run lms_move again.");
        return Ok(0);
    }

    let (mut cfg, cfg_path) = match load_config(args.config.as_deref())? {
        Some((cfg, path)) => (cfg, Some(path)),
        None => (Config::default(), None),
    };
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("Interrupt received; stopping after the current step...");
    })
    .context("install Ctrl-C handler")?;

    debug!(?args, config = ?cfg_path, "starting lms_move");

    if args.info {
        return Ok(info_command(&cfg));
    }

    if !platform::is_supported_host() && !cfg.dry_run {
        out::print_error(
            "lms_move only migrates on Windows (it creates NTFS junctions). \
             --info and --dry-run work everywhere.",
        );
        return Ok(Stage::Init.exit_code());
    }

    let lock_path = default_lock_path()?;
    let Some(_lock) = try_acquire_instance_lock(&lock_path)
        .with_context(|| format!("open lock file '{}'", lock_path.display()))?
    else {
        out::print_error("Another lms_move run is already in progress.");
        return Ok(Stage::Init.exit_code());
    };

    let code = if args.interactive() {
        interactive::run(&cfg)?
    } else {
        direct(&cfg, &args)?
    };

    drop(guard);
    Ok(code)
}

fn print_config(args: &Args) {
    if let Some(p) = &args.config {
        out::print_info(&format!("Using --config (explicit):\n  {}\n", p.display()));
        return;
    }
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {}\n", cfg_env));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default lms_move config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run with --init-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

fn info_command(cfg: &Config) -> u8 {
    for (title, raw) in [("Source", &cfg.source), ("Target", &cfg.target)] {
        out::print_heading(title);
        match resolve_input(raw) {
            Ok(path) => out::print_user(dir_info(&path).render().trim_end()),
            Err(e) => out::print_error(&e.to_string()),
        }
    }
    0
}

/// Non-interactive run driven entirely by flags and config.
fn direct(cfg: &Config, args: &Args) -> Result<u8> {
    let req = match resolve(cfg, None, None, args.overwrite, args.link_only) {
        Ok(r) => r,
        Err(e) => {
            error!(code = e.code(), error = %e, "invalid paths");
            out::print_error(&e.to_string());
            return Ok(Stage::Init.exit_code());
        }
    };
    let report = gather_preflight(cfg, &req);
    print_preflight(&report);

    if !args.yes && !cfg.dry_run {
        if !atty::is(atty::Stream::Stdin) {
            out::print_error("Refusing to run without confirmation; pass --yes.");
            return Ok(EXIT_CANCELLED);
        }
        print_summary(&req);
        if !confirm("Proceed with the migration?", false)? {
            out::print_info("Cancelled; nothing was changed.");
            return Ok(EXIT_CANCELLED);
        }
    }
    Ok(execute(cfg, &req))
}

pub(crate) fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Preflight for `req`; the source is only probed when a copy is planned.
pub(crate) fn gather_preflight(cfg: &Config, req: &MigrationRequest) -> PreflightReport {
    let baseline = if req.link_only() {
        None
    } else {
        probe(req.source()).ok()
    };
    preflight::run(cfg, req, baseline.as_ref())
}

pub(crate) fn print_preflight(report: &PreflightReport) {
    for w in report.warnings() {
        out::print_warn(&w);
    }
}

pub(crate) fn print_summary(req: &MigrationRequest) {
    out::print_heading("Plan");
    out::print_user(&format!("Source: {}", req.source().display()));
    out::print_user(&format!("Target: {}", req.target().display()));
    out::print_user(match req.mode() {
        MigrationMode::Copy => "Mode:   copy, delete source, create junction",
        MigrationMode::Overwrite => "Mode:   empty target, copy, delete source, create junction",
        MigrationMode::LinkOnly => "Mode:   keep target contents, delete source, create junction",
    });
}

fn announce(stage: Stage) {
    match stage {
        Stage::ClearTarget => out::print_info("Clearing the existing target..."),
        Stage::Copy => out::print_info("Copying files (large models can take a while)..."),
        Stage::RemoveSource => out::print_info("Removing the original directory..."),
        Stage::CreateJunction => out::print_info("Creating the junction..."),
        Stage::Init | Stage::Done => {}
    }
}

/// Run the migration and report the outcome. Returns the process exit code.
pub(crate) fn execute(cfg: &Config, req: &MigrationRequest) -> u8 {
    let migrator = Migrator::new(select_strategy(cfg), Box::new(JunctionBackend))
        .check_space(cfg.check_space)
        .dry_run(cfg.dry_run)
        .on_stage(announce);
    info!(copier = migrator.copier_name(), "starting migration");
    match migrator.linkify(req) {
        Ok(report) => {
            print_report(&report);
            0
        }
        Err(aborted) => {
            print_abort(&aborted);
            aborted.exit_code()
        }
    }
}

fn print_report(report: &MigrationReport) {
    if report.dry_run {
        let stages: Vec<String> = report.stages.iter().map(|s| s.to_string()).collect();
        out::print_info(&format!("Dry-run: would run {}", stages.join(" -> ")));
        out::print_info("Nothing was changed.");
        return;
    }
    if let Some(copy) = report.copy {
        out::print_success(&format!(
            "Copied {} files ({}) with {}.",
            copy.files_copied,
            format_bytes(copy.bytes_copied),
            report.copier.unwrap_or("the copier")
        ));
    }
    out::print_success(&format!(
        "Done. {} now points to {}.",
        report.source.display(),
        report.target.display()
    ));
}

fn print_abort(aborted: &MigrationAborted) {
    out::print_error(&format!("Stopped during {}: {}", aborted.stage, aborted.error));
    if let Some(fix) = aborted.manual_fix() {
        out::print_warn(
            "The original directory was removed but the junction was not created. \
             Your data is safe in the target. Finish from an elevated Command Prompt:",
        );
        out::print_user(&format!("  {fix}"));
        return;
    }
    match aborted.stage {
        Stage::Init | Stage::ClearTarget | Stage::Copy => {
            out::print_info("The original directory was not touched.");
        }
        Stage::RemoveSource => {
            out::print_info(
                "The copy is complete but the original could not be fully removed. \
                 Close LM Studio, delete what is left of it, then rerun with --link-only.",
            );
        }
        Stage::CreateJunction | Stage::Done => {}
    }
}
