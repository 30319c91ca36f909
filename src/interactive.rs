//! Interactive prompt flow (`--cli`, or no paths on the command line).
//!
//! Source -> target -> what to do if the target exists -> preflight -> confirm -> run.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use lms_move::output as out;
use lms_move::resolve::resolve_input;
use lms_move::{
    Config, MigrationMode, Stage, TargetAction, TargetState, dir_info, platform, resolve,
    target_state,
};

use crate::app::{
    EXIT_CANCELLED, confirm, execute, gather_preflight, print_preflight, print_summary,
};

fn ask_path(prompt: &str, default: &Path) -> Result<String> {
    Ok(Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default.display().to_string())
        .interact_text()?)
}

/// Ask until we have an existing, non-junction source directory. None means the user gave up.
fn choose_source(cfg: &Config) -> Result<Option<PathBuf>> {
    let mut default = cfg.source.clone();
    loop {
        let raw = ask_path("LM Studio directory to move", &default)?;
        default = PathBuf::from(&raw);
        let path = match resolve_input(Path::new(&raw)) {
            Ok(p) => p,
            Err(e) => {
                out::print_error(&e.to_string());
                continue;
            }
        };
        let details = dir_info(&path);
        out::print_heading("Source");
        out::print_user(details.render().trim_end());

        if details.is_junction {
            out::print_error("This path is already a junction; it looks migrated already.");
            return Ok(None);
        }
        if !details.exists {
            if confirm("The directory does not exist. Create it?", false)? {
                fs::create_dir_all(&path)?;
                info!(path = %path.display(), "created source directory");
                return Ok(Some(path));
            }
            continue;
        }
        if !details.is_dir {
            out::print_error("That path is not a directory.");
            continue;
        }
        if details.is_empty() && !confirm("The directory is empty. Continue anyway?", false)? {
            continue;
        }
        return Ok(Some(path));
    }
}

/// Ask for the target and, when it exists, how to treat it.
fn choose_target(cfg: &Config) -> Result<Option<(PathBuf, MigrationMode)>> {
    let mut default = cfg.target.clone();
    loop {
        let raw = ask_path("New location for the data", &default)?;
        default = PathBuf::from(&raw);
        let path = match resolve_input(Path::new(&raw)) {
            Ok(p) => p,
            Err(e) => {
                out::print_error(&e.to_string());
                continue;
            }
        };
        let state = target_state(&path);
        match &state {
            TargetState::Missing => return Ok(Some((path, MigrationMode::Copy))),
            TargetState::NotADirectory => {
                out::print_error("That path exists and is not a directory.");
                continue;
            }
            TargetState::Directory { .. } | TargetState::Junction { .. } => {}
        }

        out::print_heading("Target (already exists)");
        out::print_user(dir_info(&path).render().trim_end());
        let labels: Vec<&str> = TargetAction::ALL.iter().map(|a| a.label()).collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("The target already exists. What should happen?")
            .items(&labels)
            .default(0)
            .interact()?;
        let action = TargetAction::ALL[choice];
        match action.mode() {
            Some(mode) => return Ok(Some((path, mode))),
            None if action == TargetAction::Abort => return Ok(None),
            None => continue,
        }
    }
}

/// Returns the process exit code.
pub fn run(cfg: &Config) -> Result<u8> {
    out::print_heading("LM Studio cache relocation");
    if !platform::is_elevated() {
        out::print_warn("Not running as administrator; the junction step may need elevation.");
    }

    let Some(source) = choose_source(cfg)? else {
        return Ok(EXIT_CANCELLED);
    };
    let Some((target, mode)) = choose_target(cfg)? else {
        out::print_info("Aborted; nothing was changed.");
        return Ok(EXIT_CANCELLED);
    };

    let req = match resolve(
        cfg,
        Some(source.as_path()),
        Some(target.as_path()),
        mode.overwrite_if_exists(),
        mode.link_only(),
    ) {
        Ok(r) => r,
        Err(e) => {
            out::print_error(&e.to_string());
            return Ok(Stage::Init.exit_code());
        }
    };

    let report = gather_preflight(cfg, &req);
    print_preflight(&report);
    if !report.running.is_empty() && !confirm("LM Studio seems to be running. Continue anyway?", false)? {
        return Ok(EXIT_CANCELLED);
    }

    print_summary(&req);
    if !confirm("Proceed?", false)? {
        out::print_info("Cancelled; nothing was changed.");
        return Ok(EXIT_CANCELLED);
    }
    Ok(execute(cfg, &req))
}
