//! Path resolver.
//!
//! Turns raw user input (or config values) into a validated `MigrationRequest`:
//! - `~`, `%VAR%`, `$VAR` and `${VAR}` placeholders are expanded.
//! - Surrounding quotes and one trailing separator are stripped.
//! - Paths are made absolute, lexically normalized, and the existing part of
//!   the parent is canonicalized with `dunce` (no `\\?\` prefix).
//! - Source and target must be distinct and must not contain one another.
//!
//! Nothing here touches the filesystem beyond metadata reads.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::errors::MigrateError;
use crate::fs_ops::nearest_existing_ancestor;
use crate::platform;

/// How to treat a target that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationMode {
    /// Copy into a missing target; an existing target aborts the run.
    #[default]
    Copy,
    /// Empty the existing target, then copy.
    Overwrite,
    /// Trust the existing target's contents; skip the copy.
    LinkOnly,
}

impl MigrationMode {
    /// `link_only` wins when both flags are set.
    pub fn from_flags(overwrite: bool, link_only: bool) -> Self {
        match (overwrite, link_only) {
            (_, true) => MigrationMode::LinkOnly,
            (true, false) => MigrationMode::Overwrite,
            (false, false) => MigrationMode::Copy,
        }
    }

    pub fn overwrite_if_exists(self) -> bool {
        self == MigrationMode::Overwrite
    }

    pub fn link_only(self) -> bool {
        self == MigrationMode::LinkOnly
    }
}

/// A validated source/target pair. Only `resolve` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    source: PathBuf,
    target: PathBuf,
    mode: MigrationMode,
}

impl MigrationRequest {
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn mode(&self) -> MigrationMode {
        self.mode
    }

    pub fn overwrite_if_exists(&self) -> bool {
        self.mode.overwrite_if_exists()
    }

    pub fn link_only(&self) -> bool {
        self.mode.link_only()
    }
}

/// What currently sits at the destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    Missing,
    Directory { empty: bool },
    /// `points_to` is None when the reparse data cannot be read.
    Junction { points_to: Option<PathBuf> },
    NotADirectory,
}

impl TargetState {
    /// True for anything that requires Overwrite or LinkOnly to proceed.
    pub fn exists(&self) -> bool {
        !matches!(self, TargetState::Missing)
    }
}

/// The user's answer when the chosen target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAction {
    Reenter,
    Overwrite,
    LinkOnly,
    Abort,
}

impl TargetAction {
    /// Prompt order.
    pub const ALL: [TargetAction; 4] = [
        TargetAction::Overwrite,
        TargetAction::LinkOnly,
        TargetAction::Reenter,
        TargetAction::Abort,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TargetAction::Reenter => "Choose a different target path",
            TargetAction::Overwrite => "Overwrite: empty the target, then copy",
            TargetAction::LinkOnly => "Link only: keep the target contents, skip the copy",
            TargetAction::Abort => "Abort",
        }
    }

    /// Mode to run with, or None when the flow should re-prompt or stop.
    pub fn mode(self) -> Option<MigrationMode> {
        match self {
            TargetAction::Overwrite => Some(MigrationMode::Overwrite),
            TargetAction::LinkOnly => Some(MigrationMode::LinkOnly),
            TargetAction::Reenter | TargetAction::Abort => None,
        }
    }
}

/// Validate a source/target pair. `None` inputs fall back to `config`.
pub fn resolve(
    config: &Config,
    source_input: Option<&Path>,
    target_input: Option<&Path>,
    overwrite: bool,
    link_only: bool,
) -> Result<MigrationRequest, MigrateError> {
    let source = resolve_input(source_input.unwrap_or(config.source.as_path()))?;
    let target = resolve_input(target_input.unwrap_or(config.target.as_path()))?;

    if platform::is_junction(&source) {
        return Err(MigrateError::invalid(
            &source,
            "source is already a junction (was it migrated before?)",
        ));
    }
    if !source.exists() {
        return Err(MigrateError::invalid(&source, "source does not exist"));
    }
    if !source.is_dir() {
        return Err(MigrateError::invalid(&source, "source is not a directory"));
    }

    if same_path(&source, &target) {
        return Err(MigrateError::invalid(
            &target,
            "target is the same path as the source",
        ));
    }
    if is_within(&target, &source) {
        return Err(MigrateError::invalid(&target, "target is inside the source"));
    }
    if is_within(&source, &target) {
        return Err(MigrateError::invalid(&target, "source is inside the target"));
    }
    if target_state(&target) == TargetState::NotADirectory {
        return Err(MigrateError::invalid(
            &target,
            "target exists and is not a directory",
        ));
    }
    ensure_link_target_outside(&source, &target)?;

    Ok(MigrationRequest {
        source,
        target,
        mode: MigrationMode::from_flags(overwrite, link_only),
    })
}

/// Classify whatever sits at `path`. A junction is reported as such even when dangling.
pub fn target_state(path: &Path) -> TargetState {
    if platform::is_junction(path) {
        return TargetState::Junction {
            points_to: platform::junction_target(path).ok(),
        };
    }
    match fs::symlink_metadata(path) {
        Err(_) => TargetState::Missing,
        Ok(md) if md.is_dir() => {
            let empty = fs::read_dir(path)
                .map(|mut it| it.next().is_none())
                .unwrap_or(false);
            TargetState::Directory { empty }
        }
        Ok(_) => TargetState::NotADirectory,
    }
}

/// Where `path` really leads when it is a junction or symlink, None otherwise.
/// A dangling link falls back to its recorded destination.
pub fn link_destination(path: &Path) -> Option<PathBuf> {
    let TargetState::Junction { points_to } = target_state(path) else {
        return None;
    };
    if let Ok(real) = dunce::canonicalize(path) {
        return Some(real);
    }
    let dest = points_to?;
    let dest = match path.parent() {
        Some(parent) if dest.is_relative() => parent.join(dest),
        _ => dest,
    };
    Some(normalize_lexically(dunce::simplified(&dest)))
}

/// A target that is a link back into the source (or around it) would have the
/// source deleted out from under it.
pub(crate) fn ensure_link_target_outside(source: &Path, target: &Path) -> Result<(), MigrateError> {
    let Some(dest) = link_destination(target) else {
        return Ok(());
    };
    if same_path(&dest, source) || is_within(&dest, source) || is_within(source, &dest) {
        return Err(MigrateError::invalid(
            target,
            format!(
                "target is a link to '{}', which overlaps the source",
                dest.display()
            ),
        ));
    }
    Ok(())
}

/// Sanitize, expand and normalize one raw path.
pub fn resolve_input(raw: &Path) -> Result<PathBuf, MigrateError> {
    let cleaned = sanitize_input(&raw.to_string_lossy());
    if cleaned.is_empty() {
        return Err(MigrateError::invalid(raw, "empty path"));
    }
    let expanded = expand_placeholders(&cleaned)?;
    let mut path = PathBuf::from(expanded);
    if !path.is_absolute() {
        let cwd = env::current_dir()
            .map_err(|e| MigrateError::invalid(&path, format!("cannot read current dir: {e}")))?;
        path = cwd.join(path);
    }
    let path = normalize_lexically(&path);
    if path.file_name().is_none() {
        return Err(MigrateError::invalid(&path, "a drive or filesystem root cannot be used"));
    }
    Ok(canonicalize_parent(&path))
}

/// Trim one pair of quotes left by PowerShell/CMD and one trailing separator.
/// Apostrophes inside the path (`O'Brien`) are part of the name and kept.
pub fn sanitize_input(s: &str) -> String {
    let trimmed = s.trim();
    let mut inner = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    };

    // Keep "/" and "C:\" intact.
    if (inner.ends_with('\\') || inner.ends_with('/'))
        && inner.len() > 1
        && !(inner.len() == 3 && inner.as_bytes()[1] == b':')
    {
        inner.pop();
    }
    inner
}

/// Expand placeholders using the process environment.
pub fn expand_placeholders(raw: &str) -> Result<String, MigrateError> {
    expand_with(raw, |name| {
        env::var(name).ok().or_else(|| match name {
            "USERPROFILE" | "HOME" => dirs::home_dir().map(|h| h.to_string_lossy().into_owned()),
            _ => None,
        })
    })
}

/// Placeholder markers. `$` is a legal file-name character on Windows
/// (`C:\$Recycle.Bin`, `D:\Backup$Models`), so only `%VAR%` is expanded there.
#[cfg(windows)]
const MARKERS: &[char] = &['%'];
#[cfg(not(windows))]
const MARKERS: &[char] = &['%', '$'];

/// Expand `~`, `%VAR%` and, off Windows, `$VAR` / `${VAR}` with an injected lookup.
/// An unset `%VAR%` is an error. An unset `$VAR` and a lone `%` or `$` are kept
/// literally.
pub fn expand_with<F>(raw: &str, lookup: F) -> Result<String, MigrateError>
where
    F: Fn(&str) -> Option<String>,
{
    let resolve_var = |name: &str| {
        lookup(name).ok_or_else(|| {
            MigrateError::invalid(raw, format!("environment variable '{name}' is not set"))
        })
    };

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    if let Some(after) = rest.strip_prefix('~')
        && (after.is_empty() || after.starts_with(['/', '\\']))
    {
        let home = dirs::home_dir()
            .ok_or_else(|| MigrateError::invalid(raw, "cannot determine home directory"))?;
        out.push_str(&home.to_string_lossy());
        rest = after;
    }

    while let Some(pos) = rest.find(MARKERS) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(body) = tail.strip_prefix('%') {
            match body.find('%') {
                Some(end) if end > 0 && is_var_name(&body[..end]) => {
                    out.push_str(&resolve_var(&body[..end])?);
                    rest = &body[end + 1..];
                }
                _ => {
                    out.push('%');
                    rest = body;
                }
            }
        } else {
            let body = &tail[1..];
            if let Some(braced) = body.strip_prefix('{')
                && let Some(end) = braced.find('}')
                && is_var_name(&braced[..end])
            {
                match lookup(&braced[..end]) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&tail[..end + 3]),
                }
                rest = &braced[end + 1..];
                continue;
            }
            let len = body
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(body.len());
            match (len > 0).then(|| lookup(&body[..len])).flatten() {
                Some(value) => out.push_str(&value),
                None => out.push_str(&tail[..len + 1]),
            }
            rest = &body[len..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_var_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '(' | ')'))
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the existing part of the parent, keep the leaf as typed.
/// The leaf itself may be a junction, which must not be followed here.
fn canonicalize_parent(path: &Path) -> PathBuf {
    let (Some(parent), Some(leaf)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let Some(existing) = nearest_existing_ancestor(parent) else {
        return path.to_path_buf();
    };
    let Ok(canon) = dunce::canonicalize(existing) else {
        return path.to_path_buf();
    };
    let remainder = parent.strip_prefix(existing).unwrap_or(Path::new(""));
    canon.join(remainder).join(leaf)
}

fn component_keys(p: &Path) -> Vec<String> {
    p.components()
        .map(|c| {
            let s = c.as_os_str().to_string_lossy();
            if cfg!(windows) {
                s.to_lowercase()
            } else {
                s.into_owned()
            }
        })
        .collect()
}

/// Equality with Windows case folding.
pub fn same_path(a: &Path, b: &Path) -> bool {
    component_keys(a) == component_keys(b)
}

/// True when `child` is strictly below `parent`.
pub fn is_within(child: &Path, parent: &Path) -> bool {
    let c = component_keys(child);
    let p = component_keys(parent);
    c.len() > p.len() && c.starts_with(&p)
}
