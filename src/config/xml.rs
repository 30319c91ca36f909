//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request (`--init-config`).
//!
//! Notes:
//! - Only reads/writes the config file; path validation happens in the resolver.
//! - Unknown XML fields are a hard error to surface typos early.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::{
    CONFIG_ENV, PROCESS_PATTERNS_DEFAULT, ROBOCOPY_RETRIES_DEFAULT, ROBOCOPY_WAIT_SECS_DEFAULT,
    SOURCE_DEFAULT, TARGET_DEFAULT,
};

use crate::config::types::{Config, LogLevel};
use crate::platform::write_config_secure_new;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    source: Option<String>,
    target: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    /// Comma-separated list, e.g. "lmstudio, lm studio"
    process_patterns: Option<String>,
    #[serde(default, deserialize_with = "de_u32_trimmed_opt")]
    robocopy_retries: Option<u32>,
    #[serde(default, deserialize_with = "de_u32_trimmed_opt")]
    robocopy_wait_secs: Option<u32>,
    force_manual_copy: Option<bool>,
    check_space: Option<bool>,
}

// Trims surrounding whitespace; an empty element means "use the default".
fn de_u32_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<u32>().map(Some).map_err(|e| {
            serde::de::Error::custom(format!("expected a whole number, got '{s}': {e}"))
        }),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// Map XmlConfig -> Config, starting from defaults.
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(s) = non_empty(parsed.source.as_deref()) {
        cfg.source = PathBuf::from(s);
    }
    if let Some(s) = non_empty(parsed.target.as_deref()) {
        cfg.target = PathBuf::from(s);
    }
    if let Some(level) = non_empty(parsed.log_level.as_deref()).and_then(LogLevel::parse) {
        cfg.log_level = level;
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.process_patterns.as_deref()) {
        let patterns: Vec<String> = s
            .split(',')
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        if !patterns.is_empty() {
            cfg.process_patterns = patterns;
        }
    }
    cfg.robocopy_retries = parsed.robocopy_retries.unwrap_or(ROBOCOPY_RETRIES_DEFAULT);
    cfg.robocopy_wait_secs = parsed
        .robocopy_wait_secs
        .unwrap_or(ROBOCOPY_WAIT_SECS_DEFAULT);
    cfg.force_manual_copy = parsed.force_manual_copy.unwrap_or(false);
    cfg.check_space = parsed.check_space.unwrap_or(true);

    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!(path = %path.display(), "Loaded config xml");
    Ok(xml_to_config(parsed))
}

/// Load the effective config file.
///
/// Search order: `explicit` (from `--config`), then `$LMS_MOVE_CONFIG`, then the
/// platform default. An explicitly named file must exist; a missing default file
/// simply means "use built-in defaults" and yields `Ok(None)`.
pub fn load_config(explicit: Option<&Path>) -> Result<Option<(Config, PathBuf)>> {
    if let Some(p) = explicit {
        if !p.exists() {
            bail!("Config file given with --config does not exist: {}", p.display());
        }
        return Ok(Some((load_config_from_xml_path(p)?, p.to_path_buf())));
    }

    let env_set = env::var_os(CONFIG_ENV).is_some();
    let path = default_config_path()?;
    if !path.exists() {
        if env_set {
            bail!("{CONFIG_ENV} points to a missing file: {}", path.display());
        }
        return Ok(None);
    }
    Ok(Some((load_config_from_xml_path(&path)?, path)))
}

/// Create a commented template config file. Fails if the file already exists.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "C:\\path\\to\\lms_move.log".into());

    let content = format!(
        "<!--\n  lms_move configuration (XML)\n\n    source              -> directory to relocate (%VAR% and ~ are expanded)\n    target              -> where the data should live; a junction is left at source\n    log_level           -> quiet | normal | info | debug\n    log_file            -> path to log file (optional; console output is kept)\n    process_patterns    -> comma-separated names that mean \"LM Studio is still running\"\n    robocopy_retries    -> robocopy /R: value\n    robocopy_wait_secs  -> robocopy /W: value\n    force_manual_copy   -> true to skip robocopy and use the built-in mirror copy\n    check_space         -> compare free space at target against source size first\n\n  CLI flags override XML values.\n-->\n<config>\n  <source>{}</source>\n  <target>{}</target>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <process_patterns>{}</process_patterns>\n  <robocopy_retries>{}</robocopy_retries>\n  <robocopy_wait_secs>{}</robocopy_wait_secs>\n  <force_manual_copy>false</force_manual_copy>\n  <check_space>true</check_space>\n</config>\n",
        SOURCE_DEFAULT,
        TARGET_DEFAULT,
        suggested_log,
        PROCESS_PATTERNS_DEFAULT.join(", "),
        ROBOCOPY_RETRIES_DEFAULT,
        ROBOCOPY_WAIT_SECS_DEFAULT,
    );

    write_config_secure_new(path, content.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn template_parses_back_to_defaults() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let path = base.join("config.xml");
        create_template_config(&path).unwrap();

        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.source, PathBuf::from(SOURCE_DEFAULT));
        assert_eq!(cfg.target, PathBuf::from(TARGET_DEFAULT));
        assert_eq!(cfg.log_level, LogLevel::Normal);
        assert_eq!(cfg.robocopy_retries, ROBOCOPY_RETRIES_DEFAULT);
        assert!(cfg.check_space);
        assert!(!cfg.force_manual_copy);
    }

    #[test]
    fn template_refuses_to_clobber() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let path = base.join("config.xml");
        fs::write(&path, "<config/>").unwrap();
        assert!(create_template_config(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<config/>");
    }

    #[test]
    fn process_patterns_are_split_and_lowercased() {
        let td = tempdir().unwrap();
        let path = td.path().join("c.xml");
        fs::write(
            &path,
            "<config><process_patterns> LM Studio ,, Ollama </process_patterns></config>",
        )
        .unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.process_patterns, vec!["lm studio", "ollama"]);
    }

    #[test]
    fn bad_number_is_rejected_not_defaulted() {
        let td = tempdir().unwrap();
        let path = td.path().join("c.xml");
        fs::write(&path, "<config><robocopy_retries>three</robocopy_retries></config>").unwrap();
        let err = load_config_from_xml_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("three"), "got: {err:#}");

        fs::write(&path, "<config><robocopy_wait_secs> 5 </robocopy_wait_secs></config>").unwrap();
        assert_eq!(load_config_from_xml_path(&path).unwrap().robocopy_wait_secs, 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let td = tempdir().unwrap();
        let err = load_config(Some(&td.path().join("nope.xml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
