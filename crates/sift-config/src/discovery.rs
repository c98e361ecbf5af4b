//! Configuration file discovery.
//!
//! Candidates are the `.sift.toml` files in the working directory and each of its ancestors,
//! nearest first, followed by `~/.sift.toml`. Each candidate is parsed as soon as it is found:
//! a file with `root = true` ends the walk, and a file that cannot be read or parsed is an
//! error rather than a silent non-root.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::debug;

use crate::{ConfigError, merge::ParsedConfig, parse::parse_config_file};

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".sift.toml";

/// Finds and parses every configuration file that applies to `cwd`.
///
/// Results are in precedence order: closest to `cwd` first, global (`~/.sift.toml`) last. The
/// global file is skipped when a root config was reached, or when it was already found on the
/// walk because `cwd` lies under the home directory.
pub fn discover_configs(cwd: &Path) -> Result<Vec<ParsedConfig>, ConfigError> {
    let mut found = Vec::new();

    for dir in cwd.ancestors() {
        let Some(parsed) = load_candidate(dir.join(CONFIG_FILENAME))? else {
            continue;
        };
        let is_root = parsed.is_root();
        found.push(parsed);
        if is_root {
            return Ok(found);
        }
    }

    if let Some(global) = global_config_path()
        && !found.iter().any(|c| c.path == global)
        && let Some(parsed) = load_candidate(global)?
    {
        found.push(parsed);
    }

    Ok(found)
}

/// Paths of the files [`discover_configs`] would load, in the same order.
pub fn discover_config_files(cwd: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    Ok(discover_configs(cwd)?.into_iter().map(|c| c.path).collect())
}

/// Parses `path` if it is a config file. Missing paths and non-files yield `None`.
fn load_candidate(path: PathBuf) -> Result<Option<ParsedConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    if !path.is_file() {
        debug!(path = %path.display(), "skipping config candidate that is not a file");
        return Ok(None);
    }

    let config = parse_config_file(&path)?;
    let parsed = ParsedConfig { path, config };
    debug!(path = %parsed.path.display(), root = parsed.is_root(), "found config");
    Ok(Some(parsed))
}

/// Returns the path to the global configuration file (`~/.sift.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Like [`global_config_path`], but an error when there is no home directory.
pub fn require_global_config_path() -> Result<PathBuf, ConfigError> {
    global_config_path().ok_or(ConfigError::NoHomeDirectory)
}

/// Checks if a path is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}
