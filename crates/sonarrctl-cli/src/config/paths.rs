//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory under the XDG config root.
const APP_DIR_NAME: &str = "sonarrctl";

/// Resolves the config file path from the process environment.
///
/// See [`resolve_config_path_with`] for the lookup order.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set
/// (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    resolve_config_path_with(dir, |key| std::env::var(key).ok())
}

/// Resolves the config file path.
///
/// 1. `{dir}/config.toml` when `dir` is given.
/// 2. `$XDG_CONFIG_HOME/sonarrctl/config.toml`.
/// 3. `$HOME/.config/sonarrctl/config.toml`.
///
/// # Errors
///
/// Returns an error if no candidate directory can be determined.
pub fn resolve_config_path_with<F>(dir: Option<&Path>, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE_NAME));
    }

    if let Some(xdg) = lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    }

    let Some(home) = lookup("HOME").filter(|v| !v.is_empty()) else {
        bail!("neither XDG_CONFIG_HOME nor HOME is set; pass --dir");
    };
    Ok(PathBuf::from(home)
        .join(".config")
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}
