//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{Context, Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file (or a directory holding `config.xml`).
pub const CONFIG_ENV_VAR: &str = "MEDIA_RELOCATE_CONFIG";

const APP_DIR: &str = "media_relocate";
const CONFIG_FILE: &str = "config.xml";
const LOG_FILE: &str = "media_relocate.log";

/// Config path in use: `$MEDIA_RELOCATE_CONFIG` when set, else the OS config dir.
///
/// A relative override is resolved against the current directory; an override
/// naming a directory points at `config.xml` inside it.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV_VAR) {
        let mut p = PathBuf::from(raw);
        if p.is_relative() {
            p = env::current_dir()
                .context("resolve current directory for relative config path")?
                .join(p);
        }
        if p.is_dir() {
            p.push(CONFIG_FILE);
        }
        return Ok(p);
    }

    let base = config_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or_else(|| anyhow!("cannot determine a config directory (no config dir and no HOME)"))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Default log file path: next to an explicit `$MEDIA_RELOCATE_CONFIG`, else in
/// the OS data dir. The parent is created best-effort.
pub fn default_log_path() -> Result<PathBuf> {
    if env::var_os(CONFIG_ENV_VAR).is_some() {
        let cfg = default_config_path()?;
        if let Some(parent) = cfg.parent() {
            return Ok(parent.join(LOG_FILE));
        }
    }
    let base = data_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
        .ok_or_else(|| anyhow!("cannot determine a data directory (no data dir and no HOME)"))?
        .join(APP_DIR);
    let _ = fs::create_dir_all(&base);
    Ok(base.join(LOG_FILE))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    for anc in path.ancestors().skip(1) {
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}
