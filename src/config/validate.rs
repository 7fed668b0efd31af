//! Config validation logic.
//! Verifies the primary root is a readable directory and that volumes are absolute and disjoint.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::types::Config;

impl Config {
    /// Validate the primary root and the declared volumes.
    ///
    /// Volume directories are not required to exist: an absent directory is
    /// simply an unmounted volume.
    pub fn validate(&self) -> Result<()> {
        let primary = &self.primary_root;
        ensure_dir_exists_and_is_dir(primary, "primary_root")?;
        ensure_readable(primary, "primary_root")?;
        let primary_real = real_path(primary);

        for vol in &self.volumes {
            if !vol.path.is_absolute() {
                bail!("volume path must be absolute: '{}'", vol.path.display());
            }
            let vol_real = real_path(&vol.path);
            if vol_real == primary_real {
                bail!(
                    "volume '{}' resolves to the primary root '{}'",
                    vol.path.display(),
                    primary_real.display()
                );
            }
            if vol_real.starts_with(&primary_real) || primary_real.starts_with(&vol_real) {
                bail!(
                    "volume '{}' and primary_root '{}' must not contain each other",
                    vol.path.display(),
                    primary.display()
                );
            }
        }

        info!(
            primary = %primary.display(),
            volumes = self.volumes.len(),
            log_file = %self
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into()),
            "Config validated"
        );
        Ok(())
    }
}

fn real_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Ensure path exists and is a directory; emit clear errors with path context.
fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

/// Ensure directory is readable by attempting to open its entries.
fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path).with_context(|| {
        format!("Cannot read {name} directory '{}'; check permissions", path.display())
    })?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}
