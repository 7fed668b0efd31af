//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --group may be repeated; without it every non-empty group is selected.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::groups::CategoryGroup;

/// Move camera and music folders from primary storage to a secondary volume.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Relocate DCIM/Music media folders to secondary storage (Rust)"
)]
pub struct Args {
    /// Category group to move: dcim or music. Repeat to select both.
    #[arg(long = "group", short = 'g', value_name = "GROUP")]
    pub groups: Vec<CategoryGroup>,

    /// Measure group sizes and free space, then exit without moving anything.
    #[arg(long, help = "Only measure sizes and free space; move nothing")]
    pub measure_only: bool,

    /// Proceed even when the selection is larger than the measured free space.
    #[arg(
        long,
        help = "Move as much as fits when the selection exceeds free space"
    )]
    pub allow_partial: bool,

    /// Override the primary storage root (normally configured via XML).
    #[arg(long, value_hint = ValueHint::DirPath, help = "Override the primary storage root")]
    pub primary_root: Option<PathBuf>,

    /// Add a non-removable target volume ahead of the configured ones.
    #[arg(long, value_hint = ValueHint::DirPath, help = "Target volume root (takes precedence over configured volumes)")]
    pub target_root: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Print where the config file is looked up (or MEDIA_RELOCATE_CONFIG if set), then exit.
    #[arg(long, help = "Print the config file location in use and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(root) = &self.primary_root {
            cfg.primary_root = root.clone();
        }
        if let Some(target) = &self.target_root {
            cfg.volumes.retain(|v| &v.path != target);
            cfg.volumes.insert(
                0,
                crate::config::VolumeSpec {
                    path: target.clone(),
                    removable_bus: false,
                },
            );
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_wins_over_log_level() {
        let args = Args::parse_from(["media_relocate", "--log-level", "quiet", "--debug"]);
        assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));
    }

    #[test]
    fn repeated_groups_parse() {
        let args = Args::parse_from(["media_relocate", "--group", "music", "-g", "dcim"]);
        assert_eq!(args.groups, vec![CategoryGroup::Music, CategoryGroup::Dcim]);
        assert!(Args::try_parse_from(["media_relocate", "--group", "podcasts"]).is_err());
    }

    #[test]
    fn target_root_goes_first() {
        let mut cfg = Config::new("/sd/primary").with_volume("/sd/card", false);
        let args = Args::parse_from(["media_relocate", "--target-root", "/sd/other"]);
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.volumes[0].path, PathBuf::from("/sd/other"));
        assert_eq!(cfg.volumes.len(), 2);
    }
}
