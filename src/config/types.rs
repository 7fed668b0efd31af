//! Core configuration types.
//! - Config holds the storage layout and logging settings.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::PRIMARY_ROOT_DEFAULT;
use super::paths;
use crate::volumes::ConfiguredVolumes;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// A secondary volume declared in config or on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub path: PathBuf,
    /// USB mass storage and similar; never chosen as a relocation target.
    pub removable_bus: bool,
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary external storage (the relocation source)
    pub primary_root: PathBuf,
    /// Candidate target volumes, in preference order
    pub volumes: Vec<VolumeSpec>,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_root: PathBuf::from(PRIMARY_ROOT_DEFAULT),
            volumes: Vec::new(),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
        }
    }
}

impl Config {
    pub fn new(primary_root: impl Into<PathBuf>) -> Self {
        Self {
            primary_root: primary_root.into(),
            ..Default::default()
        }
    }

    /// Add a candidate target volume (builder style).
    pub fn with_volume(mut self, path: impl Into<PathBuf>, removable_bus: bool) -> Self {
        self.volumes.push(VolumeSpec {
            path: path.into(),
            removable_bus,
        });
        self
    }

    /// Volume provider backed by the configured roots.
    pub fn volume_provider(&self) -> ConfiguredVolumes {
        self.volumes
            .iter()
            .fold(ConfiguredVolumes::new(&self.primary_root), |v, spec| {
                v.with_volume(&spec.path, spec.removable_bus)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loglevel_parse_various_strings() {
        assert_eq!(LogLevel::parse("QUIET"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse(" verbose "), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!("nope".parse::<LogLevel>().is_err());
    }
}
