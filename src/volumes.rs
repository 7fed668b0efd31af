//! Storage volumes and source/target root selection.
//!
//! The host environment owns volume enumeration; this module only consumes a
//! snapshot of it through [`VolumeProvider`] and picks the root pair a
//! measurement/relocation pass operates on.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mount state of a volume as reported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Mounted,
    NotMounted,
}

impl MountState {
    pub fn is_mounted(self) -> bool {
        matches!(self, MountState::Mounted)
    }
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MountState::Mounted => "mounted",
            MountState::NotMounted => "unmounted",
        })
    }
}

/// One entry of the environment's volume list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub path: PathBuf,
    pub mount_state: MountState,
    /// Volumes on a removable bus (USB mass storage) are never relocation targets.
    pub is_removable_bus: bool,
}

/// A selected, mounted volume root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    pub path: PathBuf,
    pub is_primary: bool,
    pub mount_state: MountState,
}

/// The source (primary) and target roots of one measurement/relocation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPair {
    pub source: StorageRoot,
    pub target: StorageRoot,
}

impl RootPair {
    /// True if `path` is the root of either side.
    pub fn involves(&self, path: &Path) -> bool {
        self.source.path == path || self.target.path == path
    }
}

/// Live view of the mounted volumes.
pub trait VolumeProvider: Send {
    /// Path of the conventional primary external storage.
    fn primary_path(&self) -> PathBuf;

    /// Every known volume with its current state.
    fn list_volumes(&self) -> Vec<VolumeInfo>;
}

/// Pick the primary volume as source and the first other mounted,
/// non-removable volume as target. `None` when either is missing.
pub fn select_roots(primary: &Path, volumes: &[VolumeInfo]) -> Option<RootPair> {
    let source = volumes
        .iter()
        .find(|v| v.mount_state.is_mounted() && v.path == primary)?;
    let target = volumes
        .iter()
        .find(|v| v.mount_state.is_mounted() && v.path != primary && !v.is_removable_bus)?;
    debug!(source = %source.path.display(), target = %target.path.display(), "Selected storage roots");
    Some(RootPair {
        source: StorageRoot {
            path: source.path.clone(),
            is_primary: true,
            mount_state: source.mount_state,
        },
        target: StorageRoot {
            path: target.path.clone(),
            is_primary: false,
            mount_state: target.mount_state,
        },
    })
}

/// Volumes declared up front (config file or CLI); a volume counts as mounted
/// while its root directory is present.
#[derive(Debug, Clone)]
pub struct ConfiguredVolumes {
    primary: PathBuf,
    others: Vec<(PathBuf, bool)>,
}

impl ConfiguredVolumes {
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            others: Vec::new(),
        }
    }

    pub fn with_volume(mut self, path: impl Into<PathBuf>, removable_bus: bool) -> Self {
        self.others.push((path.into(), removable_bus));
        self
    }

    fn probe(path: &Path, removable: bool) -> VolumeInfo {
        VolumeInfo {
            path: path.to_path_buf(),
            mount_state: if path.is_dir() {
                MountState::Mounted
            } else {
                MountState::NotMounted
            },
            is_removable_bus: removable,
        }
    }
}

impl VolumeProvider for ConfiguredVolumes {
    fn primary_path(&self) -> PathBuf {
        self.primary.clone()
    }

    fn list_volumes(&self) -> Vec<VolumeInfo> {
        std::iter::once(Self::probe(&self.primary, false))
            .chain(self.others.iter().map(|(p, r)| Self::probe(p, *r)))
            .collect()
    }
}
