//! Directory measurement.
//! Sizes every category group on the source root and snapshots free space on
//! the target root. Never mutates the filesystem.
//!
//! Notes:
//! - A missing directory contributes zero.
//! - A failure on one directory (or one entry inside it) is logged and that
//!   part counts as zero; the measurement as a whole always completes.
//! - The free-space figure is a snapshot for display and advisory warnings;
//!   relocation re-checks space before every file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::groups::CategoryGroup;
use crate::platform::SpaceProbe;
use crate::relocate::RelocationRequest;
use crate::signals::RunSignals;
use crate::volumes::{RootPair, VolumeProvider, select_roots};

/// No mounted secondary volume to relocate onto. A blocking state, not an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no mounted destination volume found")]
pub struct NoDestinationVolume;

/// Output of one measurement pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementResult {
    pub roots: RootPair,
    pub free_bytes_on_target: u64,
    pub bytes_per_group: BTreeMap<CategoryGroup, u64>,
    /// Set when a cancel request cut the pass short; the sizes are then partial
    /// and must not be used to plan a run.
    pub cancelled: bool,
}

impl MeasurementResult {
    pub fn group_bytes(&self, group: CategoryGroup) -> u64 {
        self.bytes_per_group.get(&group).copied().unwrap_or(0)
    }

    /// A group with nothing in it cannot be selected.
    pub fn is_selectable(&self, group: CategoryGroup) -> bool {
        self.group_bytes(group) > 0
    }

    pub fn selectable_groups(&self) -> Vec<CategoryGroup> {
        CategoryGroup::ALL
            .into_iter()
            .filter(|g| self.is_selectable(*g))
            .collect()
    }

    /// Sum of measured sizes for a selection (duplicates counted once).
    pub fn total_for(&self, selection: &[CategoryGroup]) -> u64 {
        CategoryGroup::normalize(selection)
            .into_iter()
            .map(|g| self.group_bytes(g))
            .fold(0u64, u64::saturating_add)
    }

    /// Advisory only: the free-space snapshot may be stale by the time a run starts.
    pub fn exceeds_free_space(&self, selection: &[CategoryGroup]) -> bool {
        self.total_for(selection) > self.free_bytes_on_target
    }

    /// Build the request for a run over `selection`.
    pub fn request_for(&self, selection: &[CategoryGroup]) -> RelocationRequest {
        RelocationRequest {
            groups: CategoryGroup::normalize(selection),
            total_bytes: self.total_for(selection),
        }
    }
}

/// Measures category groups for a resolved root pair.
pub struct Measurer<'a> {
    probe: &'a dyn SpaceProbe,
    signals: Option<&'a RunSignals>,
}

impl<'a> Measurer<'a> {
    pub fn new(probe: &'a dyn SpaceProbe) -> Self {
        Self {
            probe,
            signals: None,
        }
    }

    /// Allow `request_cancel` on `signals` to skip the remaining directories.
    pub fn with_signals(mut self, signals: &'a RunSignals) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Resolve the root pair from the live volume list, then measure it.
    pub fn resolve_and_measure(
        &self,
        provider: &dyn VolumeProvider,
    ) -> Result<MeasurementResult, NoDestinationVolume> {
        let roots = select_roots(&provider.primary_path(), &provider.list_volumes())
            .ok_or(NoDestinationVolume)?;
        Ok(self.measure(&roots))
    }

    pub fn measure(&self, roots: &RootPair) -> MeasurementResult {
        info!(source = %roots.source.path.display(), target = %roots.target.path.display(), "Starting measurement");

        let free_bytes_on_target = match self.probe.available_bytes(&roots.target.path) {
            Ok(n) => n,
            Err(e) => {
                warn!(path = %roots.target.path.display(), error = %e, "Free space query failed; reporting 0");
                0
            }
        };

        let mut bytes_per_group = BTreeMap::new();
        let mut cancelled = false;
        for group in CategoryGroup::ALL {
            let mut total = 0u64;
            for dir in group.dirs() {
                if self.cancelled() {
                    cancelled = true;
                    break;
                }
                let path = roots.source.path.join(dir);
                match measure_directory(&path) {
                    Ok(n) => total = total.saturating_add(n),
                    Err(e) => warn!(path = %path.display(), error = %e, "Measure failed; counting as 0"),
                }
            }
            bytes_per_group.insert(group, total);
        }

        if cancelled {
            info!(bytes = ?bytes_per_group, "Measurement cancelled; sizes are partial");
        } else {
            info!(free = free_bytes_on_target, bytes = ?bytes_per_group, "Measurement complete");
        }

        MeasurementResult {
            roots: roots.clone(),
            free_bytes_on_target,
            bytes_per_group,
            cancelled,
        }
    }

    fn cancelled(&self) -> bool {
        self.signals.is_some_and(|s| s.is_cancelled())
    }
}

/// Total length of every regular file under `path` (0 if it does not exist).
///
/// Symlinks are not followed. Unreadable entries below the root are logged and skipped.
pub fn measure_directory(path: &Path) -> io::Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    // Surface a stat failure on the directory itself to the caller.
    fs::metadata(path)?;

    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry during measurement");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(m) => total = total.saturating_add(m.len()),
            Err(e) => debug!(path = %entry.path().display(), error = %e, "Skipping entry without metadata"),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn measure_directory_sums_nested_files() {
        let td = tempdir().unwrap();
        let d = td.path().join("DCIM");
        fs::create_dir_all(d.join("Camera")).unwrap();
        fs::write(d.join("a.jpg"), vec![0u8; 100]).unwrap();
        fs::write(d.join("Camera").join("b.jpg"), vec![0u8; 23]).unwrap();
        assert_eq!(measure_directory(&d).unwrap(), 123);
    }

    #[test]
    fn missing_directory_is_zero() {
        let td = tempdir().unwrap();
        assert_eq!(measure_directory(&td.path().join("nope")).unwrap(), 0);
    }
}
