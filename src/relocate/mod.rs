//! Relocation engine: moves the selected category groups from the source root
//! to the target root, one file at a time.
//!
//! Per file the sequence is: re-check free space, resolve collisions, copy in
//! chunks, fsync, then delete the source. A source file is never deleted
//! before its copy is complete and synced.
//!
//! The first failure aborts the run. A cancel request (from the caller or a
//! preemption signal) stops the walk at the next chunk or directory entry and
//! removes the partially written destination file.

mod collision;
mod file_move;
mod io_copy;
mod outcome;
mod progress;
mod tree;

pub use collision::{COLLISION_PREFIX, MAX_COLLISION_RENAMES, renamed_for_collision};
pub use io_copy::{COPY_CHUNK_SIZE, CopyStatus};
pub use outcome::{Outcome, RunReport, Verdict};
pub use progress::{PROGRESS_UNITS, ProgressMeter};
pub use tree::MAX_TREE_DEPTH;

use std::path::Path;
use tracing::{error, info, warn};

use crate::errors::RelocateError;
use crate::groups::CategoryGroup;
use crate::index::MediaIndex;
use crate::platform::SpaceProbe;
use crate::signals::RunSignals;
use crate::volumes::RootPair;

/// What one run should move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationRequest {
    /// Groups in processing order.
    pub groups: Vec<CategoryGroup>,
    /// Sum of the measured sizes of `groups`; drives the progress scale.
    pub total_bytes: u64,
}

/// Executes relocation runs for one root pair.
pub struct Relocator<'a> {
    roots: &'a RootPair,
    probe: &'a dyn SpaceProbe,
    index: &'a dyn MediaIndex,
    signals: &'a RunSignals,
}

impl<'a> Relocator<'a> {
    pub fn new(
        roots: &'a RootPair,
        probe: &'a dyn SpaceProbe,
        index: &'a dyn MediaIndex,
        signals: &'a RunSignals,
    ) -> Self {
        Self {
            roots,
            probe,
            index,
            signals,
        }
    }

    /// Execute one run to completion and report how it ended.
    ///
    /// `on_progress` receives 0 first, then every newly reached percentage in
    /// increasing order. It runs on the calling thread between chunk writes.
    /// A cancel already pending when the run begins stops it before the first file.
    pub fn run(&self, request: &RelocationRequest, on_progress: &mut dyn FnMut(u8)) -> RunReport {
        self.signals.begin_run();
        if let Some(reason) = self.signals.blocking_reason() {
            warn!(%reason, "Relocation started while blocked; stopping immediately");
            self.signals.request_cancel();
        }

        info!(
            source = %self.roots.source.path.display(),
            target = %self.roots.target.path.display(),
            groups = ?request.groups,
            total_bytes = request.total_bytes,
            "Starting relocation"
        );
        on_progress(0);

        let mut run = Run {
            target_root: &self.roots.target.path,
            probe: self.probe,
            index: self.index,
            signals: self.signals,
            meter: ProgressMeter::new(request.total_bytes),
            on_progress,
            any_file_moved: false,
            files_moved: 0,
            bytes_moved: 0,
        };

        let result = if request.total_bytes == 0 {
            info!("Nothing selected; relocation has no work");
            Ok(())
        } else {
            run.move_groups(&self.roots.source.path, &request.groups)
        };

        let report = RunReport {
            outcome: result.as_ref().err().map_or(Outcome::Success, RelocateError::outcome),
            any_file_moved: run.any_file_moved,
            cancelled: self.signals.is_cancelled(),
            battery_low: self.signals.battery_low(),
            transfer_mode_active: self.signals.transfer_mode_active(),
            volume_removed: self.signals.volume_removed(),
            percent_complete: run.meter.percent(),
            files_moved: run.files_moved,
            bytes_moved: run.bytes_moved,
            detail: result.as_ref().err().map(|e| e.to_string()),
        };
        self.signals.end_run();

        match &result {
            Err(e) if !report.cancelled => {
                error!(code = e.code(), kind = report.outcome.kind(), error = %e, "Relocation failed")
            }
            _ => {}
        }
        info!(
            verdict = ?report.verdict(),
            files = report.files_moved,
            bytes = report.bytes_moved,
            percent = report.percent_complete,
            "Relocation finished"
        );
        report
    }
}

/// Mutable state of one run; the walk and per-file logic live in `tree` and `file_move`.
pub(super) struct Run<'r> {
    pub(super) target_root: &'r Path,
    pub(super) probe: &'r dyn SpaceProbe,
    pub(super) index: &'r dyn MediaIndex,
    pub(super) signals: &'r RunSignals,
    pub(super) meter: ProgressMeter,
    pub(super) on_progress: &'r mut dyn FnMut(u8),
    pub(super) any_file_moved: bool,
    pub(super) files_moved: u64,
    pub(super) bytes_moved: u64,
}

impl Run<'_> {
    fn move_groups(&mut self, source_root: &Path, groups: &[CategoryGroup]) -> Result<(), RelocateError> {
        for group in groups {
            for dir in group.dirs() {
                if self.signals.is_cancelled() {
                    return Ok(());
                }
                let src = source_root.join(dir);
                let dst = self.target_root.join(dir);
                self.move_tree(&src, &dst)?;
            }
        }
        Ok(())
    }
}
