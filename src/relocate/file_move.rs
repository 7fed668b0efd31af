//! Single-file move: space check, collision rename, chunked copy, source delete.

use std::fs;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::errors::{RelocateError, describe_io_error};
use crate::platform::{can_read, is_hidden};

use super::Run;
use super::collision::{MAX_COLLISION_RENAMES, renamed_for_collision};
use super::io_copy::{CopyStatus, copy_chunked};

impl Run<'_> {
    /// Move `src` to `dst` (or a `copy_of_` sibling of it).
    ///
    /// A missing or hidden source is already done. When the run is cancelled
    /// during the copy the partial destination is deleted and the source kept.
    pub(super) fn move_file(&mut self, src: &Path, dst: &Path) -> Result<(), RelocateError> {
        if !src.exists() || is_hidden(src) {
            debug!(src = %src.display(), "Ignoring hidden or missing file");
            return Ok(());
        }

        let meta = fs::metadata(src).map_err(|e| RelocateError::from_io("stat source file", src, e))?;
        if !meta.is_file() || !can_read(src) {
            return Err(RelocateError::permission(src, "not a readable regular file"));
        }
        let len = meta.len();

        let mut dest = dst.to_path_buf();
        let mut renames = 0usize;
        loop {
            let available = self
                .probe
                .available_bytes(self.target_root)
                .map_err(|e| RelocateError::from_io("query free space", self.target_root, e))?;
            if available < len {
                error!(src = %src.display(), required = len, available, "Space insufficient while moving file");
                return Err(RelocateError::InsufficientSpace {
                    required: len,
                    available,
                    dest,
                });
            }
            if fs::symlink_metadata(&dest).is_err() {
                break;
            }
            renames += 1;
            if renames > MAX_COLLISION_RENAMES {
                return Err(RelocateError::TooManyCollisions {
                    path: dst.to_path_buf(),
                    attempts: renames - 1,
                });
            }
            dest = renamed_for_collision(&dest);
        }

        debug!(src = %src.display(), dest = %dest.display(), bytes = len, "Moving file");
        let status = {
            let meter = &mut self.meter;
            let on_progress = &mut self.on_progress;
            copy_chunked(src, &dest, self.signals, &mut |n| {
                for percent in meter.advance(n) {
                    on_progress(percent);
                }
            })?
        };

        let bytes = match status {
            CopyStatus::Complete { bytes } if !self.signals.is_cancelled() => bytes,
            CopyStatus::Complete { .. } | CopyStatus::Interrupted { .. } => {
                fs::remove_file(&dest).map_err(|e| {
                    RelocateError::permission(
                        &dest,
                        format!("remove partial copy after cancel: {}", describe_io_error(&e)),
                    )
                })?;
                debug!(dest = %dest.display(), "Cancelled; removed partial copy");
                return Ok(());
            }
        };

        fs::remove_file(src).map_err(|e| {
            RelocateError::permission(src, format!("delete source after copy: {}", describe_io_error(&e)))
        })?;
        self.any_file_moved = true;
        self.files_moved += 1;
        self.bytes_moved += bytes;

        if let Err(e) = self.index.deindex_path(src) {
            warn!(path = %src.display(), error = %e, "Failed to drop index entry");
        }
        if let Err(e) = self.index.index_path(&dest) {
            warn!(path = %dest.display(), error = %e, "Failed to index moved file");
        }
        debug!(src = %src.display(), dest = %dest.display(), bytes, "Moved file");
        Ok(())
    }
}
