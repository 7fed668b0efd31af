//! Directory walk for one category directory.
//!
//! The walk is iterative (explicit stack) so deep trees cannot overflow the
//! thread stack. Children are visited in sorted order. Directories are created
//! on the target as they are entered; emptied source directories are left in
//! place.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::vec;
use tracing::{debug, trace};

use crate::errors::RelocateError;
use crate::platform::{can_read, can_write, is_hidden};

use super::Run;
use super::collision::{MAX_COLLISION_RENAMES, renamed_for_collision};

/// Deepest directory nesting the walk will descend into.
pub const MAX_TREE_DEPTH: usize = 256;

struct Frame {
    src: PathBuf,
    dst: PathBuf,
    children: vec::IntoIter<OsString>,
}

impl Run<'_> {
    /// Move everything under `src` into `dst`. A missing `src` is a no-op.
    pub(super) fn move_tree(&mut self, src: &Path, dst: &Path) -> Result<(), RelocateError> {
        let Some(root) = self.enter_dir(src, dst)? else {
            return Ok(());
        };
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            if self.signals.is_cancelled() {
                debug!(dir = %frame.src.display(), "Cancelled; stopping directory walk");
                return Ok(());
            }
            let Some(name) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let child_src = frame.src.join(&name);
            let child_dst = frame.dst.join(&name);

            let meta = match fs::symlink_metadata(&child_src) {
                Ok(m) => m,
                // Vanished between listing and visiting.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(RelocateError::from_io("stat entry", &child_src, e)),
            };

            if meta.is_dir() {
                if stack.len() >= MAX_TREE_DEPTH {
                    return Err(RelocateError::DepthExceeded {
                        path: child_src,
                        limit: MAX_TREE_DEPTH,
                    });
                }
                if let Some(next) = self.enter_dir(&child_src, &child_dst)? {
                    stack.push(next);
                }
            } else if meta.is_file() {
                if !is_hidden(&child_src) && !can_read(&child_src) {
                    return Err(RelocateError::permission(&child_src, "file is not readable"));
                }
                match self.move_file(&child_src, &child_dst) {
                    Ok(()) => {}
                    Err(_) if self.signals.is_cancelled() => return Ok(()),
                    Err(e) => return Err(e),
                }
            } else {
                trace!(path = %child_src.display(), "Skipping non-regular entry");
            }
        }
        Ok(())
    }

    /// Validate `src`, prepare `dst` and list the children to visit.
    /// `None` when `src` is missing or hidden; anything else that is not a
    /// directory is a permission failure.
    fn enter_dir(&self, src: &Path, dst: &Path) -> Result<Option<Frame>, RelocateError> {
        if !src.exists() || is_hidden(src) {
            trace!(dir = %src.display(), "Skipping missing or hidden directory");
            return Ok(None);
        }
        if !src.is_dir() {
            return Err(RelocateError::permission(src, "not a directory"));
        }
        if !can_read(src) {
            return Err(RelocateError::permission(src, "directory is not readable"));
        }
        let dst = prepare_destination_dir(dst)?;

        let mut children = fs::read_dir(src)
            .map_err(|e| RelocateError::from_io("list directory", src, e))?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| RelocateError::from_io("list directory", src, e))?;
        children.sort();

        Ok(Some(Frame {
            src: src.to_path_buf(),
            dst,
            children: children.into_iter(),
        }))
    }
}

/// Make sure a writable directory exists at `dst` (or a `copy_of_` sibling
/// when `dst` is taken by a non-directory) and return its path.
fn prepare_destination_dir(dst: &Path) -> Result<PathBuf, RelocateError> {
    let mut dir = dst.to_path_buf();
    for _ in 0..=MAX_COLLISION_RENAMES {
        match fs::symlink_metadata(&dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir(&dir).map_err(|e| {
                    RelocateError::permission(&dir, format!("create directory: {e}"))
                })?;
                debug!(dir = %dir.display(), "Created destination directory");
                return Ok(dir);
            }
            Err(e) => return Err(RelocateError::from_io("stat destination", &dir, e)),
            Ok(m) if m.is_dir() => {
                if !can_write(&dir) {
                    return Err(RelocateError::permission(&dir, "destination directory is not writable"));
                }
                return Ok(dir);
            }
            Ok(_) => dir = renamed_for_collision(&dir),
        }
    }
    Err(RelocateError::TooManyCollisions {
        path: dst.to_path_buf(),
        attempts: MAX_COLLISION_RENAMES,
    })
}
