//! Collision renaming.
//!
//! When a destination path is occupied by something that cannot be reused (a
//! file where a directory is needed, or any existing entry where a file is
//! about to be written) the last path segment gets a `copy_of_` prefix and the
//! operation is retried. Repeated collisions compound the prefix.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const COLLISION_PREFIX: &str = "copy_of_";

/// Upper bound on successive renames of one destination.
pub const MAX_COLLISION_RENAMES: usize = 64;

/// `dir/name` -> `dir/copy_of_name` (non-UTF-8 names preserved).
pub fn renamed_for_collision(path: &Path) -> PathBuf {
    let mut name = OsString::from(COLLISION_PREFIX);
    if let Some(base) = path.file_name() {
        name.push(base);
    }
    let renamed = path.with_file_name(name);
    trace!(from = %path.display(), to = %renamed.display(), "destination collision");
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_compounds() {
        let p = Path::new("/sd/DCIM/a.jpg");
        let once = renamed_for_collision(p);
        assert_eq!(once, PathBuf::from("/sd/DCIM/copy_of_a.jpg"));
        let twice = renamed_for_collision(&once);
        assert_eq!(twice, PathBuf::from("/sd/DCIM/copy_of_copy_of_a.jpg"));
    }

    #[test]
    fn directories_keep_their_parent() {
        let p = Path::new("/sd/Music");
        assert_eq!(renamed_for_collision(p), PathBuf::from("/sd/copy_of_Music"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_survive() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let raw = OsStr::from_bytes(b"caf\xe9.mp3");
        let p = Path::new("/sd").join(raw);
        let renamed = renamed_for_collision(&p);
        assert_eq!(renamed.file_name().unwrap().as_bytes(), b"copy_of_caf\xe9.mp3");
    }
}
