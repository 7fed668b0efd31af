//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the rest of the codebase can remain platform-agnostic.

use std::io;
use std::path::Path;

mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{
    can_read, can_write, free_space_bytes, is_hidden, open_log_file_secure_append,
    set_dir_mode_0700, write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use windows::{
    can_read, can_write, free_space_bytes, is_hidden, open_log_file_secure_append,
    set_dir_mode_0700, write_config_secure_new_0600,
};

/// Source of "bytes available right now" for a volume.
///
/// The relocation engine re-queries this before every file, so an
/// implementation must never cache.
pub trait SpaceProbe: Send + Sync {
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// Free space straight from the filesystem (available blocks x block size).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

impl SpaceProbe for StatvfsProbe {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        free_space_bytes(path)
    }
}

/// Human-friendly size, e.g. "1.5 MiB".
pub fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn statvfs_probe_reports_space() {
        let dir = tempdir().unwrap();
        let bytes = StatvfsProbe.available_bytes(dir.path()).unwrap();
        assert!(bytes > 0);
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }
}
