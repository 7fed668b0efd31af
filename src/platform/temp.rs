//! Temporary sibling names for atomic config writes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling of `target` to write into before renaming over it:
/// `.<file name>.tmp.<pid>.<nanos>.<seq>` in the same directory, so the
/// final rename never crosses a filesystem.
pub fn tmp_sibling_for(target: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);

    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_else(|| "media_relocate".as_ref()));
    name.push(format!(".tmp.{}.{nanos}.{seq}", std::process::id()));

    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}
