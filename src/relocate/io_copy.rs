//! Chunked, cancellable streaming copy.
//!
//! Features:
//! - Writes to a newly created destination file (O_EXCL semantics; never clobbers).
//! - Fixed 8 KiB chunks; the cancel flag is polled before every write and the
//!   caller is told how many bytes each chunk carried.
//! - A completed copy is flushed and fsynced before it is reported, so the
//!   caller may delete the source afterwards.
//! - On an I/O error the partial destination is removed; on cancellation it is
//!   left for the caller, which owns that cleanup policy.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::errors::RelocateError;
use crate::signals::RunSignals;

pub const COPY_CHUNK_SIZE: usize = 8 * 1024;

/// How a copy ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// Every byte was written and synced.
    Complete { bytes: u64 },
    /// Cancellation was observed; `bytes` were written before stopping.
    Interrupted { bytes: u64 },
}

/// Copy `src` -> `dst` chunk by chunk, calling `on_chunk` after each write.
pub(super) fn copy_chunked(
    src: &Path,
    dst: &Path,
    signals: &RunSignals,
    on_chunk: &mut dyn FnMut(u64),
) -> Result<CopyStatus, RelocateError> {
    let mut reader =
        File::open(src).map_err(|e| RelocateError::from_io("open source file", src, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|e| RelocateError::from_io("create destination file", dst, e))?;

    let result = pump(&mut reader, &mut writer, signals, on_chunk, src, dst);
    if result.is_err() {
        drop(writer);
        let _ = fs::remove_file(dst);
    }
    result
}

fn pump(
    reader: &mut File,
    writer: &mut File,
    signals: &RunSignals,
    on_chunk: &mut dyn FnMut(u64),
    src: &Path,
    dst: &Path,
) -> Result<CopyStatus, RelocateError> {
    let mut buf = [0u8; COPY_CHUNK_SIZE];
    let mut bytes = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(RelocateError::from_io("read source file", src, e)),
        };
        if signals.is_cancelled() {
            return Ok(CopyStatus::Interrupted { bytes });
        }
        writer
            .write_all(&buf[..n])
            .map_err(|e| RelocateError::from_io("write destination file", dst, e))?;
        bytes += n as u64;
        on_chunk(n as u64);
    }
    writer
        .flush()
        .map_err(|e| RelocateError::from_io("flush destination file", dst, e))?;
    writer
        .sync_all()
        .map_err(|e| RelocateError::from_io("sync destination file", dst, e))?;
    Ok(CopyStatus::Complete { bytes })
}
