//! Media index notifications.
//! After a file is moved its old index entry is dropped and the new location is
//! indexed. Both calls are best-effort: failures are logged by the caller and
//! never abort a run.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Sink for "this path appeared / disappeared" notifications.
pub trait MediaIndex: Send + Sync {
    fn index_path(&self, path: &Path) -> Result<()>;
    fn deindex_path(&self, path: &Path) -> Result<()>;
}

/// Records notifications in the debug log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIndex;

impl MediaIndex for LogIndex {
    fn index_path(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "index: scan");
        Ok(())
    }

    fn deindex_path(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "index: remove");
        Ok(())
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndex;

impl MediaIndex for NoopIndex {
    fn index_path(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn deindex_path(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
