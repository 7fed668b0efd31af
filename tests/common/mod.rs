#![allow(dead_code)]

use anyhow::{Result, bail};
use media_relocate::{MediaIndex, MountState, RootPair, SpaceProbe, StorageRoot};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Write `len` bytes of a deterministic pattern, creating parents.
pub fn write_file(path: &Path, len: usize) -> Vec<u8> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let seed = path.to_string_lossy().len();
    let data: Vec<u8> = (0..len).map(|i| ((i + seed) % 251) as u8).collect();
    fs::write(path, &data).unwrap();
    data
}

/// `<base>/primary` and `<base>/sdcard`, both created.
pub fn roots_under(base: &Path) -> RootPair {
    let source = base.join("primary");
    let target = base.join("sdcard");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&target).unwrap();
    RootPair {
        source: StorageRoot {
            path: source,
            is_primary: true,
            mount_state: MountState::Mounted,
        },
        target: StorageRoot {
            path: target,
            is_primary: false,
            mount_state: MountState::Mounted,
        },
    }
}

/// Answers free-space queries from a script, then a fallback.
pub struct ScriptedProbe {
    answers: Mutex<VecDeque<u64>>,
    fallback: u64,
}

impl ScriptedProbe {
    pub fn new(answers: impl IntoIterator<Item = u64>, fallback: u64) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            fallback,
        }
    }

    pub fn plenty() -> Self {
        Self::new([], u64::MAX)
    }
}

impl SpaceProbe for ScriptedProbe {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(self.fallback))
    }
}

/// Index notification as recorded by [`RecordingIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexCall {
    Index(PathBuf),
    Deindex(PathBuf),
}

#[derive(Default)]
pub struct RecordingIndex {
    pub calls: Mutex<Vec<IndexCall>>,
    pub fail: bool,
}

impl RecordingIndex {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: IndexCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            bail!("index unavailable");
        }
        Ok(())
    }
}

impl MediaIndex for RecordingIndex {
    fn index_path(&self, path: &Path) -> Result<()> {
        self.record(IndexCall::Index(path.to_path_buf()))
    }

    fn deindex_path(&self, path: &Path) -> Result<()> {
        self.record(IndexCall::Deindex(path.to_path_buf()))
    }
}

/// Skip permission-sensitive tests when running as root.
#[cfg(unix)]
pub fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
