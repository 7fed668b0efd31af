//! Typed error definitions for media_relocate.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::relocate::Outcome;

/// Failure of a single file or directory step during a relocation run.
///
/// Every variant maps onto exactly one [`Outcome`] kind; the first one raised
/// aborts the whole run.
#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("Permission denied on {path}: {context}")]
    PermissionDenied { path: PathBuf, context: String },

    #[error("Insufficient space for {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("{op} '{}': {}", .path.display(), describe_io_error(.source))]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Directory nesting deeper than {limit} levels under {path}")]
    DepthExceeded { path: PathBuf, limit: usize },

    #[error("Gave up renaming {path} after {attempts} collisions")]
    TooManyCollisions { path: PathBuf, attempts: usize },
}

impl RelocateError {
    pub(crate) fn permission(path: &Path, context: impl Into<String>) -> Self {
        RelocateError::PermissionDenied {
            path: path.to_path_buf(),
            context: context.into(),
        }
    }

    /// Classify an io::Error raised while operating on `path`.
    ///
    /// Permission and read-only failures become `PermissionDenied`, a full
    /// device becomes `InsufficientSpace`, anything else stays `Io`.
    pub(crate) fn from_io(op: &'static str, path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                RelocateError::PermissionDenied {
                    path: path.to_path_buf(),
                    context: format!("{op}: {}", describe_io_error(&e)),
                }
            }
            io::ErrorKind::StorageFull => RelocateError::InsufficientSpace {
                required: 0,
                available: 0,
                dest: path.to_path_buf(),
            },
            _ => RelocateError::Io {
                op,
                path: path.to_path_buf(),
                source: e,
            },
        }
    }

    /// Outcome kind this failure is reported as.
    pub fn outcome(&self) -> Outcome {
        match self {
            RelocateError::PermissionDenied { .. } => Outcome::PermissionError,
            RelocateError::InsufficientSpace { .. } => Outcome::SpaceError,
            RelocateError::Io { .. }
            | RelocateError::DepthExceeded { .. }
            | RelocateError::TooManyCollisions { .. } => Outcome::OtherError,
        }
    }

    /// Stable numeric code for structured logs.
    pub fn code(&self) -> i32 {
        self.outcome().code()
    }
}

/// Request-level failures reported by the service handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("A relocation run is already in progress")]
    RunInProgress,

    #[error("No measurement has completed yet; measure before relocating")]
    NotMeasured,

    #[error("The relocation worker has stopped")]
    WorkerStopped,
}

/// Render an io::Error with a short actionable hint appended.
pub fn describe_io_error(e: &io::Error) -> String {
    let hint = match e.kind() {
        io::ErrorKind::PermissionDenied => " (permission denied; check ownership and write permissions)",
        io::ErrorKind::NotFound => " (path not found; the volume may have been removed)",
        io::ErrorKind::AlreadyExists => " (already exists)",
        io::ErrorKind::StorageFull => " (insufficient space on device)",
        io::ErrorKind::ReadOnlyFilesystem => " (read-only filesystem)",
        _ => "",
    };
    match e.raw_os_error() {
        Some(code) => format!("{e}{hint} [os code: {code}]"),
        None => format!("{e}{hint}"),
    }
}
