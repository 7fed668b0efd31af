//! Run outcome classification.
//!
//! A run produces exactly one [`RunReport`]. Its [`Outcome`] is the kind of the
//! first failure (or `Success`); the cancel and preemption facts are recorded
//! alongside, and [`RunReport::verdict`] folds everything into the single
//! message a caller should present.

use std::fmt;

use crate::signals::RunSignals;

/// Kind of the run's terminal state, independent of cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    PermissionError,
    SpaceError,
    OtherError,
}

impl Outcome {
    /// Numeric code used in structured logs.
    pub fn code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::PermissionError => -1,
            Outcome::SpaceError => -2,
            Outcome::OtherError => -3,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::PermissionError => "permission_error",
            Outcome::SpaceError => "space_error",
            Outcome::OtherError => "other_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Everything known about a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Set the first time a source file is deleted after a successful copy.
    pub any_file_moved: bool,
    pub cancelled: bool,
    pub battery_low: bool,
    pub transfer_mode_active: bool,
    pub volume_removed: bool,
    pub percent_complete: u8,
    pub files_moved: u64,
    pub bytes_moved: u64,
    /// Display text of the failure behind a non-success outcome.
    pub detail: Option<String>,
}

/// The one user-facing result of a run, chosen by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    BatteryLow,
    TransferModeEnabled,
    VolumeRemoved,
    Cancelled,
    NoSpace,
    NothingMoved,
    Success,
    Failed(Outcome),
}

impl RunReport {
    /// Report for a run whose cancel arrived before it touched any file.
    pub fn cancelled_before_start(signals: &RunSignals) -> Self {
        RunReport {
            outcome: Outcome::Success,
            any_file_moved: false,
            cancelled: true,
            battery_low: signals.battery_low(),
            transfer_mode_active: signals.transfer_mode_active(),
            volume_removed: signals.volume_removed(),
            percent_complete: 0,
            files_moved: 0,
            bytes_moved: 0,
            detail: None,
        }
    }

    /// Battery-low, then transfer mode, then volume removal, then user cancel,
    /// then no space, then nothing moved, then success, then other failures.
    pub fn verdict(&self) -> Verdict {
        if self.battery_low {
            Verdict::BatteryLow
        } else if self.transfer_mode_active {
            Verdict::TransferModeEnabled
        } else if self.volume_removed {
            Verdict::VolumeRemoved
        } else if self.cancelled {
            Verdict::Cancelled
        } else if self.outcome == Outcome::SpaceError {
            Verdict::NoSpace
        } else if !self.any_file_moved {
            Verdict::NothingMoved
        } else if self.outcome == Outcome::Success {
            Verdict::Success
        } else {
            Verdict::Failed(self.outcome)
        }
    }
}

impl Verdict {
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::BatteryLow => "Battery is low; moving stopped. Charge the device and try again.",
            Verdict::TransferModeEnabled => {
                "USB file transfer is active; moving stopped. Disable MTP/PTP and try again."
            }
            Verdict::VolumeRemoved => "The storage volume was removed; moving stopped.",
            Verdict::Cancelled => "Moving cancelled. Files already moved stay on the destination.",
            Verdict::NoSpace => "Not enough space on the destination; only part of the files were moved.",
            Verdict::NothingMoved => "No files were moved.",
            Verdict::Success => "All selected files were moved.",
            Verdict::Failed(Outcome::PermissionError) => {
                "Moving failed: a file or folder could not be read, written or deleted."
            }
            Verdict::Failed(_) => "Moving failed because of an I/O error.",
        }
    }

    /// True for the verdicts that are not a failure from the user's point of view.
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Success | Verdict::NothingMoved)
    }
}
