//! Run coordination flags shared between the relocation worker and the outside world.
//!
//! The cancel flag and the three preemption flags are the only state written
//! from other threads while a run is active. Each is an independent atomic;
//! no invariant spans two of them.
//!
//! A preemption signal that arrives while a run is in flight also raises the
//! cancel flag, so the copy loop short-circuits exactly as for a user cancel.
//! The raise path stores the preemption flag before reading `running`, and
//! `begin_run` stores `running` before the worker reads the preemption flags,
//! so with SeqCst one of the two sides always observes the other.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Battery percentage at or below which a discharging device stops relocation.
pub const LOW_BATTERY_LEVEL: u8 = 15;

/// A battery status broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub discharging: bool,
    pub level_percent: u8,
}

impl BatteryStatus {
    pub fn is_low(&self) -> bool {
        self.discharging && self.level_percent <= LOW_BATTERY_LEVEL
    }
}

/// Effect of applying a signal to a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Raised,
    Cleared,
    Unchanged,
}

/// Why new runs are currently refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    BatteryLow,
    TransferModeActive,
    VolumeRemoved,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockReason::BatteryLow => "battery is low",
            BlockReason::TransferModeActive => "USB file transfer mode is active",
            BlockReason::VolumeRemoved => "a storage volume was removed",
        })
    }
}

#[derive(Debug, Default)]
pub struct RunSignals {
    running: AtomicBool,
    cancel: AtomicBool,
    battery_low: AtomicBool,
    transfer_mode: AtomicBool,
    volume_removed: AtomicBool,
}

impl RunSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop of the current run or measurement (idempotent).
    #[inline]
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Mark a run as started. A cancel requested before this point stays in
    /// effect; stale requests are dropped by `clear_cancel` when a new request
    /// is accepted.
    pub fn begin_run(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn end_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Drop a cancel request left over from an earlier request.
    pub fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    pub fn battery_low(&self) -> bool {
        self.battery_low.load(Ordering::SeqCst)
    }

    pub fn transfer_mode_active(&self) -> bool {
        self.transfer_mode.load(Ordering::SeqCst)
    }

    pub fn volume_removed(&self) -> bool {
        self.volume_removed.load(Ordering::SeqCst)
    }

    /// First reason (battery, transfer mode, volume) that blocks a new run.
    pub fn blocking_reason(&self) -> Option<BlockReason> {
        if self.battery_low() {
            Some(BlockReason::BatteryLow)
        } else if self.transfer_mode_active() {
            Some(BlockReason::TransferModeActive)
        } else if self.volume_removed() {
            Some(BlockReason::VolumeRemoved)
        } else {
            None
        }
    }

    /// Apply a battery broadcast. Low only latches while discharging; the
    /// flag clears once the device stops discharging.
    pub fn apply_battery(&self, status: BatteryStatus) -> Transition {
        if status.is_low() {
            info!(level = status.level_percent, "Battery is low, stopping relocation");
            self.raise(&self.battery_low)
        } else if !status.discharging {
            self.clear(&self.battery_low)
        } else {
            Transition::Unchanged
        }
    }

    /// Apply a USB file-transfer (MTP/PTP) mode change.
    pub fn apply_transfer_mode(&self, active: bool) -> Transition {
        if active {
            info!("USB file transfer mode enabled, stopping relocation");
            self.raise(&self.transfer_mode)
        } else {
            self.clear(&self.transfer_mode)
        }
    }

    /// Record that the source or target root left (or re-entered) the mounted state.
    pub fn apply_volume_removed(&self, removed: bool) -> Transition {
        if removed {
            self.raise(&self.volume_removed)
        } else {
            self.clear(&self.volume_removed)
        }
    }

    fn raise(&self, flag: &AtomicBool) -> Transition {
        let was = flag.swap(true, Ordering::SeqCst);
        if self.is_running() {
            self.request_cancel();
        }
        if was { Transition::Unchanged } else { Transition::Raised }
    }

    fn clear(&self, flag: &AtomicBool) -> Transition {
        if flag.swap(false, Ordering::SeqCst) {
            Transition::Cleared
        } else {
            Transition::Unchanged
        }
    }
}
