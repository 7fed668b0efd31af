//! Core library for `media_relocate`.
//!
//! Measures the well-known media directories on the primary storage volume and
//! moves selected groups of them to a secondary volume, one file at a time
//! (copy, then delete the source), with cooperative cancellation and progress.
//!
//! The pieces compose bottom-up:
//! - [`volumes`] resolves the source/target root pair from the mounted volumes.
//! - [`measure`] sizes each [`CategoryGroup`] and snapshots free space on the target.
//! - [`relocate`] walks the selected trees and moves files, producing a [`RunReport`].
//! - [`service`] runs both on a dedicated worker thread behind a typed mailbox.

pub mod cli;
pub mod config;
pub mod errors;
pub mod groups;
pub mod index;
pub mod measure;
pub mod output;
pub mod platform;
pub mod relocate;
pub mod service;
pub mod signals;
pub mod volumes;

pub use config::{
    Config, LogLevel, VolumeSpec, default_config_path, default_log_path, load_config_from_xml,
    load_config_from_xml_path, path_has_symlink_ancestor,
};
pub use errors::{RelocateError, ServiceError};
pub use groups::CategoryGroup;
pub use index::{LogIndex, MediaIndex, NoopIndex};
pub use measure::{MeasurementResult, Measurer, NoDestinationVolume};
pub use platform::{SpaceProbe, StatvfsProbe};
pub use relocate::{Outcome, RelocationRequest, Relocator, RunReport, Verdict};
pub use service::{PresentationEvent, Preemption, RelocationService, ServiceHandle};
pub use signals::{BatteryStatus, BlockReason, LOW_BATTERY_LEVEL, RunSignals, Transition};
pub use volumes::{ConfiguredVolumes, MountState, RootPair, StorageRoot, VolumeInfo, VolumeProvider};
