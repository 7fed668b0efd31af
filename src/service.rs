//! Relocation worker and its handle.
//!
//! One background thread owns the volume provider, the last measurement and
//! the run loop. Callers talk to it through a [`ServiceHandle`] (typed mailbox
//! plus direct access to the shared [`RunSignals`]) and observe it through a
//! channel of [`PresentationEvent`]s. The worker never touches presentation
//! state and the caller never touches the filesystem.
//!
//! While a run is active the worker thread is busy inside the copy loop and
//! does not read its mailbox. Cancel and preemption therefore take effect
//! through the atomics in `RunSignals`, written by the handle on the caller's
//! thread; the mailbox message that follows only drives the events emitted
//! once the worker is idle again.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::groups::CategoryGroup;
use crate::index::MediaIndex;
use crate::measure::{MeasurementResult, Measurer};
use crate::platform::SpaceProbe;
use crate::relocate::{Relocator, RunReport};
use crate::signals::{BatteryStatus, BlockReason, RunSignals, Transition};
use crate::volumes::{MountState, RootPair, VolumeProvider};

const WORKER_THREAD_NAME: &str = "media-relocate-worker";

/// Something the outside world reported that may stop or block a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preemption {
    VolumeStateChanged {
        path: PathBuf,
        old_state: MountState,
        new_state: MountState,
    },
    Battery(BatteryStatus),
    UsbFileTransfer { active: bool },
}

/// Worker mailbox.
#[derive(Debug)]
enum WorkerMessage {
    MeasureRequested,
    RelocationRequested(Vec<CategoryGroup>),
    CancelRequested,
    ExternalPreemption(Preemption, Transition),
    Shutdown,
}

/// Everything the presentation side is told, in emission order.
#[derive(Debug, Clone)]
pub enum PresentationEvent {
    /// A measurement pass started.
    Scanning,
    Measured(MeasurementResult),
    /// A requested measurement was cancelled; the sizes are partial and the
    /// previous measurement stays in use.
    MeasurementCancelled(MeasurementResult),
    /// No mounted destination volume (measurement or volume removal).
    NoDestinationVolume,
    /// New runs are refused until the reason clears.
    Blocked(BlockReason),
    /// The last blocking condition cleared.
    Ready,
    /// Percent complete of the current run; non-decreasing, starts at 0.
    Progress(u8),
    /// Terminal event of a run, emitted exactly once per run.
    Finished(RunReport),
    /// A request the worker could not act on.
    Rejected(ServiceError),
}

/// Spawns the relocation worker.
pub struct RelocationService;

impl RelocationService {
    /// Start the worker thread. Returns the control handle and the event stream.
    pub fn spawn(
        volumes: Box<dyn VolumeProvider>,
        probe: Arc<dyn SpaceProbe>,
        index: Arc<dyn MediaIndex>,
    ) -> io::Result<(ServiceHandle, Receiver<PresentationEvent>)> {
        let (tx, rx) = unbounded::<WorkerMessage>();
        let (events_tx, events_rx) = unbounded::<PresentationEvent>();
        let signals = Arc::new(RunSignals::new());
        let roots = Arc::new(Mutex::new(None));

        let worker = Worker {
            volumes,
            probe,
            index,
            signals: Arc::clone(&signals),
            roots: Arc::clone(&roots),
            last: None,
            events: events_tx,
        };
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || worker.serve(rx))?;

        let handle = ServiceHandle {
            tx,
            signals,
            roots,
            thread: Arc::new(Mutex::new(Some(thread))),
        };
        Ok((handle, events_rx))
    }
}

/// Cloneable control surface of a running worker.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: Sender<WorkerMessage>,
    signals: Arc<RunSignals>,
    roots: Arc<Mutex<Option<RootPair>>>,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ServiceHandle {
    /// Queue a measurement pass. Refused while a run is active.
    pub fn start_measurement(&self) -> Result<(), ServiceError> {
        if self.signals.is_running() {
            return Err(ServiceError::RunInProgress);
        }
        self.signals.clear_cancel();
        self.send(WorkerMessage::MeasureRequested)
    }

    /// Queue a relocation run over `groups`. Refused while another run is active.
    pub fn start_relocation(&self, groups: &[CategoryGroup]) -> Result<(), ServiceError> {
        if self.signals.is_running() {
            return Err(ServiceError::RunInProgress);
        }
        self.signals.clear_cancel();
        self.send(WorkerMessage::RelocationRequested(groups.to_vec()))
    }

    /// Idempotent; safe from any thread, including a signal handler thread.
    /// Applies to whatever is in flight or queued: a request accepted before
    /// this call and not yet started ends as cancelled.
    pub fn request_cancel(&self) {
        self.signals.request_cancel();
        let _ = self.tx.send(WorkerMessage::CancelRequested);
    }

    pub fn on_volume_state_changed(&self, path: &Path, old_state: MountState, new_state: MountState) {
        if !new_state.is_mounted() && self.affects_current_roots(path) {
            self.signals.apply_volume_removed(true);
        }
        self.preempt(
            Preemption::VolumeStateChanged {
                path: path.to_path_buf(),
                old_state,
                new_state,
            },
            Transition::Unchanged,
        );
    }

    pub fn on_battery_status(&self, discharging: bool, level_percent: u8) {
        let status = BatteryStatus {
            discharging,
            level_percent,
        };
        let transition = self.signals.apply_battery(status);
        self.preempt(Preemption::Battery(status), transition);
    }

    pub fn on_usb_file_transfer_mode_changed(&self, active: bool) {
        let transition = self.signals.apply_transfer_mode(active);
        self.preempt(Preemption::UsbFileTransfer { active }, transition);
    }

    pub fn is_running(&self) -> bool {
        self.signals.is_running()
    }

    /// Cancel any run, stop the worker and wait for it to exit.
    pub fn shutdown(&self) {
        self.signals.request_cancel();
        let _ = self.tx.send(WorkerMessage::Shutdown);
        let thread = self.thread.lock().ok().and_then(|mut t| t.take());
        if let Some(thread) = thread {
            if thread.join().is_err() {
                warn!("Relocation worker panicked");
            }
        }
    }

    fn affects_current_roots(&self, path: &Path) -> bool {
        match self.roots.lock() {
            Ok(roots) => roots.as_ref().is_some_and(|r| r.involves(path)),
            Err(_) => false,
        }
    }

    fn preempt(&self, preemption: Preemption, transition: Transition) {
        let _ = self
            .tx
            .send(WorkerMessage::ExternalPreemption(preemption, transition));
    }

    fn send(&self, msg: WorkerMessage) -> Result<(), ServiceError> {
        self.tx.send(msg).map_err(|_| ServiceError::WorkerStopped)
    }
}

struct Worker {
    volumes: Box<dyn VolumeProvider>,
    probe: Arc<dyn SpaceProbe>,
    index: Arc<dyn MediaIndex>,
    signals: Arc<RunSignals>,
    roots: Arc<Mutex<Option<RootPair>>>,
    last: Option<MeasurementResult>,
    events: Sender<PresentationEvent>,
}

impl Worker {
    fn serve(mut self, rx: Receiver<WorkerMessage>) {
        debug!("Relocation worker started");
        for msg in rx.iter() {
            match msg {
                WorkerMessage::MeasureRequested => self.measure(true),
                WorkerMessage::RelocationRequested(groups) => self.relocate(&groups),
                WorkerMessage::CancelRequested => debug!("Cancel requested"),
                WorkerMessage::ExternalPreemption(p, transition) => self.preempted(p, transition),
                WorkerMessage::Shutdown => break,
            }
        }
        debug!("Relocation worker stopped");
    }

    fn emit(&self, event: PresentationEvent) {
        // The receiver going away only means nobody is listening any more.
        let _ = self.events.send(event);
    }

    fn set_roots(&mut self, roots: Option<RootPair>) {
        if let Ok(mut current) = self.roots.lock() {
            *current = roots;
        }
    }

    /// `cancellable` is false for the refreshes the worker schedules itself;
    /// a cancel left over from a run must not cut those short.
    fn measure(&mut self, cancellable: bool) {
        self.emit(PresentationEvent::Scanning);
        let mut measurer = Measurer::new(&*self.probe);
        if cancellable {
            measurer = measurer.with_signals(&self.signals);
        }
        let measured = measurer.resolve_and_measure(&*self.volumes);

        match measured {
            Ok(result) if result.cancelled => {
                self.emit(PresentationEvent::MeasurementCancelled(result));
            }
            Ok(result) => {
                self.set_roots(Some(result.roots.clone()));
                self.signals.apply_volume_removed(false);
                self.last = Some(result.clone());
                self.emit(PresentationEvent::Measured(result));
                if let Some(reason) = self.signals.blocking_reason() {
                    self.emit(PresentationEvent::Blocked(reason));
                }
            }
            Err(e) => {
                info!(error = %e, "Measurement found no destination");
                self.set_roots(None);
                self.last = None;
                self.emit(PresentationEvent::NoDestinationVolume);
            }
        }
    }

    fn relocate(&mut self, groups: &[CategoryGroup]) {
        if let Some(reason) = self.signals.blocking_reason() {
            info!(%reason, "Relocation refused");
            self.emit(PresentationEvent::Blocked(reason));
            return;
        }
        if self.signals.is_cancelled() {
            info!("Relocation cancelled before it started");
            self.emit(PresentationEvent::Finished(RunReport::cancelled_before_start(
                &self.signals,
            )));
            return;
        }
        let Some(measured) = self.last.as_ref() else {
            self.emit(PresentationEvent::Rejected(ServiceError::NotMeasured));
            return;
        };

        let request = measured.request_for(groups);
        let roots = measured.roots.clone();
        let events = &self.events;
        let report = Relocator::new(&roots, &*self.probe, &*self.index, &self.signals).run(
            &request,
            &mut |percent| {
                let _ = events.send(PresentationEvent::Progress(percent));
            },
        );
        self.emit(PresentationEvent::Finished(report));

        // Sizes changed (or a volume vanished): refresh for the caller.
        self.measure(false);
    }

    fn preempted(&mut self, preemption: Preemption, transition: Transition) {
        match preemption {
            Preemption::VolumeStateChanged {
                path,
                old_state,
                new_state,
            } => {
                debug!(path = %path.display(), %old_state, %new_state, "Volume state changed");
                if new_state.is_mounted() {
                    if !old_state.is_mounted() {
                        self.measure(false);
                    }
                } else if self.last.as_ref().is_some_and(|m| m.roots.involves(&path)) {
                    self.set_roots(None);
                    self.last = None;
                    self.emit(PresentationEvent::NoDestinationVolume);
                }
            }
            Preemption::Battery(_) => self.report_transition(BlockReason::BatteryLow, transition),
            Preemption::UsbFileTransfer { .. } => {
                self.report_transition(BlockReason::TransferModeActive, transition);
                if transition == Transition::Cleared {
                    self.measure(false);
                }
            }
        }
    }

    fn report_transition(&self, reason: BlockReason, transition: Transition) {
        match transition {
            Transition::Raised => self.emit(PresentationEvent::Blocked(reason)),
            Transition::Cleared => match self.signals.blocking_reason() {
                Some(other) => self.emit(PresentationEvent::Blocked(other)),
                None => self.emit(PresentationEvent::Ready),
            },
            Transition::Unchanged => {}
        }
    }
}
