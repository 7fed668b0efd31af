//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler, then
//! drives the relocation service: measure, select, move, report.

use anyhow::{Context, Result, bail};
use crossbeam_channel::Receiver;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use media_relocate::cli::Args;
use media_relocate::config::{CONFIG_ENV_VAR, ensure_default_config_exists};
use media_relocate::output as out;
use media_relocate::platform::format_bytes;
use media_relocate::{
    CategoryGroup, Config, LogIndex, MeasurementResult, PresentationEvent, RelocationService,
    RunReport, ServiceHandle, StatvfsProbe, default_config_path, load_config_from_xml,
};

use crate::logging::init_tracing;

const MUSIC_NOTICE: &str = "Ringtones, alarms and notification sounds chosen from moved files may stop working until they are selected again.";

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    if args.print_config {
        print_config_location();
        return Ok(ExitCode::SUCCESS);
    }

    // Create template config if none exists (before logging init)
    if let Some(path) = ensure_default_config_exists()? {
        out::print_success(&format!(
            "A template config was written to: {}",
            path.display()
        ));
        out::print_info(&format!(
            "Edit `primary_root` and the `<volume>` entries, then re-run. To use a different location set {CONFIG_ENV_VAR}."
        ));
        if args.primary_root.is_none() || args.target_root.is_none() {
            return Ok(ExitCode::SUCCESS);
        }
    }

    let mut cfg = match load_config_from_xml()? {
        Some((path, cfg)) => {
            debug!(path = %path.display(), "Loaded config");
            cfg
        }
        None => Config::default(),
    };
    // CLI wins over XML
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
    })?;
    let guard_slot = Arc::new(Mutex::new(guard));

    debug!(?args, "Starting media_relocate");
    cfg.validate()?;

    let (handle, events) = RelocationService::spawn(
        Box::new(cfg.volume_provider()),
        Arc::new(StatvfsProbe),
        Arc::new(LogIndex),
    )
    .context("start relocation worker")?;

    install_interrupt_handler(handle.clone(), Arc::clone(&guard_slot));

    let result = drive(&args, &handle, &events);
    handle.shutdown();

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR) {
        out::print_info(&format!(
            "Using {CONFIG_ENV_VAR} (explicit):\n  {}",
            std::path::Path::new(&p).display()
        ));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info(
                    "No config file exists there yet. Run without --print-config to create a template.",
                );
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

/// First Ctrl-C cancels the run cooperatively; a second one exits immediately.
fn install_interrupt_handler(
    handle: ServiceHandle,
    guard_slot: Arc<Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>>,
) {
    let interrupted = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
            std::process::exit(130);
        }
        out::print_warn("Received interrupt; stopping after the current chunk (press again to abort)...");
        handle.request_cancel();
    })
    .expect("failed to install signal handler");
}

fn drive(args: &Args, handle: &ServiceHandle, events: &Receiver<PresentationEvent>) -> Result<ExitCode> {
    handle.start_measurement()?;
    let measured = match wait_for_measurement(events)? {
        Measurement::Ready(m) => m,
        Measurement::NoDestination => {
            out::print_error("No destination volume is mounted; nothing can be moved.");
            return Ok(ExitCode::FAILURE);
        }
        Measurement::Cancelled => {
            out::print_warn("Measurement cancelled; nothing was moved.");
            return Ok(ExitCode::FAILURE);
        }
    };
    print_measurement(&measured);
    if args.measure_only {
        return Ok(ExitCode::SUCCESS);
    }

    let selection = choose_groups(args, &measured);
    if selection.is_empty() {
        out::print_info("Nothing to move.");
        return Ok(ExitCode::SUCCESS);
    }
    if selection.contains(&CategoryGroup::Music) {
        out::print_warn(MUSIC_NOTICE);
    }
    if measured.exceeds_free_space(&selection) {
        out::print_warn(&format!(
            "Selected {} but only {} is free on the destination.",
            format_bytes(measured.total_for(&selection)),
            format_bytes(measured.free_bytes_on_target)
        ));
        if !args.allow_partial {
            out::print_error("Re-run with --allow-partial to move as many files as fit.");
            return Ok(ExitCode::FAILURE);
        }
    }

    handle.start_relocation(&selection)?;
    let report = wait_for_report(events)?;
    Ok(print_verdict(&report))
}

enum Measurement {
    Ready(MeasurementResult),
    NoDestination,
    Cancelled,
}

/// Wait for the event that answers a MeasureRequested.
fn wait_for_measurement(events: &Receiver<PresentationEvent>) -> Result<Measurement> {
    loop {
        match events.recv().context("relocation worker stopped")? {
            PresentationEvent::Measured(m) => return Ok(Measurement::Ready(m)),
            PresentationEvent::NoDestinationVolume => return Ok(Measurement::NoDestination),
            PresentationEvent::MeasurementCancelled(_) => return Ok(Measurement::Cancelled),
            PresentationEvent::Rejected(e) => bail!(e),
            PresentationEvent::Blocked(reason) => out::print_warn(&format!("Moving is blocked: {reason}")),
            other => debug!(?other, "Ignoring event while measuring"),
        }
    }
}

fn wait_for_report(events: &Receiver<PresentationEvent>) -> Result<RunReport> {
    loop {
        match events.recv().context("relocation worker stopped")? {
            PresentationEvent::Progress(p) => out::print_progress(p),
            PresentationEvent::Finished(report) => {
                out::finish_progress();
                return Ok(report);
            }
            PresentationEvent::Rejected(e) => bail!(e),
            PresentationEvent::Blocked(reason) => bail!("moving is blocked: {reason}"),
            other => debug!(?other, "Ignoring event while moving"),
        }
    }
}

fn print_measurement(m: &MeasurementResult) {
    out::print_user(&format!(
        "Source: {}\nTarget: {} ({} free)",
        m.roots.source.path.display(),
        m.roots.target.path.display(),
        format_bytes(m.free_bytes_on_target)
    ));
    for group in CategoryGroup::ALL {
        let bytes = m.group_bytes(group);
        let note = if m.is_selectable(group) { "" } else { " (nothing to move)" };
        out::print_user(&format!(
            "  {:<6} {:<20} {:>10}{note}",
            group.to_string(),
            group.label(),
            format_bytes(bytes)
        ));
    }
}

/// Requested groups (or every selectable one), minus the empty ones.
fn choose_groups(args: &Args, m: &MeasurementResult) -> Vec<CategoryGroup> {
    if args.groups.is_empty() {
        return m.selectable_groups();
    }
    CategoryGroup::normalize(&args.groups)
        .into_iter()
        .filter(|g| {
            let keep = m.is_selectable(*g);
            if !keep {
                out::print_info(&format!("{g}: nothing to move, skipping"));
            }
            keep
        })
        .collect()
}

fn print_verdict(report: &RunReport) -> ExitCode {
    let verdict = report.verdict();
    info!(?verdict, code = report.outcome.code(), "Run complete");
    let summary = format!(
        "{} ({} files, {})",
        verdict.message(),
        report.files_moved,
        format_bytes(report.bytes_moved)
    );
    let ok = verdict.is_ok() && report.outcome.code() == 0;
    if ok {
        out::print_success(&summary);
        ExitCode::SUCCESS
    } else {
        out::print_error(&summary);
        if let Some(detail) = &report.detail {
            out::print_error(detail);
        }
        ExitCode::FAILURE
    }
}
