mod common;

use common::{RecordingIndex, ScriptedProbe, roots_under, write_file};
use media_relocate::{
    BatteryStatus, CategoryGroup, Measurer, Outcome, RelocationRequest, Relocator, RunSignals,
    Verdict,
};
use std::fs;
use tempfile::tempdir;

const FILE_LEN: usize = 100_000;

/// DCIM/{a,b,c}.bin, 100 KB each.
fn three_files(roots: &media_relocate::RootPair) -> Vec<Vec<u8>> {
    ["a.bin", "b.bin", "c.bin"]
        .iter()
        .map(|name| write_file(&roots.source.path.join("DCIM").join(name), FILE_LEN))
        .collect()
}

fn dcim_request(roots: &media_relocate::RootPair) -> RelocationRequest {
    Measurer::new(&ScriptedProbe::plenty())
        .measure(roots)
        .request_for(&[CategoryGroup::Dcim])
}

#[test]
fn cancel_mid_file_removes_partial_and_keeps_the_rest() {
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    let data = three_files(&roots);
    let request = dcim_request(&roots);

    let probe = ScriptedProbe::plenty();
    let index = RecordingIndex::default();
    let signals = RunSignals::new();
    let mut ticks = Vec::new();
    // 40% of 300 KB falls inside b.bin.
    let report = Relocator::new(&roots, &probe, &index, &signals).run(&request, &mut |p| {
        ticks.push(p);
        if p >= 40 {
            signals.request_cancel();
        }
    });

    assert!(report.cancelled);
    assert_eq!(report.verdict(), Verdict::Cancelled);
    assert!(report.any_file_moved);
    assert_eq!(report.files_moved, 1);

    let src = roots.source.path.join("DCIM");
    let dst = roots.target.path.join("DCIM");
    assert!(!src.join("a.bin").exists());
    assert_eq!(fs::read(dst.join("a.bin")).unwrap(), data[0]);

    assert_eq!(fs::read(src.join("b.bin")).unwrap(), data[1]);
    assert!(!dst.join("b.bin").exists(), "partial copy left behind");

    assert_eq!(fs::read(src.join("c.bin")).unwrap(), data[2]);
    assert!(!dst.join("c.bin").exists());

    // Frozen, not rewound.
    assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(report.percent_complete, *ticks.last().unwrap());
    assert!(report.percent_complete >= 40 && report.percent_complete < 67);
}

#[test]
fn space_exhaustion_before_third_file() {
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    let data = three_files(&roots);
    let request = dcim_request(&roots);

    // One free-space query per file: plenty, plenty, then less than a file.
    let probe = ScriptedProbe::new([u64::MAX, u64::MAX, (FILE_LEN - 1) as u64], u64::MAX);
    let signals = RunSignals::new();
    let report = Relocator::new(&roots, &probe, &RecordingIndex::default(), &signals)
        .run(&request, &mut |_| {});

    assert_eq!(report.outcome, Outcome::SpaceError);
    assert_eq!(report.verdict(), Verdict::NoSpace);
    assert!(!report.cancelled);
    assert_eq!(report.files_moved, 2);

    let src = roots.source.path.join("DCIM");
    let dst = roots.target.path.join("DCIM");
    assert!(!src.join("a.bin").exists());
    assert!(!src.join("b.bin").exists());
    assert_eq!(fs::read(dst.join("b.bin")).unwrap(), data[1]);
    assert_eq!(fs::read(src.join("c.bin")).unwrap(), data[2]);
    assert!(!dst.join("c.bin").exists());
}

#[test]
fn space_error_stops_later_groups() {
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    write_file(&roots.source.path.join("DCIM/a.bin"), 10);
    write_file(&roots.source.path.join("Music/m.mp3"), 10);

    let probe = ScriptedProbe::new([0], u64::MAX);
    let request = Measurer::new(&ScriptedProbe::plenty())
        .measure(&roots)
        .request_for(&CategoryGroup::ALL);
    let signals = RunSignals::new();
    let report = Relocator::new(&roots, &probe, &RecordingIndex::default(), &signals)
        .run(&request, &mut |_| {});

    assert_eq!(report.outcome, Outcome::SpaceError);
    assert!(!report.any_file_moved);
    assert!(roots.source.path.join("Music/m.mp3").exists());
}

#[test]
fn battery_low_mid_run_reports_battery_verdict() {
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    three_files(&roots);
    let request = dcim_request(&roots);

    let probe = ScriptedProbe::plenty();
    let signals = RunSignals::new();
    let report = Relocator::new(&roots, &probe, &RecordingIndex::default(), &signals).run(
        &request,
        &mut |p| {
            if p == 10 {
                signals.apply_battery(BatteryStatus {
                    discharging: true,
                    level_percent: 5,
                });
            }
        },
    );

    assert!(report.cancelled);
    assert!(report.battery_low);
    assert_eq!(report.verdict(), Verdict::BatteryLow);
    assert!(roots.source.path.join("DCIM/c.bin").exists());
}

#[test]
fn blocked_before_start_moves_nothing() {
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    three_files(&roots);
    let request = dcim_request(&roots);

    let signals = RunSignals::new();
    signals.apply_transfer_mode(true);
    let report = Relocator::new(&roots, &ScriptedProbe::plenty(), &RecordingIndex::default(), &signals)
        .run(&request, &mut |_| {});

    assert_eq!(report.verdict(), Verdict::TransferModeEnabled);
    assert_eq!(report.files_moved, 0);
    assert!(roots.source.path.join("DCIM/a.bin").exists());
    assert!(!roots.target.path.join("DCIM/a.bin").exists());
}
