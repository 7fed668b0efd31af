#![cfg(unix)]

mod common;

use common::{RecordingIndex, ScriptedProbe, roots_under, running_as_root, write_file};
use media_relocate::{CategoryGroup, Measurer, Outcome, Relocator, RunSignals, Verdict};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::tempdir;

fn set_mode(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[test]
fn unreadable_source_file_is_permission_error() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    let locked = roots.source.path.join("DCIM/b.jpg");
    write_file(&roots.source.path.join("DCIM/a.jpg"), 10);
    write_file(&locked, 10);
    write_file(&roots.source.path.join("DCIM/c.jpg"), 10);
    set_mode(&locked, 0o000);

    let probe = ScriptedProbe::plenty();
    let request = Measurer::new(&probe)
        .measure(&roots)
        .request_for(&[CategoryGroup::Dcim]);
    let signals = RunSignals::new();
    let report = Relocator::new(&roots, &probe, &RecordingIndex::default(), &signals)
        .run(&request, &mut |_| {});

    set_mode(&locked, 0o644);
    assert_eq!(report.outcome, Outcome::PermissionError);
    assert_eq!(report.verdict(), Verdict::Failed(Outcome::PermissionError));
    assert!(report.detail.unwrap().contains("b.jpg"));
    assert!(!roots.source.path.join("DCIM/a.jpg").exists());
    assert!(locked.exists());
    assert!(roots.source.path.join("DCIM/c.jpg").exists());
}

#[test]
fn read_only_destination_directory_is_permission_error() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    write_file(&roots.source.path.join("Music/a.mp3"), 10);
    let dest_music = roots.target.path.join("Music");
    fs::create_dir_all(&dest_music).unwrap();
    set_mode(&dest_music, 0o555);

    let probe = ScriptedProbe::plenty();
    let request = Measurer::new(&probe)
        .measure(&roots)
        .request_for(&[CategoryGroup::Music]);
    let signals = RunSignals::new();
    let report = Relocator::new(&roots, &probe, &RecordingIndex::default(), &signals)
        .run(&request, &mut |_| {});

    set_mode(&dest_music, 0o755);
    assert_eq!(report.outcome, Outcome::PermissionError);
    assert!(!report.any_file_moved);
    // Nothing moved takes precedence over the failure in the user-facing verdict.
    assert_eq!(report.verdict(), Verdict::NothingMoved);
    assert!(roots.source.path.join("Music/a.mp3").exists());
}

#[test]
fn undeletable_source_keeps_both_copies() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().unwrap();
    let roots = roots_under(td.path());
    let dir = roots.source.path.join("Pictures");
    let data = write_file(&dir.join("p.png"), 32);
    set_mode(&dir, 0o555);

    let probe = ScriptedProbe::plenty();
    let request = Measurer::new(&probe)
        .measure(&roots)
        .request_for(&[CategoryGroup::Dcim]);
    let signals = RunSignals::new();
    let report = Relocator::new(&roots, &probe, &RecordingIndex::default(), &signals)
        .run(&request, &mut |_| {});

    set_mode(&dir, 0o755);
    assert_eq!(report.outcome, Outcome::PermissionError);
    assert_eq!(fs::read(dir.join("p.png")).unwrap(), data);
    assert_eq!(fs::read(roots.target.path.join("Pictures/p.png")).unwrap(), data);
}
