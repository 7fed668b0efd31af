use assert_fs::TempDir;
use media_relocate::Config;
use std::fs;
use std::path::PathBuf;

fn root(td: &TempDir) -> PathBuf {
    fs::canonicalize(td.path()).unwrap()
}

#[test]
fn accepts_readable_primary_and_absent_volume() {
    let td = TempDir::new().unwrap();
    let root = root(&td);
    let primary = root.join("primary");
    fs::create_dir_all(&primary).unwrap();

    let cfg = Config::new(&primary).with_volume(root.join("card_not_inserted"), false);
    cfg.validate().expect("absent volume is just unmounted");
}

#[test]
fn missing_primary_is_rejected() {
    let td = TempDir::new().unwrap();
    let err = Config::new(root(&td).join("absent")).validate().unwrap_err();
    assert!(format!("{err}").contains("does not exist"));
}

#[test]
fn primary_must_be_a_directory() {
    let td = TempDir::new().unwrap();
    let file = root(&td).join("file");
    fs::write(&file, b"x").unwrap();
    let err = Config::new(&file).validate().unwrap_err();
    assert!(format!("{err}").contains("not a directory"));
}

#[test]
fn disallow_volume_inside_primary() {
    let td = TempDir::new().unwrap();
    let primary = root(&td).join("primary");
    fs::create_dir_all(primary.join("inner")).unwrap();
    let err = Config::new(&primary)
        .with_volume(primary.join("inner"), false)
        .validate()
        .unwrap_err();
    assert!(format!("{err}").contains("must not contain each other"));
}

#[test]
fn disallow_volume_equal_to_primary() {
    let td = TempDir::new().unwrap();
    let primary = root(&td).join("primary");
    fs::create_dir_all(&primary).unwrap();
    let err = Config::new(&primary)
        .with_volume(&primary, false)
        .validate()
        .unwrap_err();
    assert!(format!("{err}").contains("resolves to the primary root"));
}

#[test]
fn relative_volume_is_rejected() {
    let td = TempDir::new().unwrap();
    let primary = root(&td).join("primary");
    fs::create_dir_all(&primary).unwrap();
    let err = Config::new(&primary)
        .with_volume("card", false)
        .validate()
        .unwrap_err();
    assert!(format!("{err}").contains("absolute"));
}
