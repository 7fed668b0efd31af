use serial_test::serial;
use std::fs;
use tempfile::tempdir;

use media_relocate::config::CONFIG_ENV_VAR;
use media_relocate::{LogLevel, default_config_path, default_log_path, load_config_from_xml};

fn set_env(value: &std::path::Path) {
    unsafe {
        std::env::set_var(CONFIG_ENV_VAR, value);
    }
}

fn clear_env() {
    unsafe {
        std::env::remove_var(CONFIG_ENV_VAR);
    }
}

#[test]
#[serial]
fn env_override_is_loaded() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg_path = base.join("custom.xml");
    fs::write(
        &cfg_path,
        format!(
            r#"<config>
  <primary_root>{0}/primary</primary_root>
  <volume><path>{0}/card</path><removable_bus>false</removable_bus></volume>
  <volume><path>{0}/usb</path><removable_bus>true</removable_bus></volume>
  <log_level>info</log_level>
</config>"#,
            base.display()
        ),
    )
    .unwrap();

    set_env(&cfg_path);
    let loaded = load_config_from_xml();
    let log = default_log_path();
    clear_env();

    let (path, cfg) = loaded.unwrap().expect("config present");
    assert_eq!(path, cfg_path);
    assert_eq!(cfg.primary_root, base.join("primary"));
    assert_eq!(cfg.volumes.len(), 2);
    assert!(cfg.volumes[1].removable_bus);
    assert_eq!(cfg.log_level, LogLevel::Info);
    // Log file colocates with an explicit config.
    assert_eq!(log.unwrap().parent(), Some(base.as_path()));
}

#[test]
#[serial]
fn env_override_directory_means_config_xml_inside() {
    let td = tempdir().unwrap();
    set_env(td.path());
    let resolved = default_config_path();
    clear_env();
    assert_eq!(resolved.unwrap(), td.path().join("config.xml"));
}

#[test]
#[serial]
fn relative_env_override_resolves_against_cwd() {
    set_env(std::path::Path::new("some/dir/cfg.xml"));
    let resolved = default_config_path();
    clear_env();
    let expected = std::env::current_dir().unwrap().join("some/dir/cfg.xml");
    assert_eq!(resolved.unwrap(), expected);
}

#[test]
#[serial]
fn missing_env_file_is_none_and_malformed_is_error() {
    let td = tempdir().unwrap();
    let missing = td.path().join("nope.xml");
    set_env(&missing);
    let none = load_config_from_xml();
    let bad = td.path().join("bad.xml");
    fs::write(&bad, "<config><primary_root>/x</primary_root><mystery/></config>").unwrap();
    set_env(&bad);
    let err = load_config_from_xml();
    clear_env();

    assert!(none.unwrap().is_none());
    assert!(!missing.exists(), "no template is written for an explicit path");
    assert!(err.is_err());
}
