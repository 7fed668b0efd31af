//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Creates a secure template if missing (unless MEDIA_RELOCATE_CONFIG is set).
//!
//! Notes:
//! - This module only reads/writes the config file; directory validation happens elsewhere.
//! - Unknown XML fields are a hard error to surface misconfigurations early.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::PRIMARY_ROOT_DEFAULT;
use super::paths::{CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel, VolumeSpec};
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    primary_root: Option<String>,
    #[serde(rename = "volume", default)]
    volumes: Vec<XmlVolume>,
    log_level: Option<String>,
    log_file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlVolume {
    path: String,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    removable_bus: Option<bool>,
}

// Tolerate surrounding whitespace in boolean fields.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<bool>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected true/false, got '{s}'"))),
    }
}

fn trimmed_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim).filter(|t| !t.is_empty()).map(PathBuf::from)
}

/// Parse config XML text into a Config; absent fields keep their defaults.
pub fn parse_config_xml(contents: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(contents).context("parse config xml")?;
    let mut cfg = Config::default();

    if let Some(p) = trimmed_path(parsed.primary_root.as_deref()) {
        cfg.primary_root = p;
    }
    for vol in parsed.volumes {
        let Some(path) = trimmed_path(Some(&vol.path)) else {
            bail!("<volume> entry has an empty <path>");
        };
        cfg.volumes.push(VolumeSpec {
            path,
            removable_bus: vol.removable_bus.unwrap_or(false),
        });
    }
    if let Some(s) = parsed.log_level.as_deref() {
        cfg.log_level = s
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)
            .context("log_level")?;
    }
    if let Some(p) = trimmed_path(parsed.log_file.as_deref()) {
        cfg.log_file = Some(p);
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    parse_config_xml(&contents).with_context(|| format!("in config file '{}'", path.display()))
}

/// Load the config in use (env override or OS default path).
/// Returns Ok(None) when the file does not exist.
pub fn load_config_from_xml() -> Result<Option<(PathBuf, Config)>> {
    let path = default_config_path()?;
    if !path.exists() {
        debug!(path = %path.display(), "No config file");
        return Ok(None);
    }
    let cfg = load_config_from_xml_path(&path)?;
    Ok(Some((path, cfg)))
}

/// Create default template config file and parent directory (best-effort permissions).
/// Refuses to write through a symlinked ancestor.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/media_relocate.log".into());

    let content = format!(
        "<!--\n  media_relocate configuration (XML)\n\n  Fields:\n    primary_root   -> primary external storage; DCIM/Music trees are moved away from here\n    volume         -> candidate target volume (repeatable, first mounted wins)\n      path           -> absolute root of the volume; mounted while the directory exists\n      removable_bus  -> true for USB mass storage; such volumes are never targets\n    log_level      -> quiet | normal | info | debug\n    log_file       -> path to log file (optional; console output is always kept)\n\n  Notes:\n    - CLI flags override XML values.\n-->\n<config>\n  <primary_root>{}</primary_root>\n  <volume>\n    <path>/storage/sdcard1</path>\n    <removable_bus>false</removable_bus>\n  </volume>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n</config>\n",
        PRIMARY_ROOT_DEFAULT, suggested_log,
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}

/// Create the default config if MEDIA_RELOCATE_CONFIG is not set and the file is missing.
/// Returns the created path so the CLI can tell the user.
pub fn ensure_default_config_exists() -> Result<Option<PathBuf>> {
    if env::var_os(CONFIG_ENV_VAR).is_some() {
        return Ok(None);
    }
    let path = default_config_path()?;
    if path.exists() {
        return Ok(None);
    }
    create_template_config(&path)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_volumes_in_order() {
        let cfg = parse_config_xml(
            "<config>\
               <primary_root> /sd/primary </primary_root>\
               <volume><path>/sd/usb</path><removable_bus> true </removable_bus></volume>\
               <volume><path>/sd/card</path></volume>\
               <log_level>debug</log_level>\
             </config>",
        )
        .unwrap();
        assert_eq!(cfg.primary_root, PathBuf::from("/sd/primary"));
        assert_eq!(
            cfg.volumes,
            vec![
                VolumeSpec { path: "/sd/usb".into(), removable_bus: true },
                VolumeSpec { path: "/sd/card".into(), removable_bus: false },
            ]
        );
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn empty_config_keeps_defaults() {
        let cfg = parse_config_xml("<config></config>").unwrap();
        assert_eq!(cfg.primary_root, PathBuf::from(PRIMARY_ROOT_DEFAULT));
        assert!(cfg.volumes.is_empty());
        assert_eq!(cfg.log_level, LogLevel::Normal);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(parse_config_xml("<config><download_base>/x</download_base></config>").is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        assert!(parse_config_xml("<config><log_level>loud</log_level></config>").is_err());
    }
}
