//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor,
};
pub use types::{Config, LogLevel, VolumeSpec};
pub use xml::{
    create_template_config, ensure_default_config_exists, load_config_from_xml,
    load_config_from_xml_path, parse_config_xml,
};

/// Conventional primary external storage root used when nothing is configured.
pub const PRIMARY_ROOT_DEFAULT: &str = "/storage/emulated/0";
