use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::settings::GateConfig;
use crate::{ConfigError, Result};

/// File picked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "kgate.toml";

/// Prefix of environment overrides, e.g. `KGATE__LABELS__VERSION_KEY`.
pub const ENV_PREFIX: &str = "KGATE";

pub fn load_config(path: Option<&str>) -> Result<GateConfig> {
    let mut builder = Config::builder();
    let file = match path {
        Some(p) => {
            let pathbuf = PathBuf::from(p);
            if !pathbuf.exists() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {p}"),
                )));
            }
            Some(pathbuf)
        }
        // Try default root-level file
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    if let Some(file) = file {
        debug!(path = %file.display(), "Loading kgate configuration file");
        builder = builder.add_source(File::from(file));
    }

    // Environment variable overrides, e.g., KGATE__EXCLUSIONS__OVERRIDE_CONFIG_NAME=my-override
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("exclusions.ignorable_secret_names")
            .with_list_parse_key("diff.volatile_fields"),
    );
    let cfg = builder
        .build()
        .map_err(|e| ConfigError::parse(format!("config build error: {e}")))?;
    let merged: GateConfig = cfg
        .try_deserialize()
        .map_err(|e| ConfigError::parse(format!("config deserialize error: {e}")))?;
    merged.validate()?;
    Ok(merged)
}

pub fn load_config_with_default_path<P: AsRef<Path>>(path: Option<P>) -> Result<GateConfig> {
    let p = path
        .as_ref()
        .map(|p| p.as_ref().to_string_lossy().to_string());
    load_config(p.as_deref())
}
