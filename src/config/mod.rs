//! Configuration for camcase.
//!
//! ## config.kdl - site defaults
//!
//! Located at `$CAMCASE_CONFIG` when set, otherwise
//! `~/.config/camcase/config.kdl`. The file is optional.
//!
//! Contains:
//! - `machine` - CIME machine name
//! - `project` - project code charged for batch jobs
//! - `compset`, `queue`, `walltime`, `threads`
//! - `cesm-root` - CESM checkout holding `cime/scripts/create_newcase`
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > built-in defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    CaseOverrides, EnvSnapshot, Resolved, RunConfig, ValueSource, resolve_run_config,
};
pub use schema::CamcaseConfig;

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CAMCASE_CONFIG";

/// Location of the config file, if one can be determined.
pub fn config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::config_dir().map(|d| d.join("camcase").join("config.kdl")),
    }
}

/// Load and validate the config file at `path`.
///
/// A missing file yields an empty config.
pub fn load_config(path: &Path) -> Result<CamcaseConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(CamcaseConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config = CamcaseConfig::parse(&text)
        .and_then(|c| c.validate().map(|_| c))
        .map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the config file from its default location.
pub fn load_default_config() -> Result<CamcaseConfig> {
    match config_path() {
        Some(path) => load_config(&path),
        None => Ok(CamcaseConfig::default()),
    }
}
