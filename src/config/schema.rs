//! KDL schema for the camcase config file.
//!
//! # KDL Schema
//!
//! ```kdl
//! // Site defaults - sit between environment variables and built-in defaults
//! machine "derecho"
//! project "P93300642"
//! compset "FHIST"
//! queue "main"
//! walltime "01:00:00"
//! cesm-root "/glade/work/me/cesm"
//! threads 1
//! ```
//!
//! Unknown nodes are ignored so a newer config keeps working with an older
//! binary.

use crate::case::machine::Machine;
use crate::case::profile::validate_walltime;
use crate::{Error, Result};
use kdl::{KdlDocument, KdlNode};
use serde::Serialize;
use std::path::PathBuf;

/// Values read from config.kdl. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CamcaseConfig {
    pub machine: Option<String>,
    /// Project code charged for batch jobs
    pub project: Option<String>,
    pub compset: Option<String>,
    pub queue: Option<String>,
    /// `JOB_WALLCLOCK_TIME` request
    pub walltime: Option<String>,
    /// CESM checkout that holds `cime/scripts/create_newcase`
    pub cesm_root: Option<PathBuf>,
    /// OpenMP threads per task (`NTHRDS`)
    pub threads: Option<u32>,
}

impl CamcaseConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: KdlDocument = text
            .parse()
            .map_err(|e| Error::Config(format!("Failed to parse KDL: {}", e)))?;
        Self::from_kdl(&doc)
    }

    /// Parse config from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self> {
        let mut config = Self::new();

        config.machine = string_value(doc, "machine")?;
        config.project = string_value(doc, "project")?;
        config.compset = string_value(doc, "compset")?;
        config.queue = string_value(doc, "queue")?;
        config.walltime = string_value(doc, "walltime")?;
        config.cesm_root = string_value(doc, "cesm-root")?.map(PathBuf::from);

        if let Some(node) = doc.get("threads") {
            let value = first_value(node)?;
            let threads = value
                .as_integer()
                .filter(|i| (1..=i128::from(u32::MAX)).contains(i))
                .ok_or_else(|| {
                    Error::Config(format!("'threads' must be a positive integer, got {}", value))
                })?;
            config.threads = Some(threads as u32);
        }

        Ok(config)
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref machine) = self.machine {
            Machine::lookup(machine).map_err(|_| {
                Error::Config(format!(
                    "unknown machine '{}' (supported: {})",
                    machine,
                    Machine::names().join(", ")
                ))
            })?;
        }
        if let Some(ref walltime) = self.walltime {
            validate_walltime(walltime).map_err(|e| Error::Config(e.to_string()))?;
        }
        for (key, value) in [
            ("project", &self.project),
            ("compset", &self.compset),
            ("queue", &self.queue),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(Error::Config(format!("'{}' must not be empty", key)));
            }
        }
        Ok(())
    }
}

fn first_value(node: &KdlNode) -> Result<&kdl::KdlValue> {
    node.entries()
        .first()
        .map(|entry| entry.value())
        .ok_or_else(|| Error::Config(format!("'{}' needs a value", node.name().value())))
}

fn string_value(doc: &KdlDocument, name: &str) -> Result<Option<String>> {
    let Some(node) = doc.get(name) else {
        return Ok(None);
    };
    let value = first_value(node)?;
    value
        .as_string()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| Error::Config(format!("'{}' must be a string, got {}", name, value)))
}
