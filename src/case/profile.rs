//! Run-length profiles and validation of CIME stop/wallclock values.

use crate::{Error, Result};
use serde::Serialize;

/// How long a case runs by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunProfile {
    /// Five simulated days, for smoke tests and timing runs
    #[default]
    Short,
    /// Twelve simulated months
    Long,
}

impl RunProfile {
    /// `STOP_OPTION` for this profile.
    pub fn stop_option(&self) -> &'static str {
        match self {
            RunProfile::Short => "ndays",
            RunProfile::Long => "nmonths",
        }
    }

    /// `STOP_N` for this profile.
    pub fn stop_n(&self) -> u32 {
        match self {
            RunProfile::Short => 5,
            RunProfile::Long => 12,
        }
    }

    /// Batch wallclock request used when none is configured.
    pub fn default_walltime(&self) -> &'static str {
        match self {
            RunProfile::Short => "00:30:00",
            RunProfile::Long => "06:00:00",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunProfile::Short => "short",
            RunProfile::Long => "long",
        }
    }
}

impl std::fmt::Display for RunProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Values CIME accepts for `STOP_OPTION`.
pub const STOP_OPTIONS: &[&str] = &[
    "none", "never", "nsteps", "nstep", "nseconds", "nsecond", "nminutes", "nminute", "nhours",
    "nhour", "ndays", "nday", "nmonths", "nmonth", "nyears", "nyear", "date", "end",
];

/// Check a `STOP_OPTION` value, returning it lowercased.
pub fn validate_stop_option(value: &str) -> Result<String> {
    let lower = value.trim().to_ascii_lowercase();
    if STOP_OPTIONS.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        Err(Error::InvalidInput(format!(
            "invalid stop option '{}' (expected one of: {})",
            value,
            STOP_OPTIONS.join(", ")
        )))
    }
}

/// Check a `JOB_WALLCLOCK_TIME` value in `HH:MM:SS` or `HH:MM` form.
pub fn validate_walltime(value: &str) -> Result<String> {
    let invalid = || {
        Error::InvalidInput(format!(
            "invalid wall-time '{}' (expected HH:MM:SS)",
            value
        ))
    };

    let parts: Vec<&str> = value.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid());
    }
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if i > 0 && (part.len() != 2 || part.parse::<u32>().map_err(|_| invalid())? >= 60) {
            return Err(invalid());
        }
    }
    Ok(value.trim().to_string())
}
