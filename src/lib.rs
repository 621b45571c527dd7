//! camcase - create CESM/CAM cases and compare ESMF timing summaries.
//!
//! This library provides the core functionality for the `camcase` CLI tool:
//! run configuration resolution, the CIME command sequence that provisions a
//! case, namelist override generation, and the ESMF timing report tooling.

pub mod case;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod logging;
pub mod sys;
pub mod timing;

use std::path::PathBuf;

/// Library-level error type for camcase operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported machine '{name}'")]
    UnsupportedMachine {
        name: String,
        supported: Vec<String>,
    },

    #[error("Unsupported resolution '{name}'")]
    UnsupportedResolution {
        name: String,
        supported: Vec<String>,
    },

    #[error("create_newcase not found or not executable at {}", .path.display())]
    ToolNotFound { path: PathBuf },

    #[error("Case directory already exists: {}", .0.display())]
    CaseExists(PathBuf),

    #[error("`{command}` exited with status {code}")]
    ToolFailed { command: String, code: i32 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Timing data error: {0}")]
    Timing(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Invalid input exits with 2, a failed external tool passes its own
    /// status through, everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidInput(_)
            | Error::UnsupportedMachine { .. }
            | Error::UnsupportedResolution { .. } => 2,
            Error::ToolFailed { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}

/// Result type alias for camcase operations.
pub type Result<T> = std::result::Result<T, Error>;
