//! Standardized error messages for the CLI.
//!
//! All errors printed by `camcase` follow the format:
//! ```text
//! camcase: error: <category>: <brief>
//!
//!   <details>
//!
//!   <suggestion>
//! ```
//!
//! [`report`] turns a library [`Error`] into that text, filling in the
//! details and remediation hints each error kind carries.

use crate::Error;
use std::fmt::Write;

/// Error category shown after the `camcase: error:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unsupported or malformed user input
    Input,
    /// Config file problems
    Config,
    /// External toolchain missing
    Dependency,
    /// Case directory state
    Case,
    /// External tool failures
    Tool,
    /// ESMF timing data problems
    Timing,
    /// Filesystem and serialization errors
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Config => write!(f, "config"),
            Self::Dependency => write!(f, "dependency"),
            Self::Case => write!(f, "case"),
            Self::Tool => write!(f, "tool"),
            Self::Timing => write!(f, "timing"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// Format a standardized error message.
///
/// # Arguments
/// * `category` - The error category
/// * `brief` - A brief description of the error
/// * `details` - Optional detailed context (will be indented)
/// * `suggestion` - Optional suggestion for fixing the error (will be indented)
pub fn format_error(
    category: ErrorCategory,
    brief: &str,
    details: Option<&str>,
    suggestion: Option<&str>,
) -> String {
    let mut msg = format!("camcase: error: {}: {}", category, brief);
    push_indented(&mut msg, details);
    push_indented(&mut msg, suggestion);
    msg
}

/// Format a standardized warning message.
pub fn format_warning(category: ErrorCategory, brief: &str, details: Option<&str>) -> String {
    let mut msg = format!("camcase: warning: {}: {}", category, brief);
    push_indented(&mut msg, details);
    msg
}

fn push_indented(msg: &mut String, block: Option<&str>) {
    let Some(block) = block else {
        return;
    };
    msg.push_str("\n\n");
    for line in block.lines() {
        let _ = writeln!(msg, "  {}", line);
    }
    if msg.ends_with('\n') {
        msg.pop();
    }
}

/// Render a library error in the standardized format.
pub fn report(err: &Error) -> String {
    match err {
        Error::UnsupportedMachine { name, supported } => format_error(
            ErrorCategory::Input,
            &format!("unsupported machine '{}'", name),
            Some(&format!("Supported machines: {}", supported.join(", "))),
            Some("Pass --machine or set CAMCASE_MACHINE to one of the machines above."),
        ),
        Error::UnsupportedResolution { name, supported } => format_error(
            ErrorCategory::Input,
            &format!("unsupported resolution '{}'", name),
            Some(&format!("Supported resolutions:\n{}", supported.join("\n"))),
            Some("Run `camcase resolutions` to see processor counts for each grid."),
        ),
        Error::InvalidInput(msg) => format_error(
            ErrorCategory::Input,
            msg,
            None,
            Some("Run `camcase --help` for usage."),
        ),
        Error::ToolNotFound { path } => format_error(
            ErrorCategory::Dependency,
            "create_newcase not found",
            Some(&format!(
                "Expected an executable at: {}",
                path.display()
            )),
            Some(
                "Point --src (or CESM_ROOT) at a CESM checkout and run\n\
                 `./bin/git-fleximod update` there to fetch CIME.",
            ),
        ),
        Error::CaseExists(path) => format_error(
            ErrorCategory::Case,
            "case directory already exists",
            Some(&path.display().to_string()),
            Some("Remove it or choose another name with --case-name."),
        ),
        Error::ToolFailed { command, code } => format_error(
            ErrorCategory::Tool,
            "external command failed",
            Some(&format!("{}\nexit status: {}", command, code)),
            Some("The case directory was left as-is for inspection."),
        ),
        Error::Config(msg) => format_error(ErrorCategory::Config, msg, None, None),
        Error::Timing(msg) => format_error(ErrorCategory::Timing, msg, None, None),
        Error::Io(_) | Error::Json(_) | Error::Csv(_) | Error::Other(_) => {
            format_error(ErrorCategory::Io, &err.to_string(), None, None)
        }
    }
}
