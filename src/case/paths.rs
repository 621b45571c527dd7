//! Output root, case name and source tree resolution.

use crate::config::resolver::{
    EnvSnapshot, OUTPUT_ROOT_ENV, Resolved, RunConfig, SCRATCH_ENV, ValueSource,
};
use crate::case::machine::Machine;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Location of the case-creation script inside a CESM checkout.
pub const CREATE_NEWCASE_RELATIVE: &str = "cime/scripts/create_newcase";

/// Case name derived from compset and resolution: `<compset>.<resolution>`.
pub fn default_case_name(compset: &str, resolution: &str) -> String {
    format!("{}.{}", compset, resolution)
}

/// Check a case name, explicit or derived. It becomes a single path segment.
pub fn validate_case_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidInput("case name must not be empty".to_string()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '%')))
    {
        return Err(Error::InvalidInput(format!(
            "case name '{}' contains '{}'; use letters, digits, '.', '_', '-' or '%'",
            name, c
        )));
    }
    Ok(name.to_string())
}

/// Append `account` to `base` unless `base` already ends with that segment.
///
/// Scratch variables on some systems already point at the per-user
/// directory (`/glade/derecho/scratch/jdoe`), others at the shared root.
pub fn with_account_segment(base: &Path, account: &str) -> PathBuf {
    if base.file_name().is_some_and(|last| last == account) {
        base.to_path_buf()
    } else {
        base.join(account)
    }
}

/// Resolve the directory that case directories are created under.
///
/// 1. `CAMCASE_OUTPUT_ROOT`, verbatim
/// 2. `SCRATCH` when it is an existing writable directory
/// 3. the machine scratch root
///
/// The account name is appended in cases 2 and 3 unless already present.
pub fn resolve_output_root(
    env: &EnvSnapshot,
    machine: &Machine,
    account: &str,
) -> Resolved<PathBuf> {
    if let Some(ref root) = env.output_root {
        return Resolved::new(root.clone(), ValueSource::EnvVar(OUTPUT_ROOT_ENV.to_string()));
    }

    if let Some(ref scratch) = env.scratch {
        if crate::sys::is_writable_dir(scratch) {
            return Resolved::new(
                with_account_segment(scratch, account),
                ValueSource::EnvVar(SCRATCH_ENV.to_string()),
            );
        }
        tracing::warn!(
            scratch = %scratch.display(),
            "SCRATCH is not a writable directory, using the machine scratch root"
        );
    }

    Resolved::new(
        with_account_segment(&machine.scratch_root(), account),
        ValueSource::Machine,
    )
}

/// Checks that must pass before anything is executed: the source tree
/// provides an executable `create_newcase` and the case directory does not
/// exist yet.
pub fn preflight(config: &RunConfig) -> Result<()> {
    let tool = config.create_newcase_path();
    if !crate::sys::is_executable_file(&tool) {
        return Err(Error::ToolNotFound { path: tool });
    }

    let case_dir = config.case_dir();
    if case_dir.exists() {
        return Err(Error::CaseExists(case_dir));
    }
    Ok(())
}
