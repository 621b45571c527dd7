//! `user_nl_cam` override generation.
//!
//! The override block is appended to the namelist file as-is; it is never
//! merged with what is already there. Performance-analysis mode then strips
//! every history field list (`fincl`, `fincl1` ... `fincl10`) from the whole
//! file so the run writes no history output beyond the defaults.

use crate::case::profile::RunProfile;
use crate::Result;
use regex::Regex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

/// Name of the CAM namelist override file inside a case directory.
pub const USER_NL_CAM: &str = "user_nl_cam";

static HISTORY_FIELD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*fincl\d*\s*=").expect("Invalid regex"));

/// Flags selecting the override content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamelistOptions {
    pub profile: RunProfile,
    pub chemistry: bool,
    pub perf_analysis: bool,
}

/// Build the override lines for `opts`, in the order they are written.
pub fn override_lines(opts: &NamelistOptions) -> Vec<String> {
    let mut lines = vec![format!("! camcase {} profile", opts.profile)];

    match opts.profile {
        RunProfile::Short => {
            lines.push("nhtfrq = 0, -24".to_string());
            lines.push("mfilt = 1, 5".to_string());
            lines.push("fincl2 = 'T', 'U', 'V', 'PS', 'PRECT'".to_string());
        }
        RunProfile::Long => {
            lines.push("nhtfrq = 0".to_string());
            lines.push("mfilt = 1".to_string());
        }
    }

    if opts.chemistry {
        lines.push("history_chemistry = .true.".to_string());
        lines.push("fincl1 = 'O3', 'CO', 'NO2', 'SO2'".to_string());
    }

    if opts.perf_analysis {
        lines.push("empty_htapes = .true.".to_string());
    }

    lines
}

/// Returns true if `line` assigns a history field list.
pub fn is_history_field_line(line: &str) -> bool {
    HISTORY_FIELD_LINE.is_match(line)
}

/// Remove every history field list line from `text`.
///
/// Other lines, including their order and the trailing newline, are kept.
pub fn strip_history_fields(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !is_history_field_line(line))
        .collect()
}

/// Append `lines` to the namelist file at `path`, creating it if needed.
pub fn append_overrides(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut block = String::new();
    for line in lines {
        block.push_str(line);
        block.push('\n');
    }
    file.write_all(block.as_bytes())?;
    Ok(())
}

/// Strip history field lines from the file at `path` in place.
///
/// Returns the number of lines removed.
pub fn filter_history_fields(path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let filtered = strip_history_fields(&text);
    let removed = text.lines().count() - filtered.lines().count();
    if removed > 0 {
        std::fs::write(path, filtered)?;
    }
    Ok(removed)
}
