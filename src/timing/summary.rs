//! Parser for the region table of an `ESMF_Profile.summary` file.
//!
//! Region lines look like
//!
//! ```text
//!   [ATM] RunPhase1        128  128  MULTIPLE  12.3456  11.0001  17  13.9000  3
//! ```
//!
//! The `PETs PEs` pair is absent in single-PET summaries. Leading
//! whitespace encodes nesting depth.

use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// File name ESMF writes the summary to.
pub const SUMMARY_FILE: &str = "ESMF_Profile.summary";

static REGION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<indent>\s*)(?P<name>\S.*?\S|\S)\s+(?:(?P<pets>\d+)\s+(?P<pes>\d+)\s+)?(?P<count>MULTIPLE|\d+)\s+(?P<mean>\d+\.\d+)\s+(?P<min>\d+\.\d+)\s+(?P<minpet>\d+)\s+(?P<max>\d+\.\d+)\s+(?P<maxpet>\d+)\s*$",
    )
    .expect("Invalid regex")
});

/// One parsed region row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRow {
    /// Leading whitespace width; deeper rows are children
    pub indent: usize,
    pub region: String,
    pub pets: Option<u64>,
    pub pes: Option<u64>,
    /// Call count, `None` when ESMF reports `MULTIPLE`
    pub count: Option<u64>,
    /// Mean time over PETs, seconds
    pub mean: f64,
    pub min: f64,
    pub min_pet: u64,
    pub max: f64,
    pub max_pet: u64,
}

/// Parse a single line, returning `None` if it is not a region row or a
/// time overflows `f64`.
pub fn parse_line(line: &str) -> Option<ProfileRow> {
    let caps = REGION_LINE.captures(line)?;
    let int = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());
    let float = |name: &str| {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    Some(ProfileRow {
        indent: caps.name("indent").map_or(0, |m| m.as_str().chars().count()),
        region: caps.name("name")?.as_str().trim().to_string(),
        pets: int("pets"),
        pes: int("pes"),
        count: int("count"),
        mean: float("mean")?,
        min: float("min")?,
        min_pet: int("minpet")?,
        max: float("max")?,
        max_pet: int("maxpet")?,
    })
}

/// Parse the region rows of a summary. Lines that are not region rows are
/// skipped; a text without any region row is an error.
pub fn parse_summary(text: &str) -> Result<Vec<ProfileRow>> {
    let rows: Vec<ProfileRow> = text.lines().filter_map(parse_line).collect();
    if rows.is_empty() {
        return Err(Error::Timing(
            "No Region rows parsed. Is this an ESMF_Profile.summary file?".to_string(),
        ));
    }
    Ok(rows)
}

/// Resolve a summary source: a file is used as-is, a directory must contain
/// `ESMF_Profile.summary`.
pub fn summary_path(source: &Path) -> PathBuf {
    if source.is_dir() {
        source.join(SUMMARY_FILE)
    } else {
        source.to_path_buf()
    }
}

/// Read and parse a summary from a file or run directory. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn load_summary(source: &Path) -> Result<Vec<ProfileRow>> {
    let path = summary_path(source);
    let bytes = std::fs::read(&path).map_err(|e| {
        Error::Timing(format!("cannot read {}: {}", path.display(), e))
    })?;
    let rows = parse_summary(&String::from_utf8_lossy(&bytes))
        .map_err(|e| Error::Timing(format!("{}: {}", path.display(), inner_message(e))))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "parsed summary");
    Ok(rows)
}

fn inner_message(err: Error) -> String {
    match err {
        Error::Timing(msg) => msg,
        other => other.to_string(),
    }
}

/// Map region name to row. Later duplicates replace earlier ones.
pub fn region_map(rows: &[ProfileRow]) -> HashMap<&str, &ProfileRow> {
    rows.iter().map(|r| (r.region.as_str(), r)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = "\
Region profile timing summary

Region                         PETs   PEs    Count    Mean (s)    Min (s)     Min PET Max (s)     Max PET
  [ESMF]                       4      4      1        100.0000    99.0000     0       101.0000    3
    [ensemble] RunPhase1       4      4      1        90.0000     89.0000     1       91.0000     2
      dyn_run                  4      4      MULTIPLE 50.0000     48.0000     0       52.0000     1
        dyn_fv                 4      4      240      30.0000     29.0000     2       31.0000     0
        te_map                 4      4      240      12.5000     12.0000     0       13.0000     3
        halo exchange          4      4      480      5.0000      4.0000      1       6.5000      2
      phys_run                 4      4      MULTIPLE 25.0000     24.0000     3       26.0000     0
";

    #[test]
    fn test_parse_line_with_pets() {
        let row = parse_line("      dyn_run   4  4  MULTIPLE  50.0000  48.0000  0  52.0000  1").unwrap();
        assert_eq!(row.indent, 6);
        assert_eq!(row.region, "dyn_run");
        assert_eq!(row.pets, Some(4));
        assert_eq!(row.pes, Some(4));
        assert_eq!(row.count, None);
        assert_eq!(row.mean, 50.0);
        assert_eq!(row.min, 48.0);
        assert_eq!(row.min_pet, 0);
        assert_eq!(row.max, 52.0);
        assert_eq!(row.max_pet, 1);
    }

    #[test]
    fn test_parse_line_without_pets() {
        let row = parse_line("  [ATM] RunPhase1   12   3.5000   3.2500   0   3.7500   0").unwrap();
        assert_eq!(row.indent, 2);
        assert_eq!(row.region, "[ATM] RunPhase1");
        assert_eq!(row.pets, None);
        assert_eq!(row.count, Some(12));
        assert_eq!(row.mean, 3.5);
    }

    #[test]
    fn test_parse_line_name_with_spaces() {
        let row = parse_line("halo exchange  4  4  480  5.0000  4.0000  1  6.5000  2").unwrap();
        assert_eq!(row.region, "halo exchange");
        assert_eq!(row.count, Some(480));
    }

    #[test]
    fn test_parse_line_rejects_headers() {
        assert!(parse_line("Region  PETs  PEs  Count  Mean (s)").is_none());
        assert!(parse_line("").is_none());
        assert!(parse_line("dyn_run 4 4 1 50 48 0 52 1").is_none());
    }

    #[test]
    fn test_parse_line_rejects_overflowing_times() {
        let huge = format!("{}.0", "9".repeat(400));
        let line = format!("dyn_run  1  {huge}  1.0000  0  {huge}  0");
        assert!(parse_line(&line).is_none());
        assert!(parse_summary(&line).is_err());
    }

    #[test]
    fn test_parse_summary_sample() {
        let rows = parse_summary(SAMPLE).unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].region, "[ESMF]");
        assert_eq!(rows[5].region, "halo exchange");
        assert!(rows[3].indent > rows[2].indent);
    }

    #[test]
    fn test_parse_summary_empty_is_error() {
        let err = parse_summary("nothing to see here\n").unwrap_err();
        assert!(err.to_string().contains("No Region rows parsed"));
    }

    #[test]
    fn test_region_map_last_wins() {
        let rows = parse_summary(
            "a  1  1.0000  1.0000  0  1.0000  0\na  1  2.0000  2.0000  0  2.0000  0\n",
        )
        .unwrap();
        assert_eq!(region_map(&rows)["a"].mean, 2.0);
    }

    #[test]
    fn test_load_summary_from_directory_and_lossy() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut bytes = b"\xff\xfe junk\n".to_vec();
        bytes.extend_from_slice(SAMPLE.as_bytes());
        std::fs::write(dir.path().join(SUMMARY_FILE), bytes).unwrap();

        let rows = load_summary(dir.path()).unwrap();
        assert_eq!(rows.len(), 7);
    }

    #[test]
    fn test_load_summary_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_summary(dir.path()).unwrap_err();
        assert!(err.to_string().contains(SUMMARY_FILE));
    }
}
