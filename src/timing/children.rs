//! Report on the children of one region, optionally against an optimized run.

use crate::timing::summary::{ProfileRow, region_map};
use crate::{Error, Result};
use serde::Serialize;

/// Region inspected when none is named and it exists in the baseline.
pub const DEFAULT_REGION: &str = "dyn_run";
/// Number of children kept by default.
pub const DEFAULT_TOP: usize = 12;

/// Index of the first row named `region`.
pub fn find_region(rows: &[ProfileRow], region: &str) -> Option<usize> {
    rows.iter().position(|r| r.region == region)
}

/// Rows directly after `parent` that are indented deeper than it.
pub fn collect_children(rows: &[ProfileRow], parent: usize) -> &[ProfileRow] {
    let depth = rows[parent].indent;
    let rest = &rows[parent + 1..];
    let end = rest
        .iter()
        .position(|r| r.indent <= depth)
        .unwrap_or(rest.len());
    &rest[..end]
}

/// One child region with its optional optimized counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildTiming {
    pub baseline: ProfileRow,
    /// Share of the parent's mean time, `None` if the parent mean is zero
    pub percent_of_parent: Option<f64>,
    pub optimized: Option<ProfileRow>,
}

impl ChildTiming {
    /// Baseline mean over optimized mean.
    pub fn speedup(&self) -> Option<f64> {
        self.optimized
            .as_ref()
            .filter(|o| o.mean > 0.0)
            .map(|o| self.baseline.mean / o.mean)
    }
}

/// Children of one region, largest first.
#[derive(Debug, Clone, Serialize)]
pub struct ChildrenReport {
    pub region: String,
    pub parent_mean: f64,
    pub top: usize,
    /// Whether an optimized summary took part
    pub compared: bool,
    pub children: Vec<ChildTiming>,
    pub warnings: Vec<String>,
}

/// Build the children report.
///
/// With no `region`, `dyn_run` is used when present, else the first row.
pub fn children_report(
    baseline: &[ProfileRow],
    optimized: Option<&[ProfileRow]>,
    region: Option<&str>,
    top: usize,
) -> Result<ChildrenReport> {
    let first = baseline
        .first()
        .ok_or_else(|| Error::Timing("baseline summary has no rows".to_string()))?;
    let region = match region {
        Some(r) => r.to_string(),
        None if find_region(baseline, DEFAULT_REGION).is_some() => DEFAULT_REGION.to_string(),
        None => first.region.clone(),
    };

    let parent_idx = find_region(baseline, &region).ok_or_else(|| {
        let mut examples: Vec<&str> = baseline
            .iter()
            .take(30)
            .map(|r| r.region.as_str())
            .collect();
        examples.sort_unstable();
        examples.dedup();
        Error::Timing(format!(
            "Region '{}' not found in baseline.\nExamples: {}",
            region,
            examples.join(", ")
        ))
    })?;
    let parent_mean = baseline[parent_idx].mean;

    let mut warnings = Vec::new();
    let opt_map = optimized.map(|opt| {
        if find_region(opt, &region).is_none() {
            warnings.push(format!(
                "region '{}' not found in optimized file; overlay will be empty",
                region
            ));
        }
        region_map(opt)
    });

    let mut children: Vec<ChildTiming> = collect_children(baseline, parent_idx)
        .iter()
        .map(|row| ChildTiming {
            baseline: row.clone(),
            percent_of_parent: (parent_mean > 0.0).then(|| 100.0 * row.mean / parent_mean),
            optimized: opt_map
                .as_ref()
                .and_then(|m| m.get(row.region.as_str()))
                .map(|o| (*o).clone()),
        })
        .collect();

    children.sort_by(|a, b| b.baseline.mean.total_cmp(&a.baseline.mean));
    children.truncate(top);

    Ok(ChildrenReport {
        region,
        parent_mean,
        top,
        compared: optimized.is_some(),
        children,
        warnings,
    })
}
