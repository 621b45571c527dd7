//! Text tables and CSV export for timing reports.

use crate::timing::children::ChildrenReport;
use crate::timing::compare::{AnnotationStyle, TimerComparison};
use crate::Result;
use std::fmt::Write;
use std::path::Path;

const NAME_WIDTH: usize = 40;

fn truncate(name: &str) -> String {
    name.chars().take(NAME_WIDTH).collect()
}

fn fixed(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:>width$.precision$}", v),
        Some(_) | None => format!("{:>width$}", "nan"),
    }
}

/// Table for `timing compare`.
pub fn compare_table(
    rows: &[TimerComparison],
    threshold: f64,
    style: AnnotationStyle,
) -> String {
    let compared = rows.iter().any(|r| r.optimized.is_some());
    let mut out = format!("{:<NAME_WIDTH$} {:>12}", "Timer", "Baseline(s)");
    if compared {
        let _ = write!(out, " {:>12} {:>9}  {}", "Optimized(s)", "Change", "Note");
    }
    out.push('\n');

    for row in rows {
        let _ = write!(out, "{:<NAME_WIDTH$} {:>12.6}", truncate(&row.label), row.baseline.mean);
        if let Some(opt) = row.optimized {
            let base = row.baseline.mean;
            let change = if base > 0.0 {
                format!("{:+.1}%", 100.0 * (opt.mean - base) / base)
            } else {
                "-".to_string()
            };
            let note = row.annotation(threshold, style).unwrap_or_default();
            let _ = write!(out, " {:>12.6} {:>9}  {}", opt.mean, change, note);
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }
    out
}

/// Table for `timing children`.
pub fn children_table(report: &ChildrenReport) -> String {
    if report.children.is_empty() {
        return format!(
            "No children found under region '{}' in baseline.\n",
            report.region
        );
    }
    let mut out = format!(
        "Region: {} (baseline parent mean = {:.6} s) - Top {} children by mean time\n",
        report.region, report.parent_mean, report.top
    );
    let _ = write!(
        out,
        "{:<NAME_WIDTH$} {:>12} {:>12} {:>12}",
        "Region", "BaseMean(s)", "BaseMin(s)", "BaseMax(s)"
    );
    if report.compared {
        let _ = write!(
            out,
            " {:>14} {:>12} {:>12} {:>16}",
            "OptMean(s)", "OptMin(s)", "OptMax(s)", "Speedup(Base/Opt)"
        );
    }
    out.push('\n');

    for child in &report.children {
        let b = &child.baseline;
        let _ = write!(
            out,
            "{:<NAME_WIDTH$} {:>12.6} {:>12.6} {:>12.6}",
            truncate(&b.region),
            b.mean,
            b.min,
            b.max
        );
        if report.compared {
            match child.optimized {
                Some(ref o) => {
                    let _ = write!(
                        out,
                        " {:>14.6} {:>12.6} {:>12.6} {}",
                        o.mean,
                        o.min,
                        o.max,
                        fixed(child.speedup(), 16, 3)
                    );
                }
                None => {
                    let _ = write!(out, " {:>14} {:>12} {:>12} {:>16}", "-", "-", "-", "-");
                }
            }
        }
        out.push('\n');
    }
    out
}

fn opt_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn float_string(value: f64) -> String {
    format!("{:?}", value)
}

/// Write the children report as CSV. Optimized columns are present only
/// when an optimized summary was given; missing values are empty cells.
pub fn write_children_csv(path: &Path, report: &ChildrenReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "region",
        "baseline_mean_s",
        "baseline_min_s",
        "baseline_max_s",
        "baseline_count",
        "baseline_PETs",
        "baseline_PEs",
    ];
    if report.compared {
        header.extend([
            "optimized_mean_s",
            "optimized_min_s",
            "optimized_max_s",
            "optimized_count",
            "optimized_PETs",
            "optimized_PEs",
            "speedup_base_over_opt",
        ]);
    }
    writer.write_record(&header)?;

    for child in &report.children {
        let b = &child.baseline;
        let mut record = vec![
            b.region.clone(),
            float_string(b.mean),
            float_string(b.min),
            float_string(b.max),
            opt_string(b.count),
            opt_string(b.pets),
            opt_string(b.pes),
        ];
        if report.compared {
            match child.optimized {
                Some(ref o) => record.extend([
                    float_string(o.mean),
                    float_string(o.min),
                    float_string(o.max),
                    opt_string(o.count),
                    opt_string(o.pets),
                    opt_string(o.pes),
                    child.speedup().map(float_string).unwrap_or_default(),
                ]),
                None => record.extend(std::iter::repeat_n(String::new(), 7)),
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
