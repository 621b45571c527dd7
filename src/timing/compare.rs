//! Named-timer comparison between a baseline and an optimized summary.

use crate::timing::summary::{ProfileRow, region_map};
use crate::{Error, Result};
use serde::Serialize;

/// Default annotation threshold, percent.
pub const DEFAULT_ANNOTATE_THRESHOLD: f64 = 5.0;

/// Mean/min/max of one timer in one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl From<&ProfileRow> for TimerStats {
    fn from(row: &ProfileRow) -> Self {
        Self {
            mean: row.mean,
            min: row.min,
            max: row.max,
        }
    }
}

impl TimerStats {
    /// Distance from mean down to min, never negative.
    pub fn err_low(&self) -> f64 {
        (self.mean - self.min).max(0.0)
    }

    /// Distance from mean up to max, never negative.
    pub fn err_high(&self) -> f64 {
        (self.max - self.mean).max(0.0)
    }
}

/// How a difference is written on the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnnotationStyle {
    /// `12.3% faster`
    #[default]
    Percent,
    /// `1.14× faster`
    Ratio,
}

/// Percent time saved by the optimized run: positive means faster.
///
/// `None` unless both means are positive.
pub fn percent_change(base: f64, opt: f64) -> Option<f64> {
    (base > 0.0 && opt > 0.0).then(|| 100.0 * (base - opt) / base)
}

/// Annotation text for a baseline/optimized pair, or `None` when the
/// difference is below `threshold` percent.
pub fn annotation(base: f64, opt: f64, threshold: f64, style: AnnotationStyle) -> Option<String> {
    let pct = percent_change(base, opt)?;
    if pct.abs() < threshold {
        return None;
    }
    let direction = if pct > 0.0 { "faster" } else { "slower" };
    Some(match style {
        AnnotationStyle::Percent => format!("{:.1}% {}", pct.abs(), direction),
        AnnotationStyle::Ratio => {
            let ratio = if pct > 0.0 { base / opt } else { opt / base };
            format!("{:.2}× {}", ratio, direction)
        }
    })
}

/// One timer across both runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerComparison {
    /// Region name as it appears in the summary
    pub timer: String,
    /// Label shown on the chart
    pub label: String,
    pub baseline: TimerStats,
    pub optimized: Option<TimerStats>,
}

impl TimerComparison {
    pub fn percent_change(&self) -> Option<f64> {
        self.optimized
            .and_then(|opt| percent_change(self.baseline.mean, opt.mean))
    }

    pub fn annotation(&self, threshold: f64, style: AnnotationStyle) -> Option<String> {
        self.optimized
            .and_then(|opt| annotation(self.baseline.mean, opt.mean, threshold, style))
    }
}

/// Look up every timer in the baseline (and optimized) rows.
///
/// `labels`, when given, must have one entry per timer. Any timer missing
/// from a run is an error naming all missing timers.
pub fn compare_timers(
    baseline: &[ProfileRow],
    optimized: Option<&[ProfileRow]>,
    timers: &[String],
    labels: Option<&[String]>,
) -> Result<Vec<TimerComparison>> {
    if timers.is_empty() {
        return Err(Error::InvalidInput("at least one timer is required".to_string()));
    }
    if let Some(labels) = labels {
        if labels.len() != timers.len() {
            return Err(Error::InvalidInput(format!(
                "got {} labels for {} timers",
                labels.len(),
                timers.len()
            )));
        }
    }

    let base_map = region_map(baseline);
    let opt_map = optimized.map(region_map);

    let missing = |map: &std::collections::HashMap<&str, &ProfileRow>| -> Vec<String> {
        timers
            .iter()
            .filter(|t| !map.contains_key(t.as_str()))
            .cloned()
            .collect()
    };
    let base_missing = missing(&base_map);
    if !base_missing.is_empty() {
        return Err(Error::Timing(format!(
            "timers not found in baseline: {}",
            base_missing.join(", ")
        )));
    }
    if let Some(ref opt_map) = opt_map {
        let opt_missing = missing(opt_map);
        if !opt_missing.is_empty() {
            return Err(Error::Timing(format!(
                "timers not found in optimized summary: {}",
                opt_missing.join(", ")
            )));
        }
    }

    Ok(timers
        .iter()
        .enumerate()
        .map(|(i, timer)| TimerComparison {
            timer: timer.clone(),
            label: labels.map_or_else(|| timer.clone(), |l| l[i].clone()),
            baseline: TimerStats::from(base_map[timer.as_str()]),
            optimized: opt_map
                .as_ref()
                .map(|m| TimerStats::from(m[timer.as_str()])),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::summary::parse_summary;
    use crate::timing::summary::tests::SAMPLE;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(10.0, 8.0), Some(20.0));
        assert_eq!(percent_change(10.0, 12.0), Some(-20.0));
        assert_eq!(percent_change(0.0, 1.0), None);
        assert_eq!(percent_change(1.0, 0.0), None);
    }

    #[test]
    fn test_annotation_threshold_and_text() {
        let t = DEFAULT_ANNOTATE_THRESHOLD;
        assert_eq!(
            annotation(10.0, 8.0, t, AnnotationStyle::Percent).as_deref(),
            Some("20.0% faster")
        );
        assert_eq!(
            annotation(10.0, 12.0, t, AnnotationStyle::Percent).as_deref(),
            Some("20.0% slower")
        );
        assert_eq!(annotation(10.0, 9.7, t, AnnotationStyle::Percent), None);
        assert_eq!(
            annotation(10.0, 9.5, t, AnnotationStyle::Percent).as_deref(),
            Some("5.0% faster")
        );
    }

    #[test]
    fn test_annotation_ratio_style() {
        assert_eq!(
            annotation(10.0, 5.0, 5.0, AnnotationStyle::Ratio).as_deref(),
            Some("2.00× faster")
        );
        assert_eq!(
            annotation(10.0, 15.0, 5.0, AnnotationStyle::Ratio).as_deref(),
            Some("1.50× slower")
        );
    }

    #[test]
    fn test_error_bars_clamped() {
        let s = TimerStats {
            mean: 5.0,
            min: 6.0,
            max: 4.0,
        };
        assert_eq!(s.err_low(), 0.0);
        assert_eq!(s.err_high(), 0.0);
    }

    #[test]
    fn test_compare_timers_with_labels() {
        let base = parse_summary(SAMPLE).unwrap();
        let opt_text = SAMPLE.replace("30.0000     29.0000", "24.0000     23.0000");
        let opt = parse_summary(&opt_text).unwrap();

        let result = compare_timers(
            &base,
            Some(&opt),
            &names(&["dyn_fv", "te_map"]),
            Some(&names(&["Dycore", "Remap"])),
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].label, "Dycore");
        assert_eq!(result[0].baseline.mean, 30.0);
        assert_eq!(result[0].optimized.unwrap().mean, 24.0);
        assert_eq!(result[0].percent_change(), Some(20.0));
        assert_eq!(
            result[0].annotation(5.0, AnnotationStyle::Percent).as_deref(),
            Some("20.0% faster")
        );
        assert_eq!(result[1].annotation(5.0, AnnotationStyle::Percent), None);
    }

    #[test]
    fn test_compare_timers_baseline_only() {
        let base = parse_summary(SAMPLE).unwrap();
        let result = compare_timers(&base, None, &names(&["dyn_run"]), None).unwrap();
        assert_eq!(result[0].label, "dyn_run");
        assert!(result[0].optimized.is_none());
        assert_eq!(result[0].percent_change(), None);
    }

    #[test]
    fn test_compare_timers_missing_names() {
        let base = parse_summary(SAMPLE).unwrap();
        let err = compare_timers(&base, None, &names(&["dyn_fv", "nope", "gone"]), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Timing data error: timers not found in baseline: nope, gone"
        );
    }

    #[test]
    fn test_compare_timers_label_count_mismatch() {
        let base = parse_summary(SAMPLE).unwrap();
        let err = compare_timers(
            &base,
            None,
            &names(&["dyn_fv", "te_map"]),
            Some(&names(&["only one"])),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
