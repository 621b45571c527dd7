//! Command implementations for the camcase CLI.
//!
//! Each command returns a result type implementing [`Output`], so `main`
//! decides between JSON and human-readable rendering in one place.
//! Collaborators with side effects (the process environment, the config
//! file, the command runner, the progress stream) are passed in.

use crate::case::paths;
use crate::case::provision::{self, ProvisionOptions, ProvisionPlan};
use crate::case::runner::CommandRunner;
use crate::case::{Machine, Resolution};
use crate::config::{CamcaseConfig, CaseOverrides, EnvSnapshot, Resolved, RunConfig};
use crate::timing::chart::{self, ChartOptions};
use crate::timing::compare::{AnnotationStyle, TimerComparison, TimerStats};
use crate::timing::{ChildrenReport, children_report, compare_timers, load_summary, report};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

// === create ===

/// Result of `camcase create`.
#[derive(Serialize)]
pub struct CreateResult {
    pub case_dir: PathBuf,
    pub dry_run: bool,
    /// Steps executed; zero for a dry run
    pub steps_run: usize,
    pub built: bool,
    pub submitted: bool,
    pub config: RunConfig,
    pub plan: ProvisionPlan,
    pub finished_at: DateTime<Utc>,
}

impl Output for CreateResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        if self.dry_run {
            let _ = writeln!(out, "Dry run: would create case {}", self.case_dir.display());
            let _ = writeln!(
                out,
                "  machine {}, resolution {} ({} tasks), compset {}",
                self.config.machine.value.name,
                self.config.resolution.name,
                self.config.processors(),
                self.config.compset.value
            );
            let _ = writeln!(out);
            for (i, step) in self.plan.steps.iter().enumerate() {
                let _ = writeln!(out, "  [{}/{}] {}", i + 1, self.plan.steps.len(), step.describe());
            }
        } else {
            let _ = writeln!(
                out,
                "Created case {} ({} steps)",
                self.case_dir.display(),
                self.steps_run
            );
            let status = match (self.built, self.submitted) {
                (true, true) => "built and submitted",
                (true, false) => "built, not submitted",
                _ => "set up, build skipped",
            };
            let _ = writeln!(out, "  {}", status);
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// Resolve, check and provision a case.
///
/// With `dry_run` nothing is checked or executed; the plan is returned as
/// is. Otherwise the preflight checks run first, then every step in order;
/// `progress` gets one status line per step.
#[allow(clippy::too_many_arguments)]
pub fn create(
    resolution: &str,
    overrides: &CaseOverrides,
    options: ProvisionOptions,
    dry_run: bool,
    env: &EnvSnapshot,
    file: &CamcaseConfig,
    runner: &mut dyn CommandRunner,
    progress: &mut dyn Write,
) -> Result<CreateResult> {
    let config = crate::config::resolve_run_config(resolution, overrides, env, file)?;
    let plan = provision::plan(&config, &options);
    let built = !options.skip_build;
    let submitted = built && !options.no_submit;

    if dry_run {
        return Ok(CreateResult {
            case_dir: plan.case_dir.clone(),
            dry_run: true,
            steps_run: 0,
            built: false,
            submitted: false,
            config,
            plan,
            finished_at: Utc::now(),
        });
    }

    paths::preflight(&config)?;
    tracing::info!(
        case_dir = %plan.case_dir.display(),
        steps = plan.steps.len(),
        "provisioning case"
    );
    let steps_run = provision::execute(&plan, runner, progress)?;

    Ok(CreateResult {
        case_dir: plan.case_dir.clone(),
        dry_run: false,
        steps_run,
        built,
        submitted,
        config,
        plan,
        finished_at: Utc::now(),
    })
}

// === config show / config path ===

/// Result of `camcase config show`.
#[derive(Serialize)]
pub struct ConfigShowResult {
    pub config_file: Option<PathBuf>,
    pub case_dir: PathBuf,
    pub create_newcase: PathBuf,
    pub config: RunConfig,
}

fn push_row<T: std::fmt::Display>(out: &mut String, key: &str, value: T, source: &str) {
    let _ = writeln!(out, "  {:<14} {:<48} ({})", key, value.to_string(), source);
}

fn push_resolved<T: std::fmt::Display>(out: &mut String, key: &str, r: &Resolved<T>) {
    push_row(out, key, &r.value, &r.source.to_string());
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let c = &self.config;
        let mut out = String::from("Run configuration:\n");
        push_row(&mut out, "machine", c.machine.value.name, &c.machine.source.to_string());
        push_row(&mut out, "resolution", c.resolution.name, "cli");
        push_row(&mut out, "processors", c.processors(), "resolution");
        push_resolved(&mut out, "compset", &c.compset);
        push_resolved(&mut out, "queue", &c.queue);
        push_resolved(&mut out, "walltime", &c.walltime);
        push_resolved(&mut out, "threads", &c.threads);
        push_resolved(&mut out, "stop_option", &c.stop_option);
        push_resolved(&mut out, "stop_n", &c.stop_n);
        match c.project {
            Some(ref p) => push_resolved(&mut out, "project", p),
            None => push_row(&mut out, "project", "-", "unset"),
        }
        push_resolved(&mut out, "account", &c.account);
        push_row(
            &mut out,
            "src",
            c.src_root.value.display(),
            &c.src_root.source.to_string(),
        );
        push_resolved(&mut out, "case_name", &c.case_name);
        push_row(
            &mut out,
            "output_root",
            c.output_root.value.display(),
            &c.output_root.source.to_string(),
        );
        push_row(&mut out, "profile", c.profile, "cli");
        push_row(&mut out, "chemistry", c.chemistry, "cli");
        push_row(&mut out, "perf_analysis", c.perf_analysis, "cli");
        let _ = writeln!(out);
        let _ = writeln!(out, "Case directory: {}", self.case_dir.display());
        let _ = writeln!(out, "create_newcase: {}", self.create_newcase.display());
        let _ = write!(
            out,
            "Config file:    {}",
            self.config_file
                .as_ref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string())
        );
        out
    }
}

/// Resolve the run configuration without touching the filesystem.
pub fn config_show(
    resolution: &str,
    overrides: &CaseOverrides,
    env: &EnvSnapshot,
    file: &CamcaseConfig,
    config_file: Option<PathBuf>,
) -> Result<ConfigShowResult> {
    let config = crate::config::resolve_run_config(resolution, overrides, env, file)?;
    Ok(ConfigShowResult {
        config_file,
        case_dir: config.case_dir(),
        create_newcase: config.create_newcase_path(),
        config,
    })
}

/// Result of `camcase config path`.
#[derive(Serialize)]
pub struct ConfigPathResult {
    pub path: Option<PathBuf>,
    pub exists: bool,
}

impl Output for ConfigPathResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.path {
            Some(ref p) if self.exists => p.display().to_string(),
            Some(ref p) => format!("{} (not present)", p.display()),
            None => "no config location available".to_string(),
        }
    }
}

pub fn config_path() -> ConfigPathResult {
    let path = crate::config::config_path();
    let exists = path.as_deref().is_some_and(Path::is_file);
    ConfigPathResult { path, exists }
}

// === resolutions / machines ===

/// Result of `camcase resolutions`.
#[derive(Serialize)]
pub struct ResolutionsResult {
    pub resolutions: &'static [Resolution],
}

impl Output for ResolutionsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{:<24} {:>10}  {}\n", "RESOLUTION", "PROCESSORS", "GRID");
        for r in self.resolutions {
            let _ = writeln!(out, "{:<24} {:>10}  {}", r.name, r.processors, r.description);
        }
        out.truncate(out.trim_end().len());
        out
    }
}

pub fn resolutions() -> ResolutionsResult {
    ResolutionsResult {
        resolutions: crate::case::resolution::RESOLUTIONS,
    }
}

/// Result of `camcase machines`.
#[derive(Serialize)]
pub struct MachinesResult {
    pub default: &'static str,
    pub machines: &'static [Machine],
}

impl Output for MachinesResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "{:<10} {:<26} {:<8} {}\n",
            "MACHINE", "SCRATCH ROOT", "QUEUE", "BATCH"
        );
        for m in self.machines {
            let marker = if m.name == self.default { " (default)" } else { "" };
            let _ = writeln!(
                out,
                "{:<10} {:<26} {:<8} {}{}",
                m.name, m.scratch_root, m.default_queue, m.batch, marker
            );
        }
        out.truncate(out.trim_end().len());
        out
    }
}

pub fn machines() -> MachinesResult {
    MachinesResult {
        default: crate::case::machine::DEFAULT_MACHINE,
        machines: crate::case::machine::MACHINES,
    }
}

// === timing compare ===

/// Options for `camcase timing compare`.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub timers: Vec<String>,
    pub labels: Option<Vec<String>>,
    pub chart: Option<PathBuf>,
    pub chart_options: ChartOptions,
    pub threshold: f64,
    pub style: AnnotationStyle,
}

#[derive(Serialize)]
struct CompareRow<'a> {
    timer: &'a str,
    label: &'a str,
    baseline: TimerStats,
    optimized: Option<TimerStats>,
    percent_change: Option<f64>,
    annotation: Option<String>,
}

/// Result of `camcase timing compare`.
pub struct TimingCompareResult {
    pub baseline: PathBuf,
    pub optimized: Option<PathBuf>,
    pub rows: Vec<TimerComparison>,
    pub threshold: f64,
    pub style: AnnotationStyle,
    pub chart: Option<PathBuf>,
}

impl Output for TimingCompareResult {
    fn to_json(&self) -> String {
        let rows: Vec<CompareRow> = self
            .rows
            .iter()
            .map(|r| CompareRow {
                timer: &r.timer,
                label: &r.label,
                baseline: r.baseline,
                optimized: r.optimized,
                percent_change: r.percent_change(),
                annotation: r.annotation(self.threshold, self.style),
            })
            .collect();
        json(&serde_json::json!({
            "baseline": self.baseline,
            "optimized": self.optimized,
            "threshold": self.threshold,
            "timers": rows,
            "chart": self.chart,
        }))
    }

    fn to_human(&self) -> String {
        let mut out = report::compare_table(&self.rows, self.threshold, self.style);
        if let Some(ref chart) = self.chart {
            let _ = writeln!(out, "\nChart written to {}", chart.display());
        }
        out.truncate(out.trim_end().len());
        out
    }
}

pub fn timing_compare(
    baseline: &Path,
    optimized: Option<&Path>,
    opts: &CompareOptions,
) -> Result<TimingCompareResult> {
    let base_rows = load_summary(baseline)?;
    let opt_rows = optimized.map(load_summary).transpose()?;

    let rows = compare_timers(
        &base_rows,
        opt_rows.as_deref(),
        &opts.timers,
        opts.labels.as_deref(),
    )?;

    if let Some(ref path) = opts.chart {
        let chart_rows = chart::rows_from_comparison(&rows, opts.threshold, opts.style);
        chart::write_svg(path, &chart_rows, &opts.chart_options)?;
        tracing::info!(path = %path.display(), "wrote chart");
    }

    Ok(TimingCompareResult {
        baseline: baseline.to_path_buf(),
        optimized: optimized.map(Path::to_path_buf),
        rows,
        threshold: opts.threshold,
        style: opts.style,
        chart: opts.chart.clone(),
    })
}

// === timing children ===

/// Options for `camcase timing children`.
#[derive(Debug, Clone, Default)]
pub struct ChildrenOptions {
    pub region: Option<String>,
    pub top: usize,
    pub csv: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    pub threshold: f64,
}

/// Result of `camcase timing children`.
#[derive(Serialize)]
pub struct TimingChildrenResult {
    pub baseline: PathBuf,
    pub optimized: Option<PathBuf>,
    #[serde(flatten)]
    pub report: ChildrenReport,
    pub csv: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

impl Output for TimingChildrenResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = report::children_table(&self.report);
        if let Some(ref csv) = self.csv {
            let _ = writeln!(out, "\nWrote CSV: {}", csv.display());
        }
        if let Some(ref chart) = self.chart {
            let _ = writeln!(out, "Chart written to {}", chart.display());
        }
        out.truncate(out.trim_end().len());
        out
    }
}

pub fn timing_children(
    baseline: &Path,
    optimized: Option<&Path>,
    opts: &ChildrenOptions,
) -> Result<TimingChildrenResult> {
    let base_rows = load_summary(baseline)?;
    let opt_rows = optimized.map(load_summary).transpose()?;

    let report = children_report(
        &base_rows,
        opt_rows.as_deref(),
        opts.region.as_deref(),
        opts.top,
    )?;

    // nothing to export for a leaf region
    let (csv, chart) = if report.children.is_empty() {
        (None, None)
    } else {
        (opts.csv.clone(), opts.chart.clone())
    };

    if let Some(ref path) = csv {
        report::write_children_csv(path, &report)?;
        tracing::info!(path = %path.display(), "wrote csv");
    }
    if let Some(ref path) = chart {
        let rows = chart::rows_from_children(&report, opts.threshold, AnnotationStyle::Percent);
        let chart_opts = ChartOptions {
            title: format!("Children of {}", report.region),
            ..Default::default()
        };
        chart::write_svg(path, &rows, &chart_opts)?;
        tracing::info!(path = %path.display(), "wrote chart");
    }

    Ok(TimingChildrenResult {
        baseline: baseline.to_path_buf(),
        optimized: optimized.map(Path::to_path_buf),
        report,
        csv,
        chart,
    })
}
