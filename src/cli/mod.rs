//! CLI argument definitions for camcase.

use crate::case::RunProfile;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// camcase - create CESM/CAM cases and compare ESMF timing summaries.
///
/// Start with `camcase resolutions` to see the supported grids, then
/// `camcase create <resolution> --dry-run` to preview a case.
#[derive(Parser, Debug)]
#[command(name = "camcase")]
#[command(author, version, about = "Create CESM/CAM cases and compare ESMF timings", long_about = None)]
pub struct Cli {
    /// Output in JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase diagnostic output on stderr (-v info, -vv debug).
    /// CAMCASE_LOG overrides this with a full filter directive.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, configure, build and submit a new case
    ///
    /// Runs create_newcase, a fixed series of xmlchange edits, case.setup,
    /// appends namelist overrides to user_nl_cam, then case.build and
    /// case.submit.
    Create {
        #[command(flatten)]
        case: CaseArgs,

        /// Stop after case.setup and the namelist edits (implies no submit)
        #[arg(long)]
        skip_build: bool,

        /// Build the case but do not submit it
        #[arg(long)]
        no_submit: bool,

        /// Print the resolved plan without running anything
        #[arg(long)]
        dry_run: bool,
    },

    /// ESMF timing summary tools
    Timing {
        #[command(subcommand)]
        command: TimingCommands,
    },

    /// List supported resolutions and their processor counts
    Resolutions,

    /// List supported machines
    Machines,

    /// Configuration inspection
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Case options shared by `create` and `config show`.
#[derive(Args, Debug, Clone)]
pub struct CaseArgs {
    /// Model grid, e.g. f09_f09_mg17
    pub resolution: String,

    /// CIME machine name [env: CAMCASE_MACHINE]
    #[arg(long)]
    pub machine: Option<String>,

    /// CESM source checkout containing cime/scripts/create_newcase [env: CESM_ROOT]
    #[arg(long = "src", value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Project code charged for batch jobs [env: PROJECT]
    #[arg(long)]
    pub project: Option<String>,

    /// Batch queue (default: the machine's queue)
    #[arg(long)]
    pub queue: Option<String>,

    /// Job wall-clock limit, HH:MM:SS (default: from the run profile)
    #[arg(long)]
    pub walltime: Option<String>,

    /// Component set (default: FHIST, or FCHIST with --chemistry)
    #[arg(long)]
    pub compset: Option<String>,

    /// Case directory name (default: <compset>.<resolution>)
    #[arg(long)]
    pub case_name: Option<String>,

    /// Run length unit, e.g. ndays or nmonths (default: from the run profile)
    #[arg(long)]
    pub stop_option: Option<String>,

    /// Run length in stop-option units (default: from the run profile)
    #[arg(long)]
    pub stop_n: Option<u32>,

    /// OpenMP threads per task
    #[arg(long)]
    pub threads: Option<u32>,

    /// Run profile selecting run length, wall time and history output
    #[arg(long, value_enum, default_value_t = RunProfile::Short)]
    pub profile: RunProfile,

    /// Enable chemistry history output
    #[arg(long)]
    pub chemistry: bool,

    /// Turn on ESMF profiling and drop history field lists
    #[arg(long)]
    pub perf_analysis: bool,
}

/// Timing subcommands
#[derive(Subcommand, Debug)]
pub enum TimingCommands {
    /// Compare named timers between a baseline and an optimized run
    Compare {
        /// Baseline ESMF_Profile.summary file or run directory
        baseline: PathBuf,

        /// Optimized ESMF_Profile.summary file or run directory
        #[arg(short, long)]
        optimized: Option<PathBuf>,

        /// Timer (region) names to compare
        #[arg(short, long, num_args = 1.., required = true)]
        timers: Vec<String>,

        /// Display labels, one per timer
        #[arg(short, long, num_args = 1..)]
        labels: Option<Vec<String>>,

        /// Write an SVG chart to this path (SVG only, no PNG)
        #[arg(long, value_name = "SVG")]
        chart: Option<PathBuf>,

        /// Chart title
        #[arg(long, default_value = "Baseline vs Optimized Timings")]
        title: String,

        /// Legend label for the baseline run
        #[arg(long, default_value = "Baseline")]
        baseline_label: String,

        /// Legend label for the optimized run
        #[arg(long, default_value = "Optimized")]
        legend_label: String,

        /// Minimum percent difference that gets an annotation
        #[arg(long, default_value_t = crate::timing::compare::DEFAULT_ANNOTATE_THRESHOLD)]
        annotate_threshold: f64,

        /// Shift of the annotation left of the optimized marker, seconds
        #[arg(long, default_value_t = 1.4)]
        label_offset: f64,

        /// Annotate as speed ratios (1.25× faster) instead of percentages
        #[arg(long)]
        use_times: bool,
    },

    /// Show the largest children of one region
    Children {
        /// Baseline ESMF_Profile.summary file or run directory
        summary: PathBuf,

        /// Parent region (default: dyn_run if present, else the first row)
        #[arg(short, long)]
        region: Option<String>,

        /// Number of children to show
        #[arg(long, default_value_t = crate::timing::children::DEFAULT_TOP)]
        top: usize,

        /// Optimized summary file or run directory to compare against
        #[arg(short, long)]
        optimized: Option<PathBuf>,

        /// Write the table as CSV to this path
        #[arg(long, value_name = "CSV")]
        csv: Option<PathBuf>,

        /// Write an SVG chart to this path (SVG only, no PNG)
        #[arg(long, value_name = "SVG")]
        chart: Option<PathBuf>,

        /// Minimum percent difference that gets an annotation on the chart
        #[arg(long, default_value_t = crate::timing::compare::DEFAULT_ANNOTATE_THRESHOLD)]
        annotate_threshold: f64,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved run configuration and where each value came from
    Show {
        #[command(flatten)]
        case: CaseArgs,
    },

    /// Print the config file location
    Path,
}

impl From<&CaseArgs> for crate::config::CaseOverrides {
    fn from(args: &CaseArgs) -> Self {
        Self {
            machine: args.machine.clone(),
            compset: args.compset.clone(),
            project: args.project.clone(),
            queue: args.queue.clone(),
            walltime: args.walltime.clone(),
            src_root: args.src.clone(),
            case_name: args.case_name.clone(),
            stop_option: args.stop_option.clone(),
            stop_n: args.stop_n,
            threads: args.threads,
            profile: args.profile,
            chemistry: args.chemistry,
            perf_analysis: args.perf_analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_flags_map_to_overrides() {
        let cli = Cli::try_parse_from([
            "camcase",
            "create",
            "f19_f19_mg17",
            "--machine",
            "casper",
            "--stop-n",
            "3",
            "--profile",
            "long",
            "--chemistry",
        ])
        .unwrap();
        let Commands::Create { case, .. } = cli.command else {
            panic!("expected create");
        };
        let overrides = crate::config::CaseOverrides::from(&case);
        assert_eq!(overrides.machine.as_deref(), Some("casper"));
        assert_eq!(overrides.stop_n, Some(3));
        assert_eq!(overrides.profile, RunProfile::Long);
        assert!(overrides.chemistry);
        assert!(!overrides.perf_analysis);
    }

    #[test]
    fn test_compare_requires_timers() {
        assert!(Cli::try_parse_from(["camcase", "timing", "compare", "base.summary"]).is_err());
        let cli = Cli::try_parse_from([
            "camcase", "timing", "compare", "base", "-t", "dyn_run", "phys_run",
        ])
        .unwrap();
        match cli.command {
            Commands::Timing {
                command: TimingCommands::Compare { timers, .. },
            } => assert_eq!(timers, vec!["dyn_run", "phys_run"]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
