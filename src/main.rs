//! camcase CLI - create CESM/CAM cases and compare ESMF timing summaries.

use camcase::case::{ProvisionOptions, SystemRunner};
use camcase::cli::{Cli, Commands, ConfigCommands, TimingCommands};
use camcase::commands::{self, ChildrenOptions, CompareOptions, Output};
use camcase::config::{self, CaseOverrides, EnvSnapshot};
use camcase::errors::{self, ErrorCategory};
use camcase::timing::chart::ChartOptions;
use camcase::timing::compare::AnnotationStyle;
use clap::Parser;
use std::io::Write;
use std::process;

fn main() {
    let cli = Cli::parse();
    camcase::logging::init(cli.verbose);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("CAMCASE_GIT_COMMIT"),
        built = env!("CAMCASE_BUILD_TIMESTAMP"),
        "starting"
    );

    if let Err(e) = run_command(cli.command, cli.json) {
        eprintln!("{}", errors::report(&e));
        process::exit(e.exit_code());
    }
}

fn run_command(command: Commands, json: bool) -> Result<(), camcase::Error> {
    let human = !json;
    match command {
        Commands::Create {
            case,
            skip_build,
            no_submit,
            dry_run,
        } => {
            let env = EnvSnapshot::from_process();
            let file = config::load_default_config()?;
            let options = ProvisionOptions {
                skip_build,
                no_submit,
            };
            // progress lines must not mix into JSON on stdout
            let mut progress: Box<dyn Write> = if human {
                Box::new(std::io::stdout())
            } else {
                Box::new(std::io::stderr())
            };
            let result = commands::create(
                &case.resolution,
                &CaseOverrides::from(&case),
                options,
                dry_run,
                &env,
                &file,
                &mut SystemRunner,
                &mut progress,
            )?;
            output(&result, human);
        }
        Commands::Timing { command } => match command {
            TimingCommands::Compare {
                baseline,
                optimized,
                timers,
                labels,
                chart,
                title,
                baseline_label,
                legend_label,
                annotate_threshold,
                label_offset,
                use_times,
            } => {
                let opts = CompareOptions {
                    timers,
                    labels,
                    chart,
                    chart_options: ChartOptions {
                        title,
                        baseline_label,
                        optimized_label: legend_label,
                        label_offset,
                        ..Default::default()
                    },
                    threshold: annotate_threshold,
                    style: if use_times {
                        AnnotationStyle::Ratio
                    } else {
                        AnnotationStyle::Percent
                    },
                };
                let result = commands::timing_compare(&baseline, optimized.as_deref(), &opts)?;
                output(&result, human);
            }
            TimingCommands::Children {
                summary,
                region,
                top,
                optimized,
                csv,
                chart,
                annotate_threshold,
            } => {
                let opts = ChildrenOptions {
                    region,
                    top,
                    csv,
                    chart,
                    threshold: annotate_threshold,
                };
                let result = commands::timing_children(&summary, optimized.as_deref(), &opts)?;
                for warning in &result.report.warnings {
                    eprintln!("{}", errors::format_warning(ErrorCategory::Timing, warning, None));
                }
                output(&result, human);
            }
        },
        Commands::Resolutions => output(&commands::resolutions(), human),
        Commands::Machines => output(&commands::machines(), human),
        Commands::Config { command } => match command {
            ConfigCommands::Show { case } => {
                let env = EnvSnapshot::from_process();
                let path = config::config_path();
                let file = match path {
                    Some(ref p) => config::load_config(p)?,
                    None => Default::default(),
                };
                let config_file = path.filter(|p| p.is_file());
                let result = commands::config_show(
                    &case.resolution,
                    &CaseOverrides::from(&case),
                    &env,
                    &file,
                    config_file,
                )?;
                output(&result, human);
            }
            ConfigCommands::Path => output(&commands::config_path(), human),
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
