//! The ordered sequence of steps that provisions a case.
//!
//! [`plan`] turns a resolved [`RunConfig`] into a list of [`Step`]s;
//! [`execute`] runs them strictly in order and stops at the first failure.
//! Nothing is cleaned up after a failure: the case directory is left for
//! inspection.

use crate::case::cime::CimeCommand;
use crate::case::namelist::{self, NamelistOptions, USER_NL_CAM};
use crate::case::runner::CommandRunner;
use crate::config::RunConfig;
use crate::Result;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// `ESMF_PROFILING_LEVEL` used for performance-analysis runs.
pub const PERF_PROFILING_LEVEL: u32 = 10;

/// One provisioning step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Run an external CIME command
    Command { command: CimeCommand },
    /// Append override lines to a namelist file
    AppendNamelist { path: PathBuf, lines: Vec<String> },
    /// Drop history field lines from a namelist file
    FilterNamelist { path: PathBuf },
}

impl Step {
    /// One-line description for status output.
    pub fn describe(&self) -> String {
        match self {
            Step::Command { command } => command.display(),
            Step::AppendNamelist { path, lines } => {
                format!("append {} lines to {}", lines.len(), file_name(path))
            }
            Step::FilterNamelist { path } => {
                format!("remove history field lists from {}", file_name(path))
            }
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Which trailing steps to leave out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Skip `case.build` (and therefore `case.submit`)
    pub skip_build: bool,
    /// Build but do not submit
    pub no_submit: bool,
}

/// The full provisioning sequence for one case.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionPlan {
    pub case_dir: PathBuf,
    pub steps: Vec<Step>,
}

/// Build the step sequence for `config`.
pub fn plan(config: &RunConfig, options: &ProvisionOptions) -> ProvisionPlan {
    let case_dir = config.case_dir();
    let mut steps = vec![Step::Command {
        command: CimeCommand::create_newcase(config),
    }];

    let mut xml = |assignments: &[(&str, String)]| {
        steps.push(Step::Command {
            command: CimeCommand::xmlchange(&case_dir, assignments),
        });
    };
    xml(&[("NTASKS", config.processors().to_string())]);
    xml(&[("NTHRDS", config.threads.value.to_string())]);
    xml(&[
        ("STOP_OPTION", config.stop_option.value.clone()),
        ("STOP_N", config.stop_n.value.to_string()),
    ]);

    steps.push(Step::Command {
        command: CimeCommand::xmlchange_subgroup(
            &case_dir,
            "JOB_WALLCLOCK_TIME",
            &config.walltime.value,
            "case.run",
        ),
    });
    steps.push(Step::Command {
        command: CimeCommand::xmlchange_subgroup(
            &case_dir,
            "JOB_QUEUE",
            &config.queue.value,
            "case.run",
        ),
    });

    let mut xml = |assignments: &[(&str, String)]| {
        steps.push(Step::Command {
            command: CimeCommand::xmlchange(&case_dir, assignments),
        });
    };
    xml(&[("DOUT_S", "FALSE".to_string())]);
    if config.perf_analysis {
        xml(&[("SAVE_TIMING", "TRUE".to_string())]);
        xml(&[("ESMF_PROFILING_LEVEL", PERF_PROFILING_LEVEL.to_string())]);
    }

    steps.push(Step::Command {
        command: CimeCommand::case_setup(&case_dir),
    });

    let nl_path = case_dir.join(USER_NL_CAM);
    steps.push(Step::AppendNamelist {
        path: nl_path.clone(),
        lines: namelist::override_lines(&NamelistOptions {
            profile: config.profile,
            chemistry: config.chemistry,
            perf_analysis: config.perf_analysis,
        }),
    });
    if config.perf_analysis {
        steps.push(Step::FilterNamelist { path: nl_path });
    }

    if !options.skip_build {
        steps.push(Step::Command {
            command: CimeCommand::case_build(&case_dir),
        });
        if !options.no_submit {
            steps.push(Step::Command {
                command: CimeCommand::case_submit(&case_dir),
            });
        }
    }

    ProvisionPlan { case_dir, steps }
}

/// Run every step of `plan` in order, writing one status line per step to
/// `progress`. Returns the number of steps completed.
pub fn execute(
    plan: &ProvisionPlan,
    runner: &mut dyn CommandRunner,
    progress: &mut dyn Write,
) -> Result<usize> {
    for (i, step) in plan.steps.iter().enumerate() {
        writeln!(progress, "==> [{}/{}] {}", i + 1, plan.steps.len(), step.describe())?;
        match step {
            Step::Command { command } => runner.run(command)?,
            Step::AppendNamelist { path, lines } => namelist::append_overrides(path, lines)?,
            Step::FilterNamelist { path } => {
                let removed = namelist::filter_history_fields(path)?;
                tracing::info!(removed, path = %path.display(), "filtered namelist");
            }
        }
    }
    Ok(plan.steps.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::runner::RecordingRunner;
    use crate::config::{CamcaseConfig, CaseOverrides, EnvSnapshot, resolve_run_config};
    use crate::Error;
    use tempfile::TempDir;

    fn config(output_root: &std::path::Path, overrides: &CaseOverrides) -> RunConfig {
        let env = EnvSnapshot {
            user: Some("jdoe".to_string()),
            output_root: Some(output_root.to_path_buf()),
            cesm_root: Some(PathBuf::from("/src/cesm")),
            ..Default::default()
        };
        resolve_run_config("f09_f09_mg17", overrides, &env, &CamcaseConfig::default()).unwrap()
    }

    fn displays(plan: &ProvisionPlan) -> Vec<String> {
        plan.steps.iter().map(Step::describe).collect()
    }

    #[test]
    fn test_default_plan_order() {
        let cfg = config(std::path::Path::new("/out"), &CaseOverrides::default());
        let plan = plan(&cfg, &ProvisionOptions::default());

        assert_eq!(
            displays(&plan),
            vec![
                "/src/cesm/cime/scripts/create_newcase --case /out/FHIST.f09_f09_mg17 \
                 --compset FHIST --res f09_f09_mg17 --machine derecho --run-unsupported",
                "./xmlchange NTASKS=256",
                "./xmlchange NTHRDS=1",
                "./xmlchange STOP_OPTION=ndays,STOP_N=5",
                "./xmlchange JOB_WALLCLOCK_TIME=00:30:00 --subgroup case.run",
                "./xmlchange JOB_QUEUE=main --subgroup case.run",
                "./xmlchange DOUT_S=FALSE",
                "./case.setup",
                "append 4 lines to user_nl_cam",
                "./case.build",
                "./case.submit",
            ]
        );
        assert_eq!(plan.case_dir, PathBuf::from("/out/FHIST.f09_f09_mg17"));
    }

    #[test]
    fn test_plan_with_project_and_perf() {
        let overrides = CaseOverrides {
            project: Some("P123".to_string()),
            perf_analysis: true,
            ..Default::default()
        };
        let cfg = config(std::path::Path::new("/out"), &overrides);
        let plan = plan(&cfg, &ProvisionOptions::default());
        let lines = displays(&plan);

        assert!(lines[0].contains("--project P123 --run-unsupported"));
        assert!(lines.contains(&"./xmlchange SAVE_TIMING=TRUE".to_string()));
        assert!(lines.contains(&"./xmlchange ESMF_PROFILING_LEVEL=10".to_string()));
        let append = lines.iter().position(|l| l.starts_with("append")).unwrap();
        assert_eq!(lines[append + 1], "remove history field lists from user_nl_cam");
    }

    #[test]
    fn test_skip_build_and_no_submit() {
        let cfg = config(std::path::Path::new("/out"), &CaseOverrides::default());

        let skip = plan(
            &cfg,
            &ProvisionOptions {
                skip_build: true,
                no_submit: false,
            },
        );
        assert!(!displays(&skip).iter().any(|l| l.starts_with("./case.build")));
        assert!(!displays(&skip).iter().any(|l| l.starts_with("./case.submit")));

        let no_submit = plan(
            &cfg,
            &ProvisionOptions {
                skip_build: false,
                no_submit: true,
            },
        );
        assert_eq!(displays(&no_submit).last().unwrap(), "./case.build");
    }

    #[test]
    fn test_execute_runs_steps_and_writes_namelist() {
        let out = TempDir::new().unwrap();
        let overrides = CaseOverrides {
            chemistry: true,
            perf_analysis: true,
            ..Default::default()
        };
        let cfg = config(out.path(), &overrides);
        let plan = plan(&cfg, &ProvisionOptions::default());
        // create_newcase is recorded, not run, so make the directory here
        std::fs::create_dir_all(&plan.case_dir).unwrap();

        let mut runner = RecordingRunner::default();
        let mut progress = Vec::new();
        let done = execute(&plan, &mut runner, &mut progress).unwrap();

        assert_eq!(done, plan.steps.len());
        assert_eq!(runner.commands.len(), plan.steps.len() - 2);

        let nl = std::fs::read_to_string(plan.case_dir.join(USER_NL_CAM)).unwrap();
        assert!(nl.contains("history_chemistry = .true."));
        assert!(!nl.contains("fincl"));

        let progress = String::from_utf8(progress).unwrap();
        assert!(progress.starts_with("==> [1/"));
        assert_eq!(progress.lines().count(), plan.steps.len());
    }

    #[test]
    fn test_execute_stops_at_first_failure() {
        let out = TempDir::new().unwrap();
        let cfg = config(out.path(), &CaseOverrides::default());
        let plan = plan(&cfg, &ProvisionOptions::default());

        let mut runner = RecordingRunner {
            fail_at: Some((0, 2)),
            ..Default::default()
        };
        let err = execute(&plan, &mut runner, &mut std::io::sink()).unwrap_err();

        assert!(matches!(err, Error::ToolFailed { code: 2, .. }));
        assert_eq!(runner.commands.len(), 1);
        assert!(!plan.case_dir.join(USER_NL_CAM).exists());
    }
}
