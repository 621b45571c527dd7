//! Precedence resolution for the run configuration of a case.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags
//! 2. Environment variables (`CAMCASE_MACHINE`, `PROJECT`, `CESM_ROOT`, ...)
//! 3. config.kdl
//! 4. Built-in defaults (machine table, run profile, resolution table)
//!
//! The environment is captured once into an [`EnvSnapshot`] so resolution is
//! a pure function of its inputs and can be tested without touching the
//! process environment.

use crate::case::machine::{DEFAULT_MACHINE, Machine};
use crate::case::paths::{self, CREATE_NEWCASE_RELATIVE};
use crate::case::profile::{RunProfile, validate_stop_option, validate_walltime};
use crate::case::resolution::Resolution;
use crate::config::schema::CamcaseConfig;
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Environment variable selecting the machine.
pub const MACHINE_ENV: &str = "CAMCASE_MACHINE";
/// Environment variable holding the project code charged for jobs.
pub const PROJECT_ENV: &str = "PROJECT";
/// Environment variable holding the account (user) name.
pub const USER_ENV: &str = "USER";
/// Environment variable naming a scratch directory.
pub const SCRATCH_ENV: &str = "SCRATCH";
/// Environment variable naming the output root, used verbatim.
pub const OUTPUT_ROOT_ENV: &str = "CAMCASE_OUTPUT_ROOT";
/// Environment variable naming the CESM source checkout.
pub const CESM_ROOT_ENV: &str = "CESM_ROOT";

/// Compset used when chemistry is off and nothing else selects one.
pub const DEFAULT_COMPSET: &str = "FHIST";
/// Compset used when chemistry is on and nothing else selects one.
pub const DEFAULT_CHEM_COMPSET: &str = "FCHIST";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from the machine table
    Machine,
    /// Value from the run profile
    Profile,
    /// Value computed from other resolved values
    Derived,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::Machine => write!(f, "machine"),
            ValueSource::Profile => write!(f, "profile"),
            ValueSource::Derived => write!(f, "derived"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// The environment variables camcase reads, captured once per invocation.
///
/// Empty variables are treated as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub machine: Option<String>,
    pub project: Option<String>,
    pub user: Option<String>,
    pub scratch: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub cesm_root: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            machine: env_string(MACHINE_ENV),
            project: env_string(PROJECT_ENV),
            user: env_string(USER_ENV),
            scratch: env_string(SCRATCH_ENV).map(PathBuf::from),
            output_root: env_string(OUTPUT_ROOT_ENV).map(PathBuf::from),
            cesm_root: env_string(CESM_ROOT_ENV).map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// CLI overrides for run configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct CaseOverrides {
    pub machine: Option<String>,
    pub compset: Option<String>,
    pub project: Option<String>,
    pub queue: Option<String>,
    pub walltime: Option<String>,
    pub src_root: Option<PathBuf>,
    pub case_name: Option<String>,
    pub stop_option: Option<String>,
    pub stop_n: Option<u32>,
    pub threads: Option<u32>,
    pub profile: RunProfile,
    pub chemistry: bool,
    pub perf_analysis: bool,
}

/// Fully resolved configuration for one case, with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub machine: Resolved<&'static Machine>,
    pub resolution: &'static Resolution,
    pub compset: Resolved<String>,
    pub queue: Resolved<String>,
    pub walltime: Resolved<String>,
    pub threads: Resolved<u32>,
    pub stop_option: Resolved<String>,
    pub stop_n: Resolved<u32>,
    pub project: Option<Resolved<String>>,
    pub account: Resolved<String>,
    pub src_root: Resolved<PathBuf>,
    pub case_name: Resolved<String>,
    pub output_root: Resolved<PathBuf>,
    pub profile: RunProfile,
    pub chemistry: bool,
    pub perf_analysis: bool,
}

impl RunConfig {
    /// MPI task count for the resolution.
    pub fn processors(&self) -> u32 {
        self.resolution.processors
    }

    /// Directory the case is created in.
    pub fn case_dir(&self) -> PathBuf {
        self.output_root.value.join(&self.case_name.value)
    }

    /// Path of the `create_newcase` script in the source tree.
    pub fn create_newcase_path(&self) -> PathBuf {
        self.src_root.value.join(CREATE_NEWCASE_RELATIVE)
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_ref().map(|r| r.value.as_str())
    }
}

/// Pick the first value present: CLI flag, then env var, then config file.
fn layered<T: Clone>(
    flag: Option<&T>,
    env: Option<(&T, &str)>,
    file: Option<&T>,
) -> Option<Resolved<T>> {
    if let Some(v) = flag {
        Some(Resolved::new(v.clone(), ValueSource::CliFlag))
    } else if let Some((v, name)) = env {
        Some(Resolved::new(v.clone(), ValueSource::EnvVar(name.to_string())))
    } else {
        file.map(|v| Resolved::new(v.clone(), ValueSource::ConfigFile))
    }
}

/// Resolve the run configuration for `resolution`.
///
/// Fails on an unsupported machine or resolution and on malformed flag
/// values. Does not look at the source tree or the case directory; see
/// [`crate::case::paths::preflight`] for those checks.
pub fn resolve_run_config(
    resolution: &str,
    overrides: &CaseOverrides,
    env: &EnvSnapshot,
    file: &CamcaseConfig,
) -> Result<RunConfig> {
    let machine_name = layered(
        overrides.machine.as_ref(),
        env.machine.as_ref().map(|v| (v, MACHINE_ENV)),
        file.machine.as_ref(),
    )
    .unwrap_or_else(|| Resolved::new(DEFAULT_MACHINE.to_string(), ValueSource::Default));
    let machine = Resolved::new(Machine::lookup(&machine_name.value)?, machine_name.source);

    let resolution = Resolution::lookup(resolution)?;

    let compset = layered(overrides.compset.as_ref(), None, file.compset.as_ref())
        .unwrap_or_else(|| {
            let name = if overrides.chemistry {
                DEFAULT_CHEM_COMPSET
            } else {
                DEFAULT_COMPSET
            };
            Resolved::new(name.to_string(), ValueSource::Default)
        });

    let queue = layered(overrides.queue.as_ref(), None, file.queue.as_ref()).unwrap_or_else(
        || Resolved::new(machine.value.default_queue.to_string(), ValueSource::Machine),
    );

    let walltime = match layered(overrides.walltime.as_ref(), None, file.walltime.as_ref()) {
        Some(w) => Resolved::new(validate_walltime(&w.value)?, w.source),
        None => Resolved::new(
            overrides.profile.default_walltime().to_string(),
            ValueSource::Profile,
        ),
    };

    let threads = layered(overrides.threads.as_ref(), None, file.threads.as_ref())
        .unwrap_or_else(|| Resolved::new(1, ValueSource::Default));
    if threads.value == 0 {
        return Err(Error::InvalidInput("thread count must be at least 1".to_string()));
    }

    let stop_option = match overrides.stop_option {
        Some(ref opt) => Resolved::new(validate_stop_option(opt)?, ValueSource::CliFlag),
        None => Resolved::new(
            overrides.profile.stop_option().to_string(),
            ValueSource::Profile,
        ),
    };
    let stop_n = match overrides.stop_n {
        Some(0) => {
            return Err(Error::InvalidInput("stop count must be at least 1".to_string()));
        }
        Some(n) => Resolved::new(n, ValueSource::CliFlag),
        None => Resolved::new(overrides.profile.stop_n(), ValueSource::Profile),
    };

    let project = layered(
        overrides.project.as_ref(),
        env.project.as_ref().map(|v| (v, PROJECT_ENV)),
        file.project.as_ref(),
    );

    let account = match env.user {
        Some(ref user) => Resolved::new(user.clone(), ValueSource::EnvVar(USER_ENV.to_string())),
        None => match crate::sys::passwd_user_name() {
            Some(name) => Resolved::new(name, ValueSource::Derived),
            None => {
                return Err(Error::InvalidInput(
                    "cannot determine account name: set USER".to_string(),
                ));
            }
        },
    };

    let src_root = match layered(
        overrides.src_root.as_ref(),
        env.cesm_root.as_ref().map(|v| (v, CESM_ROOT_ENV)),
        file.cesm_root.as_ref(),
    ) {
        Some(root) => root,
        None => {
            let home = env.home.clone().ok_or_else(|| {
                Error::InvalidInput(
                    "cannot determine home directory: pass --src or set CESM_ROOT".to_string(),
                )
            })?;
            Resolved::new(home.join("cesm"), ValueSource::Default)
        }
    };

    let case_name = match overrides.case_name {
        Some(ref name) => Resolved::new(paths::validate_case_name(name)?, ValueSource::CliFlag),
        None => Resolved::new(
            paths::validate_case_name(&paths::default_case_name(&compset.value, resolution.name))?,
            ValueSource::Derived,
        ),
    };

    let output_root = paths::resolve_output_root(env, machine.value, &account.value);

    tracing::debug!(
        machine = machine.value.name,
        resolution = resolution.name,
        compset = %compset.value,
        output_root = %output_root.value.display(),
        "resolved run configuration"
    );

    Ok(RunConfig {
        machine,
        resolution,
        compset,
        queue,
        walltime,
        threads,
        stop_option,
        stop_n,
        project,
        account,
        src_root,
        case_name,
        output_root,
        profile: overrides.profile,
        chemistry: overrides.chemistry,
        perf_analysis: overrides.perf_analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn env() -> EnvSnapshot {
        EnvSnapshot {
            user: Some("jdoe".to_string()),
            home: Some(PathBuf::from("/home/jdoe")),
            ..Default::default()
        }
    }

    fn resolve(res: &str, overrides: &CaseOverrides) -> Result<RunConfig> {
        resolve_run_config(res, overrides, &env(), &CamcaseConfig::default())
    }

    #[test]
    fn test_defaults_for_f09() {
        let cfg = resolve("f09_f09_mg17", &CaseOverrides::default()).unwrap();
        assert_eq!(cfg.processors(), 256);
        assert_eq!(cfg.machine.value.name, "derecho");
        assert_eq!(cfg.machine.source, ValueSource::Default);
        assert_eq!(cfg.compset.value, "FHIST");
        assert_eq!(cfg.queue.value, "main");
        assert_eq!(cfg.queue.source, ValueSource::Machine);
        assert_eq!(cfg.walltime.value, "00:30:00");
        assert_eq!(cfg.threads.value, 1);
        assert_eq!(cfg.stop_option.value, "ndays");
        assert_eq!(cfg.stop_n.value, 5);
        assert!(cfg.project.is_none());
        assert_eq!(cfg.case_name.value, "FHIST.f09_f09_mg17");
        assert_eq!(cfg.src_root.value, Path::new("/home/jdoe/cesm"));
        assert_eq!(
            cfg.create_newcase_path(),
            Path::new("/home/jdoe/cesm/cime/scripts/create_newcase")
        );
        assert_eq!(
            cfg.case_dir(),
            Path::new("/glade/derecho/scratch/jdoe/FHIST.f09_f09_mg17")
        );
    }

    #[test]
    fn test_unsupported_resolution() {
        let err = resolve("xx99", &CaseOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedResolution { .. }));
    }

    #[test]
    fn test_unsupported_machine() {
        let overrides = CaseOverrides {
            machine: Some("cheyenne".to_string()),
            ..Default::default()
        };
        let err = resolve("f09_f09_mg17", &overrides).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMachine { .. }));
    }

    #[test]
    fn test_flag_beats_env_beats_file() {
        let file = CamcaseConfig {
            machine: Some("derecho".to_string()),
            project: Some("PFILE".to_string()),
            ..Default::default()
        };
        let mut env = env();
        env.machine = Some("casper".to_string());
        env.project = Some("PENV".to_string());

        let cfg =
            resolve_run_config("f19_f19_mg17", &CaseOverrides::default(), &env, &file).unwrap();
        assert_eq!(cfg.machine.value.name, "casper");
        assert_eq!(cfg.machine.source, ValueSource::EnvVar(MACHINE_ENV.to_string()));
        assert_eq!(cfg.project(), Some("PENV"));
        assert_eq!(cfg.queue.value, "casper");

        let overrides = CaseOverrides {
            machine: Some("derecho".to_string()),
            project: Some("PFLAG".to_string()),
            ..Default::default()
        };
        let cfg = resolve_run_config("f19_f19_mg17", &overrides, &env, &file).unwrap();
        assert_eq!(cfg.machine.value.name, "derecho");
        assert_eq!(cfg.machine.source, ValueSource::CliFlag);
        assert_eq!(cfg.project(), Some("PFLAG"));
    }

    #[test]
    fn test_config_file_values_used_when_no_flag() {
        let file = CamcaseConfig {
            queue: Some("develop".to_string()),
            walltime: Some("02:00:00".to_string()),
            threads: Some(4),
            compset: Some("FLTHIST".to_string()),
            cesm_root: Some(PathBuf::from("/work/cesm")),
            ..Default::default()
        };
        let cfg =
            resolve_run_config("f09_f09_mg17", &CaseOverrides::default(), &env(), &file).unwrap();
        assert_eq!(cfg.queue.value, "develop");
        assert_eq!(cfg.queue.source, ValueSource::ConfigFile);
        assert_eq!(cfg.walltime.value, "02:00:00");
        assert_eq!(cfg.threads.value, 4);
        assert_eq!(cfg.compset.value, "FLTHIST");
        assert_eq!(cfg.src_root.value, Path::new("/work/cesm"));
        assert_eq!(cfg.case_name.value, "FLTHIST.f09_f09_mg17");
    }

    #[test]
    fn test_long_profile_stop_pair_and_walltime() {
        let overrides = CaseOverrides {
            profile: RunProfile::Long,
            ..Default::default()
        };
        let cfg = resolve("f09_f09_mg17", &overrides).unwrap();
        assert_eq!(cfg.stop_option.value, "nmonths");
        assert_eq!(cfg.stop_n.value, 12);
        assert_eq!(cfg.walltime.value, "06:00:00");
        assert_eq!(cfg.stop_option.source, ValueSource::Profile);
    }

    #[test]
    fn test_stop_overrides_win_independently() {
        let overrides = CaseOverrides {
            profile: RunProfile::Long,
            stop_n: Some(3),
            ..Default::default()
        };
        let cfg = resolve("f09_f09_mg17", &overrides).unwrap();
        assert_eq!(cfg.stop_option.value, "nmonths");
        assert_eq!(cfg.stop_n.value, 3);
        assert_eq!(cfg.stop_n.source, ValueSource::CliFlag);

        let overrides = CaseOverrides {
            stop_option: Some("nyears".to_string()),
            ..Default::default()
        };
        let cfg = resolve("f09_f09_mg17", &overrides).unwrap();
        assert_eq!(cfg.stop_option.value, "nyears");
        assert_eq!(cfg.stop_n.value, 5);
    }

    #[test]
    fn test_invalid_flag_values() {
        for overrides in [
            CaseOverrides {
                stop_option: Some("weeks".to_string()),
                ..Default::default()
            },
            CaseOverrides {
                stop_n: Some(0),
                ..Default::default()
            },
            CaseOverrides {
                threads: Some(0),
                ..Default::default()
            },
            CaseOverrides {
                walltime: Some("90 minutes".to_string()),
                ..Default::default()
            },
        ] {
            let err = resolve("f09_f09_mg17", &overrides).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_chemistry_switches_default_compset() {
        let overrides = CaseOverrides {
            chemistry: true,
            ..Default::default()
        };
        let cfg = resolve("f19_f19_mg17", &overrides).unwrap();
        assert_eq!(cfg.compset.value, "FCHIST");
        assert_eq!(cfg.case_name.value, "FCHIST.f19_f19_mg17");

        let overrides = CaseOverrides {
            chemistry: true,
            compset: Some("FCnudged".to_string()),
            ..Default::default()
        };
        let cfg = resolve("f19_f19_mg17", &overrides).unwrap();
        assert_eq!(cfg.compset.value, "FCnudged");
    }

    #[test]
    fn test_explicit_case_name() {
        let overrides = CaseOverrides {
            case_name: Some("perf-test-01".to_string()),
            ..Default::default()
        };
        let cfg = resolve("f09_f09_mg17", &overrides).unwrap();
        assert_eq!(cfg.case_dir().file_name().unwrap(), "perf-test-01");
    }

    #[test]
    fn test_derived_case_name_stays_under_output_root() {
        let overrides = CaseOverrides {
            compset: Some("../../x".to_string()),
            ..Default::default()
        };
        let err = resolve("f09_f09_mg17", &overrides).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let overrides = CaseOverrides {
            compset: Some("HIST_CAM60%CCTS_CLM50%SP".to_string()),
            ..Default::default()
        };
        let cfg = resolve("f09_f09_mg17", &overrides).unwrap();
        assert_eq!(cfg.case_name.value, "HIST_CAM60%CCTS_CLM50%SP.f09_f09_mg17");
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(ValueSource::CliFlag.to_string(), "cli");
        assert_eq!(ValueSource::EnvVar("PROJECT".into()).to_string(), "env:PROJECT");
        assert_eq!(ValueSource::ConfigFile.to_string(), "config");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_snapshot_treats_empty_as_unset() {
        // SAFETY: serialized with every other test touching the environment
        unsafe {
            std::env::set_var(MACHINE_ENV, "casper");
            std::env::set_var(PROJECT_ENV, "  ");
        }
        let snap = EnvSnapshot::from_process();
        unsafe {
            std::env::remove_var(MACHINE_ENV);
            std::env::remove_var(PROJECT_ENV);
        }

        assert_eq!(snap.machine.as_deref(), Some("casper"));
        assert_eq!(snap.project, None);
    }
}
