//! CIME command construction.
//!
//! This module provides a builder for the external commands that create and
//! configure a case. It does not execute anything; see
//! [`crate::case::runner`] for that.

use crate::config::RunConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Builder for one CIME command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CimeCommand {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CimeCommand {
    fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// A script that lives in the case directory and runs from there.
    fn case_script(case_dir: &Path, script: &str) -> Self {
        let mut cmd = Self::new(case_dir.join(script));
        cmd.cwd = Some(case_dir.to_path_buf());
        cmd
    }

    fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    fn flag_with_value(mut self, flag: &str, value: &str) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory, if the command must run inside the case.
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Display form: case scripts as `./name`, others by full path.
    pub fn display(&self) -> String {
        let program = match (&self.cwd, self.program.file_name()) {
            (Some(_), Some(name)) => format!("./{}", name.to_string_lossy()),
            _ => self.program.display().to_string(),
        };
        std::iter::once(program)
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `create_newcase` for the resolved configuration.
    ///
    /// # Example
    /// ```no_run
    /// use camcase::case::cime::CimeCommand;
    /// # fn demo(cfg: &camcase::config::RunConfig) {
    /// let cmd = CimeCommand::create_newcase(cfg);
    /// println!("{}", cmd.display());
    /// # }
    /// ```
    pub fn create_newcase(config: &RunConfig) -> Self {
        let case_dir = config.case_dir();
        let mut cmd = Self::new(config.create_newcase_path())
            .flag_with_value("--case", &case_dir.to_string_lossy())
            .flag_with_value("--compset", &config.compset.value)
            .flag_with_value("--res", config.resolution.name)
            .flag_with_value("--machine", config.machine.value.name);
        if let Some(project) = config.project() {
            cmd = cmd.flag_with_value("--project", project);
        }
        cmd.flag("--run-unsupported")
    }

    /// `./xmlchange` with one or more `NAME=value` assignments.
    pub fn xmlchange(case_dir: &Path, assignments: &[(&str, String)]) -> Self {
        let joined = assignments
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(",");
        Self::case_script(case_dir, "xmlchange").arg(&joined)
    }

    /// `./xmlchange` restricted to one batch job subgroup.
    pub fn xmlchange_subgroup(case_dir: &Path, name: &str, value: &str, subgroup: &str) -> Self {
        Self::xmlchange(case_dir, &[(name, value.to_string())])
            .flag_with_value("--subgroup", subgroup)
    }

    pub fn case_setup(case_dir: &Path) -> Self {
        Self::case_script(case_dir, "case.setup")
    }

    pub fn case_build(case_dir: &Path) -> Self {
        Self::case_script(case_dir, "case.build")
    }

    pub fn case_submit(case_dir: &Path) -> Self {
        Self::case_script(case_dir, "case.submit")
    }
}
