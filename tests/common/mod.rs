//! Common test utilities for camcase integration tests.
//!
//! `TestEnv` builds an isolated directory with a fake CESM checkout whose
//! `create_newcase` creates the case directory and drops logging stand-ins
//! for the case scripts. Every invocation appends its argv to `calls.log`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Environment variable the fake scripts log to.
pub const LOG_ENV: &str = "CAMCASE_TEST_LOG";
/// Name of a case script that should exit with status 3.
pub const FAIL_ENV: &str = "CAMCASE_TEST_FAIL";

const FAKE_CREATE_NEWCASE: &str = r##"#!/bin/sh
echo "create_newcase $*" >> "$CAMCASE_TEST_LOG"
case_dir=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--case" ]; then case_dir="$2"; fi
  shift
done
[ -n "$case_dir" ] || exit 9
mkdir -p "$case_dir"
for tool in xmlchange case.setup case.build case.submit; do
  printf '#!/bin/sh\necho "%s${*:+ $*}" >> "$CAMCASE_TEST_LOG"\n[ "$CAMCASE_TEST_FAIL" = "%s" ] && exit 3\nexit 0\n' "$tool" "$tool" > "$case_dir/$tool"
  chmod +x "$case_dir/$tool"
done
"##;

/// Region table used by the timing tests.
pub const SUMMARY: &str = "\
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

/// An isolated home, output root and fake CESM tree.
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    /// Create the environment with an executable fake `create_newcase`.
    pub fn new() -> Self {
        let env = Self {
            root: TempDir::new().unwrap(),
        };
        let tool = env.cesm_root().join("cime/scripts/create_newcase");
        std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
        std::fs::write(&tool, FAKE_CREATE_NEWCASE).unwrap();
        make_executable(&tool);
        std::fs::create_dir_all(env.output_root()).unwrap();
        env
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn cesm_root(&self) -> PathBuf {
        self.path().join("cesm")
    }

    pub fn output_root(&self) -> PathBuf {
        self.path().join("out")
    }

    pub fn config_file(&self) -> PathBuf {
        self.path().join("config.kdl")
    }

    pub fn log_file(&self) -> PathBuf {
        self.path().join("calls.log")
    }

    /// Default case directory for `resolution` with the default compset.
    pub fn case_dir(&self, resolution: &str) -> PathBuf {
        self.output_root().join(format!("FHIST.{}", resolution))
    }

    /// Logged invocations, one per line. Empty if nothing ran.
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_file())
            .map(|text| text.lines().map(|l| l.trim_end().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn write_config(&self, text: &str) {
        std::fs::write(self.config_file(), text).unwrap();
    }

    /// Get a Command for the camcase binary with an isolated environment.
    pub fn camcase(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_camcase"));
        cmd.current_dir(self.path());
        for var in ["CAMCASE_MACHINE", "PROJECT", "SCRATCH", "CAMCASE_LOG", FAIL_ENV] {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.path());
        cmd.env("USER", "tester");
        cmd.env("CAMCASE_OUTPUT_ROOT", self.output_root());
        cmd.env("CESM_ROOT", self.cesm_root());
        cmd.env("CAMCASE_CONFIG", self.config_file());
        cmd.env(LOG_ENV, self.log_file());
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
pub fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) {}
