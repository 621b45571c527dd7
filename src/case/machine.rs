//! Supported machines and their scratch layout.

use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Batch system used by a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchSystem {
    Pbs,
}

impl std::fmt::Display for BatchSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchSystem::Pbs => write!(f, "pbs"),
        }
    }
}

/// A machine known to CIME that camcase can create cases on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Machine {
    /// CIME machine name, passed to `create_newcase --machine`
    pub name: &'static str,
    /// Root of the per-user scratch area (user name is appended)
    pub scratch_root: &'static str,
    /// Queue used when none is given
    pub default_queue: &'static str,
    pub batch: BatchSystem,
}

/// Machine used when nothing else selects one.
pub const DEFAULT_MACHINE: &str = "derecho";

pub static MACHINES: &[Machine] = &[
    Machine {
        name: "derecho",
        scratch_root: "/glade/derecho/scratch",
        default_queue: "main",
        batch: BatchSystem::Pbs,
    },
    Machine {
        name: "casper",
        scratch_root: "/glade/derecho/scratch",
        default_queue: "casper",
        batch: BatchSystem::Pbs,
    },
];

impl Machine {
    /// Look up a machine by name (case-insensitive).
    pub fn lookup(name: &str) -> Result<&'static Machine> {
        MACHINES
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::UnsupportedMachine {
                name: name.to_string(),
                supported: Self::names(),
            })
    }

    /// Names of all supported machines, in table order.
    pub fn names() -> Vec<String> {
        MACHINES.iter().map(|m| m.name.to_string()).collect()
    }

    pub fn scratch_root(&self) -> PathBuf {
        PathBuf::from(self.scratch_root)
    }
}
