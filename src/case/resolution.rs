//! Supported model grids and the processor count each one runs on.

use crate::{Error, Result};
use serde::Serialize;

/// A model resolution (CIME grid alias) with its task count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// CIME grid alias, passed to `create_newcase --res`
    pub name: &'static str,
    /// MPI tasks (`NTASKS`) used for this grid
    pub processors: u32,
    pub description: &'static str,
}

pub static RESOLUTIONS: &[Resolution] = &[
    Resolution {
        name: "f09_f09_mg17",
        processors: 256,
        description: "0.9x1.25 finite volume",
    },
    Resolution {
        name: "f19_f19_mg17",
        processors: 128,
        description: "1.9x2.5 finite volume",
    },
    Resolution {
        name: "f45_f45_mg37",
        processors: 64,
        description: "4x5 finite volume",
    },
    Resolution {
        name: "ne16pg3_ne16pg3_mg17",
        processors: 128,
        description: "spectral element ne16, pg3 physics",
    },
    Resolution {
        name: "ne30pg3_ne30pg3_mg17",
        processors: 512,
        description: "spectral element ne30, pg3 physics",
    },
];

impl Resolution {
    /// Look up a resolution by its exact grid alias.
    pub fn lookup(name: &str) -> Result<&'static Resolution> {
        RESOLUTIONS
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnsupportedResolution {
                name: name.to_string(),
                supported: Self::names(),
            })
    }

    pub fn names() -> Vec<String> {
        RESOLUTIONS.iter().map(|r| r.name.to_string()).collect()
    }
}
