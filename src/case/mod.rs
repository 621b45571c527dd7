//! Case provisioning: machine and grid tables, path resolution, namelist
//! overrides and the CIME command sequence.

pub mod cime;
pub mod machine;
pub mod namelist;
pub mod paths;
pub mod profile;
pub mod provision;
pub mod resolution;
pub mod runner;

pub use cime::CimeCommand;
pub use machine::Machine;
pub use profile::RunProfile;
pub use provision::{ProvisionOptions, ProvisionPlan, Step};
pub use resolution::Resolution;
pub use runner::{CommandRunner, SystemRunner};
