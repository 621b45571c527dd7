//! ESMF timing tooling.
//!
//! - [`summary`] parses `ESMF_Profile.summary` region tables
//! - [`compare`] lines up named timers between a baseline and an optimized run
//! - [`children`] reports the children of one region
//! - [`report`] renders text tables and CSV
//! - [`chart`] writes the SVG comparison chart

pub mod chart;
pub mod children;
pub mod compare;
pub mod report;
pub mod summary;

pub use children::{ChildTiming, ChildrenReport, children_report};
pub use compare::{AnnotationStyle, TimerComparison, TimerStats, compare_timers};
pub use summary::{ProfileRow, load_summary, parse_summary};
