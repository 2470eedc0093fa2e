//! Read-only analyses over a [`TaskGraph`](crate::models::TaskGraph).
//!
//! Analyses never mutate the graph; callers re-run them on demand after
//! edits.
//!
//! - [`CriticalPathAnalyzer`]: forward/backward pass, float, critical set
//! - [`WorkloadReport`]: per-owner load over working days
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - PMI (2017), "PMBOK Guide", 6th ed., §6.5.2.2 (critical path method)

mod critical_path;
mod workload;

pub use critical_path::{CriticalPathAnalyzer, CriticalPathOptions, CriticalPathReport, TaskMetrics};
pub use workload::{OwnerLoad, WorkloadReport};
