//! Edit application, date propagation and WBS rollup.
//!
//! Mutations flow one way: an [`Edit`] is validated against the graph,
//! applied, propagated along dependency links by the [`Scheduler`], and
//! rolled up into summary tasks by the [`WbsAggregator`].
//!
//! # Algorithm
//!
//! `Scheduler` propagates in topological order with a fixed-point
//! short-circuit: a task's successors are revisited only if its dates
//! actually changed. `WbsAggregator` recomputes summary tasks deepest first.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - PMI (2017), "PMBOK Guide", 6th ed., §6.5 (precedence diagramming)

mod edit;
mod propagate;
mod wbs;

pub use edit::Edit;
pub use propagate::Scheduler;
pub use wbs::{Rollup, WbsAggregator};
