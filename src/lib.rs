//! Task-dependency planning core.
//!
//! Maintains a project plan as a graph of tasks joined by precedence links,
//! keeps every task's dates consistent with its links on a working-day
//! calendar, and derives summary tasks from their children.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Link`, `LinkType`, `WorkCalendar`,
//!   `TaskGraph`
//! - **`scheduler`**: Edit application, cascading date propagation, WBS rollup
//! - **`analysis`**: Critical path (CPM) and workload reports
//! - **`planner`**: `Planner`, the single gateway for edits
//! - **`validation`**: Bulk input checks (duplicate IDs, hierarchy, DAG cycles)
//! - **`config`**: TOML-loadable calendar and analysis settings
//!
//! # Architecture
//!
//! Mutations flow one way: an edit enters through [`Planner`], is
//! validated and applied by the scheduler, cascades along links, and rolls
//! up into summary tasks. Analyses read the resulting graph and never
//! mutate it.
//!
//! The library emits `tracing` events but never installs a subscriber.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - PMI (2017), "PMBOK Guide", 6th ed., Ch. 6 (Project Schedule Management)
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4

pub mod analysis;
pub mod config;
pub mod error;
pub mod models;
pub mod planner;
pub mod scheduler;
pub mod validation;

pub use error::{Error, Result};
pub use planner::Planner;
