//! Planning domain models.
//!
//! Provides the core data types of a project plan: tasks with calendar
//! spans, precedence links between them, the working-day calendar, and the
//! graph that owns them all.
//!
//! # Domain Mappings
//!
//! | u-plan | Gantt chart | Construction | Software |
//! |--------|-------------|--------------|----------|
//! | Task | Bar | Work package | Ticket |
//! | Summary task | Group row | Phase | Epic |
//! | Link | Arrow | Precedence | Blocked-by |
//! | WorkCalendar | Shaded columns | Site days | Sprint days |

mod calendar;
mod graph;
mod link;
mod task;

pub use calendar::WorkCalendar;
pub use graph::TaskGraph;
pub use link::{Link, LinkType};
pub use task::Task;

pub(crate) use task::{check_duration, check_progress, out_of_range};
