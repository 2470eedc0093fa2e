//! Error types for planning edits.
//!
//! Every failure is returned synchronously to the caller of
//! [`Planner::apply_mutation`](crate::Planner::apply_mutation). A failed edit
//! never leaves the graph partially modified.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Adding the link `from → to` would close a dependency cycle.
    #[error("Dependency cycle detected: link {from} -> {to} would close a cycle")]
    CycleDetected { from: String, to: String },

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Invalid task state: {0}")]
    InvalidTaskState(String),

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// A date computation left the range `NaiveDate` can represent.
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid calendar: {0}")]
    InvalidCalendar(String),

    #[error("Project validation failed with {} error(s)", .0.len())]
    Validation(Vec<crate::validation::ValidationError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error is a dependency-cycle rejection.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::CycleDetected { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
