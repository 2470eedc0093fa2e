//! Precedence links between tasks.
//!
//! A link constrains its target task relative to its source task. The
//! anchor on each side (start or finish) is fixed by the [`LinkType`];
//! `lag` shifts the constraint by whole working days (negative = lead).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precedence relationship kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Target starts after source finishes.
    #[default]
    FinishToStart,
    /// Target starts after source starts.
    StartToStart,
    /// Target finishes after source finishes.
    FinishToFinish,
    /// Target finishes after source starts.
    StartToFinish,
}

impl LinkType {
    /// Whether the constraint is anchored on the source's finish.
    #[inline]
    pub fn from_source_finish(self) -> bool {
        matches!(self, LinkType::FinishToStart | LinkType::FinishToFinish)
    }

    /// Whether the constraint bounds the target's finish (rather than start).
    #[inline]
    pub fn to_target_finish(self) -> bool {
        matches!(self, LinkType::FinishToFinish | LinkType::StartToFinish)
    }

    /// Short code: `FS`, `SS`, `FF` or `SF`.
    pub fn code(self) -> &'static str {
        match self {
            LinkType::FinishToStart => "FS",
            LinkType::StartToStart => "SS",
            LinkType::FinishToFinish => "FF",
            LinkType::StartToFinish => "SF",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A dependency link `source → target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique link identifier.
    pub id: String,
    /// Predecessor task ID.
    pub source: String,
    /// Successor task ID.
    pub target: String,
    /// Relationship kind.
    pub link_type: LinkType,
    /// Offset in working days (negative = lead time).
    pub lag: i64,
}

impl Link {
    /// Creates a finish-to-start link with zero lag.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            link_type: LinkType::FinishToStart,
            lag: 0,
        }
    }

    /// Sets the relationship kind.
    pub fn with_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    /// Sets the lag (negative for lead time).
    pub fn with_lag(mut self, lag: i64) -> Self {
        self.lag = lag;
        self
    }

    /// Whether source and target are the same task.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_builder() {
        let link = Link::new("L1", "A", "B")
            .with_type(LinkType::StartToStart)
            .with_lag(-2);
        assert_eq!(link.source, "A");
        assert_eq!(link.target, "B");
        assert_eq!(link.link_type, LinkType::StartToStart);
        assert_eq!(link.lag, -2);
        assert!(!link.is_self_loop());
        assert!(Link::new("L2", "A", "A").is_self_loop());
    }

    #[test]
    fn test_link_type_anchors() {
        assert!(LinkType::FinishToStart.from_source_finish());
        assert!(!LinkType::FinishToStart.to_target_finish());
        assert!(!LinkType::StartToStart.from_source_finish());
        assert!(!LinkType::StartToStart.to_target_finish());
        assert!(LinkType::FinishToFinish.from_source_finish());
        assert!(LinkType::FinishToFinish.to_target_finish());
        assert!(!LinkType::StartToFinish.from_source_finish());
        assert!(LinkType::StartToFinish.to_target_finish());
    }

    #[test]
    fn test_link_type_display() {
        assert_eq!(LinkType::default(), LinkType::FinishToStart);
        assert_eq!(format!("{}", LinkType::StartToFinish), "SF");
    }
}
