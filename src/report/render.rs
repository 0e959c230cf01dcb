//! Report and summary rendering

use serde::Serialize;
use std::fmt;

use super::message::{format_message, MessageLine};
use crate::models::{ItemId, Outcome, Severity};
use crate::tracker::OutcomeTracker;

/// Outcome names that do not count as a broken run
const GOOD_OUTCOMES: &[&str] = &["passed", "skipped", "xfailed", "xpassed"];

/// One line of the item report
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub label: &'static str,
    pub id: ItemId,
    pub severity: Severity,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.id)
    }
}

/// Render one line per item, in snapshot order
pub fn render_report(snapshot: &[(ItemId, Outcome)]) -> Vec<ReportLine> {
    snapshot
        .iter()
        .map(|(id, outcome)| ReportLine {
            label: outcome.label(),
            id: id.clone(),
            severity: outcome.severity(),
        })
        .collect()
}

pub fn is_bad_outcome(name: &str) -> bool {
    !GOOD_OUTCOMES.contains(&name)
}

/// End-of-run summary
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of tests that were started
    pub total: usize,
    /// Outcome name and count, as reported
    pub outcomes: Vec<(String, usize)>,
}

impl Summary {
    pub fn new(total: usize, outcomes: impl IntoIterator<Item = (String, usize)>) -> Self {
        Self {
            total,
            outcomes: outcomes.into_iter().filter(|(_, n)| *n > 0).collect(),
        }
    }

    /// Summary built from terminal outcomes held by the tracker
    pub fn from_tracker(tracker: &OutcomeTracker) -> Self {
        let outcomes: Vec<_> = tracker
            .counts()
            .into_iter()
            .filter(|(o, _)| o.is_terminal())
            .map(|(o, n)| (o.name().to_string(), n))
            .collect();
        let total = outcomes.iter().map(|(_, n)| n).sum();
        Self::new(total, outcomes)
    }

    pub fn has_bad_outcomes(&self) -> bool {
        self.outcomes.iter().any(|(name, _)| is_bad_outcome(name))
    }

    pub fn severity(&self) -> Severity {
        if self.total == 0 {
            Severity::Warning
        } else if self.outcomes.iter().all(|(name, _)| name == "passed") {
            Severity::Success
        } else if !self.has_bad_outcomes() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    pub fn to_message(&self) -> Vec<MessageLine> {
        format_message(&self.to_string(), self.severity())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return f.write_str("No tests found.");
        }
        let parts: Vec<_> = self
            .outcomes
            .iter()
            .map(|(name, n)| format!("{n} {name}"))
            .collect();
        write!(f, "{} tests done: {}", self.total, parts.join(", "))
    }
}
