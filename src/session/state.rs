//! Per-run session state
//!
//! Applies runner events to the tracker and keeps the counters and captured
//! output of one run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use super::events::RunnerEvent;
use crate::models::{ItemId, Outcome, Stage};
use crate::report::{render_report, Summary};
use crate::tracker::{OutcomeTracker, TrackerError};

/// What to run: a whole file or the test around a line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunTarget {
    pub path: PathBuf,
    pub line: Option<u32>,
}

impl RunTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
        }
    }

    pub fn function(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

/// Effect of one event on the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Nothing for the host to show
    Quiet,
    /// A test started
    Progress { started: usize, collected: usize },
    /// Runner output arrived; results can be shown
    ResultsReady,
    /// The runner reported a failure of its own
    RunnerFailed(String),
    /// The event stream ended
    Finished,
}

/// State of one test run
#[derive(Clone, Debug)]
pub struct TestSession {
    pub target: RunTarget,
    pub num_collected: usize,
    pub num_started: usize,
    pub outcomes: Option<BTreeMap<String, usize>>,
    pub stdout: Option<String>,
    /// Set by `error` or `quit`; later events are ignored
    pub finished: bool,
}

impl TestSession {
    pub fn new(target: RunTarget) -> Self {
        Self {
            target,
            num_collected: 0,
            num_started: 0,
            outcomes: None,
            stdout: None,
            finished: false,
        }
    }

    /// Apply one runner event
    pub fn apply(
        &mut self,
        event: &RunnerEvent,
        tracker: &mut OutcomeTracker,
    ) -> Result<SessionUpdate, TrackerError> {
        if self.finished {
            debug!("Ignoring {} event after the run ended", event.name());
            return Ok(SessionUpdate::Quiet);
        }

        match event {
            RunnerEvent::CollectionFinish { items } => {
                self.num_collected = items.len();
                for item in items {
                    tracker.record_collected_at(item.nodeid.as_str(), item.lineno);
                }
                debug!("Collected {} items", items.len());
                Ok(SessionUpdate::Quiet)
            }
            RunnerEvent::Protocol { .. } => {
                self.num_started += 1;
                Ok(SessionUpdate::Progress {
                    started: self.num_started,
                    collected: self.num_collected,
                })
            }
            RunnerEvent::Stage { stage, item } => {
                tracker.record_stage(&ItemId::from(item.nodeid.as_str()), *stage)?;
                Ok(SessionUpdate::Quiet)
            }
            RunnerEvent::LogReport {
                nodeid,
                stage,
                outcome,
            } => {
                if let Some(outcome) = report_outcome(*stage, outcome)? {
                    tracker.record_result(&ItemId::from(nodeid.as_str()), outcome)?;
                }
                Ok(SessionUpdate::Quiet)
            }
            RunnerEvent::SessionFinish { outcomes } => {
                self.outcomes = Some(outcomes.clone());
                Ok(SessionUpdate::Quiet)
            }
            RunnerEvent::Stdout { stdout } => {
                self.stdout = Some(stdout.clone());
                Ok(SessionUpdate::ResultsReady)
            }
            RunnerEvent::Error { msg } => {
                self.finished = true;
                Ok(SessionUpdate::RunnerFailed(msg.clone()))
            }
            RunnerEvent::Quit => {
                self.finished = true;
                Ok(SessionUpdate::Finished)
            }
        }
    }

    pub fn has_results(&self) -> bool {
        self.stdout.is_some()
    }

    /// Report body: the runner output without its first and last line, or the
    /// rendered item list when no output was captured
    pub fn report_lines(&self, tracker: &OutcomeTracker) -> Vec<String> {
        match &self.stdout {
            Some(stdout) => {
                let lines: Vec<&str> = stdout.split('\n').collect();
                if lines.len() <= 2 {
                    return Vec::new();
                }
                lines[1..lines.len() - 1]
                    .iter()
                    .map(|l| l.to_string())
                    .collect()
            }
            None => render_report(&tracker.snapshot())
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }

    pub fn summary(&self, tracker: &OutcomeTracker) -> Summary {
        match &self.outcomes {
            Some(outcomes) => Summary::new(
                self.num_started,
                outcomes.iter().map(|(k, v)| (k.clone(), *v)),
            ),
            None => Summary::from_tracker(tracker),
        }
    }
}

/// Result carried by a stage report, if any.
///
/// The call report holds the test result; setup and teardown reports only
/// matter when they did not pass, and a failure there is an error. A teardown
/// error after a finished call does not replace the call result, while the
/// runner's own counts still include it.
fn report_outcome(stage: Stage, outcome: &str) -> Result<Option<Outcome>, TrackerError> {
    let outcome: Outcome = outcome.parse()?;
    Ok(match (stage, outcome) {
        (Stage::Call, o) => Some(o),
        (_, Outcome::Passed) => None,
        (_, Outcome::Failed) => Some(Outcome::Error),
        (_, o) => Some(o),
    })
}
