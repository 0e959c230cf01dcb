//! Outcome models for test items
//!
//! Defines outcomes, stages, and the severity table used for rendering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tracker::TrackerError;

/// Current status of a test item: a non-terminal stage or a terminal result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    // Non-terminal
    Collected,
    StageSetup,
    StageCall,
    StageTeardown,

    // Terminal
    Passed,
    Failed,
    Error,
    #[serde(rename = "xpassed")]
    XPassed,
    #[serde(rename = "xfailed")]
    XFailed,
    Skipped,
}

impl Outcome {
    /// Get all outcomes in table order
    pub fn all() -> Vec<Outcome> {
        vec![
            Outcome::Collected,
            Outcome::StageSetup,
            Outcome::StageCall,
            Outcome::StageTeardown,
            Outcome::Passed,
            Outcome::Failed,
            Outcome::Error,
            Outcome::XPassed,
            Outcome::XFailed,
            Outcome::Skipped,
        ]
    }

    /// Whether this outcome is a final result
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Outcome::Passed
                | Outcome::Failed
                | Outcome::Error
                | Outcome::XPassed
                | Outcome::XFailed
                | Outcome::Skipped
        )
    }

    /// Position in the lifecycle; all terminal outcomes share the last rank
    pub fn rank(&self) -> u8 {
        match self {
            Outcome::Collected => 0,
            Outcome::StageSetup => 1,
            Outcome::StageCall => 2,
            Outcome::StageTeardown => 3,
            _ => 4,
        }
    }

    /// Short label shown next to the item
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Collected => "..",
            Outcome::StageSetup => "S>",
            Outcome::StageCall => "C>",
            Outcome::StageTeardown => "T>",
            Outcome::Passed => "OK",
            Outcome::Failed => "FF",
            Outcome::Error => "EE",
            Outcome::XPassed => "XP",
            Outcome::XFailed => "XF",
            Outcome::Skipped => "SS",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Outcome::Collected
            | Outcome::StageSetup
            | Outcome::StageCall
            | Outcome::StageTeardown => Severity::Info,
            Outcome::Passed => Severity::Success,
            Outcome::XPassed | Outcome::XFailed | Outcome::Skipped => Severity::Warning,
            Outcome::Failed | Outcome::Error => Severity::Error,
        }
    }

    /// Runner-facing name, e.g. `passed` or `stage_call`
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Collected => "collected",
            Outcome::StageSetup => "stage_setup",
            Outcome::StageCall => "stage_call",
            Outcome::StageTeardown => "stage_teardown",
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Error => "error",
            Outcome::XPassed => "xpassed",
            Outcome::XFailed => "xfailed",
            Outcome::Skipped => "skipped",
        }
    }
}

impl FromStr for Outcome {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::all()
            .into_iter()
            .find(|o| o.name() == s.to_lowercase())
            .ok_or_else(|| TrackerError::InvalidOutcome(s.to_string()))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-terminal execution phase of a test item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Setup,
    Call,
    Teardown,
}

impl From<Stage> for Outcome {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Setup => Outcome::StageSetup,
            Stage::Call => Outcome::StageCall,
            Stage::Teardown => Outcome::StageTeardown,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Call => write!(f, "call"),
            Stage::Teardown => write!(f, "teardown"),
        }
    }
}

/// Styling class handed to the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// ANSI color code used by the terminal host
    pub fn ansi(&self) -> &'static str {
        match self {
            Severity::Info => "\x1b[0m",
            Severity::Success => "\x1b[32m",
            Severity::Warning => "\x1b[33m",
            Severity::Error => "\x1b[31m",
        }
    }
}
