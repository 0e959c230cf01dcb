//! Runner event protocol
//!
//! The runner writes one JSON object per line on stdout, tagged by `event`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::Stage;

/// Test item as described by the runner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerItem {
    pub nodeid: String,
    #[serde(default)]
    pub lineno: Option<u32>,
}

/// Event emitted by the runner process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RunnerEvent {
    /// Collection finished with these items
    CollectionFinish { items: Vec<RunnerItem> },

    /// A test started its run protocol
    Protocol { item: RunnerItem },

    /// A test entered a stage
    Stage { stage: Stage, item: RunnerItem },

    /// Report for one stage of a test
    LogReport {
        nodeid: String,
        stage: Stage,
        outcome: String,
    },

    /// Final outcome counts
    SessionFinish { outcomes: BTreeMap<String, usize> },

    /// Captured terminal output of the runner
    Stdout { stdout: String },

    /// The runner itself failed
    Error { msg: String },

    Quit,
}

impl RunnerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RunnerEvent::CollectionFinish { .. } => "collectionfinish",
            RunnerEvent::Protocol { .. } => "protocol",
            RunnerEvent::Stage { .. } => "stage",
            RunnerEvent::LogReport { .. } => "logreport",
            RunnerEvent::SessionFinish { .. } => "sessionfinish",
            RunnerEvent::Stdout { .. } => "stdout",
            RunnerEvent::Error { .. } => "error",
            RunnerEvent::Quit => "quit",
        }
    }
}

/// A line that is not a usable event
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Unhandled event: {0}")]
    Unhandled(String),

    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse one line of runner output
pub fn parse_event(line: &str) -> Result<RunnerEvent, EventError> {
    match serde_json::from_str::<RunnerEvent>(line) {
        Ok(event) => Ok(event),
        Err(e) => {
            let value: serde_json::Value = serde_json::from_str(line)?;
            match value.get("event").and_then(|v| v.as_str()) {
                Some(name) if !is_known(name) => Err(EventError::Unhandled(name.to_string())),
                _ => Err(EventError::Malformed(e)),
            }
        }
    }
}

fn is_known(name: &str) -> bool {
    matches!(
        name,
        "collectionfinish"
            | "protocol"
            | "stage"
            | "logreport"
            | "sessionfinish"
            | "stdout"
            | "error"
            | "quit"
    )
}
