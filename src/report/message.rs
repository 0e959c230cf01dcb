//! Status-log message formatting

use serde::Serialize;
use std::fmt;

use crate::models::Severity;

/// Prefix put in front of every status-log line
pub const MESSAGE_TAG: &str = "[VP] ";

/// Width a tab is expanded to
pub const TAB_WIDTH: usize = 8;

/// One formatted status-log line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageLine {
    pub text: String,
    pub severity: Severity,
}

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Split `text` into tagged lines with tabs expanded
pub fn format_message(text: &str, severity: Severity) -> Vec<MessageLine> {
    let tab = " ".repeat(TAB_WIDTH);
    text.split('\n')
        .map(|line| MessageLine {
            text: format!("{MESSAGE_TAG}{}", line.replace('\t', &tab)),
            severity,
        })
        .collect()
}
