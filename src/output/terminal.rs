//! Terminal host
//!
//! Carries out host actions on a terminal: status messages become colored
//! lines and the report window becomes a bounded block of text.

#![allow(dead_code)]

use std::io::{self, Write};
use tracing::debug;

use crate::models::Severity;
use crate::session::HostAction;

const RULE_WIDTH: usize = 60;

/// Writes host actions to a terminal stream
pub struct TerminalHost {
    out: Box<dyn Write + Send>,
    colorize: bool,
    report_open: bool,
}

impl TerminalHost {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            colorize: true,
            report_open: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Whether a report block is currently shown
    pub fn report_open(&self) -> bool {
        self.report_open
    }

    pub fn apply_all(&mut self, actions: impl IntoIterator<Item = HostAction>) -> io::Result<()> {
        for action in actions {
            self.apply(action)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, action: HostAction) -> io::Result<()> {
        match action {
            HostAction::Echo(lines) => {
                for line in lines {
                    let text = self.paint(&line.text, line.severity);
                    writeln!(self.out, "{text}")?;
                }
            }
            HostAction::ShowReport { height, lines } => {
                let title = format!("── Results ({}/{} lines) ", height.min(lines.len()), lines.len());
                writeln!(self.out, "{title:─<RULE_WIDTH$}")?;
                for line in lines.iter().take(height) {
                    writeln!(self.out, "{line}")?;
                }
                writeln!(self.out, "{}", "─".repeat(RULE_WIDTH))?;
                self.report_open = true;
            }
            HostAction::HideReport => {
                debug!("Report closed");
                self.report_open = false;
            }
        }
        self.out.flush()
    }

    fn paint(&self, text: &str, severity: Severity) -> String {
        if self.colorize && severity != Severity::Info {
            format!("{}{}\x1b[0m", severity.ansi(), text)
        } else {
            text.to_string()
        }
    }
}
