//! Output formatters for run state
//!
//! Provides table, JSON, CSV, and summary output formats.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{Severity, TestItem};
use crate::report::Summary;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    items: &'a [TestItem],
    summary: &'a Summary,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    outcome: &'a str,
    line: Option<u32>,
    updated_at: String,
}

/// Run state formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format the items of a run and its summary
    pub fn format_run(&self, items: &[TestItem], summary: &Summary) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_table(items, summary)),
            OutputFormat::Json => serde_json::to_string(&RunOutput { items, summary })
                .context("Failed to serialize run"),
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(&RunOutput { items, summary })
                    .context("Failed to serialize run")
            }
            OutputFormat::Csv => self.format_csv(items),
            OutputFormat::Summary => Ok(self.paint(&summary.to_string(), summary.severity())),
        }
    }

    fn format_table(&self, items: &[TestItem], summary: &Summary) -> String {
        let mut output = String::new();
        let width = items
            .iter()
            .map(|i| i.id.as_str().len())
            .max()
            .unwrap_or(0)
            .max(4);

        output.push_str(&format!("{:<width$}  {:<14}  {:>5}\n", "Test", "Outcome", "Line"));
        output.push_str(&format!("{}\n", "─".repeat(width + 23)));

        for item in items {
            let outcome = format!("{} {}", item.outcome.label(), item.outcome);
            let line = item.line.map(|l| l.to_string()).unwrap_or_default();
            output.push_str(&format!(
                "{:<width$}  {}  {:>5}\n",
                item.id.as_str(),
                self.paint(&format!("{outcome:<14}"), item.outcome.severity()),
                line
            ));
        }

        output.push_str(&format!("{}\n", "─".repeat(width + 23)));
        output.push_str(&self.paint(&summary.to_string(), summary.severity()));
        output.push('\n');
        output
    }

    fn format_csv(&self, items: &[TestItem]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for item in items {
            writer
                .serialize(CsvRow {
                    id: item.id.as_str(),
                    outcome: item.outcome.name(),
                    line: item.line,
                    updated_at: item.updated_at.to_rfc3339(),
                })
                .context("Failed to write CSV row")?;
        }
        let bytes = writer.into_inner().context("Failed to flush CSV")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    fn paint(&self, text: &str, severity: Severity) -> String {
        if self.colorize && severity != Severity::Info {
            format!("{}{}\x1b[0m", severity.ansi(), text)
        } else {
            text.to_string()
        }
    }
}
