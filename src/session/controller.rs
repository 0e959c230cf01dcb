//! Host command surface
//!
//! The controller owns the tracker and the current session, and turns host
//! commands and runner events into actions the host carries out.

use thiserror::Error;
use tracing::{debug, warn};

use super::events::{parse_event, RunnerEvent};
use super::state::{RunTarget, SessionUpdate, TestSession};
use crate::models::Severity;
use crate::report::{format_message, plan_viewport, should_close_report, MessageLine};
use crate::tracker::OutcomeTracker;

/// Errors for commands that cannot run in the current state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("No test results to show.")]
    NoResults,

    #[error("Test runner isn't running.")]
    NotRunning,

    #[error("Subcommand not found: {0}")]
    UnknownCommand(String),

    #[error("Invalid line number: {0}")]
    InvalidLine(String),
}

/// Command issued by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCommand {
    Run(RunTarget),
    Stop,
    Toggle,
    NoSigns,
    Quit,
}

impl HostCommand {
    /// Parse a command line such as `file tests/test_a.py` or `function t.py 12`
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        match (name, args.as_slice()) {
            ("file", [path]) => Ok(HostCommand::Run(RunTarget::file(*path))),
            ("function", [path, line]) => line
                .parse()
                .map(|line| HostCommand::Run(RunTarget::function(*path, line)))
                .map_err(|_| CommandError::InvalidLine(line.to_string())),
            ("stop", []) => Ok(HostCommand::Stop),
            ("toggle", []) => Ok(HostCommand::Toggle),
            ("nosigns", []) => Ok(HostCommand::NoSigns),
            ("quit", []) => Ok(HostCommand::Quit),
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }
}

/// Something the host should do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostAction {
    /// Write lines to the status log
    Echo(Vec<MessageLine>),
    /// Open or resize the report window
    ShowReport { height: usize, lines: Vec<String> },
    /// Remove the report window
    HideReport,
}

impl HostAction {
    pub fn echo(text: &str, severity: Severity) -> Self {
        HostAction::Echo(format_message(text, severity))
    }
}

/// Report sizing settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportSettings {
    pub max_report_size: usize,
    pub viewport_height: usize,
}

/// Owns the run state and answers host commands
#[derive(Debug)]
pub struct Controller {
    settings: ReportSettings,
    tracker: OutcomeTracker,
    session: Option<TestSession>,
    report_height: Option<usize>,
    runner_pid: Option<u32>,
}

impl Controller {
    pub fn new(settings: ReportSettings) -> Self {
        Self {
            settings,
            tracker: OutcomeTracker::new(),
            session: None,
            report_height: None,
            runner_pid: None,
        }
    }

    pub fn tracker(&self) -> &OutcomeTracker {
        &self.tracker
    }

    pub fn session(&self) -> Option<&TestSession> {
        self.session.as_ref()
    }

    /// Height of the open report window
    pub fn report_height(&self) -> Option<usize> {
        self.report_height
    }

    /// Start a new run; all state of the previous run is dropped
    pub fn run(&mut self, target: RunTarget) -> Vec<HostAction> {
        self.tracker.reset();
        let action = HostAction::echo(&format!("Running tests on {target}"), Severity::Info);
        self.session = Some(TestSession::new(target));
        vec![action]
    }

    /// Record the process id of the runner serving the current session
    pub fn runner_started(&mut self, pid: Option<u32>) {
        self.runner_pid = pid;
    }

    pub fn runner_exited(&mut self) {
        self.runner_pid = None;
    }

    /// Whether the runner ended the current run with `error` or `quit`
    pub fn run_finished(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.finished)
    }

    /// Process id of the runner to stop
    pub fn stop(&self) -> Result<u32, CommandError> {
        self.runner_pid.ok_or(CommandError::NotRunning)
    }

    /// Show the report if hidden, hide it if shown
    pub fn toggle(&mut self) -> Result<Vec<HostAction>, CommandError> {
        let session = self.session.as_ref().ok_or(CommandError::NoResults)?;
        if !session.has_results() {
            return Err(CommandError::NoResults);
        }

        if self.report_height.is_some() {
            return Ok(self.hide_report().into_iter().collect());
        }

        let mut actions = vec![self.fill_report()];
        actions.push(self.summary_action());
        Ok(actions)
    }

    /// Forget all item statuses
    pub fn clear(&mut self) {
        self.tracker.reset();
    }

    /// Close the report when it is the only window left
    pub fn window_closed(&mut self, host_has_other_windows: bool) -> Vec<HostAction> {
        if self.report_height.is_some() && should_close_report(host_has_other_windows) {
            self.hide_report().into_iter().collect()
        } else {
            Vec::new()
        }
    }

    /// Parse and apply one line of runner output
    pub fn handle_line(&mut self, line: &str) -> Vec<HostAction> {
        match parse_event(line) {
            Ok(event) => self.handle_event(&event),
            Err(e) => {
                warn!("{}", e);
                vec![HostAction::echo(&e.to_string(), Severity::Warning)]
            }
        }
    }

    /// Apply one runner event
    pub fn handle_event(&mut self, event: &RunnerEvent) -> Vec<HostAction> {
        let Some(session) = self.session.as_mut() else {
            debug!("Dropping {} event outside of a run", event.name());
            return Vec::new();
        };

        match session.apply(event, &mut self.tracker) {
            Ok(SessionUpdate::Quiet) => Vec::new(),
            Ok(SessionUpdate::Finished) => {
                self.runner_pid = None;
                Vec::new()
            }
            Ok(SessionUpdate::Progress { started, collected }) => vec![HostAction::echo(
                &format!("Running test {started}/{collected}"),
                Severity::Info,
            )],
            Ok(SessionUpdate::ResultsReady) => self.show_results(),
            Ok(SessionUpdate::RunnerFailed(msg)) => {
                self.runner_pid = None;
                vec![HostAction::echo(
                    &format!("Exception in test runner: {msg}"),
                    Severity::Error,
                )]
            }
            Err(e) => {
                warn!("Rejected {} event: {}", event.name(), e);
                vec![HostAction::echo(&e.to_string(), Severity::Error)]
            }
        }
    }

    fn show_results(&mut self) -> Vec<HostAction> {
        let bad = self
            .session
            .as_ref()
            .map(|s| s.summary(&self.tracker).has_bad_outcomes())
            .unwrap_or(false);

        let mut actions = Vec::new();
        if bad {
            actions.push(self.fill_report());
        } else {
            actions.extend(self.hide_report());
        }
        actions.push(self.summary_action());
        actions
    }

    fn fill_report(&mut self) -> HostAction {
        let lines = self
            .session
            .as_ref()
            .map(|s| s.report_lines(&self.tracker))
            .unwrap_or_default();
        // An open report shares the viewport with the host window.
        let host_height = match self.report_height {
            Some(current) => self.settings.viewport_height.saturating_sub(current),
            None => self.settings.viewport_height,
        };
        let height = plan_viewport(
            lines.len(),
            self.settings.max_report_size,
            host_height,
            self.report_height,
        );
        debug!("Report window height {} for {} lines", height, lines.len());
        self.report_height = Some(height);
        HostAction::ShowReport { height, lines }
    }

    fn hide_report(&mut self) -> Option<HostAction> {
        self.report_height.take().map(|_| HostAction::HideReport)
    }

    fn summary_action(&self) -> HostAction {
        let summary = self
            .session
            .as_ref()
            .map(|s| s.summary(&self.tracker))
            .unwrap_or_default();
        HostAction::Echo(summary.to_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;

    const FAILING_RUN: &[&str] = &[
        r#"{"event":"collectionfinish","items":[{"nodeid":"t.py::a","lineno":1},{"nodeid":"t.py::b","lineno":5}]}"#,
        r#"{"event":"protocol","item":{"nodeid":"t.py::a"}}"#,
        r#"{"event":"stage","stage":"call","item":{"nodeid":"t.py::a"}}"#,
        r#"{"event":"logreport","nodeid":"t.py::a","stage":"call","outcome":"passed"}"#,
        r#"{"event":"protocol","item":{"nodeid":"t.py::b"}}"#,
        r#"{"event":"logreport","nodeid":"t.py::b","stage":"call","outcome":"failed"}"#,
        r#"{"event":"sessionfinish","outcomes":{"failed":1,"passed":1}}"#,
        r#"{"event":"stdout","stdout":"=== session ===\nt.py .F\nFAILED t.py::b\n=== 1 failed ==="}"#,
        r#"{"event":"quit"}"#,
    ];

    fn controller() -> Controller {
        Controller::new(ReportSettings {
            max_report_size: 30,
            viewport_height: 40,
        })
    }

    fn replay(controller: &mut Controller, lines: &[&str]) -> Vec<HostAction> {
        lines
            .iter()
            .flat_map(|line| controller.handle_line(line))
            .collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            HostCommand::parse("file t.py").unwrap(),
            HostCommand::Run(RunTarget::file("t.py"))
        );
        assert_eq!(
            HostCommand::parse("function t.py 12").unwrap(),
            HostCommand::Run(RunTarget::function("t.py", 12))
        );
        assert_eq!(HostCommand::parse(" toggle ").unwrap(), HostCommand::Toggle);
        assert_eq!(
            HostCommand::parse("rerun").unwrap_err().to_string(),
            "Subcommand not found: rerun"
        );
        assert_eq!(
            HostCommand::parse("function t.py top").unwrap_err(),
            CommandError::InvalidLine("top".to_string())
        );
    }

    #[test]
    fn test_failing_run_shows_report() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        let actions = replay(&mut c, FAILING_RUN);

        assert!(actions.contains(&HostAction::ShowReport {
            height: 2,
            lines: vec!["t.py .F".to_string(), "FAILED t.py::b".to_string()],
        }));
        let last = actions.last().unwrap();
        assert_eq!(
            last,
            &HostAction::echo("2 tests done: 1 failed, 1 passed", Severity::Error)
        );
        assert_eq!(c.report_height(), Some(2));

        let snapshot = c.tracker().snapshot();
        assert_eq!(snapshot[0].1, Outcome::Passed);
        assert_eq!(snapshot[1].1, Outcome::Failed);
    }

    #[test]
    fn test_recorded_demo_run() {
        let mut c = controller();
        c.run(RunTarget::file("tests/test_math.py"));
        let lines: Vec<&str> = include_str!("../../demos/failing_run.jsonl").lines().collect();
        let actions = replay(&mut c, &lines);

        let outcomes: Vec<_> = c.tracker().snapshot().into_iter().map(|(_, o)| o).collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Passed, Outcome::Failed, Outcome::Skipped]
        );
        assert_eq!(
            actions.last().unwrap(),
            &HostAction::echo(
                "3 tests done: 1 failed, 1 passed, 1 skipped",
                Severity::Error
            )
        );
        assert_eq!(c.report_height(), Some(2));
    }

    #[test]
    fn test_progress_echo() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        let actions = replay(&mut c, &FAILING_RUN[..2]);
        assert_eq!(
            actions,
            vec![HostAction::echo("Running test 1/2", Severity::Info)]
        );
    }

    #[test]
    fn test_passing_run_hides_report() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        replay(&mut c, FAILING_RUN);
        assert!(c.report_height().is_some());

        c.run(RunTarget::file("t.py"));
        let actions = replay(
            &mut c,
            &[
                r#"{"event":"collectionfinish","items":[{"nodeid":"t.py::a"}]}"#,
                r#"{"event":"protocol","item":{"nodeid":"t.py::a"}}"#,
                r#"{"event":"logreport","nodeid":"t.py::a","stage":"call","outcome":"passed"}"#,
                r#"{"event":"sessionfinish","outcomes":{"passed":1}}"#,
                r#"{"event":"stdout","stdout":"a\nb\nc"}"#,
            ],
        );

        let n = actions.len();
        assert_eq!(actions[n - 2], HostAction::HideReport);
        assert_eq!(
            actions[n - 1],
            HostAction::echo("1 tests done: 1 passed", Severity::Success)
        );
        assert_eq!(c.report_height(), None);
    }

    #[test]
    fn test_run_resets_tracker() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        replay(&mut c, FAILING_RUN);
        c.run(RunTarget::function("t.py", 5));
        assert!(c.tracker().is_empty());
        assert!(!c.session().unwrap().has_results());
    }

    #[test]
    fn test_toggle() {
        let mut c = controller();
        assert_eq!(c.toggle().unwrap_err(), CommandError::NoResults);

        c.run(RunTarget::file("t.py"));
        assert_eq!(c.toggle().unwrap_err(), CommandError::NoResults);

        replay(&mut c, FAILING_RUN);
        assert_eq!(c.toggle().unwrap(), vec![HostAction::HideReport]);

        let actions = c.toggle().unwrap();
        assert!(matches!(actions[0], HostAction::ShowReport { height: 2, .. }));
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_stop() {
        let mut c = controller();
        assert_eq!(c.stop(), Err(CommandError::NotRunning));
        c.runner_started(Some(4242));
        assert_eq!(c.stop(), Ok(4242));
        c.runner_exited();
        assert_eq!(c.stop(), Err(CommandError::NotRunning));
    }

    #[test]
    fn test_errors_are_echoed() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        let actions = replay(
            &mut c,
            &[
                r#"{"event":"stage","stage":"setup","item":{"nodeid":"ghost"}}"#,
                r#"{"event":"bogus"}"#,
                r#"{"event":"error","msg":"import failed"}"#,
            ],
        );
        assert_eq!(
            actions,
            vec![
                HostAction::echo("unknown test item: ghost", Severity::Error),
                HostAction::echo("Unhandled event: bogus", Severity::Warning),
                HostAction::echo("Exception in test runner: import failed", Severity::Error),
            ]
        );
    }

    #[test]
    fn test_error_ends_run() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        c.runner_started(Some(7));
        replay(&mut c, &FAILING_RUN[..1]);
        replay(&mut c, &[r#"{"event":"error","msg":"boom"}"#]);

        assert!(c.run_finished());
        assert_eq!(c.stop(), Err(CommandError::NotRunning));

        let actions = replay(
            &mut c,
            &[
                r#"{"event":"logreport","nodeid":"t.py::a","stage":"call","outcome":"failed"}"#,
                r#"{"event":"stdout","stdout":"a\nb\nc"}"#,
            ],
        );
        assert!(actions.is_empty());
        assert_eq!(c.tracker().snapshot()[0].1, Outcome::Collected);
        assert_eq!(c.report_height(), None);
    }

    #[test]
    fn test_quit_ends_run() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        c.runner_started(Some(7));
        replay(&mut c, FAILING_RUN);

        assert!(c.run_finished());
        assert_eq!(c.stop(), Err(CommandError::NotRunning));
        assert!(replay(&mut c, &FAILING_RUN[1..4]).is_empty());

        c.run(RunTarget::file("t.py"));
        assert!(!c.run_finished());
    }

    #[test]
    fn test_report_height_stable_across_runs() {
        let stdout: Vec<String> = (0..52).map(|i| format!("line {i}")).collect();
        let stdout_event = serde_json::json!({"event": "stdout", "stdout": stdout.join("\n")});
        let stdout_line = stdout_event.to_string();
        let run: Vec<&str> = FAILING_RUN
            .iter()
            .map(|line| {
                if line.starts_with(r#"{"event":"stdout""#) {
                    stdout_line.as_str()
                } else {
                    line
                }
            })
            .collect();

        let mut c = controller();
        let mut heights = Vec::new();
        for _ in 0..3 {
            c.run(RunTarget::file("t.py"));
            replay(&mut c, &run);
            heights.push(c.report_height());
        }
        assert_eq!(heights, vec![Some(20), Some(21), Some(21)]);
    }

    #[test]
    fn test_window_closed() {
        let mut c = controller();
        c.run(RunTarget::file("t.py"));
        replay(&mut c, FAILING_RUN);

        assert!(c.window_closed(true).is_empty());
        assert_eq!(c.window_closed(false), vec![HostAction::HideReport]);
        assert!(c.window_closed(false).is_empty());
    }

    #[test]
    fn test_events_outside_run_ignored() {
        let mut c = controller();
        assert!(replay(&mut c, FAILING_RUN).is_empty());
        assert!(c.tracker().is_empty());
    }
}
