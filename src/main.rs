//! vp-status - Test-run status tracker and reporter
//!
//! Runs an external test runner, tracks the outcome of every collected test
//! from the runner's event stream, and reports the results.
//!
//! ## Usage
//!
//! ```bash
//! # Run all tests in a file
//! vp-status run tests/test_api.py
//!
//! # Run the test around line 42
//! vp-status run tests/test_api.py --line 42
//!
//! # Replay a recorded event stream as CSV
//! vp-status replay events.jsonl --format csv
//!
//! # Drive runs interactively (file, function, stop, toggle, nosigns, quit)
//! vp-status shell
//!
//! # Write a default configuration file
//! vp-status init --output vp-status.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod cli;
mod config;
mod executor;
mod models;
mod output;
mod report;
mod session;
mod tracker;
mod utils;

use cli::{Args, Command, InitArgs, ReplayArgs};
use config::{AppConfig, EnvConfig};
use executor::{RunnerHandle, RunnerMessage, TestRunner};
use models::Severity;
use output::{OutputFormat, ResultFormatter, TerminalHost};
use session::{CommandError, Controller, HostAction, HostCommand, RunTarget};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(LogLevel::from_verbose(
        args.verbose || env.verbose.unwrap_or(false),
    ));

    let mut config = AppConfig::resolve(args.config.as_deref(), &env)?;
    if let Some(viewport) = args.viewport {
        config.viewport_height = viewport;
    }

    match args.command {
        Command::Run(run_args) => {
            let target = match run_args.line {
                Some(line) => RunTarget::function(run_args.path, line),
                None => RunTarget::file(run_args.path),
            };
            run_once(&config, target).await?;
        }
        Command::Replay(replay_args) => {
            replay(&config, replay_args)?;
        }
        Command::Shell => {
            shell(&config).await?;
        }
        Command::Init(init_args) => {
            init(init_args)?;
        }
    }

    Ok(())
}

/// A runner in flight
struct ActiveRun {
    handle: RunnerHandle,
    rx: mpsc::UnboundedReceiver<RunnerMessage>,
}

async fn run_once(config: &AppConfig, target: RunTarget) -> Result<()> {
    let mut controller = Controller::new(config.report_settings());
    let mut host = TerminalHost::stdout();
    let runner = TestRunner::new(config.runner.clone());

    let mut run = start_run(&mut controller, &mut host, &runner, target)?;

    loop {
        tokio::select! {
            msg = run.rx.recv() => {
                if handle_message(&mut controller, &mut host, msg)? {
                    run.handle.stop();
                    break;
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                stop_run(&controller, &mut host, Some(&mut run))?;
            }
        }
    }

    Ok(())
}

async fn shell(config: &AppConfig) -> Result<()> {
    use tokio::io::AsyncBufReadExt;

    let mut controller = Controller::new(config.report_settings());
    let mut host = TerminalHost::stdout();
    let runner = TestRunner::new(config.runner.clone());
    let mut run: Option<ActiveRun> = None;
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            msg = next_message(&mut run) => {
                if handle_message(&mut controller, &mut host, msg)? {
                    if let Some(mut finished) = run.take() {
                        finished.handle.stop();
                    }
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line.context("Failed to read command")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match HostCommand::parse(&line) {
                    Ok(HostCommand::Run(target)) => {
                        if let Some(mut previous) = run.take() {
                            previous.handle.stop();
                        }
                        match start_run(&mut controller, &mut host, &runner, target) {
                            Ok(started) => run = Some(started),
                            Err(e) => {
                                warn!("{:#}", e);
                                host.apply(HostAction::echo(&format!("{e:#}"), Severity::Error))?;
                            }
                        }
                    }
                    Ok(HostCommand::Stop) => stop_run(&controller, &mut host, run.as_mut())?,
                    Ok(HostCommand::Toggle) => match controller.toggle() {
                        Ok(actions) => host.apply_all(actions)?,
                        Err(e) => host.apply(HostAction::echo(&e.to_string(), Severity::Error))?,
                    },
                    Ok(HostCommand::NoSigns) => controller.clear(),
                    Ok(HostCommand::Quit) => break,
                    Err(e) => host.apply(HostAction::echo(&e.to_string(), Severity::Error))?,
                }
            }
        }
    }

    if let Some(mut run) = run {
        run.handle.stop();
    }
    host.apply_all(controller.window_closed(false))?;

    Ok(())
}

fn replay(config: &AppConfig, args: ReplayArgs) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown format: {}", args.format))?;

    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut controller = Controller::new(config.report_settings());
    let mut host = TerminalHost::stderr();
    let mut formatter = ResultFormatter::new(format);
    if args.no_color {
        host = host.no_color();
        formatter = formatter.no_color();
    }

    let name = args.file.clone().unwrap_or_else(|| PathBuf::from("-"));
    host.apply_all(controller.run(RunTarget::file(name)))?;

    let mut events = 0;
    for line in reader.lines() {
        let line = line.context("Failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }
        events += 1;
        host.apply_all(controller.handle_line(&line))?;
    }
    info!(
        "Replayed {} events (report height {:?})",
        events,
        controller.report_height()
    );

    let summary = controller
        .session()
        .map(|s| s.summary(controller.tracker()))
        .unwrap_or_default();
    println!(
        "{}",
        formatter.format_run(controller.tracker().items(), &summary)?
    );

    Ok(())
}

fn init(args: InitArgs) -> Result<()> {
    AppConfig::default().write_new(&args.output, args.force)?;
    println!("✓ Configuration file created: {}", args.output.display());
    Ok(())
}

fn start_run(
    controller: &mut Controller,
    host: &mut TerminalHost,
    runner: &TestRunner,
    target: RunTarget,
) -> Result<ActiveRun> {
    host.apply_all(controller.run(target.clone()))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = runner.spawn(&target, tx)?;
    controller.runner_started(handle.pid());

    Ok(ActiveRun { handle, rx })
}

fn stop_run(
    controller: &Controller,
    host: &mut TerminalHost,
    run: Option<&mut ActiveRun>,
) -> Result<()> {
    let stopping = controller
        .stop()
        .and_then(|pid| run.map(|run| (pid, run)).ok_or(CommandError::NotRunning));

    match stopping {
        Ok((pid, run)) => {
            if run.handle.stop() {
                host.apply(HostAction::echo(
                    &format!("Stopping test runner (PID {pid})."),
                    Severity::Info,
                ))?;
            } else {
                debug!("Stop already requested for PID {}", pid);
            }
        }
        Err(e) => host.apply(HostAction::echo(&e.to_string(), Severity::Error))?,
    }

    Ok(())
}

/// Apply one runner message. Returns true once the run is over, either
/// because the process exited or because it sent `error` or `quit`.
fn handle_message(
    controller: &mut Controller,
    host: &mut TerminalHost,
    msg: Option<RunnerMessage>,
) -> Result<bool> {
    match msg {
        Some(RunnerMessage::Line(line)) => {
            if !line.trim().is_empty() {
                host.apply_all(controller.handle_line(&line))?;
            }
            Ok(controller.run_finished())
        }
        Some(RunnerMessage::Exited { stopped, code }) => {
            controller.runner_exited();
            let has_results = controller
                .session()
                .map(|s| s.has_results())
                .unwrap_or(false);
            let target = controller
                .session()
                .map(|s| s.target.to_string())
                .unwrap_or_default();

            if stopped {
                host.apply(HostAction::echo("Stopped test runner.", Severity::Info))?;
            } else if !has_results {
                warn!("Runner for {} exited ({:?}) without reporting results", target, code);
                host.apply(HostAction::echo(
                    &format!("Test runner for {target} exited without results (code {code:?})."),
                    Severity::Warning,
                ))?;
            }
            Ok(true)
        }
        None => {
            controller.runner_exited();
            Ok(true)
        }
    }
}

async fn next_message(run: &mut Option<ActiveRun>) -> Option<RunnerMessage> {
    match run {
        Some(run) => run.rx.recv().await,
        None => std::future::pending().await,
    }
}
