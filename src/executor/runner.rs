//! Test runner process
//!
//! Spawns the runner and forwards its stdout, one line at a time, to the
//! host loop.

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::session::RunTarget;
use crate::utils::Timer;

/// Message from a running runner process
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerMessage {
    /// One line of runner stdout
    Line(String),
    /// The process is gone
    Exited { stopped: bool, code: Option<i32> },
}

/// Handle to a spawned runner
#[derive(Debug)]
pub struct RunnerHandle {
    pid: Option<u32>,
    stop: Option<oneshot::Sender<()>>,
}

impl RunnerHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the runner to stop. Returns false if already asked or finished.
    pub fn stop(&mut self) -> bool {
        match self.stop.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Launches runner processes
#[derive(Clone, Debug)]
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Build the runner command for a target
    pub fn command(&self, target: &RunTarget) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args).arg(&target.path);
        if let Some(line) = target.line {
            cmd.arg("--line").arg(line.to_string());
        }
        cmd
    }

    /// Spawn the runner for `target`. Lines and the exit are sent on `tx`.
    pub fn spawn(
        &self,
        target: &RunTarget,
        tx: mpsc::UnboundedSender<RunnerMessage>,
    ) -> Result<RunnerHandle> {
        let mut child = self
            .command(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start runner {}", self.config.program))?;

        let pid = child.id();
        let stdout = child
            .stdout
            .take()
            .context("Runner stdout was not captured")?;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        info!("Started runner for {} (PID {:?})", target, pid);

        tokio::spawn(async move {
            let timer = Timer::start("runner");
            let mut lines = BufReader::new(stdout).lines();

            let stopped = loop {
                tokio::select! {
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if tx.send(RunnerMessage::Line(line)).is_err() {
                                break false;
                            }
                        }
                        Ok(None) => break false,
                        Err(e) => {
                            warn!("Failed to read runner output: {}", e);
                            break false;
                        }
                    },
                    _ = &mut stop_rx => break true,
                }
            };

            if stopped {
                debug!("Killing runner (PID {:?})", pid);
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill runner: {}", e);
                }
            }

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!("Failed to wait for runner: {}", e);
                    None
                }
            };
            timer.stop();
            let _ = tx.send(RunnerMessage::Exited { stopped, code });
        });

        Ok(RunnerHandle {
            pid,
            stop: Some(stop_tx),
        })
    }
}
