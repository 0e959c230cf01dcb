//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Test-run status tracker and reporter
#[derive(Parser, Debug)]
#[command(name = "vp-status")]
#[command(version)]
#[command(about = "Track and report test runner outcomes")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Rows available for output, used to size the report
    #[arg(long, global = true)]
    pub viewport: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tests in a file, or the test around a line
    Run(RunArgs),

    /// Feed a recorded event stream through the tracker
    Replay(ReplayArgs),

    /// Read host commands from stdin
    Shell,

    /// Write a configuration file with default settings
    Init(InitArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test file
    pub path: PathBuf,

    /// Run only the test containing this line
    #[arg(short, long)]
    pub line: Option<u32>,
}

/// Arguments for replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Event file; stdin when omitted
    pub file: Option<PathBuf>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output file (YAML or JSON)
    #[arg(short, long, default_value = "vp-status.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from(["vp-status", "run", "t.py", "--line", "12", "-v"]);
        assert!(args.verbose);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.path, PathBuf::from("t.py"));
                assert_eq!(run.line, Some(12));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_replay_defaults() {
        let args = Args::parse_from(["vp-status", "replay"]);
        match args.command {
            Command::Replay(replay) => {
                assert!(replay.file.is_none());
                assert_eq!(replay.format, "table");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_init() {
        let args = Args::parse_from(["vp-status", "init", "--force"]);
        match args.command {
            Command::Init(init) => {
                assert_eq!(init.output, PathBuf::from("vp-status.yaml"));
                assert!(init.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
