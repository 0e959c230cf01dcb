//! Configuration module
//!
//! Handles loading and managing configuration.

mod env;

pub use env::EnvConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::session::ReportSettings;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./vp-status.yaml",
    "./vp-status.yml",
    "./.vp-status.yaml",
    "~/.config/vp-status/config.yaml",
];

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upper bound on the report window height
    pub max_report_size: usize,

    /// Rows available to the host when the terminal size is unknown
    pub viewport_height: usize,

    /// Test runner process
    pub runner: RunnerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_report_size: 30,
            viewport_height: 40,
            runner: RunnerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if is_yaml(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Write this configuration to a new file; an existing file is only
    /// replaced with `force`
    pub fn write_new(&self, path: impl AsRef<Path>, force: bool) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !force {
            anyhow::bail!(
                "Configuration file already exists: {}. Use --force to overwrite.",
                path.display()
            );
        }
        self.save(path)
    }

    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Resolve configuration: explicit path, then environment, then standard
    /// locations, then defaults. Environment values override the file.
    pub fn resolve(explicit: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
            .or_else(Self::find);

        let mut config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => Self::default(),
        };

        env.apply(&mut config);
        Ok(config)
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            max_report_size: self.max_report_size,
            viewport_height: self.viewport_height,
        }
    }
}

/// Test runner command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program to execute
    pub program: String,

    /// Arguments placed before the test path
    pub args: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["-m".to_string(), "vp_runner".to_string()],
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

/// Expand a leading `~/` to the home directory
fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
