//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::AppConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "VP_STATUS";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Report size limit from VP_STATUS_MAX_REPORT_SIZE
    pub max_report_size: Option<usize>,
    /// Viewport rows from VP_STATUS_VIEWPORT_HEIGHT, falling back to LINES
    pub viewport_height: Option<usize>,
    /// Runner program from VP_STATUS_RUNNER
    pub runner: Option<String>,
    /// Config file from VP_STATUS_CONFIG
    pub config_file: Option<String>,
    /// Verbose from VP_STATUS_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            max_report_size: get_env_parse("MAX_REPORT_SIZE"),
            viewport_height: get_env_parse("VIEWPORT_HEIGHT")
                .or_else(|| env::var("LINES").ok().and_then(|v| v.parse().ok())),
            runner: get_env("RUNNER"),
            config_file: get_env("CONFIG"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    /// Override config values that are set in the environment
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(size) = self.max_report_size {
            config.max_report_size = size;
        }
        if let Some(height) = self.viewport_height {
            config.viewport_height = height;
        }
        if let Some(runner) = &self.runner {
            config.runner.program = runner.clone();
        }
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}
