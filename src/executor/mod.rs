//! Runner execution
//!
//! Starts the external test runner and streams its events.

mod runner;

pub use runner::{RunnerHandle, RunnerMessage, TestRunner};
