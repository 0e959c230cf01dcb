//! Output formatting module
//!
//! Provides output formats for run state and the terminal host.

mod formatter;
mod terminal;

pub use formatter::{OutputFormat, ResultFormatter};
pub use terminal::TerminalHost;
