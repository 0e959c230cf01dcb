//! Report rendering module
//!
//! Formats status-log messages, sizes the report window, and renders the
//! per-item report and run summary.

mod message;
mod render;
mod viewport;

pub use message::{format_message, MessageLine};
pub use render::{render_report, Summary};
pub use viewport::{plan_viewport, should_close_report};
