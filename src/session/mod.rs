//! Test session module
//!
//! Runner event protocol, per-run session state, and the host command surface.

mod controller;
mod events;
mod state;

pub use controller::{CommandError, Controller, HostAction, HostCommand, ReportSettings};
pub use state::RunTarget;
