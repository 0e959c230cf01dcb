//! Data models for test-run tracking
//!
//! This module contains the item and outcome types shared by the tracker and renderer.

mod item;
mod outcome;

pub use item::{ItemId, TestItem};
pub use outcome::{Outcome, Severity, Stage};
