//! Thread-safe tracker handle

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use super::{OutcomeTracker, TrackerError};
use crate::models::{ItemId, Outcome, Stage};

/// Cloneable handle that serializes all access to one tracker
#[derive(Clone, Debug, Default)]
pub struct SharedTracker {
    inner: Arc<Mutex<OutcomeTracker>>,
}

impl SharedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn record_collected(&self, id: impl Into<ItemId>, line: Option<u32>) {
        self.lock().record_collected_at(id, line);
    }

    pub fn record_stage(&self, id: &ItemId, stage: Stage) -> Result<(), TrackerError> {
        self.lock().record_stage(id, stage)
    }

    pub fn record_result(&self, id: &ItemId, outcome: Outcome) -> Result<bool, TrackerError> {
        self.lock().record_result(id, outcome)
    }

    /// Copy taken under the lock
    pub fn snapshot(&self) -> Vec<(ItemId, Outcome)> {
        self.lock().snapshot()
    }

    // A panic while holding the lock cannot leave the tracker half-updated,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, OutcomeTracker> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
