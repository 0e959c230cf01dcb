//! Outcome tracking
//!
//! Owns the state of the current run: every collected item and its outcome,
//! in collection order.

#![allow(dead_code)]

pub mod shared;

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::models::{ItemId, Outcome, Stage, TestItem};

/// Errors reported for rejected events. Tracker state is unchanged when returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("unknown test item: {0}")]
    UnknownItem(ItemId),

    #[error("invalid outcome: {0}")]
    InvalidOutcome(String),
}

/// Tracks the outcome of every item in the current run
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    items: Vec<TestItem>,
    index: HashMap<ItemId, usize>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state and start a new run
    pub fn reset(&mut self) {
        debug!("Resetting run state ({} items)", self.items.len());
        self.items.clear();
        self.index.clear();
    }

    /// Record a collected item. Already known items are left untouched.
    pub fn record_collected(&mut self, id: impl Into<ItemId>) {
        self.record_collected_at(id, None);
    }

    /// Record a collected item together with its source line
    pub fn record_collected_at(&mut self, id: impl Into<ItemId>, line: Option<u32>) {
        let id = id.into();
        if self.index.contains_key(&id) {
            trace!("Ignoring duplicate collection of {}", id);
            return;
        }
        self.index.insert(id.clone(), self.items.len());
        self.items.push(TestItem::collected(id, line));
    }

    /// Move an item to a stage. Terminal items and backwards moves are ignored.
    pub fn record_stage(&mut self, id: &ItemId, stage: Stage) -> Result<(), TrackerError> {
        let item = self.item_mut(id)?;
        let next = Outcome::from(stage);

        if item.outcome.is_terminal() || next.rank() < item.outcome.rank() {
            trace!("Ignoring stage {} for {} ({})", stage, id, item.outcome);
            return Ok(());
        }

        item.set_outcome(next);
        Ok(())
    }

    /// Record a terminal result.
    ///
    /// Overwrites any stage. Returns `Ok(false)` when the item already holds a
    /// result, which is kept.
    pub fn record_result(&mut self, id: &ItemId, outcome: Outcome) -> Result<bool, TrackerError> {
        if !outcome.is_terminal() {
            return Err(TrackerError::InvalidOutcome(outcome.to_string()));
        }

        let item = self.item_mut(id)?;
        if item.outcome.is_terminal() {
            debug!(
                "Keeping result {} for {}, ignoring {}",
                item.outcome, id, outcome
            );
            return Ok(false);
        }

        item.set_outcome(outcome);
        Ok(true)
    }

    /// Copy of (id, outcome) pairs in collection order
    pub fn snapshot(&self) -> Vec<(ItemId, Outcome)> {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.outcome))
            .collect()
    }

    /// Full items in collection order
    pub fn items(&self) -> &[TestItem] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&TestItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count of items per outcome, in table order, skipping zero counts
    pub fn counts(&self) -> Vec<(Outcome, usize)> {
        Outcome::all()
            .into_iter()
            .map(|o| (o, self.items.iter().filter(|i| i.outcome == o).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    fn item_mut(&mut self, id: &ItemId) -> Result<&mut TestItem, TrackerError> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| TrackerError::UnknownItem(id.clone()))?;
        Ok(&mut self.items[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    #[test]
    fn test_collected_keeps_order() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t3");
        tracker.record_collected("t1");
        tracker.record_collected("t2");

        let ids: Vec<_> = tracker.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![id("t3"), id("t1"), id("t2")]);
    }

    #[test]
    fn test_duplicate_collected_does_not_regress() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t1");
        tracker.record_stage(&id("t1"), Stage::Call).unwrap();
        tracker.record_collected("t1");

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.snapshot()[0].1, Outcome::StageCall);
    }

    #[test]
    fn test_stage_unknown_item() {
        let mut tracker = OutcomeTracker::new();
        let err = tracker.record_stage(&id("t1"), Stage::Setup).unwrap_err();
        assert_eq!(err, TrackerError::UnknownItem(id("t1")));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_result_rejects_non_terminal() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t1");
        let before = tracker.snapshot();

        let err = tracker
            .record_result(&id("t1"), Outcome::StageSetup)
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidOutcome(_)));
        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn test_result_overwrites_stage() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t1");
        tracker.record_stage(&id("t1"), Stage::Call).unwrap();

        assert!(tracker.record_result(&id("t1"), Outcome::Failed).unwrap());
        assert_eq!(tracker.get(&id("t1")).unwrap().outcome, Outcome::Failed);
    }

    #[test]
    fn test_stage_after_result_is_noop() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t1");
        tracker.record_result(&id("t1"), Outcome::Passed).unwrap();
        let before = tracker.snapshot();

        tracker.record_stage(&id("t1"), Stage::Teardown).unwrap();
        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn test_terminal_not_overwritten() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t1");
        tracker.record_result(&id("t1"), Outcome::Failed).unwrap();

        assert!(!tracker.record_result(&id("t1"), Outcome::Passed).unwrap());
        assert_eq!(tracker.snapshot()[0].1, Outcome::Failed);
    }

    #[test]
    fn test_stage_never_moves_backwards() {
        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("t1");
        tracker.record_stage(&id("t1"), Stage::Teardown).unwrap();
        tracker.record_stage(&id("t1"), Stage::Setup).unwrap();

        assert_eq!(tracker.snapshot()[0].1, Outcome::StageTeardown);
    }

    #[test]
    fn test_history_is_monotonic() {
        let events: Vec<(&str, Option<Stage>, Option<Outcome>)> = vec![
            ("a", Some(Stage::Setup), None),
            ("a", Some(Stage::Call), None),
            ("b", Some(Stage::Call), None),
            ("a", None, Some(Outcome::Passed)),
            ("b", Some(Stage::Setup), None),
            ("a", Some(Stage::Teardown), None),
            ("b", None, Some(Outcome::Skipped)),
            ("b", None, Some(Outcome::Failed)),
        ];

        let mut tracker = OutcomeTracker::new();
        tracker.record_collected("a");
        tracker.record_collected("b");

        let mut last: HashMap<ItemId, Outcome> = HashMap::new();
        for (name, stage, outcome) in events {
            match (stage, outcome) {
                (Some(stage), _) => tracker.record_stage(&id(name), stage).unwrap(),
                (_, Some(outcome)) => {
                    tracker.record_result(&id(name), outcome).unwrap();
                }
                _ => unreachable!(),
            }
            for (item, outcome) in tracker.snapshot() {
                if let Some(prev) = last.get(&item) {
                    assert!(outcome.rank() >= prev.rank());
                    if prev.is_terminal() {
                        assert_eq!(outcome, *prev);
                    }
                }
                last.insert(item, outcome);
            }
        }

        assert_eq!(last[&id("a")], Outcome::Passed);
        assert_eq!(last[&id("b")], Outcome::Skipped);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = OutcomeTracker::new();
        tracker.reset();
        assert!(tracker.snapshot().is_empty());

        tracker.record_collected("t1");
        tracker.record_result(&id("t1"), Outcome::Error).unwrap();
        tracker.reset();
        tracker.reset();
        assert!(tracker.snapshot().is_empty());
        assert!(tracker.get(&id("t1")).is_none());
    }

    #[test]
    fn test_counts() {
        let mut tracker = OutcomeTracker::new();
        for name in ["a", "b", "c"] {
            tracker.record_collected(name);
        }
        tracker.record_result(&id("a"), Outcome::Passed).unwrap();
        tracker.record_result(&id("b"), Outcome::Passed).unwrap();

        assert_eq!(
            tracker.counts(),
            vec![(Outcome::Collected, 1), (Outcome::Passed, 2)]
        );
    }
}
