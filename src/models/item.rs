//! Test item model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Outcome;

/// Runner node id, e.g. `tests/test_api.py::TestUser::test_login`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A collected test item and its current status
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestItem {
    pub id: ItemId,
    pub outcome: Outcome,
    pub line: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl TestItem {
    pub fn collected(id: ItemId, line: Option<u32>) -> Self {
        Self {
            id,
            outcome: Outcome::Collected,
            line,
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for TestItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.outcome.label(), self.id)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_display() {
        let item = TestItem::collected("t.py::test_a".into(), Some(12));
        assert_eq!(item.to_string(), ".. t.py::test_a:12");
    }
}
