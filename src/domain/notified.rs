use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ids of posts that were already handed to the delivery channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedSet {
    ids: HashSet<String>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if the id was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn is_superset(&self, other: &NotifiedSet) -> bool {
        self.ids.is_superset(&other.ids)
    }

    /// Ids in `self` that `other` does not have.
    pub fn difference(&self, other: &NotifiedSet) -> NotifiedSet {
        self.ids.difference(&other.ids).map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for NotifiedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A stored notified id with the time it was first recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifiedEntry {
    pub id: String,
    pub notified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_novelty() {
        let mut set = NotifiedSet::new();
        assert!(set.insert("p1"));
        assert!(!set.insert("p1"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_id_is_a_regular_member() {
        let mut set = NotifiedSet::new();
        assert!(!set.contains(""));
        set.insert("");
        assert!(set.contains(""));
    }

    #[test]
    fn test_superset() {
        let small: NotifiedSet = ["a"].into_iter().collect();
        let big: NotifiedSet = ["a", "b"].into_iter().collect();
        assert!(big.is_superset(&small));
        assert!(!small.is_superset(&big));
    }

    #[test]
    fn test_difference() {
        let before: NotifiedSet = ["a", "b"].into_iter().collect();
        let after: NotifiedSet = ["a", "b", "c"].into_iter().collect();

        let added = after.difference(&before);
        assert_eq!(added.len(), 1);
        assert!(added.contains("c"));
        assert!(before.difference(&after).is_empty());
    }
}
