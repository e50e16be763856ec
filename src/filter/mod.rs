//! Deduplication and recency filtering of scraped posts.
//!
//! The filter is a pure function of its inputs: a scraped batch, a snapshot
//! of the notified set and a recency policy. It never touches storage; the
//! caller decides whether to commit the returned set.

use chrono::{DateTime, Utc};

use crate::domain::{NotifiedSet, RawPost, RecencyPolicy};

/// Result of one filtering pass.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Posts to deliver, in batch order, without duplicate ids.
    pub eligible: Vec<RawPost>,
    /// Input set plus the ids of every eligible post.
    pub updated: NotifiedSet,
    /// Posts skipped because their id was already notified (or repeated in the batch).
    pub already_notified: usize,
    /// Posts skipped by the recency policy.
    pub not_recent: usize,
}

pub struct DedupFilter;

impl DedupFilter {
    /// Filter `batch` against `notified` using the wall clock.
    pub fn filter(batch: &[RawPost], notified: &NotifiedSet, policy: &RecencyPolicy) -> FilterOutcome {
        Self::filter_at(batch, notified, policy, Utc::now())
    }

    pub fn filter_at(
        batch: &[RawPost],
        notified: &NotifiedSet,
        policy: &RecencyPolicy,
        now: DateTime<Utc>,
    ) -> FilterOutcome {
        let now_ms = now.timestamp_millis();
        let mut outcome = FilterOutcome {
            updated: notified.clone(),
            ..Default::default()
        };

        for post in batch {
            if outcome.updated.contains(&post.id) {
                outcome.already_notified += 1;
                continue;
            }

            if !policy.qualifies(post, now_ms) {
                outcome.not_recent += 1;
                continue;
            }

            // Claim the id right away so a repeat later in the batch is skipped.
            outcome.updated.insert(post.id.clone());
            outcome.eligible.push(post.clone());
        }

        outcome
    }
}
