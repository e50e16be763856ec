use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::RawPost;

pub const MILLIS_PER_HOUR: i64 = 3_600_000;
pub const DEFAULT_WINDOW_HOURS: f64 = 24.0;

/// Decides whether a post is recent enough to be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecencyPolicy {
    /// Literal match of the page's relative time label against an allowlist.
    RelativeLabel { allowlist: BTreeSet<String> },
    /// `timestamp >= now - window_hours`.
    AbsoluteWindow { window_hours: f64 },
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self::minutes(5)
    }
}

impl RecencyPolicy {
    /// Allowlist of `"1m"` through `"<n>m"`.
    pub fn minutes(n: u32) -> Self {
        Self::RelativeLabel {
            allowlist: (1..=n).map(|m| format!("{}m", m)).collect(),
        }
    }

    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RelativeLabel {
            allowlist: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn window_hours(window_hours: f64) -> Self {
        Self::AbsoluteWindow { window_hours }
    }

    pub fn qualifies(&self, post: &RawPost, now_ms: i64) -> bool {
        match self {
            Self::RelativeLabel { allowlist } => allowlist.contains(&post.recency_label),
            Self::AbsoluteWindow { window_hours } => {
                let window_ms = (window_hours * MILLIS_PER_HOUR as f64) as i64;
                post.timestamp
                    .is_some_and(|ts| ts >= now_ms.saturating_sub(window_ms))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::RelativeLabel { allowlist } => {
                let labels: Vec<&str> = allowlist.iter().map(String::as_str).collect();
                format!("labels [{}]", labels.join(", "))
            }
            Self::AbsoluteWindow { window_hours } => format!("last {}h", window_hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_minutes_allowlist() {
        let RecencyPolicy::RelativeLabel { allowlist } = RecencyPolicy::minutes(3) else {
            panic!("expected relative label policy");
        };
        let labels: Vec<&str> = allowlist.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["1m", "2m", "3m"]);
    }

    #[test]
    fn test_minutes_zero_is_empty() {
        let policy = RecencyPolicy::minutes(0);
        assert!(!policy.qualifies(&RawPost::new("p").with_label("1m"), NOW));
    }

    #[test]
    fn test_relative_label_is_literal() {
        let policy = RecencyPolicy::minutes(5);
        assert!(policy.qualifies(&RawPost::new("p").with_label("5m"), NOW));
        assert!(!policy.qualifies(&RawPost::new("p").with_label("50m"), NOW));
        assert!(!policy.qualifies(&RawPost::new("p").with_label("5 m"), NOW));
        assert!(!policy.qualifies(&RawPost::new("p").with_label("1h"), NOW));
        assert!(!policy.qualifies(&RawPost::new("p").with_label(""), NOW));
    }

    #[test]
    fn test_relative_label_ignores_timestamp() {
        let policy = RecencyPolicy::minutes(5);
        let post = RawPost::new("p").with_label("2d").with_timestamp(NOW);
        assert!(!policy.qualifies(&post, NOW));
    }

    #[test]
    fn test_absolute_window_boundary_inclusive() {
        let policy = RecencyPolicy::window_hours(24.0);
        let edge = RawPost::new("p").with_timestamp(NOW - 24 * MILLIS_PER_HOUR);
        let past = RawPost::new("p").with_timestamp(NOW - 24 * MILLIS_PER_HOUR - 1);
        assert!(policy.qualifies(&edge, NOW));
        assert!(!policy.qualifies(&past, NOW));
    }

    #[test]
    fn test_absolute_window_missing_timestamp() {
        let policy = RecencyPolicy::window_hours(24.0);
        assert!(!policy.qualifies(&RawPost::new("p").with_label("3m"), NOW));
    }

    #[test]
    fn test_absolute_window_fractional_hours() {
        let policy = RecencyPolicy::window_hours(0.5);
        let inside = RawPost::new("p").with_timestamp(NOW - 29 * 60_000);
        let outside = RawPost::new("p").with_timestamp(NOW - 31 * 60_000);
        assert!(policy.qualifies(&inside, NOW));
        assert!(!policy.qualifies(&outside, NOW));
    }

    #[test]
    fn test_describe() {
        assert_eq!(RecencyPolicy::minutes(2).describe(), "labels [1m, 2m]");
        assert_eq!(RecencyPolicy::window_hours(24.0).describe(), "last 24h");
    }
}
