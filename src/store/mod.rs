pub mod sqlite;

use crate::app::Result;
use crate::domain::{NotifiedEntry, NotifiedSet};

pub use sqlite::SqliteStore;

/// Durable home of the notified set.
pub trait NotifiedStore {
    fn load_notified_set(&self) -> Result<NotifiedSet>;

    /// Persist `set`. Returns how many ids were not stored before.
    ///
    /// The set only grows between clears, so ids already stored but absent
    /// from `set` are left in place.
    fn save_notified_set(&self, set: &NotifiedSet) -> Result<usize>;

    /// Wipe every notified id. Returns how many were removed.
    fn clear_notified_set(&self) -> Result<usize>;

    fn notified_count(&self) -> Result<i64>;

    /// Most recently recorded ids first.
    fn recent_notified(&self, limit: usize) -> Result<Vec<NotifiedEntry>>;
}
