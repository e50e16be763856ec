use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{PostwatchError, Result};
use crate::domain::{NotifiedEntry, NotifiedSet};
use crate::store::NotifiedStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| PostwatchError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            PostwatchError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }
}

impl NotifiedStore for SqliteStore {
    fn load_notified_set(&self) -> Result<NotifiedSet> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id FROM notified_posts")?;
        let set = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<NotifiedSet, _>>()?;

        Ok(set)
    }

    fn save_notified_set(&self, set: &NotifiedSet) -> Result<usize> {
        let mut conn = self.conn()?;

        let tx = conn.transaction()?;
        let notified_at = Utc::now().to_rfc3339();
        let mut count = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO notified_posts (id, notified_at) VALUES (?1, ?2)",
            )?;
            for id in set.iter() {
                count += stmt.execute(params![id, notified_at])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    fn clear_notified_set(&self) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM notified_posts", [])?;
        Ok(removed)
    }

    fn notified_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM notified_posts", [], |row| row.get(0))?;
        Ok(count)
    }

    fn recent_notified(&self, limit: usize) -> Result<Vec<NotifiedEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, notified_at FROM notified_posts
             ORDER BY notified_at DESC, id LIMIT ?1",
        )?;

        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(NotifiedEntry {
                    id: row.get(0)?,
                    notified_at: row
                        .get::<_, String>(1)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
