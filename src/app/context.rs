use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{PostwatchError, Result};
use crate::config::Config;
use crate::scraper::{ChromeScraper, ScraperConfig};
use crate::store::sqlite::SqliteStore;
use crate::tracker::Tracker;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub config_path: PathBuf,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        let config_path = match config_path {
            Some(p) => p,
            None => Config::default_config_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);

        Ok(Self { store, config_path })
    }

    pub fn in_memory(config_path: PathBuf) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self { store, config_path })
    }

    /// Read the configuration file as it is right now.
    pub fn load_config(&self) -> Result<Config> {
        Ok(Config::load_from(&self.config_path)?)
    }

    /// Launch a browser and wire it to the store.
    pub async fn build_tracker(&self, scraper: &ScraperConfig) -> Result<Tracker<SqliteStore>> {
        let scraper = Arc::new(ChromeScraper::new(scraper.clone()).await?);
        Ok(Tracker::new(scraper, self.store.clone()))
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| PostwatchError::Config("Could not find data directory".into()))?;
        let postwatch_dir = data_dir.join("postwatch");
        std::fs::create_dir_all(&postwatch_dir)?;
        Ok(postwatch_dir.join("postwatch.db"))
    }
}
