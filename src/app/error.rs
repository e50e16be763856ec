use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostwatchError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scraper error: {0}")]
    Scraper(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] crate::config::ConfigError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PostwatchError>;
