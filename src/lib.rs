//! NCAA Division I baseball season windows
//!
//! Scrapes championship end dates from Wikipedia season articles and the NCAA
//! future-dates page, then chains them into contiguous year-over-year windows.

pub mod data;
pub mod pipeline;
pub mod season;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Source of end-date facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    Wikipedia,
    Ncaa,
}

impl DataSource {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "wikipedia" | "wiki" => Some(DataSource::Wikipedia),
            "ncaa" => Some(DataSource::Ncaa),
            _ => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Wikipedia => write!(f, "Wikipedia"),
            DataSource::Ncaa => write!(f, "NCAA"),
        }
    }
}

/// Inclusive date range of one competitive year
///
/// `season_start` is the day after the previous year's finals ended and
/// `season_end` is the last day of this year's finals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub year: i32,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
}

impl SeasonWindow {
    /// Number of days covered, both ends included
    pub fn len_days(&self) -> i64 {
        (self.season_end - self.season_start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.season_start <= date && date <= self.season_end
    }
}

impl fmt::Display for SeasonWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} to {}",
            self.year, self.season_start, self.season_end
        )
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum SeasonError {
    #[error("Scraper failed for {data_source}: {message}")]
    Scraper {
        data_source: DataSource,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("No schedule table body found at {url}")]
    MissingScheduleTable { url: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, SeasonError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub scraper: ScraperConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

/// Largest accepted `scraper.max_attempts`
pub const MAX_FETCH_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Transport-level attempts per request
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Per-year article URL; `{year}` is substituted
    pub wikipedia_url_template: String,
    pub ncaa_future_dates_url: String,
    /// First year the Wikipedia batch fetches
    pub first_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/seasons.db".to_string(),
            },
            scraper: ScraperConfig {
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                             AppleWebKit/537.36 (KHTML, like Gecko) \
                             Chrome/127.0.0.0 Safari/537.36"
                    .to_string(),
                timeout_secs: 30,
                max_attempts: 1,
                cache_dir: None,
                offline: false,
            },
            sources: SourcesConfig {
                wikipedia_url_template:
                    "https://en.wikipedia.org/wiki/{year}_NCAA_Division_I_baseball_season"
                        .to_string(),
                ncaa_future_dates_url:
                    "https://www.ncaa.com/championships/baseball/d1/future-info/".to_string(),
                first_year: 2015,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SeasonError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| SeasonError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SeasonError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sources.wikipedia_url_template.contains("{year}") {
            return Err(SeasonError::Config(
                "sources.wikipedia_url_template must contain {year}".to_string(),
            ));
        }
        if !(1..=MAX_FETCH_ATTEMPTS).contains(&self.scraper.max_attempts) {
            return Err(SeasonError::Config(format!(
                "scraper.max_attempts must be between 1 and {}",
                MAX_FETCH_ATTEMPTS
            )));
        }
        Ok(())
    }

    /// Article URL for a season year
    pub fn wikipedia_url(&self, year: i32) -> String {
        self.sources
            .wikipedia_url_template
            .replace("{year}", &year.to_string())
    }
}
