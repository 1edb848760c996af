//! Page fetching with an optional on-disk HTML cache
//!
//! The fetcher is built once and handed to each scraper, so tests can swap in
//! a fake without any network access.

use crate::{DataSource, Result, ScraperConfig, SeasonError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retrieves raw markup for a URL
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url)
    }
}

/// Upper bound on the pause between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Pause before retry number `attempt + 1`: 100ms doubled per attempt, capped
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 2u64.saturating_pow(attempt).saturating_mul(100);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Retry an operation with exponential backoff
pub fn with_retry<T, F>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if attempt + 1 < attempts => {
                log::warn!("Attempt {} failed: {}", attempt + 1, e);
                std::thread::sleep(backoff_delay(attempt));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    /// Optional cache directory for offline HTML files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut fetcher = HttpFetcher {
            client,
            cache_dir: None,
            offline_only: config.offline,
            max_attempts: config.max_attempts,
        };
        if let Some(dir) = &config.cache_dir {
            fetcher = fetcher.with_cache(dir);
        }
        Ok(fetcher)
    }

    /// Create fetcher with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Get the cache file path for a URL
    pub fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(cache_file_name(url)))
    }

    fn load_from_cache(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, url: &str, html: &str) -> Result<()> {
        if let Some(path) = self.cache_path(url) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, html)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    fn request(&self, url: &str) -> Result<String> {
        log::debug!("Fetching {}", url);
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(SeasonError::Scraper {
                data_source: source_for_url(url),
                message: format!("HTTP {}: {}", response.status(), url),
            });
        }
        Ok(response.text()?)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        if let Some(html) = self.load_from_cache(url) {
            return Ok(html);
        }

        if self.offline_only {
            return Err(SeasonError::Scraper {
                data_source: source_for_url(url),
                message: format!("No cached data for {} (offline mode)", url),
            });
        }

        let html = with_retry(|| self.request(url), self.max_attempts)?;

        if let Err(e) = self.save_to_cache(url, &html) {
            log::warn!("Failed to cache {}: {}", url, e);
        }

        Ok(html)
    }
}

/// Safe file name for a URL
fn cache_file_name(url: &str) -> String {
    let stem = url
        .replace("https://", "")
        .replace("http://", "")
        .trim_end_matches('/')
        .replace(['/', '?', '&', '='], "_");
    stem + ".html"
}

fn source_for_url(url: &str) -> DataSource {
    if url.contains("ncaa.com") {
        DataSource::Ncaa
    } else {
        DataSource::Wikipedia
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use std::cell::Cell;

    #[test]
    fn test_cache_file_name() {
        assert_eq!(
            cache_file_name("https://en.wikipedia.org/wiki/2024_NCAA_Division_I_baseball_season"),
            "en.wikipedia.org_wiki_2024_NCAA_Division_I_baseball_season.html"
        );
        assert_eq!(
            cache_file_name("https://www.ncaa.com/championships/baseball/d1/future-info/"),
            "www.ncaa.com_championships_baseball_d1_future-info.html"
        );
    }

    #[test]
    fn test_cached_page_is_served_offline() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://www.ncaa.com/championships/baseball/d1/future-info/";
        let fetcher = HttpFetcher::new(&Config::default().scraper)
            .unwrap()
            .with_cache(dir.path())
            .offline_only(true);

        std::fs::write(fetcher.cache_path(url).unwrap(), "<table></table>").unwrap();
        assert_eq!(fetcher.fetch(url).unwrap(), "<table></table>");
    }

    #[test]
    fn test_offline_cache_miss_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpFetcher::new(&Config::default().scraper)
            .unwrap()
            .with_cache(dir.path())
            .offline_only(true);

        let err = fetcher
            .fetch("https://www.ncaa.com/championships/baseball/d1/future-info/")
            .unwrap_err();
        assert!(matches!(
            err,
            SeasonError::Scraper {
                data_source: DataSource::Ncaa,
                ..
            }
        ));
    }

    #[test]
    fn test_with_retry_stops_after_success() {
        let calls = Cell::new(0);
        let result = with_retry(
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 2 {
                    Err(SeasonError::Parse("flaky".to_string()))
                } else {
                    Ok(calls.get())
                }
            },
            3,
        );
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_with_retry_single_attempt() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(
            || {
                calls.set(calls.get() + 1);
                Err(SeasonError::Parse("down".to_string()))
            },
            1,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_delay_grows_and_saturates() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(20), MAX_BACKOFF);
        assert_eq!(backoff_delay(64), MAX_BACKOFF);
        assert_eq!(backoff_delay(u32::MAX), MAX_BACKOFF);
    }
}
