//! Wikipedia scraper for season durations
//!
//! Each "{year} NCAA Division I baseball season" article carries an infobox
//! with a "Duration" row such as "February 14 – June 24, 2025". The end of
//! that range is the year's championship end date.

use super::{element_text, EndDateSource, Harvest, YearFailure};
use crate::data::fetch::Fetcher;
use crate::season::text::{clean, contains_month_name, parse_month_day};
use crate::{DataSource, Result, SourcesConfig};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// Start and end of one season as printed in the infobox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonDuration {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Scraper for Wikipedia season articles
pub struct WikipediaSeasonScraper<F> {
    fetcher: F,
    url_template: String,
    first_year: i32,
}

impl<F: Fetcher> WikipediaSeasonScraper<F> {
    pub fn new(fetcher: F, sources: &SourcesConfig) -> Self {
        WikipediaSeasonScraper {
            fetcher,
            url_template: sources.wikipedia_url_template.clone(),
            first_year: sources.first_year,
        }
    }

    pub fn season_url(&self, year: i32) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }

    /// Configured first year through the current calendar year
    pub fn default_years(&self) -> RangeInclusive<i32> {
        self.first_year..=chrono::Utc::now().year()
    }

    /// Fetch and parse one year's article
    ///
    /// `Ok(None)` means the page exists but has no usable duration row.
    pub fn fetch_duration(&self, year: i32) -> Result<Option<SeasonDuration>> {
        let url = self.season_url(year);
        let html = self.fetcher.fetch(&url)?;
        Ok(parse_page(&html, year))
    }
}

impl<F: Fetcher> EndDateSource for WikipediaSeasonScraper<F> {
    fn source(&self) -> DataSource {
        DataSource::Wikipedia
    }

    fn collect_end_dates(&self, years: Option<RangeInclusive<i32>>) -> Result<Harvest> {
        let years = years.unwrap_or_else(|| self.default_years());
        let mut harvest = Harvest::new(DataSource::Wikipedia);

        for year in years {
            log::info!("Fetching {} season...", year);
            match self.fetch_duration(year) {
                Ok(Some(duration)) => {
                    log::info!("  {} to {}", duration.start, duration.end);
                    harvest.facts.record(year, duration.end);
                }
                Ok(None) => {
                    log::info!("  No duration found");
                    harvest.missing.push(year);
                }
                Err(e) => {
                    log::warn!("Failed to fetch {} season: {}", year, e);
                    harvest.failures.push(YearFailure {
                        year,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(harvest)
    }
}

/// Parse an article's infobox duration
pub fn parse_page(html: &str, year: i32) -> Option<SeasonDuration> {
    let document = Html::parse_document(html);

    for text in locate_duration_texts(&document) {
        match parse_duration(&text, year) {
            Some((start, end)) => return Some(SeasonDuration { year, start, end }),
            None => log::debug!("Ignoring duration text {:?}", text),
        }
    }

    None
}

/// Data cell texts of every "Duration" row in the page's infobox
pub fn locate_duration_texts(document: &Html) -> Vec<String> {
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let header_selector = Selector::parse("th").unwrap();
    let data_selector = Selector::parse("td.infobox-data").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let Some(infobox) = document.select(&table_selector).find(is_infobox) else {
        log::debug!("No infobox on page");
        return Vec::new();
    };

    infobox
        .select(&row_selector)
        .filter(|row| {
            row.select(&header_selector)
                .next()
                .map(|th| element_text(&th).to_lowercase() == "duration")
                .unwrap_or(false)
        })
        .filter_map(|row| {
            row.select(&data_selector)
                .next()
                .or_else(|| row.select(&cell_selector).next())
        })
        .map(|cell| element_text(&cell))
        .collect()
}

fn is_infobox(table: &ElementRef) -> bool {
    table.value().classes().any(|class| class.contains("infobox"))
}

fn range_dash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*–\s*").unwrap())
}

/// Convert "February 14 – June 24, 2025" into its two dates
///
/// The trailing year applies to both ends unless an end carries its own. With
/// no trailing year segment the article's year is used. A start that would
/// fall after the end is moved into the previous year. Anything else that does
/// not fit (no dash, no month name, a day that does not exist, a start that
/// still cannot precede the end) yields `None`.
pub fn parse_duration(text: &str, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let text = clean(text);

    let (range, context_year) = match text.rsplit_once(',') {
        Some((range, trailing)) => {
            let trailing = trailing.trim();
            if trailing.len() != 4 || !trailing.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            (range.trim(), trailing.parse().ok()?)
        }
        None => (text.as_str(), year),
    };

    let phrases: Vec<&str> = range_dash().split(range).collect();
    let [start_phrase, end_phrase] = phrases.as_slice() else {
        return None;
    };

    if !contains_month_name(start_phrase) || !contains_month_name(end_phrase) {
        return None;
    }

    let start = parse_month_day(start_phrase, context_year)?;
    let end = parse_month_day(end_phrase, context_year)?;
    if start > end {
        // "November 1 – June 24, 2025": the season began in the previous year
        let earlier = start.with_year(start.year() - 1).filter(|s| *s <= end)?;
        return Some((earlier, end));
    }
    Some((start, end))
}
