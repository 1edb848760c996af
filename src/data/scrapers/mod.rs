//! Scrapers producing finals end dates per season year

pub mod ncaa;
pub mod wikipedia;

use crate::season::text::normalize;
use crate::season::YearEndFacts;
use crate::{DataSource, Result};
use chrono::NaiveDate;
use scraper::ElementRef;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Visible text of an element, text nodes joined by single spaces
pub(crate) fn element_text(element: &ElementRef) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    normalize(&joined).replace(" ,", ",")
}

/// Trait for all end-date sources
pub trait EndDateSource {
    /// The data source this scraper fetches from
    fn source(&self) -> DataSource;

    /// Collect finals end dates, optionally limited to a year range
    ///
    /// Per-year failures end up in the harvest; only an error that makes the
    /// whole source unusable is returned as `Err`.
    fn collect_end_dates(&self, years: Option<RangeInclusive<i32>>) -> Result<Harvest>;
}

/// A year that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearFailure {
    pub year: i32,
    pub message: String,
}

/// End dates gathered from one source in one run
#[derive(Debug, Clone)]
pub struct Harvest {
    pub source: DataSource,
    pub facts: YearEndFacts,
    /// Pages fetched but without a usable date
    pub missing: Vec<i32>,
    pub failures: Vec<YearFailure>,
}

impl Harvest {
    pub fn new(source: DataSource) -> Self {
        Harvest {
            source,
            facts: YearEndFacts::new(),
            missing: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// End dates for one year as reported by two sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceComparison {
    pub year: i32,
    pub first: NaiveDate,
    pub second: NaiveDate,
}

impl SourceComparison {
    pub fn agrees(&self) -> bool {
        self.first == self.second
    }

    /// Days the second source's date lies after the first's
    pub fn difference_days(&self) -> i64 {
        (self.second - self.first).num_days()
    }
}

/// Line up the years both sources know about
pub fn compare_sources(first: &YearEndFacts, second: &YearEndFacts) -> Vec<SourceComparison> {
    first
        .iter()
        .filter_map(|(year, first_date)| {
            second.get(year).map(|second_date| SourceComparison {
                year,
                first: first_date,
                second: second_date,
            })
        })
        .collect()
}
