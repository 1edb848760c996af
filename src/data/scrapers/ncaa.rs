//! NCAA future dates & sites scraper
//!
//! One static page lists upcoming and recent championships, one table row per
//! year. The Finals column holds one line per potential game date, the last of
//! which may be an "if necessary" game.

use super::{element_text, EndDateSource, Harvest};
use crate::data::fetch::Fetcher;
use crate::season::text::{clean, find_all_month_days, find_month_day};
use crate::{DataSource, Result, SeasonError, SourcesConfig};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::ops::RangeInclusive;

/// Column holding the Finals dates
const FINALS_COLUMN: usize = 3;

/// Finals cell of one data row, split into its sub-entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalsRow {
    pub year: i32,
    pub entries: Vec<String>,
    /// The cell had no per-line blocks, so `entries` holds the whole cell
    pub whole_cell: bool,
}

impl FinalsRow {
    /// Every date parsed from the cell, falling back to the row's year
    pub fn candidates(&self) -> Vec<NaiveDate> {
        if self.whole_cell {
            self.entries
                .iter()
                .flat_map(|entry| find_all_month_days(entry, self.year))
                .collect()
        } else {
            self.entries
                .iter()
                .filter_map(|entry| find_month_day(entry, self.year))
                .collect()
        }
    }

    /// Latest candidate: the authoritative finals end date
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.candidates().into_iter().max()
    }
}

/// Scraper for the NCAA future dates page
pub struct NcaaFutureDatesScraper<F> {
    fetcher: F,
    url: String,
}

impl<F: Fetcher> NcaaFutureDatesScraper<F> {
    pub fn new(fetcher: F, sources: &SourcesConfig) -> Self {
        NcaaFutureDatesScraper {
            fetcher,
            url: sources.ncaa_future_dates_url.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<F: Fetcher> EndDateSource for NcaaFutureDatesScraper<F> {
    fn source(&self) -> DataSource {
        DataSource::Ncaa
    }

    fn collect_end_dates(&self, years: Option<RangeInclusive<i32>>) -> Result<Harvest> {
        log::info!("Fetching NCAA future dates from {}", self.url);
        let html = self.fetcher.fetch(&self.url)?;

        let mut harvest = parse_page(&html, &self.url)?;
        if let Some(range) = years {
            harvest.facts.retain_years(*range.start(), *range.end());
            harvest.missing.retain(|y| range.contains(y));
        }

        log::info!("Resolved finals end dates for {} years", harvest.facts.len());
        Ok(harvest)
    }
}

/// Parse the schedule page into finals end dates
///
/// A page without a schedule table body is an error; rows without a usable
/// date are reported as missing.
pub fn parse_page(html: &str, url: &str) -> Result<Harvest> {
    let document = Html::parse_document(html);
    let rows = locate_finals_rows(&document).ok_or_else(|| SeasonError::MissingScheduleTable {
        url: url.to_string(),
    })?;

    let mut harvest = Harvest::new(DataSource::Ncaa);
    for row in rows {
        match harvest.facts.record_candidates(row.year, row.candidates()) {
            Some(end) => log::debug!("{} finals end {}", row.year, end),
            None => {
                log::debug!("No finals date for {} in {:?}", row.year, row.entries);
                harvest.missing.push(row.year);
            }
        }
    }

    Ok(harvest)
}

/// Finals cells of every year row in the schedule table body
///
/// The schedule body is the first one holding at least one year row with a
/// Finals column; layout tables before it are passed over. `None` when no
/// table body qualifies.
pub fn locate_finals_rows(document: &Html) -> Option<Vec<FinalsRow>> {
    let tbody_selector = Selector::parse("tbody").unwrap();

    document
        .select(&tbody_selector)
        .map(|tbody| finals_rows_in(&tbody))
        .find(|rows| !rows.is_empty())
}

fn finals_rows_in(tbody: &ElementRef) -> Vec<FinalsRow> {
    let tr_selector = Selector::parse("tr").unwrap();
    let td_selector = Selector::parse("td").unwrap();
    let div_selector = Selector::parse("div").unwrap();

    let mut rows = Vec::new();

    for tr in tbody.select(&tr_selector) {
        let cells: Vec<_> = tr.select(&td_selector).collect();
        if cells.len() <= FINALS_COLUMN {
            continue;
        }

        let year_text = element_text(&cells[0]);
        if year_text.is_empty() || !year_text.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(year) = year_text.parse::<i32>() else {
            continue;
        };

        let finals = &cells[FINALS_COLUMN];
        let entries: Vec<String> = finals
            .select(&div_selector)
            .map(|div| clean(&element_text(&div)))
            .filter(|entry| !entry.is_empty())
            .collect();

        let row = if entries.is_empty() {
            FinalsRow {
                year,
                entries: vec![clean(&element_text(finals))],
                whole_cell: true,
            }
        } else {
            FinalsRow {
                year,
                entries,
                whole_cell: false,
            }
        };
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    const URL: &str = "https://www.ncaa.com/championships/baseball/d1/future-info/";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule_page() -> String {
        r#"<html><body>
        <h2>Future Dates &amp; Sites</h2>
        <table>
          <thead><tr><th>Year</th><th>Regionals</th><th>Super Regionals</th><th>Finals</th><th>Site</th></tr></thead>
          <tbody>
            <tr><td>Year</td><td>Regionals</td><td>Super Regionals</td><td>Finals</td><td>Site</td></tr>
            <tr>
              <td>2025</td>
              <td><div>May 30-June 2</div></td>
              <td><div>June 6-9</div></td>
              <td><div>Sat., June 21</div><div>Sun., June 22 (if necessary)*</div></td>
              <td>Omaha, Neb.</td>
            </tr>
            <tr>
              <td>2026</td>
              <td>May 29-June 1</td>
              <td>June 5-8</td>
              <td>Sun., June 21</td>
              <td>Omaha, Neb.</td>
            </tr>
            <tr>
              <td>2027</td>
              <td>TBD</td>
              <td>TBD</td>
              <td><div>Sat., June 19</div><div>Sun., June 20, 2027</div><div>Mon., June 21 (if necessary)</div></td>
              <td>Omaha, Neb.</td>
            </tr>
            <tr><td>2028</td><td>TBD</td><td>TBD</td><td>TBD</td><td>Omaha, Neb.</td></tr>
            <tr><td>2029</td><td>TBD</td></tr>
            <tr><td colspan="5">* Game three of the finals is played only if necessary.</td></tr>
          </tbody>
        </table>
        </body></html>"#
            .to_string()
    }

    struct PageFetcher(Option<String>);

    impl Fetcher for PageFetcher {
        fn fetch(&self, url: &str) -> Result<String> {
            self.0.clone().ok_or_else(|| SeasonError::Scraper {
                data_source: DataSource::Ncaa,
                message: format!("HTTP 503 Service Unavailable: {}", url),
            })
        }
    }

    #[test]
    fn test_contingency_date_is_end_date() {
        let row = FinalsRow {
            year: 2025,
            entries: vec!["June 14".to_string(), "June 17 (if necessary)".to_string()],
            whole_cell: false,
        };
        assert_eq!(row.end_date(), Some(date(2025, 6, 17)));
    }

    #[test]
    fn test_weekday_prefix_and_fallback_year() {
        let row = FinalsRow {
            year: 2026,
            entries: vec!["Sun., June 21".to_string()],
            whole_cell: true,
        };
        assert_eq!(row.end_date(), Some(date(2026, 6, 21)));
    }

    #[test]
    fn test_unparseable_entries_are_discarded() {
        let row = FinalsRow {
            year: 2028,
            entries: vec!["TBD".to_string(), "June 31".to_string()],
            whole_cell: false,
        };
        assert!(row.candidates().is_empty());
        assert_eq!(row.end_date(), None);
    }

    #[test]
    fn test_locate_finals_rows() {
        let document = Html::parse_document(&schedule_page());
        let rows = locate_finals_rows(&document).unwrap();

        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2025, 2026, 2027, 2028]);
        assert_eq!(
            rows[0].entries,
            vec!["Sat., June 21", "Sun., June 22 (if necessary)"]
        );
        assert!(!rows[0].whole_cell);
        assert!(rows[1].whole_cell);
    }

    #[test]
    fn test_parse_page() {
        let harvest = parse_page(&schedule_page(), URL).unwrap();
        assert_eq!(harvest.source, DataSource::Ncaa);
        assert_eq!(harvest.facts.get(2025), Some(date(2025, 6, 22)));
        assert_eq!(harvest.facts.get(2026), Some(date(2026, 6, 21)));
        assert_eq!(harvest.facts.get(2027), Some(date(2027, 6, 21)));
        assert_eq!(harvest.facts.len(), 3);
        assert_eq!(harvest.missing, vec![2028]);
    }

    #[test]
    fn test_missing_table_body_is_fatal() {
        let err = parse_page("<html><body><p>Coming soon</p></body></html>", URL).unwrap_err();
        assert!(matches!(err, SeasonError::MissingScheduleTable { .. }));
    }

    #[test]
    fn test_layout_table_before_schedule_is_skipped() {
        let html = r#"<html><body>
            <table class="nav"><tr><td>Home</td><td>Scores</td><td>Schedule</td><td>Tickets</td></tr></table>
            <table><tbody>
              <tr><td>2025</td><td>May 30-June 2</td><td>June 6-9</td><td><div>Sat., June 21</div><div>Sun., June 22 (if necessary)</div></td></tr>
              <tr><td>2026</td><td>May 29-June 1</td><td>June 5-8</td><td>Sun., June 21</td></tr>
            </tbody></table>
            </body></html>"#;

        let harvest = parse_page(html, URL).unwrap();
        assert_eq!(harvest.facts.get(2025), Some(date(2025, 6, 22)));
        assert_eq!(harvest.facts.get(2026), Some(date(2026, 6, 21)));
        assert_eq!(harvest.facts.len(), 2);
    }

    #[test]
    fn test_table_without_year_rows_is_fatal() {
        let html = "<table><tr><td>Year</td><td>Finals</td></tr></table>";
        let err = parse_page(html, URL).unwrap_err();
        assert!(matches!(err, SeasonError::MissingScheduleTable { .. }));
    }

    #[test]
    fn test_collect_end_dates_filters_years() {
        let config = Config::default();
        let scraper = NcaaFutureDatesScraper::new(PageFetcher(Some(schedule_page())), &config.sources);

        let harvest = scraper.collect_end_dates(Some(2026..=2027)).unwrap();
        let years: Vec<i32> = harvest.facts.years().collect();
        assert_eq!(years, vec![2026, 2027]);
        assert!(harvest.missing.is_empty());
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let config = Config::default();
        let scraper = NcaaFutureDatesScraper::new(PageFetcher(None), &config.sources);
        assert!(matches!(
            scraper.collect_end_dates(None),
            Err(SeasonError::Scraper { .. })
        ));
    }
}
