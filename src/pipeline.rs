//! Batch driver: harvest end dates, chain windows, store them
//!
//! The fetcher inside the source and the store are both passed in, so one run
//! never touches process-wide state.

use crate::data::database::SeasonStore;
use crate::data::scrapers::{EndDateSource, Harvest, YearFailure};
use crate::season::{chain_windows, YearEndFacts};
use crate::{DataSource, Result, SeasonWindow};
use serde::Serialize;
use std::ops::RangeInclusive;

/// How windows are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace whatever is stored for the year
    Upsert,
    /// Leave years that already have a window untouched
    InsertIfAbsent,
}

/// Outcome of writing windows to a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub written: Vec<i32>,
    pub skipped_existing: Vec<i32>,
    pub failed: Vec<YearFailure>,
}

/// Outcome of one full run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub source: DataSource,
    pub facts: YearEndFacts,
    pub windows: Vec<SeasonWindow>,
    pub missing_years: Vec<i32>,
    pub failed_years: Vec<YearFailure>,
    pub store: StoreReport,
}

impl SyncReport {
    /// Years with a resolved end date
    pub fn resolved_years(&self) -> usize {
        self.facts.len()
    }
}

/// Harvest and chain without writing anything
pub fn resolve_windows<S>(
    source: &S,
    years: Option<RangeInclusive<i32>>,
) -> Result<(Harvest, Vec<SeasonWindow>)>
where
    S: EndDateSource + ?Sized,
{
    let harvest = source.collect_end_dates(years)?;
    let windows = chain_windows(&harvest.facts);
    log::info!(
        "{}: {} end dates, {} windows",
        harvest.source,
        harvest.facts.len(),
        windows.len()
    );
    Ok((harvest, windows))
}

/// Write windows one by one; a failing record is logged and skipped
pub fn store_windows<T>(
    store: &T,
    windows: &[SeasonWindow],
    source: DataSource,
    mode: WriteMode,
) -> StoreReport
where
    T: SeasonStore + ?Sized,
{
    let mut report = StoreReport::default();

    for window in windows {
        if mode == WriteMode::InsertIfAbsent {
            match store.find_window(window.year) {
                Ok(Some(_)) => {
                    log::info!("Year {} already exists, skipping", window.year);
                    report.skipped_existing.push(window.year);
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Failed to look up {}: {}", window.year, e);
                    report.failed.push(YearFailure {
                        year: window.year,
                        message: e.to_string(),
                    });
                    continue;
                }
            }
        }

        match store.upsert_window(window, source) {
            Ok(()) => {
                log::debug!("Stored {}", window);
                report.written.push(window.year);
            }
            Err(e) => {
                log::warn!("Failed to store {}: {}", window.year, e);
                report.failed.push(YearFailure {
                    year: window.year,
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

/// Full run for one source
///
/// Only an error that makes the source unusable is returned; per-year fetch
/// and write failures are reported in the result.
pub fn run_sync<S, T>(
    source: &S,
    store: &T,
    years: Option<RangeInclusive<i32>>,
    mode: WriteMode,
) -> Result<SyncReport>
where
    S: EndDateSource + ?Sized,
    T: SeasonStore + ?Sized,
{
    let (harvest, windows) = resolve_windows(source, years)?;
    let store_report = store_windows(store, &windows, harvest.source, mode);

    Ok(SyncReport {
        source: harvest.source,
        facts: harvest.facts,
        windows,
        missing_years: harvest.missing,
        failed_years: harvest.failures,
        store: store_report,
    })
}
