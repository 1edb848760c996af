//! Year-over-year window chaining
//!
//! A window for year Y starts the day after Y-1's finals ended and ends on
//! Y's finals end date. Years whose predecessor is unknown are left out.

use crate::SeasonWindow;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Finals end date per championship year, from a single source
///
/// Recording several candidates for one year keeps the latest: contingency
/// games only ever extend a series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct YearEndFacts {
    end_dates: BTreeMap<i32, NaiveDate>,
}

impl YearEndFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate end date, keeping the maximum per year
    pub fn record(&mut self, year: i32, end_date: NaiveDate) {
        self.end_dates
            .entry(year)
            .and_modify(|existing| {
                if end_date > *existing {
                    *existing = end_date;
                }
            })
            .or_insert(end_date);
    }

    /// Record the latest of several candidates; no-op when empty
    pub fn record_candidates<I>(&mut self, year: i32, candidates: I) -> Option<NaiveDate>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let latest = candidates.into_iter().max()?;
        self.record(year, latest);
        Some(latest)
    }

    pub fn get(&self, year: i32) -> Option<NaiveDate> {
        self.end_dates.get(&year).copied()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.end_dates.contains_key(&year)
    }

    pub fn len(&self) -> usize {
        self.end_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.end_dates.is_empty()
    }

    /// Years in ascending order
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.end_dates.keys().copied()
    }

    /// `(year, end_date)` pairs in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = (i32, NaiveDate)> + '_ {
        self.end_dates.iter().map(|(y, d)| (*y, *d))
    }

    /// Keep only years inside the inclusive range
    pub fn retain_years(&mut self, first: i32, last: i32) {
        self.end_dates.retain(|y, _| (first..=last).contains(y));
    }
}

impl FromIterator<(i32, NaiveDate)> for YearEndFacts {
    fn from_iter<T: IntoIterator<Item = (i32, NaiveDate)>>(iter: T) -> Self {
        let mut facts = YearEndFacts::new();
        for (year, date) in iter {
            facts.record(year, date);
        }
        facts
    }
}

/// Derive season windows from one source's end dates
///
/// Deterministic in its input: windows come out in ascending year order and a
/// year appears only when both it and its predecessor have an end date.
pub fn chain_windows(facts: &YearEndFacts) -> Vec<SeasonWindow> {
    let mut windows = Vec::new();

    for (year, season_end) in facts.iter() {
        let Some(previous_end) = facts.get(year - 1) else {
            log::debug!("No {} end date, leaving {} out", year - 1, year);
            continue;
        };
        let Some(season_start) = previous_end.checked_add_days(Days::new(1)) else {
            continue;
        };
        if season_start > season_end {
            log::warn!(
                "Skipping {}: start {} falls after end {}",
                year,
                season_start,
                season_end
            );
            continue;
        }
        windows.push(SeasonWindow {
            year,
            season_start,
            season_end,
        });
    }

    windows
}
