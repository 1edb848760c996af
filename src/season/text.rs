//! Text normalization and month-name date parsing
//!
//! Shared by both page parsers. Only the twelve full English month names are
//! recognized, capitalized as written in prose, so "may" in a sentence never
//! reads as a date.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_PATTERN: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

fn exact_month_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^({MONTHS_PATTERN}) (\d{{1,2}})(?:, ?(\d{{4}}))?$"
        ))
        .expect("month-day pattern is valid")
    })
}

fn embedded_month_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"\b({MONTHS_PATTERN})\s+(\d{{1,2}})\b(?:,\s*(\d{{4}})\b)?"
        ))
        .expect("month-day pattern is valid")
    })
}

fn footnote_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("footnote pattern is valid"))
}

/// Collapse whitespace runs (including non-breaking spaces) to one space and trim
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop annotation markers: asterisks, daggers and `[1]`-style footnotes
pub fn strip_annotations(text: &str) -> String {
    let without_notes = footnote_marker().replace_all(text, "");
    normalize(&without_notes.replace(['*', '†'], ""))
}

/// Normalize and strip annotations in one step
pub fn clean(text: &str) -> String {
    strip_annotations(&normalize(text))
}

/// Month number (1-12) for a full English month name
pub fn month_from_name(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

/// True if any full month name occurs in the text
pub fn contains_month_name(text: &str) -> bool {
    MONTH_NAMES.iter().any(|m| text.contains(m))
}

/// Parse a whole fragment of the form "Month Day[, Year]"
///
/// `year` is used when the fragment carries no year of its own. Returns `None`
/// when the fragment is not exactly that shape or the day does not exist.
pub fn parse_month_day(text: &str, year: i32) -> Option<NaiveDate> {
    let text = normalize(text);
    let caps = exact_month_day().captures(&text)?;
    build_date(
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(3).map(|m| m.as_str()),
        year,
    )
}

/// Find the first "Month Day[, Year]" anywhere in the text
///
/// Leading weekday abbreviations and trailing notes such as "(if necessary)"
/// are ignored. `fallback_year` applies when no year follows the day.
pub fn find_month_day(text: &str, fallback_year: i32) -> Option<NaiveDate> {
    find_all_month_days(text, fallback_year).into_iter().next()
}

/// Every parseable "Month Day[, Year]" occurrence, in text order
pub fn find_all_month_days(text: &str, fallback_year: i32) -> Vec<NaiveDate> {
    let text = clean(text);
    embedded_month_day()
        .captures_iter(&text)
        .filter_map(|caps| {
            let date = build_date(
                caps.get(1)?.as_str(),
                caps.get(2)?.as_str(),
                caps.get(3).map(|m| m.as_str()),
                fallback_year,
            );
            if date.is_none() {
                log::debug!("Discarding unparseable date fragment {:?}", &caps[0]);
            }
            date
        })
        .collect()
}

fn build_date(month: &str, day: &str, year: Option<&str>, fallback_year: i32) -> Option<NaiveDate> {
    let month = month_from_name(month)?;
    let day: u32 = day.parse().ok()?;
    let year = match year {
        Some(y) => y.parse().ok()?,
        None => fallback_year,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  June \n\t 14\u{a0} "), "June 14");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_strip_annotations() {
        assert_eq!(strip_annotations("June 24, 2025*"), "June 24, 2025");
        assert_eq!(strip_annotations("February 14[1] – June 24, 2025"), "February 14 – June 24, 2025");
        assert_eq!(strip_annotations("June 22 † (if necessary)"), "June 22 (if necessary)");
    }

    #[test]
    fn test_parse_month_day_all_months() {
        for (i, name) in MONTH_NAMES.iter().enumerate() {
            let month = i as u32 + 1;
            for day in [1, 15, 28] {
                let text = format!("{} {}, 2023", name, day);
                assert_eq!(parse_month_day(&text, 1999), Some(date(2023, month, day)));
            }
        }
    }

    #[test]
    fn test_parse_month_day_last_day_of_each_month() {
        let last_days = |year: i32| -> [u32; 12] {
            let february = if year % 4 == 0 { 29 } else { 28 };
            [31, february, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
        };

        for year in [2023, 2024] {
            for (i, (name, last)) in MONTH_NAMES.iter().zip(last_days(year)).enumerate() {
                let month = i as u32 + 1;
                let text = format!("{} {}, {}", name, last, year);
                assert_eq!(parse_month_day(&text, 1999), Some(date(year, month, last)));

                let past_end = format!("{} {}, {}", name, last + 1, year);
                assert_eq!(parse_month_day(&past_end, 1999), None, "{}", past_end);
            }
        }
    }

    #[test]
    fn test_parse_month_day_uses_context_year() {
        assert_eq!(parse_month_day("February 14", 2025), Some(date(2025, 2, 14)));
        assert_eq!(parse_month_day("February 29", 2024), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_parse_month_day_rejects_invalid() {
        assert_eq!(parse_month_day("February 29", 2025), None);
        assert_eq!(parse_month_day("June 31", 2025), None);
        assert_eq!(parse_month_day("Jun 14", 2025), None);
        assert_eq!(parse_month_day("june 14", 2025), None);
        assert_eq!(parse_month_day("Sun., June 21", 2026), None);
        assert_eq!(parse_month_day("TBD", 2026), None);
    }

    #[test]
    fn test_find_month_day_ignores_surrounding_text() {
        assert_eq!(find_month_day("Sun., June 21", 2026), Some(date(2026, 6, 21)));
        assert_eq!(
            find_month_day("Mon., June 22 (if necessary)*", 2026),
            Some(date(2026, 6, 22))
        );
        assert_eq!(
            find_month_day("Sat., June 20, 2027", 2026),
            Some(date(2027, 6, 20))
        );
        assert_eq!(find_month_day("Sites to be determined", 2026), None);
    }

    #[test]
    fn test_find_all_month_days_skips_impossible_days() {
        let found = find_all_month_days("June 31 or July 2", 2025);
        assert_eq!(found, vec![date(2025, 7, 2)]);
    }

    #[test]
    fn test_contains_month_name() {
        assert!(contains_month_name("from February 14"));
        assert!(!contains_month_name("TBD"));
        assert_eq!(month_from_name("December"), Some(12));
        assert_eq!(month_from_name("Sept"), None);
    }
}
