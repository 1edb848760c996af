//! Data ingestion and storage
//!
//! Page fetching, the two end-date scrapers and SQLite storage of windows.

pub mod database;
pub mod fetch;
pub mod scrapers;

pub use database::{Database, SeasonStore};
pub use fetch::{Fetcher, HttpFetcher};
