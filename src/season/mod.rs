//! Season window domain: date text primitives and window chaining

pub mod chain;
pub mod text;

pub use chain::{chain_windows, YearEndFacts};
