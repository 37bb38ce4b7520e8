//! # Vantage Ingestion
//!
//! This crate turns raw price data on disk into the cleaned, ticker-grouped
//! `PriceSeries` the analytics engine reads, and loads the ticker → sector
//! mapping used for sector aggregation.
//!
//! ## Architectural Principles
//!
//! - **Sources behind a trait:** every backend (YAML tree, per-ticker CSV
//!   directory, consolidated master CSV, or an external warehouse) produces
//!   the same untrusted [`RawPriceRecord`] rows through [`PriceSource`].
//! - **Coerce, then drop, then trust:** unparseable numbers and dates become
//!   missing values; rows missing a ticker, date, or close are dropped with a
//!   logged count; everything downstream of [`clean`] is well-formed.

pub mod clean;
pub mod error;
pub mod sector;
pub mod source;

// Re-export the key components to create a clean, public-facing API.
pub use clean::clean;
pub use error::IngestError;
pub use sector::load_sector_map;
pub use source::{
    MasterCsvSource, PriceSource, RawPriceRecord, TickerCsvDirSource, YamlTreeSource,
};
