//! # Vantage Export
//!
//! This crate serializes computed tables to CSV for downstream BI tools:
//! the cleaned master price table, a flat per-observation analytics table
//! (sector, daily/cumulative/yearly/monthly returns, volatility), and the
//! correlation matrix. It performs no computation of its own beyond joining
//! the analytics engine's outputs onto the observation rows; undefined
//! values serialize as empty cells.

pub mod error;
pub mod tables;
pub mod writer;

// Re-export the key components to create a clean, public-facing API.
pub use error::ExportError;
pub use tables::{AnalyticsRow, build_analytics_rows};
pub use writer::{write_analytics_csv, write_correlation_csv, write_master_csv};
