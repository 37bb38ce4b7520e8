//! # Vantage Analytics Engine
//!
//! This crate derives descriptive market analytics from a cleaned,
//! ticker-grouped price series: growth and compounded returns, dispersion of
//! daily returns, cross-ticker correlation, sector aggregates, calendar-month
//! movers, and a headline market summary.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** this crate has no knowledge of files, databases, or
//!   rendering. It depends only on `core-types` and computes values.
//! - **Stateless calculation:** every calculator is a stateless struct that
//!   takes a `PriceSeries` and produces value-typed rows. Nothing is cached;
//!   every call recomputes from its input.
//! - **Missing over magic:** metrics a ticker cannot support (too few
//!   observations, a zero divisor, no variance) come back as `None`, never as
//!   a placeholder number, and never abort the other tickers' results.
//!
//! ## Unit conventions
//!
//! Daily returns, cumulative returns, and volatility are *fractions*; yearly
//! and monthly returns and sector averages are *×100 percentages*. Each row
//! type documents which convention it carries.

pub mod correlation;
pub mod error;
pub mod periods;
pub mod ranking;
pub mod returns;
pub mod sector;
pub mod summary;
pub mod volatility;

// Re-export the key components to create a clean, public-facing API.
pub use correlation::{CorrelationEngine, CorrelationMatrix};
pub use error::AnalyticsError;
pub use periods::{MonthlyMovers, MonthlyReturn, PeriodGrouper};
pub use returns::{CumulativePoint, ReturnCalculator, TickerPerformance};
pub use sector::{SectorAggregator, SectorPerformance};
pub use summary::MarketSummary;
pub use volatility::{VolatilityCalculator, VolatilityRow};
