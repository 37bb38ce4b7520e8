use std::collections::BTreeMap;

use analytics::{PeriodGrouper, ReturnCalculator, VolatilityCalculator};
use chrono::NaiveDate;
use core_types::{MonthKey, PriceSeries, SectorMap};
use rust_decimal::Decimal;
use serde::Serialize;

/// One row of the flat per-observation analytics table.
///
/// Daily and cumulative returns and volatility are fractions; yearly and
/// monthly returns are ×100 percentages. Per-ticker metrics (yearly return,
/// volatility) repeat on every row of that ticker and per-month metrics on
/// every row of that (ticker, month): the denormalized shape BI tools
/// expect. Undefined values serialize as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub volume: Option<u64>,
    pub sector: Option<String>,
    pub daily_return: Option<Decimal>,
    pub cumulative_return: Option<Decimal>,
    pub yearly_return: Option<Decimal>,
    pub volatility: Option<Decimal>,
    pub month: String,
    pub monthly_return: Option<Decimal>,
}

/// Joins every analytics output onto the observation rows.
///
/// Recomputes all metrics from the series it is given; like every other
/// consumer it holds no cache and trusts only its input.
pub fn build_analytics_rows(series: &PriceSeries, sectors: &SectorMap) -> Vec<AnalyticsRow> {
    let returns = ReturnCalculator::new();
    let cumulative = returns.cumulative_returns(series);

    let yearly: BTreeMap<String, Option<Decimal>> = returns
        .yearly_returns(series)
        .into_iter()
        .map(|p| (p.ticker, p.yearly_return))
        .collect();
    let volatility: BTreeMap<String, Option<Decimal>> = VolatilityCalculator::new()
        .volatility(series)
        .into_iter()
        .map(|r| (r.ticker, r.volatility))
        .collect();
    let monthly: BTreeMap<(String, MonthKey), Option<Decimal>> = PeriodGrouper::new()
        .monthly_returns(series)
        .into_iter()
        .map(|m| ((m.ticker, m.month), m.monthly_return))
        .collect();

    // The cumulative series visits observations in exactly the series'
    // (ticker, date) order, so the two iterations pair up one to one.
    series
        .observations()
        .zip(cumulative)
        .map(|((ticker, observation), point)| {
            debug_assert_eq!(ticker, point.ticker);
            debug_assert_eq!(observation.date, point.date);
            let month = MonthKey::from_date(observation.date);
            AnalyticsRow {
                ticker: ticker.to_string(),
                date: observation.date,
                open: observation.open,
                high: observation.high,
                low: observation.low,
                close: observation.close,
                volume: observation.volume,
                sector: sectors.sector_of(ticker).map(str::to_string),
                daily_return: point.daily_return,
                cumulative_return: point.cumulative_return,
                yearly_return: yearly.get(ticker).copied().flatten(),
                volatility: volatility.get(ticker).copied().flatten(),
                month: month.to_string(),
                monthly_return: monthly.get(&(ticker.to_string(), month)).copied().flatten(),
            }
        })
        .collect()
}
