use core_types::{PriceObservation, PriceSeries};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::ranking;

/// Dispersion of a ticker's daily fractional returns.
///
/// `volatility` is the sample standard deviation (n − 1 denominator) of the
/// day-over-day close changes, itself a fraction. It is `None` when fewer
/// than two usable daily returns exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityRow {
    pub ticker: String,
    pub volatility: Option<Decimal>,
}

/// A stateless calculator for the dispersion of daily returns.
#[derive(Debug, Default)]
pub struct VolatilityCalculator {}

impl VolatilityCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-ticker volatility, most volatile first, undefined values last.
    ///
    /// The first bar of each ticker contributes no return to the sample.
    /// This intentionally differs from the cumulative-return series, where
    /// the first bar carries an explicit zero.
    pub fn volatility(&self, series: &PriceSeries) -> Vec<VolatilityRow> {
        let mut rows: Vec<VolatilityRow> = series
            .groups()
            .map(|(ticker, observations)| VolatilityRow {
                ticker: ticker.to_string(),
                volatility: sample_std_dev(&daily_changes(observations)),
            })
            .collect();
        rows.sort_by(|a, b| ranking::compare_metric(a.volatility, b.volatility, false));
        rows
    }
}

/// Day-over-day fractional close changes. A pair whose previous close is
/// zero has no defined change and is excluded from the sample, not zeroed.
fn daily_changes(observations: &[PriceObservation]) -> Vec<Decimal> {
    observations
        .windows(2)
        .filter(|w| !w[0].close.is_zero())
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect()
}

/// Sample standard deviation, `None` below two data points.
fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let n = Decimal::from(values.len());
    let mean = values.iter().sum::<Decimal>() / n;
    let variance = values
        .iter()
        .map(|v| (*v - mean) * (*v - mean))
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    variance.sqrt()
}
