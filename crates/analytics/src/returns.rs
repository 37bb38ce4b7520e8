use chrono::NaiveDate;
use core_types::PriceSeries;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A ticker's growth over the full selected date range.
///
/// `yearly_return` is a ×100 percentage between the first and last
/// chronological closes in scope. It is `None` only when the opening close
/// is zero, which leaves the ratio undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPerformance {
    pub ticker: String,
    pub first_close: Decimal,
    pub last_close: Decimal,
    pub yearly_return: Option<Decimal>,
}

/// One point of a ticker's compounded-growth series.
///
/// Both returns are fractions, not percentages: `daily_return` is the
/// close-over-close change against the previous bar (an explicit `0` on the
/// first bar of each ticker), and `cumulative_return` is the running product
/// of `1 + daily` minus one, re-based at the start of each ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub ticker: String,
    pub date: NaiveDate,
    pub daily_return: Option<Decimal>,
    pub cumulative_return: Option<Decimal>,
}

/// A stateless calculator for growth metrics over the cleaned price series.
#[derive(Debug, Default)]
pub struct ReturnCalculator {}

impl ReturnCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage growth between each ticker's first and last observation.
    ///
    /// "Yearly" means "over the selected range", not calendar-year bounded.
    /// Tickers with fewer than two observations cannot produce a return and
    /// are omitted entirely rather than zero-filled.
    pub fn yearly_returns(&self, series: &PriceSeries) -> Vec<TickerPerformance> {
        let mut results = Vec::new();
        for (ticker, observations) in series.groups() {
            if observations.len() < 2 {
                tracing::debug!(ticker, "skipping yearly return: fewer than two observations");
                continue;
            }
            let first = observations[0].close;
            let last = observations[observations.len() - 1].close;
            let yearly_return = if first.is_zero() {
                None
            } else {
                Some((last - first) / first * Decimal::ONE_HUNDRED)
            };
            results.push(TickerPerformance {
                ticker: ticker.to_string(),
                first_close: first,
                last_close: last,
                yearly_return,
            });
        }
        results
    }

    /// The daily and compounded fractional return series for every ticker,
    /// ordered by ticker and then date.
    ///
    /// The running product is computed strictly date-ascending; the first bar
    /// of each ticker carries an explicit zero daily return so the compounded
    /// series starts at zero. A zero previous close makes that day's return
    /// undefined, and the product stays undefined from that point on rather
    /// than being silently repaired.
    pub fn cumulative_returns(&self, series: &PriceSeries) -> Vec<CumulativePoint> {
        let mut points = Vec::new();
        for (ticker, observations) in series.groups() {
            let mut growth: Option<Decimal> = Some(Decimal::ONE);
            let mut prev_close: Option<Decimal> = None;
            for observation in observations {
                let daily = match prev_close {
                    None => Some(Decimal::ZERO),
                    Some(prev) if prev.is_zero() => None,
                    Some(prev) => Some((observation.close - prev) / prev),
                };
                growth = match (growth, daily) {
                    (Some(g), Some(d)) => Some(g * (Decimal::ONE + d)),
                    _ => None,
                };
                points.push(CumulativePoint {
                    ticker: ticker.to_string(),
                    date: observation.date,
                    daily_return: daily,
                    cumulative_return: growth.map(|g| g - Decimal::ONE),
                });
                prev_close = Some(observation.close);
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PriceObservation;
    use rust_decimal_macros::dec;

    fn obs(date: &str, close: Decimal) -> PriceObservation {
        PriceObservation {
            date: date.parse().unwrap(),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    fn series(rows: Vec<(&str, &str, Decimal)>) -> PriceSeries {
        PriceSeries::from_rows(
            rows.into_iter()
                .map(|(ticker, date, close)| (ticker.to_string(), obs(date, close))),
        )
    }

    #[test]
    fn yearly_return_over_selected_range() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("ACME", "2023-10-04", dec!(121)),
        ]);

        let results = ReturnCalculator::new().yearly_returns(&series);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].first_close, dec!(100));
        assert_eq!(results[0].last_close, dec!(121));
        assert_eq!(results[0].yearly_return, Some(dec!(21)));
    }

    #[test]
    fn single_observation_tickers_are_omitted() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("LONE", "2023-10-02", dec!(40)),
        ]);

        let results = ReturnCalculator::new().yearly_returns(&series);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ticker, "ACME");
    }

    #[test]
    fn zero_first_close_surfaces_as_missing() {
        let series = series(vec![
            ("ZERO", "2023-10-02", dec!(0)),
            ("ZERO", "2023-10-03", dec!(10)),
        ]);

        let results = ReturnCalculator::new().yearly_returns(&series);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].yearly_return, None);
    }

    #[test]
    fn cumulative_returns_compound_from_zero() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("ACME", "2023-10-04", dec!(121)),
        ]);

        let points = ReturnCalculator::new().cumulative_returns(&series);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].daily_return, Some(dec!(0)));
        assert_eq!(points[0].cumulative_return, Some(dec!(0)));
        assert_eq!(points[1].daily_return, Some(dec!(0.1)));
        assert_eq!(points[1].cumulative_return, Some(dec!(0.1)));
        assert_eq!(points[2].daily_return, Some(dec!(0.1)));
        assert_eq!(points[2].cumulative_return, Some(dec!(0.21)));
    }

    #[test]
    fn cumulative_series_rebases_per_ticker() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(150)),
            ("BOLT", "2023-10-02", dec!(10)),
            ("BOLT", "2023-10-03", dec!(11)),
        ]);

        let points = ReturnCalculator::new().cumulative_returns(&series);
        let bolt: Vec<_> = points.iter().filter(|p| p.ticker == "BOLT").collect();
        assert_eq!(bolt[0].cumulative_return, Some(dec!(0)));
        assert_eq!(bolt[1].cumulative_return, Some(dec!(0.1)));
    }

    #[test]
    fn zero_close_poisons_the_running_product() {
        let series = series(vec![
            ("ZERO", "2023-10-02", dec!(10)),
            ("ZERO", "2023-10-03", dec!(0)),
            ("ZERO", "2023-10-04", dec!(5)),
        ]);

        let points = ReturnCalculator::new().cumulative_returns(&series);
        // The drop to zero is itself a defined -100% day...
        assert_eq!(points[1].daily_return, Some(dec!(-1)));
        assert_eq!(points[1].cumulative_return, Some(dec!(-1)));
        // ...but the change off a zero base is undefined, onward.
        assert_eq!(points[2].daily_return, None);
        assert_eq!(points[2].cumulative_return, None);
    }
}
