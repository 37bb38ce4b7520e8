use std::collections::BTreeMap;

use core_types::{MonthKey, PriceSeries};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ranking;

/// One ticker's price movement within a single calendar month.
///
/// `first_close` and `last_close` are the earliest and latest closes inside
/// the bucket; a partial month at a data boundary is bucketed as-is.
/// `monthly_return` is a ×100 percentage, `None` when the bucket opens at a
/// zero close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub ticker: String,
    pub month: MonthKey,
    pub first_close: Decimal,
    pub last_close: Decimal,
    pub monthly_return: Option<Decimal>,
}

/// The best and worst tickers of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMovers {
    pub gainers: Vec<MonthlyReturn>,
    pub losers: Vec<MonthlyReturn>,
}

/// Buckets the series by calendar month and derives per-month returns.
#[derive(Debug, Default)]
pub struct PeriodGrouper {}

impl PeriodGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-(ticker, month) returns, ordered by ticker and then month.
    ///
    /// Buckets are independent: a month's return never folds in the close of
    /// a neighbouring month, and nothing carries over between months.
    pub fn monthly_returns(&self, series: &PriceSeries) -> Vec<MonthlyReturn> {
        let mut results = Vec::new();
        for (ticker, observations) in series.groups() {
            let mut buckets: BTreeMap<MonthKey, (Decimal, Decimal)> = BTreeMap::new();
            for observation in observations {
                // Observations arrive date-ascending, so the entry's second
                // slot always tracks the latest close seen for the month.
                buckets
                    .entry(MonthKey::from_date(observation.date))
                    .and_modify(|(_, last)| *last = observation.close)
                    .or_insert((observation.close, observation.close));
            }
            for (month, (first_close, last_close)) in buckets {
                let monthly_return = if first_close.is_zero() {
                    None
                } else {
                    Some((last_close - first_close) / first_close * Decimal::ONE_HUNDRED)
                };
                results.push(MonthlyReturn {
                    ticker: ticker.to_string(),
                    month,
                    first_close,
                    last_close,
                    monthly_return,
                });
            }
        }
        results
    }

    /// The top and bottom `n` tickers of every month by monthly return.
    pub fn monthly_movers(
        &self,
        series: &PriceSeries,
        n: usize,
    ) -> BTreeMap<MonthKey, MonthlyMovers> {
        let mut by_month: BTreeMap<MonthKey, Vec<MonthlyReturn>> = BTreeMap::new();
        for row in self.monthly_returns(series) {
            by_month.entry(row.month).or_default().push(row);
        }

        by_month
            .into_iter()
            .map(|(month, rows)| {
                let movers = MonthlyMovers {
                    gainers: ranking::top_n(&rows, |r| r.monthly_return, n, false),
                    losers: ranking::bottom_n(&rows, |r| r.monthly_return, n),
                };
                (month, movers)
            })
            .collect()
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
    fn months_bucket_independently() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-30", dec!(105)),
            ("ACME", "2023-11-01", dec!(110)),
            ("ACME", "2023-11-28", dec!(100)),
        ]);

        let rows = PeriodGrouper::new().monthly_returns(&series);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].month, MonthKey::new(2023, 10).unwrap());
        assert_eq!(rows[0].monthly_return, Some(dec!(5)));

        // November opens at 110, not at October's 105.
        assert_eq!(rows[1].month, MonthKey::new(2023, 11).unwrap());
        assert_eq!(
            rows[1].monthly_return.unwrap().round_dp(4),
            dec!(-9.0909)
        );
    }

    #[test]
    fn single_observation_month_is_flat() {
        let series = series(vec![("ACME", "2023-10-02", dec!(100))]);

        let rows = PeriodGrouper::new().monthly_returns(&series);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].first_close, rows[0].last_close);
        assert_eq!(rows[0].monthly_return, Some(dec!(0)));
    }

    #[test]
    fn movers_rank_within_each_month() {
        let mut rows = Vec::new();
        for (ticker, october_end) in [("UP", 120), ("FLAT", 100), ("DOWN", 80)] {
            rows.push((ticker, "2023-10-02", dec!(100)));
            rows.push((ticker, "2023-10-30", Decimal::from(october_end)));
        }
        let series = series(rows);

        let movers = PeriodGrouper::new().monthly_movers(&series, 2);
        let october = &movers[&MonthKey::new(2023, 10).unwrap()];

        let gainers: Vec<_> = october.gainers.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(gainers, vec!["UP", "FLAT"]);
        let losers: Vec<_> = october.losers.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(losers, vec!["DOWN", "FLAT"]);
    }

    #[test]
    fn movers_return_short_lists_without_error() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-30", dec!(105)),
        ]);

        let movers = PeriodGrouper::new().monthly_movers(&series, 5);
        let october = &movers[&MonthKey::new(2023, 10).unwrap()];
        assert_eq!(october.gainers.len(), 1);
        assert_eq!(october.losers.len(), 1);
    }
}
