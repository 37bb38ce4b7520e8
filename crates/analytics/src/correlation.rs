use std::collections::BTreeSet;

use chrono::NaiveDate;
use core_types::PriceSeries;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Symmetric pairwise Pearson correlation of closing prices.
///
/// Row and column order both follow `tickers`. The diagonal is exactly `1`;
/// a cell is `None` where either side of the pair has zero price variance,
/// which leaves the coefficient undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    cells: Vec<Vec<Option<Decimal>>>,
}

impl CorrelationMatrix {
    /// The surviving tickers, in row/column order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// The coefficient at (row, column). Panics on an out-of-range index,
    /// like slice indexing.
    pub fn get(&self, row: usize, column: usize) -> Option<Decimal> {
        self.cells[row][column]
    }

    /// Iterates rows as `(ticker, cells)`.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<Decimal>])> {
        self.tickers
            .iter()
            .zip(&self.cells)
            .map(|(ticker, cells)| (ticker.as_str(), cells.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Computes cross-ticker correlation over a shared date axis.
#[derive(Debug, Default)]
pub struct CorrelationEngine {}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pairwise Pearson correlation matrix of closing prices.
    ///
    /// The series is pivoted into an explicit date × ticker table over the
    /// union of all in-scope dates. A ticker missing a close on any date of
    /// that axis is dropped outright, never imputed. At least two tickers
    /// must survive the drop.
    ///
    /// `tickers`, when given, restricts the computation to that subset.
    pub fn correlation_matrix(
        &self,
        series: &PriceSeries,
        tickers: Option<&[String]>,
    ) -> Result<CorrelationMatrix, AnalyticsError> {
        let selected: Vec<_> = series
            .groups()
            .filter(|(ticker, _)| {
                tickers.is_none_or(|wanted| wanted.iter().any(|w| w.as_str() == *ticker))
            })
            .collect();

        let mut axis: BTreeSet<NaiveDate> = BTreeSet::new();
        for (_, observations) in &selected {
            axis.extend(observations.iter().map(|o| o.date));
        }

        // A group holds at most one observation per date, so covering the
        // full axis is exactly a length match; and a full-coverage group is
        // already date-sorted, so its closes line up with the axis as-is.
        let mut surviving: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<Decimal>> = Vec::new();
        for (ticker, observations) in &selected {
            if observations.len() != axis.len() {
                tracing::debug!(
                    ticker,
                    observations = observations.len(),
                    axis = axis.len(),
                    "dropping ticker with incomplete date coverage"
                );
                continue;
            }
            surviving.push(ticker.to_string());
            columns.push(observations.iter().map(|o| o.close).collect());
        }

        if surviving.len() < 2 {
            return Err(AnalyticsError::NotEnoughData(format!(
                "correlation needs at least two tickers with full date coverage, found {}",
                surviving.len()
            )));
        }

        let n = surviving.len();
        let mut cells = vec![vec![None; n]; n];
        for i in 0..n {
            cells[i][i] = Some(Decimal::ONE);
            for j in (i + 1)..n {
                let r = pearson(&columns[i], &columns[j]);
                cells[i][j] = r;
                cells[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            tickers: surviving,
            cells,
        })
    }
}

/// Pearson correlation coefficient of two equal-length columns. `None` when
/// either column has no variance.
fn pearson(x: &[Decimal], y: &[Decimal]) -> Option<Decimal> {
    let n = Decimal::from(x.len());
    let mean_x = x.iter().sum::<Decimal>() / n;
    let mean_y = y.iter().sum::<Decimal>() / n;

    let mut covariance = Decimal::ZERO;
    let mut variance_x = Decimal::ZERO;
    let mut variance_y = Decimal::ZERO;
    for (a, b) in x.iter().zip(y) {
        let dx = *a - mean_x;
        let dy = *b - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x.is_zero() || variance_y.is_zero() {
        return None;
    }
    let denominator = (variance_x * variance_y).sqrt()?;
    if denominator.is_zero() {
        return None;
    }
    Some(covariance / denominator)
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
    fn perfectly_opposed_tickers_correlate_at_minus_one() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("ACME", "2023-10-04", dec!(120)),
            ("BOLT", "2023-10-02", dec!(200)),
            ("BOLT", "2023-10-03", dec!(180)),
            ("BOLT", "2023-10-04", dec!(160)),
        ]);

        let matrix = CorrelationEngine::new()
            .correlation_matrix(&series, None)
            .unwrap();
        assert_eq!(matrix.tickers(), &["ACME".to_string(), "BOLT".to_string()]);
        assert_eq!(matrix.get(0, 1).unwrap().round_dp(8), dec!(-1));
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("ACME", "2023-10-04", dec!(105)),
            ("BOLT", "2023-10-02", dec!(50)),
            ("BOLT", "2023-10-03", dec!(52)),
            ("BOLT", "2023-10-04", dec!(49)),
        ]);

        let matrix = CorrelationEngine::new()
            .correlation_matrix(&series, None)
            .unwrap();
        for i in 0..matrix.len() {
            assert_eq!(matrix.get(i, i), Some(Decimal::ONE));
            for j in 0..matrix.len() {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn partial_coverage_tickers_are_dropped() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("BOLT", "2023-10-02", dec!(50)),
            ("BOLT", "2023-10-03", dec!(52)),
            // GAPPY misses 2023-10-03 and must not appear in the matrix.
            ("GAPPY", "2023-10-02", dec!(10)),
        ]);

        let matrix = CorrelationEngine::new()
            .correlation_matrix(&series, None)
            .unwrap();
        assert_eq!(matrix.tickers(), &["ACME".to_string(), "BOLT".to_string()]);
    }

    #[test]
    fn fewer_than_two_survivors_is_insufficient_data() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("GAPPY", "2023-10-02", dec!(10)),
        ]);

        let result = CorrelationEngine::new().correlation_matrix(&series, None);
        assert!(matches!(result, Err(AnalyticsError::NotEnoughData(_))));
    }

    #[test]
    fn zero_variance_pairs_are_undefined() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("FLAT", "2023-10-02", dec!(50)),
            ("FLAT", "2023-10-03", dec!(50)),
        ]);

        let matrix = CorrelationEngine::new()
            .correlation_matrix(&series, None)
            .unwrap();
        assert_eq!(matrix.get(0, 1), None);
        // The diagonal stays defined even for the flat ticker.
        assert_eq!(matrix.get(1, 1), Some(Decimal::ONE));
    }

    #[test]
    fn ticker_subset_restricts_the_pivot() {
        let series = series(vec![
            ("ACME", "2023-10-02", dec!(100)),
            ("ACME", "2023-10-03", dec!(110)),
            ("BOLT", "2023-10-02", dec!(50)),
            ("BOLT", "2023-10-03", dec!(52)),
            ("CORE", "2023-10-02", dec!(10)),
            ("CORE", "2023-10-03", dec!(12)),
        ]);

        let wanted = vec!["ACME".to_string(), "CORE".to_string()];
        let matrix = CorrelationEngine::new()
            .correlation_matrix(&series, Some(&wanted))
            .unwrap();
        assert_eq!(matrix.tickers(), &["ACME".to_string(), "CORE".to_string()]);
    }
}
