use std::path::Path;

use analytics::CorrelationMatrix;
use chrono::NaiveDate;
use core_types::PriceSeries;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ExportError;
use crate::tables::AnalyticsRow;

/// One row of the cleaned master price table.
#[derive(Debug, Serialize)]
struct MasterRow<'a> {
    ticker: &'a str,
    date: NaiveDate,
    open: Option<Decimal>,
    high: Option<Decimal>,
    low: Option<Decimal>,
    close: Decimal,
    volume: Option<u64>,
}

/// Writes the cleaned series as the canonical
/// `ticker,date,open,high,low,close,volume` CSV.
pub fn write_master_csv(path: &Path, series: &PriceSeries) -> Result<(), ExportError> {
    let mut writer = csv_writer(path)?;
    for (ticker, observation) in series.observations() {
        writer
            .serialize(MasterRow {
                ticker,
                date: observation.date,
                open: observation.open,
                high: observation.high,
                low: observation.low,
                close: observation.close,
                volume: observation.volume,
            })
            .map_err(|e| ExportError::Csv(path.display().to_string(), e))?;
    }
    finish(writer, path)?;
    tracing::info!(
        path = %path.display(),
        observations = series.observation_count(),
        "master CSV written"
    );
    Ok(())
}

/// Writes the flat per-observation analytics table.
pub fn write_analytics_csv(path: &Path, rows: &[AnalyticsRow]) -> Result<(), ExportError> {
    let mut writer = csv_writer(path)?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ExportError::Csv(path.display().to_string(), e))?;
    }
    finish(writer, path)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "analytics CSV written");
    Ok(())
}

/// Writes the correlation matrix with ticker row and column headers.
/// Undefined coefficients become empty cells.
pub fn write_correlation_csv(path: &Path, matrix: &CorrelationMatrix) -> Result<(), ExportError> {
    let mut writer = csv_writer(path)?;

    let mut header = vec![String::new()];
    header.extend(matrix.tickers().iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| ExportError::Csv(path.display().to_string(), e))?;

    for (ticker, cells) in matrix.rows() {
        let mut record = vec![ticker.to_string()];
        record.extend(
            cells
                .iter()
                .map(|cell| cell.map(|value| value.to_string()).unwrap_or_default()),
        );
        writer
            .write_record(&record)
            .map_err(|e| ExportError::Csv(path.display().to_string(), e))?;
    }
    finish(writer, path)?;
    tracing::info!(path = %path.display(), tickers = matrix.len(), "correlation CSV written");
    Ok(())
}

fn csv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>, ExportError> {
    csv::Writer::from_path(path).map_err(|e| ExportError::Csv(path.display().to_string(), e))
}

fn finish(mut writer: csv::Writer<std::fs::File>, path: &Path) -> Result<(), ExportError> {
    writer
        .flush()
        .map_err(|e| ExportError::Io(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::CorrelationEngine;
    use core_types::{PriceObservation, SectorMap};
    use ingestion::{MasterCsvSource, PriceSource, clean};
    use rust_decimal_macros::dec;

    fn obs(date: &str, close: Decimal) -> PriceObservation {
        PriceObservation {
            date: date.parse().unwrap(),
            open: None,
            high: None,
            low: None,
            close,
            volume: Some(500),
        }
    }

    #[test]
    fn master_csv_round_trips_through_the_master_source() {
        let series = PriceSeries::from_rows(vec![
            ("ACME".to_string(), obs("2023-10-02", dec!(100))),
            ("ACME".to_string(), obs("2023-10-03", dec!(110))),
            ("BOLT".to_string(), obs("2023-10-02", dec!(50))),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");
        write_master_csv(&path, &series).unwrap();

        let reloaded = clean(MasterCsvSource::new(&path).load().unwrap());
        assert_eq!(reloaded, series);
    }

    #[test]
    fn analytics_csv_has_empty_cells_for_missing_values() {
        let series = PriceSeries::from_rows(vec![(
            "LONE".to_string(),
            obs("2023-10-02", dec!(10)),
        )]);
        let rows = crate::tables::build_analytics_rows(&series, &SectorMap::new());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.csv");
        write_analytics_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ticker,date,open,high,low,close,volume,sector,daily_return,\
             cumulative_return,yearly_return,volatility,month,monthly_return"
        );
        // open/high/low, sector, yearly return and volatility are all empty.
        assert_eq!(
            lines.next().unwrap(),
            "LONE,2023-10-02,,,,10,500,,0,0,,,2023-10,0"
        );
    }

    #[test]
    fn correlation_csv_is_labelled_on_both_axes() {
        let series = PriceSeries::from_rows(vec![
            ("ACME".to_string(), obs("2023-10-02", dec!(100))),
            ("ACME".to_string(), obs("2023-10-03", dec!(110))),
            ("BOLT".to_string(), obs("2023-10-02", dec!(50))),
            ("BOLT".to_string(), obs("2023-10-03", dec!(52))),
        ]);
        let matrix = CorrelationEngine::new()
            .correlation_matrix(&series, None)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("correlation.csv");
        write_correlation_csv(&path, &matrix).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), ",ACME,BOLT");
        assert!(lines.next().unwrap().starts_with("ACME,1,"));
    }
}
