use chrono::NaiveDate;
use core_types::{PriceObservation, PriceSeries};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::source::RawPriceRecord;

/// Coerces raw rows into the cleaned, grouped [`PriceSeries`].
///
/// Coercion failures on `open`, `high`, `low`, or `volume` degrade the field
/// to missing; a row that has no usable ticker, date, or close is dropped
/// and counted. Sorting by (ticker, date) and first-wins de-duplication
/// happen inside the series constructor, so callers may feed rows in any
/// order.
pub fn clean(records: Vec<RawPriceRecord>) -> PriceSeries {
    let total = records.len();
    let mut rows = Vec::with_capacity(total);
    let mut dropped = 0usize;

    for record in records {
        let ticker = record
            .ticker
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let date = record.date.as_deref().and_then(parse_date);
        let close = record.close.as_deref().and_then(parse_decimal);

        let (Some(ticker), Some(date), Some(close)) = (ticker, date, close) else {
            dropped += 1;
            continue;
        };

        rows.push((
            ticker.to_string(),
            PriceObservation {
                date,
                open: record.open.as_deref().and_then(parse_decimal),
                high: record.high.as_deref().and_then(parse_decimal),
                low: record.low.as_deref().and_then(parse_decimal),
                close,
                volume: record.volume.as_deref().and_then(parse_volume),
            },
        ));
    }

    if dropped > 0 {
        tracing::warn!(
            dropped,
            total,
            "dropped rows without a usable ticker, date, or close"
        );
    }

    let series = PriceSeries::from_rows(rows);
    tracing::info!(
        tickers = series.ticker_count(),
        observations = series.observation_count(),
        "cleaned price series ready"
    );
    series
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Volumes arrive as arbitrary numerics; anything fractional is truncated
/// and anything negative is treated as missing.
fn parse_volume(raw: &str) -> Option<u64> {
    let value = parse_decimal(raw)?;
    if value.is_sign_negative() {
        return None;
    }
    value.trunc().to_u64()
}
