use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single cleaned daily price bar.
///
/// `date` and `close` are always present: the ingestion boundary drops any
/// row missing either before it reaches this type. The remaining fields hold
/// `None` where the raw source failed numeric coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub volume: Option<u64>,
}

/// The cleaned, ticker-grouped daily price table that every analytic reads.
///
/// Groups are keyed by ticker; each group is sorted ascending by date and
/// holds exactly one observation per date. Construction enforces both, so
/// consumers never depend on the order rows arrived in. Groups are never
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    groups: BTreeMap<String, Vec<PriceObservation>>,
}

impl PriceSeries {
    /// Builds a series from `(ticker, observation)` rows in any order.
    ///
    /// Rows are grouped by ticker, sorted by date, and de-duplicated on
    /// (ticker, date) keeping the first occurrence.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, PriceObservation)>) -> Self {
        let mut groups: BTreeMap<String, Vec<PriceObservation>> = BTreeMap::new();
        for (ticker, observation) in rows {
            groups.entry(ticker).or_default().push(observation);
        }
        for observations in groups.values_mut() {
            // Stable sort, so of two bars on the same date the one loaded
            // first survives the dedup below.
            observations.sort_by_key(|o| o.date);
            observations.dedup_by_key(|o| o.date);
        }
        Self { groups }
    }

    /// Iterates groups as `(ticker, observations)`, tickers in ascending
    /// order and observations in date order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[PriceObservation])> {
        self.groups
            .iter()
            .map(|(ticker, observations)| (ticker.as_str(), observations.as_slice()))
    }

    /// Flat iteration over every observation, grouped by ticker and ordered
    /// by date within each group.
    pub fn observations(&self) -> impl Iterator<Item = (&str, &PriceObservation)> {
        self.groups()
            .flat_map(|(ticker, observations)| observations.iter().map(move |o| (ticker, o)))
    }

    /// The observations of one ticker, if present.
    pub fn get(&self, ticker: &str) -> Option<&[PriceObservation]> {
        self.groups.get(ticker).map(Vec::as_slice)
    }

    /// All tickers in ascending order.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn ticker_count(&self) -> usize {
        self.groups.len()
    }

    pub fn observation_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The earliest and latest date across all tickers, or `None` for an
    /// empty series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self
            .groups
            .values()
            .filter_map(|observations| observations.first())
            .map(|o| o.date)
            .min()?;
        let last = self
            .groups
            .values()
            .filter_map(|observations| observations.last())
            .map(|o| o.date)
            .max()?;
        Some((first, last))
    }

    /// A new series containing only the observations the filter admits.
    /// Tickers left with no observations are dropped entirely.
    pub fn filter(&self, filter: &SeriesFilter) -> PriceSeries {
        let groups = self
            .groups
            .iter()
            .filter(|(ticker, _)| filter.admits_ticker(ticker))
            .filter_map(|(ticker, observations)| {
                let kept: Vec<PriceObservation> = observations
                    .iter()
                    .filter(|o| filter.admits_date(o.date))
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some((ticker.clone(), kept))
                }
            })
            .collect();
        // Filtering preserves per-group ordering and uniqueness, so the
        // groups can be adopted directly.
        PriceSeries { groups }
    }
}

/// A selection over a [`PriceSeries`]: an optional ticker set and an
/// optional inclusive date range. An empty filter admits everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesFilter {
    pub tickers: Option<BTreeSet<String>>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SeriesFilter {
    fn admits_ticker(&self, ticker: &str) -> bool {
        self.tickers
            .as_ref()
            .is_none_or(|tickers| tickers.contains(ticker))
    }

    fn admits_date(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// A calendar month, the bucketing key for monthly returns.
///
/// Deliberately a plain (year, month) pair with total ordering rather than
/// anything calendar-library specific.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Creates a key, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidInput(
                "month".to_string(),
                format!("{month} is not a calendar month"),
            ));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The many-to-one ticker → sector classification used for sector-level
/// aggregation. Tickers absent from the map simply have no sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorMap {
    entries: BTreeMap<String, String>,
}

impl SectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: String, sector: String) {
        self.entries.insert(ticker, sector);
    }

    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.entries.get(ticker).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(ticker, sector)| (ticker.as_str(), sector.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for SectorMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn construction_sorts_and_dedups() {
        let series = PriceSeries::from_rows(vec![
            ("ACME".to_string(), obs("2023-10-03", dec!(102))),
            ("ACME".to_string(), obs("2023-10-02", dec!(100))),
            ("ACME".to_string(), obs("2023-10-03", dec!(999))),
        ]);

        let acme = series.get("ACME").unwrap();
        assert_eq!(acme.len(), 2);
        assert_eq!(acme[0].date, "2023-10-02".parse().unwrap());
        // The duplicate loaded first wins.
        assert_eq!(acme[1].close, dec!(102));
    }

    #[test]
    fn filter_by_ticker_and_date() {
        let series = PriceSeries::from_rows(vec![
            ("ACME".to_string(), obs("2023-10-02", dec!(100))),
            ("ACME".to_string(), obs("2023-11-02", dec!(110))),
            ("BOLT".to_string(), obs("2023-10-02", dec!(50))),
        ]);

        let filter = SeriesFilter {
            tickers: Some(["ACME".to_string()].into_iter().collect()),
            start: None,
            end: Some("2023-10-31".parse().unwrap()),
        };
        let filtered = series.filter(&filter);

        assert_eq!(filtered.ticker_count(), 1);
        assert_eq!(filtered.observation_count(), 1);
        assert_eq!(filtered.get("ACME").unwrap()[0].close, dec!(100));
    }

    #[test]
    fn filter_drops_emptied_tickers() {
        let series = PriceSeries::from_rows(vec![(
            "ACME".to_string(),
            obs("2023-10-02", dec!(100)),
        )]);

        let filter = SeriesFilter {
            tickers: None,
            start: Some("2024-01-01".parse().unwrap()),
            end: None,
        };
        assert!(series.filter(&filter).is_empty());
    }

    #[test]
    fn date_range_spans_all_tickers() {
        let series = PriceSeries::from_rows(vec![
            ("ACME".to_string(), obs("2023-10-02", dec!(100))),
            ("BOLT".to_string(), obs("2023-12-29", dec!(50))),
        ]);

        assert_eq!(
            series.date_range(),
            Some((
                "2023-10-02".parse().unwrap(),
                "2023-12-29".parse().unwrap()
            ))
        );
    }

    #[test]
    fn month_key_ordering_and_display() {
        let october = MonthKey::new(2023, 10).unwrap();
        let november = MonthKey::new(2023, 11).unwrap();
        assert!(october < november);
        assert_eq!(october.to_string(), "2023-10");
        assert!(MonthKey::new(2023, 13).is_err());
    }
}
