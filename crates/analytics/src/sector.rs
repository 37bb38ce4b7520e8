use std::collections::BTreeMap;

use core_types::SectorMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ranking;
use crate::returns::TickerPerformance;

/// Mean yearly return (×100 percentage) of the tickers mapped to one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector: String,
    pub avg_yearly_return: Option<Decimal>,
}

/// Joins per-ticker performance to a sector classification and averages
/// within each sector.
#[derive(Debug, Default)]
pub struct SectorAggregator {}

impl SectorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average yearly return per sector, best sector first.
    ///
    /// Tickers absent from the map are dropped from the aggregation; that is
    /// a data-quality gap in the mapping, not an error, and it never affects
    /// the averages of the sectors that are mapped. An empty result is valid
    /// output.
    pub fn sector_performance(
        &self,
        performances: &[TickerPerformance],
        sector_map: &SectorMap,
    ) -> Vec<SectorPerformance> {
        let mut by_sector: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
        for performance in performances {
            let Some(sector) = sector_map.sector_of(&performance.ticker) else {
                tracing::debug!(
                    ticker = %performance.ticker,
                    "ticker has no sector mapping, dropped from aggregation"
                );
                continue;
            };
            let returns = by_sector.entry(sector).or_default();
            if let Some(yearly_return) = performance.yearly_return {
                returns.push(yearly_return);
            }
        }

        let mut rows: Vec<SectorPerformance> = by_sector
            .into_iter()
            .map(|(sector, returns)| SectorPerformance {
                sector: sector.to_string(),
                avg_yearly_return: mean(&returns),
            })
            .collect();
        rows.sort_by(|a, b| ranking::compare_metric(a.avg_yearly_return, b.avg_yearly_return, false));
        rows
    }
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
}
