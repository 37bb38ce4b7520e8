use core_types::{Classification, PriceSeries};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::returns::TickerPerformance;

/// Headline numbers for the currently selected slice of the market.
///
/// Green/red counts cover the tickers with a defined yearly return; the
/// averages cover every observation in scope. The averages are `None` for an
/// empty selection rather than pretending to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub green_tickers: usize,
    pub red_tickers: usize,
    pub avg_close: Option<Decimal>,
    pub avg_volume: Option<Decimal>,
}

impl MarketSummary {
    pub fn compute(series: &PriceSeries, performances: &[TickerPerformance]) -> Self {
        let mut green_tickers = 0;
        let mut red_tickers = 0;
        for performance in performances {
            match performance.yearly_return.map(Classification::from_return) {
                Some(Classification::Green) => green_tickers += 1,
                Some(Classification::Red) => red_tickers += 1,
                // An undefined return is neither green nor red.
                None => {}
            }
        }

        let mut close_sum = Decimal::ZERO;
        let mut close_count: u64 = 0;
        let mut volume_sum = Decimal::ZERO;
        let mut volume_count: u64 = 0;
        for (_, observation) in series.observations() {
            close_sum += observation.close;
            close_count += 1;
            if let Some(volume) = observation.volume {
                volume_sum += Decimal::from(volume);
                volume_count += 1;
            }
        }

        Self {
            green_tickers,
            red_tickers,
            avg_close: (close_count > 0).then(|| close_sum / Decimal::from(close_count)),
            avg_volume: (volume_count > 0).then(|| volume_sum / Decimal::from(volume_count)),
        }
    }
}
