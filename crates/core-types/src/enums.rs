use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The green/red bucket a ticker falls into based on its return over the
/// selected date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Green,
    Red,
}

impl Classification {
    /// Classifies a percentage return. Strictly positive is green; zero and
    /// below is red.
    pub fn from_return(yearly_return: Decimal) -> Self {
        if yearly_return > Decimal::ZERO {
            Classification::Green
        } else {
            Classification::Red
        }
    }
}
