use std::path::Path;

use core_types::SectorMap;
use serde::Deserialize;

use crate::error::IngestError;

/// One row of the sector-classification CSV.
#[derive(Debug, Deserialize)]
struct SectorRow {
    #[serde(rename = "Symbol", default)]
    symbol: Option<String>,
    #[serde(default)]
    sector: Option<String>,
}

/// Loads the ticker → sector mapping from a CSV with `Symbol` and `sector`
/// columns.
///
/// Symbols arrive prefixed with their exchange (`"NSE: INFY"`); the prefix
/// is stripped here so the mapping joins directly against tickers. Rows
/// without both fields are skipped.
pub fn load_sector_map(path: &Path) -> Result<SectorMap, IngestError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| IngestError::Csv(path.display().to_string(), e))?;

    let mut map = SectorMap::new();
    for row in reader.deserialize::<SectorRow>() {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable sector row");
                continue;
            }
        };
        let (Some(symbol), Some(sector)) = (row.symbol, row.sector) else {
            continue;
        };
        let ticker = strip_exchange_prefix(&symbol);
        if ticker.is_empty() || sector.trim().is_empty() {
            continue;
        }
        map.insert(ticker.to_string(), sector.trim().to_string());
    }

    tracing::debug!(tickers = map.len(), "sector map loaded");
    Ok(map)
}

/// `"NSE: INFY"` → `"INFY"`; symbols without a prefix pass through.
fn strip_exchange_prefix(symbol: &str) -> &str {
    symbol.rsplit(": ").next().unwrap_or(symbol).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_the_exchange_prefix() {
        assert_eq!(strip_exchange_prefix("NSE: INFY"), "INFY");
        assert_eq!(strip_exchange_prefix("INFY"), "INFY");
    }

    #[test]
    fn loads_and_normalizes_symbols() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Symbol,sector").unwrap();
        writeln!(file, "NSE: INFY,Information Technology").unwrap();
        writeln!(file, "ACME,Energy").unwrap();
        writeln!(file, ",Orphaned").unwrap();
        file.flush().unwrap();

        let map = load_sector_map(file.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.sector_of("INFY"), Some("Information Technology"));
        assert_eq!(map.sector_of("ACME"), Some("Energy"));
    }
}
