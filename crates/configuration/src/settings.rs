use std::path::PathBuf;

use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data: DataPaths,
    pub report: ReportSettings,
}

/// Where the pipeline finds its inputs and writes its outputs.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Directory of month folders holding the raw YAML price records.
    pub yaml_dir: PathBuf,
    /// Directory of per-ticker CSV files (one file per symbol).
    pub csv_dir: PathBuf,
    /// The consolidated, cleaned master CSV.
    pub master_csv: PathBuf,
    /// CSV mapping exchange-prefixed symbols to sectors.
    pub sector_map: PathBuf,
}

/// Knobs for the rendered report.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    /// How many rows the top/bottom performance tables show.
    pub top_n: usize,
    /// How many gainers and losers to list for each month.
    pub movers_per_month: usize,
}
