use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::IngestError;

/// One untrusted row from a price source, before coercion.
///
/// Every field is optional: sources differ in completeness and nothing is
/// validated until the cleaning pass. Numeric fields stay strings here so a
/// malformed value can degrade to "missing" instead of failing the row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPriceRecord {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub high: Option<String>,
    #[serde(default)]
    pub low: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
}

/// A provider of raw, uncleaned price rows.
///
/// The file-based sources live in this module; alternate backends (a
/// relational warehouse, an HTTP feed) implement the same contract and drop
/// into the pipeline unchanged. Row-level problems become missing fields for
/// the cleaning pass to handle; only I/O failures surface as errors.
pub trait PriceSource {
    fn load(&self) -> Result<Vec<RawPriceRecord>, IngestError>;
}

// ==============================================================================
// Consolidated master CSV
// ==============================================================================

/// Reads the consolidated master CSV: one file, a `ticker` column on every
/// row.
#[derive(Debug, Clone)]
pub struct MasterCsvSource {
    path: PathBuf,
}

impl MasterCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for MasterCsvSource {
    fn load(&self) -> Result<Vec<RawPriceRecord>, IngestError> {
        read_csv_rows(&self.path, None)
    }
}

// ==============================================================================
// Per-ticker CSV directory
// ==============================================================================

/// Reads a directory of per-ticker CSV files; the ticker is the file stem,
/// not a column.
#[derive(Debug, Clone)]
pub struct TickerCsvDirSource {
    dir: PathBuf,
}

impl TickerCsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The CSV files this source would read, sorted for deterministic loads.
    pub fn files(&self) -> Result<Vec<PathBuf>, IngestError> {
        files_with_extension(&self.dir, &["csv"])
    }

    /// Reads one per-ticker file, stamping every row with the file's ticker.
    pub fn load_file(&self, path: &Path) -> Result<Vec<RawPriceRecord>, IngestError> {
        let ticker = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        read_csv_rows(path, ticker)
    }
}

impl PriceSource for TickerCsvDirSource {
    fn load(&self) -> Result<Vec<RawPriceRecord>, IngestError> {
        let mut records = Vec::new();
        for file in self.files()? {
            records.extend(self.load_file(&file)?);
        }
        Ok(records)
    }
}

// ==============================================================================
// YAML tree (monthly folders of raw records)
// ==============================================================================

/// Reads the raw YAML layout: a directory of month folders, each holding
/// YAML files that contain a list of records keyed `Ticker`, `date`, `open`,
/// `high`, `low`, `close`, `volume`.
#[derive(Debug, Clone)]
pub struct YamlTreeSource {
    dir: PathBuf,
}

impl YamlTreeSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Every YAML file across all month folders, sorted for deterministic
    /// loads.
    pub fn files(&self) -> Result<Vec<PathBuf>, IngestError> {
        let mut files = Vec::new();
        for entry in read_dir_sorted(&self.dir)? {
            if entry.is_dir() {
                files.extend(files_with_extension(&entry, &["yaml", "yml"])?);
            }
        }
        Ok(files)
    }

    /// Parses one YAML file into raw rows.
    ///
    /// A file that fails to parse is skipped with a warning so one corrupt
    /// upload cannot sink the whole batch.
    pub fn load_file(&self, path: &Path) -> Result<Vec<RawPriceRecord>, IngestError> {
        let text = fs::read_to_string(path)
            .map_err(|e| IngestError::Io(path.display().to_string(), e))?;
        let entries: Vec<BTreeMap<String, serde_yaml::Value>> =
            match serde_yaml::from_str(&text) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unparseable YAML file");
                    return Ok(Vec::new());
                }
            };

        Ok(entries
            .iter()
            .map(|entry| RawPriceRecord {
                ticker: scalar_to_string(entry.get("Ticker")),
                date: scalar_to_string(entry.get("date")),
                open: scalar_to_string(entry.get("open")),
                high: scalar_to_string(entry.get("high")),
                low: scalar_to_string(entry.get("low")),
                close: scalar_to_string(entry.get("close")),
                volume: scalar_to_string(entry.get("volume")),
            })
            .collect())
    }
}

impl PriceSource for YamlTreeSource {
    fn load(&self) -> Result<Vec<RawPriceRecord>, IngestError> {
        let mut records = Vec::new();
        for file in self.files()? {
            records.extend(self.load_file(&file)?);
        }
        Ok(records)
    }
}

// ==============================================================================
// Shared helpers
// ==============================================================================

/// Reads a CSV of price rows, overriding the ticker column when the caller
/// supplies one (per-ticker files carry the ticker in the file name).
fn read_csv_rows(
    path: &Path,
    ticker_override: Option<String>,
) -> Result<Vec<RawPriceRecord>, IngestError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| IngestError::Csv(path.display().to_string(), e))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<RawPriceRecord>() {
        match row {
            Ok(mut record) => {
                if ticker_override.is_some() {
                    record.ticker = ticker_override.clone();
                }
                records.push(record);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable CSV row");
            }
        }
    }
    Ok(records)
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let entries = fs::read_dir(dir).map_err(|e| IngestError::Io(dir.display().to_string(), e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::Io(dir.display().to_string(), e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn files_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, IngestError> {
    Ok(read_dir_sorted(dir)?
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e))
        })
        .collect())
}

/// Reduces a YAML scalar to its textual form; non-scalar or empty values
/// become missing.
fn scalar_to_string(value: Option<&serde_yaml::Value>) -> Option<String> {
    match value? {
        serde_yaml::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
