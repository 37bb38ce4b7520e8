use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use analytics::{
    AnalyticsError, CorrelationEngine, MarketSummary, PeriodGrouper, ReturnCalculator,
    SectorAggregator, TickerPerformance, VolatilityCalculator, ranking,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use configuration::Settings;
use core_types::{PriceSeries, SectorMap, SeriesFilter};
use indicatif::{ProgressBar, ProgressStyle};
use ingestion::{
    IngestError, MasterCsvSource, PriceSource, RawPriceRecord, TickerCsvDirSource, YamlTreeSource,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Vantage analytics application.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = match configuration::load_config() {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("Error loading configuration: {error}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Consolidate(args) => handle_consolidate(args, &settings),
        Commands::Report(args) => handle_report(args, &settings),
        Commands::Export(args) => handle_export(args, &settings),
    };

    if let Err(error) = result {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Batch analytics over per-ticker daily price data.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate raw YAML or per-ticker CSV data into the cleaned master CSV.
    Consolidate(ConsolidateArgs),
    /// Compute every analytics view and render it as terminal tables.
    Report(ReportArgs),
    /// Write the flat analytics table and correlation matrix for BI tools.
    Export(ExportArgs),
}

#[derive(Parser)]
struct ConsolidateArgs {
    /// The directory holding the raw input data.
    #[arg(long)]
    input: Option<PathBuf>,

    /// The layout of the input directory.
    #[arg(long, value_enum, default_value = "yaml")]
    format: InputFormat,

    /// Where to write the cleaned master CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Month folders of raw YAML record files.
    Yaml,
    /// A flat directory of per-ticker CSV files.
    Csv,
}

#[derive(Parser)]
struct ReportArgs {
    /// The cleaned master CSV to analyze.
    #[arg(long)]
    master: Option<PathBuf>,

    /// The sector classification CSV.
    #[arg(long)]
    sector_map: Option<PathBuf>,

    /// Only analyze dates on or after this day (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only analyze dates on or before this day (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Restrict the analysis to these tickers (comma separated).
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// How many rows the top/bottom tables show.
    #[arg(long)]
    top_n: Option<usize>,

    /// How many gainers and losers to list per month.
    #[arg(long)]
    movers: Option<usize>,
}

#[derive(Parser)]
struct ExportArgs {
    /// The cleaned master CSV to analyze.
    #[arg(long)]
    master: Option<PathBuf>,

    /// The sector classification CSV.
    #[arg(long)]
    sector_map: Option<PathBuf>,

    /// Where to write the flat analytics table.
    #[arg(long, default_value = "analytics.csv")]
    analytics_out: PathBuf,

    /// Where to write the correlation matrix.
    #[arg(long, default_value = "correlation.csv")]
    correlation_out: PathBuf,
}

// ==============================================================================
// Consolidate
// ==============================================================================

fn handle_consolidate(args: ConsolidateArgs, settings: &Settings) -> anyhow::Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| settings.data.master_csv.clone());

    let records = match args.format {
        InputFormat::Yaml => {
            let source =
                YamlTreeSource::new(args.input.unwrap_or_else(|| settings.data.yaml_dir.clone()));
            load_with_progress(source.files()?, |file| source.load_file(file))?
        }
        InputFormat::Csv => {
            let source = TickerCsvDirSource::new(
                args.input.unwrap_or_else(|| settings.data.csv_dir.clone()),
            );
            load_with_progress(source.files()?, |file| source.load_file(file))?
        }
    };

    let series = ingestion::clean(records);
    if series.is_empty() {
        println!("No usable price rows found in the input; nothing to write.");
        return Ok(());
    }

    export::write_master_csv(&output, &series)
        .with_context(|| format!("writing master CSV to {}", output.display()))?;
    println!(
        "Consolidated {} observations across {} tickers into {}",
        series.observation_count(),
        series.ticker_count(),
        output.display()
    );
    Ok(())
}

/// Loads every input file behind a progress bar.
fn load_with_progress<F>(files: Vec<PathBuf>, load: F) -> anyhow::Result<Vec<RawPriceRecord>>
where
    F: Fn(&Path) -> Result<Vec<RawPriceRecord>, IngestError>,
{
    let progress_bar = ProgressBar::new(files.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut records = Vec::new();
    for file in &files {
        if let Some(name) = file.file_name() {
            progress_bar.set_message(format!("Reading {}...", name.to_string_lossy()));
        }
        records.extend(load(file)?);
        progress_bar.inc(1);
    }
    progress_bar.finish_with_message(format!("Read {} files", files.len()));
    Ok(records)
}

// ==============================================================================
// Report
// ==============================================================================

fn handle_report(args: ReportArgs, settings: &Settings) -> anyhow::Result<()> {
    let master = args
        .master
        .unwrap_or_else(|| settings.data.master_csv.clone());
    let sector_path = args
        .sector_map
        .unwrap_or_else(|| settings.data.sector_map.clone());
    let top_n = args.top_n.unwrap_or(settings.report.top_n);
    let movers_per_month = args.movers.unwrap_or(settings.report.movers_per_month);

    let records = MasterCsvSource::new(&master)
        .load()
        .with_context(|| format!("loading master CSV {}", master.display()))?;
    let full_series = ingestion::clean(records);

    let filter = SeriesFilter {
        tickers: (!args.tickers.is_empty())
            .then(|| args.tickers.iter().cloned().collect::<BTreeSet<_>>()),
        start: args.from,
        end: args.to,
    };
    let series = full_series.filter(&filter);
    if series.is_empty() {
        println!("No data matches the current filters. Try widening the date range or ticker list.");
        return Ok(());
    }
    tracing::debug!(
        tickers = series.ticker_count(),
        observations = series.observation_count(),
        "filters applied"
    );

    let sectors = ingestion::load_sector_map(&sector_path)
        .with_context(|| format!("loading sector map {}", sector_path.display()))?;

    // Every view below recomputes from the filtered series; there is no
    // cached state to invalidate when the filters change.
    let performances = ReturnCalculator::new().yearly_returns(&series);

    render_summary(&MarketSummary::compute(&series, &performances));
    render_performers(&performances, top_n);
    render_cumulative_growth(&series, &performances, top_n);
    render_volatility(&series, top_n);
    render_sectors(&performances, &sectors);
    render_correlation(&series);
    render_monthly_movers(&series, movers_per_month);

    Ok(())
}

fn render_summary(summary: &MarketSummary) {
    let mut table = new_table(vec!["Green Tickers", "Red Tickers", "Avg Close", "Avg Volume"]);
    table.add_row(vec![
        summary.green_tickers.to_string(),
        summary.red_tickers.to_string(),
        format_metric(summary.avg_close, 2),
        format_metric(summary.avg_volume, 0),
    ]);
    print_section("Market Summary", &table);
}

fn render_performers(performances: &[TickerPerformance], top_n: usize) {
    if performances.is_empty() {
        println!("\nNo ticker has enough observations for a yearly return.");
        return;
    }

    let key = |p: &TickerPerformance| p.yearly_return;
    for (title, rows) in [
        (
            format!("Top {top_n} Performers (Yearly Return)"),
            ranking::top_n(performances, key, top_n, false),
        ),
        (
            format!("Bottom {top_n} Performers (Yearly Return)"),
            ranking::bottom_n(performances, key, top_n),
        ),
    ] {
        let mut table = new_table(vec!["Ticker", "Yearly Return (%)", "First Close", "Last Close"]);
        for row in rows {
            table.add_row(vec![
                row.ticker.clone(),
                format_metric(row.yearly_return, 2),
                row.first_close.to_string(),
                row.last_close.to_string(),
            ]);
        }
        print_section(&title, &table);
    }
}

fn render_cumulative_growth(
    series: &PriceSeries,
    performances: &[TickerPerformance],
    top_n: usize,
) {
    let top = ranking::top_n(performances, |p| p.yearly_return, top_n, false);
    if top.is_empty() {
        return;
    }

    // The compounded series ends, per ticker, at its final cumulative value.
    let mut final_growth: BTreeMap<String, Option<Decimal>> = BTreeMap::new();
    for point in ReturnCalculator::new().cumulative_returns(series) {
        final_growth.insert(point.ticker, point.cumulative_return);
    }

    let mut table = new_table(vec!["Ticker", "Cumulative Return"]);
    for row in top {
        let growth = final_growth.get(&row.ticker).copied().flatten();
        table.add_row(vec![row.ticker.clone(), format_metric(growth, 4)]);
    }
    print_section("Compounded Growth of Top Performers", &table);
}

fn render_volatility(series: &PriceSeries, top_n: usize) {
    let rows = VolatilityCalculator::new().volatility(series);
    let mut table = new_table(vec!["Ticker", "Volatility (Std Dev)"]);
    for row in rows.iter().take(top_n) {
        table.add_row(vec![row.ticker.clone(), format_metric(row.volatility, 4)]);
    }
    print_section("Most Volatile Tickers", &table);
}

fn render_sectors(performances: &[TickerPerformance], sectors: &SectorMap) {
    let rows = SectorAggregator::new().sector_performance(performances, sectors);
    if rows.is_empty() {
        println!("\nNo sector data to display for this selection.");
        return;
    }

    let mut table = new_table(vec!["Sector", "Avg Yearly Return (%)"]);
    for row in rows {
        table.add_row(vec![row.sector, format_metric(row.avg_yearly_return, 2)]);
    }
    print_section("Average Yearly Return by Sector", &table);
}

fn render_correlation(series: &PriceSeries) {
    match CorrelationEngine::new().correlation_matrix(series, None) {
        Ok(matrix) => {
            let mut header = vec![String::new()];
            header.extend(matrix.tickers().iter().cloned());
            let mut table = new_table(header.iter().map(String::as_str).collect());
            for (ticker, cells) in matrix.rows() {
                let mut record = vec![ticker.to_string()];
                record.extend(cells.iter().map(|cell| format_metric(*cell, 4)));
                table.add_row(record);
            }
            print_section("Closing Price Correlation", &table);
        }
        Err(AnalyticsError::NotEnoughData(_)) => {
            println!(
                "\nNeed at least two tickers with full date coverage for the correlation matrix."
            );
        }
    }
}

fn render_monthly_movers(series: &PriceSeries, movers_per_month: usize) {
    let movers = PeriodGrouper::new().monthly_movers(series, movers_per_month);
    if movers.is_empty() {
        println!("\nNo monthly data to display for this selection.");
        return;
    }

    for (month, month_movers) in movers {
        for (label, rows) in [
            ("Top Gainers", &month_movers.gainers),
            ("Top Losers", &month_movers.losers),
        ] {
            let mut table = new_table(vec!["Ticker", "Monthly Return (%)"]);
            for row in rows {
                table.add_row(vec![row.ticker.clone(), format_metric(row.monthly_return, 2)]);
            }
            print_section(&format!("{month} {label}"), &table);
        }
    }
}

// ==============================================================================
// Export
// ==============================================================================

fn handle_export(args: ExportArgs, settings: &Settings) -> anyhow::Result<()> {
    let master = args
        .master
        .unwrap_or_else(|| settings.data.master_csv.clone());
    let sector_path = args
        .sector_map
        .unwrap_or_else(|| settings.data.sector_map.clone());

    let records = MasterCsvSource::new(&master)
        .load()
        .with_context(|| format!("loading master CSV {}", master.display()))?;
    let series = ingestion::clean(records);
    if series.is_empty() {
        println!("No usable price rows in {}; nothing to export.", master.display());
        return Ok(());
    }

    let sectors = ingestion::load_sector_map(&sector_path)
        .with_context(|| format!("loading sector map {}", sector_path.display()))?;

    let rows = export::build_analytics_rows(&series, &sectors);
    export::write_analytics_csv(&args.analytics_out, &rows)
        .with_context(|| format!("writing {}", args.analytics_out.display()))?;
    println!("Analytics table ready: {}", args.analytics_out.display());

    match CorrelationEngine::new().correlation_matrix(&series, None) {
        Ok(matrix) => {
            export::write_correlation_csv(&args.correlation_out, &matrix)
                .with_context(|| format!("writing {}", args.correlation_out.display()))?;
            println!("Correlation matrix ready: {}", args.correlation_out.display());
        }
        Err(AnalyticsError::NotEnoughData(reason)) => {
            println!("Skipping correlation matrix: {reason}");
        }
    }

    Ok(())
}

// ==============================================================================
// Rendering helpers
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn print_section(title: &str, table: &Table) {
    println!("\n{title}");
    println!("{table}");
}

/// Rounds a metric for display; undefined values render as "-".
fn format_metric(value: Option<Decimal>, decimal_places: u32) -> String {
    value
        .map(|v| v.round_dp(decimal_places).to_string())
        .unwrap_or_else(|| "-".to_string())
}
