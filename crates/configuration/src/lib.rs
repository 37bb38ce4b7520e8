// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{DataPaths, ReportSettings, Settings};

/// Loads the application configuration from the `config.toml` file.
///
/// The file is optional: every setting has a baked-in default, so a missing
/// file yields a fully usable configuration and command-line flags can
/// override individual values on top.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        // Baked-in defaults so the binary runs without any file at all.
        .set_default("data.yaml_dir", "data")?
        .set_default("data.csv_dir", "csv_data")?
        .set_default("data.master_csv", "master_prices.csv")?
        .set_default("data.sector_map", "sector_map.csv")?
        .set_default("report.top_n", 10)?
        .set_default("report.movers_per_month", 5)?
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml").required(false))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let settings = load_config().unwrap();
        assert_eq!(settings.report.top_n, 10);
        assert_eq!(settings.report.movers_per_month, 5);
    }
}
