//! marketdump CLI: export S&P 500 market data from Alpaca to CSV.
//!
//! Commands:
//! - `export`: scrape symbols, then fetch bars, quotes, and trades into CSV files
//! - `symbols`: print the scraped symbol list
//! - `default-config`: print the default configuration as TOML

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use marketdump_core::alpaca::build_http_client;
use marketdump_core::domain::DataKind;
use marketdump_core::symbols::fetch_symbols;
use marketdump_core::{run_export, Credentials, ExportConfig, ExportSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "marketdump",
    version,
    about = "Export S&P 500 daily/minute bars, quotes, and trades from Alpaca to CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the export. Needs API_KEY_ID and API_SECRET_KEY in the environment (or .env).
    Export {
        /// Path to a TOML config file. Defaults apply to anything it omits.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory the data_* folders live under.
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// Create the data_* folders if missing.
        #[arg(long, default_value_t = false)]
        create_dirs: bool,

        /// Use these symbols instead of scraping the constituents page.
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        /// Stages to run (repeatable). Defaults to the config's list.
        #[arg(long = "stage", value_enum)]
        stages: Vec<Stage>,

        /// Day (YYYY-MM-DD) for minute bars, quotes, and trades.
        #[arg(long)]
        day: Option<String>,
    },
    /// Print the scraped symbol list, one per line.
    Symbols {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    DefaultConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    DailyBars,
    MinuteBars,
    Quotes,
    Trades,
}

impl From<Stage> for DataKind {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::DailyBars => DataKind::DailyBars,
            Stage::MinuteBars => DataKind::MinuteBars,
            Stage::Quotes => DataKind::Quotes,
            Stage::Trades => DataKind::Trades,
        }
    }
}

fn main() -> Result<()> {
    // A missing .env is fine; the variables may come from the shell.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            config,
            output_root,
            create_dirs,
            symbols,
            stages,
            day,
        } => run_export_cmd(config, output_root, create_dirs, symbols, stages, day),
        Commands::Symbols { config } => run_symbols_cmd(config.as_deref()),
        Commands::DefaultConfig => {
            print!("{}", ExportConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marketdump=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    match path {
        Some(p) => ExportConfig::from_file(p)
            .with_context(|| format!("load config {}", p.display())),
        None => Ok(ExportConfig::default()),
    }
}

fn run_export_cmd(
    config_path: Option<PathBuf>,
    output_root: Option<PathBuf>,
    create_dirs: bool,
    symbols: Vec<String>,
    stages: Vec<Stage>,
    day: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;

    if let Some(root) = output_root {
        config.output_root = root;
    }
    if create_dirs {
        config.create_dirs = true;
    }
    if !stages.is_empty() {
        config.stages = stages.into_iter().map(DataKind::from).collect();
    }
    if let Some(day) = day {
        let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
            .with_context(|| format!("invalid --day '{day}', expected YYYY-MM-DD"))?;
        config.set_day(date);
    }
    config.validate()?;

    let credentials = Credentials::from_env()?;
    let symbols = (!symbols.is_empty()).then_some(symbols);

    let summary = run_export(&config, credentials, symbols)?;
    log_summary(&summary);
    Ok(())
}

fn log_summary(summary: &ExportSummary) {
    for stage in &summary.stages {
        info!(
            stage = %stage.kind,
            requests = stage.requests,
            files = stage.files,
            records = stage.records,
            "stage summary"
        );
    }
    info!(
        symbols = summary.symbols,
        files = summary.total_files(),
        "export finished"
    );
}

fn run_symbols_cmd(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_http_client(Duration::from_secs(config.api.timeout_secs))?;
    for symbol in fetch_symbols(&client, &config.symbols)? {
        println!("{symbol}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_flags_parse() {
        let cli = Cli::try_parse_from([
            "marketdump",
            "export",
            "--output-root",
            "out",
            "--create-dirs",
            "--stage",
            "quotes",
            "--stage",
            "daily-bars",
            "--symbols",
            "AAPL",
            "MSFT",
            "--day",
            "2021-11-18",
        ])
        .unwrap();

        match cli.command {
            Commands::Export {
                output_root,
                create_dirs,
                symbols,
                stages,
                day,
                ..
            } => {
                assert_eq!(output_root, Some(PathBuf::from("out")));
                assert!(create_dirs);
                assert_eq!(symbols, vec!["AAPL", "MSFT"]);
                let kinds: Vec<DataKind> = stages.into_iter().map(DataKind::from).collect();
                assert_eq!(kinds, vec![DataKind::Quotes, DataKind::DailyBars]);
                assert_eq!(day.as_deref(), Some("2021-11-18"));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn unknown_stage_is_rejected() {
        assert!(Cli::try_parse_from(["marketdump", "export", "--stage", "bogus"]).is_err());
    }
}
