//! nsefetch CLI: download daily history from the command line.
//!
//! Commands:
//! - `info`: list the supported instruments
//! - `fetch`: download daily OHLCV history and write it as CSV or JSON
//! - `smoke`: fetch the last 30 days with a deliberately unsupported code

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use nsefetch_core::{
    describe_supported_instruments, CsvProvider, FetcherConfig, HistoryProvider,
    MarketDataFetcher, PriceSeries, UnknownCodePolicy, YahooProvider, DEFAULT_INSTRUMENT_CODE,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "nsefetch",
    about = "nsefetch: daily OHLCV history for NSE-listed instruments"
)]
struct Cli {
    /// TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read `{SYMBOL}.csv` files from this directory instead of Yahoo Finance.
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported instruments.
    Info {
        /// Print as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Download daily history for an instrument.
    Fetch {
        /// Instrument code.
        #[arg(default_value = DEFAULT_INSTRUMENT_CODE)]
        code: String,

        /// Start date (YYYY-MM-DD). Defaults to the configured start.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD, exclusive). Defaults to the configured end.
        #[arg(long)]
        end: Option<String>,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Emit JSON instead of CSV.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Fail on unsupported codes instead of substituting the default.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print instrument info and fetch the last 30 days for a mismatched code.
    Smoke,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FetcherConfig::from_file(path)?,
        None => FetcherConfig::default(),
    };

    match cli.command {
        Commands::Info { json } => run_info(json),
        Commands::Fetch {
            code,
            start,
            end,
            output,
            json,
            strict,
        } => {
            let mut config = config;
            if strict {
                config.unknown_code = UnknownCodePolicy::Reject;
            }
            let start = start.unwrap_or_else(|| config.default_start.to_string());
            let end = end.unwrap_or_else(|| config.default_end.to_string());
            let request = FetchRequest {
                code,
                start,
                end,
                output,
                json,
            };
            match &cli.csv_dir {
                Some(dir) => {
                    let fetcher = MarketDataFetcher::with_config(CsvProvider::new(dir), config);
                    run_fetch(fetcher, &request)
                }
                None => run_fetch(MarketDataFetcher::yahoo(config)?, &request),
            }
        }
        Commands::Smoke => {
            let ok = match &cli.csv_dir {
                Some(dir) => {
                    run_smoke(&MarketDataFetcher::with_config(CsvProvider::new(dir), config))
                }
                None => run_smoke(&MarketDataFetcher::<YahooProvider>::yahoo(config)?),
            };
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Text by default, JSON lines with `NSEFETCH_LOG_FORMAT=json`. Level from `RUST_LOG`.
fn init_tracing() {
    let log_format = std::env::var("NSEFETCH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .init();
    }
}

fn run_info(json: bool) -> Result<()> {
    let table = describe_supported_instruments();
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("Supported instruments:");
    for (code, info) in &table {
        println!("  {code}: {} ({}) - {}", info.name, info.country, info.symbol);
        println!("      {}", info.description);
    }
    Ok(())
}

struct FetchRequest {
    code: String,
    start: String,
    end: String,
    output: Option<PathBuf>,
    json: bool,
}

fn run_fetch<P: HistoryProvider>(fetcher: MarketDataFetcher<P>, req: &FetchRequest) -> Result<()> {
    let series = fetcher
        .fetch_daily_history(&req.code, &req.start, &req.end)
        .with_context(|| format!("fetching {} from {} to {}", req.code, req.start, req.end))?;

    match &req.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_series(&series, file, req.json)?;
            eprintln!("Wrote {} rows to {}", series.len(), path.display());
        }
        None => write_series(&series, io::stdout().lock(), req.json)?,
    }
    Ok(())
}

fn write_series<W: Write>(series: &PriceSeries, mut out: W, json: bool) -> Result<()> {
    let bars = series.bars()?;
    if json {
        serde_json::to_writer_pretty(&mut out, &bars)?;
        writeln!(out)?;
    } else {
        let mut wtr = csv::Writer::from_writer(out);
        for bar in &bars {
            wtr.serialize(bar)?;
        }
        wtr.flush()?;
    }
    Ok(())
}

/// Returns whether the sample fetch succeeded.
fn run_smoke<P: HistoryProvider>(fetcher: &MarketDataFetcher<P>) -> bool {
    println!("Testing Indian market data loading...");
    println!();
    println!("Supported instruments:");
    for (code, info) in MarketDataFetcher::<P>::describe_supported_instruments() {
        println!("  {code}: {} ({}) - {}", info.name, info.country, info.symbol);
    }

    println!();
    println!("Testing sample data download (last 30 days)...");
    let end = Local::now().date_naive();
    let start = end - Duration::days(30);

    match fetcher.fetch_daily_history("RELIANCE", &ymd(start), &ymd(end)) {
        Ok(series) => {
            println!("Sample data shape: ({}, {})", series.len(), series.field_names().len());
            println!("Sample data columns: {:?}", series.field_names());
            println!("OK: market data loader working");
            true
        }
        Err(e) => {
            println!("FAIL: {e}");
            false
        }
    }
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
