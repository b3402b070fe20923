//! nsefetch core: daily OHLCV history for NSE-listed instruments.
//!
//! This crate contains:
//! - The supported-instrument table and its descriptors
//! - The `HistoryProvider` trait with Yahoo Finance and local CSV providers
//! - Normalization of raw provider tables into a fixed `date + OHLCV` shape
//! - `MarketDataFetcher`, which ties resolution, fetching and validation together
//! - TOML-loadable configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fetcher;

pub use config::{ConfigError, FetcherConfig, UnknownCodePolicy, YahooConfig};
pub use data::{CsvProvider, DataError, HistoryProvider, YahooProvider};
pub use domain::{
    describe_supported_instruments, DailyBar, Instrument, InstrumentInfo, PriceSeries,
    DEFAULT_INSTRUMENT_CODE, REQUIRED_FIELDS, SUPPORTED_INSTRUMENTS,
};
pub use error::FetchError;
pub use fetcher::MarketDataFetcher;
