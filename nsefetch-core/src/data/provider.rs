//! History provider trait and structured provider errors.
//!
//! The HistoryProvider trait abstracts over data sources (Yahoo Finance, local
//! CSV files) so the fetcher can swap implementations and tests can stub them.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use thiserror::Error;

/// Failures raised while talking to a data source.
///
/// Passed through to callers unmodified by the fetcher.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table error: {0}")]
    Table(String),
}

/// A source of daily bars.
///
/// `daily_history` returns the provider's raw table: a date column plus
/// open/high/low/close/volume under whatever casing the source uses, and any
/// extra columns it happens to carry. An empty table is a valid answer; the
/// fetcher decides what that means.
pub trait HistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` from `start` (inclusive) to `end` (exclusive).
    fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, DataError>;
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, DataError> {
        (**self).daily_history(symbol, start, end)
    }
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, DataError> {
        (**self).daily_history(symbol, start, end)
    }
}
